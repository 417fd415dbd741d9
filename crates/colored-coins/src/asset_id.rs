use super::*;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetId(String);

impl AssetId {
  const LENGTH: usize = 23;

  fn padding(lock_status: bool, aggregation_policy: AggregationPolicy) -> [u8; 2] {
    match (lock_status, aggregation_policy) {
      (true, AggregationPolicy::Aggregatable) => [0x20, 0xce],
      (true, AggregationPolicy::Hybrid) => [0x21, 0x02],
      (true, AggregationPolicy::Dispersed) => [0x20, 0xe4],
      (false, AggregationPolicy::Aggregatable) => [0x2e, 0x37],
      (false, AggregationPolicy::Hybrid) => [0x2e, 0x6b],
      (false, AggregationPolicy::Dispersed) => [0x2e, 0x4e],
    }
  }

  /// Id of a locked asset issued by a transaction whose first input spends
  /// `first_input`.
  pub fn locked(
    first_input: OutPoint,
    aggregation_policy: AggregationPolicy,
    divisibility: u8,
  ) -> Self {
    let salt = format!("{}:{}", first_input.txid, first_input.vout);
    Self::derive(salt.as_bytes(), true, aggregation_policy, divisibility)
  }

  /// Id of an unlocked asset. `previous_script` is the script of the output
  /// spent by the first input, so every issuance from that script shares one
  /// id.
  pub fn unlocked(
    previous_script: &Script,
    aggregation_policy: AggregationPolicy,
    divisibility: u8,
  ) -> Self {
    Self::derive(
      previous_script.as_bytes(),
      false,
      aggregation_policy,
      divisibility,
    )
  }

  fn derive(
    salt: &[u8],
    lock_status: bool,
    aggregation_policy: AggregationPolicy,
    divisibility: u8,
  ) -> Self {
    let hash = hash160::Hash::hash(salt);

    let mut data = Vec::with_capacity(Self::LENGTH);
    data.extend_from_slice(&Self::padding(lock_status, aggregation_policy));
    data.extend_from_slice(hash.as_byte_array());
    data.push(divisibility);

    Self(bitcoin::base58::encode_check(&data))
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl Display for AssetId {
  fn fmt(&self, f: &mut Formatter) -> fmt::Result {
    f.write_str(&self.0)
  }
}

impl FromStr for AssetId {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let data =
      bitcoin::base58::decode_check(s).map_err(|err| format!("invalid asset id `{s}`: {err}"))?;

    if data.len() != Self::LENGTH {
      return Err(format!(
        "invalid asset id `{s}`: expected {} bytes, got {}",
        Self::LENGTH,
        data.len()
      ));
    }

    Ok(Self(s.into()))
  }
}

impl AsRef<str> for AssetId {
  fn as_ref(&self) -> &str {
    &self.0
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn outpoint(vout: u32) -> OutPoint {
    OutPoint {
      txid: Txid::from_byte_array([7; 32]),
      vout,
    }
  }

  fn script(byte: u8) -> ScriptBuf {
    ScriptBuf::from_bytes(vec![byte; 25])
  }

  #[test]
  fn ids_are_deterministic() {
    assert_eq!(
      AssetId::locked(outpoint(0), AggregationPolicy::Aggregatable, 2),
      AssetId::locked(outpoint(0), AggregationPolicy::Aggregatable, 2),
    );
  }

  #[test]
  fn ids_depend_on_every_field() {
    let id = AssetId::locked(outpoint(0), AggregationPolicy::Aggregatable, 2);

    assert_ne!(id, AssetId::locked(outpoint(1), AggregationPolicy::Aggregatable, 2));
    assert_ne!(id, AssetId::locked(outpoint(0), AggregationPolicy::Hybrid, 2));
    assert_ne!(id, AssetId::locked(outpoint(0), AggregationPolicy::Aggregatable, 3));

    let salt = format!("{}:{}", outpoint(0).txid, 0);
    assert_ne!(
      id,
      AssetId::unlocked(
        Script::from_bytes(salt.as_bytes()),
        AggregationPolicy::Aggregatable,
        2
      )
    );
  }

  #[test]
  fn unlocked_ids_follow_the_previous_script() {
    let id = AssetId::unlocked(&script(1), AggregationPolicy::Hybrid, 0);

    assert_eq!(id, AssetId::unlocked(&script(1), AggregationPolicy::Hybrid, 0));
    assert_ne!(id, AssetId::unlocked(&script(2), AggregationPolicy::Hybrid, 0));
    assert_ne!(id, AssetId::unlocked(&script(1), AggregationPolicy::Dispersed, 0));
  }

  #[test]
  fn from_str_accepts_derived_ids() {
    let id = AssetId::unlocked(&script(3), AggregationPolicy::Dispersed, 0);
    assert_eq!(id.to_string().parse::<AssetId>().unwrap(), id);
  }

  #[test]
  fn from_str_rejects_garbage() {
    assert!("foo".parse::<AssetId>().is_err());
    assert!(
      bitcoin::base58::encode_check(&[1, 2, 3])
        .parse::<AssetId>()
        .is_err()
    );
  }
}
