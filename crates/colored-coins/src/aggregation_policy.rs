use super::*;

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregationPolicy {
  #[default]
  Aggregatable,
  Hybrid,
  Dispersed,
}

impl AggregationPolicy {
  pub(crate) fn from_bits(bits: u8) -> Result<Self, DecodeError> {
    match bits {
      0b00 => Ok(Self::Aggregatable),
      0b01 => Ok(Self::Hybrid),
      0b10 => Ok(Self::Dispersed),
      bits => Err(DecodeError::AggregationPolicy(bits)),
    }
  }

  pub(crate) fn bits(self) -> u8 {
    match self {
      Self::Aggregatable => 0b00,
      Self::Hybrid => 0b01,
      Self::Dispersed => 0b10,
    }
  }

  pub fn is_aggregatable(self) -> bool {
    self == Self::Aggregatable
  }
}

impl Display for AggregationPolicy {
  fn fmt(&self, f: &mut Formatter) -> fmt::Result {
    f.write_str(match self {
      Self::Aggregatable => "aggregatable",
      Self::Hybrid => "hybrid",
      Self::Dispersed => "dispersed",
    })
  }
}

impl FromStr for AggregationPolicy {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "aggregatable" => Ok(Self::Aggregatable),
      "hybrid" => Ok(Self::Hybrid),
      "dispersed" => Ok(Self::Dispersed),
      _ => Err(format!("invalid aggregation policy `{s}`")),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn bits_round_trip() {
    for policy in [
      AggregationPolicy::Aggregatable,
      AggregationPolicy::Hybrid,
      AggregationPolicy::Dispersed,
    ] {
      assert_eq!(AggregationPolicy::from_bits(policy.bits()).unwrap(), policy);
    }

    assert_eq!(
      AggregationPolicy::from_bits(0b11),
      Err(DecodeError::AggregationPolicy(0b11))
    );
  }

  #[test]
  fn serializes_lowercase() {
    assert_eq!(
      serde_json::to_string(&AggregationPolicy::Dispersed).unwrap(),
      "\"dispersed\""
    );
    assert_eq!(
      "hybrid".parse::<AggregationPolicy>().unwrap(),
      AggregationPolicy::Hybrid
    );
  }
}
