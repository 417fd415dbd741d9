use {super::*, clap::ValueEnum};

#[derive(Default, ValueEnum, Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Chain {
  #[default]
  #[value(alias("main"))]
  Mainnet,
  #[value(alias("test"))]
  Testnet,
  Regtest,
}

impl Chain {
  pub(crate) fn network(self) -> Network {
    self.into()
  }

  pub(crate) fn default_rpc_port(self) -> u16 {
    match self {
      Self::Mainnet => 8332,
      Self::Testnet => 18332,
      Self::Regtest => 18443,
    }
  }

  /// Height of the first block that can carry colored transactions.
  pub(crate) fn first_colored_height(self) -> u64 {
    match self {
      Self::Mainnet => 364_548,
      Self::Testnet => 462_320,
      Self::Regtest => 0,
    }
  }

  /// The address owning an output, for pay-to-pubkey-hash and pay-to-script-hash
  /// scripts only.
  pub fn address_from_script(self, script: &Script) -> Option<String> {
    if !(script.is_p2pkh() || script.is_p2sh()) {
      return None;
    }

    Address::from_script(script, self.network())
      .ok()
      .map(|address| address.to_string())
  }

  pub(crate) fn parse_address(self, input: &str) -> Result<String, SnafuError> {
    Ok(
      input
        .parse::<Address<bitcoin::address::NetworkUnchecked>>()
        .and_then(|address| address.require_network(self.network()))
        .snafu_context(error::AddressParse { input })?
        .to_string(),
    )
  }

  pub(crate) fn join_with_data_dir(self, data_dir: impl AsRef<Path>) -> PathBuf {
    match self {
      Self::Mainnet => data_dir.as_ref().to_owned(),
      Self::Testnet => data_dir.as_ref().join("testnet3"),
      Self::Regtest => data_dir.as_ref().join("regtest"),
    }
  }
}

impl From<Chain> for Network {
  fn from(chain: Chain) -> Network {
    match chain {
      Chain::Mainnet => Network::Bitcoin,
      Chain::Testnet => Network::Testnet,
      Chain::Regtest => Network::Regtest,
    }
  }
}

impl Display for Chain {
  fn fmt(&self, f: &mut Formatter) -> fmt::Result {
    write!(
      f,
      "{}",
      match self {
        Self::Mainnet => "mainnet",
        Self::Testnet => "testnet",
        Self::Regtest => "regtest",
      }
    )
  }
}

impl FromStr for Chain {
  type Err = SnafuError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "mainnet" | "main" => Ok(Self::Mainnet),
      "testnet" | "test" => Ok(Self::Testnet),
      "regtest" => Ok(Self::Regtest),
      _ => Err(SnafuError::InvalidChain {
        chain: s.to_string(),
      }),
    }
  }
}

#[cfg(test)]
mod tests {
  use {super::*, bitcoin::hashes::Hash};

  #[test]
  fn from_str() {
    assert_eq!("mainnet".parse::<Chain>().unwrap(), Chain::Mainnet);
    assert_eq!("main".parse::<Chain>().unwrap(), Chain::Mainnet);
    assert_eq!("testnet".parse::<Chain>().unwrap(), Chain::Testnet);
    assert_eq!("regtest".parse::<Chain>().unwrap(), Chain::Regtest);
    assert_eq!(
      "foo".parse::<Chain>().unwrap_err().to_string(),
      "Invalid chain `foo`"
    );
  }

  #[test]
  fn first_colored_heights() {
    assert_eq!(Chain::Mainnet.first_colored_height(), 364_548);
    assert_eq!(Chain::Testnet.first_colored_height(), 462_320);
    assert_eq!(Chain::Regtest.first_colored_height(), 0);
  }

  #[test]
  fn rpc_ports() {
    assert_eq!(Chain::Mainnet.default_rpc_port(), 8332);
    assert_eq!(Chain::Testnet.default_rpc_port(), 18332);
    assert_eq!(Chain::Regtest.default_rpc_port(), 18443);
  }

  #[test]
  fn only_hash_scripts_have_addresses() {
    let pubkey_hash = bitcoin::PubkeyHash::from_byte_array([1; 20]);

    assert_eq!(
      Chain::Mainnet.address_from_script(&ScriptBuf::new_p2pkh(&pubkey_hash)),
      Some(Address::p2pkh(pubkey_hash, Network::Bitcoin).to_string())
    );

    assert_eq!(
      Chain::Regtest.address_from_script(&ScriptBuf::from_bytes(vec![0x6a, 0x01, 0x01])),
      None
    );
  }

  #[test]
  fn addresses_must_match_the_chain() {
    let address = Address::p2pkh(
      bitcoin::PubkeyHash::from_byte_array([2; 20]),
      Network::Regtest,
    )
    .to_string();

    assert_eq!(Chain::Regtest.parse_address(&address).unwrap(), address);
    assert!(matches!(
      Chain::Mainnet.parse_address(&address),
      Err(SnafuError::AddressParse { .. })
    ));
  }
}
