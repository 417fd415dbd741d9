use super::*;

#[derive(Debug, Parser)]
#[command(group(
  ArgGroup::new("selection")
    .required(true)
    .args(&["addresses", "outpoints"]),
))]
pub(crate) struct Utxos {
  #[arg(
    long = "address",
    value_name = "ADDRESS",
    help = "List unspent outputs held by <ADDRESS>. May be repeated."
  )]
  addresses: Vec<String>,
  #[arg(
    long = "outpoint",
    value_name = "OUTPOINT",
    help = "List <OUTPOINT> if unspent. May be repeated."
  )]
  outpoints: Vec<OutPoint>,
  #[arg(
    long,
    requires = "outpoints",
    help = "Report indexed assets of outpoints whether or not they are unspent."
  )]
  indexed: bool,
  #[arg(
    long,
    default_value_t = 0,
    help = "Only list outputs with at least <MIN_CONF> confirmations."
  )]
  min_conf: u32,
  #[command(flatten)]
  freshness: Freshness,
}

impl Utxos {
  pub(crate) fn run(self, settings: Settings) -> SubcommandResult {
    let addresses = parse_addresses(&settings, &self.addresses)?;

    let index = self.freshness.index(&settings)?;

    if self.indexed {
      return Ok(Some(Box::new(index.txouts(&self.outpoints, false)?)));
    }

    let mut utxos = index.addresses_utxos(&addresses, self.min_conf, false)?;

    if !self.outpoints.is_empty() {
      utxos.extend(index.utxos(&self.outpoints, self.min_conf, false)?);
    }

    Ok(Some(Box::new(utxos)))
  }
}
