use super::*;

#[derive(Debug, Parser)]
pub(crate) struct Balance {
  #[arg(help = "Show balance of <ASSET>.")]
  asset: AssetId,
  #[arg(
    long = "address",
    value_name = "ADDRESS",
    help = "Only count outputs held by <ADDRESS>. May be repeated."
  )]
  addresses: Vec<String>,
  #[arg(
    long,
    default_value_t = 0,
    help = "Only count outputs with at least <MIN_CONF> confirmations."
  )]
  min_conf: u32,
  #[command(flatten)]
  freshness: Freshness,
}

impl Balance {
  pub(crate) fn run(self, settings: Settings) -> SubcommandResult {
    let addresses = parse_addresses(&settings, &self.addresses)?;

    let index = self.freshness.index(&settings)?;

    let balance = index
      .asset_balance(
        &self.asset,
        (!addresses.is_empty()).then_some(addresses.as_slice()),
        self.min_conf,
        false,
      )?
      .with_context(|| format!("asset {} not found", self.asset))?;

    Ok(Some(Box::new(balance)))
  }
}
