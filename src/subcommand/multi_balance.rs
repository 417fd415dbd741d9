use super::*;

#[derive(Debug, Parser)]
pub(crate) struct MultiBalance {
  #[arg(required = true, help = "Show balances of <ASSETS>.")]
  assets: Vec<AssetId>,
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

impl MultiBalance {
  pub(crate) fn run(self, settings: Settings) -> SubcommandResult {
    let addresses = parse_addresses(&settings, &self.addresses)?;

    let index = self.freshness.index(&settings)?;

    let balances = index
      .multi_asset_balance(
        &self.assets,
        (!addresses.is_empty()).then_some(addresses.as_slice()),
        self.min_conf,
        false,
      )?
      .unwrap_or_default();

    Ok(Some(Box::new(balances)))
  }
}
