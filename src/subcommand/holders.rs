use super::*;

#[derive(Debug, Parser)]
pub(crate) struct Holders {
  #[arg(help = "List holders of <ASSET>.")]
  asset: AssetId,
  #[arg(
    long,
    default_value_t = 0,
    help = "Only count outputs with at least <MIN_CONF> confirmations."
  )]
  min_conf: u32,
  #[command(flatten)]
  freshness: Freshness,
}

impl Holders {
  pub(crate) fn run(self, settings: Settings) -> SubcommandResult {
    let index = self.freshness.index(&settings)?;

    let holders = index
      .asset_holders(&self.asset, self.min_conf, false)?
      .with_context(|| format!("asset {} not found", self.asset))?;

    Ok(Some(Box::new(holders)))
  }
}
