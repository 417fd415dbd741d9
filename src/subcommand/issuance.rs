use super::*;

#[derive(Debug, Parser)]
pub(crate) struct Issuance {
  #[arg(help = "Show issuances of <ASSET>.")]
  asset: AssetId,
  #[command(flatten)]
  freshness: Freshness,
}

impl Issuance {
  pub(crate) fn run(self, settings: Settings) -> SubcommandResult {
    let index = self.freshness.index(&settings)?;

    let issuance = index
      .asset_issuance(&self.asset, false)?
      .with_context(|| format!("asset {} not found", self.asset))?;

    Ok(Some(Box::new(issuance)))
  }
}
