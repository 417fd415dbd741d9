use super::*;

#[derive(Debug, Parser)]
pub(crate) struct Issuer {
  #[arg(help = "Show the issuing address of <ASSET>.")]
  asset: AssetId,
  #[command(flatten)]
  freshness: Freshness,
}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct Output {
  pub address: Option<String>,
}

impl Issuer {
  pub(crate) fn run(self, settings: Settings) -> SubcommandResult {
    let index = self.freshness.index(&settings)?;

    Ok(Some(Box::new(Output {
      address: index.asset_issuing_address(&self.asset, false)?,
    })))
  }
}
