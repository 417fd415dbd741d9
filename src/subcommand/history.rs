use super::*;

#[derive(Debug, Parser)]
pub(crate) struct History {
  #[arg(required = true, help = "List wallet transactions touching <ADDRESSES>.")]
  addresses: Vec<String>,
  #[command(flatten)]
  freshness: Freshness,
}

impl History {
  pub(crate) fn run(self, settings: Settings) -> SubcommandResult {
    let addresses = parse_addresses(&settings, &self.addresses)?;

    let index = self.freshness.index(&settings)?;

    Ok(Some(Box::new(
      index.addresses_transactions(&addresses, false)?,
    )))
  }
}
