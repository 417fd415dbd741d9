use super::*;

#[derive(Debug, Parser)]
pub(crate) struct Import {
  #[arg(required = true, help = "Watch <ADDRESSES>.")]
  addresses: Vec<String>,
  #[arg(
    long,
    help = "Rescan the chain for transactions of the new addresses and wait for the rescan to finish."
  )]
  reindex: bool,
}

impl Import {
  pub(crate) fn run(self, settings: Settings) -> SubcommandResult {
    let addresses = parse_addresses(&settings, &self.addresses)?;

    let index = Index::open(&settings)?;

    let outcome = index.import_addresses(&addresses, self.reindex)?;

    index.join_rescan()?;

    Ok(Some(Box::new(outcome)))
  }
}
