use super::*;

#[derive(Debug, Parser)]
pub(crate) struct Run {
  #[arg(
    long = "import",
    value_name = "ADDRESS",
    help = "Watch <ADDRESS>, rescanning the chain for it before indexing. May be repeated."
  )]
  addresses: Vec<String>,
}

impl Run {
  pub(crate) fn run(self, settings: Settings) -> SubcommandResult {
    let addresses = parse_addresses(&settings, &self.addresses)?;

    let index = Index::open(&settings)?;

    index.run(&addresses)?;

    Ok(None)
  }
}
