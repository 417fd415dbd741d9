use super::*;

#[derive(Debug, Parser)]
pub(crate) struct Info {
  #[command(flatten)]
  freshness: Freshness,
}

impl Info {
  pub(crate) fn run(self, settings: Settings) -> SubcommandResult {
    let index = self.freshness.index(&settings)?;

    Ok(Some(Box::new(index.node_info()?)))
  }
}
