use super::*;

#[derive(Debug, Parser)]
pub(crate) struct Owned {
  #[arg(required = true, help = "List assets held by <ADDRESSES>.")]
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

impl Owned {
  pub(crate) fn run(self, settings: Settings) -> SubcommandResult {
    let addresses = parse_addresses(&settings, &self.addresses)?;

    let index = self.freshness.index(&settings)?;

    Ok(Some(Box::new(
      index
        .owning_assets(&addresses, self.min_conf, false)?
        .unwrap_or_default(),
    )))
  }
}
