use super::*;

mod balance;
mod call;
mod history;
mod holders;
mod import;
mod info;
mod issuance;
mod issuer;
mod multi_balance;
mod owned;
mod parse;
mod run;
mod transmit;
mod utxos;

#[derive(Debug, Parser)]
pub(crate) enum Subcommand {
  #[command(about = "Show the balance of an asset")]
  Balance(balance::Balance),
  #[command(about = "Forward a raw RPC call to Bitcoin Core")]
  Call(call::Call),
  #[command(about = "List wallet transactions of addresses with their assets")]
  History(history::History),
  #[command(about = "List the addresses holding an asset")]
  Holders(holders::Holders),
  #[command(about = "Import watch addresses into the Bitcoin Core wallet")]
  Import(import::Import),
  #[command(about = "Show node and index status")]
  Info(info::Info),
  #[command(about = "Show how much of an asset each issuing transaction issued")]
  Issuance(issuance::Issuance),
  #[command(about = "Show the address that issued an asset")]
  Issuer(issuer::Issuer),
  #[command(about = "Show the balances of several assets")]
  MultiBalance(multi_balance::MultiBalance),
  #[command(about = "List the assets held by addresses")]
  Owned(owned::Owned),
  #[command(about = "Run a single parse pass")]
  Parse,
  #[command(about = "Follow the chain and index colored transactions")]
  Run(run::Run),
  #[command(about = "Broadcast a raw transaction and index it")]
  Transmit(transmit::Transmit),
  #[command(about = "List unspent outputs with their assets")]
  Utxos(utxos::Utxos),
}

impl Subcommand {
  pub(crate) fn run(self, settings: Settings) -> SubcommandResult {
    match self {
      Self::Balance(balance) => balance.run(settings),
      Self::Call(call) => call.run(settings),
      Self::History(history) => history.run(settings),
      Self::Holders(holders) => holders.run(settings),
      Self::Import(import) => import.run(settings),
      Self::Info(info) => info.run(settings),
      Self::Issuance(issuance) => issuance.run(settings),
      Self::Issuer(issuer) => issuer.run(settings),
      Self::MultiBalance(multi_balance) => multi_balance.run(settings),
      Self::Owned(owned) => owned.run(settings),
      Self::Parse => parse::run(settings),
      Self::Run(run) => run.run(settings),
      Self::Transmit(transmit) => transmit.run(settings),
      Self::Utxos(utxos) => utxos.run(settings),
    }
  }
}

/// Whether a query first indexes blocks the node has and the index lacks.
#[derive(Debug, Clone, Copy, clap::Args)]
pub(crate) struct Freshness {
  #[arg(long, help = "Answer from the index as it is, without indexing new blocks first.")]
  no_sync: bool,
}

impl Freshness {
  pub(crate) fn index(self, settings: &Settings) -> Result<Index> {
    let index = Index::open(settings)?;

    if !self.no_sync {
      index.update()?;
    }

    Ok(index)
  }
}

pub(crate) fn parse_addresses(settings: &Settings, addresses: &[String]) -> Result<Vec<String>> {
  addresses
    .iter()
    .map(|address| Ok(settings.chain().parse_address(address)?))
    .collect()
}

#[derive(clap::ValueEnum, Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq)]
pub enum OutputFormat {
  #[default]
  Json,
  Yaml,
  Minify,
}

pub trait Output: Send {
  fn print(&self, format: OutputFormat);
}

impl<T> Output for T
where
  T: Serialize + Send,
{
  fn print(&self, format: OutputFormat) {
    match format {
      OutputFormat::Json => serde_json::to_writer_pretty(io::stdout(), self).ok(),
      OutputFormat::Yaml => serde_yaml::to_writer(io::stdout(), self).ok(),
      OutputFormat::Minify => serde_json::to_writer(io::stdout(), self).ok(),
    };
    println!();
  }
}

pub(crate) type SubcommandResult = Result<Option<Box<dyn Output>>>;

#[cfg(test)]
mod tests {
  use super::*;

  fn parse(args: &[&str]) -> Arguments {
    Arguments::try_parse_from(std::iter::once("ccnode").chain(args.iter().copied())).unwrap()
  }

  #[test]
  fn query_subcommands_parse() {
    let asset = AssetId::locked(OutPoint::null(), AggregationPolicy::Aggregatable, 0).to_string();

    assert!(matches!(
      parse(&["balance", &asset, "--min-conf", "2"]).subcommand,
      Subcommand::Balance(_)
    ));

    assert!(matches!(
      parse(&["--regtest", "holders", &asset, "--no-sync"]).subcommand,
      Subcommand::Holders(_)
    ));

    assert!(matches!(parse(&["parse"]).subcommand, Subcommand::Parse));
  }

  #[test]
  fn malformed_asset_ids_are_rejected() {
    assert!(Arguments::try_parse_from(["ccnode", "balance", "not-an-asset"]).is_err());
  }

  #[test]
  fn format_option() {
    assert_eq!(
      parse(&["--format", "yaml", "info"]).options.format,
      Some(OutputFormat::Yaml)
    );
    assert_eq!(
      parse(&["-f", "minify", "info"]).options.format,
      Some(OutputFormat::Minify)
    );
  }

  #[test]
  fn call_params_are_collected() {
    let Subcommand::Call(call) = parse(&["call", "getblockhash", "0"]).subcommand else {
      panic!("expected call subcommand");
    };

    assert_eq!(call.params(), [serde_json::json!(0)]);
  }
}
