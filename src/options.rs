use super::*;

#[derive(Clone, Default, Debug, Parser)]
#[command(group(
  ArgGroup::new("chains")
    .required(false)
    .args(&["chain_argument", "regtest", "testnet"]),
))]
pub struct Options {
  #[arg(long, help = "Authenticate to Bitcoin Core RPC with <BITCOIN_RPC_PASSWORD>.")]
  pub(crate) bitcoin_rpc_password: Option<String>,
  #[arg(long, help = "Connect to Bitcoin Core RPC at <BITCOIN_RPC_URL>.")]
  pub(crate) bitcoin_rpc_url: Option<String>,
  #[arg(long, help = "Authenticate to Bitcoin Core RPC as <BITCOIN_RPC_USERNAME>.")]
  pub(crate) bitcoin_rpc_username: Option<String>,
  #[arg(long, help = "Max <N> requests in flight. [default: 12]")]
  pub(crate) bitcoin_rpc_limit: Option<u32>,
  #[arg(
    long,
    help = "Wait <BUSY_POLL_INTERVAL> between probes while Bitcoin Core is busy. [default: 5s]"
  )]
  pub(crate) busy_poll_interval: Option<humantime::Duration>,
  #[arg(long = "chain", value_enum, help = "Use <CHAIN>. [default: mainnet]")]
  pub(crate) chain_argument: Option<Chain>,
  #[arg(long, help = "Load configuration from <CONFIG>.")]
  pub(crate) config: Option<PathBuf>,
  #[arg(long, help = "Load Bitcoin Core RPC cookie file from <COOKIE_FILE>.")]
  pub(crate) cookie_file: Option<PathBuf>,
  #[arg(long, alias = "datadir", help = "Store index in <DATA_DIR>.")]
  pub(crate) data_dir: Option<PathBuf>,
  #[arg(long, short, help = "Specify output format. [default: json]")]
  pub(crate) format: Option<OutputFormat>,
  #[arg(long, help = "Use index at <INDEX>.")]
  pub(crate) index: Option<PathBuf>,
  #[arg(long, help = "Emit node info every <INFO_INTERVAL>. [default: 5s]")]
  pub(crate) info_interval: Option<humantime::Duration>,
  #[arg(
    long,
    help = "Import watch addresses under wallet label <LABEL>. [default: cc-full-node]"
  )]
  pub(crate) label: Option<String>,
  #[arg(
    long,
    help = "Wait <POLL_INTERVAL> after a pass that found no new block. [default: 1s]"
  )]
  pub(crate) poll_interval: Option<humantime::Duration>,
  #[arg(long, short, help = "Use regtest. Equivalent to `--chain regtest`.")]
  pub(crate) regtest: bool,
  #[arg(long, short, help = "Use testnet. Equivalent to `--chain testnet`.")]
  pub(crate) testnet: bool,
}
