#![allow(clippy::result_large_err)]

use {
  self::{
    arguments::Arguments,
    error::ResultExt,
    gate::ParseGate,
    subcommand::{OutputFormat, Subcommand, SubcommandResult},
  },
  anyhow::{Context, Error, anyhow, bail, ensure},
  bitcoin::{
    Address, Amount, Block, BlockHash, Network, OutPoint, Script, ScriptBuf, Transaction, Txid,
    block::Header, consensus,
  },
  bitcoincore_rpc::{Auth, Client, RpcApi},
  chrono::{DateTime, TimeZone, Utc},
  clap::{ArgGroup, Parser},
  colored_coins::{AggregationPolicy, AssetId, AssetRecord, Payload, assets_outputs},
  indexmap::{IndexMap, IndexSet},
  parking_lot::{Condvar, Mutex, RwLock},
  serde::{Deserialize, Serialize, de::DeserializeOwned},
  serde_with::{DeserializeFromStr, DisplayFromStr, SerializeDisplay, serde_as},
  std::{
    collections::{BTreeMap, HashMap, HashSet, VecDeque},
    env,
    fmt::{self, Display, Formatter},
    fs::{self, File},
    io,
    path::{Path, PathBuf},
    process,
    str::FromStr,
    sync::{
      Arc,
      atomic::{self, AtomicBool},
    },
    thread::{self, JoinHandle},
    time::{Duration, Instant},
  },
  tokio::sync::mpsc,
};

pub use self::{
  chain::Chain,
  decimal::Decimal,
  error::SnafuError,
  index::{
    Balance, HolderBalance, ImportOutcome, Index, Info, InputAssets, IssuanceInfo, OutputAssets,
    Pass, TransactionHistory, TxOutAssets, UtxoAssets, event::Event,
  },
  node::{Node, NodeInfo, RpcNode, Unspent, WalletTransaction},
  options::Options,
  settings::Settings,
  store::{MemoryStore, RedbStore, Store, Table},
};

pub mod arguments;
mod chain;
mod decimal;
pub mod error;
mod index;
mod node;
mod options;
mod settings;
mod store;
pub mod subcommand;

use index::entry;
use index::gate;

type Result<T = (), E = Error> = std::result::Result<T, E>;

static SHUTTING_DOWN: AtomicBool = AtomicBool::new(false);

fn default<T: Default>() -> T {
  Default::default()
}

fn timestamp(seconds: u64) -> DateTime<Utc> {
  Utc
    .timestamp_opt(seconds.try_into().unwrap_or(i64::MAX), 0)
    .single()
    .unwrap_or_default()
}

pub fn main() {
  env_logger::init();

  ctrlc::set_handler(move || {
    if SHUTTING_DOWN.fetch_or(true, atomic::Ordering::Relaxed) {
      process::exit(1);
    }

    eprintln!("Shutting down gracefully. Press <CTRL-C> again to shutdown immediately.");
  })
  .expect("Error setting <CTRL-C> handler");

  let args = Arguments::parse();

  let format = args.options.format;

  match args.run() {
    Err(err) => {
      eprintln!("error: {err}");

      if env::var_os("RUST_BACKTRACE")
        .map(|val| val == "1")
        .unwrap_or_default()
      {
        eprintln!("{}", err.backtrace());
      }

      process::exit(1);
    }
    Ok(output) => {
      if let Some(output) = output {
        output.print(format.unwrap_or_default());
      }
    }
  }
}
