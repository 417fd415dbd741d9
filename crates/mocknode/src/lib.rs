use {
  anyhow::{Context, Result, anyhow, bail, ensure},
  bitcoin::{
    Address, Amount, Block, BlockHash, CompactTarget, Network, OutPoint, PubkeyHash, ScriptBuf,
    Sequence, Transaction, TxIn, TxMerkleNode, TxOut, Txid, Witness,
    absolute::LockTime,
    block::{self, Header},
    hashes::Hash,
    transaction::Version,
  },
  ccnode::{Node, NodeInfo, Unspent, WalletTransaction},
  parking_lot::{Mutex, MutexGuard},
  std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
  },
};

mod node;
mod state;

pub use state::{Import, State};

pub fn builder() -> Builder {
  Builder {
    network: Network::Regtest,
    rescan_probes: 0,
  }
}

pub struct Builder {
  network: Network,
  rescan_probes: usize,
}

impl Builder {
  pub fn network(self, network: Network) -> Self {
    Self { network, ..self }
  }

  /// Number of `getinfo` probes that fail after a rescanning import.
  pub fn rescan_probes(self, rescan_probes: usize) -> Self {
    Self {
      rescan_probes,
      ..self
    }
  }

  pub fn build(self) -> Handle {
    Handle {
      state: Arc::new(Mutex::new(State::new(self.network, self.rescan_probes))),
    }
  }
}

pub fn spawn() -> Handle {
  builder().build()
}

/// A deterministic pay-to-pubkey-hash address.
pub fn address(n: u8, network: Network) -> Address {
  Address::p2pkh(PubkeyHash::from_byte_array([n; 20]), network)
}

#[derive(Default, Clone, Debug)]
pub struct TransactionTemplate {
  pub inputs: Vec<OutPoint>,
  pub outputs: Vec<TxOut>,
}

impl TransactionTemplate {
  pub fn transaction(&self) -> Transaction {
    Transaction {
      version: Version::TWO,
      lock_time: LockTime::ZERO,
      input: self
        .inputs
        .iter()
        .map(|previous_output| TxIn {
          previous_output: *previous_output,
          script_sig: ScriptBuf::new(),
          sequence: Sequence::ENABLE_RBF_NO_LOCKTIME,
          witness: Witness::new(),
        })
        .collect(),
      output: self.outputs.clone(),
    }
  }
}

pub fn output(address: &Address, sats: u64) -> TxOut {
  TxOut {
    value: Amount::from_sat(sats),
    script_pubkey: address.script_pubkey(),
  }
}

#[derive(Clone)]
pub struct Handle {
  state: Arc<Mutex<State>>,
}

impl Handle {
  pub fn state(&self) -> MutexGuard<'_, State> {
    self.state.lock()
  }

  pub fn network(&self) -> Network {
    self.state().network
  }

  pub fn address(&self, n: u8) -> Address {
    address(n, self.network())
  }

  pub fn mine_blocks(&self, n: u64) -> Vec<Block> {
    (0..n).map(|_| self.state().mine(None)).collect()
  }

  /// Mine one block whose coinbase pays `sats` to `address`.
  pub fn mine_to(&self, address: &Address, sats: u64) -> Block {
    self.state().mine(Some(output(address, sats)))
  }

  pub fn broadcast_tx(&self, template: TransactionTemplate) -> Txid {
    self
      .state()
      .broadcast(template.transaction())
      .unwrap_or_else(|err| panic!("failed to broadcast transaction: {err}"))
  }

  /// Drop the tip block, returning its transactions to the mempool.
  pub fn invalidate_tip(&self) -> BlockHash {
    self.state().invalidate_tip()
  }

  pub fn set_busy(&self, busy: bool) {
    self.state().busy = busy;
  }

  pub fn imports(&self) -> Vec<Import> {
    self.state().imports.clone()
  }

  pub fn height(&self) -> u64 {
    self.state().height()
  }

  pub fn tip(&self) -> BlockHash {
    self.state().tip()
  }
}
