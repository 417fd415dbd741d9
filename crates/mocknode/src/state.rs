use super::*;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Import {
  pub address: String,
  pub label: String,
  pub rescan: bool,
}

pub struct State {
  pub blocks: HashMap<BlockHash, Block>,
  pub busy: bool,
  pub hashes: Vec<BlockHash>,
  pub history: Vec<Txid>,
  pub imports: Vec<Import>,
  pub mempool: Vec<Transaction>,
  pub network: Network,
  pub transactions: HashMap<Txid, Transaction>,
  pub utxos: BTreeMap<OutPoint, TxOut>,
  nonce: u32,
  pub(crate) pending_probes: usize,
  pub(crate) rescan_probes: usize,
}

impl State {
  pub(crate) const RECEIVED_TIME: u64 = 1_700_000_000;

  pub(crate) fn new(network: Network, rescan_probes: usize) -> Self {
    let mut state = Self {
      blocks: HashMap::new(),
      busy: false,
      hashes: Vec::new(),
      history: Vec::new(),
      imports: Vec::new(),
      mempool: Vec::new(),
      network,
      transactions: HashMap::new(),
      utxos: BTreeMap::new(),
      nonce: 0,
      pending_probes: 0,
      rescan_probes,
    };

    state.mine(None);

    state
  }

  pub fn height(&self) -> u64 {
    u64::try_from(self.hashes.len().saturating_sub(1)).unwrap()
  }

  pub fn tip(&self) -> BlockHash {
    *self.hashes.last().unwrap()
  }

  pub(crate) fn mine(&mut self, reward: Option<TxOut>) -> Block {
    let height = u32::try_from(self.hashes.len()).unwrap();

    let coinbase = Transaction {
      version: Version::TWO,
      lock_time: LockTime::ZERO,
      input: vec![TxIn {
        previous_output: OutPoint::null(),
        script_sig: bitcoin::script::Builder::new()
          .push_int(height.into())
          .push_int(self.nonce.into())
          .into_script(),
        sequence: Sequence::MAX,
        witness: Witness::new(),
      }],
      output: vec![reward.unwrap_or(TxOut {
        value: Amount::from_int_btc(50),
        script_pubkey: ScriptBuf::new(),
      })],
    };

    let mut txdata = vec![coinbase.clone()];
    txdata.append(&mut self.mempool);

    let mut block = Block {
      header: Header {
        version: block::Version::TWO,
        prev_blockhash: self.hashes.last().copied().unwrap_or(BlockHash::all_zeros()),
        merkle_root: TxMerkleNode::all_zeros(),
        time: 1_600_000_000 + height * 600,
        bits: CompactTarget::from_consensus(0x207f_ffff),
        nonce: self.nonce,
      },
      txdata,
    };

    block.header.merkle_root = block
      .compute_merkle_root()
      .unwrap_or(TxMerkleNode::all_zeros());

    self.nonce += 1;

    self.register(&coinbase);

    let hash = block.block_hash();
    self.hashes.push(hash);
    self.blocks.insert(hash, block.clone());

    block
  }

  fn register(&mut self, transaction: &Transaction) {
    let txid = transaction.compute_txid();

    for (vout, output) in transaction.output.iter().enumerate() {
      if output.script_pubkey.is_op_return() {
        continue;
      }

      self.utxos.insert(
        OutPoint {
          txid,
          vout: u32::try_from(vout).unwrap(),
        },
        output.clone(),
      );
    }

    if !self.history.contains(&txid) {
      self.history.push(txid);
    }

    self.transactions.insert(txid, transaction.clone());
  }

  pub(crate) fn broadcast(&mut self, transaction: Transaction) -> Result<Txid> {
    let txid = transaction.compute_txid();

    ensure!(
      !self.transactions.contains_key(&txid),
      "transaction {txid} already known"
    );

    for input in &transaction.input {
      ensure!(
        self.utxos.contains_key(&input.previous_output),
        "bad-txns-inputs-missingorspent: {}",
        input.previous_output
      );
    }

    for input in &transaction.input {
      self.utxos.remove(&input.previous_output);
    }

    self.register(&transaction);
    self.mempool.push(transaction);

    Ok(txid)
  }

  pub(crate) fn invalidate_tip(&mut self) -> BlockHash {
    let hash = self.hashes.pop().unwrap();
    let block = self.blocks.remove(&hash).unwrap();

    let mut transactions = block.txdata.into_iter();

    if let Some(coinbase) = transactions.next() {
      let txid = coinbase.compute_txid();
      self.utxos.retain(|outpoint, _| outpoint.txid != txid);
      self.transactions.remove(&txid);
      self.history.retain(|known| *known != txid);
    }

    let mut returned = transactions.collect::<Vec<Transaction>>();
    returned.append(&mut self.mempool);
    self.mempool = returned;

    hash
  }

  /// Height and block of the block that confirmed `txid`.
  pub(crate) fn containing_block(&self, txid: Txid) -> Option<(u64, &Block)> {
    self
      .hashes
      .iter()
      .enumerate()
      .map(|(height, hash)| (u64::try_from(height).unwrap(), &self.blocks[hash]))
      .find(|(_, block)| {
        block
          .txdata
          .iter()
          .any(|transaction| transaction.compute_txid() == txid)
      })
  }

  pub(crate) fn confirmations(&self, txid: Txid) -> u32 {
    self
      .containing_block(txid)
      .map(|(height, _)| u32::try_from(self.height() - height + 1).unwrap())
      .unwrap_or_default()
  }

  pub(crate) fn address_of(&self, script: &bitcoin::Script) -> Option<String> {
    Address::from_script(script, self.network)
      .ok()
      .map(|address| address.to_string())
  }

  pub(crate) fn label_of(&self, address: &str) -> Option<&str> {
    self
      .imports
      .iter()
      .find(|import| import.address == address)
      .map(|import| import.label.as_str())
  }
}
