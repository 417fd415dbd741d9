use {
  self::{
    entry::*,
    reorg::{BlockState, Reorg},
    updater::Updater,
  },
  super::*,
};

pub use self::query::{
  Balance, HolderBalance, InputAssets, IssuanceInfo, OutputAssets, TransactionHistory, TxOutAssets,
  UtxoAssets,
};

pub(crate) mod entry;
pub mod event;
pub(crate) mod gate;
mod query;
mod reorg;
mod updater;

/// Node and index status, as reported by `info` and `Event::Info`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Info {
  pub blocks: Option<u64>,
  pub timestamp: Option<u64>,
  pub ccheight: Option<u64>,
  pub cctimestamp: Option<u64>,
  pub bitcoindbusy: bool,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub error: Option<String>,
}

/// What one ingestion pass did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Pass {
  Block { height: u64 },
  Mempool { transactions: usize },
  Rollback { tip: i64 },
}

impl Pass {
  fn advanced(self) -> bool {
    matches!(self, Self::Block { .. } | Self::Rollback { .. })
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportOutcome {
  pub addresses: Vec<String>,
  pub reindex: bool,
}

pub struct Index {
  chain: Chain,
  event_sender: Option<mpsc::Sender<Event>>,
  gate: ParseGate,
  imported: Arc<Mutex<()>>,
  info: Arc<Mutex<Info>>,
  node: Arc<dyn Node>,
  rescan: Mutex<Option<JoinHandle<Result>>>,
  settings: Settings,
  store: Arc<dyn Store>,
}

impl Index {
  pub fn open(settings: &Settings) -> Result<Self> {
    Index::open_with_event_sender(settings, None)
  }

  pub fn open_with_event_sender(
    settings: &Settings,
    event_sender: Option<mpsc::Sender<Event>>,
  ) -> Result<Self> {
    let node = RpcNode::open(settings)?;
    let store = RedbStore::open(&settings.index_path()?)?;

    Ok(
      Index::new(settings, Arc::new(node), Arc::new(store)).with_event_sender(event_sender),
    )
  }

  pub fn new(settings: &Settings, node: Arc<dyn Node>, store: Arc<dyn Store>) -> Self {
    Self {
      chain: settings.chain(),
      event_sender: None,
      gate: ParseGate::default(),
      imported: default(),
      info: Arc::new(Mutex::new(Info {
        bitcoindbusy: true,
        ..default()
      })),
      node,
      rescan: Mutex::new(None),
      settings: settings.clone(),
      store,
    }
  }

  pub fn with_event_sender(self, event_sender: Option<mpsc::Sender<Event>>) -> Self {
    Self {
      event_sender,
      ..self
    }
  }

  pub fn chain(&self) -> Chain {
    self.chain
  }

  pub fn info(&self) -> Info {
    self.info.lock().clone()
  }

  /// Query the node and return a fresh status record.
  pub fn node_info(&self) -> Result<Info> {
    self.wait_for_node()?;
    self.refresh_info()?;
    Ok(self.info())
  }

  pub(crate) fn emit(&self, event: Event) {
    if let Some(sender) = &self.event_sender
      && let Err(err) = sender.blocking_send(event)
    {
      log::debug!("Dropping event, receiver closed: {err}");
    }
  }

  /// Block until the node answers `getinfo`, polling while it is busy.
  fn wait_for_node(&self) -> Result {
    wait_for_node(
      &*self.node,
      &self.info,
      self.settings.busy_poll_interval(),
    )
  }

  fn refresh_info(&self) -> Result {
    let node_info = self.node.get_info()?;

    let tip = self.indexed_tip()?;

    let mut info = self.info.lock();

    info.blocks = Some(node_info.blocks);
    info.timestamp = Some(node_info.time);

    if info.ccheight.is_none()
      && let Some((height, time)) = tip
    {
      info.ccheight = Some(height);
      info.cctimestamp = time;
    }

    Ok(())
  }

  /// Height and block time of the last applied block.
  fn indexed_tip(&self) -> Result<Option<(u64, Option<u64>)>> {
    let Some(height) = self.last_block_height()? else {
      return Ok(None);
    };

    let Ok(height) = u64::try_from(height) else {
      return Ok(None);
    };

    Ok(Some((
      height,
      self.store.load::<u64>(Table::Blocks, LAST_TIMESTAMP)?,
    )))
  }

  pub fn last_block_height(&self) -> Result<Option<i64>> {
    self.store.load(Table::Blocks, LAST_BLOCK_HEIGHT)
  }

  pub fn block_hash(&self, height: Option<u64>) -> Result<Option<BlockHash>> {
    match height {
      Some(height) => self.store.load(Table::Blocks, &height.to_string()),
      None => Ok(None),
    }
  }

  fn next_height(&self) -> Result<u64> {
    Ok(match self.last_block_height()? {
      Some(last) => u64::try_from(last.saturating_add(1))
        .unwrap_or_default()
        .max(self.chain.first_colored_height()),
      None => self.chain.first_colored_height(),
    })
  }

  fn pass(&self) -> Result<Pass> {
    self.wait_for_node()?;
    self.refresh_info()?;

    let height = self.next_height()?;

    let updater = Updater { index: self };

    match Reorg::block_state(self, height)? {
      BlockState::NotExists => Ok(Pass::Mempool {
        transactions: updater.parse_mempool()?,
      }),
      BlockState::Good(block) => {
        updater.apply_block(height, *block)?;
        Ok(Pass::Block { height })
      }
      BlockState::Forked => {
        let tip = Reorg::rollback(self, height)?;
        self.info.lock().ccheight = u64::try_from(tip).ok();
        Ok(Pass::Rollback { tip })
      }
    }
  }

  pub fn is_parsing(&self) -> bool {
    self.gate.is_parsing()
  }

  /// Run one pass unless another is in flight. Returns whether it ran.
  pub fn parse_now(&self) -> Result<bool> {
    Ok(self.try_pass()?.is_some())
  }

  fn try_pass(&self) -> Result<Option<Pass>> {
    self.gate.try_parse(|| self.pass()).transpose()
  }

  /// Run passes until one finds no new block, then return the last pass.
  pub fn update(&self) -> Result<Pass> {
    loop {
      let pass = self.gate.parse(|| self.pass())?;

      if !pass.advanced() || SHUTTING_DOWN.load(atomic::Ordering::Relaxed) {
        return Ok(pass);
      }
    }
  }

  /// Follow the chain until shutdown, optionally importing watch addresses
  /// with a rescan first.
  pub fn run(&self, addresses: &[String]) -> Result {
    if !addresses.is_empty() {
      let outcome = self.import_addresses(addresses, true)?;
      log::info!(
        "Importing {} watch addresses, rescan: {}",
        outcome.addresses.len(),
        outcome.reindex
      );
    }

    let mut last_info = Instant::now();

    while !SHUTTING_DOWN.load(atomic::Ordering::Relaxed) {
      let advanced = match self.try_pass() {
        Ok(pass) => pass.is_some_and(Pass::advanced),
        Err(err) => {
          log::error!("Parse pass failed: {err}");
          false
        }
      };

      if last_info.elapsed() >= self.settings.info_interval() {
        self.emit(Event::Info(self.info()));
        last_info = Instant::now();
      }

      if !advanced {
        thread::sleep(self.settings.poll_interval());
      }
    }

    self.join_rescan()
  }

  /// Import the addresses in `addresses` that are not watched yet.
  ///
  /// With `reindex`, the last new address is imported with a rescan on a
  /// background thread, and the node is reported busy until it finishes.
  pub fn import_addresses(&self, addresses: &[String], reindex: bool) -> Result<ImportOutcome> {
    self.wait_for_node()?;

    let imported = self
      .store
      .load::<AddressSetEntry>(Table::Addresses, IMPORTED)?
      .unwrap_or_default();

    let mut new = addresses
      .iter()
      .filter(|address| !imported.contains(*address))
      .cloned()
      .collect::<IndexSet<String>>()
      .into_iter()
      .collect::<Vec<String>>();

    let rescan = if reindex { new.pop() } else { None };

    let label = self.settings.label();

    for address in &new {
      self.node.import_address(address, label, false)?;
    }

    let Some(rescan) = rescan else {
      persist_imported(&*self.store, &self.imported, addresses)?;
      return Ok(ImportOutcome {
        addresses: addresses.to_vec(),
        reindex: false,
      });
    };

    self.join_rescan()?;

    self.info.lock().bitcoindbusy = true;

    let node = self.node.clone();
    let store = self.store.clone();
    let lock = self.imported.clone();
    let info = self.info.clone();
    let label = label.to_string();
    let interval = self.settings.busy_poll_interval();
    let addresses = addresses.to_vec();

    log::info!("Importing {rescan} with rescan");

    let handle = {
      let addresses = addresses.clone();
      thread::spawn(move || -> Result {
        if let Err(err) = node.import_address(&rescan, &label, true) {
          log::warn!("Rescan import of {rescan} failed: {err}");
        }
        wait_for_node(&*node, &info, interval)?;
        persist_imported(&*store, &lock, &addresses)
      })
    };

    *self.rescan.lock() = Some(handle);

    Ok(ImportOutcome {
      addresses,
      reindex: true,
    })
  }

  /// Wait for a background rescan started by `import_addresses`.
  pub fn join_rescan(&self) -> Result {
    let handle = self.rescan.lock().take();

    match handle {
      Some(handle) => handle
        .join()
        .map_err(|_| anyhow!("rescan thread panicked"))?,
      None => Ok(()),
    }
  }

  /// Broadcast a raw transaction and index it with its unindexed mempool
  /// ancestors.
  pub fn transmit(&self, raw: &str) -> Result<Txid> {
    self.wait_for_node()?;

    let transaction: Transaction = consensus::deserialize(
      &hex::decode(raw.trim()).context("raw transaction is not valid hex")?,
    )
    .context("failed to decode raw transaction")?;

    let txid = self.node.send_raw_transaction(&transaction)?;

    log::info!("Broadcast {txid}");

    if let Err(err) = self
      .gate
      .parse(|| Updater { index: self }.parse_transmitted(transaction))
    {
      log::error!("Failed to index broadcast transaction {txid}: {err}");
    }

    Ok(txid)
  }

  /// Forward a raw RPC call to the node.
  pub fn proxy(&self, method: &str, params: &[serde_json::Value]) -> Result<serde_json::Value> {
    self.wait_for_node()?;

    let answer = self.node.call(method, params)?;

    Ok(self.inject_colored_utxos(method, answer))
  }

  fn inject_colored_utxos(&self, _method: &str, answer: serde_json::Value) -> serde_json::Value {
    answer
  }
}

fn wait_for_node(node: &dyn Node, info: &Mutex<Info>, interval: Duration) -> Result {
  while info.lock().bitcoindbusy {
    if SHUTTING_DOWN.load(atomic::Ordering::Relaxed) {
      bail!("shutting down while waiting for Bitcoin Core");
    }

    thread::sleep(interval);

    match node.get_info() {
      Ok(_) => {
        let mut info = info.lock();
        info.error = None;
        info.bitcoindbusy = false;
      }
      Err(err) => {
        log::info!("Waiting for Bitcoin Core: {err}");
        info.lock().error = Some(err.to_string());
      }
    }
  }

  Ok(())
}

/// Add `addresses` to the imported set. `lock` serializes the
/// read-modify-write between callers and the rescan thread.
fn persist_imported(store: &dyn Store, lock: &Mutex<()>, addresses: &[String]) -> Result {
  let _guard = lock.lock();

  let mut imported = store
    .load::<AddressSetEntry>(Table::Addresses, IMPORTED)?
    .unwrap_or_default();

  let before = imported.len();

  imported.extend(addresses.iter().cloned());

  if imported.len() > before {
    store.save(Table::Addresses, IMPORTED, &imported)?;
  }

  Ok(())
}
