use {
  self::colorer::{Colored, Colorer, UtxoChanges},
  super::*,
};

mod colorer;
mod dependencies;

enum Completion<'a> {
  Tip {
    hash: BlockHash,
    height: u64,
    time: u32,
  },
  Mempool(&'a [Txid]),
}

pub(super) struct Updater<'index> {
  pub(super) index: &'index Index,
}

impl Updater<'_> {
  pub(super) fn apply_block(&self, height: u64, block: Block) -> Result {
    let hash = block.block_hash();
    let time = block.header.time;

    log::info!(
      "Indexing block {height} {hash} with {} transactions, mined {}",
      block.txdata.len(),
      timestamp(time.into()),
    );

    let txids = block
      .txdata
      .iter()
      .map(Transaction::compute_txid)
      .collect::<Vec<Txid>>();

    let transactions = txids
      .iter()
      .copied()
      .zip(&block.txdata)
      .collect::<HashMap<Txid, &Transaction>>();

    let mut changes = UtxoChanges::default();
    let mut events = Vec::new();

    for (transaction, txid) in block.txdata.iter().zip(&txids) {
      self.color(
        &mut changes,
        &mut events,
        &transactions,
        transaction,
        *txid,
        Some(height),
      )?;
    }

    self.commit(&changes, &transactions, Completion::Tip { hash, height, time })?;

    {
      let mut info = self.index.info.lock();
      info.ccheight = Some(height);
      info.cctimestamp = Some(time.into());
    }

    for event in events {
      self.index.emit(event);
    }

    self.index.emit(Event::NewBlock {
      hash,
      height,
      previous: block.header.prev_blockhash,
      timestamp: time,
      txids,
    });

    Ok(())
  }

  /// Index mempool transactions not seen by an earlier pass.
  pub(super) fn parse_mempool(&self) -> Result<usize> {
    let parsed = self
      .index
      .store
      .load::<TxidSetEntry>(Table::Mempool, PARSED)?
      .unwrap_or_default();

    let new = self
      .index
      .node
      .get_raw_mempool()?
      .into_iter()
      .filter(|txid| !parsed.contains(txid))
      .collect::<Vec<Txid>>();

    if new.is_empty() {
      return Ok(0);
    }

    log::debug!("Indexing {} new mempool transactions", new.len());

    let transactions = self.index.node.get_raw_transactions(&new)?;

    self.parse_mempool_transactions(transactions)
  }

  /// Index a freshly broadcast transaction together with its unindexed
  /// mempool ancestors.
  pub(super) fn parse_transmitted(&self, transaction: Transaction) -> Result<usize> {
    let parsed = self
      .index
      .store
      .load::<TxidSetEntry>(Table::Mempool, PARSED)?
      .unwrap_or_default();

    let mempool = self
      .index
      .node
      .get_raw_mempool()?
      .into_iter()
      .collect::<HashSet<Txid>>();

    let mut seen = HashSet::from([transaction.compute_txid()]);

    let mut frontier = spent_txids(&transaction);

    let mut batch = VecDeque::from([transaction]);

    loop {
      let wanted = frontier
        .drain(..)
        .filter(|txid| mempool.contains(txid) && !parsed.contains(txid) && seen.insert(*txid))
        .collect::<Vec<Txid>>();

      if wanted.is_empty() {
        break;
      }

      for ancestor in self.index.node.get_raw_transactions(&wanted)? {
        frontier.extend(spent_txids(&ancestor));
        batch.push_front(ancestor);
      }
    }

    self.parse_mempool_transactions(batch.into())
  }

  fn parse_mempool_transactions(&self, transactions: Vec<Transaction>) -> Result<usize> {
    let ordered = dependencies::order(transactions)?;

    let txids = ordered.iter().map(|(_, txid)| *txid).collect::<Vec<Txid>>();

    let transactions = ordered
      .iter()
      .map(|(transaction, txid)| (*txid, transaction))
      .collect::<HashMap<Txid, &Transaction>>();

    let mut changes = UtxoChanges::default();
    let mut events = Vec::new();

    for (transaction, txid) in &ordered {
      self.color(
        &mut changes,
        &mut events,
        &transactions,
        transaction,
        *txid,
        None,
      )?;
    }

    self.commit(&changes, &transactions, Completion::Mempool(&txids))?;

    for event in events {
      self.index.emit(event);
    }

    Ok(txids.len())
  }

  /// Color one transaction of a batch. Its events are queued in `events` and
  /// sent once the batch is committed.
  fn color(
    &self,
    changes: &mut UtxoChanges,
    events: &mut Vec<Event>,
    batch: &HashMap<Txid, &Transaction>,
    transaction: &Transaction,
    txid: Txid,
    block_height: Option<u64>,
  ) -> Result {
    let colored = Colorer {
      changes,
      store: &*self.index.store,
    }
    .color(transaction, txid, || self.previous_script(batch, transaction))?;

    if self.index.event_sender.is_none() {
      return Ok(());
    }

    if let Some(Colored { inputs, outputs }) = colored {
      events.push(Event::NewColoredTransaction {
        block_height,
        inputs,
        outputs,
        txid,
      });
    }

    events.push(Event::NewTransaction {
      block_height,
      transaction: transaction.clone(),
      txid,
    });

    Ok(())
  }

  /// Script of the output spent by the first input of `transaction`, looked
  /// up in `batch` first and then on the node.
  fn previous_script(
    &self,
    batch: &HashMap<Txid, &Transaction>,
    transaction: &Transaction,
  ) -> Result<ScriptBuf> {
    let Some(outpoint) = transaction
      .input
      .first()
      .map(|input| input.previous_output)
      .filter(|outpoint| !outpoint.is_null())
    else {
      return Ok(ScriptBuf::new());
    };

    let fetched;

    let previous = match batch.get(&outpoint.txid) {
      Some(previous) => *previous,
      None => {
        fetched = self
          .index
          .node
          .get_raw_transaction(&outpoint.txid)?
          .with_context(|| {
            format!(
              "transaction {} spent by {} not found",
              outpoint.txid,
              transaction.compute_txid()
            )
          })?;
        &fetched
      }
    };

    previous
      .output
      .get(usize::try_from(outpoint.vout)?)
      .map(|output| output.script_pubkey.clone())
      .with_context(|| format!("output {outpoint} not found"))
  }

  fn commit(
    &self,
    changes: &UtxoChanges,
    transactions: &HashMap<Txid, &Transaction>,
    completion: Completion,
  ) -> Result {
    let store = &*self.index.store;
    let chain = self.index.chain;

    let mut asset_addresses = IndexMap::<String, AddressSetEntry>::new();
    let mut asset_issuance = IndexMap::<String, IssuanceEntry>::new();
    let mut transaction_utxos = IndexMap::<String, UtxoSetEntry>::new();
    let mut address_utxos = IndexMap::<String, UtxoSetEntry>::new();

    for (outpoint, assets) in &changes.unused {
      let key = outpoint_key(*outpoint);

      let address = transactions
        .get(&outpoint.txid)
        .and_then(|transaction| {
          transaction
            .output
            .get(usize::try_from(outpoint.vout).ok()?)
        })
        .and_then(|output| chain.address_from_script(&output.script_pubkey));

      for record in assets {
        asset_addresses
          .entry(record.asset_id.to_string())
          .or_default()
          .extend(address.clone());

        asset_issuance
          .entry(record.asset_id.to_string())
          .or_default()
          .insert(record.issue_txid, IssuanceMeta::from(record));
      }

      transaction_utxos
        .entry(outpoint.txid.to_string())
        .or_default()
        .insert(key.clone());

      if let Some(address) = address {
        address_utxos.entry(address).or_default().insert(key);
      }
    }

    thread::scope(|scope| -> Result {
      let merges = [
        scope.spawn(move || merge_sets(store, Table::AssetAddresses, asset_addresses)),
        scope.spawn(move || merge_issuance(store, asset_issuance)),
        scope.spawn(move || merge_sets(store, Table::TransactionUtxos, transaction_utxos)),
        scope.spawn(move || merge_sets(store, Table::AddressUtxos, address_utxos)),
      ];

      for merge in merges {
        merge
          .join()
          .map_err(|_| anyhow!("index merge thread panicked"))??;
      }

      Ok(())
    })?;

    let utxos = changes
      .unused
      .iter()
      .map(|(outpoint, assets)| (outpoint_key(*outpoint), assets.clone()))
      .collect::<Vec<(String, UtxoAssetsEntry)>>();

    store.save_many(Table::Utxos, &utxos)?;

    match completion {
      Completion::Tip { hash, height, time } => {
        store.save(Table::Blocks, &height.to_string(), &hash)?;
        store.save(Table::Blocks, LAST_BLOCK_HEIGHT, &i64::try_from(height)?)?;
        store.save(Table::Blocks, LAST_TIMESTAMP, &u64::from(time))?;
      }
      Completion::Mempool(txids) => {
        let mut parsed = store
          .load::<TxidSetEntry>(Table::Mempool, PARSED)?
          .unwrap_or_default();
        let before = parsed.len();
        parsed.extend(txids.iter().copied());
        if parsed.len() > before {
          store.save(Table::Mempool, PARSED, &parsed)?;
        }
      }
    }

    Ok(())
  }
}

fn spent_txids(transaction: &Transaction) -> Vec<Txid> {
  transaction
    .input
    .iter()
    .filter(|input| !input.previous_output.is_null())
    .map(|input| input.previous_output.txid)
    .collect()
}

fn merge_sets(store: &dyn Store, table: Table, updates: IndexMap<String, IndexSet<String>>) -> Result {
  if updates.is_empty() {
    return Ok(());
  }

  let keys = updates.keys().cloned().collect::<Vec<String>>();

  let current = store.load_many::<IndexSet<String>>(table, &keys)?;

  let mut writes = Vec::new();

  for ((key, additions), current) in updates.into_iter().zip(current) {
    match current {
      Some(mut set) => {
        let before = set.len();
        set.extend(additions);
        if set.len() > before {
          writes.push((key, set));
        }
      }
      None => writes.push((key, additions)),
    }
  }

  store.save_many(table, &writes)
}

fn merge_issuance(store: &dyn Store, updates: IndexMap<String, IssuanceEntry>) -> Result {
  if updates.is_empty() {
    return Ok(());
  }

  let keys = updates.keys().cloned().collect::<Vec<String>>();

  let current = store.load_many::<IssuanceEntry>(Table::AssetIssuance, &keys)?;

  let writes = updates
    .into_iter()
    .zip(current)
    .map(|((key, issuances), current)| {
      let mut merged = current.unwrap_or_default();
      merged.extend(issuances);
      (key, merged)
    })
    .collect::<Vec<(String, IssuanceEntry)>>();

  store.save_many(Table::AssetIssuance, &writes)
}
