use super::*;

impl Node for Handle {
  fn get_info(&self) -> Result<NodeInfo> {
    let mut state = self.state();

    if state.pending_probes > 0 {
      state.pending_probes -= 1;
      bail!("Rescanning...");
    }

    ensure!(!state.busy, "Loading block index...");

    let tip = state.tip();

    Ok(NodeInfo {
      blocks: state.height(),
      best_block_hash: tip,
      time: state.blocks[&tip].header.time.into(),
    })
  }

  fn get_block_count(&self) -> Result<u64> {
    Ok(self.state().height())
  }

  fn get_block_hash(&self, height: u64) -> Result<Option<BlockHash>> {
    Ok(self.state().hashes.get(usize::try_from(height)?).copied())
  }

  fn get_block(&self, hash: &BlockHash) -> Result<Block> {
    self
      .state()
      .blocks
      .get(hash)
      .cloned()
      .with_context(|| format!("block {hash} not found"))
  }

  fn get_block_header(&self, hash: &BlockHash) -> Result<Header> {
    Ok(self.get_block(hash)?.header)
  }

  fn get_raw_transaction(&self, txid: &Txid) -> Result<Option<Transaction>> {
    Ok(self.state().transactions.get(txid).cloned())
  }

  fn get_raw_transactions(&self, txids: &[Txid]) -> Result<Vec<Transaction>> {
    let state = self.state();

    txids
      .iter()
      .map(|txid| {
        state
          .transactions
          .get(txid)
          .cloned()
          .ok_or_else(|| anyhow!("No such mempool or blockchain transaction {txid}"))
      })
      .collect()
  }

  fn send_raw_transaction(&self, transaction: &Transaction) -> Result<Txid> {
    self.state().broadcast(transaction.clone())
  }

  fn get_raw_mempool(&self) -> Result<Vec<Txid>> {
    Ok(
      self
        .state()
        .mempool
        .iter()
        .map(Transaction::compute_txid)
        .collect(),
    )
  }

  fn list_unspent(&self, min_conf: u32, addresses: Option<&[String]>) -> Result<Vec<Unspent>> {
    let state = self.state();

    let mut unspent = Vec::new();

    for (outpoint, output) in &state.utxos {
      let Some(address) = state.address_of(&output.script_pubkey) else {
        continue;
      };

      if state.label_of(&address).is_none() {
        continue;
      }

      if addresses.is_some_and(|filter| !filter.contains(&address)) {
        continue;
      }

      let confirmations = state.confirmations(outpoint.txid);

      if confirmations < min_conf {
        continue;
      }

      unspent.push(Unspent {
        txid: outpoint.txid,
        vout: outpoint.vout,
        address: Some(address),
        script_pub_key: output.script_pubkey.clone(),
        amount: output.value,
        confirmations,
      });
    }

    Ok(unspent)
  }

  fn list_transactions(
    &self,
    label: &str,
    count: usize,
    skip: usize,
    _include_watch_only: bool,
  ) -> Result<Vec<WalletTransaction>> {
    let state = self.state();

    let mut entries = Vec::new();

    for txid in &state.history {
      let transaction = &state.transactions[txid];

      let block = state.containing_block(*txid);

      for output in &transaction.output {
        let Some(address) = state.address_of(&output.script_pubkey) else {
          continue;
        };

        if state.label_of(&address) != Some(label) {
          continue;
        }

        entries.push(WalletTransaction {
          txid: *txid,
          address: Some(address),
          confirmations: state.confirmations(*txid).into(),
          blockhash: block.map(|(_, block)| block.block_hash()),
          blocktime: block.map(|(_, block)| block.header.time.into()),
          timereceived: Some(State::RECEIVED_TIME),
        });
      }
    }

    let end = entries.len().saturating_sub(skip);
    let start = end.saturating_sub(count);

    Ok(entries[start..end].to_vec())
  }

  fn import_address(&self, address: &str, label: &str, rescan: bool) -> Result<()> {
    let mut state = self.state();

    state.imports.push(Import {
      address: address.into(),
      label: label.into(),
      rescan,
    });

    if rescan {
      state.pending_probes = state.rescan_probes;
    }

    Ok(())
  }

  fn call(&self, method: &str, params: &[serde_json::Value]) -> Result<serde_json::Value> {
    match method {
      "getblockcount" => Ok(self.state().height().into()),
      "getbestblockhash" => Ok(self.state().tip().to_string().into()),
      "echo" => Ok(params.into()),
      _ => bail!("Method not found: {method}"),
    }
  }
}
