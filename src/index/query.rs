use super::*;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Balance {
  pub total: Decimal,
  pub unconfirmed: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HolderBalance {
  pub total_balance: Decimal,
  pub unconfirmed_balance: Decimal,
}

impl HolderBalance {
  fn add(&mut self, record: &AssetRecord, confirmations: u32) -> Result<(), SnafuError> {
    self.total_balance.add_amount(record)?;
    if confirmations == 0 {
      self.unconfirmed_balance.add_amount(record)?;
    }
    Ok(())
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuanceInfo {
  pub amount: Decimal,
  pub divisibility: u8,
  pub lock_status: bool,
  pub aggregation_policy: AggregationPolicy,
}

/// A wallet output annotated with its assets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UtxoAssets {
  #[serde(flatten)]
  pub unspent: Unspent,
  pub assets: Vec<AssetRecord>,
  /// `-1` while unconfirmed.
  pub blockheight: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TxOutAssets {
  pub txid: Txid,
  pub vout: u32,
  pub assets: Vec<AssetRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputAssets {
  pub previous_output: OutPoint,
  pub address: Option<String>,
  /// Value of the spent output in satoshis, absent for coinbase inputs.
  pub value: Option<u64>,
  pub assets: Vec<AssetRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputAssets {
  pub n: u32,
  pub address: Option<String>,
  pub value: u64,
  pub assets: Vec<AssetRecord>,
}

/// A wallet transaction touching watched addresses. Amounts are satoshis and
/// times are milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionHistory {
  pub txid: Txid,
  pub confirmations: i64,
  pub blockheight: i64,
  pub blocktime: u64,
  pub fee: i64,
  pub totalsent: u64,
  pub vin: Vec<InputAssets>,
  pub vout: Vec<OutputAssets>,
}

impl Index {
  const HISTORY_PAGE: usize = 10;

  fn prepare(&self, wait_for_parsing: bool) -> Result {
    if wait_for_parsing {
      self.gate.wait_for_parsing();
    }

    self.wait_for_node()
  }

  fn colored_unspent(
    &self,
    min_conf: u32,
    addresses: Option<&[String]>,
  ) -> Result<Vec<(Unspent, Vec<AssetRecord>)>> {
    let unspent = self.node.list_unspent(min_conf, addresses)?;

    self.with_assets(unspent)
  }

  fn with_assets(&self, unspent: Vec<Unspent>) -> Result<Vec<(Unspent, Vec<AssetRecord>)>> {
    let keys = unspent
      .iter()
      .map(|unspent| outpoint_key(unspent.outpoint()))
      .collect::<Vec<String>>();

    let assets = self
      .store
      .load_many::<UtxoAssetsEntry>(Table::Utxos, &keys)?;

    Ok(
      unspent
        .into_iter()
        .zip(assets)
        .map(|(unspent, assets)| (unspent, assets.unwrap_or_default()))
        .collect(),
    )
  }

  fn asset_addresses(&self, asset: &AssetId) -> Result<Option<AddressSetEntry>> {
    self.store.load(Table::AssetAddresses, asset.as_str())
  }

  fn balance(
    &self,
    asset: &AssetId,
    addresses: Option<&[String]>,
    min_conf: u32,
  ) -> Result<Option<Balance>> {
    let Some(holders) = self.asset_addresses(asset)? else {
      return Ok(None);
    };

    let addresses = holders
      .into_iter()
      .filter(|address| addresses.is_none_or(|filter| filter.contains(address)))
      .collect::<Vec<String>>();

    let mut balance = HolderBalance::default();

    if !addresses.is_empty() {
      for (unspent, assets) in self.colored_unspent(min_conf, Some(&addresses))? {
        for record in assets.iter().filter(|record| record.asset_id == *asset) {
          balance.add(record, unspent.confirmations)?;
        }
      }
    }

    Ok(Some(Balance {
      total: balance.total_balance,
      unconfirmed: balance.unconfirmed_balance,
    }))
  }

  /// Balance of `asset` across its holders, optionally restricted to
  /// `addresses`. `None` if the asset is unknown.
  pub fn asset_balance(
    &self,
    asset: &AssetId,
    addresses: Option<&[String]>,
    min_conf: u32,
    wait_for_parsing: bool,
  ) -> Result<Option<Balance>> {
    self.prepare(wait_for_parsing)?;
    self.balance(asset, addresses, min_conf)
  }

  pub fn multi_asset_balance(
    &self,
    assets: &[AssetId],
    addresses: Option<&[String]>,
    min_conf: u32,
    wait_for_parsing: bool,
  ) -> Result<Option<BTreeMap<AssetId, Balance>>> {
    if assets.is_empty() {
      return Ok(None);
    }

    self.prepare(wait_for_parsing)?;

    let mut balances = BTreeMap::new();

    for asset in assets {
      if let Some(balance) = self.balance(asset, addresses, min_conf)? {
        balances.insert(asset.clone(), balance);
      }
    }

    Ok(Some(balances))
  }

  pub fn asset_holders(
    &self,
    asset: &AssetId,
    min_conf: u32,
    wait_for_parsing: bool,
  ) -> Result<Option<BTreeMap<String, HolderBalance>>> {
    self.prepare(wait_for_parsing)?;

    let Some(holders) = self.asset_addresses(asset)? else {
      return Ok(None);
    };

    let mut balances = BTreeMap::<String, HolderBalance>::new();

    if holders.is_empty() {
      return Ok(Some(balances));
    }

    let holders = holders.into_iter().collect::<Vec<String>>();

    for (unspent, assets) in self.colored_unspent(min_conf, Some(&holders))? {
      let Some(address) = &unspent.address else {
        continue;
      };

      for record in assets.iter().filter(|record| record.asset_id == *asset) {
        balances
          .entry(address.clone())
          .or_default()
          .add(record, unspent.confirmations)?;
      }
    }

    Ok(Some(balances))
  }

  /// Amount issued by each issuing transaction of `asset`.
  pub fn asset_issuance(
    &self,
    asset: &AssetId,
    wait_for_parsing: bool,
  ) -> Result<Option<IndexMap<Txid, IssuanceInfo>>> {
    if wait_for_parsing {
      self.gate.wait_for_parsing();
    }

    let Some(issuances) = self
      .store
      .load::<IssuanceEntry>(Table::AssetIssuance, asset.as_str())?
    else {
      return Ok(None);
    };

    let mut result = IndexMap::new();

    for (txid, meta) in issuances {
      let keys = self
        .store
        .load::<UtxoSetEntry>(Table::TransactionUtxos, &txid.to_string())?
        .unwrap_or_default()
        .into_iter()
        .collect::<Vec<String>>();

      let mut amount = Decimal::new(0, meta.divisibility);

      for assets in self
        .store
        .load_many::<UtxoAssetsEntry>(Table::Utxos, &keys)?
        .into_iter()
        .flatten()
      {
        for record in assets
          .iter()
          .filter(|record| record.asset_id == *asset && record.issue_txid == txid)
        {
          amount.add_amount(record)?;
        }
      }

      result.insert(
        txid,
        IssuanceInfo {
          amount,
          divisibility: meta.divisibility,
          lock_status: meta.lock_status,
          aggregation_policy: meta.aggregation_policy,
        },
      );
    }

    Ok(Some(result))
  }

  /// Address that owned the output spent by the first input of the first
  /// issuing transaction of `asset`. Issuing transactions the node no longer
  /// knows are skipped.
  pub fn asset_issuing_address(
    &self,
    asset: &AssetId,
    wait_for_parsing: bool,
  ) -> Result<Option<String>> {
    self.prepare(wait_for_parsing)?;

    let issuances = self
      .store
      .load::<IssuanceEntry>(Table::AssetIssuance, asset.as_str())?
      .unwrap_or_default();

    for txid in issuances.keys() {
      let Some(issuing) = self.node.get_raw_transaction(txid)? else {
        log::debug!("Skipping issuing transaction {txid} of {asset} unknown to the node");
        continue;
      };

      let Some(input) = issuing.input.first() else {
        return Ok(None);
      };

      let previous = input.previous_output;

      let funding = self
        .node
        .get_raw_transaction(&previous.txid)?
        .with_context(|| format!("transaction {} not found", previous.txid))?;

      return Ok(
        funding
          .output
          .get(usize::try_from(previous.vout)?)
          .and_then(|output| self.chain.address_from_script(&output.script_pubkey)),
      );
    }

    Ok(None)
  }

  /// Assets held by `addresses`. `None` for an empty address list.
  pub fn owning_assets(
    &self,
    addresses: &[String],
    min_conf: u32,
    wait_for_parsing: bool,
  ) -> Result<Option<BTreeMap<AssetId, HolderBalance>>> {
    if addresses.is_empty() {
      return Ok(None);
    }

    self.prepare(wait_for_parsing)?;

    let mut balances = BTreeMap::<AssetId, HolderBalance>::new();

    for (unspent, assets) in self.colored_unspent(min_conf, Some(addresses))? {
      for record in &assets {
        balances
          .entry(record.asset_id.clone())
          .or_default()
          .add(record, unspent.confirmations)?;
      }
    }

    Ok(Some(balances))
  }

  fn annotate(&self, unspent: Vec<Unspent>) -> Result<Vec<UtxoAssets>> {
    let count = self.node.get_block_count()?;

    Ok(
      self
        .with_assets(unspent)?
        .into_iter()
        .map(|(unspent, assets)| UtxoAssets {
          blockheight: confirmed_height(count, unspent.confirmations.into()),
          unspent,
          assets,
        })
        .collect(),
    )
  }

  pub fn addresses_utxos(
    &self,
    addresses: &[String],
    min_conf: u32,
    wait_for_parsing: bool,
  ) -> Result<Vec<UtxoAssets>> {
    if addresses.is_empty() {
      return Ok(Vec::new());
    }

    self.prepare(wait_for_parsing)?;

    let unspent = self.node.list_unspent(min_conf, Some(addresses))?;

    self.annotate(unspent)
  }

  /// Wallet outputs among `outpoints`, annotated with their assets. Spent or
  /// unwatched outpoints are omitted.
  pub fn utxos(
    &self,
    outpoints: &[OutPoint],
    min_conf: u32,
    wait_for_parsing: bool,
  ) -> Result<Vec<UtxoAssets>> {
    self.prepare(wait_for_parsing)?;

    let wanted = outpoints.iter().collect::<HashSet<&OutPoint>>();

    let unspent = self
      .node
      .list_unspent(min_conf, None)?
      .into_iter()
      .filter(|unspent| wanted.contains(&unspent.outpoint()))
      .collect();

    self.annotate(unspent)
  }

  /// Indexed assets of `outpoints`, whether or not they are still unspent.
  pub fn txouts(&self, outpoints: &[OutPoint], wait_for_parsing: bool) -> Result<Vec<TxOutAssets>> {
    if wait_for_parsing {
      self.gate.wait_for_parsing();
    }

    let keys = outpoints
      .iter()
      .copied()
      .map(outpoint_key)
      .collect::<Vec<String>>();

    Ok(
      outpoints
        .iter()
        .zip(
          self
            .store
            .load_many::<UtxoAssetsEntry>(Table::Utxos, &keys)?,
        )
        .map(|(outpoint, assets)| TxOutAssets {
          txid: outpoint.txid,
          vout: outpoint.vout,
          assets: assets.unwrap_or_default(),
        })
        .collect(),
    )
  }

  /// Wallet transactions that touch `addresses`, with per-input and
  /// per-output assets.
  pub fn addresses_transactions(
    &self,
    addresses: &[String],
    wait_for_parsing: bool,
  ) -> Result<Vec<TransactionHistory>> {
    self.prepare(wait_for_parsing)?;

    let label = self.settings.label();

    let mut entries = IndexMap::<Txid, WalletTransaction>::new();
    let mut skip = 0;

    loop {
      let page = self
        .node
        .list_transactions(label, Self::HISTORY_PAGE, skip, true)?;

      skip += Self::HISTORY_PAGE;

      let last = page.len() < Self::HISTORY_PAGE;

      for entry in page {
        if entry
          .address
          .as_ref()
          .is_some_and(|address| addresses.contains(address))
          && !entries.contains_key(&entry.txid)
        {
          entries.insert(entry.txid, entry);
        }
      }

      if last {
        break;
      }
    }

    let count = self.node.get_block_count()?;

    let txids = entries.keys().copied().collect::<Vec<Txid>>();

    let transactions = self.node.get_raw_transactions(&txids)?;

    let previous_txids = transactions
      .iter()
      .flat_map(|transaction| &transaction.input)
      .map(|input| input.previous_output)
      .filter(|outpoint| !outpoint.is_null())
      .map(|outpoint| outpoint.txid)
      .collect::<IndexSet<Txid>>()
      .into_iter()
      .collect::<Vec<Txid>>();

    let previous = previous_txids
      .iter()
      .copied()
      .zip(self.node.get_raw_transactions(&previous_txids)?)
      .collect::<HashMap<Txid, Transaction>>();

    let mut history = Vec::with_capacity(transactions.len());

    for (transaction, (txid, entry)) in transactions.into_iter().zip(entries) {
      history.push(self.transaction_history(txid, &transaction, &entry, count, &previous)?);
    }

    Ok(history)
  }

  fn transaction_history(
    &self,
    txid: Txid,
    transaction: &Transaction,
    entry: &WalletTransaction,
    count: u64,
    previous: &HashMap<Txid, Transaction>,
  ) -> Result<TransactionHistory> {
    let input_keys = transaction
      .input
      .iter()
      .map(|input| outpoint_key(input.previous_output))
      .collect::<Vec<String>>();

    let input_assets = self
      .store
      .load_many::<UtxoAssetsEntry>(Table::Utxos, &input_keys)?;

    let vin = transaction
      .input
      .iter()
      .zip(input_assets)
      .map(|(input, assets)| {
        let outpoint = input.previous_output;

        let spent = previous
          .get(&outpoint.txid)
          .and_then(|transaction| transaction.output.get(usize::try_from(outpoint.vout).ok()?));

        InputAssets {
          previous_output: outpoint,
          address: spent.and_then(|output| self.chain.address_from_script(&output.script_pubkey)),
          value: spent.map(|output| output.value.to_sat()),
          assets: assets.unwrap_or_default(),
        }
      })
      .collect::<Vec<InputAssets>>();

    let output_keys = (0..transaction.output.len())
      .map(|vout| Ok(outpoint_key(OutPoint { txid, vout: u32::try_from(vout)? })))
      .collect::<Result<Vec<String>>>()?;

    let output_assets = self
      .store
      .load_many::<UtxoAssetsEntry>(Table::Utxos, &output_keys)?;

    let vout = transaction
      .output
      .iter()
      .zip(output_assets)
      .enumerate()
      .map(|(n, (output, assets))| {
        Ok(OutputAssets {
          n: u32::try_from(n)?,
          address: self.chain.address_from_script(&output.script_pubkey),
          value: output.value.to_sat(),
          assets: assets.unwrap_or_default(),
        })
      })
      .collect::<Result<Vec<OutputAssets>>>()?;

    let totalsent = vin.iter().filter_map(|input| input.value).sum::<u64>();

    let received = vout.iter().map(|output| output.value).sum::<u64>();

    let confirmed = entry.confirmations > 0;

    let seconds = if confirmed {
      entry.blocktime
    } else {
      entry.timereceived
    };

    Ok(TransactionHistory {
      txid,
      confirmations: entry.confirmations,
      blockheight: confirmed_height(count, entry.confirmations),
      blocktime: seconds.unwrap_or_default().saturating_mul(1000),
      fee: i64::try_from(totalsent)? - i64::try_from(received)?,
      totalsent,
      vin,
      vout,
    })
  }
}

/// Height of the block holding an entry with `confirmations`, or `-1` while
/// unconfirmed.
fn confirmed_height(count: u64, confirmations: i64) -> i64 {
  if confirmations > 0 {
    i64::try_from(count).unwrap_or(i64::MAX) - confirmations + 1
  } else {
    -1
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn confirmed_heights() {
    assert_eq!(confirmed_height(100, 1), 100);
    assert_eq!(confirmed_height(100, 3), 98);
    assert_eq!(confirmed_height(100, 0), -1);
    assert_eq!(confirmed_height(100, -2), -1);
  }
}
