use super::*;

/// Version byte that prefixes every stored record.
pub(crate) const ENTRY_VERSION: u8 = 1;

pub(crate) trait Entry: Sized {
  fn load(table: Table, key: &str, value: &[u8]) -> Result<Self, SnafuError>;

  fn store(&self) -> Result<Vec<u8>, SnafuError>;
}

impl<T: Serialize + DeserializeOwned> Entry for T {
  fn load(table: Table, key: &str, value: &[u8]) -> Result<Self, SnafuError> {
    let corruption = |reason: String| SnafuError::StoreCorruption {
      table,
      key: key.into(),
      reason,
    };

    match value.split_first() {
      Some((&ENTRY_VERSION, json)) => {
        serde_json::from_slice(json).map_err(|err| corruption(err.to_string()))
      }
      Some((version, _)) => Err(corruption(format!("unknown record version {version}"))),
      None => Err(corruption("empty record".into())),
    }
  }

  fn store(&self) -> Result<Vec<u8>, SnafuError> {
    let mut value = vec![ENTRY_VERSION];
    serde_json::to_writer(&mut value, self).snafu_context(error::EntryEncode)?;
    Ok(value)
  }
}

/// Issuance parameters recorded per issuing transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuanceMeta {
  pub divisibility: u8,
  pub lock_status: bool,
  pub aggregation_policy: AggregationPolicy,
}

impl From<&AssetRecord> for IssuanceMeta {
  fn from(record: &AssetRecord) -> Self {
    Self {
      divisibility: record.divisibility,
      lock_status: record.lock_status,
      aggregation_policy: record.aggregation_policy,
    }
  }
}

pub(crate) type UtxoAssetsEntry = Vec<AssetRecord>;
pub(crate) type AddressSetEntry = IndexSet<String>;
pub(crate) type UtxoSetEntry = IndexSet<String>;
pub(crate) type IssuanceEntry = IndexMap<Txid, IssuanceMeta>;
pub(crate) type TxidSetEntry = IndexSet<Txid>;

pub(crate) const LAST_BLOCK_HEIGHT: &str = "lastBlockHeight";
pub(crate) const LAST_TIMESTAMP: &str = "lastTimestamp";
pub(crate) const PARSED: &str = "parsed";
pub(crate) const IMPORTED: &str = "imported";

pub(crate) fn outpoint_key(outpoint: OutPoint) -> String {
  format!("{}:{}", outpoint.txid, outpoint.vout)
}

impl dyn Store + '_ {
  pub(crate) fn load<T: Entry>(&self, table: Table, key: &str) -> Result<Option<T>> {
    self
      .get(table, key)?
      .map(|value| T::load(table, key, &value))
      .transpose()
      .map_err(Into::into)
  }

  pub(crate) fn load_many<T: Entry>(&self, table: Table, keys: &[String]) -> Result<Vec<Option<T>>> {
    self
      .get_many(table, keys)?
      .into_iter()
      .zip(keys)
      .map(|(value, key)| {
        value
          .map(|value| T::load(table, key, &value))
          .transpose()
          .map_err(Into::into)
      })
      .collect()
  }

  pub(crate) fn save<T: Entry>(&self, table: Table, key: &str, value: &T) -> Result {
    self.set(table, key, &value.store()?)
  }

  pub(crate) fn save_many<T: Entry>(&self, table: Table, entries: &[(String, T)]) -> Result {
    let entries = entries
      .iter()
      .map(|(key, value)| Ok((key.clone(), value.store()?)))
      .collect::<Result<Vec<(String, Vec<u8>)>, SnafuError>>()?;

    self.set_many(table, &entries)
  }
}
