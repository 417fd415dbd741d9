use {
  super::*,
  redb::{Database, ReadableDatabase, TableDefinition},
};

macro_rules! define_table {
  ($name:ident) => {
    const $name: TableDefinition<&str, &[u8]> = TableDefinition::new(stringify!($name));
  };
}

define_table! { ADDRESSES }
define_table! { ADDRESS_UTXOS }
define_table! { ASSET_ADDRESSES }
define_table! { ASSET_ISSUANCE }
define_table! { BLOCKS }
define_table! { MEMPOOL }
define_table! { TRANSACTION_UTXOS }
define_table! { UTXOS }

/// Key spaces of the index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Table {
  Utxos,
  Blocks,
  Mempool,
  Addresses,
  AssetAddresses,
  AssetIssuance,
  TransactionUtxos,
  AddressUtxos,
}

impl Table {
  pub const ALL: [Table; 8] = [
    Self::Utxos,
    Self::Blocks,
    Self::Mempool,
    Self::Addresses,
    Self::AssetAddresses,
    Self::AssetIssuance,
    Self::TransactionUtxos,
    Self::AddressUtxos,
  ];

  pub fn name(self) -> &'static str {
    match self {
      Self::Utxos => "utxos",
      Self::Blocks => "blocks",
      Self::Mempool => "mempool",
      Self::Addresses => "addresses",
      Self::AssetAddresses => "asset-addresses",
      Self::AssetIssuance => "asset-issuance",
      Self::TransactionUtxos => "transaction-utxos",
      Self::AddressUtxos => "address-utxos",
    }
  }

  fn definition(self) -> TableDefinition<'static, &'static str, &'static [u8]> {
    match self {
      Self::Utxos => UTXOS,
      Self::Blocks => BLOCKS,
      Self::Mempool => MEMPOOL,
      Self::Addresses => ADDRESSES,
      Self::AssetAddresses => ASSET_ADDRESSES,
      Self::AssetIssuance => ASSET_ISSUANCE,
      Self::TransactionUtxos => TRANSACTION_UTXOS,
      Self::AddressUtxos => ADDRESS_UTXOS,
    }
  }
}

impl Display for Table {
  fn fmt(&self, f: &mut Formatter) -> fmt::Result {
    f.write_str(self.name())
  }
}

/// A key-value store holding one map per [`Table`].
///
/// Writes to different keys are not atomic with respect to each other.
pub trait Store: Send + Sync {
  fn get(&self, table: Table, key: &str) -> Result<Option<Vec<u8>>>;

  fn get_many(&self, table: Table, keys: &[String]) -> Result<Vec<Option<Vec<u8>>>> {
    keys.iter().map(|key| self.get(table, key)).collect()
  }

  fn set(&self, table: Table, key: &str, value: &[u8]) -> Result;

  fn set_many(&self, table: Table, entries: &[(String, Vec<u8>)]) -> Result {
    for (key, value) in entries {
      self.set(table, key, value)?;
    }
    Ok(())
  }
}

pub struct RedbStore {
  database: Database,
}

impl RedbStore {
  pub fn open(path: &Path) -> Result<Self> {
    if let Some(parent) = path.parent() {
      fs::create_dir_all(parent).snafu_context(error::Io { path: parent })?;
    }

    log::info!("Opening index at `{}`", path.display());

    let database = Database::create(path)
      .with_context(|| format!("failed to open index `{}`", path.display()))?;

    let wtx = database.begin_write()?;

    for table in Table::ALL {
      wtx.open_table(table.definition())?;
    }

    wtx.commit()?;

    Ok(Self { database })
  }
}

impl Store for RedbStore {
  fn get(&self, table: Table, key: &str) -> Result<Option<Vec<u8>>> {
    Ok(
      self
        .database
        .begin_read()?
        .open_table(table.definition())?
        .get(key)?
        .map(|value| value.value().to_vec()),
    )
  }

  fn get_many(&self, table: Table, keys: &[String]) -> Result<Vec<Option<Vec<u8>>>> {
    let rtx = self.database.begin_read()?;
    let map = rtx.open_table(table.definition())?;

    let mut values = Vec::with_capacity(keys.len());

    for key in keys {
      values.push(map.get(key.as_str())?.map(|value| value.value().to_vec()));
    }

    Ok(values)
  }

  fn set(&self, table: Table, key: &str, value: &[u8]) -> Result {
    let wtx = self.database.begin_write()?;

    wtx.open_table(table.definition())?.insert(key, value)?;

    wtx.commit()?;

    Ok(())
  }

  fn set_many(&self, table: Table, entries: &[(String, Vec<u8>)]) -> Result {
    if entries.is_empty() {
      return Ok(());
    }

    let wtx = self.database.begin_write()?;

    {
      let mut map = wtx.open_table(table.definition())?;

      for (key, value) in entries {
        map.insert(key.as_str(), value.as_slice())?;
      }
    }

    wtx.commit()?;

    Ok(())
  }
}

#[derive(Default)]
pub struct MemoryStore {
  tables: RwLock<HashMap<(Table, String), Vec<u8>>>,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn len(&self, table: Table) -> usize {
    self
      .tables
      .read()
      .keys()
      .filter(|(key_table, _)| *key_table == table)
      .count()
  }

  /// Every record, ordered by table and key.
  pub fn snapshot(&self) -> BTreeMap<(Table, String), Vec<u8>> {
    self
      .tables
      .read()
      .iter()
      .map(|(key, value)| (key.clone(), value.clone()))
      .collect()
  }
}

impl Store for MemoryStore {
  fn get(&self, table: Table, key: &str) -> Result<Option<Vec<u8>>> {
    Ok(self.tables.read().get(&(table, key.to_string())).cloned())
  }

  fn set(&self, table: Table, key: &str, value: &[u8]) -> Result {
    self
      .tables
      .write()
      .insert((table, key.to_string()), value.to_vec());
    Ok(())
  }

  fn set_many(&self, table: Table, entries: &[(String, Vec<u8>)]) -> Result {
    let mut tables = self.tables.write();

    for (key, value) in entries {
      tables.insert((table, key.clone()), value.clone());
    }

    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use {super::*, pretty_assertions::assert_eq};

  fn exercise(store: &dyn Store) {
    assert_eq!(store.get(Table::Utxos, "a:0").unwrap(), None);

    store.set(Table::Utxos, "a:0", b"one").unwrap();

    assert_eq!(store.get(Table::Utxos, "a:0").unwrap(), Some(b"one".to_vec()));
    assert_eq!(store.get(Table::Blocks, "a:0").unwrap(), None);

    store
      .set_many(
        Table::Blocks,
        &[("1".into(), b"x".to_vec()), ("2".into(), b"y".to_vec())],
      )
      .unwrap();

    assert_eq!(
      store
        .get_many(Table::Blocks, &["2".into(), "3".into(), "1".into()])
        .unwrap(),
      [Some(b"y".to_vec()), None, Some(b"x".to_vec())]
    );

    store.set(Table::Blocks, "1", b"z").unwrap();
    assert_eq!(store.get(Table::Blocks, "1").unwrap(), Some(b"z".to_vec()));
  }

  #[test]
  fn memory_store() {
    let store = MemoryStore::new();
    exercise(&store);
    assert_eq!(store.len(Table::Blocks), 2);

    assert_eq!(
      store.snapshot().into_keys().collect::<Vec<(Table, String)>>(),
      [
        (Table::Utxos, "a:0".to_string()),
        (Table::Blocks, "1".into()),
        (Table::Blocks, "2".into()),
      ]
    );
  }

  #[test]
  fn redb_store() {
    let tempdir = tempfile::TempDir::new().unwrap();
    exercise(&RedbStore::open(&tempdir.path().join("index.redb")).unwrap());
  }

  #[test]
  fn redb_store_persists_across_opens() {
    let tempdir = tempfile::TempDir::new().unwrap();
    let path = tempdir.path().join("index.redb");

    RedbStore::open(&path)
      .unwrap()
      .set(Table::Mempool, "parsed", b"[]")
      .unwrap();

    assert_eq!(
      RedbStore::open(&path)
        .unwrap()
        .get(Table::Mempool, "parsed")
        .unwrap(),
      Some(b"[]".to_vec())
    );
  }
}
