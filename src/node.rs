use super::*;

/// Summary of the node's chain state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeInfo {
  pub blocks: u64,
  pub best_block_hash: BlockHash,
  pub time: u64,
}

/// A wallet output as reported by `listunspent`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Unspent {
  pub txid: Txid,
  pub vout: u32,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub address: Option<String>,
  pub script_pub_key: ScriptBuf,
  #[serde(with = "bitcoin::amount::serde::as_btc")]
  pub amount: Amount,
  pub confirmations: u32,
}

impl Unspent {
  pub fn outpoint(&self) -> OutPoint {
    OutPoint {
      txid: self.txid,
      vout: self.vout,
    }
  }
}

/// A wallet transaction entry as reported by `listtransactions`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalletTransaction {
  pub txid: Txid,
  #[serde(default)]
  pub address: Option<String>,
  #[serde(default)]
  pub confirmations: i64,
  #[serde(default)]
  pub blockhash: Option<BlockHash>,
  #[serde(default)]
  pub blocktime: Option<u64>,
  #[serde(default)]
  pub timereceived: Option<u64>,
}

pub trait Node: Send + Sync {
  fn get_info(&self) -> Result<NodeInfo>;

  fn get_block_count(&self) -> Result<u64>;

  /// `None` when `height` is beyond the tip.
  fn get_block_hash(&self, height: u64) -> Result<Option<BlockHash>>;

  fn get_block(&self, hash: &BlockHash) -> Result<Block>;

  fn get_block_header(&self, hash: &BlockHash) -> Result<Header>;

  fn get_raw_transaction(&self, txid: &Txid) -> Result<Option<Transaction>>;

  /// Fetch every transaction in `txids`, in order. Fails if any is missing.
  fn get_raw_transactions(&self, txids: &[Txid]) -> Result<Vec<Transaction>>;

  fn send_raw_transaction(&self, transaction: &Transaction) -> Result<Txid>;

  fn get_raw_mempool(&self) -> Result<Vec<Txid>>;

  fn list_unspent(&self, min_conf: u32, addresses: Option<&[String]>) -> Result<Vec<Unspent>>;

  fn list_transactions(
    &self,
    label: &str,
    count: usize,
    skip: usize,
    include_watch_only: bool,
  ) -> Result<Vec<WalletTransaction>>;

  fn import_address(&self, address: &str, label: &str, rescan: bool) -> Result;

  fn call(&self, method: &str, params: &[serde_json::Value]) -> Result<serde_json::Value>;
}

pub(crate) trait BitcoinCoreRpcResultExt<T> {
  fn into_option(self) -> Result<Option<T>>;
}

impl<T> BitcoinCoreRpcResultExt<T> for Result<T, bitcoincore_rpc::Error> {
  fn into_option(self) -> Result<Option<T>> {
    match self {
      Ok(ok) => Ok(Some(ok)),
      Err(bitcoincore_rpc::Error::JsonRpc(bitcoincore_rpc::jsonrpc::error::Error::Rpc(
        bitcoincore_rpc::jsonrpc::error::RpcError { code: -8, .. },
      ))) => Ok(None),
      Err(bitcoincore_rpc::Error::JsonRpc(bitcoincore_rpc::jsonrpc::error::Error::Rpc(
        bitcoincore_rpc::jsonrpc::error::RpcError { message, .. },
      )))
        if message.ends_with("not found") =>
      {
        Ok(None)
      }
      Err(err) => Err(err.into()),
    }
  }
}

/// Talks to Bitcoin Core over JSON-RPC.
pub struct RpcNode {
  client: Client,
  limit: usize,
}

impl RpcNode {
  const MAX_CONFIRMATIONS: u32 = 99_999_999;

  pub fn open(settings: &Settings) -> Result<Self> {
    let rpc_url = settings.bitcoin_rpc_url();

    let auth = settings.bitcoin_credentials()?;

    log::info!("Connecting to Bitcoin Core at {rpc_url}");

    let client = Client::new(&rpc_url, auth)
      .with_context(|| format!("failed to connect to Bitcoin Core RPC at `{rpc_url}`"))?;

    Ok(Self {
      client,
      limit: usize::try_from(settings.bitcoin_rpc_limit())?.max(1),
    })
  }
}

impl Node for RpcNode {
  fn get_info(&self) -> Result<NodeInfo> {
    let info = self.client.get_blockchain_info()?;

    Ok(NodeInfo {
      blocks: info.blocks,
      best_block_hash: info.best_block_hash,
      time: u64::from(self.client.get_block_header(&info.best_block_hash)?.time),
    })
  }

  fn get_block_count(&self) -> Result<u64> {
    Ok(self.client.get_block_count()?)
  }

  fn get_block_hash(&self, height: u64) -> Result<Option<BlockHash>> {
    self.client.get_block_hash(height).into_option()
  }

  fn get_block(&self, hash: &BlockHash) -> Result<Block> {
    Ok(self.client.get_block(hash)?)
  }

  fn get_block_header(&self, hash: &BlockHash) -> Result<Header> {
    Ok(self.client.get_block_header(hash)?)
  }

  fn get_raw_transaction(&self, txid: &Txid) -> Result<Option<Transaction>> {
    self.client.get_raw_transaction(txid, None).into_option()
  }

  fn get_raw_transactions(&self, txids: &[Txid]) -> Result<Vec<Transaction>> {
    if txids.is_empty() {
      return Ok(Vec::new());
    }

    let chunk_size = txids.len().div_ceil(self.limit);

    thread::scope(|scope| {
      let handles = txids
        .chunks(chunk_size)
        .map(|chunk| {
          scope.spawn(move || {
            chunk
              .iter()
              .map(|txid| {
                self
                  .client
                  .get_raw_transaction(txid, None)
                  .with_context(|| format!("failed to fetch transaction {txid}"))
              })
              .collect::<Result<Vec<Transaction>>>()
          })
        })
        .collect::<Vec<_>>();

      let mut transactions = Vec::with_capacity(txids.len());

      for handle in handles {
        let chunk = handle
          .join()
          .map_err(|_| anyhow!("transaction fetch thread panicked"))??;
        transactions.extend(chunk);
      }

      Ok(transactions)
    })
  }

  fn send_raw_transaction(&self, transaction: &Transaction) -> Result<Txid> {
    Ok(self.client.send_raw_transaction(transaction)?)
  }

  fn get_raw_mempool(&self) -> Result<Vec<Txid>> {
    Ok(self.client.get_raw_mempool()?)
  }

  fn list_unspent(&self, min_conf: u32, addresses: Option<&[String]>) -> Result<Vec<Unspent>> {
    let mut params = vec![min_conf.into(), Self::MAX_CONFIRMATIONS.into()];

    if let Some(addresses) = addresses {
      params.push(serde_json::to_value(addresses)?);
    }

    Ok(self.client.call("listunspent", &params)?)
  }

  fn list_transactions(
    &self,
    label: &str,
    count: usize,
    skip: usize,
    include_watch_only: bool,
  ) -> Result<Vec<WalletTransaction>> {
    Ok(self.client.call(
      "listtransactions",
      &[
        label.into(),
        count.into(),
        skip.into(),
        include_watch_only.into(),
      ],
    )?)
  }

  fn import_address(&self, address: &str, label: &str, rescan: bool) -> Result {
    self
      .client
      .call::<serde_json::Value>("importaddress", &[address.into(), label.into(), rescan.into()])?;
    Ok(())
  }

  fn call(&self, method: &str, params: &[serde_json::Value]) -> Result<serde_json::Value> {
    Ok(self.client.call(method, params)?)
  }
}
