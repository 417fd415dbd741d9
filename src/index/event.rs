use super::*;

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
  Info(Info),
  NewBlock {
    hash: BlockHash,
    height: u64,
    previous: BlockHash,
    timestamp: u32,
    txids: Vec<Txid>,
  },
  NewColoredTransaction {
    block_height: Option<u64>,
    inputs: Vec<Vec<AssetRecord>>,
    outputs: Vec<Vec<AssetRecord>>,
    txid: Txid,
  },
  NewTransaction {
    block_height: Option<u64>,
    transaction: Transaction,
    txid: Txid,
  },
}
