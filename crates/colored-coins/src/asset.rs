use super::*;

/// Assets carried by one transaction output, as stored in the UTXO index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetRecord {
  pub asset_id: AssetId,
  pub amount: u64,
  pub divisibility: u8,
  pub lock_status: bool,
  pub aggregation_policy: AggregationPolicy,
  pub issue_txid: Txid,
}

impl AssetRecord {
  /// Whether `other` may be summed into this record when both land on the
  /// same output.
  pub fn aggregates_with(&self, other: &AssetRecord) -> bool {
    self.asset_id == other.asset_id && self.aggregation_policy.is_aggregatable()
  }
}
