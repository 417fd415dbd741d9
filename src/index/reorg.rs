use super::*;

/// How a candidate block relates to the indexed tip. Never persisted.
#[derive(Debug)]
pub(crate) enum BlockState {
  NotExists,
  Good(Box<Block>),
  Forked,
}

pub(crate) struct Reorg {}

impl Reorg {
  pub(crate) fn block_state(index: &Index, height: u64) -> Result<BlockState> {
    let Some(hash) = index.node.get_block_hash(height)? else {
      return Ok(BlockState::NotExists);
    };

    let header = index.node.get_block_header(&hash)?;

    match index.block_hash(height.checked_sub(1))? {
      Some(index_prev_blockhash) if index_prev_blockhash != header.prev_blockhash => {
        Ok(BlockState::Forked)
      }
      _ => Ok(BlockState::Good(Box::new(index.node.get_block(&hash)?))),
    }
  }

  /// Step the recorded tip back one block below the last ingested height so
  /// the next pass re-examines it. Earlier index merges are not reversed.
  pub(crate) fn rollback(index: &Index, height: u64) -> Result<i64> {
    let last_ingested = i64::try_from(height)? - 1;
    let tip = last_ingested - 1;

    log::warn!("Fork detected at height {height}, rolling indexed tip back to {tip}");

    index
      .store
      .save(Table::Blocks, LAST_BLOCK_HEIGHT, &tip)?;

    Ok(tip)
  }
}
