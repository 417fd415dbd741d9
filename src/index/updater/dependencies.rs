use super::*;

/// Order a mempool batch so that every transaction follows the batch
/// transactions it spends. Transactions that do not depend on each other keep
/// their relative order from `transactions`.
pub(crate) fn order(
  transactions: Vec<Transaction>,
) -> Result<Vec<(Transaction, Txid)>, SnafuError> {
  let mut batch = IndexMap::<Txid, Transaction>::new();

  for transaction in transactions {
    batch.entry(transaction.compute_txid()).or_insert(transaction);
  }

  let mut in_degree = vec![0usize; batch.len()];
  let mut children = vec![Vec::new(); batch.len()];

  for (child, transaction) in batch.values().enumerate() {
    let parents = transaction
      .input
      .iter()
      .filter_map(|input| batch.get_index_of(&input.previous_output.txid))
      .collect::<IndexSet<usize>>();

    for parent in parents {
      children[parent].push(child);
      in_degree[child] += 1;
    }
  }

  let mut ready = in_degree
    .iter()
    .enumerate()
    .filter(|(_, degree)| **degree == 0)
    .map(|(i, _)| i)
    .collect::<VecDeque<usize>>();

  let mut sorted = Vec::with_capacity(batch.len());

  while let Some(i) = ready.pop_front() {
    sorted.push(i);

    for &child in &children[i] {
      in_degree[child] -= 1;
      if in_degree[child] == 0 {
        ready.push_back(child);
      }
    }
  }

  if sorted.len() < batch.len() {
    return Err(SnafuError::DependencyCycle {
      remaining: batch.len() - sorted.len(),
    });
  }

  let mut slots = batch.into_iter().map(Some).collect::<Vec<_>>();

  Ok(
    sorted
      .into_iter()
      .filter_map(|i| slots[i].take())
      .map(|(txid, transaction)| (transaction, txid))
      .collect(),
  )
}

#[cfg(test)]
mod tests {
  use {
    super::*,
    bitcoin::{Sequence, TxIn, TxOut, Witness, absolute::LockTime, transaction::Version},
    pretty_assertions::assert_eq,
  };

  fn transaction(inputs: &[OutPoint], tag: u64) -> Transaction {
    Transaction {
      version: Version::TWO,
      lock_time: LockTime::ZERO,
      input: inputs
        .iter()
        .map(|previous_output| TxIn {
          previous_output: *previous_output,
          script_sig: ScriptBuf::new(),
          sequence: Sequence::MAX,
          witness: Witness::new(),
        })
        .collect(),
      output: vec![TxOut {
        value: Amount::from_sat(tag),
        script_pubkey: ScriptBuf::new(),
      }],
    }
  }

  fn spend(transaction: &Transaction) -> OutPoint {
    OutPoint {
      txid: transaction.compute_txid(),
      vout: 0,
    }
  }

  fn txids(ordered: &[(Transaction, Txid)]) -> Vec<Txid> {
    ordered.iter().map(|(_, txid)| *txid).collect()
  }

  #[test]
  fn parents_precede_children() {
    let a = transaction(&[OutPoint::null()], 1);
    let b = transaction(&[spend(&a)], 2);
    let c = transaction(&[spend(&b)], 3);

    let ordered = order(vec![c.clone(), b.clone(), a.clone()]).unwrap();

    assert_eq!(
      txids(&ordered),
      [a.compute_txid(), b.compute_txid(), c.compute_txid()]
    );
  }

  #[test]
  fn independent_transactions_keep_their_order() {
    let a = transaction(&[OutPoint::null()], 1);
    let b = transaction(&[OutPoint::null()], 2);
    let child = transaction(&[spend(&b), spend(&a)], 3);

    let ordered = order(vec![b.clone(), child.clone(), a.clone()]).unwrap();

    assert_eq!(
      txids(&ordered),
      [b.compute_txid(), a.compute_txid(), child.compute_txid()]
    );
  }

  #[test]
  fn spends_outside_the_batch_are_ignored() {
    let outside = transaction(&[OutPoint::null()], 1);
    let a = transaction(&[spend(&outside)], 2);

    assert_eq!(txids(&order(vec![a.clone()]).unwrap()), [a.compute_txid()]);
  }

  #[test]
  fn duplicates_are_dropped() {
    let a = transaction(&[OutPoint::null()], 1);

    assert_eq!(
      txids(&order(vec![a.clone(), a.clone()]).unwrap()),
      [a.compute_txid()]
    );
  }

  #[test]
  fn diamond() {
    let root = transaction(&[OutPoint::null()], 1);
    let left = transaction(&[spend(&root)], 2);
    let right = transaction(
      &[OutPoint {
        txid: root.compute_txid(),
        vout: 1,
      }],
      3,
    );
    let sink = transaction(&[spend(&left), spend(&right)], 4);

    let ordered = order(vec![sink.clone(), right.clone(), left.clone(), root.clone()]).unwrap();

    assert_eq!(
      txids(&ordered),
      [
        root.compute_txid(),
        right.compute_txid(),
        left.compute_txid(),
        sink.compute_txid()
      ]
    );
  }

  #[test]
  fn empty_batch() {
    assert!(order(Vec::new()).unwrap().is_empty());
  }
}
