use {super::*, pretty_assertions::assert_eq};

#[test]
fn unconfirmed_transfers_count_as_unconfirmed() {
  let harness = Harness::new();

  let scenario = Scenario::issue(&harness.node);
  harness.node.mine_blocks(1);
  let scenario = scenario.send(&harness.node);

  harness.watch(&[&scenario.alice, &scenario.bob]);

  assert_eq!(harness.sync(), Pass::Mempool { transactions: 1 });

  assert_eq!(
    harness.balance(&scenario.asset, 0),
    Balance {
      total: amount(10),
      unconfirmed: amount(10),
    }
  );

  assert_eq!(
    harness.holders(&scenario.asset, 0),
    [
      (scenario.alice.to_string(), holding(4, 4)),
      (scenario.bob.to_string(), holding(6, 6)),
    ]
    .into_iter()
    .collect::<BTreeMap<_, _>>(),
  );

  assert_eq!(harness.balance(&scenario.asset, 1), Balance::default());
}

#[test]
fn parsed_transactions_are_not_parsed_again() {
  let harness = Harness::new();

  let scenario = Scenario::issue(&harness.node);

  assert_eq!(harness.sync(), Pass::Mempool { transactions: 1 });
  assert_eq!(harness.sync(), Pass::Mempool { transactions: 0 });

  scenario.send(&harness.node);

  assert_eq!(harness.sync(), Pass::Mempool { transactions: 1 });
}

#[test]
fn confirmation_clears_unconfirmed_balance() {
  let harness = Harness::new();

  let scenario = Scenario::issue(&harness.node);
  harness.node.mine_blocks(1);
  let scenario = scenario.send(&harness.node);

  harness.watch(&[&scenario.alice, &scenario.bob]);

  harness.sync();

  harness.node.mine_blocks(1);

  harness.sync();

  assert_eq!(
    harness.balance(&scenario.asset, 0),
    Balance {
      total: amount(10),
      unconfirmed: amount(0),
    }
  );
}

#[test]
fn chained_mempool_transactions() {
  let harness = Harness::new();

  let scenario = Scenario::issue(&harness.node).send(&harness.node);

  harness.watch(&[&scenario.alice, &scenario.bob]);

  assert_eq!(harness.sync(), Pass::Mempool { transactions: 2 });

  assert_eq!(
    harness.holders(&scenario.asset, 0)[&scenario.bob.to_string()],
    holding(6, 6)
  );
}

#[test]
fn children_listed_before_parents_are_ordered() {
  let harness = Harness::new();

  let scenario = Scenario::issue(&harness.node).send(&harness.node);

  harness.node.state().mempool.reverse();

  harness.watch(&[&scenario.alice, &scenario.bob]);

  assert_eq!(harness.sync(), Pass::Mempool { transactions: 2 });

  assert_eq!(harness.balance(&scenario.asset, 0).total, amount(10));
}

#[test]
fn mempool_transactions_emit_unconfirmed_events() {
  let (harness, mut events) = Harness::new().with_events();

  let scenario = Scenario::issue(&harness.node);

  harness.sync();

  let mut received = Vec::new();

  while let Ok(event) = events.try_recv() {
    received.push(event);
  }

  let issue = harness.node.state().transactions[&scenario.issue].clone();

  assert!(received.contains(&Event::NewColoredTransaction {
    block_height: None,
    inputs: vec![Vec::new()],
    outputs: vec![
      vec![AssetRecord {
        asset_id: scenario.asset.clone(),
        amount: 10,
        divisibility: 0,
        lock_status: true,
        aggregation_policy: AggregationPolicy::Aggregatable,
        issue_txid: scenario.issue,
      }],
      Vec::new(),
    ],
    txid: scenario.issue,
  }));

  assert!(received.contains(&Event::NewTransaction {
    block_height: None,
    transaction: issue,
    txid: scenario.issue,
  }));
}
