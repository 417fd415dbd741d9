use {super::*, pretty_assertions::assert_eq};

#[test]
fn longer_fork_rolls_back_one_block_per_pass() {
  let harness = Harness::new();

  harness.node.mine_blocks(3);

  harness.sync();

  assert_eq!(harness.index.last_block_height().unwrap(), Some(3));

  let stale = harness.node.invalidate_tip();

  harness.node.mine_blocks(2);

  assert!(harness.index.parse_now().unwrap());

  assert_eq!(harness.index.last_block_height().unwrap(), Some(2));
  assert_eq!(harness.index.info().ccheight, Some(2));

  harness.sync();

  assert_eq!(harness.index.last_block_height().unwrap(), Some(4));

  let replaced = harness.index.block_hash(Some(3)).unwrap().unwrap();

  assert_ne!(replaced, stale);
  assert_eq!(replaced, harness.node.state().hashes[3]);
}

#[test]
fn reapplied_blocks_keep_balances() {
  let harness = Harness::new();

  let scenario = Scenario::confirmed(&harness.node);

  harness.watch(&[&scenario.alice, &scenario.bob]);

  harness.sync();

  harness.node.invalidate_tip();
  harness.node.mine_blocks(2);

  harness.sync();

  assert_eq!(
    harness.index.last_block_height().unwrap(),
    Some(i64::try_from(harness.node.height()).unwrap())
  );

  assert_eq!(harness.balance(&scenario.asset, 1).total, amount(10));

  assert_eq!(
    harness.holders(&scenario.asset, 1),
    [
      (scenario.alice.to_string(), holding(4, 0)),
      (scenario.bob.to_string(), holding(6, 0)),
    ]
    .into_iter()
    .collect::<BTreeMap<_, _>>(),
  );

  assert_eq!(
    harness
      .index
      .asset_issuance(&scenario.asset, true)
      .unwrap()
      .unwrap()
      .len(),
    1
  );
}

#[test]
fn equal_length_fork_waits_for_next_block() {
  let harness = Harness::new();

  harness.node.mine_blocks(2);

  harness.sync();

  let stale = harness.node.invalidate_tip();
  harness.node.mine_blocks(1);

  harness.sync();

  assert_eq!(harness.index.block_hash(Some(2)).unwrap(), Some(stale));

  harness.node.mine_blocks(1);

  harness.sync();

  assert_eq!(
    harness.index.block_hash(Some(2)).unwrap(),
    Some(harness.node.state().hashes[2])
  );
  assert_eq!(harness.index.last_block_height().unwrap(), Some(3));
}
