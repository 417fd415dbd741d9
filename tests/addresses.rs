use {super::*, mocknode::Import, pretty_assertions::assert_eq};

#[test]
fn import_without_reindex() {
  let harness = Harness::new();

  let alice = harness.address(1);
  let bob = harness.address(2);

  let addresses = [alice.clone(), bob.clone(), alice.clone()];

  assert_eq!(
    harness.index.import_addresses(&addresses, false).unwrap(),
    ImportOutcome {
      addresses: addresses.to_vec(),
      reindex: false,
    }
  );

  let label = settings(&TempDir::new().unwrap()).label().to_string();

  assert_eq!(
    harness.node.imports(),
    [
      Import {
        address: alice.clone(),
        label: label.clone(),
        rescan: false,
      },
      Import {
        address: bob.clone(),
        label,
        rescan: false,
      },
    ]
  );

  harness.index.import_addresses(&[bob], false).unwrap();

  assert_eq!(harness.node.imports().len(), 2);
}

#[test]
fn reindex_rescans_last_new_address() {
  let harness = Harness::with_node(mocknode::builder().rescan_probes(3).build());

  let alice = harness.address(1);
  let bob = harness.address(2);

  let outcome = harness
    .index
    .import_addresses(&[alice.clone(), bob.clone()], true)
    .unwrap();

  assert!(outcome.reindex);

  harness.index.join_rescan().unwrap();

  let imports = harness.node.imports();

  assert_eq!(
    imports
      .iter()
      .map(|import| (import.address.as_str(), import.rescan))
      .collect::<Vec<(&str, bool)>>(),
    [(alice.as_str(), false), (bob.as_str(), true)]
  );

  let info = harness.index.info();
  assert!(!info.bitcoindbusy);
  assert_eq!(info.error, None);
}

#[test]
fn reindex_of_known_addresses_is_skipped() {
  let harness = Harness::new();

  let alice = harness.address(1);

  harness
    .index
    .import_addresses(&[alice.clone()], false)
    .unwrap();

  let outcome = harness.index.import_addresses(&[alice], true).unwrap();

  assert!(!outcome.reindex);
  assert_eq!(harness.node.imports().len(), 1);
}

#[test]
fn queries_wait_for_rescan() {
  let harness = Harness::with_node(mocknode::builder().rescan_probes(5).build());

  let scenario = Scenario::confirmed(&harness.node);

  harness.sync();

  harness
    .index
    .import_addresses(&[scenario.alice.to_string(), scenario.bob.to_string()], true)
    .unwrap();

  assert_eq!(harness.balance(&scenario.asset, 0).total, amount(10));

  harness.index.join_rescan().unwrap();
}

#[test]
fn overlapping_imports_and_reapplied_blocks_keep_sets_unique() {
  let harness = Harness::new();

  let scenario = Scenario::confirmed(&harness.node);

  let alice = scenario.alice.to_string();
  let bob = scenario.bob.to_string();

  harness
    .index
    .import_addresses(&[alice.clone(), bob.clone()], false)
    .unwrap();

  harness.sync();

  harness
    .index
    .import_addresses(&[bob.clone(), alice.clone(), bob.clone()], false)
    .unwrap();

  harness
    .store
    .set(Table::Blocks, "lastBlockHeight", b"\x010")
    .unwrap();

  harness.sync();

  assert_eq!(harness.set(Table::Addresses, "imported"), [alice.clone(), bob.clone()]);

  assert_eq!(
    harness.set(Table::AssetAddresses, scenario.asset.as_str()),
    [alice.clone(), bob.clone()]
  );

  let transfer = scenario.transfer();

  assert_eq!(
    harness.set(Table::AddressUtxos, &alice),
    [format!("{}:0", scenario.issue), format!("{transfer}:0")]
  );
  assert_eq!(harness.set(Table::AddressUtxos, &bob), [format!("{transfer}:1")]);
}

#[test]
fn concurrent_imports_keep_every_address() {
  let harness = Harness::with_node(mocknode::builder().rescan_probes(3).build());

  let alice = harness.address(1);
  let bob = harness.address(2);
  let carol = harness.address(3);

  harness
    .index
    .import_addresses(&[alice.clone(), bob.clone()], true)
    .unwrap();

  harness
    .index
    .import_addresses(&[carol.clone(), alice.clone()], false)
    .unwrap();

  harness.index.join_rescan().unwrap();

  let mut imported = harness.set(Table::Addresses, "imported");
  imported.sort();

  let mut expected = vec![alice, bob, carol];
  expected.sort();

  assert_eq!(imported, expected);
}
