use super::*;

fn deposit(output: &mut Vec<AssetRecord>, record: AssetRecord) {
  if record.amount == 0 {
    return;
  }

  if let Some(last) = output.last_mut()
    && last.aggregates_with(&record)
    && let Some(sum) = last.amount.checked_add(record.amount)
  {
    last.amount = sum;
    return;
  }

  output.push(record);
}

/// Derive the assets carried by each output of `transaction`.
///
/// `payload` is the payload found at output `payload_vout` and `inputs` holds
/// the assets of each spent output, in input order. `previous_script` is the
/// script of the output spent by the first input. Only unlocked issuances read
/// it. The result has one entry per output.
pub fn assets_outputs(
  transaction: &Transaction,
  payload_vout: usize,
  payload: &Payload,
  inputs: &[Vec<AssetRecord>],
  previous_script: &Script,
) -> Vec<Vec<AssetRecord>> {
  let mut queue = inputs
    .iter()
    .cloned()
    .map(VecDeque::from)
    .collect::<Vec<VecDeque<AssetRecord>>>();

  if let Some(issuance) = payload.issuance() {
    let asset_id = if issuance.lock_status {
      AssetId::locked(
        transaction
          .input
          .first()
          .map_or(OutPoint::null(), |input| input.previous_output),
        issuance.aggregation_policy,
        issuance.divisibility,
      )
    } else {
      AssetId::unlocked(
        previous_script,
        issuance.aggregation_policy,
        issuance.divisibility,
      )
    };

    let record = AssetRecord {
      asset_id,
      amount: issuance.amount,
      divisibility: issuance.divisibility,
      lock_status: issuance.lock_status,
      aggregation_policy: issuance.aggregation_policy,
      issue_txid: transaction.compute_txid(),
    };

    match queue.first_mut() {
      Some(first) => first.push_front(record),
      None => queue.push(VecDeque::from([record])),
    }
  }

  let mut outputs = vec![Vec::new(); transaction.output.len()];

  let change = (0..outputs.len()).rev().find(|&vout| vout != payload_vout);

  let all = queue.iter().flatten().cloned().collect::<Vec<AssetRecord>>();

  let mut input = 0;
  let mut valid = true;

  for payment in &payload.payments {
    while queue.get(input).is_some_and(VecDeque::is_empty) {
      input += 1;
    }

    let Some(current) = queue.get_mut(input).and_then(VecDeque::front_mut) else {
      valid = false;
      break;
    };

    let targets = if payment.burn {
      0..0
    } else if payment.range {
      0..payment.output as usize + 1
    } else {
      payment.output as usize..payment.output as usize + 1
    };

    if targets.end > outputs.len() {
      valid = false;
      break;
    }

    let amount = if payment.percent {
      u64::try_from(u128::from(current.amount) * u128::from(payment.amount) / 100)
        .unwrap_or(u64::MAX)
    } else {
      payment.amount
    };

    let paid = if payment.burn {
      Some(amount)
    } else {
      amount.checked_mul(targets.len() as u64)
    };

    let Some(paid) = paid.filter(|paid| *paid <= current.amount) else {
      valid = false;
      break;
    };

    for vout in targets {
      deposit(
        &mut outputs[vout],
        AssetRecord {
          amount,
          ..current.clone()
        },
      );
    }

    current.amount -= paid;

    if current.amount == 0 {
      queue[input].pop_front();
    }

    if payment.skip {
      input += 1;
    }
  }

  if !valid {
    outputs.iter_mut().for_each(Vec::clear);

    if let Some(change) = change {
      for record in all {
        deposit(&mut outputs[change], record);
      }
    }

    return outputs;
  }

  if let Some(change) = change {
    for record in queue.into_iter().flatten() {
      deposit(&mut outputs[change], record);
    }
  }

  outputs
}
