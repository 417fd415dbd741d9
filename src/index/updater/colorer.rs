use super::*;

/// Pending UTXO writes for one batch of transactions.
#[derive(Debug, Default)]
pub(crate) struct UtxoChanges {
  /// Consumed outputs that carried assets.
  pub(crate) used: IndexMap<OutPoint, Vec<AssetRecord>>,
  /// Outputs created by the batch that carry assets.
  pub(crate) unused: IndexMap<OutPoint, Vec<AssetRecord>>,
}

/// Assets moved by one colored transaction.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Colored {
  pub(crate) inputs: Vec<Vec<AssetRecord>>,
  pub(crate) outputs: Vec<Vec<AssetRecord>>,
}

pub(super) struct Colorer<'a> {
  pub(super) changes: &'a mut UtxoChanges,
  pub(super) store: &'a dyn Store,
}

impl Colorer<'_> {
  /// Record the assets created by `transaction`, or return `None` if it has
  /// no valid payload. `previous_script` yields the script spent by the first
  /// input and is only called for unlocked issuances.
  pub(super) fn color(
    &mut self,
    transaction: &Transaction,
    txid: Txid,
    previous_script: impl FnOnce() -> Result<ScriptBuf>,
  ) -> Result<Option<Colored>> {
    let (payload_vout, payload) = match Payload::decipher(transaction) {
      Ok(Some(found)) => found,
      Ok(None) => return Ok(None),
      Err(err) => {
        log::debug!("Ignoring malformed colored payload in {txid}: {err}");
        return Ok(None);
      }
    };

    let previous_script = match payload.issuance() {
      Some(issuance) if !issuance.lock_status => previous_script()?,
      _ => ScriptBuf::new(),
    };

    let inputs = self.input_assets(transaction)?;

    let outputs = assets_outputs(transaction, payload_vout, &payload, &inputs, &previous_script);

    for (vout, assets) in outputs.iter().enumerate() {
      if assets.is_empty() {
        continue;
      }

      self.changes.unused.insert(
        OutPoint {
          txid,
          vout: u32::try_from(vout)?,
        },
        assets.clone(),
      );
    }

    Ok(Some(Colored { inputs, outputs }))
  }

  fn input_assets(&mut self, transaction: &Transaction) -> Result<Vec<Vec<AssetRecord>>> {
    let missing = transaction
      .input
      .iter()
      .map(|input| input.previous_output)
      .filter(|outpoint| !self.changes.unused.contains_key(outpoint))
      .map(outpoint_key)
      .collect::<Vec<String>>();

    let mut stored = self
      .store
      .load_many::<UtxoAssetsEntry>(Table::Utxos, &missing)?
      .into_iter();

    let mut inputs = Vec::with_capacity(transaction.input.len());

    for input in &transaction.input {
      let outpoint = input.previous_output;

      let assets = match self.changes.unused.get(&outpoint) {
        Some(assets) => assets.clone(),
        None => stored.next().flatten().unwrap_or_default(),
      };

      if !assets.is_empty() {
        self.changes.used.insert(outpoint, assets.clone());
      }

      inputs.push(assets);
    }

    Ok(inputs)
  }
}
