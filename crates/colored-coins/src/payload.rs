use super::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Issuance {
  pub amount: u64,
  pub divisibility: u8,
  pub lock_status: bool,
  pub aggregation_policy: AggregationPolicy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
  Issuance(Issuance),
  Transfer,
  Burn,
}

impl Kind {
  fn high_nibble(&self) -> u8 {
    match self {
      Self::Issuance(_) => 0x00,
      Self::Transfer => 0x10,
      Self::Burn => 0x20,
    }
  }
}

/// A decoded colored coins payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payload {
  pub version: u8,
  pub kind: Kind,
  pub metadata: Metadata,
  pub payments: Vec<Payment>,
}

impl Payload {
  const LOCK: u8 = 0b0001_0000;

  /// Find the payload of `transaction`, returning it with the index of the
  /// output that carried it.
  ///
  /// Outputs are scanned in order and the first marked output that decodes
  /// wins. If marked outputs exist but none decode, the first error is
  /// returned.
  pub fn decipher(transaction: &Transaction) -> Result<Option<(usize, Self)>, DecodeError> {
    let mut first_error = None;

    for (vout, output) in transaction.output.iter().enumerate() {
      let Some(data) = Self::data(&output.script_pubkey) else {
        continue;
      };

      match Self::from_bytes(data) {
        Ok(payload) => return Ok(Some((vout, payload))),
        Err(err) => {
          first_error.get_or_insert(err);
        }
      }
    }

    match first_error {
      Some(err) => Err(err),
      None => Ok(None),
    }
  }

  fn data(script: &Script) -> Option<&[u8]> {
    let mut instructions = script.instructions();

    if instructions.next() != Some(Ok(Instruction::Op(opcodes::all::OP_RETURN))) {
      return None;
    }

    let Some(Ok(Instruction::PushBytes(push))) = instructions.next() else {
      return None;
    };

    let data = push.as_bytes();

    data.starts_with(&MARKER).then_some(data)
  }

  pub fn from_bytes(bytes: &[u8]) -> Result<Self, DecodeError> {
    if !bytes.starts_with(&MARKER) {
      return Err(DecodeError::Marker);
    }

    let version = *bytes.get(2).ok_or(DecodeError::Truncated)?;

    if !matches!(version, 0x01 | 0x02) {
      return Err(DecodeError::Version(version));
    }

    let opcode = *bytes.get(3).ok_or(DecodeError::Truncated)?;

    let (metadata, metadata_len) = Metadata::decode(opcode & 0x0f, opcode, &bytes[4..])?;

    let body = &bytes[4 + metadata_len..];

    let (kind, payments) = match opcode & 0xf0 {
      0x00 => {
        let (amount, amount_len) = sffc::decode(body)?;

        let (&flags, payments) = body[amount_len..]
          .split_last()
          .ok_or(DecodeError::Truncated)?;

        let issuance = Issuance {
          amount,
          divisibility: flags >> 5,
          lock_status: flags & Self::LOCK != 0,
          aggregation_policy: AggregationPolicy::from_bits((flags >> 2) & 0b11)?,
        };

        (Kind::Issuance(issuance), Self::payments(payments, false)?)
      }
      0x10 => (Kind::Transfer, Self::payments(body, false)?),
      0x20 => (Kind::Burn, Self::payments(body, true)?),
      _ => return Err(DecodeError::Opcode(opcode)),
    };

    Ok(Self {
      version,
      kind,
      metadata,
      payments,
    })
  }

  fn payments(buffer: &[u8], burns: bool) -> Result<Vec<Payment>, DecodeError> {
    let mut payments = Vec::new();
    let mut i = 0;

    while i < buffer.len() {
      let (payment, len) = Payment::decode(&buffer[i..], burns)?;
      payments.push(payment);
      i += len;
    }

    Ok(payments)
  }

  pub fn to_bytes(&self) -> Result<Vec<u8>, DecodeError> {
    let mut buffer = MARKER.to_vec();

    buffer.push(self.version);
    buffer.push(self.kind.high_nibble() | self.metadata.nibble());

    self.metadata.encode_to_vec(&mut buffer);

    if let Kind::Issuance(issuance) = self.kind {
      if issuance.divisibility > MAX_DIVISIBILITY {
        return Err(DecodeError::Divisibility(issuance.divisibility));
      }

      sffc::encode_to_vec(issuance.amount, &mut buffer)?;

      for payment in &self.payments {
        payment.encode_to_vec(&mut buffer)?;
      }

      let mut flags = issuance.divisibility << 5 | issuance.aggregation_policy.bits() << 2;

      if issuance.lock_status {
        flags |= Self::LOCK;
      }

      buffer.push(flags);
    } else {
      for payment in &self.payments {
        payment.encode_to_vec(&mut buffer)?;
      }
    }

    Ok(buffer)
  }

  /// Build the `OP_RETURN` script that carries this payload.
  pub fn encipher(&self) -> Result<ScriptBuf, DecodeError> {
    let bytes = self.to_bytes()?;

    let push: &script::PushBytes = bytes
      .as_slice()
      .try_into()
      .map_err(|_| DecodeError::Oversized(bytes.len()))?;

    Ok(
      script::Builder::new()
        .push_opcode(opcodes::all::OP_RETURN)
        .push_slice(push)
        .into_script(),
    )
  }

  pub fn issuance(&self) -> Option<Issuance> {
    match self.kind {
      Kind::Issuance(issuance) => Some(issuance),
      Kind::Transfer | Kind::Burn => None,
    }
  }
}
