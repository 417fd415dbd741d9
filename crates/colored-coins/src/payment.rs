use super::*;

/// A single transfer instruction.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
  pub amount: u64,
  pub burn: bool,
  pub output: u32,
  pub percent: bool,
  pub range: bool,
  pub skip: bool,
}

impl Payment {
  const SKIP: u8 = 0b1000_0000;
  const RANGE: u8 = 0b0100_0000;
  const PERCENT: u8 = 0b0010_0000;
  const OUTPUT: u8 = 0b0001_1111;

  /// Output index that marks a burn in burn payloads.
  pub const BURN_OUTPUT: u32 = 31;

  const MAX_RANGE_OUTPUT: u32 = 0x1fff;

  pub fn new(output: u32, amount: u64) -> Self {
    Self {
      amount,
      output,
      ..Default::default()
    }
  }

  pub fn burn(amount: u64) -> Self {
    Self {
      amount,
      burn: true,
      output: Self::BURN_OUTPUT,
      ..Default::default()
    }
  }

  pub(crate) fn encode_to_vec(&self, buffer: &mut Vec<u8>) -> Result<(), DecodeError> {
    let mut flags = 0;

    if self.skip {
      flags |= Self::SKIP;
    }

    if self.percent {
      flags |= Self::PERCENT;
    }

    let output = if self.burn {
      Self::BURN_OUTPUT
    } else {
      self.output
    };

    if self.range && !self.burn {
      if output > Self::MAX_RANGE_OUTPUT {
        return Err(DecodeError::OutputRange(output));
      }
      flags |= Self::RANGE;
      buffer.push(flags | (output >> 8) as u8);
      buffer.push((output & 0xff) as u8);
    } else {
      if output > u32::from(Self::OUTPUT) {
        return Err(DecodeError::OutputRange(output));
      }
      buffer.push(flags | output as u8);
    }

    sffc::encode_to_vec(self.amount, buffer)
  }

  pub(crate) fn decode(buffer: &[u8], burns: bool) -> Result<(Self, usize), DecodeError> {
    let flags = *buffer.first().ok_or(DecodeError::Truncated)?;

    let skip = flags & Self::SKIP != 0;
    let range = flags & Self::RANGE != 0;
    let percent = flags & Self::PERCENT != 0;

    let (output, mut len) = if range {
      let low = *buffer.get(1).ok_or(DecodeError::Truncated)?;
      (
        (u32::from(flags & Self::OUTPUT) << 8) | u32::from(low),
        2,
      )
    } else {
      (u32::from(flags & Self::OUTPUT), 1)
    };

    let (amount, amount_len) = sffc::decode(&buffer[len..])?;
    len += amount_len;

    Ok((
      Self {
        amount,
        burn: burns && !range && output == Self::BURN_OUTPUT,
        output,
        percent,
        range,
        skip,
      },
      len,
    ))
  }
}

#[cfg(test)]
mod tests {
  use {super::*, pretty_assertions::assert_eq};

  fn round_trip(payment: Payment, burns: bool) -> Payment {
    let mut buffer = Vec::new();
    payment.encode_to_vec(&mut buffer).unwrap();
    let (decoded, len) = Payment::decode(&buffer, burns).unwrap();
    assert_eq!(len, buffer.len());
    decoded
  }

  #[test]
  fn simple_payment() {
    let payment = Payment::new(1, 600);
    assert_eq!(round_trip(payment, false), payment);
  }

  #[test]
  fn range_payment_uses_thirteen_bit_output() {
    let payment = Payment {
      range: true,
      ..Payment::new(300, 5)
    };

    let mut buffer = Vec::new();
    payment.encode_to_vec(&mut buffer).unwrap();
    assert_eq!(buffer[..2], [0b0100_0001, 0x2c]);

    assert_eq!(round_trip(payment, false), payment);
  }

  #[test]
  fn burn_output_only_burns_in_burn_payloads() {
    assert!(round_trip(Payment::burn(7), true).burn);
    assert!(!round_trip(Payment::burn(7), false).burn);
  }

  #[test]
  fn wide_output_without_range_is_rejected() {
    assert_eq!(
      Payment::new(32, 1).encode_to_vec(&mut Vec::new()),
      Err(DecodeError::OutputRange(32))
    );
  }

  #[test]
  fn flags_survive() {
    let payment = Payment {
      skip: true,
      percent: true,
      ..Payment::new(4, 50)
    };
    assert_eq!(round_trip(payment, false), payment);
  }
}
