//! Significant-figure floating encoding of asset amounts.
//!
//! An amount is `mantissa * 10^exponent`, packed big-endian after a size
//! prefix in the high bits of the first byte.

use super::*;

struct Layout {
  size: usize,
  prefix: u64,
  prefix_bits: u32,
  mantissa_bits: u32,
  exponent_bits: u32,
}

const LAYOUTS: [Layout; 7] = [
  Layout {
    size: 1,
    prefix: 0b000,
    prefix_bits: 3,
    mantissa_bits: 5,
    exponent_bits: 0,
  },
  Layout {
    size: 2,
    prefix: 0b001,
    prefix_bits: 3,
    mantissa_bits: 9,
    exponent_bits: 4,
  },
  Layout {
    size: 3,
    prefix: 0b010,
    prefix_bits: 3,
    mantissa_bits: 17,
    exponent_bits: 4,
  },
  Layout {
    size: 4,
    prefix: 0b011,
    prefix_bits: 3,
    mantissa_bits: 25,
    exponent_bits: 4,
  },
  Layout {
    size: 5,
    prefix: 0b100,
    prefix_bits: 3,
    mantissa_bits: 34,
    exponent_bits: 3,
  },
  Layout {
    size: 6,
    prefix: 0b101,
    prefix_bits: 3,
    mantissa_bits: 42,
    exponent_bits: 3,
  },
  Layout {
    size: 7,
    prefix: 0b11,
    prefix_bits: 2,
    mantissa_bits: 54,
    exponent_bits: 0,
  },
];

fn layout(first: u8) -> &'static Layout {
  match first >> 5 {
    0b110 | 0b111 => &LAYOUTS[6],
    prefix => &LAYOUTS[usize::from(prefix)],
  }
}

fn split(mut value: u64, max_exponent: u32) -> (u64, u32) {
  let mut exponent = 0;
  while value != 0 && value % 10 == 0 && exponent < max_exponent {
    value /= 10;
    exponent += 1;
  }
  (value, exponent)
}

pub fn encode_to_vec(value: u64, buffer: &mut Vec<u8>) -> Result<(), DecodeError> {
  for layout in &LAYOUTS {
    let (mantissa, exponent) = split(value, (1 << layout.exponent_bits) - 1);

    if mantissa >> layout.mantissa_bits != 0 {
      continue;
    }

    let bits = (layout.size * 8) as u32;
    let packed = (layout.prefix << (bits - layout.prefix_bits))
      | (mantissa << layout.exponent_bits)
      | u64::from(exponent);

    buffer.extend_from_slice(&packed.to_be_bytes()[8 - layout.size..]);

    return Ok(());
  }

  Err(DecodeError::Unrepresentable(value))
}

pub fn encode(value: u64) -> Result<Vec<u8>, DecodeError> {
  let mut buffer = Vec::new();
  encode_to_vec(value, &mut buffer)?;
  Ok(buffer)
}

/// Decode an amount from the start of `buffer`, returning it with the number
/// of bytes consumed.
pub fn decode(buffer: &[u8]) -> Result<(u64, usize), DecodeError> {
  let first = *buffer.first().ok_or(DecodeError::Truncated)?;

  let layout = layout(first);

  let bytes = buffer.get(..layout.size).ok_or(DecodeError::Truncated)?;

  let mut packed = 0u64;
  for byte in bytes {
    packed = (packed << 8) | u64::from(*byte);
  }

  let payload_bits = (layout.size * 8) as u32 - layout.prefix_bits;
  packed &= (1u64 << payload_bits) - 1;

  let exponent = packed & ((1 << layout.exponent_bits) - 1);
  let mantissa = packed >> layout.exponent_bits;

  let value = 10u64
    .checked_pow(exponent as u32)
    .and_then(|scale| mantissa.checked_mul(scale))
    .ok_or(DecodeError::Overflow)?;

  Ok((value, layout.size))
}

#[cfg(test)]
mod tests {
  use {super::*, pretty_assertions::assert_eq};

  #[test]
  fn small_values_take_one_byte() {
    assert_eq!(encode(0).unwrap(), [0x00]);
    assert_eq!(encode(31).unwrap(), [0x1f]);
  }

  #[test]
  fn round_numbers_use_the_exponent() {
    // 1000 = 1 * 10^3 fits the two byte layout
    assert_eq!(encode(1000).unwrap(), [0x20, 0x13]);
    assert_eq!(decode(&[0x20, 0x13]).unwrap(), (1000, 2));
  }

  #[test]
  fn values_round_trip_through_every_layout() {
    for value in [
      1,
      32,
      400,
      511,
      600,
      131_071,
      1_234_567,
      33_554_431,
      17_179_869_183,
      4_398_046_511_103,
      18_014_398_509_481_983,
      100_000_000_000_000_000,
    ] {
      let encoded = encode(value).unwrap();
      assert_eq!(decode(&encoded).unwrap(), (value, encoded.len()), "{value}");
    }
  }

  #[test]
  fn decode_reports_consumed_length() {
    let mut buffer = encode(600).unwrap();
    let len = buffer.len();
    buffer.extend_from_slice(&[0xff, 0xff]);
    assert_eq!(decode(&buffer).unwrap(), (600, len));
  }

  #[test]
  fn truncated_input_is_an_error() {
    assert_eq!(decode(&[]), Err(DecodeError::Truncated));
    assert_eq!(decode(&[0x20]), Err(DecodeError::Truncated));
  }

  #[test]
  fn unrepresentable_values_are_rejected() {
    assert_eq!(encode(u64::MAX), Err(DecodeError::Unrepresentable(u64::MAX)));
  }
}
