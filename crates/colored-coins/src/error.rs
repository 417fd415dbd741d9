use super::*;

#[derive(Debug, PartialEq, Eq, Error)]
pub enum DecodeError {
  #[error("payload does not start with the `CC` marker")]
  Marker,
  #[error("unsupported protocol version {0:#04x}")]
  Version(u8),
  #[error("unknown opcode {0:#04x}")]
  Opcode(u8),
  #[error("payload truncated")]
  Truncated,
  #[error("amount overflows 64 bits")]
  Overflow,
  #[error("divisibility {0} exceeds maximum")]
  Divisibility(u8),
  #[error("unknown aggregation policy bits {0:#04b}")]
  AggregationPolicy(u8),
  #[error("amount {0} has no significant-figure encoding")]
  Unrepresentable(u64),
  #[error("payment output {0} cannot be encoded")]
  OutputRange(u32),
  #[error("payload of {0} bytes cannot be pushed")]
  Oversized(usize),
}
