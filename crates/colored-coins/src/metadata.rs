use super::*;

/// Where a payload keeps its metadata hashes, selected by the low nibble of
/// the opcode.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Metadata {
  Inline {
    torrent_hash: [u8; 20],
    sha2: [u8; 32],
  },
  Multisig,
  TorrentWithMultisigSha2 {
    torrent_hash: [u8; 20],
  },
  Torrent {
    torrent_hash: [u8; 20],
  },
  #[default]
  None,
}

impl Metadata {
  pub(crate) fn nibble(&self) -> u8 {
    match self {
      Self::Inline { .. } => 0x0,
      Self::Multisig => 0x1,
      Self::TorrentWithMultisigSha2 { .. } => 0x2,
      Self::Torrent { .. } => 0x3,
      Self::None => 0x5,
    }
  }

  pub(crate) fn decode(nibble: u8, opcode: u8, buffer: &[u8]) -> Result<(Self, usize), DecodeError> {
    fn take<const N: usize>(buffer: &[u8], offset: usize) -> Result<[u8; N], DecodeError> {
      buffer
        .get(offset..offset + N)
        .and_then(|slice| slice.try_into().ok())
        .ok_or(DecodeError::Truncated)
    }

    match nibble {
      0x0 => Ok((
        Self::Inline {
          torrent_hash: take(buffer, 0)?,
          sha2: take(buffer, 20)?,
        },
        52,
      )),
      0x1 => Ok((Self::Multisig, 0)),
      0x2 => Ok((
        Self::TorrentWithMultisigSha2 {
          torrent_hash: take(buffer, 0)?,
        },
        20,
      )),
      0x3 => Ok((
        Self::Torrent {
          torrent_hash: take(buffer, 0)?,
        },
        20,
      )),
      0x4 | 0x5 => Ok((Self::None, 0)),
      _ => Err(DecodeError::Opcode(opcode)),
    }
  }

  pub(crate) fn encode_to_vec(&self, buffer: &mut Vec<u8>) {
    match self {
      Self::Inline { torrent_hash, sha2 } => {
        buffer.extend_from_slice(torrent_hash);
        buffer.extend_from_slice(sha2);
      }
      Self::TorrentWithMultisigSha2 { torrent_hash } | Self::Torrent { torrent_hash } => {
        buffer.extend_from_slice(torrent_hash);
      }
      Self::Multisig | Self::None => {}
    }
  }
}

#[cfg(test)]
mod tests {
  use {super::*, pretty_assertions::assert_eq};

  #[test]
  fn inline_hashes_are_read_in_order() {
    let mut buffer = vec![1; 20];
    buffer.extend_from_slice(&[2; 32]);

    assert_eq!(
      Metadata::decode(0x0, 0x00, &buffer).unwrap(),
      (
        Metadata::Inline {
          torrent_hash: [1; 20],
          sha2: [2; 32],
        },
        52
      )
    );
  }

  #[test]
  fn short_hashes_are_truncated() {
    assert_eq!(
      Metadata::decode(0x3, 0x13, &[0; 19]),
      Err(DecodeError::Truncated)
    );
  }

  #[test]
  fn unknown_nibbles_are_rejected() {
    assert_eq!(
      Metadata::decode(0x9, 0x19, &[]),
      Err(DecodeError::Opcode(0x19))
    );
  }
}
