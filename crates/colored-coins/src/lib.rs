//! Types for interoperating with colored coins payloads and asset outputs.

use {
  bitcoin::{
    OutPoint, Script, ScriptBuf, Transaction, Txid,
    hashes::{Hash, hash160},
    opcodes,
    script::{self, Instruction},
  },
  serde::{Deserialize, Serialize},
  std::{
    collections::VecDeque,
    fmt::{self, Display, Formatter},
    str::FromStr,
  },
  thiserror::Error,
};

pub use {
  aggregation_policy::AggregationPolicy, asset::AssetRecord, asset_id::AssetId,
  error::DecodeError, metadata::Metadata, outputs::assets_outputs, payload::Kind,
  payload::Issuance, payload::Payload, payment::Payment,
};

/// Two byte protocol marker, `CC`, that opens every payload.
pub const MARKER: [u8; 2] = [0x43, 0x43];

pub const PROTOCOL_VERSION: u8 = 0x02;

pub const MAX_DIVISIBILITY: u8 = 7;

mod aggregation_policy;
mod asset;
mod asset_id;
mod error;
mod metadata;
mod outputs;
mod payload;
mod payment;
pub mod sffc;
