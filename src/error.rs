use {super::*, snafu::Snafu};

#[derive(Debug, Snafu)]
#[snafu(context(suffix(false)), visibility(pub(crate)))]
pub enum SnafuError {
  #[snafu(display("Failed to parse address `{}`", input))]
  AddressParse {
    source: bitcoin::address::ParseError,
    input: String,
  },
  #[snafu(display("{err}"))]
  Anyhow { err: anyhow::Error },
  #[snafu(display("Amount overflows while summing balances"))]
  DecimalOverflow,
  #[snafu(display("Mempool transactions form a dependency cycle ({remaining} unordered)"))]
  DependencyCycle { remaining: usize },
  #[snafu(display("Failed to encode store record"))]
  EntryEncode { source: serde_json::Error },
  #[snafu(display("Invalid chain `{}`", chain))]
  InvalidChain { chain: String },
  #[snafu(display("I/O error at `{}`", path.display()))]
  Io { source: io::Error, path: PathBuf },
  #[snafu(display("Corrupt record `{key}` in table `{table}`: {reason}"))]
  StoreCorruption {
    table: Table,
    key: String,
    reason: String,
  },
}

impl From<Error> for SnafuError {
  fn from(err: Error) -> SnafuError {
    Self::Anyhow { err }
  }
}

/// `anyhow::Context` shadows `snafu::ResultExt::context`, so snafu contexts
/// are attached through `snafu_context` instead.
pub(crate) trait ResultExt<T, E>: Sized {
  fn snafu_context<C, E2>(self, context: C) -> Result<T, E2>
  where
    C: snafu::IntoError<E2, Source = E>,
    E2: std::error::Error + snafu::ErrorCompat;
}

impl<T, E> ResultExt<T, E> for std::result::Result<T, E> {
  fn snafu_context<C, E2>(self, context: C) -> Result<T, E2>
  where
    C: snafu::IntoError<E2, Source = E>,
    E2: std::error::Error + snafu::ErrorCompat,
  {
    use snafu::ResultExt;
    self.context(context)
  }
}
