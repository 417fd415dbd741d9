use super::*;

#[derive(Debug, Parser)]
pub(crate) struct Transmit {
  #[arg(help = "Broadcast hex-encoded <TRANSACTION>.")]
  transaction: String,
}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct Output {
  pub txid: Txid,
}

impl Transmit {
  pub(crate) fn run(self, settings: Settings) -> SubcommandResult {
    let index = Index::open(&settings)?;

    Ok(Some(Box::new(Output {
      txid: index.transmit(&self.transaction)?,
    })))
  }
}
