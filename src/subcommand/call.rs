use super::*;

#[derive(Debug, Parser)]
pub(crate) struct Call {
  #[arg(help = "Call RPC <METHOD>.")]
  method: String,
  #[arg(help = "Pass <PARAMS> to the call. Each is read as JSON, or as a string if it is not JSON.")]
  params: Vec<String>,
}

impl Call {
  pub(crate) fn params(&self) -> Vec<serde_json::Value> {
    self
      .params
      .iter()
      .map(|param| {
        serde_json::from_str(param).unwrap_or_else(|_| serde_json::Value::String(param.clone()))
      })
      .collect()
  }

  pub(crate) fn run(self, settings: Settings) -> SubcommandResult {
    let index = Index::open(&settings)?;

    Ok(Some(Box::new(index.proxy(&self.method, &self.params())?)))
  }
}
