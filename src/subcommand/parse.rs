use super::*;

#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct Output {
  pub ran: bool,
  pub info: crate::Info,
}

pub(crate) fn run(settings: Settings) -> SubcommandResult {
  let index = Index::open(&settings)?;

  let ran = index.parse_now()?;

  Ok(Some(Box::new(Output {
    ran,
    info: index.info(),
  })))
}
