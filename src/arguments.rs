use super::*;

#[derive(Debug, Parser)]
#[command(
  version,
  about = "Index colored coins assets carried by Bitcoin UTXOs",
  help_template = "\
{before-help}{name} {version}
{about}

\x1B[1;4mUsage\x1B[0m:
  {usage}

{all-args}{after-help}"
)]
pub struct Arguments {
  #[command(flatten)]
  pub(crate) options: Options,
  #[command(subcommand)]
  pub(crate) subcommand: Subcommand,
}

impl Arguments {
  pub fn run(self) -> SubcommandResult {
    let settings = Settings::load(self.options)?;

    self.subcommand.run(settings)
  }
}
