use super::*;

#[derive(Debug, Parser)]
#[command(
  name = "doctor",
  version,
  about = "Find missing-block ranges in a Hyperion Elasticsearch block index and re-index them."
)]
pub(crate) struct Arguments {
  #[command(flatten)]
  pub(crate) options: Options,
  #[command(subcommand)]
  pub(crate) subcommand: Subcommand,
}

impl Arguments {
  pub(crate) fn run(self) -> SubcommandResult {
    let settings = Settings::load(self.options)?;
    self.subcommand.run(settings)
  }
}
