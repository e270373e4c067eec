use super::*;

/// Restore the live-reader configuration and start the indexer, without
/// scanning anything. Recovers an interrupted repair run that left the
/// chain configuration in rewrite mode.
#[derive(Debug, Parser)]
pub struct Live {}

impl Live {
  pub(crate) fn run(self, settings: Settings) -> SubcommandResult {
    banner("Live indexer starting again");

    ChainConfig::new(settings.chain_config()).set_live()?;

    Indexer::new(&settings)?.start()?;

    Ok(None)
  }
}
