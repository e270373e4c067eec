use super::*;

pub mod live;
pub mod repair;
pub mod scan;

pub type SubcommandResult = Result<Option<Box<dyn Output>>>;

#[derive(Debug, Parser)]
pub(crate) enum Subcommand {
  #[command(about = "Scan the block index for missing-block ranges")]
  Scan(scan::Scan),
  #[command(about = "Scan for missing-block ranges and re-index each one")]
  Repair(repair::Repair),
  #[command(about = "Restore the live-reader configuration and start the indexer")]
  Live(live::Live),
}

impl Subcommand {
  pub(crate) fn run(self, settings: Settings) -> SubcommandResult {
    match self {
      Self::Scan(scan) => scan.run(settings),
      Self::Repair(repair) => repair.run(settings),
      Self::Live(live) => live.run(settings),
    }
  }
}

pub trait Output: Send {
  fn print(&self);
}

impl<T> Output for T
where
  T: Serialize + Send,
{
  fn print(&self) {
    serde_json::to_writer_pretty(io::stdout(), self).ok();
    println!();
  }
}
