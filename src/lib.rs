//! `doctor` finds missing-block ranges in a Hyperion Elasticsearch block
//! index and drives the indexer to backfill them.
//!
//! The pipeline is a coarse-to-fine histogram scan: a 10,000,000-wide
//! histogram over `block_num` picks out under-dense regions, each of which
//! is re-queried at 1,000-wide granularity to yield precise `[gt, lt)`
//! ranges. For every range the indexer's chain configuration is switched
//! into rewrite mode, the indexer is restarted, and its log is followed
//! until it reports that the range has been processed. Once all ranges are
//! done the configuration is restored to live-reader mode.

use {
  self::{
    arguments::Arguments,
    chain_config::ChainConfig,
    indexer::Indexer,
    store::{Bucket, BucketSource, Store},
    subcommand::Subcommand,
  },
  anyhow::{Context, Error, anyhow, bail, ensure},
  clap::Parser,
  colored::Colorize,
  regex::Regex,
  serde::{Deserialize, Serialize},
  std::{
    fs,
    io::{self, BufRead, BufReader, Seek, SeekFrom, Write},
    path::{Path, PathBuf},
    process::{self, Command, Stdio},
    sync::atomic::{AtomicBool, Ordering},
    thread,
    time::{Duration, Instant},
  },
};

pub use self::{
  gaps::GapRange,
  indexer::HyperionVersion,
  options::Options,
  settings::Settings,
  subcommand::{Output, SubcommandResult},
};

mod arguments;
mod chain_config;
mod gaps;
mod indexer;
mod options;
mod settings;
mod store;
pub mod subcommand;

pub type Result<T = (), E = Error> = std::result::Result<T, E>;

static INTERRUPTED: AtomicBool = AtomicBool::new(false);

pub(crate) fn interrupted() -> bool {
  INTERRUPTED.load(Ordering::Relaxed)
}

/// Yellow `=`-ruled progress banner, matching the indexer operators'
/// expectations for this tool's output.
pub(crate) fn banner(message: &str) {
  println!("{}", "=".repeat(100).yellow());
  println!("{}", message.yellow());
}

pub fn main() {
  env_logger::init();

  if let Err(err) = ctrlc::set_handler(|| {
    // Second interrupt exits immediately, first one lets the log-follow
    // loop unwind so the error path can report where it stopped.
    if INTERRUPTED.swap(true, Ordering::Relaxed) {
      process::exit(130);
    }
  }) {
    eprintln!("error: failed to install interrupt handler: {err}");
  }

  match Arguments::parse().run() {
    Ok(output) => {
      if let Some(output) = output {
        output.print();
      }
    }
    Err(err) => {
      eprintln!("error: {err}");
      err
        .chain()
        .skip(1)
        .for_each(|cause| eprintln!("because: {cause}"));
      process::exit(1);
    }
  }
}
