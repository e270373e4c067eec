use super::*;

/// How often the log follower re-polls the file once it has caught up.
const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Hyperion releases word the end-of-range log marker differently.
#[derive(Debug, Clone, Copy, PartialEq, Default, clap::ValueEnum)]
pub enum HyperionVersion {
  #[value(name = "3.1")]
  V3_1,
  #[default]
  #[value(name = "3.3")]
  V3_3,
}

impl HyperionVersion {
  fn no_blocks_marker(self) -> &'static str {
    match self {
      Self::V3_1 => "No blocks processed",
      Self::V3_3 => "No blocks are being processed",
    }
  }
}

/// A recognized indexer log line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Signal {
  /// The rewrite range is exhausted; the indexer keeps running and must be
  /// told to stop. Repeats until it actually shuts down.
  NoBlocksProcessed,
  /// The indexer has already shut down and reported its final block.
  LastIndexed(u64),
  /// Shutdown is in progress.
  ShuttingDown,
}

/// How a rewrite attempt ended.
#[derive(Debug, PartialEq)]
pub(crate) enum Outcome {
  LastIndexed(u64),
  ShutDown,
}

pub(crate) struct Markers {
  no_blocks: Regex,
  shutting_down: Regex,
  last_indexed: Regex,
}

impl Markers {
  pub(crate) fn new(version: HyperionVersion) -> Result<Markers> {
    Ok(Markers {
      no_blocks: Regex::new(&format!(".*{}.*", version.no_blocks_marker()))?,
      shutting_down: Regex::new(".*Shutting down master.*")?,
      last_indexed: Regex::new(r".*Last Indexed Block:.* (\d*)")?,
    })
  }

  /// Classify a log line, no-more-blocks marker first. Unrecognized lines
  /// yield `None` and are skipped by the caller.
  pub(crate) fn classify(&self, line: &str) -> Option<Signal> {
    if self.no_blocks.is_match(line) {
      Some(Signal::NoBlocksProcessed)
    } else if let Some(captures) = self.last_indexed.captures(line) {
      Some(Signal::LastIndexed(captures[1].parse().unwrap_or_default()))
    } else if self.shutting_down.is_match(line) {
      Some(Signal::ShuttingDown)
    } else {
      None
    }
  }
}

/// Classifier-driven follow loop over indexer log lines.
///
/// The stop command is issued on the first no-more-blocks marker only;
/// the marker repeats while the indexer winds down and resending would be
/// redundant. The loop terminates on either terminal marker. Running out
/// of lines is an error: a live follow only stops yielding when it is
/// cancelled or times out.
pub(crate) fn drive(
  lines: impl IntoIterator<Item = Result<String>>,
  markers: &Markers,
  mut stop: impl FnMut() -> Result,
) -> Result<Outcome> {
  let mut stop_sent = false;

  for line in lines {
    let line = line?;

    log::debug!("indexer: {line}");

    match markers.classify(&line) {
      Some(Signal::NoBlocksProcessed) => {
        if !stop_sent {
          banner("Shutting down indexer");
          stop()?;
          stop_sent = true;
        }
      }
      Some(Signal::LastIndexed(block)) => return Ok(Outcome::LastIndexed(block)),
      Some(Signal::ShuttingDown) => return Ok(Outcome::ShutDown),
      None => {}
    }
  }

  bail!("indexer log ended before a shutdown marker was observed");
}

/// Follow-mode reader over the indexer log: yields complete lines as they
/// are appended, surfaces interrupts, and errors out at the deadline
/// instead of polling forever.
struct Tail {
  reader: BufReader<fs::File>,
  deadline: Option<Instant>,
}

impl Tail {
  fn follow(path: &Path, offset: u64, deadline: Option<Instant>) -> Result<Tail> {
    let mut file = fs::File::open(path)
      .with_context(|| format!("failed to open indexer log {}", path.display()))?;

    file.seek(SeekFrom::Start(offset))?;

    Ok(Tail {
      reader: BufReader::new(file),
      deadline,
    })
  }
}

impl Iterator for Tail {
  type Item = Result<String>;

  fn next(&mut self) -> Option<Result<String>> {
    let mut line = String::new();

    loop {
      match self.reader.read_line(&mut line) {
        Err(err) => return Some(Err(err.into())),
        Ok(0) => {
          if interrupted() {
            return Some(Err(anyhow!("interrupted while following indexer log")));
          }

          if let Some(deadline) = self.deadline {
            if Instant::now() >= deadline {
              return Some(Err(anyhow!(
                "timed out waiting for a shutdown marker in the indexer log"
              )));
            }
          }

          thread::sleep(POLL_INTERVAL);
        }
        Ok(_) => {
          // A read can end mid-line if the indexer hasn't flushed the
          // newline yet; keep appending until it arrives.
          if line.ends_with('\n') {
            return Some(Ok(line.trim_end().to_owned()));
          }
        }
      }
    }
  }
}

pub(crate) struct Indexer<'a> {
  settings: &'a Settings,
  markers: Markers,
}

impl<'a> Indexer<'a> {
  pub(crate) fn new(settings: &'a Settings) -> Result<Indexer<'a>> {
    Ok(Indexer {
      markers: Markers::new(settings.indexer_version())?,
      settings,
    })
  }

  /// Launch the indexer in the background with output suppressed, then
  /// wait out the warm-up before the caller starts reading logs. Returns
  /// the log offset at launch, so markers emitted during warm-up are not
  /// missed.
  pub(crate) fn start(&self) -> Result<u64> {
    let offset = fs::metadata(self.settings.log_file())
      .map(|metadata| metadata.len())
      .unwrap_or(0);

    let command = self.settings.start_command();

    Command::new(&command[0])
      .args(&command[1..])
      .stdout(Stdio::null())
      .stderr(Stdio::null())
      .spawn()
      .with_context(|| format!("failed to start indexer with `{}`", command.join(" ")))?;

    thread::sleep(self.settings.warmup());

    Ok(offset)
  }

  /// Ask the process manager to stop the indexer. Idempotent: asking a
  /// stopped indexer to stop is not an error.
  pub(crate) fn stop(&self) -> Result {
    let command = self.settings.stop_command();

    let status = Command::new(&command[0])
      .args(&command[1..])
      .stdout(Stdio::null())
      .stderr(Stdio::null())
      .status()
      .with_context(|| format!("failed to run `{}`", command.join(" ")))?;

    if !status.success() {
      log::warn!("`{}` exited with {status}", command.join(" "));
    }

    Ok(())
  }

  /// Follow the log from `offset` until the indexer confirms it is done
  /// with the configured rewrite range, stopping it once the range is
  /// exhausted.
  pub(crate) fn await_rewrite(&self, offset: u64) -> Result<Outcome> {
    let deadline = self
      .settings
      .timeout()
      .map(|timeout| Instant::now() + timeout);

    let tail = Tail::follow(self.settings.log_file(), offset, deadline)?;

    drive(tail, &self.markers, || self.stop())
  }
}

#[cfg(test)]
mod tests {
  use {super::*, pretty_assertions::assert_eq};

  fn markers() -> Markers {
    Markers::new(HyperionVersion::V3_3).unwrap()
  }

  fn ok(line: &str) -> Result<String> {
    Ok(line.into())
  }

  #[test]
  fn classify_recognizes_each_marker() {
    let markers = markers();

    assert_eq!(markers.classify("foo"), None);
    assert_eq!(
      markers.classify("2022-08-01 | WARNING | No blocks are being processed, please check your state files"),
      Some(Signal::NoBlocksProcessed),
    );
    assert_eq!(
      markers.classify("main | Shutting down master..."),
      Some(Signal::ShuttingDown),
    );
    assert_eq!(
      markers.classify("master | Last Indexed Block: 12345 | elapsed 42s"),
      Some(Signal::LastIndexed(12345)),
    );
  }

  #[test]
  fn classify_matches_version_specific_no_blocks_marker() {
    let v31 = Markers::new(HyperionVersion::V3_1).unwrap();

    assert_eq!(
      v31.classify("warn | No blocks processed"),
      Some(Signal::NoBlocksProcessed),
    );
    assert_eq!(markers().classify("warn | No blocks processed"), None);
  }

  #[test]
  fn drive_stops_once_and_breaks_on_last_indexed() {
    let lines = [
      "foo",
      "worker | No blocks are being processed, waiting",
      "worker | No blocks are being processed, waiting",
      "master | Last Indexed Block: 12345 done",
    ]
    .map(ok);

    let mut stops = 0;

    let outcome = drive(lines, &markers(), || {
      stops += 1;
      Ok(())
    })
    .unwrap();

    assert_eq!(outcome, Outcome::LastIndexed(12345));
    assert_eq!(stops, 1);
  }

  #[test]
  fn drive_breaks_on_shutting_down_without_stopping() {
    let lines = ["ingesting block 117443001", "main | Shutting down master"].map(ok);

    let mut stops = 0;

    let outcome = drive(lines, &markers(), || {
      stops += 1;
      Ok(())
    })
    .unwrap();

    assert_eq!(outcome, Outcome::ShutDown);
    assert_eq!(stops, 0);
  }

  #[test]
  fn drive_errors_when_lines_end_without_marker() {
    assert!(drive(["foo"].map(ok), &markers(), || Ok(())).is_err());
  }

  #[test]
  fn drive_propagates_line_errors() {
    let lines = [Ok("foo".into()), Err(anyhow!("timed out"))];

    assert_eq!(
      drive(lines, &markers(), || Ok(()))
        .unwrap_err()
        .to_string(),
      "timed out",
    );
  }

  #[test]
  fn tail_yields_appended_lines_then_times_out() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("proton-indexer-out.log");
    fs::write(&path, "one\ntwo\n").unwrap();

    let mut tail = Tail::follow(&path, 0, Some(Instant::now())).unwrap();

    assert_eq!(tail.next().unwrap().unwrap(), "one");
    assert_eq!(tail.next().unwrap().unwrap(), "two");
    assert!(
      tail
        .next()
        .unwrap()
        .unwrap_err()
        .to_string()
        .contains("timed out")
    );
  }

  #[test]
  fn tail_resumes_from_offset() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("proton-indexer-out.log");
    fs::write(&path, "old\nnew\n").unwrap();

    let mut tail = Tail::follow(&path, 4, Some(Instant::now())).unwrap();

    assert_eq!(tail.next().unwrap().unwrap(), "new");
  }

  #[test]
  fn stop_surfaces_unlaunchable_commands() {
    let settings = Settings::load(Options {
      stop_command: Some("nonexistent-process-manager trigger stop".into()),
      ..Default::default()
    })
    .unwrap();

    assert!(
      Indexer::new(&settings)
        .unwrap()
        .stop()
        .unwrap_err()
        .to_string()
        .contains("nonexistent-process-manager")
    );
  }

  #[test]
  fn start_records_log_offset_before_warmup() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("proton-indexer-out.log");
    fs::write(&path, "started\n").unwrap();

    let settings = Settings::load(Options {
      start_command: Some("true".into()),
      log_file: Some(path),
      warmup: Some("0s".parse().unwrap()),
      ..Default::default()
    })
    .unwrap();

    assert_eq!(Indexer::new(&settings).unwrap().start().unwrap(), 8);
  }
}
