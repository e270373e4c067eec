use super::*;

/// The four scalar fields this tool toggles in the indexer's chain
/// configuration. The file is edited as text: each field's line is located
/// with an unanchored pattern and the whole assignment, trailing comma
/// included, is replaced.
const FIELDS: [&str; 4] = ["start_on", "stop_on", "live_reader", "rewrite"];

pub(crate) struct ChainConfig {
  path: PathBuf,
}

impl ChainConfig {
  pub(crate) fn new(path: impl Into<PathBuf>) -> ChainConfig {
    ChainConfig { path: path.into() }
  }

  /// Point the indexer at a bounded historical rewrite of `[gt, lt)`.
  pub(crate) fn set_rewrite_range(&self, range: &GapRange) -> Result {
    self.set_field("start_on", &range.gt.to_string())?;
    self.set_field("stop_on", &range.lt.to_string())?;
    self.set_field("live_reader", "false")?;
    self.set_field("rewrite", "true")
  }

  /// Return the indexer to following the chain head.
  pub(crate) fn set_live(&self) -> Result {
    self.set_field("start_on", "0")?;
    self.set_field("stop_on", "0")?;
    self.set_field("live_reader", "true")?;
    self.set_field("rewrite", "false")
  }

  /// Replace the `key` assignment line with `"key": value,`.
  ///
  /// The pattern must match exactly once: zero matches would silently
  /// leave the indexer running with a stale range, and more than one would
  /// clobber unrelated text, so both are errors. The rewrite goes through
  /// a temporary file in the same directory and a rename, never a
  /// truncate-in-place.
  fn set_field(&self, key: &str, value: &str) -> Result {
    assert!(FIELDS.contains(&key));

    let contents = fs::read_to_string(&self.path)
      .with_context(|| format!("failed to read chain configuration {}", self.path.display()))?;

    let pattern = Regex::new(&format!(".{key}.*"))?;

    let matches = pattern.find_iter(&contents).count();

    ensure!(
      matches == 1,
      "expected chain configuration {} to contain exactly one `{key}` line, found {matches}",
      self.path.display(),
    );

    let updated = pattern.replace(&contents, format!("\"{key}\": {value},").as_str());

    let directory = self
      .path
      .parent()
      .filter(|parent| !parent.as_os_str().is_empty())
      .unwrap_or(Path::new("."));

    let mut file = tempfile::NamedTempFile::new_in(directory)
      .context("failed to create temporary chain configuration")?;

    file.write_all(updated.as_bytes())?;

    file.persist(&self.path).with_context(|| {
      format!("failed to replace chain configuration {}", self.path.display())
    })?;

    Ok(())
  }
}
