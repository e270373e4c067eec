use super::*;

pub(crate) const DEFAULT_CHAIN_CONFIG: &str =
  "/opt/eosio/src/Hyperion-History-API/chains/proton.config.json";
pub(crate) const DEFAULT_START_COMMAND: &str = "./run.sh proton-indexer";
pub(crate) const DEFAULT_STOP_COMMAND: &str = "pm2 trigger proton-indexer stop";
pub(crate) const DEFAULT_WARMUP: Duration = Duration::from_secs(10);

/// File locations, process-manager commands, and the indexer version whose
/// log markers to expect. Built once from `Options` and passed to every
/// subcommand.
#[derive(Debug, Clone)]
pub struct Settings {
  chain_config: PathBuf,
  log_file: PathBuf,
  start_command: Vec<String>,
  stop_command: Vec<String>,
  indexer_version: HyperionVersion,
  warmup: Duration,
  timeout: Option<Duration>,
}

impl Settings {
  pub(crate) fn load(options: Options) -> Result<Settings> {
    let log_file = match options.log_file {
      Some(log_file) => log_file,
      None => dirs::home_dir()
        .ok_or_else(|| anyhow!("failed to determine home directory, pass --log-file"))?
        .join(".pm2/logs/proton-indexer-out.log"),
    };

    Ok(Settings {
      chain_config: options
        .chain_config
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CHAIN_CONFIG)),
      log_file,
      start_command: Self::command(
        &options
          .start_command
          .unwrap_or_else(|| DEFAULT_START_COMMAND.into()),
      )?,
      stop_command: Self::command(
        &options
          .stop_command
          .unwrap_or_else(|| DEFAULT_STOP_COMMAND.into()),
      )?,
      indexer_version: options.indexer_version.unwrap_or_default(),
      warmup: options.warmup.map(Into::into).unwrap_or(DEFAULT_WARMUP),
      timeout: options.timeout.map(Into::into),
    })
  }

  fn command(command: &str) -> Result<Vec<String>> {
    let words = command
      .split_whitespace()
      .map(str::to_owned)
      .collect::<Vec<String>>();

    ensure!(!words.is_empty(), "command may not be empty");

    Ok(words)
  }

  pub(crate) fn chain_config(&self) -> &PathBuf {
    &self.chain_config
  }

  pub(crate) fn log_file(&self) -> &PathBuf {
    &self.log_file
  }

  pub(crate) fn start_command(&self) -> &[String] {
    &self.start_command
  }

  pub(crate) fn stop_command(&self) -> &[String] {
    &self.stop_command
  }

  pub(crate) fn indexer_version(&self) -> HyperionVersion {
    self.indexer_version
  }

  pub(crate) fn warmup(&self) -> Duration {
    self.warmup
  }

  pub(crate) fn timeout(&self) -> Option<Duration> {
    self.timeout
  }
}
