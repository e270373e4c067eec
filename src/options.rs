use super::*;

#[derive(Clone, Default, Debug, Parser)]
pub struct Options {
  #[arg(
    long,
    help = "Mutate the indexer chain configuration at <CHAIN_CONFIG>. [default: /opt/eosio/src/Hyperion-History-API/chains/proton.config.json]"
  )]
  pub(crate) chain_config: Option<PathBuf>,
  #[arg(
    long,
    help = "Follow indexer output at <LOG_FILE>. [default: ~/.pm2/logs/proton-indexer-out.log]"
  )]
  pub(crate) log_file: Option<PathBuf>,
  #[arg(
    long,
    help = "Start the indexer with <START_COMMAND>. [default: ./run.sh proton-indexer]"
  )]
  pub(crate) start_command: Option<String>,
  #[arg(
    long,
    help = "Stop the indexer with <STOP_COMMAND>. [default: pm2 trigger proton-indexer stop]"
  )]
  pub(crate) stop_command: Option<String>,
  #[arg(
    long,
    value_enum,
    help = "Match log markers emitted by Hyperion <INDEXER_VERSION>. [default: 3.3]"
  )]
  pub(crate) indexer_version: Option<HyperionVersion>,
  #[arg(
    long,
    help = "Wait <WARMUP> after starting the indexer before following its log. [default: 10s]"
  )]
  pub(crate) warmup: Option<humantime::Duration>,
  #[arg(
    long,
    help = "Give up if no terminal log marker appears within <TIMEOUT> of starting a rewrite."
  )]
  pub(crate) timeout: Option<humantime::Duration>,
}
