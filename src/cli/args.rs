use crate::core::config::{LedgerConfig, NetworkConfig};
use crate::core::contract::{MoveAuthorization, DEFAULT_CONTRACT_ID};
use crate::strategy::BatchConfig;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;
use tracing::Level;

/// Issue and transfer land titles on a simulated ledger
#[derive(Parser, Debug)]
#[command(name = "land-title-ledger")]
#[command(about = "Issue and transfer land titles on a simulated ledger", long_about = None)]
pub struct CliArgs {
    /// Input CSV file path containing ledger operations
    #[arg(value_name = "INPUT", help = "Path to the input CSV file")]
    pub input_file: PathBuf,

    /// Processing strategy to use
    #[arg(
        long = "strategy",
        value_name = "STRATEGY",
        default_value = "async",
        help = "Processing strategy: 'sync' for synchronous or 'async' for asynchronous"
    )]
    pub strategy: StrategyType,

    /// Number of operations per batch (async mode only)
    #[arg(
        long = "batch-size",
        value_name = "SIZE",
        help = "Number of operations per batch (default: 1000)"
    )]
    pub batch_size: Option<usize>,

    /// Number of runtime worker threads (async mode only)
    #[arg(
        long = "max-concurrent",
        value_name = "COUNT",
        help = "Number of worker threads (default: CPU cores)"
    )]
    pub max_concurrent_batches: Option<usize>,

    /// Legal name of the node running the flows
    #[arg(long = "me", value_name = "NAME", default_value = "PartyA")]
    pub me: String,

    /// Other parties on the network
    #[arg(
        long = "parties",
        value_name = "NAMES",
        value_delimiter = ',',
        default_value = "PartyB,PartyC"
    )]
    pub parties: Vec<String>,

    /// Legal name of the notary
    #[arg(long = "notary", value_name = "NAME", default_value = "Notary")]
    pub notary: String,

    /// Contract id tagged onto title outputs
    #[arg(long = "contract-id", value_name = "ID", default_value = DEFAULT_CONTRACT_ID)]
    pub contract_id: String,

    /// Validity window given to issuances, in seconds (at least 1)
    #[arg(
        long = "time-window-secs",
        value_name = "SECS",
        default_value_t = 30,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub time_window_secs: u64,

    /// Whose signature authorizes a move
    #[arg(long = "move-auth", value_name = "RULE", default_value = "current-owner")]
    pub move_authorization: MoveAuthorization,

    /// Require the issuer's signature on issuances
    #[arg(long = "require-issuer-signature")]
    pub require_issuer_signature: bool,

    /// How long to wait for the notary in async mode, in milliseconds
    #[arg(long = "finality-timeout-ms", value_name = "MILLIS", default_value_t = 10_000)]
    pub finality_timeout_ms: u64,

    /// Log level for messages written to stderr
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "info")]
    pub log_level: Level,
}

/// Available processing strategies
#[derive(Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum StrategyType {
    Sync,
    Async,
}

impl CliArgs {
    /// Create a BatchConfig from CLI arguments, falling back to defaults
    pub fn to_batch_config(&self) -> BatchConfig {
        if self.batch_size.is_some() || self.max_concurrent_batches.is_some() {
            let default = BatchConfig::default();
            BatchConfig::new(
                self.batch_size.unwrap_or(default.batch_size),
                self.max_concurrent_batches
                    .unwrap_or(default.max_concurrent_batches),
            )
        } else {
            BatchConfig::default()
        }
    }

    pub fn to_ledger_config(&self) -> LedgerConfig {
        LedgerConfig {
            contract_id: self.contract_id.clone(),
            time_window: Duration::from_secs(self.time_window_secs),
            move_authorization: self.move_authorization,
            require_issuer_signature: self.require_issuer_signature,
            finality_timeout: Duration::from_millis(self.finality_timeout_ms),
        }
    }

    pub fn to_network_config(&self) -> NetworkConfig {
        NetworkConfig {
            me: self.me.clone(),
            parties: self.parties.clone(),
            notary: self.notary.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::default_strategy(&["program", "input.csv"], StrategyType::Async)]
    #[case::explicit_sync(&["program", "--strategy", "sync", "input.csv"], StrategyType::Sync)]
    #[case::explicit_async(&["program", "--strategy", "async", "input.csv"], StrategyType::Async)]
    fn test_strategy_parsing(#[case] args: &[&str], #[case] expected: StrategyType) {
        let parsed = CliArgs::try_parse_from(args).unwrap();
        assert_eq!(parsed.strategy, expected);
    }

    #[rstest]
    #[case::all_defaults(&["program", "input.csv"], 1000, num_cpus::get())]
    #[case::custom_batch_size(&["program", "--batch-size", "2000", "input.csv"], 2000, num_cpus::get())]
    #[case::custom_max_concurrent(&["program", "--max-concurrent", "8", "input.csv"], 1000, 8)]
    #[case::zero_batch_size(&["program", "--batch-size", "0", "input.csv"], 1000, num_cpus::get())]
    fn test_batch_config_conversion(
        #[case] args: &[&str],
        #[case] expected_batch_size: usize,
        #[case] expected_max_concurrent: usize,
    ) {
        let config = CliArgs::try_parse_from(args).unwrap().to_batch_config();

        assert_eq!(config.batch_size, expected_batch_size);
        assert_eq!(config.max_concurrent_batches, expected_max_concurrent);
    }

    #[test]
    fn test_ledger_config_defaults() {
        let parsed = CliArgs::try_parse_from(["program", "input.csv"]).unwrap();

        assert_eq!(parsed.to_ledger_config(), LedgerConfig::default());
        assert_eq!(parsed.log_level, Level::INFO);
    }

    #[test]
    fn test_ledger_config_overrides() {
        let parsed = CliArgs::try_parse_from([
            "program",
            "--time-window-secs",
            "5",
            "--move-auth",
            "new-owner",
            "--require-issuer-signature",
            "--finality-timeout-ms",
            "250",
            "--contract-id",
            "registry.Title",
            "input.csv",
        ])
        .unwrap();

        let config = parsed.to_ledger_config();

        assert_eq!(config.time_window, Duration::from_secs(5));
        assert_eq!(config.move_authorization, MoveAuthorization::NewOwner);
        assert!(config.require_issuer_signature);
        assert_eq!(config.finality_timeout, Duration::from_millis(250));
        assert_eq!(config.contract_id, "registry.Title");
    }

    #[test]
    fn test_network_config_from_args() {
        let parsed = CliArgs::try_parse_from([
            "program",
            "--me",
            "P1",
            "--parties",
            "P2,P3",
            "--notary",
            "Registry Notary",
            "input.csv",
        ])
        .unwrap();

        assert_eq!(
            parsed.to_network_config(),
            NetworkConfig {
                me: "P1".to_string(),
                parties: vec!["P2".to_string(), "P3".to_string()],
                notary: "Registry Notary".to_string(),
            }
        );
    }

    #[rstest]
    #[case::missing_input(&["program"])]
    #[case::invalid_strategy(&["program", "--strategy", "invalid", "input.csv"])]
    #[case::invalid_move_auth(&["program", "--move-auth", "anyone", "input.csv"])]
    #[case::invalid_log_level(&["program", "--log-level", "loud", "input.csv"])]
    #[case::zero_time_window(&["program", "--time-window-secs", "0", "input.csv"])]
    fn test_parsing_errors(#[case] args: &[&str]) {
        assert!(CliArgs::try_parse_from(args).is_err());
    }
}
