use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "pollctl", about = "Poll ledger: gateway, log replay and contract tools", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the HTTP gateway
    Serve(ServeArgs),
    /// Execute a JSON-lines invocation log against fresh channels
    Replay(ReplayArgs),
    /// List the functions each contract registers
    Functions(FunctionsArgs),
}

#[derive(Args)]
pub struct ServeArgs {
    /// TOML config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// Overrides `bind_addr` from the config
    #[arg(long)]
    pub bind: Option<String>,
    /// Run InitLedger on both channels before serving
    #[arg(long)]
    pub seed: bool,
}

#[derive(Args)]
pub struct ReplayArgs {
    pub log: PathBuf,
    /// Stop at the first failed invocation
    #[arg(long)]
    pub fail_fast: bool,
}

#[derive(Args)]
pub struct FunctionsArgs {
    /// Only list this channel's contract
    #[arg(long)]
    pub channel: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_serve_with_overrides() {
        let cli = Cli::try_parse_from([
            "pollctl", "serve", "--config", "gw.toml", "--bind", "0.0.0.0:8080", "--seed",
        ])
        .unwrap();
        if let Command::Serve(args) = cli.command {
            assert_eq!(args.config, Some(PathBuf::from("gw.toml")));
            assert_eq!(args.bind.as_deref(), Some("0.0.0.0:8080"));
            assert!(args.seed);
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn parse_replay() {
        let cli = Cli::try_parse_from(["pollctl", "replay", "log.jsonl", "--fail-fast"]).unwrap();
        if let Command::Replay(args) = cli.command {
            assert_eq!(args.log, PathBuf::from("log.jsonl"));
            assert!(args.fail_fast);
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn parse_functions_json() {
        let cli = Cli::try_parse_from(["pollctl", "functions", "--format", "json"]).unwrap();
        assert!(matches!(cli.command, Command::Functions(_)));
        assert_eq!(cli.format, OutputFormat::Json);
    }

    #[test]
    fn replay_requires_a_log() {
        assert!(Cli::try_parse_from(["pollctl", "replay"]).is_err());
    }
}
