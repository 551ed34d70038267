use anyhow::Context;
use colored::Colorize;
use poll_gateway::{GatewayConfig, GatewayServer};
use poll_ledger::Contract;

use crate::cli::*;
use crate::replay::{parse_log, Outcome, Replayer};

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Serve(args) => cmd_serve(args),
        Command::Replay(args) => cmd_replay(args, cli.format),
        Command::Functions(args) => cmd_functions(args, cli.format),
    }
}

fn cmd_serve(args: ServeArgs) -> anyhow::Result<()> {
    let mut config = match &args.config {
        Some(path) => GatewayConfig::from_toml_file(path)?,
        None => GatewayConfig::default(),
    };
    if let Some(bind) = &args.bind {
        config.bind_addr = bind
            .parse()
            .with_context(|| format!("invalid bind address {bind:?}"))?;
    }
    if args.seed {
        config.seed_ledgers = true;
    }

    tracing::info!(
        bind = %config.bind_addr,
        seed = config.seed_ledgers,
        cors = config.permissive_cors,
        "starting gateway"
    );
    let server = GatewayServer::new(config)?;
    println!(
        "{} Poll gateway on {}",
        "✓".green().bold(),
        server.config().bind_addr.to_string().bold()
    );
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(server.serve())?;
    Ok(())
}

fn cmd_replay(args: ReplayArgs, format: OutputFormat) -> anyhow::Result<()> {
    let text = std::fs::read_to_string(&args.log)
        .with_context(|| format!("failed to read {}", args.log.display()))?;
    let entries = parse_log(&text)?;
    tracing::info!(log = %args.log.display(), entries = entries.len(), "replaying log");
    let replayer = Replayer::new();

    let (mut committed, mut failed) = (0usize, 0usize);
    for entry in &entries {
        let outcome = replayer.apply(entry)?;
        match format {
            OutputFormat::Json => println!("{}", serde_json::to_string(&outcome)?),
            OutputFormat::Text => match &outcome.result {
                Outcome::Committed {
                    tx_id,
                    timestamp,
                    payload,
                } => println!(
                    "{:>4} {} {}/{} @{}  {}",
                    outcome.line.to_string().dimmed(),
                    tx_id.short().yellow(),
                    outcome.channel.cyan(),
                    outcome.function.bold(),
                    timestamp,
                    payload
                ),
                Outcome::Failed { kind, error } => println!(
                    "{:>4} {} {}/{}  {}: {}",
                    outcome.line.to_string().dimmed(),
                    "✗".red().bold(),
                    outcome.channel.cyan(),
                    outcome.function.bold(),
                    kind.red(),
                    error
                ),
            },
        }

        if outcome.result.is_committed() {
            committed += 1;
        } else {
            failed += 1;
            if args.fail_fast {
                break;
            }
        }
    }

    tracing::info!(committed, failed, "replay finished");
    if format == OutputFormat::Text {
        println!(
            "{} Replayed {} invocations: {} committed, {} failed.",
            "✓".green().bold(),
            committed + failed,
            committed.to_string().green(),
            failed.to_string().red()
        );
    }
    Ok(())
}

fn cmd_functions(args: FunctionsArgs, format: OutputFormat) -> anyhow::Result<()> {
    let contracts: Vec<Contract> = [Contract::transactions(), Contract::votes()]
        .into_iter()
        .filter(|c| args.channel.as_deref().map_or(true, |name| c.name() == name))
        .collect();
    if contracts.is_empty() {
        anyhow::bail!(
            "unknown channel {:?}",
            args.channel.unwrap_or_default()
        );
    }

    match format {
        OutputFormat::Json => {
            let listing: serde_json::Map<String, serde_json::Value> = contracts
                .iter()
                .map(|c| (c.name().to_string(), c.functions().collect::<Vec<_>>().into()))
                .collect();
            println!("{}", serde_json::to_string_pretty(&listing)?);
        }
        OutputFormat::Text => {
            for contract in &contracts {
                println!("{}", contract.name().cyan().bold());
                for function in contract.functions() {
                    println!("  {function}");
                }
            }
        }
    }
    Ok(())
}
