//! thingsorg CLI - Export Things 3 data to Org-mode.

use clap::Parser;
use std::future::Future;
use std::path::Path;
use std::process;
use std::time::Instant;
use thingsorg::cli::{Cli, Commands, ConfigCommands};
use thingsorg::commands::{self, Output};
use thingsorg::config::{self, ConfigOverrides, OutputFormat, ResolvedConfig};
use thingsorg::logging;

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose, cli.log_json);

    let start = Instant::now();
    let mut human = cli.human_readable;

    let result = resolve_settings(&cli).and_then(|settings| {
        human = settings.output_format() == OutputFormat::Human;
        run_command(cli.command, cli.replay_dir.as_deref(), &settings, human)
    });

    tracing::debug!(
        elapsed_ms = start.elapsed().as_millis() as u64,
        success = result.is_ok(),
        "command finished"
    );

    if let Err(e) = result {
        if human {
            eprintln!("Error: {}", e);
        } else {
            eprintln!("{}", serde_json::json!({ "error": e.to_string() }));
        }
        process::exit(1);
    }
}

/// Load config.kdl and apply environment and CLI overrides.
fn resolve_settings(cli: &Cli) -> Result<ResolvedConfig, thingsorg::Error> {
    let file = config::load_user_config()?;

    let mut overrides = ConfigOverrides::new();
    if cli.human_readable {
        overrides = overrides.with_output_format(OutputFormat::Human);
    }
    if let Commands::Export {
        output,
        tag_column,
        title,
        ..
    } = &cli.command
    {
        overrides.output = output.clone();
        overrides.tag_column = *tag_column;
        overrides.title = title.clone();
    }

    config::resolve_config(&file, &overrides)
}

fn run_command(
    command: Commands,
    replay_dir: Option<&Path>,
    settings: &ResolvedConfig,
    human: bool,
) -> Result<(), thingsorg::Error> {
    match command {
        Commands::Export { stdout, .. } => {
            let result = block_on(commands::export(replay_dir, settings, stdout))?;
            match result.path {
                Some(_) => output(&result, human),
                None => print!("{}", result.content),
            }
        }

        Commands::Check => {
            let result = block_on(commands::check(replay_dir))?;
            output(&result, human);
        }

        Commands::Config { command } => match command {
            ConfigCommands::Show => {
                let result = commands::config_show(settings, config::config_path());
                output(&result, human);
            }
        },
    }
    Ok(())
}

/// Run an async command to completion on a fresh runtime.
fn block_on<F, T>(future: F) -> Result<T, thingsorg::Error>
where
    F: Future<Output = Result<T, thingsorg::Error>>,
{
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| thingsorg::Error::Other(format!("Failed to create runtime: {}", e)))?
        .block_on(future)
}

fn output<T: Output>(result: &T, human: bool) {
    if human {
        println!("{}", result.to_human());
    } else {
        println!("{}", result.to_json());
    }
}
