mod cli;
mod commands;
mod config;
mod error;
mod output;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    // A .env next to the invocation may carry BBOX_PWD and friends
    dotenvy::dotenv().ok();
    let mut cli = Cli::parse();

    init_tracing(cli.global.verbose);
    config::apply_defaults(&mut cli.global, &config::load_config_or_default().defaults);

    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        // Config commands don't need a router connection
        Command::Config(args) => commands::config_cmd::handle(args, &cli.global),

        Command::Completions(args) => {
            use clap::CommandFactory;
            use clap_complete::generate;

            let mut cmd = Cli::command();
            generate(args.shell, &mut cmd, "bbcli", &mut std::io::stdout());
            Ok(())
        }

        // Everything else logs in and keeps the token fresh while it runs
        cmd => {
            let session = config::connect(&cli.global).await?;
            let refresher = session.auth().start_refresher()?;

            tracing::debug!(command = ?cmd, "dispatching command");
            let result = commands::dispatch(cmd, &session, &cli.global).await;

            refresher.stop().await;
            result
        }
    }
}
