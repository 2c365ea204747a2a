use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use tracing::Instrument;

use idlekeeper_lib::config::load_config;
use idlekeeper_lib::errors::KeeperResult;
use idlekeeper_lib::licence::{issue_token, LICENCE_ENV, SHARED_SECRET};
use idlekeeper_lib::{logging, run, RunOptions};

#[derive(Parser, Debug)]
#[command(
    name = "idlekeeper",
    version,
    about = "Keeps a game client online by watching for a screen landmark and simulating idle play"
)]
struct Cli {
    /// Directory for the daily-rotated log files
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the supervision loop (default)
    Run(RunArgs),
    /// Mint a licence token
    IssueLicence(IssueArgs),
    /// Print the resolved action configuration as JSON
    ShowConfig(ShowArgs),
}

#[derive(Args, Debug, Default)]
struct RunArgs {
    /// Config file (defaults to actions.toml next to the executable or in the working directory)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Landmark image (defaults to fp.png next to the config file)
    #[arg(long)]
    template: Option<PathBuf>,
    /// Licence token
    #[arg(long, env = LICENCE_ENV)]
    licence: Option<String>,
    /// Abort at startup unless the landmark is already on screen
    #[arg(long)]
    require_landmark: bool,
    /// Exit immediately once the loop gives up instead of waiting for Enter
    #[arg(long)]
    no_pause: bool,
}

#[derive(Args, Debug)]
struct IssueArgs {
    /// Validity period in minutes
    #[arg(long, default_value_t = 600)]
    minutes: i64,
    /// Free-form payload carried inside the token (no ':')
    #[arg(long, default_value = "operator")]
    payload: String,
}

#[derive(Args, Debug)]
struct ShowArgs {
    #[arg(long)]
    config: Option<PathBuf>,
}

fn wait_for_enter() {
    println!("press Enter to exit");
    let mut line = String::new();
    let _ = std::io::stdin().read_line(&mut line);
}

async fn run_command(args: RunArgs) -> KeeperResult<()> {
    let span = tracing::info_span!("session", id = %uuid::Uuid::new_v4());
    let stats = run(RunOptions {
        config: args.config,
        template: args.template,
        licence: args.licence,
        require_landmark: args.require_landmark,
    })
    .instrument(span)
    .await?;
    tracing::info!(cycles = stats.cycles, "idlekeeper finished");
    if !args.no_pause {
        wait_for_enter();
    }
    Ok(())
}

fn issue_command(args: IssueArgs) -> KeeperResult<()> {
    let token = issue_token(
        SHARED_SECRET,
        chrono::Duration::minutes(args.minutes),
        &args.payload,
        chrono::Utc::now(),
    )?;
    println!(
        "licence: {token}\nexpired: {} minutes, info: {}",
        args.minutes, args.payload
    );
    Ok(())
}

fn show_command(args: ShowArgs) -> KeeperResult<()> {
    let config = load_config(args.config.as_deref())?;
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // Load .env file if present (ignore error if not found)
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let _guard = match logging::init_logging(cli.log_dir.as_deref()) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };

    // Bare `idlekeeper` behaves like `idlekeeper run`; clap only reads the env
    // fallback for a parsed subcommand.
    let command = cli.command.unwrap_or_else(|| {
        Commands::Run(RunArgs {
            licence: std::env::var(LICENCE_ENV).ok(),
            ..Default::default()
        })
    });

    let result = match command {
        Commands::Run(args) => run_command(args).await,
        Commands::IssueLicence(args) => issue_command(args),
        Commands::ShowConfig(args) => show_command(args),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) if e.is_fatal_startup() => {
            tracing::error!(error = %e, "startup aborted");
            ExitCode::FAILURE
        }
        Err(e) => {
            tracing::error!(error = %e, "idlekeeper stopped on error");
            ExitCode::FAILURE
        }
    }
}
