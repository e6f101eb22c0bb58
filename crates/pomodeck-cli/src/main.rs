use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use tracing_subscriber::EnvFilter;

mod commands;
mod terminal;

#[derive(Parser)]
#[command(name = "pomodeck", version, about = "Single-button Pomodoro timer")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive session driven by key presses on stdin
    Run {
        /// Print journal events as JSON lines instead of a countdown bar
        #[arg(long)]
        json: bool,
        /// Length of one countdown second in milliseconds
        #[arg(long, default_value = "1000", hide = true)]
        tick_ms: u64,
    },
    /// Replay a gesture sequence against the workflow, offline
    Simulate(commands::simulate::SimulateArgs),
    /// Show resolved phase durations
    Durations {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Print shell completions
    Completions {
        shell: Shell,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("pomodeck=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    init_tracing();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Run { json, tick_ms } => commands::run::run(json, tick_ms),
        Commands::Simulate(args) => commands::simulate::run(args),
        Commands::Durations { json } => commands::durations::run(json),
        Commands::Config { action } => commands::config::run(action),
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "pomodeck", &mut std::io::stdout());
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
