use crate::report::{run_estimate, run_labor_index, EstimateArgs, LaborIndexArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use reno_estimate::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Renovation Estimator",
    about = "Serve and inspect renovation cost estimates from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Print an estimate for a construction template and base area
    Estimate(EstimateArgs),
    /// Show the current labor cost index or a historical value
    LaborIndex(LaborIndexArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Estimate(args) => run_estimate(args),
        Command::LaborIndex(args) => run_labor_index(args).await,
    }
}
