use clap::{Args, Parser, Subcommand};
use readiness_lab::error::AppError;

use crate::demo::{run_content_check, run_demo, ContentCheckArgs, DemoArgs};
use crate::server;

#[derive(Parser, Debug)]
#[command(
    name = "Readiness Lab",
    about = "Run and demonstrate the Readiness Lab scenario service from the command line",
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
    /// Inspect and validate scenario content
    Content {
        #[command(subcommand)]
        command: ContentCommand,
    },
    /// Run an end-to-end CLI demo: scenario run, reflection, and debrief
    Demo(DemoArgs),
}

#[derive(Subcommand, Debug)]
enum ContentCommand {
    /// Validate a scenario JSON file and summarize its branches
    Check(ContentCheckArgs),
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
        Command::Content {
            command: ContentCommand::Check(args),
        } => run_content_check(args),
        Command::Demo(args) => run_demo(args),
    }
}
