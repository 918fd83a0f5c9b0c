use clap::{Args, Parser, Subcommand};
use roomboard::api::{self, ProjectArgs};
use roomboard::config::AppConfig;
use roomboard::error::AppError;
use roomboard::telemetry;

#[derive(Parser, Debug)]
#[command(
    name = "roomboard",
    about = "Project residence room rates against board-approved increases and inflation recovery",
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
    /// Project a single rate and print the result as JSON
    Project(ProjectArgs),
}

#[derive(Args, Debug, Default)]
struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() {
    if let Err(err) = run_cli().await {
        eprintln!("application error: {err}");
        std::process::exit(1);
    }
}

async fn run_cli() -> Result<(), AppError> {
    let cli = Cli::parse();
    match cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()))
    {
        Command::Serve(args) => run_server(args).await,
        Command::Project(args) => run_project(args),
    }
}

async fn run_server(args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;
    api::run_http_server(config).await
}

fn run_project(args: ProjectArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let request = api::build_projection_request(args).map_err(AppError::InvalidInput)?;
    let response = api::run_projection(&config.schedule, &request);
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}
