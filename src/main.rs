use cashrisk::api::{Execution, RunArgs, WorkerMessage};
use clap::{Parser, Subcommand};
use tracing::error;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "cashrisk", about = "Monte Carlo cash-flow risk simulator")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run one simulation and print the result message as JSON.
    Run {
        #[command(flatten)]
        args: RunArgs,
        #[arg(long)]
        pretty: bool,
    },
    /// Serve the simulation API over HTTP.
    Serve {
        #[arg(long, default_value_t = 8080)]
        port: u16,
    },
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() {
    init_tracing();

    match Cli::parse().command {
        Command::Run { args, pretty } => {
            let (message, ok) = match Execution::Inline.run(args).await {
                Ok(result) => (WorkerMessage::completed(result), true),
                Err(e) => {
                    error!(error = %e, "simulation failed");
                    (WorkerMessage::failed(&e), false)
                }
            };
            let rendered = if pretty {
                serde_json::to_string_pretty(&message)
            } else {
                serde_json::to_string(&message)
            };
            match rendered {
                Ok(json) => println!("{json}"),
                Err(e) => {
                    error!(error = %e, "could not encode result");
                    std::process::exit(1);
                }
            }
            if !ok {
                std::process::exit(1);
            }
        }
        Command::Serve { port } => {
            if let Err(e) = cashrisk::api::run_http_server(port).await {
                error!(error = %e, "server error");
                std::process::exit(1);
            }
        }
    }
}
