//! `calculator-client`: runs one calculator operation, or the demo sequence.

use std::path::PathBuf;
use std::time::Duration;

use calc_bootstrap::{AppConfig, CliArgs, init_logging};
use calc_transport_grpc::GrpcClientConfig;
use calculator_sdk::{CalculatorClientV1, CalculatorError, CalculatorGrpcClient, SERVICE_NAME};
use clap::{Parser, Subcommand};

/// Calculator gRPC client
#[derive(Parser, Debug)]
#[command(name = "calculator-client", version)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Server URI, overrides `client.endpoint`
    #[arg(long)]
    endpoint: Option<String>,

    /// Delay between streamed requests, e.g. "250ms"
    #[arg(long, value_parser = humantime::parse_duration)]
    pacing: Option<Duration>,

    /// Print effective configuration (YAML) and exit
    #[arg(long)]
    print_config: bool,

    /// Log verbosity level (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
enum Commands {
    /// Sum a list of integers
    Sum {
        #[arg(allow_negative_numbers = true)]
        values: Vec<i32>,
    },
    /// Square root of an integer
    Sqrt {
        #[arg(allow_negative_numbers = true)]
        number: i32,
    },
    /// Stream the prime factors of an integer
    Factorize {
        #[arg(allow_negative_numbers = true)]
        number: i32,
    },
    /// Stream integers and print their truncated average
    Average {
        #[arg(allow_negative_numbers = true)]
        values: Vec<i32>,
    },
    /// Stream integers and print every new maximum
    Max {
        #[arg(allow_negative_numbers = true)]
        values: Vec<i32>,
    },
    /// Run one call of each streaming shape plus a sum (default)
    Demo,
}

fn demo_commands() -> Vec<Commands> {
    vec![
        Commands::Sum {
            values: vec![12, 10, 20],
        },
        Commands::Factorize { number: 120 },
        Commands::Average {
            values: vec![10, 20, 30],
        },
        Commands::Max {
            values: vec![1, 15, 2, 4, 17, 2, 15, 17, 20, 21, 23, 50, 10],
        },
    ]
}

fn format_list(values: &[i32]) -> String {
    values
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Run a single operation and render its result as one line.
///
/// A rejected square root is a result, not a failure of the client.
async fn run_one(
    client: &dyn CalculatorClientV1,
    command: Commands,
) -> Result<String, CalculatorError> {
    let line = match command {
        Commands::Sum { values } => {
            let sum = client.sum(values.clone()).await?;
            format!("sum of [{}] = {sum}", format_list(&values))
        }
        Commands::Sqrt { number } => match client.square_root(number).await {
            Ok(root) => format!("square root of {number} = {root}"),
            Err(CalculatorError::InvalidArgument(message)) => {
                tracing::warn!(number, %message, "square root rejected");
                format!("square root of {number} rejected: {message}")
            }
            Err(err) => return Err(err),
        },
        Commands::Factorize { number } => {
            let factors = client.factorize(number).await?;
            format!("prime factors of {number} = [{}]", format_list(&factors))
        }
        Commands::Average { values } => {
            let average = client.compute_average(values.clone()).await?;
            format!("average of [{}] = {average}", format_list(&values))
        }
        Commands::Max { values } => {
            let maxima = client.find_maximum(values).await?;
            format!("maxima = [{}]", format_list(&maxima))
        }
        Commands::Demo => {
            let mut lines = Vec::new();
            for step in demo_commands() {
                lines.push(Box::pin(run_one(client, step)).await?);
            }
            lines.join("\n")
        }
    };
    Ok(line)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load_or_default(cli.config.as_deref())?;
    config.apply_cli_overrides(&CliArgs {
        endpoint: cli.endpoint,
        stream_pacing: cli.pacing,
        verbose: cli.verbose,
        ..Default::default()
    });

    if cli.print_config {
        print!("{}", config.to_yaml()?);
        return Ok(());
    }

    init_logging(&config.logging)?;

    let grpc = GrpcClientConfig::new(SERVICE_NAME)
        .with_connect_timeout(config.client.connect_timeout)
        .with_rpc_timeout(config.client.rpc_timeout)
        .with_max_retries(config.client.max_retries);
    let client = CalculatorGrpcClient::connect(config.client.endpoint.clone(), &grpc)
        .await?
        .with_stream_pacing(config.client.stream_pacing);

    let output = run_one(&client, cli.command.unwrap_or(Commands::Demo)).await?;
    println!("{output}");
    Ok(())
}
