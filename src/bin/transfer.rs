use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use simpleud::client::TransferClient;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Upload and download files against a simpleud server",
    long_about = None
)]
struct Args {
    /// Server address, e.g. https://files.example.com
    #[arg(short, long)]
    server: Option<String>,

    /// Upload route on the server
    #[arg(long)]
    upload_path: Option<String>,

    /// Download route prefix on the server
    #[arg(long)]
    download_base_path: Option<String>,

    /// Attempts per transfer
    #[arg(long, default_value_t = 3)]
    retries: u32,

    /// Delay between attempts in milliseconds
    #[arg(long, default_value_t = 1000)]
    retry_delay_ms: u64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Send a local file to the server
    Upload { file: PathBuf },
    /// Fetch a stored file from the server
    Download {
        filename: String,
        /// Where to write the file (defaults to the filename)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "simpleud=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let client = TransferClient::new(
        args.server.as_deref(),
        args.upload_path.as_deref(),
        args.download_base_path.as_deref(),
    )?;
    let retry_delay = Duration::from_millis(args.retry_delay_ms);

    match args.command {
        Command::Upload { file } => {
            client.upload_with(&file, args.retries, retry_delay).await?;
            println!("uploaded {}", file.display());
        }
        Command::Download { filename, out } => {
            let path = client
                .download_with(&filename, out.as_deref(), args.retries, retry_delay)
                .await?;
            println!("saved {}", path.display());
        }
    }

    Ok(())
}
