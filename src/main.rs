use std::{error::Error, fs, path::PathBuf};

use axum::body::Bytes;
use clap::{Parser, Subcommand};

use qrsentry::{
    config::AppConfig,
    handler::{RequestHandler, ScanRequest},
    server,
    telemetry::init_tracing,
};

#[derive(Parser, Debug)]
#[command(name = "qrsentry", version, about = "QR code risk scanner")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP server (default)
    Serve,
    /// Scan one image and print the result as JSON
    Scan {
        /// Image file holding the QR code
        image: PathBuf,
        /// Language of the safety tips (en, si, ta)
        #[arg(long)]
        lang: Option<String>,
        /// Text to classify when the image holds no readable code
        #[arg(long)]
        text: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let config = AppConfig::from_env()?;
    init_tracing(&config.log_level);

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => {
            tracing::info!(service = "qrsentry", "starting");
            server::serve(config).await?;
        }
        Commands::Scan { image, lang, text } => {
            let handler = RequestHandler::from_config(&config)?;
            let request = ScanRequest { image: Some(Bytes::from(fs::read(&image)?)), text, lang };
            let result = handler.handle(request).await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
    }

    Ok(())
}
