use std::net::SocketAddr;
use std::path::Path;

use attendance_agent::api::{self, AppState};
use attendance_agent::database::seed_sample_database;
use attendance_agent::providers::build_provider;
use attendance_agent::Settings;
use clap::Parser;
use colored::Colorize;
use dotenv::dotenv;
use log::{info, warn};
use tokio::net::TcpListener;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Bind address, overrides HOST
    #[arg(long)]
    host: Option<String>,

    /// Listen port, overrides PORT
    #[arg(long)]
    port: Option<u16>,

    /// Create a sample attendance database and exit
    #[arg(long)]
    seed_db: bool,

    /// Extract the configured PDF, print a summary, and exit
    #[arg(long)]
    extract_only: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let mut settings = Settings::from_env();
    if let Some(host) = args.host {
        settings.host = host;
    }
    if let Some(port) = args.port {
        settings.port = port;
    }

    if args.seed_db {
        seed_sample_database(&settings.database_path)?;
        println!(
            "{} {}",
            "Sample database created at:".green(),
            settings.database_path
        );
        return Ok(());
    }

    if settings.api_key.is_none() {
        warn!("OPENAI_API_KEY not found in environment variables!");
        warn!("Create a .env file with your API key or set the environment variable.");
    }

    let provider = build_provider(&settings);
    let state = AppState::new(settings.clone(), provider);

    // Extract the attendance report up front so the first question does not
    // pay for it. A missing file is a warning, not a startup failure.
    info!("Loading attendance data from {}...", settings.pdf_path);
    match state.snapshots.get_or_extract(Path::new(&settings.pdf_path)) {
        Ok(snapshot) => {
            info!(
                "Attendance data loaded: {} pages, {} characters",
                snapshot.total_pages, snapshot.total_characters
            );
            if args.extract_only {
                println!("{}", "Extracted PDF content:".green());
                println!("{}", snapshot.full_text);
                println!("Total pages: {}", snapshot.total_pages);
                println!("Total characters: {}", snapshot.total_characters);
                return Ok(());
            }
        }
        Err(e) => {
            if args.extract_only {
                return Err(e.to_string().into());
            }
            warn!("Failed to load attendance data: {}", e);
            warn!("Set PDF_FILE_PATH or place the report next to the binary.");
        }
    }

    let addr: SocketAddr = format!("{}:{}", settings.host, settings.port).parse()?;
    let app = api::create_api(state);

    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| format!("Failed to bind to {}: {}", addr, e))?;

    println!("{} http://{}", "Attendance agent listening on".green(), addr);
    info!("Ready to accept connections");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .map_err(|e| format!("Server error: {}", e))?;

    Ok(())
}
