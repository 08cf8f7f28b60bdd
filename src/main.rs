use crate::error::Result;
use log::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod app;
mod cli;
mod config;
mod error;
mod handlers;
mod models;
mod routes;
mod scripts;
mod services;

#[actix_web::main]
async fn main() -> Result<()> {
    // Load configuration
    dotenv::dotenv().ok();

    // Setup logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                // Default to info level if RUST_LOG is not set
                "smart_librarian_api=info,actix_web=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Loading configuration...");
    let config = config::Config::load()?;

    // Run modes: `index` rebuilds the vector collection from the catalog,
    // `chat` starts the interactive loop, no argument serves HTTP.
    match std::env::args().nth(1).as_deref() {
        Some("index") => scripts::index_catalog::run(&config).await,
        Some("chat") => cli::run(&config).await,
        Some(other) => {
            eprintln!(
                "Unknown mode {:?}; expected 'index', 'chat', or no argument to serve",
                other
            );
            std::process::exit(2);
        }
        None => {
            let application = app::Application::new(&config);
            application.run().await
        }
    }
}
