use crate::{config::Config, error::Result, routes::api_routes, services::LibrarianService};
use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use anyhow::Context;
use log::info;
use std::net::TcpListener;

pub struct Application {
    host: String,
    port: u16,
    config: Config,
}

impl Application {
    /// Create a new application instance
    pub fn new(config: &Config) -> Self {
        Self {
            host: config.host.clone(),
            port: config.port,
            config: config.clone(),
        }
    }

    /// Build and run the server
    pub async fn run(&self) -> Result<()> {
        let bind_address = format!("{}:{}", self.host, self.port);
        let listener = TcpListener::bind(&bind_address)?;
        info!("Starting server at http://{}", bind_address);

        self.run_with_listener(listener).await
    }

    /// Run the server with a specific TCP listener
    /// This is useful for testing where we want to use a random port
    pub async fn run_with_listener(&self, listener: TcpListener) -> Result<()> {
        let librarian = LibrarianService::from_config(&self.config)
            .await
            .context("Failed to initialize librarian service")?;
        let librarian = web::Data::new(librarian);

        HttpServer::new(move || {
            // CORS for the Vite dev frontend
            let cors = Cors::default()
                .allowed_origin("http://localhost:5173")
                .allowed_origin("http://127.0.0.1:5173")
                .allow_any_method()
                .allow_any_header()
                .supports_credentials();

            App::new()
                .wrap(cors)
                .wrap(Logger::default())
                .app_data(librarian.clone())
                .service(api_routes())
        })
        .listen(listener)?
        .run()
        .await?;

        Ok(())
    }
}
