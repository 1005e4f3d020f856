mod config;
mod error;
mod model;
mod web;

use actix_files as fs;
use actix_web::{
    middleware::{from_fn, Logger},
    web::Data,
    App, HttpServer,
};
use dotenv::dotenv;
use log::{error, info, warn};

use config::Config;
use error::RelayError;
use model::GeminiClient;
use web::{origin::OriginGate, routes};

// App state structure
pub struct AppState {
    config: Config,
    backend: Option<GeminiClient>,
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Initialize environment
    dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    info!("Starting prompt relay");

    let config = Config::from_env();

    let backend = match GeminiClient::from_config(&config.backend) {
        Ok(client) => Some(client),
        Err(RelayError::BackendUnconfigured) if !config.backend.require_api_key => {
            warn!("API_KEY is missing, serving fallback responses");
            None
        }
        Err(RelayError::BackendUnconfigured) => {
            error!("API_KEY is missing and REQUIRE_API_KEY is set");
            std::process::exit(1);
        }
        Err(e) => {
            error!("Failed to initialize AI backend client: {}", e);
            std::process::exit(1);
        }
    };

    let addr = config.server_addr();
    let static_dir = config.static_dir.clone();
    let gate = Data::new(OriginGate::new(config.allowed_origins.clone()));
    let app_state = Data::new(AppState { config, backend });

    info!("Server running on {}", addr);
    info!("API available at http://{}/api/ai", addr);

    // Start web server
    HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .app_data(gate.clone())
            .wrap(web::origin::cors(gate.get_ref().clone()))
            .wrap(from_fn(web::origin::enforce))
            .wrap(Logger::default())
            .configure(routes::configure)
            .service(fs::Files::new("/", &static_dir).index_file("index.html"))
    })
    .bind(addr)?
    .run()
    .await
}
