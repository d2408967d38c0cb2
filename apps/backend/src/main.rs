use actix_web::{web, App, HttpServer};
use storefront::config::Settings;
use storefront::middleware::StructuredLogger;
use storefront::rate_limit::{spawn_sweeper, watch_sweeper};
use storefront::routes;
use storefront::state::app_state::AppState;
use tracing::info;

mod telemetry;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Environment variables must be set by the runtime environment.
    let settings = match Settings::from_env() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("❌ Invalid configuration: {e}");
            std::process::exit(1);
        }
    };

    telemetry::init_tracing(settings.log_format);

    let app_state = match AppState::from_settings(&settings) {
        Ok(state) => state,
        Err(e) => {
            eprintln!("❌ Failed to build application state: {e}");
            std::process::exit(1);
        }
    };

    let sweeper = spawn_sweeper(app_state.limiter.clone(), settings.sweep_interval);
    tokio::spawn(watch_sweeper(sweeper));

    info!(
        host = %settings.host,
        port = settings.port,
        workers = settings.workers,
        client_identity = ?settings.client_identity,
        "Starting storefront"
    );

    // Wrap AppState with web::Data before passing to HttpServer
    let data = web::Data::new(app_state);

    HttpServer::new(move || {
        App::new()
            .wrap(StructuredLogger)
            .app_data(data.clone())
            .configure(routes::configure)
    })
    .workers(settings.workers)
    .bind((settings.host.as_str(), settings.port))?
    .run()
    .await
}
