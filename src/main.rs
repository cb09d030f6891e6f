use log::info;
use simplelog::{ColorChoice, LevelFilter, TermLogger, TerminalMode};
use tokio::{
    net::TcpListener,
    signal::{
        ctrl_c,
        unix::{signal, SignalKind},
    },
};

mod api;

use api::{config::Config, AppState};

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    TermLogger::init(
        LevelFilter::Info,
        simplelog::Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )
    .expect("failed to initialize logger");

    let config = Config::load();

    info!("Initializing state...");
    let state = AppState::build(config)
        .await
        .expect("failed to initialize application state");

    let address = format!("0.0.0.0:{}", state.config.port);
    let app = api::router(state);
    let listener = TcpListener::bind(&address)
        .await
        .expect("failed to bind listener");
    info!("Portal running on {address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");

    info!("Portal shutting down");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        ctrl_c().await.expect("failed to install Ctrl+C handler");
        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        signal(SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
        info!("Received terminate signal, shutting down");
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
