mod config;
mod frame;
mod rooms;
mod routes;
mod services;
mod state;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let config = config::Config::from_env();
    let port = config.port;
    let state = state::AppState::new(config);

    // Background board reclamation sweep.
    let _sweep = state.reclaimer.spawn_sweep_task();

    let app = routes::app(state);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}"))
        .await
        .expect("failed to bind");

    tracing::info!(%port, "inkboard listening");
    axum::serve(listener, app).await.expect("server failed");
}
