use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let settings = api::config::settings();
    let state = api::build_app_state(settings).await?;

    if let Err(err) = state.engine.recover_on_startup().await {
        tracing::error!(error = %err, "startup recovery failed");
    }

    let app = api::routes::routes(state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(tower::limit::ConcurrencyLimitLayer::new(64)),
    );

    let listener = tokio::net::TcpListener::bind(settings.address()).await?;
    tracing::info!(address = %settings.address(), "listening");
    axum::serve(listener, app).await?;

    Ok(())
}
