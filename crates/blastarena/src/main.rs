use blastarena::{BlastarenaServer, ServerError};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), ServerError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let addr = std::env::var("BLASTARENA_ADDR")
        .unwrap_or_else(|_| "0.0.0.0:8080".to_string());

    let server = BlastarenaServer::builder().bind(&addr).build().await?;
    tracing::info!(%addr, "starting blastarena");
    server.run().await
}
