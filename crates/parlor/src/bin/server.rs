//! The Parlor server binary.
//!
//! Configuration comes from the environment: `PARLOR_ADDR` for the bind
//! address (default `0.0.0.0:5000`), `RUST_LOG` for log filtering.

use parlor::prelude::*;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let addr = std::env::var("PARLOR_ADDR")
        .unwrap_or_else(|_| "0.0.0.0:5000".to_string());

    let server = ParlorServerBuilder::new()
        .bind(&addr)
        .build(GuestDirectory::new())
        .await?;

    tracing::info!(%addr, "parlor server starting");
    server.run().await?;
    Ok(())
}
