#![forbid(unsafe_code)]
#![warn(
    unused,
    unused_must_use,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs
)]

//! Binary entrypoint: wires the provisioning services and holds them until
//! the process is interrupted.

use rps_app::{AppResult, bootstrap};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> AppResult<()> {
    let (services, _context) = bootstrap().await?;
    info!("provisioning services ready");
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "signal listener failed; shutting down");
    }
    services.shutdown().await;
    Ok(())
}
