//! # Foodies Cart
//!
//! Storefront cart service in front of the foodies REST backend.
//!
//! ```bash
//! FOODIES_API_URL=http://localhost:8080 PORT=3000 foodies-cart
//! ```

use cart_api::{routes, state::AppState};
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(Level::INFO.into())
                .from_env_lossy(),
        )
        .init();

    let state = AppState::new()?;
    let config = state.config.clone();
    let addr = config.socket_addr()?;
    let policy = state.calculator.policy();

    info!(
        version = env!("CARGO_PKG_VERSION"),
        environment = %config.environment,
        "Starting foodies-cart"
    );
    info!(
        shipping = %policy.shipping_fee,
        tax_rate = %policy.tax_rate,
        "Pricing policy"
    );
    info!(
        idle_secs = config.session_idle_ttl.as_secs(),
        max_sessions = config.max_sessions,
        "Session limits"
    );

    let app = routes::create_router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on http://{}", addr);
    if !config.is_production() {
        info!("Payment return landing: http://{}/payment/verify?orderId=...", addr);
    }

    axum::serve(listener, app).await?;
    Ok(())
}
