use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::settings::Settings;

mod router;
mod services;
mod settings;

#[tokio::main]
async fn main() {
    let settings = Arc::new(Settings::new().expect("Failed to load settings."));

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            let app_name = env!("CARGO_PKG_NAME");
            let level = settings.logger.level.as_str();

            format!("{app_name}={level}").into()
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(e) = router::run(&settings).await {
        tracing::error!("hub stopped: {e}");
    }
}
