use clap::Parser;
use miette::{IntoDiagnostic, Result};
use payment_orchestrator::application::dispatcher::EventDispatcher;
use payment_orchestrator::application::engine::PaymentEngine;
use payment_orchestrator::config::{Config, LogFormat};
use payment_orchestrator::domain::ports::{PaymentGatewayRef, PaymentStoreBox};
use payment_orchestrator::infrastructure::gateway::{RandomOutcomes, SimulatedGateway};
use payment_orchestrator::infrastructure::in_memory::InMemoryPaymentStore;
use payment_orchestrator::infrastructure::notifications::{
    LoggingNotificationSink, LoggingOrderSync,
};
use payment_orchestrator::interfaces::http::{AppState, router};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::parse();
    init_tracing(config.log_format);

    let store = open_store(&config)?;
    let gateway: PaymentGatewayRef = Arc::new(
        SimulatedGateway::new(Arc::new(RandomOutcomes::new(
            config.authorize_success_rate,
            config.refund_success_rate,
        )))
        .with_latency(config.authorize_latency(), config.refund_latency()),
    );
    let (events, dispatcher) = EventDispatcher::spawn(
        Arc::new(LoggingNotificationSink),
        Arc::new(LoggingOrderSync::new(config.order_service_url.clone())),
        config.event_buffer,
    );

    let engine = PaymentEngine::new(store, gateway, events)
        .with_gateway_timeout(config.gateway_timeout());
    let app = router(AppState::new(engine));

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .into_diagnostic()?;
    info!(addr = %config.bind, "Payment service listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .into_diagnostic()?;

    // The router, and with it the last event publisher, is gone by now.
    dispatcher.shutdown().await;
    info!("Payment service stopped");
    Ok(())
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    match format {
        LogFormat::Pretty => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

fn open_store(config: &Config) -> Result<PaymentStoreBox> {
    let Some(db_path) = &config.db_path else {
        return Ok(Box::new(InMemoryPaymentStore::new()));
    };

    #[cfg(feature = "storage-rocksdb")]
    {
        use payment_orchestrator::infrastructure::rocksdb::RocksDBPaymentStore;
        info!(path = %db_path.display(), "Using RocksDB storage");
        let store = RocksDBPaymentStore::open(db_path).into_diagnostic()?;
        Ok(Box::new(store))
    }

    #[cfg(not(feature = "storage-rocksdb"))]
    {
        warn!(
            path = %db_path.display(),
            "WARNING: Persistent storage requested via --db-path, but 'storage-rocksdb' feature is not enabled. Falling back to In-Memory storage."
        );
        Ok(Box::new(InMemoryPaymentStore::new()))
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
    }
}
