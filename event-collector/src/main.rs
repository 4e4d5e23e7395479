//! Entry point for the cluster event collector.

use axum::routing::get;
use metrics_exporter_prometheus::PrometheusBuilder;
use tokio::sync::broadcast;
use tracing::{error, info};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use event_collector::{CollectorError, Dependencies};
use event_collector_pipeline::watch::run_event_feed;
use event_collector_query::routes;

#[tokio::main]
async fn main() -> Result<(), CollectorError> {
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let prometheus = PrometheusBuilder::new().install_recorder().map_err(|e| {
        CollectorError::config(format!("Failed to install metrics recorder: {}", e))
    })?;

    let deps = Dependencies::new().await?;
    let (shutdown_tx, _) = broadcast::channel::<()>(1);

    let feed_handle = tokio::spawn(run_event_feed(
        deps.kube_client,
        deps.queue.clone(),
        deps.feed_writer,
        shutdown_tx.subscribe(),
    ));

    // Workers must not look up snapshots before the cache holds the
    // initial listing.
    deps.feed_reader
        .wait_until_ready()
        .await
        .map_err(|e| CollectorError::config(format!("Cache sync failed: {}", e)))?;
    info!("Local cache synced");

    let collector = deps.collector;
    let collector_shutdown = shutdown_tx.subscribe();
    let mut collector_handle =
        tokio::spawn(async move { collector.run(collector_shutdown).await });

    let app = routes::router(deps.query_service).route(
        "/metrics",
        get(move || {
            let prometheus = prometheus.clone();
            async move { prometheus.render() }
        }),
    );
    let listener = tokio::net::TcpListener::bind(deps.http_addr).await?;
    info!(addr = %deps.http_addr, "HTTP API listening");

    let mut server_shutdown = shutdown_tx.subscribe();
    let server_handle = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = server_shutdown.recv().await;
            })
            .await
    });

    let mut exit: Result<(), CollectorError> = Ok(());
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received");
            let _ = shutdown_tx.send(());
            match collector_handle.await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => error!(error = %e, "Sync engine exited with error"),
                Err(e) => error!(error = %e, "Sync engine task panicked"),
            }
        }
        result = &mut collector_handle => {
            let _ = shutdown_tx.send(());
            match result {
                Ok(Ok(())) => info!("Sync engine finished"),
                Ok(Err(e)) => {
                    error!(error = %e, "Sync engine failed");
                    exit = Err(e.into());
                }
                Err(e) => {
                    error!(error = %e, "Sync engine task panicked");
                    exit = Err(CollectorError::config(e.to_string()));
                }
            }
        }
    }

    let _ = feed_handle.await;
    if let Ok(Err(e)) = server_handle.await {
        error!(error = %e, "HTTP server exited with error");
    }

    info!("Event collector stopped");
    exit
}
