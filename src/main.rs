use std::sync::Arc;

use futures::{SinkExt, StreamExt};
use tokio_util::codec::{FramedRead, FramedWrite, LinesCodec};
use tracing::info;
use tracing_subscriber::EnvFilter;

use staybook::api::Handler;
use staybook::config::Config;
use staybook::engine::Engine;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // stdout carries responses, so logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let config = Config::from_env();
    staybook::observability::init(config.metrics_port)?;

    let engine = Arc::new(Engine::new(config.conflict_policy));
    let handler = Handler::new(engine, &config);

    info!("staybook ready, reading requests from stdin");
    info!("  conflict_policy: {:?}", config.conflict_policy);
    info!("  conflict_status: {}", config.conflict_status);
    info!(
        "  metrics: {}",
        config
            .metrics_port
            .map_or("disabled".to_string(), |p| format!("http://0.0.0.0:{p}/metrics"))
    );

    let mut requests = FramedRead::new(tokio::io::stdin(), LinesCodec::new());
    let mut responses = FramedWrite::new(tokio::io::stdout(), LinesCodec::new());

    // Stop on ctrl-c / SIGTERM; the request in flight finishes first.
    let shutdown = async {
        let ctrl_c = tokio::signal::ctrl_c();
        #[cfg(unix)]
        {
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(mut sigterm) => {
                    tokio::select! {
                        _ = ctrl_c => {}
                        _ = sigterm.recv() => {}
                    }
                }
                Err(e) => {
                    tracing::warn!("failed to register SIGTERM handler: {e}");
                    ctrl_c.await.ok();
                }
            }
        }
        #[cfg(not(unix))]
        {
            ctrl_c.await.ok();
        }
    };
    tokio::pin!(shutdown);

    let mut handled: u64 = 0;
    loop {
        tokio::select! {
            line = requests.next() => {
                let line = match line {
                    Some(Ok(line)) => line,
                    Some(Err(e)) => {
                        tracing::error!("read error: {e}");
                        break;
                    }
                    None => break,
                };
                if line.trim().is_empty() {
                    continue;
                }
                let response = handler.handle_line(&line).await;
                responses.send(serde_json::to_string(&response)?).await?;
                handled += 1;
            }
            _ = &mut shutdown => {
                info!("shutdown signal received, stopping");
                break;
            }
        }
    }

    info!("staybook stopped after {handled} requests");
    Ok(())
}
