//! Quantum-Rollup node binary.

use node_runtime::{NodeConfig, RollupNode};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = NodeConfig::from_env();
    let batch_interval = Duration::from_millis(config.rollup.batch_interval_ms);
    tracing::info!(?batch_interval, "starting quantum-rollup node");

    let node = RollupNode::new(config)?;
    let mut ticker = tokio::time::interval(batch_interval);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if let Err(error) = node.process_deposits().await {
                    tracing::warn!(%error, "deposit processing failed");
                }
                match node.produce_batch().await {
                    Ok(produced) => {
                        tracing::info!(
                            batch_number = produced.batch.batch_number,
                            transactions = produced.batch.len(),
                            confidence = produced.confidence,
                            "batch anchored"
                        );
                    }
                    Err(node_runtime::NodeError::NothingToBatch) => {}
                    Err(error) => {
                        tracing::error!(%error, "batch production failed");
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("shutting down");
                break;
            }
        }
    }

    Ok(())
}
