//! Pipeline orchestrator - wires intake, queue and dispatch together.

use std::future::Future;
use std::time::Instant;

use anyhow::{Context, Result};
use contracts::RelayBlueprint;
use dispatcher::{create_sink, DispatchLoop};
use ingestion::{intake_router, IntakeQueue, IntakeState};
use mapper::Mapper;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

use super::PipelineStats;
use crate::error::CliError;

/// Pipeline configuration
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Validated relay configuration
    pub blueprint: RelayBlueprint,
}

/// Main pipeline orchestrator
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    /// Create a new pipeline with the given configuration
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Serve until `shutdown` resolves, then drain and report
    ///
    /// Shutdown order: stop accepting HTTP, close the intake queue, let the
    /// dispatch loop drain it and wait for in-flight deliveries.
    #[instrument(name = "pipeline_run", skip_all)]
    pub async fn run<F>(self, shutdown: F) -> Result<PipelineStats>
    where
        F: Future<Output = ()> + Send,
    {
        let start_time = Instant::now();
        let blueprint = self.config.blueprint;

        if let Some(port) = blueprint.observability.metrics_port {
            observability::init_metrics_only(port)?;
            info!("Metrics endpoint available on port {}", port);
        }

        let sink = create_sink(&blueprint.destination).context("Failed to create destination sink")?;
        info!(
            sink = %blueprint.destination.name,
            kind = ?blueprint.destination.kind,
            "Destination sink ready"
        );

        let listener = TcpListener::bind(blueprint.server.listen.as_str())
            .await
            .map_err(|e| CliError::bind(&blueprint.server.listen, e))?;

        let queue = IntakeQueue::from_config(&blueprint.queue);
        let dispatch = DispatchLoop::new(
            queue.receiver(),
            sink,
            Mapper::new(blueprint.mapping.key_policy),
            &blueprint.dispatch,
        );
        let dispatch_handle = dispatch.spawn();

        let token = CancellationToken::new();
        let router = intake_router(IntakeState::new(
            queue.clone(),
            blueprint.server.max_body_bytes,
        ));
        let mut server = tokio::spawn(ingestion::serve(listener, router, token.clone()));

        let early_exit = tokio::select! {
            _ = shutdown => None,
            result = &mut server => Some(result),
        };
        let server_result = match early_exit {
            Some(result) => {
                warn!("Intake server exited before shutdown was requested");
                result
            }
            None => {
                token.cancel();
                server.await
            }
        };

        // nothing can enqueue past this point
        queue.close();

        let dispatch = dispatch_handle
            .await
            .map_err(|e| CliError::pipeline_execution(format!("dispatch loop failed: {e}")))?;

        match server_result {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                return Err(CliError::pipeline_execution(format!("intake server error: {e}")).into())
            }
            Err(e) => {
                return Err(CliError::pipeline_execution(format!("intake server task failed: {e}")).into())
            }
        }

        Ok(PipelineStats {
            duration: start_time.elapsed(),
            ingestion: queue.metrics().snapshot(),
            dispatch,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::SinkType;
    use tokio::sync::oneshot;

    #[tokio::test]
    async fn test_pipeline_stops_on_shutdown() {
        let mut blueprint = RelayBlueprint::default();
        blueprint.server.listen = "127.0.0.1:0".into();
        blueprint.destination.kind = SinkType::Log;

        let (tx, rx) = oneshot::channel::<()>();
        let pipeline = Pipeline::new(PipelineConfig { blueprint });
        let handle = tokio::spawn(pipeline.run(async {
            let _ = rx.await;
        }));

        tx.send(()).unwrap();
        let stats = handle.await.unwrap().unwrap();
        assert_eq!(stats.ingestion.events_received, 0);
        assert_eq!(stats.dispatch.metrics.dispatched, 0);
    }

    #[tokio::test]
    async fn test_bind_failure_is_reported() {
        let occupied = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let mut blueprint = RelayBlueprint::default();
        blueprint.server.listen = occupied.local_addr().unwrap().to_string();
        blueprint.destination.kind = SinkType::Log;

        let pipeline = Pipeline::new(PipelineConfig { blueprint });
        let err = pipeline.run(std::future::pending()).await.unwrap_err();
        assert!(err.to_string().contains("Failed to bind"));
    }
}
