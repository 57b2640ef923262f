//! Session manager - starts refinement runs in the background and serves
//! their progress to pollers.

use std::sync::Arc;
use std::time::Duration;

use log::{error, info};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::record::{SessionRecord, SessionSummary};
use super::registry::SessionRegistry;
use crate::error::{Result, TriadError};
use crate::refine::RefinementLoop;

/// Owns the registry and the loop used for every session
#[derive(Clone)]
pub struct SessionManager {
    registry: SessionRegistry,
    runner: Arc<RefinementLoop>,
}

impl SessionManager {
    pub fn new(runner: Arc<RefinementLoop>, registry: SessionRegistry) -> Self {
        Self { registry, runner }
    }

    /// Validate input, register a session and start its run in the
    /// background. Returns the session id immediately.
    pub async fn start(&self, task: &str, max_rounds: u32) -> Result<String> {
        let task = self.runner.validate(task, max_rounds)?.to_string();

        let (id, cancel) = self.registry.insert(&task, max_rounds).await?;
        let registry = self.registry.clone();
        let runner = Arc::clone(&self.runner);
        let session_id = id.clone();

        tokio::spawn(async move {
            let (tx, mut rx) = mpsc::unbounded_channel();

            // This task is the only writer to the session record
            let run = runner.run_with(&task, max_rounds, &cancel, Some(tx));
            let record = async {
                while let Some(event) = rx.recv().await {
                    registry.apply(&session_id, &event).await;
                }
            };
            let (result, ()) = tokio::join!(run, record);

            match result {
                Ok(report) => info!("Session {} finished: {}", session_id, report.outcome.label()),
                Err(e) => {
                    error!("Session {} could not run: {}", session_id, e);
                    registry.fail(&session_id, e.to_string()).await;
                }
            }
        });

        Ok(id)
    }

    /// Current snapshot of a session.
    pub async fn poll(&self, id: &str) -> Result<SessionRecord> {
        self.registry
            .get(id)
            .await
            .ok_or_else(|| TriadError::SessionNotFound(id.to_string()))
    }

    pub async fn cancel(&self, id: &str) -> Result<bool> {
        self.registry.cancel(id).await
    }

    pub async fn list(&self) -> Vec<SessionSummary> {
        self.registry.list().await
    }

    /// Periodically evict expired sessions until the returned task is aborted.
    pub fn spawn_sweeper(&self, every: Duration) -> JoinHandle<()> {
        let registry = self.registry.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            loop {
                ticker.tick().await;
                registry.evict_expired().await;
            }
        })
    }
}
