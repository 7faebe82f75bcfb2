use crate::asset_host::truncate_body;
use log::{info, warn};
use std::sync::Mutex;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BuildTriggerError {
    #[error("Failed to send build hook: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Build hook responded with status {status}: {body}")]
    Status { status: u16, body: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BuildState {
    #[default]
    Idle,
    Building,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerOutcome {
    /// A rebuild was already in flight, nothing was sent
    Rejected,
    /// The hook call finished, whatever its result
    Settled,
}

#[async_trait::async_trait]
pub trait BuildHook: Send + Sync {
    async fn fire(&self) -> Result<(), BuildTriggerError>;
}

pub struct HttpBuildHook {
    client: reqwest::Client,
    hook_url: String,
}

impl HttpBuildHook {
    pub fn new(client: reqwest::Client, hook_url: String) -> Self {
        HttpBuildHook { client, hook_url }
    }
}

#[async_trait::async_trait]
impl BuildHook for HttpBuildHook {
    async fn fire(&self) -> Result<(), BuildTriggerError> {
        let resp = self.client.post(&self.hook_url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.bytes().await.map(|b| truncate_body(&b)).unwrap_or_default();
            return Err(BuildTriggerError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }
}

/// Best-effort site rebuild, one call in flight at most
pub struct RebuildTrigger {
    hook: Box<dyn BuildHook>,
    state: Mutex<BuildState>,
}

impl RebuildTrigger {
    pub fn new(hook: Box<dyn BuildHook>) -> Self {
        RebuildTrigger {
            hook,
            state: Mutex::new(BuildState::Idle),
        }
    }

    pub fn state(&self) -> BuildState {
        *self.lock_state()
    }

    pub async fn trigger(&self) -> TriggerOutcome {
        {
            let mut state = self.lock_state();
            if *state == BuildState::Building {
                info!("Rebuild already in progress, ignoring trigger");
                return TriggerOutcome::Rejected;
            }
            *state = BuildState::Building;
        }

        info!("Triggering site rebuild");
        match self.hook.fire().await {
            Ok(_) => info!("Rebuild hook accepted"),
            // never surfaced to the operator
            Err(e) => warn!("Rebuild hook failed: {}", e),
        }

        *self.lock_state() = BuildState::Idle;
        TriggerOutcome::Settled
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, BuildState> {
        match self.state.lock() {
            Ok(state) => state,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
