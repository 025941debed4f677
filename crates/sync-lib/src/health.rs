//! Health check infrastructure for the sync host
//!
//! Tracks component health and derives readiness from the sync session's
//! lifecycle state.

use crate::session::SessionState;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Health status of a component
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

/// Information about a component's health
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentHealth {
    pub status: ComponentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub last_check_timestamp: i64,
}

impl ComponentHealth {
    fn with_status(status: ComponentStatus, message: Option<String>) -> Self {
        Self {
            status,
            message,
            last_check_timestamp: chrono::Utc::now().timestamp(),
        }
    }

    pub fn healthy() -> Self {
        Self::with_status(ComponentStatus::Healthy, None)
    }

    pub fn degraded(message: impl Into<String>) -> Self {
        Self::with_status(ComponentStatus::Degraded, Some(message.into()))
    }

    pub fn unhealthy(message: impl Into<String>) -> Self {
        Self::with_status(ComponentStatus::Unhealthy, Some(message.into()))
    }
}

/// Overall health response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: ComponentStatus,
    pub components: HashMap<String, ComponentHealth>,
}

impl HealthResponse {
    /// Worst status among the components wins
    pub fn compute_status(components: &HashMap<String, ComponentHealth>) -> ComponentStatus {
        let mut has_degraded = false;

        for health in components.values() {
            match health.status {
                ComponentStatus::Unhealthy => return ComponentStatus::Unhealthy,
                ComponentStatus::Degraded => has_degraded = true,
                ComponentStatus::Healthy => {}
            }
        }

        if has_degraded {
            ComponentStatus::Degraded
        } else {
            ComponentStatus::Healthy
        }
    }
}

/// Readiness response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadinessResponse {
    pub ready: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Component names for health tracking
pub mod components {
    pub const SESSION: &str = "session";
    pub const FETCH_SCHEDULER: &str = "fetch_scheduler";
    pub const TRANSPORT: &str = "transport";
}

/// Health registry for tracking component health
#[derive(Debug, Clone, Default)]
pub struct HealthRegistry {
    components: Arc<RwLock<HashMap<String, ComponentHealth>>>,
    session_state: Arc<RwLock<Option<SessionState>>>,
}

impl HealthRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a component with initial healthy status
    pub async fn register(&self, name: &str) {
        self.update(name, ComponentHealth::healthy()).await;
    }

    pub async fn update(&self, name: &str, health: ComponentHealth) {
        let mut components = self.components.write().await;
        components.insert(name.to_string(), health);
    }

    pub async fn set_degraded(&self, name: &str, message: impl Into<String>) {
        self.update(name, ComponentHealth::degraded(message)).await;
    }

    pub async fn set_unhealthy(&self, name: &str, message: impl Into<String>) {
        self.update(name, ComponentHealth::unhealthy(message)).await;
    }

    /// Record the session's lifecycle state and the health it implies
    pub async fn record_session_state(&self, state: SessionState) {
        let health = match state {
            SessionState::Stopped => ComponentHealth::unhealthy("Sync session stopped"),
            SessionState::Disabled => ComponentHealth::degraded("Sync disabled by configuration"),
            _ => ComponentHealth::healthy(),
        };
        self.update(components::SESSION, health).await;

        if state == SessionState::SteadyState {
            self.update(components::FETCH_SCHEDULER, ComponentHealth::healthy())
                .await;
        }

        *self.session_state.write().await = Some(state);
    }

    pub async fn health(&self) -> HealthResponse {
        let components = self.components.read().await.clone();
        let status = HealthResponse::compute_status(&components);
        HealthResponse { status, components }
    }

    /// Ready once the session is in steady state, or idle because sync is disabled
    pub async fn readiness(&self) -> ReadinessResponse {
        let state = *self.session_state.read().await;
        let health = self.health().await;

        let reason = match state {
            None | Some(SessionState::Uninitialized) => Some("Sync session not yet initialized"),
            Some(SessionState::AwaitingHandshake) => Some("Awaiting sync handshake"),
            Some(SessionState::Stopped) => Some("Sync session stopped"),
            Some(SessionState::SteadyState) | Some(SessionState::Disabled) => {
                if health.status == ComponentStatus::Unhealthy {
                    Some("Critical component unhealthy")
                } else {
                    None
                }
            }
        };

        ReadinessResponse {
            ready: reason.is_none(),
            reason: reason.map(str::to_string),
        }
    }
}
