//! Error taxonomy
//!
//! Nothing in the simulation is fatal. Spawn failures degrade bullet density,
//! unbound collaborators turn operations into no-ops, and bad numeric
//! parameters are clamped where they enter (see `Settings::sanitized`).

use crate::sim::ProjectileHandle;

/// Recoverable simulation errors
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimError {
    /// Spawn requested with every slot live and the pool at capacity
    #[error("projectile pool exhausted (capacity {capacity})")]
    PoolExhausted { capacity: usize },

    /// Component operated before a spawner was bound to it
    #[error("{component}: no spawner bound")]
    UnboundCollaborator { component: &'static str },

    /// Handle refers to a slot that has since been recycled or never existed
    #[error("stale projectile handle {0}")]
    StaleHandle(ProjectileHandle),
}

/// Settings load/save errors
#[derive(thiserror::Error, Debug)]
pub enum SettingsError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parse or serialize error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
