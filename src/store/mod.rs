pub mod local;
pub mod postgres;

use axum::async_trait;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::watch;

use crate::registry::{Spot, SpotId, SPOT_BLUEPRINT};

pub use local::LocalSpotStore;
pub use postgres::PgSpotStore;

/// Live full-board subscription. Dropping the receiver is the disposer; the
/// channel closes when the publishing side stops.
pub type BoardWatch = watch::Receiver<Vec<Spot>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreMode {
    Remote,
    Local,
}

#[derive(Debug, Error)]
pub enum StoreError {
    /// Claim rejected: someone else holds the spot.
    #[error("Spot already taken by {occupant}")]
    AlreadyTaken { occupant: String },
    /// Release rejected: the spot changed hands underneath us.
    #[error("Spot is now taken by {occupant}")]
    TakenSince { occupant: String },
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

impl StoreError {
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            StoreError::AlreadyTaken { .. } | StoreError::TakenSince { .. }
        )
    }
}

/// The board capability. One implementation is selected at startup:
/// [`PgSpotStore`] when a database is configured, [`LocalSpotStore`] otherwise.
#[async_trait]
pub trait SpotStore: Send + Sync {
    /// Current board in blueprint order.
    async fn snapshot(&self) -> anyhow::Result<Vec<Spot>>;

    /// Set `name` as the spot's occupant. Idempotent for the current
    /// occupant; conflicts with anyone else.
    async fn claim(&self, spot: SpotId, name: &str) -> Result<Spot, StoreError>;

    /// Clear the spot if held by `name` (or nobody).
    async fn release(&self, spot: SpotId, name: &str) -> Result<Spot, StoreError>;

    fn watch(&self) -> BoardWatch;

    fn mode(&self) -> StoreMode;
}

/// Read-verify step of a claim: occupied by someone else aborts.
pub(crate) fn verify_claim(current: Option<&str>, name: &str) -> Result<(), StoreError> {
    match current {
        Some(occupant) if occupant != name => Err(StoreError::AlreadyTaken {
            occupant: occupant.to_string(),
        }),
        _ => Ok(()),
    }
}

/// Read-verify step of a release: a spot taken by someone else since our
/// last look must not be clobbered.
pub(crate) fn verify_release(current: Option<&str>, name: &str) -> Result<(), StoreError> {
    match current {
        Some(occupant) if occupant != name => Err(StoreError::TakenSince {
            occupant: occupant.to_string(),
        }),
        _ => Ok(()),
    }
}

/// Rebuild a full snapshot in blueprint order; spots without a stored row
/// default to vacant.
pub(crate) fn reconcile(rows: Vec<Spot>) -> Vec<Spot> {
    SPOT_BLUEPRINT
        .iter()
        .map(|blueprint| {
            rows.iter()
                .find(|row| row.id == blueprint.id)
                .cloned()
                .unwrap_or_else(|| Spot::vacant(blueprint))
        })
        .collect()
}
