use axum::async_trait;
use time::OffsetDateTime;
use tokio::sync::watch;

use crate::registry::{default_board, Spot, SpotId};

use super::{BoardWatch, SpotStore, StoreError, StoreMode};

/// Fallback store used when no database is configured. The board lives
/// inside the watch channel; claim and release mutate it directly with a
/// local timestamp. Single client, so no conflict detection is attempted.
pub struct LocalSpotStore {
    board: watch::Sender<Vec<Spot>>,
}

impl LocalSpotStore {
    pub fn new() -> Self {
        let (board, _) = watch::channel(default_board());
        Self { board }
    }

    fn set_occupant(&self, spot: SpotId, occupant: Option<String>) -> Spot {
        let mut updated = None;
        self.board.send_modify(|spots| {
            // The board always carries all four spots.
            if let Some(entry) = spots.iter_mut().find(|s| s.id == spot) {
                entry.occupant = occupant.clone();
                entry.updated_at = Some(OffsetDateTime::now_utc());
                updated = Some(entry.clone());
            }
        });
        updated.expect("local board carries every blueprint spot")
    }
}

impl Default for LocalSpotStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SpotStore for LocalSpotStore {
    async fn snapshot(&self) -> anyhow::Result<Vec<Spot>> {
        Ok(self.board.borrow().clone())
    }

    async fn claim(&self, spot: SpotId, name: &str) -> Result<Spot, StoreError> {
        Ok(self.set_occupant(spot, Some(name.to_string())))
    }

    async fn release(&self, spot: SpotId, _name: &str) -> Result<Spot, StoreError> {
        Ok(self.set_occupant(spot, None))
    }

    fn watch(&self) -> BoardWatch {
        self.board.subscribe()
    }

    fn mode(&self) -> StoreMode {
        StoreMode::Local
    }
}

#[cfg(test)]
mod local_store_tests {
    use super::*;

    #[tokio::test]
    async fn claim_is_immediate_and_synchronously_observable() {
        let store = LocalSpotStore::new();
        let spot = store.claim(SpotId::Garage1, "Aswin").await.expect("claim");
        assert_eq!(spot.occupant.as_deref(), Some("Aswin"));
        assert!(spot.updated_at.is_some());

        let board = store.snapshot().await.expect("snapshot");
        assert_eq!(board[0].occupant.as_deref(), Some("Aswin"));
        assert!(board[1..].iter().all(|s| s.occupant.is_none()));
    }

    #[tokio::test]
    async fn release_clears_the_occupant() {
        let store = LocalSpotStore::new();
        store.claim(SpotId::Driveway1, "Joel").await.expect("claim");
        let spot = store
            .release(SpotId::Driveway1, "Joel")
            .await
            .expect("release");
        assert!(spot.occupant.is_none());
        assert!(spot.updated_at.is_some());
    }

    #[tokio::test]
    async fn claim_overwrites_without_conflict_detection() {
        let store = LocalSpotStore::new();
        store.claim(SpotId::Garage2, "Aswin").await.expect("claim");
        let spot = store.claim(SpotId::Garage2, "Jack").await.expect("reclaim");
        assert_eq!(spot.occupant.as_deref(), Some("Jack"));
    }

    #[tokio::test]
    async fn watch_delivers_full_snapshots() {
        let store = LocalSpotStore::new();
        let mut rx = store.watch();
        assert!(rx.borrow().iter().all(|s| s.occupant.is_none()));

        store.claim(SpotId::Driveway2, "Nishant").await.expect("claim");
        rx.changed().await.expect("board update");
        let board = rx.borrow_and_update().clone();
        assert_eq!(board.len(), 4);
        assert_eq!(board[3].occupant.as_deref(), Some("Nishant"));
    }
}
