use anyhow::Context;
use axum::async_trait;
use sqlx::postgres::{PgListener, PgPoolOptions};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use crate::registry::{Spot, SpotId, SPOT_BLUEPRINT};

use super::{reconcile, verify_claim, verify_release, BoardWatch, SpotStore, StoreError, StoreMode};

const NOTIFY_CHANNEL: &str = "parking_spots_changed";

#[derive(Debug, FromRow)]
struct SpotRow {
    id: String,
    label: String,
    location: String,
    occupant: Option<String>,
    updated_at: Option<OffsetDateTime>,
}

impl SpotRow {
    fn into_spot(self) -> anyhow::Result<Spot> {
        Ok(Spot {
            id: self.id.parse()?,
            location: self.location.parse()?,
            label: self.label,
            occupant: self.occupant,
            updated_at: self.updated_at,
        })
    }
}

/// Remote board backed by Postgres. Writes are optimistic compare-and-swap
/// statements; a trigger on the table feeds `LISTEN/NOTIFY` into a background
/// task that republishes the full snapshot through a watch channel.
pub struct PgSpotStore {
    db: PgPool,
    board: BoardWatch,
    // One in-flight claim/release per spot from this process. Remote actors
    // can still race the same spot; the CAS settles it.
    gates: [Mutex<()>; 4],
    listener: JoinHandle<()>,
}

impl PgSpotStore {
    pub async fn connect(database_url: &str) -> anyhow::Result<Self> {
        let db = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await
            .context("connect to database")?;

        if let Err(e) = sqlx::migrate!("./migrations").run(&db).await {
            warn!(error = %e, "migrations folder not found or migration failed; continuing");
        }

        seed_spots(&db).await.context("seed parking spots")?;

        let mut listener = PgListener::connect_with(&db)
            .await
            .context("open notify listener")?;
        listener
            .listen(NOTIFY_CHANNEL)
            .await
            .context("listen for board changes")?;

        let initial = load_board(&db).await.context("load initial board")?;
        let (tx, board) = watch::channel(initial);

        let listener = tokio::spawn(publish_updates(listener, db.clone(), tx));

        Ok(Self {
            db,
            board,
            gates: std::array::from_fn(|_| Mutex::new(())),
            listener,
        })
    }
}

impl Drop for PgSpotStore {
    fn drop(&mut self) {
        self.listener.abort();
    }
}

#[async_trait]
impl SpotStore for PgSpotStore {
    async fn snapshot(&self) -> anyhow::Result<Vec<Spot>> {
        load_board(&self.db).await
    }

    async fn claim(&self, spot: SpotId, name: &str) -> Result<Spot, StoreError> {
        let _gate = self.gates[spot.index()].lock().await;
        loop {
            let swapped = sqlx::query_as::<_, SpotRow>(
                r#"
                UPDATE parking_spots
                   SET occupant = $2, updated_at = now()
                 WHERE id = $1 AND (occupant IS NULL OR occupant = $2)
                RETURNING id, label, location, occupant, updated_at
                "#,
            )
            .bind(spot.as_str())
            .bind(name)
            .fetch_optional(&self.db)
            .await
            .context("claim spot")?;

            if let Some(row) = swapped {
                debug!(spot = %spot, occupant = %name, "spot claimed");
                return Ok(row.into_spot()?);
            }

            let current = current_occupant(&self.db, spot).await?;
            verify_claim(current.as_deref(), name)?;
            // The conflicting occupant vanished between the swap and the
            // re-read; take another optimistic pass.
        }
    }

    async fn release(&self, spot: SpotId, name: &str) -> Result<Spot, StoreError> {
        let _gate = self.gates[spot.index()].lock().await;
        loop {
            let swapped = sqlx::query_as::<_, SpotRow>(
                r#"
                UPDATE parking_spots
                   SET occupant = NULL, updated_at = now()
                 WHERE id = $1 AND (occupant IS NULL OR occupant = $2)
                RETURNING id, label, location, occupant, updated_at
                "#,
            )
            .bind(spot.as_str())
            .bind(name)
            .fetch_optional(&self.db)
            .await
            .context("release spot")?;

            if let Some(row) = swapped {
                debug!(spot = %spot, occupant = %name, "spot released");
                return Ok(row.into_spot()?);
            }

            let current = current_occupant(&self.db, spot).await?;
            verify_release(current.as_deref(), name)?;
        }
    }

    fn watch(&self) -> BoardWatch {
        self.board.clone()
    }

    fn mode(&self) -> StoreMode {
        StoreMode::Remote
    }
}

/// Create-if-absent for every blueprint spot. Concurrent activations racing
/// this step are fine: creation is conditional on the primary key.
async fn seed_spots(db: &PgPool) -> anyhow::Result<()> {
    for blueprint in &SPOT_BLUEPRINT {
        sqlx::query(
            r#"
            INSERT INTO parking_spots (id, label, location, occupant, updated_at)
            VALUES ($1, $2, $3, NULL, now())
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(blueprint.id.as_str())
        .bind(blueprint.label)
        .bind(blueprint.location.as_str())
        .execute(db)
        .await
        .with_context(|| format!("ensure spot {}", blueprint.id))?;
    }
    Ok(())
}

async fn current_occupant(db: &PgPool, spot: SpotId) -> anyhow::Result<Option<String>> {
    let row: Option<(Option<String>,)> =
        sqlx::query_as(r#"SELECT occupant FROM parking_spots WHERE id = $1"#)
            .bind(spot.as_str())
            .fetch_optional(db)
            .await
            .context("read current occupant")?;
    row.map(|(occupant,)| occupant)
        .ok_or_else(|| anyhow::anyhow!("spot {spot} missing from store"))
}

async fn load_board(db: &PgPool) -> anyhow::Result<Vec<Spot>> {
    let rows = sqlx::query_as::<_, SpotRow>(
        r#"SELECT id, label, location, occupant, updated_at FROM parking_spots"#,
    )
    .fetch_all(db)
    .await
    .context("load parking spots")?;

    let mut spots = Vec::with_capacity(rows.len());
    for row in rows {
        match row.into_spot() {
            Ok(spot) => spots.push(spot),
            Err(e) => warn!(error = %e, "skipping unrecognized parking spot row"),
        }
    }
    Ok(reconcile(spots))
}

/// Republish the full board on every table notification. The sender lives
/// here, so when this task stops the channel closes and every subscriber
/// observes the end of the session. A failed reload is terminal too;
/// subscribers must never sit on a stale snapshot without noticing.
async fn publish_updates(
    mut listener: PgListener,
    db: PgPool,
    board: watch::Sender<Vec<Spot>>,
) {
    loop {
        match listener.recv().await {
            Ok(notification) => {
                debug!(spot = notification.payload(), "board change notification");
                match load_board(&db).await {
                    Ok(snapshot) => {
                        board.send_replace(snapshot);
                    }
                    Err(e) => {
                        error!(error = %e, "failed to reload board after notification");
                        break;
                    }
                }
            }
            Err(e) => {
                error!(error = %e, "realtime updates are unavailable");
                break;
            }
        }
    }
}
