use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::registry::{Location, Spot, SpotId, ROOMMATES};
use crate::store::StoreMode;

#[derive(Debug, Clone, Serialize)]
pub struct SpotView {
    pub id: SpotId,
    pub label: String,
    pub location: Location,
    pub occupant: Option<String>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub updated_at: Option<OffsetDateTime>,
}

impl From<Spot> for SpotView {
    fn from(spot: Spot) -> Self {
        Self {
            id: spot.id,
            label: spot.label,
            location: spot.location,
            occupant: spot.occupant,
            updated_at: spot.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BoardResponse {
    pub mode: StoreMode,
    pub roommates: [&'static str; 4],
    pub spots: Vec<SpotView>,
}

impl BoardResponse {
    pub fn new(mode: StoreMode, spots: Vec<Spot>) -> Self {
        Self {
            mode,
            roommates: ROOMMATES,
            spots: spots.into_iter().map(SpotView::from).collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SpotActionRequest {
    pub name: String,
}
