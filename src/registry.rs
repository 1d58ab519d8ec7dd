use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Names shown as a hint next to the identity dialog. Occupancy is not
/// validated against this list; any self-asserted name may be written.
pub const ROOMMATES: [&str; 4] = ["Aswin", "Jack", "Joel", "Nishant"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpotId {
    #[serde(rename = "garage-1")]
    Garage1,
    #[serde(rename = "garage-2")]
    Garage2,
    #[serde(rename = "driveway-1")]
    Driveway1,
    #[serde(rename = "driveway-2")]
    Driveway2,
}

impl SpotId {
    pub const ALL: [SpotId; 4] = [
        SpotId::Garage1,
        SpotId::Garage2,
        SpotId::Driveway1,
        SpotId::Driveway2,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SpotId::Garage1 => "garage-1",
            SpotId::Garage2 => "garage-2",
            SpotId::Driveway1 => "driveway-1",
            SpotId::Driveway2 => "driveway-2",
        }
    }

    /// Position in blueprint order, usable as an array index.
    pub fn index(self) -> usize {
        match self {
            SpotId::Garage1 => 0,
            SpotId::Garage2 => 1,
            SpotId::Driveway1 => 2,
            SpotId::Driveway2 => 3,
        }
    }
}

impl fmt::Display for SpotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SpotId {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "garage-1" => Ok(SpotId::Garage1),
            "garage-2" => Ok(SpotId::Garage2),
            "driveway-1" => Ok(SpotId::Driveway1),
            "driveway-2" => Ok(SpotId::Driveway2),
            other => anyhow::bail!("unknown spot id: {other}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Location {
    Garage,
    Driveway,
}

impl Location {
    pub fn as_str(self) -> &'static str {
        match self {
            Location::Garage => "Garage",
            Location::Driveway => "Driveway",
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Location {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Garage" => Ok(Location::Garage),
            "Driveway" => Ok(Location::Driveway),
            other => anyhow::bail!("unknown location: {other}"),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SpotBlueprint {
    pub id: SpotId,
    pub label: &'static str,
    pub location: Location,
}

/// The fixed, ordered spot set. Snapshots are always rebuilt in this order.
pub const SPOT_BLUEPRINT: [SpotBlueprint; 4] = [
    SpotBlueprint {
        id: SpotId::Garage1,
        label: "Garage 1",
        location: Location::Garage,
    },
    SpotBlueprint {
        id: SpotId::Garage2,
        label: "Garage 2",
        location: Location::Garage,
    },
    SpotBlueprint {
        id: SpotId::Driveway1,
        label: "Driveway 1",
        location: Location::Driveway,
    },
    SpotBlueprint {
        id: SpotId::Driveway2,
        label: "Driveway 2",
        location: Location::Driveway,
    },
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Spot {
    pub id: SpotId,
    pub label: String,
    pub location: Location,
    pub occupant: Option<String>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub updated_at: Option<OffsetDateTime>,
}

impl Spot {
    pub fn vacant(blueprint: &SpotBlueprint) -> Self {
        Self {
            id: blueprint.id,
            label: blueprint.label.to_string(),
            location: blueprint.location,
            occupant: None,
            updated_at: None,
        }
    }
}

/// A vacant board in blueprint order.
pub fn default_board() -> Vec<Spot> {
    SPOT_BLUEPRINT.iter().map(Spot::vacant).collect()
}
