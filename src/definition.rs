//! Quest Definition Structures
//!
//! These structures are deserialized from TOML catalog files.

use serde::Deserialize;

/// A quest definition loaded from TOML
#[derive(Debug, Clone, Deserialize)]
pub struct RawQuestFile {
    pub quest: RawQuest,
}

/// Raw quest data as it appears in TOML
#[derive(Debug, Clone, Deserialize)]
pub struct RawQuest {
    pub identifier: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub objective: RawObjective,
    #[serde(default)]
    pub reward: Option<RawReward>,
}

/// Raw objective as it appears in TOML
#[derive(Debug, Clone, Deserialize)]
pub struct RawObjective {
    #[serde(rename = "type")]
    pub objective_type: String,
    /// Flight time to accumulate (flight_time)
    #[serde(default)]
    pub target_seconds: Option<f32>,
    /// Optional failure deadline (flight_time)
    #[serde(default)]
    pub fail_after_seconds: Option<f32>,
    /// Required ship class (fly_ship); any ship if omitted
    #[serde(default)]
    pub ship_class: Option<String>,
    /// Time to stay at the helm after taking off (training_flight)
    #[serde(default)]
    pub flight_seconds: Option<f32>,
}

/// Raw reward as it appears in TOML
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawReward {
    #[serde(default)]
    pub money: i64,
}

// ============================================================================
// Resolved Structures (after parsing)
// ============================================================================

/// Objective kinds supported by the campaign
#[derive(Debug, Clone, PartialEq)]
pub enum ObjectiveSpec {
    /// Accumulate piloted flight time, with an optional failure deadline
    FlightTime {
        target_seconds: f32,
        fail_after_seconds: Option<f32>,
    },
    /// Take the helm of a ship, optionally of a specific class
    FlyShip { ship_class: Option<String> },
    /// Take the helm of a ship, then keep flying for a duration
    TrainingFlight { flight_seconds: f32 },
}

impl ObjectiveSpec {
    pub fn from_raw(raw: &RawObjective) -> Option<Self> {
        match raw.objective_type.to_lowercase().as_str() {
            "flight_time" | "flight" => Some(ObjectiveSpec::FlightTime {
                target_seconds: raw.target_seconds.unwrap_or(60.0),
                fail_after_seconds: raw.fail_after_seconds,
            }),
            "fly_ship" | "fly" => Some(ObjectiveSpec::FlyShip {
                ship_class: raw.ship_class.clone(),
            }),
            "training_flight" | "training" => Some(ObjectiveSpec::TrainingFlight {
                flight_seconds: raw.flight_seconds.unwrap_or(30.0),
            }),
            _ => None,
        }
    }
}

/// Quest reward, granted by the host when it observes a success
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Reward {
    pub money: i64,
}

impl Reward {
    pub fn from_raw(raw: &RawReward) -> Self {
        Self { money: raw.money }
    }
}

/// A fully resolved quest definition
#[derive(Debug, Clone)]
pub struct QuestDescription {
    pub identifier: String,
    pub name: String,
    pub description: String,
    pub objective: ObjectiveSpec,
    pub reward: Reward,
}

impl QuestDescription {
    /// Create a description from raw TOML data
    pub fn from_raw(raw: &RawQuest) -> Result<Self, String> {
        let objective = ObjectiveSpec::from_raw(&raw.objective).ok_or_else(|| {
            format!(
                "Unknown objective type '{}' for quest '{}'",
                raw.objective.objective_type, raw.identifier
            )
        })?;

        Ok(Self {
            identifier: raw.identifier.clone(),
            name: raw.name.clone(),
            description: raw.description.clone(),
            objective,
            reward: raw
                .reward
                .as_ref()
                .map(Reward::from_raw)
                .unwrap_or_default(),
        })
    }
}
