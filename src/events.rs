//! Gameplay Events
//!
//! Events the host loop feeds into the manager for fan-out to subscribed
//! quests.

use serde::{Deserialize, Serialize};

/// The ship a player just took the helm of
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShipHandle {
    pub identifier: String,
    pub ship_class: String,
}

impl ShipHandle {
    pub fn new(identifier: &str, ship_class: &str) -> Self {
        Self {
            identifier: identifier.to_string(),
            ship_class: ship_class.to_string(),
        }
    }
}

/// Events routed to interested quests
#[derive(Debug, Clone)]
pub enum QuestEvent {
    /// One simulation step elapsed
    Tick { delta_seconds: f32 },
    /// The player took the helm of a ship
    FlyShip { ship: ShipHandle },
}

impl QuestEvent {
    /// Get event type as string (for logging/debugging)
    pub fn event_type(&self) -> &'static str {
        match self {
            QuestEvent::Tick { .. } => "tick",
            QuestEvent::FlyShip { .. } => "fly_ship",
        }
    }
}
