//! Quest Status & Callback Interests
//!
//! The five-state lifecycle and the event interests a quest can declare.

use serde::{Deserialize, Serialize};

/// Lifecycle status of a quest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestStatus {
    /// Quest can be taken up but has not made progress yet
    Available,
    /// Quest is underway
    Active,
    /// Quest concluded with success
    Successful,
    /// Quest was abandoned by the player
    Abandoned,
    /// Quest concluded with failure
    Failed,
}

impl QuestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestStatus::Available => "available",
            QuestStatus::Active => "active",
            QuestStatus::Successful => "successful",
            QuestStatus::Abandoned => "abandoned",
            QuestStatus::Failed => "failed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "available" => Some(QuestStatus::Available),
            "active" => Some(QuestStatus::Active),
            "successful" => Some(QuestStatus::Successful),
            "abandoned" => Some(QuestStatus::Abandoned),
            "failed" => Some(QuestStatus::Failed),
            _ => None,
        }
    }

    /// Available or Active: the quest is still in play
    pub fn is_transient(&self) -> bool {
        matches!(self, QuestStatus::Available | QuestStatus::Active)
    }

    /// Successful, Abandoned or Failed: no further transitions
    pub fn is_terminal(&self) -> bool {
        !self.is_transient()
    }
}

/// Engine events a quest can subscribe to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestCallback {
    /// Once per simulation step, with the elapsed time
    Tick,
    /// The player took the helm of a ship
    FlyShip,
}

impl QuestCallback {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestCallback::Tick => "tick",
            QuestCallback::FlyShip => "fly_ship",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "tick" => Some(QuestCallback::Tick),
            "fly_ship" => Some(QuestCallback::FlyShip),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_string_round_trip() {
        for status in [
            QuestStatus::Available,
            QuestStatus::Active,
            QuestStatus::Successful,
            QuestStatus::Abandoned,
            QuestStatus::Failed,
        ] {
            assert_eq!(QuestStatus::from_str(status.as_str()), Some(status));
        }
        assert_eq!(QuestStatus::from_str("completed"), None);
    }

    #[test]
    fn test_transient_terminal_split() {
        assert!(QuestStatus::Available.is_transient());
        assert!(QuestStatus::Active.is_transient());
        assert!(QuestStatus::Successful.is_terminal());
        assert!(QuestStatus::Abandoned.is_terminal());
        assert!(QuestStatus::Failed.is_terminal());
    }

    #[test]
    fn test_callback_string_round_trip() {
        assert_eq!(QuestCallback::from_str("tick"), Some(QuestCallback::Tick));
        assert_eq!(QuestCallback::from_str("fly_ship"), Some(QuestCallback::FlyShip));
        assert_eq!(QuestCallback::from_str("dock"), None);
    }
}
