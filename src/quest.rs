//! Quest Runtime State
//!
//! One [`Quest`] per catalog entry, created during manager load and owned by
//! the manager for the rest of the session.

use chrono::{DateTime, Utc};
use tracing::warn;

use crate::definition::QuestDescription;
use crate::events::ShipHandle;
use crate::logic::{QuestLogic, logic_for};
use crate::save::QuestProgressSave;
use crate::status::{QuestCallback, QuestStatus};

/// A single quest's runtime state machine
pub struct Quest {
    identifier: String,
    status: QuestStatus,
    /// When the quest first became active
    started_at: Option<DateTime<Utc>>,
    logic: Box<dyn QuestLogic>,
}

impl Quest {
    /// Build a fresh quest from its catalog description
    pub fn load(description: &QuestDescription) -> Self {
        Self {
            identifier: description.identifier.clone(),
            status: QuestStatus::Available,
            started_at: None,
            logic: logic_for(&description.objective),
        }
    }

    /// Restore transient state from an in-progress save record.
    ///
    /// A record status that is missing, unrecognized, or terminal is logged
    /// and clamped to `available`.
    pub fn restore(&mut self, record: &QuestProgressSave) {
        match QuestStatus::from_str(&record.status) {
            Some(status) if status.is_transient() => self.status = status,
            Some(status) => {
                warn!(
                    "Terminal status '{}' in progress record for quest '{}', treating as available",
                    status.as_str(),
                    self.identifier
                );
                self.status = QuestStatus::Available;
            }
            None => {
                warn!(
                    "Unrecognized status '{}' in progress record for quest '{}', treating as available",
                    record.status, self.identifier
                );
                self.status = QuestStatus::Available;
            }
        }
        self.started_at = record.started_at;
        self.logic.restore(&record.payload);
    }

    /// Serialize transient state into an in-progress save record
    pub fn save(&self) -> QuestProgressSave {
        QuestProgressSave {
            quest_identifier: self.identifier.clone(),
            status: self.status.as_str().to_string(),
            started_at: self.started_at,
            payload: self.logic.save(),
        }
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn status(&self) -> QuestStatus {
        self.status
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    /// Apply a status change; terminal statuses are absorbing
    pub fn set_status(&mut self, status: QuestStatus) {
        if self.status == status {
            return;
        }
        if self.status.is_terminal() {
            warn!(
                "Ignoring status change {} -> {} on concluded quest '{}'",
                self.status.as_str(),
                status.as_str(),
                self.identifier
            );
            return;
        }
        if status == QuestStatus::Active && self.started_at.is_none() {
            self.started_at = Some(Utc::now());
        }
        self.status = status;
    }

    /// Callbacks this quest currently wants, re-read by the manager on every
    /// subscription refresh
    pub fn current_callbacks(&self) -> Vec<QuestCallback> {
        self.logic.callbacks()
    }

    pub fn on_tick(&mut self, delta_seconds: f32) {
        if let Some(status) = self.logic.on_tick(delta_seconds) {
            self.set_status(status);
        }
    }

    pub fn on_fly_ship(&mut self, ship: &ShipHandle) {
        if let Some(status) = self.logic.on_fly_ship(ship) {
            self.set_status(status);
        }
    }
}
