//! Quest Lifecycle Manager
//!
//! Owns every quest for the session, reconstructs them from the catalog and
//! a save snapshot, re-derives the snapshot from current state, and fans
//! gameplay events out to the quests that declared interest in them.

use std::collections::HashMap;

use tracing::{debug, info, warn};

use crate::catalog::QuestCatalog;
use crate::events::{QuestEvent, ShipHandle};
use crate::quest::Quest;
use crate::save::{CampaignSave, QuestProgressSave};
use crate::status::{QuestCallback, QuestStatus};

/// Lifecycle and event-dispatch manager for all campaign quests.
///
/// Quests live in a single owning arena in catalog order; membership sets,
/// selection, and subscriber lists hold indices into it. All lists are
/// insertion-ordered and duplicate-free, so dispatch order is total and
/// deterministic within one call.
pub struct QuestManager {
    quests: Vec<Quest>,
    by_identifier: HashMap<String, usize>,
    /// Quests still in play (available or active)
    current: Vec<usize>,
    /// Concluded quests
    old: Vec<usize>,
    /// Player-selected quest; always a member of `current`
    selected: Option<usize>,
    tick_subscribers: Vec<usize>,
    fly_ship_subscribers: Vec<usize>,
    /// Retained snapshot, rewritten by `save`
    save_data: CampaignSave,
}

impl QuestManager {
    /// Reconstruct full manager state from the catalog and a save snapshot.
    ///
    /// Every catalog entry yields exactly one quest, placed in exactly one of
    /// the current/old membership sets. Snapshot entries that reference no
    /// catalog quest are ignored.
    pub fn load(catalog: &QuestCatalog, data: &CampaignSave) -> Self {
        let mut progress_records: HashMap<&str, &QuestProgressSave> = HashMap::new();
        for record in &data.quest_progresses {
            progress_records.insert(record.quest_identifier.as_str(), record);
        }

        let mut manager = Self {
            quests: Vec::with_capacity(catalog.len()),
            by_identifier: HashMap::with_capacity(catalog.len()),
            current: Vec::new(),
            old: Vec::new(),
            selected: None,
            tick_subscribers: Vec::new(),
            fly_ship_subscribers: Vec::new(),
            save_data: data.clone(),
        };

        for description in catalog.iter() {
            let mut quest = Quest::load(description);
            let idx = manager.quests.len();

            if let Some(record) = progress_records.get(description.identifier.as_str()) {
                quest.restore(record);
                manager.current.push(idx);
                if data.selected_quest.as_deref() == Some(description.identifier.as_str()) {
                    manager.selected = Some(idx);
                }
            } else if data.successful_quests.contains(&description.identifier) {
                quest.set_status(QuestStatus::Successful);
                manager.old.push(idx);
            } else if data.abandoned_quests.contains(&description.identifier) {
                quest.set_status(QuestStatus::Abandoned);
                manager.old.push(idx);
            } else if data.failed_quests.contains(&description.identifier) {
                quest.set_status(QuestStatus::Failed);
                manager.old.push(idx);
            } else {
                // Freshly discoverable quest, no prior record
                manager.current.push(idx);
            }

            manager.by_identifier.insert(quest.identifier().to_string(), idx);
            manager.quests.push(quest);
            manager.refresh_callbacks(idx);
        }

        info!(
            "Loaded {} quests: {} in play, {} concluded",
            manager.quests.len(),
            manager.current.len(),
            manager.old.len()
        );
        manager
    }

    /// Re-derive the save snapshot from current state.
    ///
    /// Feeding the result straight back into [`QuestManager::load`]
    /// reconstructs equivalent state. A concluded quest whose status is not
    /// terminal is logged and excluded from every bucket.
    pub fn save(&mut self) -> &CampaignSave {
        self.save_data.quest_progresses.clear();
        self.save_data.successful_quests.clear();
        self.save_data.abandoned_quests.clear();
        self.save_data.failed_quests.clear();

        self.save_data.selected_quest = self
            .selected
            .map(|idx| self.quests[idx].identifier().to_string());

        for &idx in &self.current {
            self.save_data.quest_progresses.push(self.quests[idx].save());
        }

        for &idx in &self.old {
            let quest = &self.quests[idx];
            match quest.status() {
                QuestStatus::Successful => self
                    .save_data
                    .successful_quests
                    .push(quest.identifier().to_string()),
                QuestStatus::Abandoned => self
                    .save_data
                    .abandoned_quests
                    .push(quest.identifier().to_string()),
                QuestStatus::Failed => self
                    .save_data
                    .failed_quests
                    .push(quest.identifier().to_string()),
                status => warn!(
                    "Bad status '{}' for concluded quest '{}'",
                    status.as_str(),
                    quest.identifier()
                ),
            }
        }

        &self.save_data
    }

    // ========================================================================
    // Callback subscriptions
    // ========================================================================

    /// Rebuild one quest's subscriptions from its currently-declared
    /// interests. Idempotent: removes first, then re-adds.
    pub fn refresh_subscriptions(&mut self, identifier: &str) -> bool {
        match self.by_identifier.get(identifier).copied() {
            Some(idx) => {
                self.refresh_callbacks(idx);
                true
            }
            None => {
                debug!("Cannot refresh subscriptions for unknown quest '{}'", identifier);
                false
            }
        }
    }

    /// Remove one quest from every subscriber list
    pub fn clear_subscriptions(&mut self, identifier: &str) -> bool {
        match self.by_identifier.get(identifier).copied() {
            Some(idx) => {
                self.clear_callbacks(idx);
                true
            }
            None => {
                debug!("Cannot clear subscriptions for unknown quest '{}'", identifier);
                false
            }
        }
    }

    fn refresh_callbacks(&mut self, idx: usize) {
        self.clear_callbacks(idx);

        for callback in self.quests[idx].current_callbacks() {
            match callback {
                QuestCallback::Tick => {
                    if !self.tick_subscribers.contains(&idx) {
                        self.tick_subscribers.push(idx);
                    }
                }
                QuestCallback::FlyShip => {
                    if !self.fly_ship_subscribers.contains(&idx) {
                        self.fly_ship_subscribers.push(idx);
                    }
                }
            }
        }
    }

    fn clear_callbacks(&mut self, idx: usize) {
        self.tick_subscribers.retain(|&i| i != idx);
        self.fly_ship_subscribers.retain(|&i| i != idx);
    }

    /// Whether a quest is currently subscribed to a callback
    pub fn is_subscribed(&self, identifier: &str, callback: QuestCallback) -> bool {
        let Some(idx) = self.by_identifier.get(identifier).copied() else {
            return false;
        };
        match callback {
            QuestCallback::Tick => self.tick_subscribers.contains(&idx),
            QuestCallback::FlyShip => self.fly_ship_subscribers.contains(&idx),
        }
    }

    // ========================================================================
    // Event dispatch
    // ========================================================================

    /// Route an event to every subscribed quest
    pub fn dispatch(&mut self, event: &QuestEvent) {
        match event {
            QuestEvent::Tick { delta_seconds } => self.on_tick(*delta_seconds),
            QuestEvent::FlyShip { ship } => self.on_fly_ship(ship),
        }
    }

    /// Fan a tick out to the tick subscribers, in list order.
    ///
    /// Handlers may change their own quest's status and progress; membership
    /// and subscriber lists stay untouched until `refresh_placements`.
    pub fn on_tick(&mut self, delta_seconds: f32) {
        for i in 0..self.tick_subscribers.len() {
            let idx = self.tick_subscribers[i];
            self.quests[idx].on_tick(delta_seconds);
        }
    }

    /// Fan a "player flew a ship" event out to the fly-ship subscribers
    pub fn on_fly_ship(&mut self, ship: &ShipHandle) {
        for i in 0..self.fly_ship_subscribers.len() {
            let idx = self.fly_ship_subscribers[i];
            self.quests[idx].on_fly_ship(ship);
        }
    }

    /// Bring membership, selection, and subscriptions back in line with quest
    /// statuses after dispatch.
    ///
    /// Concluded quests move to the old set, lose their subscriptions, and
    /// are deselected; every remaining quest's interests are re-read. Hosts
    /// call this once per frame after dispatching events.
    pub fn refresh_placements(&mut self) {
        let quests = &self.quests;
        let mut concluded = Vec::new();
        self.current.retain(|&idx| {
            if quests[idx].status().is_terminal() {
                concluded.push(idx);
                false
            } else {
                true
            }
        });

        for idx in concluded {
            if self.selected == Some(idx) {
                self.selected = None;
            }
            self.clear_callbacks(idx);
            self.old.push(idx);
            info!(
                "Quest '{}' concluded as {}",
                self.quests[idx].identifier(),
                self.quests[idx].status().as_str()
            );
        }

        for i in 0..self.current.len() {
            let idx = self.current[i];
            self.refresh_callbacks(idx);
        }
    }

    // ========================================================================
    // Selection & abandonment
    // ========================================================================

    /// Select a quest still in play. Selecting a concluded or unknown quest
    /// fails.
    pub fn select_quest(&mut self, identifier: &str) -> bool {
        match self.by_identifier.get(identifier).copied() {
            Some(idx) if self.current.contains(&idx) => {
                self.selected = Some(idx);
                true
            }
            Some(_) => {
                debug!("Cannot select concluded quest '{}'", identifier);
                false
            }
            None => {
                debug!("Cannot select unknown quest '{}'", identifier);
                false
            }
        }
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    pub fn selected_quest(&self) -> Option<&Quest> {
        self.selected.map(|idx| &self.quests[idx])
    }

    /// Abandon a quest still in play and retire it immediately, so a save
    /// taken right afterwards is consistent.
    pub fn abandon_quest(&mut self, identifier: &str) -> bool {
        let Some(idx) = self.by_identifier.get(identifier).copied() else {
            debug!("Cannot abandon unknown quest '{}'", identifier);
            return false;
        };
        if self.quests[idx].status().is_terminal() {
            debug!("Cannot abandon concluded quest '{}'", identifier);
            return false;
        }

        self.quests[idx].set_status(QuestStatus::Abandoned);
        self.refresh_placements();
        true
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Get a quest by identifier
    pub fn quest(&self, identifier: &str) -> Option<&Quest> {
        self.by_identifier
            .get(identifier)
            .map(|&idx| &self.quests[idx])
    }

    /// Quests still in play, in stable order
    pub fn current_quests(&self) -> impl Iterator<Item = &Quest> {
        self.current.iter().map(|&idx| &self.quests[idx])
    }

    /// Concluded quests, in conclusion order
    pub fn old_quests(&self) -> impl Iterator<Item = &Quest> {
        self.old.iter().map(|&idx| &self.quests[idx])
    }

    pub fn quest_count(&self) -> usize {
        self.quests.len()
    }

    pub fn is_quest_current(&self, identifier: &str) -> bool {
        self.quest(identifier)
            .map(|q| q.status().is_transient())
            .unwrap_or(false)
    }

    pub fn is_quest_successful(&self, identifier: &str) -> bool {
        self.quest(identifier)
            .map(|q| q.status() == QuestStatus::Successful)
            .unwrap_or(false)
    }

    pub fn is_quest_abandoned(&self, identifier: &str) -> bool {
        self.quest(identifier)
            .map(|q| q.status() == QuestStatus::Abandoned)
            .unwrap_or(false)
    }

    pub fn is_quest_failed(&self, identifier: &str) -> bool {
        self.quest(identifier)
            .map(|q| q.status() == QuestStatus::Failed)
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::{ObjectiveSpec, QuestDescription};
    use serde_json::json;

    fn description(identifier: &str, objective: ObjectiveSpec) -> QuestDescription {
        QuestDescription {
            identifier: identifier.to_string(),
            name: identifier.to_string(),
            description: String::new(),
            objective,
            reward: Default::default(),
        }
    }

    /// q1 accumulates flight time, q2 wants any ship flown, q3 is the
    /// two-phase training flight
    fn test_catalog() -> QuestCatalog {
        QuestCatalog::from_descriptions(vec![
            description(
                "q1",
                ObjectiveSpec::FlightTime {
                    target_seconds: 10.0,
                    fail_after_seconds: None,
                },
            ),
            description("q2", ObjectiveSpec::FlyShip { ship_class: None }),
            description(
                "q3",
                ObjectiveSpec::TrainingFlight { flight_seconds: 5.0 },
            ),
        ])
    }

    fn ship() -> ShipHandle {
        ShipHandle::new("ghoul-7", "light-fighter")
    }

    fn identifiers<'a>(quests: impl Iterator<Item = &'a Quest>) -> Vec<&'a str> {
        quests.map(|q| q.identifier()).collect()
    }

    #[test]
    fn test_fresh_load_partitions_catalog() {
        let manager = QuestManager::load(&test_catalog(), &CampaignSave::default());

        assert_eq!(manager.quest_count(), 3);
        assert_eq!(identifiers(manager.current_quests()), vec!["q1", "q2", "q3"]);
        assert_eq!(manager.old_quests().count(), 0);
        assert!(manager.selected_quest().is_none());
        for quest in manager.current_quests() {
            assert_eq!(quest.status(), QuestStatus::Available);
        }
    }

    #[test]
    fn test_load_restores_snapshot() {
        let data = CampaignSave {
            quest_progresses: vec![QuestProgressSave {
                quest_identifier: "q1".to_string(),
                status: "active".to_string(),
                started_at: None,
                payload: json!({ "elapsed_seconds": 4.0 }),
            }],
            successful_quests: vec!["q2".to_string()],
            abandoned_quests: vec![],
            failed_quests: vec![],
            selected_quest: Some("q1".to_string()),
        };

        let mut manager = QuestManager::load(&test_catalog(), &data);

        // q1 and q3 in play, q2 concluded; every catalog entry in exactly one set
        assert_eq!(identifiers(manager.current_quests()), vec!["q1", "q3"]);
        assert_eq!(identifiers(manager.old_quests()), vec!["q2"]);
        assert_eq!(manager.quest("q1").unwrap().status(), QuestStatus::Active);
        assert_eq!(manager.quest("q3").unwrap().status(), QuestStatus::Available);
        assert!(manager.is_quest_successful("q2"));
        assert_eq!(manager.selected_quest().unwrap().identifier(), "q1");

        // Saving immediately reproduces the reconstructed state
        let saved = manager.save().clone();
        assert_eq!(saved.selected_quest.as_deref(), Some("q1"));
        assert_eq!(saved.successful_quests, vec!["q2".to_string()]);
        assert!(saved.abandoned_quests.is_empty());
        assert!(saved.failed_quests.is_empty());

        let progress_ids: Vec<&str> = saved
            .quest_progresses
            .iter()
            .map(|r| r.quest_identifier.as_str())
            .collect();
        assert_eq!(progress_ids, vec!["q1", "q3"]);
        assert_eq!(
            saved.quest_progresses[0].payload,
            json!({ "elapsed_seconds": 4.0 })
        );
    }

    #[test]
    fn test_save_load_round_trip() {
        let catalog = test_catalog();
        let mut manager = QuestManager::load(&catalog, &CampaignSave::default());

        // Conclude q2, advance q1, leave q3 untouched, select q1
        manager.dispatch(&QuestEvent::FlyShip { ship: ship() });
        manager.refresh_placements();
        manager.on_tick(4.0);
        manager.select_quest("q1");

        let first = manager.save().clone();
        let mut reloaded = QuestManager::load(&catalog, &first);
        let second = reloaded.save().clone();

        assert_eq!(first, second);
        for identifier in ["q1", "q2", "q3"] {
            assert_eq!(
                manager.quest(identifier).unwrap().status(),
                reloaded.quest(identifier).unwrap().status()
            );
        }
        assert_eq!(
            manager.selected_quest().map(|q| q.identifier().to_string()),
            reloaded.selected_quest().map(|q| q.identifier().to_string())
        );
    }

    #[test]
    fn test_subscription_consistency() {
        let manager = QuestManager::load(&test_catalog(), &CampaignSave::default());

        assert!(manager.is_subscribed("q1", QuestCallback::Tick));
        assert!(!manager.is_subscribed("q1", QuestCallback::FlyShip));
        assert!(manager.is_subscribed("q2", QuestCallback::FlyShip));
        assert!(!manager.is_subscribed("q2", QuestCallback::Tick));
        assert!(manager.is_subscribed("q3", QuestCallback::FlyShip));
        assert!(!manager.is_subscribed("q3", QuestCallback::Tick));
    }

    #[test]
    fn test_dispatch_scoping() {
        let mut manager = QuestManager::load(&test_catalog(), &CampaignSave::default());

        // Tick reaches only the tick subscriber (q1)
        manager.dispatch(&QuestEvent::Tick { delta_seconds: 2.0 });
        assert_eq!(manager.quest("q1").unwrap().status(), QuestStatus::Active);
        assert_eq!(manager.quest("q2").unwrap().status(), QuestStatus::Available);
        assert_eq!(manager.quest("q3").unwrap().status(), QuestStatus::Available);

        // FlyShip reaches q2 and q3, not q1
        manager.dispatch(&QuestEvent::FlyShip { ship: ship() });
        assert_eq!(manager.quest("q2").unwrap().status(), QuestStatus::Successful);
        assert_eq!(manager.quest("q3").unwrap().status(), QuestStatus::Active);
        let q1 = manager.quest("q1").unwrap().save();
        assert_eq!(q1.payload, json!({ "elapsed_seconds": 2.0 }));
    }

    #[test]
    fn test_interest_refresh_rewires_dispatch() {
        let mut manager = QuestManager::load(&test_catalog(), &CampaignSave::default());

        // q3 starts on fly_ship only; ticks do not reach it
        manager.dispatch(&QuestEvent::Tick { delta_seconds: 3.0 });
        assert_eq!(
            manager.quest("q3").unwrap().save().payload,
            json!({ "airborne": false, "flown_seconds": 0.0 })
        );

        // Takeoff flips its declared interest; refresh rewires the lists
        manager.dispatch(&QuestEvent::FlyShip { ship: ship() });
        manager.refresh_placements();
        assert!(manager.is_subscribed("q3", QuestCallback::Tick));
        assert!(!manager.is_subscribed("q3", QuestCallback::FlyShip));

        manager.dispatch(&QuestEvent::Tick { delta_seconds: 3.0 });
        assert_eq!(
            manager.quest("q3").unwrap().save().payload,
            json!({ "airborne": true, "flown_seconds": 3.0 })
        );
    }

    #[test]
    fn test_no_rebucketing_mid_dispatch() {
        let mut manager = QuestManager::load(&test_catalog(), &CampaignSave::default());

        manager.dispatch(&QuestEvent::FlyShip { ship: ship() });
        // q2 concluded but stays in the current set until placement upkeep
        assert_eq!(manager.quest("q2").unwrap().status(), QuestStatus::Successful);
        assert!(identifiers(manager.current_quests()).contains(&"q2"));

        manager.refresh_placements();
        assert_eq!(identifiers(manager.old_quests()), vec!["q2"]);
        assert!(!manager.is_subscribed("q2", QuestCallback::FlyShip));
    }

    #[test]
    fn test_selection_constraint() {
        let mut manager = QuestManager::load(&test_catalog(), &CampaignSave::default());

        assert!(manager.select_quest("q1"));
        assert!(!manager.select_quest("nonexistent"));

        // Conclude q2, then try to select it
        manager.dispatch(&QuestEvent::FlyShip { ship: ship() });
        manager.refresh_placements();
        assert!(!manager.select_quest("q2"));
        assert_eq!(manager.selected_quest().unwrap().identifier(), "q1");

        // Selection is cleared when the selected quest concludes
        for _ in 0..6 {
            manager.on_tick(2.0);
        }
        assert_eq!(manager.quest("q1").unwrap().status(), QuestStatus::Successful);
        manager.refresh_placements();
        assert!(manager.selected_quest().is_none());
    }

    #[test]
    fn test_abandon_rebuckets_and_deselects() {
        let mut manager = QuestManager::load(&test_catalog(), &CampaignSave::default());
        manager.select_quest("q1");

        assert!(manager.abandon_quest("q1"));
        assert!(manager.is_quest_abandoned("q1"));
        assert!(manager.selected_quest().is_none());
        assert!(!manager.is_subscribed("q1", QuestCallback::Tick));
        assert_eq!(identifiers(manager.old_quests()), vec!["q1"]);

        // Terminal statuses are absorbing
        assert!(!manager.abandon_quest("q1"));
        assert!(!manager.abandon_quest("nonexistent"));

        let saved = manager.save().clone();
        assert_eq!(saved.abandoned_quests, vec!["q1".to_string()]);
        let progress_ids: Vec<&str> = saved
            .quest_progresses
            .iter()
            .map(|r| r.quest_identifier.as_str())
            .collect();
        assert_eq!(progress_ids, vec!["q2", "q3"]);
    }

    #[test]
    fn test_stale_snapshot_entries_are_ignored() {
        let data = CampaignSave {
            quest_progresses: vec![QuestProgressSave {
                quest_identifier: "removed-quest".to_string(),
                status: "active".to_string(),
                started_at: None,
                payload: json!({}),
            }],
            successful_quests: vec!["another-removed-quest".to_string()],
            abandoned_quests: vec![],
            failed_quests: vec![],
            selected_quest: Some("removed-quest".to_string()),
        };

        let mut manager = QuestManager::load(&test_catalog(), &data);
        assert_eq!(manager.quest_count(), 3);
        assert!(manager.quest("removed-quest").is_none());
        assert!(manager.selected_quest().is_none());

        let saved = manager.save().clone();
        assert!(saved.successful_quests.is_empty());
        assert_eq!(saved.quest_progresses.len(), 3);
    }

    #[test]
    fn test_save_excludes_concluded_quest_with_bad_status() {
        let mut manager = QuestManager::load(&test_catalog(), &CampaignSave::default());

        // Force an inconsistent membership: q1 parked in the old set while
        // still transient
        let idx = manager.by_identifier["q1"];
        manager.current.retain(|&i| i != idx);
        manager.old.push(idx);

        let saved = manager.save().clone();
        assert!(saved.successful_quests.is_empty());
        assert!(saved.abandoned_quests.is_empty());
        assert!(saved.failed_quests.is_empty());
        let progress_ids: Vec<&str> = saved
            .quest_progresses
            .iter()
            .map(|r| r.quest_identifier.as_str())
            .collect();
        assert_eq!(progress_ids, vec!["q2", "q3"]);
    }

    #[test]
    fn test_manual_subscription_maintenance() {
        let mut manager = QuestManager::load(&test_catalog(), &CampaignSave::default());

        assert!(manager.clear_subscriptions("q1"));
        assert!(!manager.is_subscribed("q1", QuestCallback::Tick));
        manager.on_tick(5.0);
        assert_eq!(manager.quest("q1").unwrap().status(), QuestStatus::Available);

        assert!(manager.refresh_subscriptions("q1"));
        assert!(manager.is_subscribed("q1", QuestCallback::Tick));

        // Refresh is idempotent
        assert!(manager.refresh_subscriptions("q1"));
        assert_eq!(
            manager
                .tick_subscribers
                .iter()
                .filter(|&&i| i == manager.by_identifier["q1"])
                .count(),
            1
        );

        assert!(!manager.refresh_subscriptions("nonexistent"));
        assert!(!manager.clear_subscriptions("nonexistent"));
    }
}
