//! Campaign Save Snapshot
//!
//! The persisted representation consumed and produced by
//! [`QuestManager::load`](crate::manager::QuestManager::load) and
//! [`QuestManager::save`](crate::manager::QuestManager::save), plus JSON
//! file round-trip helpers.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// In-progress record for one transient quest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestProgressSave {
    pub quest_identifier: String,
    /// Transient status as a string ("available" or "active"); anything else
    /// in a loaded file is a data-integrity error handled at restore time
    pub status: String,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    /// Opaque payload owned by the quest's own logic
    #[serde(default)]
    pub payload: Value,
}

/// Full persisted quest state for a campaign
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CampaignSave {
    /// One record per quest still in play, in catalog order
    #[serde(default)]
    pub quest_progresses: Vec<QuestProgressSave>,
    #[serde(default)]
    pub successful_quests: Vec<String>,
    #[serde(default)]
    pub abandoned_quests: Vec<String>,
    #[serde(default)]
    pub failed_quests: Vec<String>,
    #[serde(default)]
    pub selected_quest: Option<String>,
}

/// Read a campaign save from a JSON file
pub fn read_save(path: &Path) -> Result<CampaignSave, String> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read save {:?}: {}", path, e))?;
    serde_json::from_str(&content).map_err(|e| format!("Failed to parse save {:?}: {}", path, e))
}

/// Write a campaign save to a JSON file
pub fn write_save(path: &Path, save: &CampaignSave) -> Result<(), String> {
    let json = serde_json::to_string_pretty(save)
        .map_err(|e| format!("Failed to serialize save: {}", e))?;
    std::fs::write(path, json).map_err(|e| format!("Failed to write save {:?}: {}", path, e))
}
