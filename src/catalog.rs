//! Quest Catalog
//!
//! Ordered, immutable registry of quest definitions, loaded once per session
//! from TOML files.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::definition::{QuestDescription, RawQuestFile};

/// Registry of all quest definitions for a campaign.
///
/// Entry order is the enumeration order during manager load; directory loads
/// sort file paths so the order is stable across machines.
pub struct QuestCatalog {
    quests: Vec<QuestDescription>,
}

impl QuestCatalog {
    pub fn new() -> Self {
        Self { quests: Vec::new() }
    }

    /// Build a catalog from already-resolved descriptions
    pub fn from_descriptions(descriptions: Vec<QuestDescription>) -> Self {
        let mut catalog = Self::new();
        for description in descriptions {
            catalog.insert(description);
        }
        catalog
    }

    /// Load all quest definitions from `<data_dir>/quests/`.
    ///
    /// Malformed files are logged and skipped; a missing directory yields an
    /// empty catalog.
    pub fn load_from_directory(data_dir: &Path) -> Result<Self, String> {
        let quests_dir = data_dir.join("quests");
        let mut catalog = Self::new();

        if !quests_dir.exists() {
            warn!("Quest directory does not exist: {:?}", quests_dir);
            return Ok(catalog);
        }

        let mut paths = Vec::new();
        collect_toml_files(&quests_dir, &mut paths)?;
        paths.sort();

        for path in paths {
            match load_quest_file(&path) {
                Ok(description) => {
                    info!("Loaded quest: {} ({})", description.name, description.identifier);
                    catalog.insert(description);
                }
                Err(e) => warn!("Failed to load quest {:?}: {}", path, e),
            }
        }

        info!("Loaded {} quest definitions", catalog.len());
        Ok(catalog)
    }

    fn insert(&mut self, description: QuestDescription) {
        if let Some(pos) = self
            .quests
            .iter()
            .position(|q| q.identifier == description.identifier)
        {
            warn!(
                "Duplicate quest identifier '{}', overwriting",
                description.identifier
            );
            self.quests[pos] = description;
        } else {
            self.quests.push(description);
        }
    }

    /// Get a description by identifier
    pub fn get(&self, identifier: &str) -> Option<&QuestDescription> {
        self.quests.iter().find(|q| q.identifier == identifier)
    }

    /// Descriptions in catalog order
    pub fn iter(&self) -> impl Iterator<Item = &QuestDescription> {
        self.quests.iter()
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.get(identifier).is_some()
    }

    pub fn len(&self) -> usize {
        self.quests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quests.is_empty()
    }
}

impl Default for QuestCatalog {
    fn default() -> Self {
        Self::new()
    }
}

/// Recursively collect TOML files under a directory
fn collect_toml_files(dir: &Path, paths: &mut Vec<PathBuf>) -> Result<(), String> {
    let entries =
        std::fs::read_dir(dir).map_err(|e| format!("Failed to read directory {:?}: {}", dir, e))?;

    for entry in entries {
        let entry = entry.map_err(|e| format!("Failed to read entry: {}", e))?;
        let path = entry.path();

        if path.is_dir() {
            collect_toml_files(&path, paths)?;
        } else if path.extension().map_or(false, |ext| ext == "toml") {
            paths.push(path);
        }
    }

    Ok(())
}

/// Load a single quest definition file
fn load_quest_file(path: &Path) -> Result<QuestDescription, String> {
    let content =
        std::fs::read_to_string(path).map_err(|e| format!("Failed to read {:?}: {}", path, e))?;

    let raw: RawQuestFile =
        toml::from_str(&content).map_err(|e| format!("Failed to parse {:?}: {}", path, e))?;

    QuestDescription::from_raw(&raw.quest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::ObjectiveSpec;
    use tempfile::TempDir;

    fn write_quest(dir: &Path, file: &str, identifier: &str, objective_type: &str) {
        let content = format!(
            r#"
[quest]
identifier = "{identifier}"
name = "Quest {identifier}"
description = "A test quest"

[quest.objective]
type = "{objective_type}"

[quest.reward]
money = 500
"#
        );
        std::fs::write(dir.join(file), content).unwrap();
    }

    #[test]
    fn test_load_from_directory() {
        let temp_dir = TempDir::new().unwrap();
        let quests_dir = temp_dir.path().join("quests");
        std::fs::create_dir_all(&quests_dir).unwrap();

        write_quest(&quests_dir, "02_second.toml", "second", "flight_time");
        write_quest(&quests_dir, "01_first.toml", "first", "fly_ship");

        let catalog = QuestCatalog::load_from_directory(temp_dir.path()).unwrap();
        assert_eq!(catalog.len(), 2);

        // Sorted path order, not directory enumeration order
        let identifiers: Vec<&str> = catalog.iter().map(|q| q.identifier.as_str()).collect();
        assert_eq!(identifiers, vec!["first", "second"]);

        let first = catalog.get("first").unwrap();
        assert_eq!(first.objective, ObjectiveSpec::FlyShip { ship_class: None });
        assert_eq!(first.reward.money, 500);
    }

    #[test]
    fn test_malformed_files_are_skipped() {
        let temp_dir = TempDir::new().unwrap();
        let quests_dir = temp_dir.path().join("quests");
        std::fs::create_dir_all(&quests_dir).unwrap();

        write_quest(&quests_dir, "good.toml", "good", "fly_ship");
        write_quest(&quests_dir, "unknown.toml", "unknown", "scan_anomaly");
        std::fs::write(quests_dir.join("broken.toml"), "not [valid toml").unwrap();

        let catalog = QuestCatalog::load_from_directory(temp_dir.path()).unwrap();
        assert_eq!(catalog.len(), 1);
        assert!(catalog.contains("good"));
    }

    #[test]
    fn test_missing_directory_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let catalog = QuestCatalog::load_from_directory(temp_dir.path()).unwrap();
        assert!(catalog.is_empty());
    }

    #[test]
    fn test_duplicate_identifier_overwrites() {
        let temp_dir = TempDir::new().unwrap();
        let quests_dir = temp_dir.path().join("quests");
        std::fs::create_dir_all(&quests_dir).unwrap();

        write_quest(&quests_dir, "a.toml", "dup", "fly_ship");
        write_quest(&quests_dir, "b.toml", "dup", "flight_time");

        let catalog = QuestCatalog::load_from_directory(temp_dir.path()).unwrap();
        assert_eq!(catalog.len(), 1);
        assert!(matches!(
            catalog.get("dup").unwrap().objective,
            ObjectiveSpec::FlightTime { .. }
        ));
    }
}
