use std::path::PathBuf;

use tracing::{error, info};

use campaign_quests::{CampaignSave, QuestCatalog, QuestEvent, QuestManager, ShipHandle, save};

/// Drives one simulated session step against a catalog and save file:
/// load, fly a ship, tick for a minute, retire concluded quests, save.
fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("campaign_quests=info".parse().unwrap()),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let data_dir = PathBuf::from(args.next().unwrap_or_else(|| "data".to_string()));
    let save_path = PathBuf::from(args.next().unwrap_or_else(|| "campaign_save.json".to_string()));

    let catalog = match QuestCatalog::load_from_directory(&data_dir) {
        Ok(catalog) => catalog,
        Err(e) => {
            error!("Failed to load quest catalog: {}", e);
            std::process::exit(1);
        }
    };

    let save_data = if save_path.exists() {
        match save::read_save(&save_path) {
            Ok(data) => data,
            Err(e) => {
                error!("Failed to load save: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        info!("No save found at {:?}, starting a new campaign", save_path);
        CampaignSave::default()
    };

    let mut manager = QuestManager::load(&catalog, &save_data);

    if manager.selected_quest().is_none() {
        let first = manager.current_quests().next().map(|q| q.identifier().to_string());
        if let Some(identifier) = first {
            manager.select_quest(&identifier);
            info!("Selected quest '{}'", identifier);
        }
    }

    // The player takes the helm, then flies for a minute of game time
    let ship = ShipHandle::new("ghoul-7", "light-fighter");
    manager.dispatch(&QuestEvent::FlyShip { ship });
    for _ in 0..120 {
        manager.dispatch(&QuestEvent::Tick { delta_seconds: 0.5 });
    }
    manager.refresh_placements();

    for quest in manager.current_quests() {
        info!("In play: {} ({})", quest.identifier(), quest.status().as_str());
    }
    for quest in manager.old_quests() {
        info!("Concluded: {} ({})", quest.identifier(), quest.status().as_str());
    }

    let snapshot = manager.save().clone();
    if let Err(e) = save::write_save(&save_path, &snapshot) {
        error!("Failed to write save: {}", e);
        std::process::exit(1);
    }
    info!("Campaign saved to {:?}", save_path);
}
