//! Quest Objective Logic
//!
//! Each quest's objective behavior lives behind the small [`QuestLogic`]
//! capability interface. The manager never interprets progress payloads; it
//! only shuttles them between the logic and the save snapshot.

use serde_json::{Value, json};
use tracing::warn;

use crate::definition::ObjectiveSpec;
use crate::events::ShipHandle;
use crate::status::{QuestCallback, QuestStatus};

/// Objective behavior for a single quest.
///
/// Callback handlers may return a requested status transition; the owning
/// [`Quest`](crate::quest::Quest) applies it with terminal statuses absorbing.
pub trait QuestLogic {
    /// Restore internal progress from a previously saved payload.
    ///
    /// A malformed payload is logged and left at defaults, never fatal.
    fn restore(&mut self, payload: &Value);

    /// Serialize internal progress; `restore` consumes it verbatim.
    fn save(&self) -> Value;

    /// Callbacks this logic currently wants to receive. May change as the
    /// objective advances; the manager re-reads it on every subscription
    /// refresh.
    fn callbacks(&self) -> Vec<QuestCallback>;

    fn on_tick(&mut self, _delta_seconds: f32) -> Option<QuestStatus> {
        None
    }

    fn on_fly_ship(&mut self, _ship: &ShipHandle) -> Option<QuestStatus> {
        None
    }
}

/// Instantiate the logic for a catalog objective
pub fn logic_for(objective: &ObjectiveSpec) -> Box<dyn QuestLogic> {
    match objective {
        ObjectiveSpec::FlightTime {
            target_seconds,
            fail_after_seconds,
        } => Box::new(FlightTimeLogic::new(*target_seconds, *fail_after_seconds)),
        ObjectiveSpec::FlyShip { ship_class } => Box::new(FlyShipLogic::new(ship_class.clone())),
        ObjectiveSpec::TrainingFlight { flight_seconds } => {
            Box::new(TrainingFlightLogic::new(*flight_seconds))
        }
    }
}

// ============================================================================
// Built-in objectives
// ============================================================================

/// Accumulates piloted time; succeeds at the target, optionally fails past a
/// deadline.
pub struct FlightTimeLogic {
    target_seconds: f32,
    fail_after_seconds: Option<f32>,
    elapsed_seconds: f32,
}

impl FlightTimeLogic {
    pub fn new(target_seconds: f32, fail_after_seconds: Option<f32>) -> Self {
        Self {
            target_seconds,
            fail_after_seconds,
            elapsed_seconds: 0.0,
        }
    }
}

impl QuestLogic for FlightTimeLogic {
    fn restore(&mut self, payload: &Value) {
        match payload.get("elapsed_seconds").and_then(Value::as_f64) {
            Some(elapsed) => self.elapsed_seconds = elapsed as f32,
            None => warn!("Malformed flight time progress payload: {}", payload),
        }
    }

    fn save(&self) -> Value {
        json!({ "elapsed_seconds": self.elapsed_seconds })
    }

    fn callbacks(&self) -> Vec<QuestCallback> {
        vec![QuestCallback::Tick]
    }

    fn on_tick(&mut self, delta_seconds: f32) -> Option<QuestStatus> {
        self.elapsed_seconds += delta_seconds;
        if self.elapsed_seconds >= self.target_seconds {
            return Some(QuestStatus::Successful);
        }
        if let Some(deadline) = self.fail_after_seconds {
            if self.elapsed_seconds >= deadline {
                return Some(QuestStatus::Failed);
            }
        }
        Some(QuestStatus::Active)
    }
}

/// Succeeds when the player takes the helm of a matching ship.
pub struct FlyShipLogic {
    ship_class: Option<String>,
}

impl FlyShipLogic {
    pub fn new(ship_class: Option<String>) -> Self {
        Self { ship_class }
    }
}

impl QuestLogic for FlyShipLogic {
    fn restore(&mut self, _payload: &Value) {
        // No transient progress: the quest either concluded or it didn't.
    }

    fn save(&self) -> Value {
        json!({})
    }

    fn callbacks(&self) -> Vec<QuestCallback> {
        vec![QuestCallback::FlyShip]
    }

    fn on_fly_ship(&mut self, ship: &ShipHandle) -> Option<QuestStatus> {
        match &self.ship_class {
            Some(class) if class != &ship.ship_class => None,
            _ => Some(QuestStatus::Successful),
        }
    }
}

/// Two-phase tutorial: take the helm of any ship, then stay at it for a
/// duration. Declares `fly_ship` interest first and `tick` once airborne.
pub struct TrainingFlightLogic {
    flight_seconds: f32,
    airborne: bool,
    flown_seconds: f32,
}

impl TrainingFlightLogic {
    pub fn new(flight_seconds: f32) -> Self {
        Self {
            flight_seconds,
            airborne: false,
            flown_seconds: 0.0,
        }
    }
}

impl QuestLogic for TrainingFlightLogic {
    fn restore(&mut self, payload: &Value) {
        let airborne = payload.get("airborne").and_then(Value::as_bool);
        let flown = payload.get("flown_seconds").and_then(Value::as_f64);
        match (airborne, flown) {
            (Some(airborne), Some(flown)) => {
                self.airborne = airborne;
                self.flown_seconds = flown as f32;
            }
            _ => warn!("Malformed training flight progress payload: {}", payload),
        }
    }

    fn save(&self) -> Value {
        json!({
            "airborne": self.airborne,
            "flown_seconds": self.flown_seconds,
        })
    }

    fn callbacks(&self) -> Vec<QuestCallback> {
        if self.airborne {
            vec![QuestCallback::Tick]
        } else {
            vec![QuestCallback::FlyShip]
        }
    }

    fn on_tick(&mut self, delta_seconds: f32) -> Option<QuestStatus> {
        if !self.airborne {
            return None;
        }
        self.flown_seconds += delta_seconds;
        if self.flown_seconds >= self.flight_seconds {
            Some(QuestStatus::Successful)
        } else {
            Some(QuestStatus::Active)
        }
    }

    fn on_fly_ship(&mut self, _ship: &ShipHandle) -> Option<QuestStatus> {
        self.airborne = true;
        Some(QuestStatus::Active)
    }
}
