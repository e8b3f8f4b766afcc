pub mod config;
pub mod display;
pub mod endpoints;
pub mod engine;
pub mod input;
pub mod ports;
pub mod simulation;
pub mod sync;
pub mod thermostat;
pub mod types;

pub use config::{ControlConfig, RuntimeConfig, SensorConfig, SimulationConfig, StoreConfig};
pub use display::display_lines;
pub use endpoints::*;
pub use engine::BottleEngine;
pub use input::{InputDebouncer, InputFrame, UserCommand};
pub use ports::{Actuator, Clock, Display, SetpointStore, StoreError, TemperatureSource};
pub use simulation::ThermalModel;
pub use sync::{format_setpoint, parse_setpoint_payload, SyncClock, Throttle};
pub use thermostat::actuator_state;
pub use types::{ActuatorState, Mode, StatusSnapshot, Telemetry};
