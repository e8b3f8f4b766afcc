//! Collaborator interfaces the control engine is built against.
//!
//! Host adapters live in the controller crate; tests substitute in-memory fakes.

use thiserror::Error;

use crate::types::{StatusSnapshot, Telemetry};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("store unreachable: {0}")]
    Unreachable(String),
    #[error("store answered with status {0}")]
    Status(u16),
    #[error("malformed store payload: {0}")]
    Malformed(String),
    #[error("failed to encode request body: {0}")]
    Encode(String),
}

/// Remote document store holding the shared setpoint and the telemetry feed.
///
/// Every call blocks the control loop until it returns. Implementations must
/// bound each call with their own timeout and report expiry as
/// [`StoreError::Unreachable`]; callers never cancel a call in flight.
/// Writes are best-effort and at-most-once: callers log failures and never
/// retry them.
pub trait SetpointStore {
    fn read_setpoint(&mut self) -> Result<f32, StoreError>;

    fn write_setpoint(&mut self, setpoint_c: f32) -> Result<(), StoreError>;

    fn push_telemetry(&mut self, telemetry: &Telemetry) -> Result<(), StoreError>;
}

/// Physical probe abstraction. `None` means disconnected or invalid.
pub trait TemperatureSource {
    fn current_reading(&mut self) -> Option<f32>;
}

/// Heater/cooler output pair.
pub trait Actuator {
    fn set_heater(&mut self, on: bool);

    fn set_cooler(&mut self, on: bool);
}

/// Monotonic millisecond clock.
pub trait Clock {
    fn now_ms(&self) -> u64;
}

/// Read-only consumer of engine output.
pub trait Display {
    fn render(&mut self, status: &StatusSnapshot);
}
