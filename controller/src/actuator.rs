use tracing::info;

use bottle_common::Actuator;

/// Heater/cooler pair on a host without GPIO: tracks both outputs and logs
/// every edge.
#[derive(Debug, Default)]
pub struct LoggingActuator {
    heater: bool,
    cooler: bool,
}

#[cfg(test)]
impl LoggingActuator {
    pub fn heater(&self) -> bool {
        self.heater
    }

    pub fn cooler(&self) -> bool {
        self.cooler
    }
}

impl Actuator for LoggingActuator {
    fn set_heater(&mut self, on: bool) {
        if self.heater != on {
            info!("heater -> {}", if on { "ON" } else { "OFF" });
        }
        self.heater = on;
    }

    fn set_cooler(&mut self, on: bool) {
        if self.cooler != on {
            info!("cooler -> {}", if on { "ON" } else { "OFF" });
        }
        self.cooler = on;
    }
}
