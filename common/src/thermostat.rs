use crate::{ports::Actuator, types::ActuatorState};

/// Three-band on/off law. Both band edges are strict, so an error of exactly
/// `dead_zone_c` in either direction stays idle.
pub fn actuator_state(setpoint_c: f32, measured_c: f32, dead_zone_c: f32) -> ActuatorState {
    let error = setpoint_c - measured_c;
    if error > dead_zone_c {
        ActuatorState::Heating
    } else if error < -dead_zone_c {
        ActuatorState::Cooling
    } else {
        ActuatorState::Idle
    }
}

/// Applies `state` to both outputs. The output being switched off is always
/// written first so heater and cooler are never energised together.
pub fn drive<A: Actuator + ?Sized>(actuator: &mut A, state: ActuatorState) {
    match state {
        ActuatorState::Heating => {
            actuator.set_cooler(false);
            actuator.set_heater(true);
        }
        ActuatorState::Cooling => {
            actuator.set_heater(false);
            actuator.set_cooler(true);
        }
        ActuatorState::Idle => {
            actuator.set_heater(false);
            actuator.set_cooler(false);
        }
    }
}
