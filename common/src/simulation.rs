use crate::{config::SimulationConfig, types::ActuatorState};

/// First-order bottle model: actuator forcing plus leakage toward ambient.
#[derive(Debug, Clone)]
pub struct ThermalModel {
    config: SimulationConfig,
    temp_c: f32,
}

impl ThermalModel {
    pub fn new(config: SimulationConfig) -> Self {
        let temp_c = config.initial_temp_c;
        Self { config, temp_c }
    }

    pub fn temperature_c(&self) -> f32 {
        self.temp_c
    }

    pub fn ambient_c(&self) -> f32 {
        self.config.ambient_temp_c
    }

    /// Advances one tick. Forcing is applied first; leakage then acts on the
    /// forced temperature.
    pub fn step(&mut self, state: ActuatorState) -> f32 {
        self.temp_c += f32::from(state.heater_duty()) * self.config.k_heat;
        self.temp_c -= f32::from(state.cooler_duty()) * self.config.k_cool;
        self.temp_c += (self.config.ambient_temp_c - self.temp_c) * self.config.k_leak;
        self.temp_c
    }

    /// Tracks a measured value while the physical probe is in charge.
    pub fn pin(&mut self, measured_c: f32) {
        self.temp_c = measured_c;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model_at(temp_c: f32) -> ThermalModel {
        let mut model = ThermalModel::new(SimulationConfig::default());
        model.pin(temp_c);
        model
    }

    fn assert_close(actual: f32, expected: f32) {
        assert!(
            (actual - expected).abs() < 1e-4,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn heating_step_adds_forcing_then_leak() {
        let mut model = model_at(49.0);

        let next = model.step(ActuatorState::Heating);

        // 49.0 + 0.08 = 49.08, then 1% of the way back toward 25.0.
        assert_close(next, 49.08 + (25.0 - 49.08) * 0.01);
    }

    #[test]
    fn cooling_step_subtracts_forcing() {
        let mut model = model_at(30.0);

        let next = model.step(ActuatorState::Cooling);

        assert_close(next, 29.92 + (25.0 - 29.92) * 0.01);
    }

    #[test]
    fn idle_decays_toward_ambient() {
        let mut model = model_at(60.0);

        for _ in 0..2_000 {
            model.step(ActuatorState::Idle);
        }

        assert!((model.temperature_c() - model.ambient_c()).abs() < 0.01);
    }

    #[test]
    fn idle_at_ambient_is_stationary() {
        let mut model = ThermalModel::new(SimulationConfig::default());

        assert_close(model.step(ActuatorState::Idle), 25.0);
    }

    #[test]
    fn continuous_heating_is_bounded() {
        let mut model = ThermalModel::new(SimulationConfig::default());

        for _ in 0..5_000 {
            model.step(ActuatorState::Heating);
        }

        // Equilibrium: ambient + k_heat * (1 - k_leak) / k_leak.
        assert!(model.temperature_c() < 25.0 + 8.0);
        assert!(model.temperature_c() > 25.0 + 7.5);
    }
}
