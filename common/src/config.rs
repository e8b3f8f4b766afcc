use serde::{Deserialize, Serialize};

use crate::endpoints::{DEFAULT_STORE_BASE_URL, SETPOINT_PATH, TELEMETRY_PATH};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlConfig {
    pub tick_interval_ms: u64,
    pub remote_read_interval_ms: u64,
    pub edit_debounce_ms: u64,
    pub toggle_debounce_ms: u64,
    pub dead_zone_c: f32,
    pub setpoint_epsilon_c: f32,
    pub setpoint_step_c: f32,
    pub default_setpoint_c: f32,
    pub min_valid_temp_c: f32,
    pub max_valid_temp_c: f32,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 800,
            remote_read_interval_ms: 5_000,
            edit_debounce_ms: 150,
            toggle_debounce_ms: 250,
            dead_zone_c: 0.5,
            setpoint_epsilon_c: 0.001,
            setpoint_step_c: 1.0,
            default_setpoint_c: 50.0,
            min_valid_temp_c: -55.0,
            max_valid_temp_c: 125.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    pub initial_temp_c: f32,
    pub ambient_temp_c: f32,
    pub k_heat: f32,
    pub k_cool: f32,
    pub k_leak: f32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            initial_temp_c: 25.0,
            ambient_temp_c: 25.0,
            k_heat: 0.08,
            k_cool: 0.08,
            k_leak: 0.01,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreConfig {
    pub base_url: String,
    pub setpoint_path: String,
    pub telemetry_path: String,
    pub timeout_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_STORE_BASE_URL.to_string(),
            setpoint_path: SETPOINT_PATH.to_string(),
            telemetry_path: TELEMETRY_PATH.to_string(),
            timeout_ms: 3_000,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SensorConfig {
    /// Path of a w1-therm `w1_slave` file. `None` means no probe is attached.
    #[serde(default)]
    pub w1_device: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    pub control: ControlConfig,
    pub simulation: SimulationConfig,
    pub store: StoreConfig,
    #[serde(default)]
    pub sensor: SensorConfig,
    pub http_port: u16,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            control: ControlConfig::default(),
            simulation: SimulationConfig::default(),
            store: StoreConfig::default(),
            sensor: SensorConfig::default(),
            http_port: 8080,
        }
    }
}

impl RuntimeConfig {
    pub fn sanitize(&mut self) {
        self.control.sanitize();
        self.simulation.sanitize();
        self.store.sanitize();
        if self.http_port == 0 {
            self.http_port = 8080;
        }
    }
}

impl ControlConfig {
    pub fn sanitize(&mut self) {
        let defaults = Self::default();

        self.tick_interval_ms = self.tick_interval_ms.clamp(50, 60_000);
        self.remote_read_interval_ms = self.remote_read_interval_ms.max(self.tick_interval_ms);
        self.edit_debounce_ms = self.edit_debounce_ms.min(10_000);
        self.toggle_debounce_ms = self.toggle_debounce_ms.min(10_000);

        if !self.dead_zone_c.is_finite() || self.dead_zone_c < 0.0 {
            self.dead_zone_c = defaults.dead_zone_c;
        }
        if !self.setpoint_epsilon_c.is_finite() || self.setpoint_epsilon_c <= 0.0 {
            self.setpoint_epsilon_c = defaults.setpoint_epsilon_c;
        }
        if !self.setpoint_step_c.is_finite() || self.setpoint_step_c <= 0.0 {
            self.setpoint_step_c = defaults.setpoint_step_c;
        }
        if !self.default_setpoint_c.is_finite() {
            self.default_setpoint_c = defaults.default_setpoint_c;
        }
        if !(self.min_valid_temp_c.is_finite()
            && self.max_valid_temp_c.is_finite()
            && self.min_valid_temp_c < self.max_valid_temp_c)
        {
            self.min_valid_temp_c = defaults.min_valid_temp_c;
            self.max_valid_temp_c = defaults.max_valid_temp_c;
        }
    }
}

impl SimulationConfig {
    pub fn sanitize(&mut self) {
        let defaults = Self::default();

        if !self.initial_temp_c.is_finite() {
            self.initial_temp_c = defaults.initial_temp_c;
        }
        if !self.ambient_temp_c.is_finite() {
            self.ambient_temp_c = defaults.ambient_temp_c;
        }

        // Leak above 1.0 overshoots ambient every tick.
        self.k_heat = sanitize_gain(self.k_heat, defaults.k_heat, 10.0);
        self.k_cool = sanitize_gain(self.k_cool, defaults.k_cool, 10.0);
        self.k_leak = sanitize_gain(self.k_leak, defaults.k_leak, 1.0);
    }
}

impl StoreConfig {
    pub fn sanitize(&mut self) {
        let trimmed = self.base_url.trim().trim_end_matches('/');
        self.base_url = if trimmed.is_empty() {
            DEFAULT_STORE_BASE_URL.to_string()
        } else {
            trimmed.to_string()
        };

        if self.setpoint_path.trim().is_empty() {
            self.setpoint_path = SETPOINT_PATH.to_string();
        }
        if self.telemetry_path.trim().is_empty() {
            self.telemetry_path = TELEMETRY_PATH.to_string();
        }

        self.timeout_ms = self.timeout_ms.clamp(100, 30_000);
    }
}

fn sanitize_gain(value: f32, fallback: f32, max: f32) -> f32 {
    if value.is_finite() {
        value.clamp(0.0, max)
    } else {
        fallback
    }
}
