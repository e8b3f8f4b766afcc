use serde::{Deserialize, Serialize, Serializer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Mode {
    #[default]
    #[serde(rename = "SIM")]
    Simulated,
    #[serde(rename = "REAL")]
    Real,
}

impl Mode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Simulated => "SIM",
            Self::Real => "REAL",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Self::Simulated => Self::Real,
            Self::Real => Self::Simulated,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActuatorState {
    #[default]
    Idle,
    Heating,
    Cooling,
}

impl ActuatorState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "IDLE",
            Self::Heating => "HEATING",
            Self::Cooling => "COOLING",
        }
    }

    pub fn heater_on(self) -> bool {
        self == Self::Heating
    }

    pub fn cooler_on(self) -> bool {
        self == Self::Cooling
    }

    pub fn heater_duty(self) -> u8 {
        u8::from(self.heater_on())
    }

    pub fn cooler_duty(self) -> u8 {
        u8::from(self.cooler_on())
    }
}

/// Document pushed to the telemetry endpoint every tick and on every mode toggle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Telemetry {
    #[serde(serialize_with = "two_decimals")]
    pub temperature: f32,
    #[serde(serialize_with = "two_decimals")]
    pub setpoint: f32,
    pub heater: u8,
    pub cooler: u8,
    pub mode: Mode,
    pub ts: u64,
}

impl Telemetry {
    pub fn new(temperature: f32, setpoint: f32, state: ActuatorState, mode: Mode, ts: u64) -> Self {
        Self {
            temperature,
            setpoint,
            heater: state.heater_duty(),
            cooler: state.cooler_duty(),
            mode,
            ts,
        }
    }
}

/// Everything the presentation layer needs after one control tick.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusSnapshot {
    #[serde(rename = "currentTemp")]
    pub current_temp: f32,
    pub setpoint: f32,
    pub mode: Mode,
    pub state: &'static str,
    #[serde(rename = "heaterOn")]
    pub heater_on: bool,
    #[serde(rename = "coolerOn")]
    pub cooler_on: bool,
    #[serde(rename = "sensorValid")]
    pub sensor_valid: bool,
    #[serde(rename = "uptimeSec")]
    pub uptime_sec: u64,
}

/// Rounds to two fractional digits so the JSON carries `49.08`, not `49.08000183`.
pub fn round_2dp(value: f32) -> f64 {
    (f64::from(value) * 100.0).round() / 100.0
}

fn two_decimals<S: Serializer>(value: &f32, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(round_2dp(*value))
}
