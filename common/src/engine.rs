use tracing::{debug, info, warn};

use crate::{
    config::{ControlConfig, SimulationConfig},
    input::InputFrame,
    ports::{Actuator, Clock, SetpointStore, StoreError, TemperatureSource},
    simulation::ThermalModel,
    sync::{reconcile, Reconciliation, SyncClock},
    thermostat::{actuator_state, drive},
    types::{ActuatorState, Mode, StatusSnapshot, Telemetry},
};

/// Control core of the bottle.
///
/// Owns the setpoint, mode, actuator state, sync timers and the simulated
/// plant. All collaborators are injected so the whole loop runs against fakes
/// in tests. Within one [`tick`](Self::tick) the order is fixed: mode toggle,
/// local edits, periodic remote read, measurement, control law, plant step,
/// telemetry. An accepted edit restarts the read interval, so a pull can never
/// undo an edit inside the interval it was made in.
pub struct BottleEngine<St, Src, Act, Clk> {
    config: ControlConfig,
    store: St,
    source: Src,
    actuator: Act,
    clock: Clk,

    setpoint_c: f32,
    mode: Mode,
    state: ActuatorState,
    plant: ThermalModel,
    sync: SyncClock,

    measured_c: f32,
    sensor_valid: bool,
    started_ms: u64,
}

impl<St, Src, Act, Clk> BottleEngine<St, Src, Act, Clk>
where
    St: SetpointStore,
    Src: TemperatureSource,
    Act: Actuator,
    Clk: Clock,
{
    /// Brings the engine up: one blocking setpoint read (default on failure)
    /// followed by an immediate write-back, so the store reflects the local
    /// value before periodic polling starts.
    pub fn start(
        config: ControlConfig,
        simulation: SimulationConfig,
        store: St,
        source: Src,
        actuator: Act,
        clock: Clk,
    ) -> Self {
        let plant = ThermalModel::new(simulation);
        let started_ms = clock.now_ms();
        let mut engine = Self {
            setpoint_c: config.default_setpoint_c,
            sync: SyncClock::new(config.remote_read_interval_ms, config.edit_debounce_ms),
            measured_c: plant.temperature_c(),
            config,
            store,
            source,
            actuator,
            clock,
            mode: Mode::default(),
            state: ActuatorState::Idle,
            plant,
            sensor_valid: false,
            started_ms,
        };

        drive(&mut engine.actuator, ActuatorState::Idle);

        match engine.read_remote() {
            Ok(remote) => {
                info!("initial setpoint from store: {remote:.2}");
                engine.setpoint_c = remote;
            }
            Err(err) => warn!(
                "initial setpoint read failed, using default {:.2}: {err}",
                engine.setpoint_c
            ),
        }
        engine.sync.remote_read.mark(engine.clock.now_ms());
        engine.write_setpoint();

        engine
    }

    pub fn setpoint_c(&self) -> f32 {
        self.setpoint_c
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn actuator_state(&self) -> ActuatorState {
        self.state
    }

    pub fn measured_c(&self) -> f32 {
        self.measured_c
    }

    pub fn simulated_temp_c(&self) -> f32 {
        self.plant.temperature_c()
    }

    pub fn sync_clock(&self) -> &SyncClock {
        &self.sync
    }

    pub fn store(&self) -> &St {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut St {
        &mut self.store
    }

    pub fn source_mut(&mut self) -> &mut Src {
        &mut self.source
    }

    pub fn actuator(&self) -> &Act {
        &self.actuator
    }

    /// Runs one control iteration to completion.
    pub fn tick(&mut self, input: InputFrame) -> StatusSnapshot {
        if input.toggle_mode {
            self.toggle_mode();
        }

        let now_ms = self.clock.now_ms();
        if (input.increment || input.decrement) && self.sync.local_edit.try_acquire(now_ms) {
            if input.increment {
                self.apply_local_edit(self.config.setpoint_step_c);
            }
            if input.decrement {
                self.apply_local_edit(-self.config.setpoint_step_c);
            }
            // A read-back within one interval of an edit may still return the
            // pre-edit value.
            self.sync.remote_read.mark(now_ms);
        }

        self.poll_remote_if_due();

        self.measured_c = self.measure();
        self.state = actuator_state(self.setpoint_c, self.measured_c, self.config.dead_zone_c);
        drive(&mut self.actuator, self.state);

        match self.mode {
            Mode::Simulated => {
                self.plant.step(self.state);
            }
            Mode::Real => self.plant.pin(self.measured_c),
        }

        let status = self.status();
        info!(
            temp = format_args!("{:.2}", self.measured_c),
            set = format_args!("{:.2}", self.setpoint_c),
            heat = self.state.heater_duty(),
            cool = self.state.cooler_duty(),
            mode = self.mode.as_str(),
            "tick"
        );

        self.emit_telemetry(self.measured_c);
        status
    }

    /// Flips the mode and pushes telemetry straight away, before the new
    /// mode has run a tick.
    pub fn toggle_mode(&mut self) -> Mode {
        self.mode = self.mode.toggled();
        info!("mode -> {}", self.mode.as_str());
        self.emit_telemetry(self.plant.temperature_c());
        self.mode
    }

    /// Applies a remote read if the read interval has elapsed. Returns `true`
    /// if the setpoint changed.
    pub fn poll_remote_if_due(&mut self) -> bool {
        let now_ms = self.clock.now_ms();
        if !self.sync.remote_read.try_acquire(now_ms) {
            return false;
        }

        let remote = match self.read_remote() {
            Ok(remote) => remote,
            Err(err) => {
                warn!("setpoint read failed, keeping {:.2}: {err}", self.setpoint_c);
                return false;
            }
        };

        match reconcile(self.setpoint_c, remote, self.config.setpoint_epsilon_c) {
            Reconciliation::Adopt(value) => {
                self.setpoint_c = value;
                info!("applied remote setpoint -> {value:.2}");
                true
            }
            Reconciliation::Unchanged => {
                debug!("remote setpoint {remote:.2} matches local value");
                false
            }
        }
    }

    pub fn status(&self) -> StatusSnapshot {
        StatusSnapshot {
            current_temp: self.measured_c,
            setpoint: self.setpoint_c,
            mode: self.mode,
            state: self.state.as_str(),
            heater_on: self.state.heater_on(),
            cooler_on: self.state.cooler_on(),
            sensor_valid: self.mode == Mode::Real && self.sensor_valid,
            uptime_sec: self.uptime_sec(),
        }
    }

    /// Reads the shared setpoint. Non-finite values are treated as malformed,
    /// whatever the store implementation.
    fn read_remote(&mut self) -> Result<f32, StoreError> {
        let remote = self.store.read_setpoint()?;
        if remote.is_finite() {
            Ok(remote)
        } else {
            Err(StoreError::Malformed(format!("non-finite setpoint {remote}")))
        }
    }

    fn apply_local_edit(&mut self, delta_c: f32) {
        self.setpoint_c += delta_c;
        info!("button edit -> setpoint={:.2}", self.setpoint_c);
        self.write_setpoint();
    }

    fn write_setpoint(&mut self) {
        match self.store.write_setpoint(self.setpoint_c) {
            Ok(()) => debug!("setpoint {:.2} written to store", self.setpoint_c),
            Err(err) => warn!("setpoint write failed (not retried): {err}"),
        }
    }

    fn measure(&mut self) -> f32 {
        if self.mode == Mode::Simulated {
            return self.plant.temperature_c();
        }

        match self.source.current_reading() {
            Some(reading) if self.is_plausible(reading) => {
                self.sensor_valid = true;
                reading
            }
            Some(reading) => {
                self.sensor_valid = false;
                warn!("discarding implausible sensor reading {reading}");
                self.plant.temperature_c()
            }
            None => {
                if self.sensor_valid {
                    warn!("sensor unavailable, falling back to simulated temperature");
                }
                self.sensor_valid = false;
                self.plant.temperature_c()
            }
        }
    }

    fn is_plausible(&self, reading: f32) -> bool {
        reading.is_finite()
            && (self.config.min_valid_temp_c..=self.config.max_valid_temp_c).contains(&reading)
    }

    fn emit_telemetry(&mut self, temperature_c: f32) {
        let telemetry = Telemetry::new(
            temperature_c,
            self.setpoint_c,
            self.state,
            self.mode,
            self.uptime_sec(),
        );
        if let Err(err) = self.store.push_telemetry(&telemetry) {
            warn!("telemetry push failed: {err}");
        }
    }

    fn uptime_sec(&self) -> u64 {
        self.clock.now_ms().saturating_sub(self.started_ms) / 1_000
    }
}
