use std::{
    io::ErrorKind,
    net::SocketAddr,
    path::PathBuf,
    sync::{Arc, Mutex, OnceLock},
    time::{Duration, Instant},
};

use anyhow::Context;
use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, runtime::Handle, sync::watch, time::MissedTickBehavior};
use tower_http::services::ServeDir;
use tracing::{debug, info, warn};

use bottle_common::{
    display_lines, BottleEngine, Clock, Display, RuntimeConfig, SetpointStore, StatusSnapshot,
    StoreError,
};

use crate::{
    actuator::LoggingActuator, console::ConsoleInput, http_store::HttpSetpointStore,
    w1::W1Thermometer,
};

type StatusReceiver = watch::Receiver<Option<StatusSnapshot>>;

#[derive(Clone)]
struct AppState {
    status_rx: StatusReceiver,
    remote: Arc<Mutex<HttpSetpointStore>>,
}

#[derive(Clone)]
struct AppStore {
    runtime_path: PathBuf,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

#[derive(Debug, Serialize)]
struct PanelView {
    lines: [String; 2],
}

#[derive(Debug, Serialize, Deserialize)]
struct SetpointUpdate {
    setpoint: f32,
}

pub struct MonotonicClock;

impl Clock for MonotonicClock {
    fn now_ms(&self) -> u64 {
        monotonic_ms()
    }
}

/// Publishes every snapshot to the status server and logs the panel text.
pub struct StatusBoard {
    tx: watch::Sender<Option<StatusSnapshot>>,
}

impl StatusBoard {
    pub fn channel() -> (Self, StatusReceiver) {
        let (tx, rx) = watch::channel(None);
        (Self { tx }, rx)
    }
}

impl Display for StatusBoard {
    fn render(&mut self, status: &StatusSnapshot) {
        let [top, bottom] = display_lines(status);
        debug!("panel | {top} | {bottom}");
        self.tx.send_replace(Some(status.clone()));
    }
}

pub async fn run() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let store = AppStore::new();
    let mut runtime = store.load_runtime_config().unwrap_or_else(|err| {
        warn!("failed to load runtime config from store: {err:#}");
        RuntimeConfig::default()
    });
    apply_env_overrides(&mut runtime);
    runtime.sanitize();

    info!(
        "store {} (timeout {} ms), probe {}",
        runtime.store.base_url,
        runtime.store.timeout_ms,
        runtime.sensor.w1_device.as_deref().unwrap_or("<none>")
    );

    // The blocking client owns its own runtime and must be built off the async workers.
    let store_config = runtime.store.clone();
    let remote = tokio::task::spawn_blocking(move || HttpSetpointStore::new(&store_config))
        .await
        .context("store client task failed")??;

    let (board, status_rx) = StatusBoard::channel();
    let app_state = AppState {
        status_rx,
        remote: Arc::new(Mutex::new(remote)),
    };

    let addr = SocketAddr::from(([0, 0, 0, 0], runtime.http_port));
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind status server at {addr}"))?;
    let app = status_router(app_state);
    tokio::spawn(async move {
        if let Err(err) = axum::serve(listener, app).await {
            warn!("status server stopped: {err}");
        }
    });
    info!("status server listening on http://{addr}");

    let input = ConsoleInput::spawn(
        runtime.control.edit_debounce_ms,
        runtime.control.toggle_debounce_ms,
        monotonic_ms,
    );

    tokio::task::spawn_blocking(move || run_control_loop(runtime, input, board))
        .await
        .context("control loop task failed")?
}

/// Drives the engine. Store calls block the loop, so this runs on the
/// blocking pool and only borrows the runtime for tick pacing.
fn run_control_loop(
    runtime: RuntimeConfig,
    mut input: ConsoleInput,
    mut board: StatusBoard,
) -> anyhow::Result<()> {
    let remote = HttpSetpointStore::new(&runtime.store)?;
    let probe = W1Thermometer::new(runtime.sensor.w1_device.as_ref().map(PathBuf::from));

    let mut engine = BottleEngine::start(
        runtime.control.clone(),
        runtime.simulation.clone(),
        remote,
        probe,
        LoggingActuator::default(),
        MonotonicClock,
    );

    let handle = Handle::current();
    let mut interval =
        tokio::time::interval(Duration::from_millis(runtime.control.tick_interval_ms));
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    info!("control loop running every {} ms", runtime.control.tick_interval_ms);

    loop {
        handle.block_on(interval.tick());
        let status = engine.tick(input.drain());
        board.render(&status);
    }
}

fn status_router(app_state: AppState) -> Router {
    let web_root = format!("{}/web", env!("CARGO_MANIFEST_DIR"));
    Router::new()
        .route("/api/status", get(handle_get_status))
        .route("/api/panel", get(handle_get_panel))
        .route("/api/setpoint", put(handle_put_setpoint))
        .fallback_service(ServeDir::new(web_root))
        .with_state(app_state)
}

async fn handle_get_status(State(state): State<AppState>) -> impl IntoResponse {
    let current = state.status_rx.borrow().clone();
    match current {
        Some(status) => Json(status).into_response(),
        None => error_response(StatusCode::SERVICE_UNAVAILABLE, "No control tick yet"),
    }
}

async fn handle_get_panel(State(state): State<AppState>) -> impl IntoResponse {
    let current = state.status_rx.borrow().clone();
    match current {
        Some(status) => Json(PanelView {
            lines: display_lines(&status),
        })
        .into_response(),
        None => error_response(StatusCode::SERVICE_UNAVAILABLE, "No control tick yet"),
    }
}

/// Writes the shared setpoint document like any other remote client. The
/// engine picks the value up on its next periodic read.
async fn handle_put_setpoint(
    State(state): State<AppState>,
    Json(update): Json<SetpointUpdate>,
) -> impl IntoResponse {
    if !update.setpoint.is_finite() {
        return error_response(StatusCode::BAD_REQUEST, "Setpoint must be a finite number");
    }

    let remote = state.remote.clone();
    let setpoint = update.setpoint;
    let result = tokio::task::spawn_blocking(move || {
        let mut remote = remote
            .lock()
            .map_err(|_| StoreError::Unreachable("store client lock poisoned".to_string()))?;
        remote.write_setpoint(setpoint)
    })
    .await;

    match result {
        Ok(Ok(())) => {
            info!("dashboard setpoint -> {setpoint:.2}");
            (StatusCode::ACCEPTED, Json(SetpointUpdate { setpoint })).into_response()
        }
        Ok(Err(err)) => {
            warn!("dashboard setpoint write failed: {err}");
            error_response(StatusCode::BAD_GATEWAY, &err.to_string())
        }
        Err(err) => error_response(StatusCode::INTERNAL_SERVER_ERROR, &err.to_string()),
    }
}

impl AppStore {
    fn new() -> Self {
        let data_dir = std::env::var("BOTTLE_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./.bottle"));

        Self {
            runtime_path: data_dir.join("runtime.json"),
        }
    }

    fn load_runtime_config(&self) -> anyhow::Result<RuntimeConfig> {
        match std::fs::read(&self.runtime_path) {
            Ok(raw) => serde_json::from_slice::<RuntimeConfig>(&raw).with_context(|| {
                format!("invalid runtime config at {}", self.runtime_path.display())
            }),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(RuntimeConfig::default()),
            Err(err) => Err(err.into()),
        }
    }
}

fn apply_env_overrides(runtime: &mut RuntimeConfig) {
    if let Ok(url) = std::env::var("BOTTLE_STORE_URL") {
        runtime.store.base_url = url;
    }
    if let Ok(device) = std::env::var("BOTTLE_W1_DEVICE") {
        runtime.sensor.w1_device = Some(device).filter(|value| !value.trim().is_empty());
    }
    if let Some(port) = std::env::var("BOTTLE_HTTP_PORT")
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
    {
        runtime.http_port = port;
    }
}

fn error_response(status: StatusCode, message: &str) -> axum::response::Response {
    (
        status,
        Json(ErrorBody {
            error: message.to_string(),
        }),
    )
        .into_response()
}

fn monotonic_ms() -> u64 {
    static START: OnceLock<Instant> = OnceLock::new();
    START
        .get_or_init(Instant::now)
        .elapsed()
        .as_millis()
        .try_into()
        .unwrap_or(u64::MAX)
}
