pub const DEFAULT_STORE_BASE_URL: &str =
    "https://smart-bottle-iot-default-rtdb.asia-southeast1.firebasedatabase.app";

pub const SETPOINT_PATH: &str = "bottle/control/setpoint.json";
pub const TELEMETRY_PATH: &str = "bottle/telemetry.json";

pub fn endpoint_url(base_url: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
