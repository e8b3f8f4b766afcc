use std::time::Duration;

use anyhow::Context;
use reqwest::{
    blocking::Client,
    header::{CONTENT_TYPE, HeaderValue},
    StatusCode,
};
use tracing::{debug, info};

use bottle_common::{
    endpoint_url, format_setpoint, parse_setpoint_payload, SetpointStore, StoreConfig, StoreError,
    Telemetry,
};

/// Setpoint and telemetry documents on a Firebase-style REST database.
pub struct HttpSetpointStore {
    client: Client,
    setpoint_url: String,
    telemetry_url: String,
}

impl HttpSetpointStore {
    pub fn new(config: &StoreConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .context("failed to build store http client")?;

        Ok(Self {
            client,
            setpoint_url: endpoint_url(&config.base_url, &config.setpoint_path),
            telemetry_url: endpoint_url(&config.base_url, &config.telemetry_path),
        })
    }

    fn put(&self, url: &str, content_type: &'static str, body: Vec<u8>) -> Result<u16, StoreError> {
        let response = self
            .client
            .put(url)
            .header(CONTENT_TYPE, HeaderValue::from_static(content_type))
            .body(body)
            .send()
            .map_err(|err| StoreError::Unreachable(err.to_string()))?;

        let status = response.status();
        if status.is_success() {
            Ok(status.as_u16())
        } else {
            Err(StoreError::Status(status.as_u16()))
        }
    }
}

impl SetpointStore for HttpSetpointStore {
    fn read_setpoint(&mut self) -> Result<f32, StoreError> {
        let response = self
            .client
            .get(&self.setpoint_url)
            .send()
            .map_err(|err| StoreError::Unreachable(err.to_string()))?;

        if response.status() != StatusCode::OK {
            return Err(StoreError::Status(response.status().as_u16()));
        }

        let body = response
            .text()
            .map_err(|err| StoreError::Malformed(err.to_string()))?;
        let value = parse_setpoint_payload(&body)?;
        info!("read control/setpoint <- {value:.2}");
        Ok(value)
    }

    fn write_setpoint(&mut self, setpoint_c: f32) -> Result<(), StoreError> {
        let body = format_setpoint(setpoint_c);
        let code = self.put(&self.setpoint_url, "text/plain", body.into_bytes())?;
        info!("write control/setpoint -> {code}");
        Ok(())
    }

    fn push_telemetry(&mut self, telemetry: &Telemetry) -> Result<(), StoreError> {
        let body =
            serde_json::to_vec(telemetry).map_err(|err| StoreError::Encode(err.to_string()))?;
        let code = self.put(&self.telemetry_url, "application/json", body)?;
        debug!("telemetry put -> {code}");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use bottle_common::{ActuatorState, Mode};
    use pretty_assertions::assert_eq;
    use tokio::runtime::Runtime;
    use wiremock::{
        matchers::{body_json, body_string, header, method, path},
        Mock, MockServer, ResponseTemplate,
    };

    use super::*;

    fn store_for(base_url: &str) -> HttpSetpointStore {
        let config = StoreConfig {
            base_url: base_url.to_string(),
            timeout_ms: 2_000,
            ..StoreConfig::default()
        };
        HttpSetpointStore::new(&config).unwrap()
    }

    fn mock_get(runtime: &Runtime, server: &MockServer, response: ResponseTemplate) {
        runtime.block_on(
            Mock::given(method("GET"))
                .and(path("/bottle/control/setpoint.json"))
                .respond_with(response)
                .mount(server),
        );
    }

    #[test]
    fn reads_bare_setpoint() {
        let runtime = Runtime::new().unwrap();
        let server = runtime.block_on(MockServer::start());
        mock_get(&runtime, &server, ResponseTemplate::new(200).set_body_string("30"));

        let mut store = store_for(&server.uri());

        assert_eq!(store.read_setpoint(), Ok(30.0));
    }

    #[test]
    fn reads_quoted_setpoint() {
        let runtime = Runtime::new().unwrap();
        let server = runtime.block_on(MockServer::start());
        mock_get(
            &runtime,
            &server,
            ResponseTemplate::new(200).set_body_string("\"42.5\""),
        );

        let mut store = store_for(&server.uri());

        assert_eq!(store.read_setpoint(), Ok(42.5));
    }

    #[test]
    fn missing_document_is_malformed() {
        let runtime = Runtime::new().unwrap();
        let server = runtime.block_on(MockServer::start());
        mock_get(&runtime, &server, ResponseTemplate::new(200).set_body_string("null"));

        let mut store = store_for(&server.uri());

        assert!(matches!(
            store.read_setpoint(),
            Err(StoreError::Malformed(_))
        ));
    }

    #[test]
    fn non_success_read_reports_status() {
        let runtime = Runtime::new().unwrap();
        let server = runtime.block_on(MockServer::start());
        mock_get(&runtime, &server, ResponseTemplate::new(401));

        let mut store = store_for(&server.uri());

        assert_eq!(store.read_setpoint(), Err(StoreError::Status(401)));
    }

    #[test]
    fn writes_setpoint_as_plain_two_decimal_text() {
        let runtime = Runtime::new().unwrap();
        let server = runtime.block_on(MockServer::start());
        runtime.block_on(
            Mock::given(method("PUT"))
                .and(path("/bottle/control/setpoint.json"))
                .and(header("content-type", "text/plain"))
                .and(body_string("51.00"))
                .respond_with(ResponseTemplate::new(200).set_body_string("51.00"))
                .expect(1)
                .mount(&server),
        );

        let mut store = store_for(&server.uri());

        assert_eq!(store.write_setpoint(51.0), Ok(()));
        runtime.block_on(server.verify());
    }

    #[test]
    fn rejected_write_reports_status() {
        let runtime = Runtime::new().unwrap();
        let server = runtime.block_on(MockServer::start());
        runtime.block_on(
            Mock::given(method("PUT"))
                .respond_with(ResponseTemplate::new(503))
                .mount(&server),
        );

        let mut store = store_for(&server.uri());

        assert_eq!(store.write_setpoint(51.0), Err(StoreError::Status(503)));
    }

    #[test]
    fn pushes_telemetry_document() {
        let runtime = Runtime::new().unwrap();
        let server = runtime.block_on(MockServer::start());
        runtime.block_on(
            Mock::given(method("PUT"))
                .and(path("/bottle/telemetry.json"))
                .and(header("content-type", "application/json"))
                .and(body_json(serde_json::json!({
                    "temperature": 48.84,
                    "setpoint": 50.0,
                    "heater": 1,
                    "cooler": 0,
                    "mode": "SIM",
                    "ts": 7,
                })))
                .respond_with(ResponseTemplate::new(200))
                .expect(1)
                .mount(&server),
        );

        let mut store = store_for(&server.uri());
        let telemetry = Telemetry::new(48.839_2, 50.0, ActuatorState::Heating, Mode::Simulated, 7);

        assert_eq!(store.push_telemetry(&telemetry), Ok(()));
        runtime.block_on(server.verify());
    }

    #[test]
    fn closed_port_is_unreachable() {
        // Port 9 (discard) is not listening on test hosts.
        let mut store = store_for("http://127.0.0.1:9");

        assert!(matches!(
            store.read_setpoint(),
            Err(StoreError::Unreachable(_))
        ));
        assert!(matches!(
            store.write_setpoint(50.0),
            Err(StoreError::Unreachable(_))
        ));
    }
}
