use std::{
    fs, io,
    path::{Path, PathBuf},
};

use thiserror::Error;
use tracing::{debug, warn};

use bottle_common::TemperatureSource;

/// Value a DS18B20 reports when the bus lost the device.
const DS18B20_DISCONNECTED_C: f32 = -127.0;

#[derive(Debug, Error)]
enum W1Error {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("crc check failed")]
    Crc,
    #[error("unexpected w1_slave format")]
    Format,
    #[error("device reports disconnected")]
    Disconnected,
}

/// DS18B20 probe exposed by the Linux w1-therm driver.
pub struct W1Thermometer {
    path: Option<PathBuf>,
    last_error: Option<String>,
}

impl W1Thermometer {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self {
            path,
            last_error: None,
        }
    }

    fn read(&self, path: &Path) -> Result<f32, W1Error> {
        let raw = fs::read_to_string(path).map_err(|source| W1Error::Io {
            path: path.display().to_string(),
            source,
        })?;
        parse_w1_slave(&raw)
    }
}

impl TemperatureSource for W1Thermometer {
    fn current_reading(&mut self) -> Option<f32> {
        let path = self.path.as_ref()?;

        match self.read(path) {
            Ok(temp_c) => {
                self.last_error = None;
                debug!("[DS18B20] Temperature: {temp_c:.2}C");
                Some(temp_c)
            }
            Err(err) => {
                let message = err.to_string();
                // Only log transitions; a missing probe would otherwise warn every tick.
                if self.last_error.as_deref() != Some(message.as_str()) {
                    warn!("DS18B20 read failed: {message}");
                    self.last_error = Some(message);
                }
                None
            }
        }
    }
}

/// Parses the two-line `w1_slave` file:
///
/// ```text
/// 72 01 4b 46 7f ff 0e 10 57 : crc=57 YES
/// 72 01 4b 46 7f ff 0e 10 57 t=23125
/// ```
fn parse_w1_slave(raw: &str) -> Result<f32, W1Error> {
    let mut lines = raw.lines();
    let crc_line = lines.next().ok_or(W1Error::Format)?;
    let data_line = lines.next().ok_or(W1Error::Format)?;

    if !crc_line.trim_end().ends_with("YES") {
        return Err(W1Error::Crc);
    }

    let (_, millis) = data_line.rsplit_once("t=").ok_or(W1Error::Format)?;
    let millis = millis.trim().parse::<i32>().map_err(|_| W1Error::Format)?;
    let temp_c = millis as f32 / 1_000.0;

    if temp_c <= DS18B20_DISCONNECTED_C {
        return Err(W1Error::Disconnected);
    }
    Ok(temp_c)
}
