use crate::types::StatusSnapshot;

/// Two-line panel text: measured temperature on top, setpoint and mode below.
pub fn display_lines(status: &StatusSnapshot) -> [String; 2] {
    [
        format!("T:{:.1}", status.current_temp),
        format!("S:{:.1} {}", status.setpoint, status.mode.as_str()),
    ]
}
