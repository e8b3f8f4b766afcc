use crate::ports::StoreError;

/// Gate that opens at most once per `interval_ms`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Throttle {
    interval_ms: u64,
    last_ms: Option<u64>,
}

impl Throttle {
    pub fn new(interval_ms: u64) -> Self {
        Self {
            interval_ms,
            last_ms: None,
        }
    }

    pub fn last_ms(&self) -> Option<u64> {
        self.last_ms
    }

    pub fn is_ready(&self, now_ms: u64) -> bool {
        self.last_ms
            .map(|last| now_ms.saturating_sub(last) >= self.interval_ms)
            .unwrap_or(true)
    }

    pub fn mark(&mut self, now_ms: u64) {
        self.last_ms = Some(now_ms);
    }

    /// Marks and returns `true` when the gate is open.
    pub fn try_acquire(&mut self, now_ms: u64) -> bool {
        if self.is_ready(now_ms) {
            self.mark(now_ms);
            true
        } else {
            false
        }
    }

    /// Earliest time the gate opens again.
    pub fn next_ready_ms(&self) -> Option<u64> {
        self.last_ms.map(|last| last.saturating_add(self.interval_ms))
    }
}

/// The two independent timers gating remote reads and local edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncClock {
    pub remote_read: Throttle,
    pub local_edit: Throttle,
}

impl SyncClock {
    pub fn new(remote_read_interval_ms: u64, edit_debounce_ms: u64) -> Self {
        Self {
            remote_read: Throttle::new(remote_read_interval_ms),
            local_edit: Throttle::new(edit_debounce_ms),
        }
    }
}

/// Outcome of comparing a remote setpoint against the local one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Reconciliation {
    /// Within tolerance of the local value; nothing to do.
    Unchanged,
    /// Remote differs; adopt it locally without writing it back.
    Adopt(f32),
}

pub fn reconcile(local_c: f32, remote_c: f32, epsilon_c: f32) -> Reconciliation {
    if (remote_c - local_c).abs() > epsilon_c {
        Reconciliation::Adopt(remote_c)
    } else {
        Reconciliation::Unchanged
    }
}

/// Parses the setpoint document. The store may hand back a bare number or a
/// JSON string (`"42.5"`); anything else, including `null`, is rejected.
pub fn parse_setpoint_payload(body: &str) -> Result<f32, StoreError> {
    let trimmed = body.trim();
    let unquoted = trimmed
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
        .unwrap_or(trimmed)
        .trim();

    let value = unquoted
        .parse::<f32>()
        .map_err(|_| StoreError::Malformed(format!("not a number: {trimmed:?}")))?;

    if value.is_finite() {
        Ok(value)
    } else {
        Err(StoreError::Malformed(format!("non-finite setpoint: {trimmed:?}")))
    }
}

/// Body of a setpoint write: plain decimal with two fractional digits.
pub fn format_setpoint(setpoint_c: f32) -> String {
    format!("{setpoint_c:.2}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn throttle_opens_once_per_interval() {
        let mut throttle = Throttle::new(5_000);

        assert!(throttle.try_acquire(0));
        assert!(!throttle.try_acquire(4_999));
        assert!(throttle.try_acquire(5_000));
        assert_eq!(throttle.next_ready_ms(), Some(10_000));
    }

    #[test]
    fn throttle_is_open_before_first_use() {
        let throttle = Throttle::new(150);

        assert!(throttle.is_ready(0));
        assert_eq!(throttle.next_ready_ms(), None);
    }

    #[test]
    fn sync_clock_timers_are_independent() {
        let mut clock = SyncClock::new(5_000, 150);
        clock.remote_read.mark(1_000);

        assert!(clock.local_edit.try_acquire(1_000));
        assert!(!clock.remote_read.is_ready(1_000));
        assert!(clock.local_edit.try_acquire(1_150));
    }

    #[test]
    fn reconcile_discards_values_within_tolerance() {
        assert_eq!(reconcile(50.0, 50.0, 0.001), Reconciliation::Unchanged);
        assert_eq!(reconcile(50.0, 50.000_5, 0.001), Reconciliation::Unchanged);
        assert_eq!(reconcile(50.0, 51.0, 0.001), Reconciliation::Adopt(51.0));
        assert_eq!(reconcile(50.0, 49.99, 0.001), Reconciliation::Adopt(49.99));
    }

    #[test]
    fn parses_bare_and_quoted_numbers() {
        assert_eq!(parse_setpoint_payload("30"), Ok(30.0));
        assert_eq!(parse_setpoint_payload("30.0\n"), Ok(30.0));
        assert_eq!(parse_setpoint_payload("\"42.5\""), Ok(42.5));
        assert_eq!(parse_setpoint_payload(" \" 18.25 \" "), Ok(18.25));
        assert_eq!(parse_setpoint_payload("-4"), Ok(-4.0));
    }

    #[test]
    fn rejects_malformed_payloads() {
        for body in ["", "null", "\"\"", "{\"setpoint\":40}", "abc", "NaN", "inf"] {
            assert!(
                matches!(parse_setpoint_payload(body), Err(StoreError::Malformed(_))),
                "accepted {body:?}"
            );
        }
    }

    #[test]
    fn formats_two_fractional_digits() {
        assert_eq!(format_setpoint(51.0), "51.00");
        assert_eq!(format_setpoint(49.126), "49.13");
        assert_eq!(format_setpoint(-3.5), "-3.50");
    }
}
