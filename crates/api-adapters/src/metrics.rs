//! Prometheus counters for availability checks and booking outcomes.

use std::fmt;

use prometheus_client::encoding::text::encode;
use prometheus_client::encoding::EncodeLabelSet;
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::family::Family;
use prometheus_client::registry::Registry;

/// Which availability question was asked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckScope {
    /// One room (the JSON endpoint).
    Room,
    /// Every room (the search page).
    AllRooms,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckResult {
    Available,
    Unavailable,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingOutcome {
    Committed,
    /// Lost the race for the room.
    Conflict,
    Invalid,
    Error,
}

#[derive(Debug, Clone, Hash, PartialEq, Eq, EncodeLabelSet)]
struct CheckLabels {
    scope: &'static str,
    result: &'static str,
}

#[derive(Debug, Clone, Hash, PartialEq, Eq, EncodeLabelSet)]
struct BookingLabels {
    outcome: &'static str,
}

pub struct Metrics {
    registry: Registry,
    availability_checks: Family<CheckLabels, Counter>,
    bookings: Family<BookingLabels, Counter>,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub fn new() -> Self {
        let mut registry = Registry::default();
        let availability_checks = Family::<CheckLabels, Counter>::default();
        let bookings = Family::<BookingLabels, Counter>::default();
        registry.register(
            "availability_checks",
            "Availability questions answered",
            availability_checks.clone(),
        );
        registry.register("bookings", "Booking attempts by outcome", bookings.clone());
        Self {
            registry,
            availability_checks,
            bookings,
        }
    }

    pub fn record_check(&self, scope: CheckScope, result: CheckResult) {
        let scope = match scope {
            CheckScope::Room => "room",
            CheckScope::AllRooms => "all_rooms",
        };
        let result = match result {
            CheckResult::Available => "available",
            CheckResult::Unavailable => "unavailable",
            CheckResult::Error => "error",
        };
        self.availability_checks
            .get_or_create(&CheckLabels { scope, result })
            .inc();
    }

    pub fn record_booking(&self, outcome: BookingOutcome) {
        let outcome = match outcome {
            BookingOutcome::Committed => "committed",
            BookingOutcome::Conflict => "conflict",
            BookingOutcome::Invalid => "invalid",
            BookingOutcome::Error => "error",
        };
        self.bookings.get_or_create(&BookingLabels { outcome }).inc();
    }

    /// OpenMetrics text exposition.
    pub fn encode(&self) -> Result<String, fmt::Error> {
        let mut body = String::new();
        encode(&mut body, &self.registry)?;
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_show_up_with_labels() {
        let metrics = Metrics::new();
        metrics.record_check(CheckScope::Room, CheckResult::Unavailable);
        metrics.record_check(CheckScope::Room, CheckResult::Unavailable);
        metrics.record_booking(BookingOutcome::Conflict);

        let text = metrics.encode().unwrap();
        assert!(text.contains(r#"availability_checks_total{scope="room",result="unavailable"} 2"#));
        assert!(text.contains(r#"bookings_total{outcome="conflict"} 1"#));
        assert!(text.ends_with("# EOF\n"));
    }
}
