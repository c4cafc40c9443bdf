//! Event flow metrics
//!
//! Thin wrappers over the `metrics` facade so metric names live in one place.
//! Without an installed recorder every call is a no-op.

use contracts::EventType;
use metrics::{counter, gauge};

/// Record an event accepted from a source
pub fn record_event_received(source: &str, event_type: EventType) {
    counter!(
        "informer_events_received_total",
        "source" => source.to_string(),
        "event_type" => event_type.as_str()
    )
    .increment(1);
}

/// Record an inbound request a source could not turn into an event
pub fn record_event_rejected(source: &str) {
    counter!(
        "informer_events_rejected_total",
        "source" => source.to_string()
    )
    .increment(1);
}

/// Record one sink's processing outcome
pub fn record_event_processed(sink_name: &str, success: bool) {
    let status = if success { "success" } else { "failure" };
    counter!(
        "informer_events_processed_total",
        "sink" => sink_name.to_string(),
        "status" => status
    )
    .increment(1);
}

/// Record a sink's queue depth
pub fn record_sink_queue_depth(sink_name: &str, depth: usize) {
    gauge!(
        "informer_sink_queue_depth",
        "sink" => sink_name.to_string()
    )
    .set(depth as f64);
}

/// Record the size of the active sink set after a reconfiguration
pub fn record_active_sinks(count: usize) {
    gauge!("informer_active_sinks").set(count as f64);
}

/// Record a retired sink worker being scheduled for shutdown
pub fn record_sink_retired(sink_name: &str) {
    counter!(
        "informer_sinks_retired_total",
        "sink" => sink_name.to_string()
    )
    .increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_without_recorder_is_noop() {
        record_event_received("radarr", EventType::ObjectAdded);
        record_event_rejected("radarr");
        record_event_processed("log", true);
        record_event_processed("log", false);
        record_sink_queue_depth("log", 3);
        record_active_sinks(2);
        record_sink_retired("log");
    }
}
