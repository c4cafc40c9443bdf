//! Pipeline statistics.

use std::time::Duration;

use dispatcher::MetricsSnapshot;

/// Statistics from a pipeline run
#[derive(Debug, Clone, Default)]
pub struct PipelineStats {
    /// Total duration of the run
    pub duration: Duration,

    /// Address the HTTP front-end listened on
    pub listen_address: String,

    /// Sources configured at shutdown
    pub active_sources: usize,

    /// Per-sink counters for the sinks active at shutdown
    pub sinks: Vec<(String, MetricsSnapshot)>,

    /// SIGHUP reloads applied
    pub reloads_applied: u64,

    /// SIGHUP reloads rejected (running configuration kept)
    pub reloads_failed: u64,

    /// `dispatcher.stop()` exceeded `shutdown_timeout_secs`
    pub drain_timed_out: bool,
}

impl PipelineStats {
    pub fn delivered(&self) -> u64 {
        self.sinks.iter().map(|(_, m)| m.delivered_count).sum()
    }

    pub fn failed(&self) -> u64 {
        self.sinks.iter().map(|(_, m)| m.failure_count).sum()
    }

    /// Failed deliveries as a percentage of processed ones
    pub fn failure_rate(&self) -> f64 {
        let total = self.delivered() + self.failed();
        if total > 0 {
            (self.failed() as f64 / total as f64) * 100.0
        } else {
            0.0
        }
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║                    Informer Statistics                       ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");

        println!("📊 Overview");
        println!("   ├─ Duration: {:.2}s", self.duration.as_secs_f64());
        println!("   ├─ Listen address: {}", self.listen_address);
        println!("   ├─ Sources: {}", self.active_sources);
        println!("   ├─ Sinks: {}", self.sinks.len());
        println!(
            "   ├─ Reloads: {} applied, {} rejected",
            self.reloads_applied, self.reloads_failed
        );
        println!(
            "   └─ Deliveries: {} ok, {} failed ({:.2}%)",
            self.delivered(),
            self.failed(),
            self.failure_rate()
        );

        if !self.sinks.is_empty() {
            println!("\n📬 Sinks");
            for (i, (name, metrics)) in self.sinks.iter().enumerate() {
                let prefix = if i == self.sinks.len() - 1 { "└─" } else { "├─" };
                println!(
                    "   {} {}: {} enqueued, {} delivered, {} failed",
                    prefix,
                    name,
                    metrics.enqueued_count,
                    metrics.delivered_count,
                    metrics.failure_count
                );
            }
        }

        if self.drain_timed_out {
            println!("\n⚠️  Sinks did not finish draining before the shutdown timeout");
        }

        println!();
    }
}
