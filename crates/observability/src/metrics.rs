//! Run metrics: counters the orchestrator updates as a run progresses and
//! reads back for its stdout summary (spec §7).

use prometheus::{IntCounter, Opts, Registry};

#[derive(Debug)]
pub struct RunMetrics {
    pub sources_checked: IntCounter,
    pub sources_changed: IntCounter,
    pub boundaries_updated: IntCounter,
    pub validation_rejected: IntCounter,
    pub validation_reviewed: IntCounter,
    pub errors_total: IntCounter,
    registry: Registry,
}

impl RunMetrics {
    pub fn new() -> Self {
        let registry = Registry::new();
        let metrics = Self {
            sources_checked: counter("shadow_atlas_sources_checked_total", "Sources examined by change detection"),
            sources_changed: counter("shadow_atlas_sources_changed_total", "Sources whose change detector flagged a change"),
            boundaries_updated: counter("shadow_atlas_boundaries_updated_total", "Boundaries whose head pointer was updated"),
            validation_rejected: counter("shadow_atlas_validation_rejected_total", "Downloaded payloads rejected by the validator"),
            validation_reviewed: counter("shadow_atlas_validation_reviewed_total", "Downloaded payloads routed to review staging"),
            errors_total: counter("shadow_atlas_errors_total", "Per-source errors accumulated during a run"),
            registry,
        };
        for c in [
            &metrics.sources_checked,
            &metrics.sources_changed,
            &metrics.boundaries_updated,
            &metrics.validation_rejected,
            &metrics.validation_reviewed,
            &metrics.errors_total,
        ] {
            metrics
                .registry
                .register(Box::new(c.clone()))
                .expect("metric names are unique within this registry");
        }
        metrics
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}

impl Default for RunMetrics {
    fn default() -> Self {
        Self::new()
    }
}

fn counter(name: &str, help: &str) -> IntCounter {
    IntCounter::with_opts(Opts::new(name, help)).expect("static metric metadata is well-formed")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_start_at_zero_and_increment() {
        let metrics = RunMetrics::new();
        assert_eq!(metrics.sources_checked.get(), 0);
        metrics.sources_checked.inc();
        metrics.sources_checked.inc_by(4);
        assert_eq!(metrics.sources_checked.get(), 5);
    }
}
