use prometheus::{Encoder, IntCounter, Opts, Registry, TextEncoder};

/// Tellere for analysekjøringer. Eget register per instans, ingen globale.
#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    segments_analyzed: IntCounter,
    segments_insufficient: IntCounter,
    segments_cancelled: IntCounter,
    unknown_exercises: IntCounter,
    reps_counted: IntCounter,
}

fn counter(registry: &Registry, name: &str, help: &str) -> prometheus::Result<IntCounter> {
    let c = IntCounter::with_opts(Opts::new(name, help))?;
    registry.register(Box::new(c.clone()))?;
    Ok(c)
}

impl Metrics {
    pub fn new() -> prometheus::Result<Self> {
        let registry = Registry::new();
        Ok(Self {
            segments_analyzed: counter(&registry, "liftgraph_segments_analyzed_total", "Segments analyzed")?,
            segments_insufficient: counter(
                &registry,
                "liftgraph_segments_insufficient_total",
                "Segments without usable pose data",
            )?,
            segments_cancelled: counter(&registry, "liftgraph_segments_cancelled_total", "Segments dropped by cancellation")?,
            unknown_exercises: counter(&registry, "liftgraph_unknown_exercises_total", "Exercise names with no catalog match")?,
            reps_counted: counter(&registry, "liftgraph_reps_counted_total", "Repetitions counted")?,
            registry,
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Prometheus tekstformat.
    pub fn render(&self) -> String {
        let mut buf = Vec::new();
        if let Err(e) = TextEncoder::new().encode(&self.registry.gather(), &mut buf) {
            log::warn!("metrics: encode feilet: {e}");
            return String::new();
        }
        String::from_utf8_lossy(&buf).into_owned()
    }
}

pub fn segments_analyzed_total(m: &Metrics) -> &IntCounter {
    &m.segments_analyzed
}

pub fn segments_insufficient_total(m: &Metrics) -> &IntCounter {
    &m.segments_insufficient
}

pub fn segments_cancelled_total(m: &Metrics) -> &IntCounter {
    &m.segments_cancelled
}

pub fn unknown_exercises_total(m: &Metrics) -> &IntCounter {
    &m.unknown_exercises
}

pub fn reps_counted_total(m: &Metrics) -> &IntCounter {
    &m.reps_counted
}
