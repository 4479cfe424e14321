use prometheus::{
    Encoder, Gauge, GaugeVec, CounterVec, Opts, Registry, TextEncoder,
    register_gauge_with_registry, register_gauge_vec_with_registry,
    register_counter_vec_with_registry,
};
use lazy_static::lazy_static;
use std::sync::Arc;

use crate::models::Sample;
use crate::services::sampler::SamplerState;

pub struct MetricsRegistry {
    registry: Registry,

    // Gauge metrics
    pub sessions_open: Gauge,
    pub session_cpu_percent: GaugeVec,
    pub session_memory_percent: GaugeVec,
    pub session_elapsed_seconds: GaugeVec,

    // Counter metrics
    pub samples_total: CounterVec,
    pub sessions_ended_total: CounterVec,
    pub kills_total: CounterVec,
    pub enumerations_total: CounterVec,
}

impl MetricsRegistry {
    pub fn new() -> Self {
        let registry = Registry::new();

        // 会话相关指标的通用标签
        let session_labels = &["pid", "name"];

        // Gauge metrics
        let sessions_open = register_gauge_with_registry!(
            Opts::new("procwatch_sessions_open", "Number of running sampler sessions"),
            registry
        ).unwrap();

        let session_cpu_percent = register_gauge_vec_with_registry!(
            Opts::new("procwatch_session_cpu_percent", "Last sampled CPU usage percentage"),
            session_labels,
            registry
        ).unwrap();

        let session_memory_percent = register_gauge_vec_with_registry!(
            Opts::new("procwatch_session_memory_percent", "Last sampled memory usage percentage"),
            session_labels,
            registry
        ).unwrap();

        let session_elapsed_seconds = register_gauge_vec_with_registry!(
            Opts::new("procwatch_session_elapsed_seconds", "Seconds since the session started sampling"),
            session_labels,
            registry
        ).unwrap();

        // Counter metrics
        let samples_total = register_counter_vec_with_registry!(
            Opts::new("procwatch_samples_total", "Samples appended to session buffers"),
            session_labels,
            registry
        ).unwrap();

        let sessions_ended_total = register_counter_vec_with_registry!(
            Opts::new("procwatch_sessions_ended_total", "Sampler sessions ended, by final state"),
            &["state"],
            registry
        ).unwrap();

        let kills_total = register_counter_vec_with_registry!(
            Opts::new("procwatch_kills_total", "Process termination requests, by outcome"),
            &["outcome"],
            registry
        ).unwrap();

        let enumerations_total = register_counter_vec_with_registry!(
            Opts::new("procwatch_enumerations_total", "Process table enumerations"),
            &["filtered"],
            registry
        ).unwrap();

        Self {
            registry,
            sessions_open,
            session_cpu_percent,
            session_memory_percent,
            session_elapsed_seconds,
            samples_total,
            sessions_ended_total,
            kills_total,
            enumerations_total,
        }
    }

    pub fn render(&self) -> Result<String, Box<dyn std::error::Error>> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }

    pub fn record_sample(&self, pid: &str, name: &str, sample: &Sample) {
        let labels = &[pid, name];
        self.session_cpu_percent.with_label_values(labels).set(sample.cpu);
        self.session_memory_percent.with_label_values(labels).set(sample.mem);
        self.session_elapsed_seconds.with_label_values(labels).set(sample.t);
        self.samples_total.with_label_values(labels).inc();
    }

    pub fn record_session_end(&self, state: SamplerState) {
        let state = state.to_string();
        self.sessions_ended_total
            .with_label_values(&[state.as_str()])
            .inc();
    }

    pub fn record_kill(&self, outcome: &str) {
        self.kills_total.with_label_values(&[outcome]).inc();
    }

    pub fn reset_session_metrics(&self, pid: &str, name: &str) {
        // 会话关闭后删除该进程的 metrics
        let labels = &[pid, name];

        let _ = self.session_cpu_percent.remove_label_values(labels);
        let _ = self.session_memory_percent.remove_label_values(labels);
        let _ = self.session_elapsed_seconds.remove_label_values(labels);
        let _ = self.samples_total.remove_label_values(labels);
    }
}

impl Default for MetricsRegistry {
    fn default() -> Self {
        Self::new()
    }
}

lazy_static! {
    pub static ref METRICS: Arc<MetricsRegistry> = Arc::new(MetricsRegistry::new());
}
