//! Request metrics and statistics tracking for the prediction pipeline.

use crate::types::prediction::RiskLabel;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};
use tracing::info;

/// Latency samples kept per series
const MAX_SAMPLES: usize = 10_000;

/// Pipeline stages timed separately
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Inference,
    Attribution,
    Render,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Inference => "inference",
            Stage::Attribution => "attribution",
            Stage::Render => "render",
        }
    }
}

/// Metrics collector for the prediction pipeline
pub struct PipelineMetrics {
    /// Predictions that produced a report
    pub predictions_served: AtomicU64,
    pub high_risk: AtomicU64,
    pub low_risk: AtomicU64,
    /// Failed runs by error kind
    failures: RwLock<HashMap<&'static str, u64>>,
    /// End-to-end run times (in microseconds)
    run_times: RwLock<Vec<u64>>,
    /// Per-stage times (in microseconds)
    stage_times: RwLock<HashMap<Stage, Vec<u64>>>,
    /// Risk probability distribution buckets
    probability_buckets: RwLock<[u64; 10]>,
    start_time: Instant,
}

fn push_sample(samples: &mut Vec<u64>, duration: Duration) {
    samples.push(duration.as_micros() as u64);
    if samples.len() > MAX_SAMPLES {
        samples.drain(0..MAX_SAMPLES / 2);
    }
}

impl PipelineMetrics {
    pub fn new() -> Self {
        Self {
            predictions_served: AtomicU64::new(0),
            high_risk: AtomicU64::new(0),
            low_risk: AtomicU64::new(0),
            failures: RwLock::new(HashMap::new()),
            run_times: RwLock::new(Vec::with_capacity(1000)),
            stage_times: RwLock::new(HashMap::new()),
            probability_buckets: RwLock::new([0; 10]),
            start_time: Instant::now(),
        }
    }

    /// Record a successful pipeline run
    pub fn record_prediction(&self, run_time: Duration, probability: f64, label: RiskLabel) {
        self.predictions_served.fetch_add(1, Ordering::Relaxed);
        match label {
            RiskLabel::High => self.high_risk.fetch_add(1, Ordering::Relaxed),
            RiskLabel::Low => self.low_risk.fetch_add(1, Ordering::Relaxed),
        };

        if let Ok(mut times) = self.run_times.write() {
            push_sample(&mut times, run_time);
        }

        let bucket = (probability.clamp(0.0, 1.0) * 10.0).min(9.0) as usize;
        if let Ok(mut buckets) = self.probability_buckets.write() {
            buckets[bucket] += 1;
        }
    }

    /// Record a failed run
    pub fn record_failure(&self, kind: &'static str) {
        if let Ok(mut failures) = self.failures.write() {
            *failures.entry(kind).or_insert(0) += 1;
        }
    }

    /// Record the time spent in one stage
    pub fn record_stage(&self, stage: Stage, duration: Duration) {
        if let Ok(mut times) = self.stage_times.write() {
            push_sample(times.entry(stage).or_default(), duration);
        }
    }

    pub fn get_run_stats(&self) -> LatencyStats {
        self.run_times
            .read()
            .map(|times| LatencyStats::from_samples(&times))
            .unwrap_or_default()
    }

    pub fn get_stage_stats(&self) -> HashMap<Stage, LatencyStats> {
        self.stage_times
            .read()
            .map(|times| {
                times
                    .iter()
                    .filter(|(_, samples)| !samples.is_empty())
                    .map(|(stage, samples)| (*stage, LatencyStats::from_samples(samples)))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn get_failures(&self) -> HashMap<&'static str, u64> {
        self.failures.read().map(|f| f.clone()).unwrap_or_default()
    }

    pub fn total_failures(&self) -> u64 {
        self.get_failures().values().sum()
    }

    /// Predictions per second since start
    pub fn get_throughput(&self) -> f64 {
        let elapsed = self.start_time.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            self.predictions_served.load(Ordering::Relaxed) as f64 / elapsed
        } else {
            0.0
        }
    }

    pub fn get_probability_distribution(&self) -> [u64; 10] {
        self.probability_buckets.read().map(|b| *b).unwrap_or([0; 10])
    }

    /// Log summary statistics
    pub fn print_summary(&self) {
        let served = self.predictions_served.load(Ordering::Relaxed);
        let high = self.high_risk.load(Ordering::Relaxed);
        let low = self.low_risk.load(Ordering::Relaxed);
        let high_rate = if served > 0 {
            (high as f64 / served as f64) * 100.0
        } else {
            0.0
        };

        let runs = self.get_run_stats();
        let failures = self.get_failures();
        let distribution = self.get_probability_distribution();

        info!("╔══════════════════════════════════════════════════════════════╗");
        info!("║              RISK EXPLAINER - METRICS SUMMARY                ║");
        info!("╠══════════════════════════════════════════════════════════════╣");
        info!(
            "║ Predictions Served:  {:>8}  │  Throughput: {:>7.2} req/s ║",
            served,
            self.get_throughput()
        );
        info!(
            "║ High Risk: {:>8}  Low Risk: {:>8}  │  High: {:>5.1}%    ║",
            high, low, high_rate
        );
        info!("╠══════════════════════════════════════════════════════════════╣");
        info!(
            "║ Run Time (μs): mean={:>7} p50={:>7} p95={:>7} p99={:>7} ║",
            runs.mean_us, runs.p50_us, runs.p95_us, runs.p99_us
        );
        let mut stages: Vec<(Stage, LatencyStats)> = self.get_stage_stats().into_iter().collect();
        stages.sort_by_key(|(stage, _)| stage.as_str());
        for (stage, stats) in &stages {
            info!(
                "║   {:12}: mean={:>7} p50={:>7} p99={:>7}             ║",
                stage.as_str(),
                stats.mean_us,
                stats.p50_us,
                stats.p99_us
            );
        }
        if !failures.is_empty() {
            info!("╠══════════════════════════════════════════════════════════════╣");
            info!("║ Failures by Kind:                                            ║");
            for (kind, count) in &failures {
                info!("║   {:14}: {:>6}                                      ║", kind, count);
            }
        }
        info!("╠══════════════════════════════════════════════════════════════╣");
        info!("║ Risk Probability Distribution:                               ║");
        let total: u64 = distribution.iter().sum();
        for (i, &count) in distribution.iter().enumerate() {
            let pct = if total > 0 { (count as f64 / total as f64) * 100.0 } else { 0.0 };
            let bar: String = "█".repeat(((pct / 2.0) as usize).min(20));
            info!(
                "║   {:.1}-{:.1}: {:>6} ({:>5.1}%) {}",
                i as f64 / 10.0,
                (i + 1) as f64 / 10.0,
                count,
                pct,
                bar
            );
        }
        info!("╚══════════════════════════════════════════════════════════════╝");
    }
}

impl Default for PipelineMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Latency statistics over a sample window
#[derive(Debug, Default, Clone, PartialEq)]
pub struct LatencyStats {
    pub count: u64,
    pub mean_us: u64,
    pub p50_us: u64,
    pub p95_us: u64,
    pub p99_us: u64,
    pub max_us: u64,
}

impl LatencyStats {
    fn from_samples(samples: &[u64]) -> Self {
        if samples.is_empty() {
            return Self::default();
        }

        let mut sorted = samples.to_vec();
        sorted.sort_unstable();

        let count = sorted.len();
        let sum: u64 = sorted.iter().sum();
        let at = |q: f64| sorted[((count as f64 * q) as usize).min(count - 1)];

        Self {
            count: count as u64,
            mean_us: sum / count as u64,
            p50_us: sorted[count / 2],
            p95_us: at(0.95),
            p99_us: at(0.99),
            max_us: sorted[count - 1],
        }
    }
}

/// Periodic metrics reporter
pub struct MetricsReporter {
    metrics: Arc<PipelineMetrics>,
    interval_secs: u64,
}

impl MetricsReporter {
    pub fn new(metrics: Arc<PipelineMetrics>, interval_secs: u64) -> Self {
        Self {
            metrics,
            interval_secs,
        }
    }

    /// Log a summary every interval. Returns immediately when the interval is 0.
    pub async fn start(self) {
        if self.interval_secs == 0 {
            return;
        }
        let mut interval = tokio::time::interval(Duration::from_secs(self.interval_secs));
        // The first tick completes immediately
        interval.tick().await;
        loop {
            interval.tick().await;
            self.metrics.print_summary();
        }
    }
}
