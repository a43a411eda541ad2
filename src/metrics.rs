//! In-process statistics for a form session.
//!
//! Nothing here is persisted; the summary is logged when the session ends.

use crate::types::prediction::PredictionResult;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;
use std::time::{Duration, Instant};
use tracing::info;

/// Latency samples kept before the oldest half is discarded
const MAX_LATENCY_SAMPLES: usize = 10_000;

/// Metrics collector for one session
pub struct SessionMetrics {
    /// Successful predictions
    pub predictions: AtomicU64,
    /// Predictions labelled as churn
    pub churn_predicted: AtomicU64,
    /// Failed submissions by error kind
    failures: RwLock<HashMap<String, u64>>,
    /// Inference latencies (in microseconds)
    latencies: RwLock<Vec<u64>>,
    /// Churn probability distribution buckets
    probability_buckets: RwLock<[u64; 10]>,
    start_time: Instant,
}

impl SessionMetrics {
    pub fn new() -> Self {
        Self {
            predictions: AtomicU64::new(0),
            churn_predicted: AtomicU64::new(0),
            failures: RwLock::new(HashMap::new()),
            latencies: RwLock::new(Vec::with_capacity(64)),
            probability_buckets: RwLock::new([0; 10]),
            start_time: Instant::now(),
        }
    }

    /// Record a successful prediction
    pub fn record_prediction(&self, latency: Duration, result: &PredictionResult) {
        self.predictions.fetch_add(1, Ordering::Relaxed);
        if result.label {
            self.churn_predicted.fetch_add(1, Ordering::Relaxed);
        }

        if let Ok(mut latencies) = self.latencies.write() {
            latencies.push(latency.as_micros() as u64);
            if latencies.len() > MAX_LATENCY_SAMPLES {
                latencies.drain(0..MAX_LATENCY_SAMPLES / 2);
            }
        }

        let bucket = ((result.probability * 10.0) as usize).min(9);
        if let Ok(mut buckets) = self.probability_buckets.write() {
            buckets[bucket] += 1;
        }
    }

    /// Record a failed submission
    pub fn record_failure(&self, kind: &str) {
        if let Ok(mut failures) = self.failures.write() {
            *failures.entry(kind.to_string()).or_insert(0) += 1;
        }
    }

    /// Total failed submissions
    pub fn failure_count(&self) -> u64 {
        self.failures
            .read()
            .map(|f| f.values().sum::<u64>())
            .unwrap_or(0)
    }

    pub fn get_failures(&self) -> HashMap<String, u64> {
        self.failures.read().map(|f| f.clone()).unwrap_or_default()
    }

    /// Fraction of predictions labelled churn
    pub fn churn_rate(&self) -> f64 {
        let total = self.predictions.load(Ordering::Relaxed);
        if total == 0 {
            return 0.0;
        }
        self.churn_predicted.load(Ordering::Relaxed) as f64 / total as f64
    }

    /// Get latency statistics
    pub fn get_latency_stats(&self) -> LatencyStats {
        let mut sorted = match self.latencies.read() {
            Ok(latencies) if !latencies.is_empty() => latencies.clone(),
            _ => return LatencyStats::default(),
        };
        sorted.sort_unstable();

        let count = sorted.len();
        let sum: u64 = sorted.iter().sum();

        LatencyStats {
            count: count as u64,
            mean_us: sum / count as u64,
            p50_us: sorted[count / 2],
            p99_us: sorted[((count as f64 * 0.99) as usize).min(count - 1)],
            max_us: sorted[count - 1],
        }
    }

    pub fn get_probability_distribution(&self) -> [u64; 10] {
        self.probability_buckets
            .read()
            .map(|b| *b)
            .unwrap_or_default()
    }

    /// Log summary statistics
    pub fn print_summary(&self) {
        let predictions = self.predictions.load(Ordering::Relaxed);
        let failures = self.get_failures();
        let latency = self.get_latency_stats();

        info!(
            predictions,
            churn_predicted = self.churn_predicted.load(Ordering::Relaxed),
            churn_rate = format!("{:.1}%", self.churn_rate() * 100.0),
            failures = self.failure_count(),
            session_secs = self.start_time.elapsed().as_secs(),
            "Session summary"
        );
        info!(
            mean_us = latency.mean_us,
            p50_us = latency.p50_us,
            p99_us = latency.p99_us,
            max_us = latency.max_us,
            "Inference latency"
        );
        for (kind, count) in &failures {
            info!(kind = %kind, count, "Failed submissions");
        }

        let distribution = self.get_probability_distribution();
        let total: u64 = distribution.iter().sum();
        for (i, &count) in distribution.iter().enumerate().filter(|(_, c)| **c > 0) {
            let pct = (count as f64 / total as f64) * 100.0;
            info!(
                "  {:.1}-{:.1}: {:>4} ({:>5.1}%) {}",
                i as f64 / 10.0,
                (i + 1) as f64 / 10.0,
                count,
                pct,
                "█".repeat(((pct / 5.0) as usize).min(20))
            );
        }
    }
}

impl Default for SessionMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Inference latency statistics
#[derive(Debug, Default)]
pub struct LatencyStats {
    pub count: u64,
    pub mean_us: u64,
    pub p50_us: u64,
    pub p99_us: u64,
    pub max_us: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(label: bool, probability: f64) -> PredictionResult {
        PredictionResult { label, probability }
    }

    #[test]
    fn test_metrics_recording() {
        let metrics = SessionMetrics::new();

        metrics.record_prediction(Duration::from_micros(100), &result(false, 0.2));
        metrics.record_prediction(Duration::from_micros(300), &result(true, 0.8));
        metrics.record_failure("validation");
        metrics.record_failure("validation");
        metrics.record_failure("encoding");

        assert_eq!(metrics.predictions.load(Ordering::Relaxed), 2);
        assert_eq!(metrics.churn_predicted.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.churn_rate(), 0.5);
        assert_eq!(metrics.failure_count(), 3);
        assert_eq!(metrics.get_failures().get("validation"), Some(&2));

        let stats = metrics.get_latency_stats();
        assert_eq!(stats.count, 2);
        assert_eq!(stats.mean_us, 200);
        assert_eq!(stats.max_us, 300);
    }

    #[test]
    fn test_probability_buckets() {
        let metrics = SessionMetrics::new();
        metrics.record_prediction(Duration::ZERO, &result(false, 0.0));
        metrics.record_prediction(Duration::ZERO, &result(true, 1.0));
        metrics.record_prediction(Duration::ZERO, &result(true, 0.55));

        let dist = metrics.get_probability_distribution();
        assert_eq!(dist[0], 1);
        assert_eq!(dist[5], 1);
        assert_eq!(dist[9], 1);
    }

    #[test]
    fn test_latency_samples_are_capped() {
        let metrics = SessionMetrics::new();
        for i in 0..=MAX_LATENCY_SAMPLES as u64 {
            metrics.record_prediction(Duration::from_micros(i), &result(false, 0.1));
        }

        let stats = metrics.get_latency_stats();
        assert_eq!(stats.count, (MAX_LATENCY_SAMPLES / 2 + 1) as u64);
        assert_eq!(stats.max_us, MAX_LATENCY_SAMPLES as u64);
        assert_eq!(
            metrics.predictions.load(Ordering::Relaxed),
            MAX_LATENCY_SAMPLES as u64 + 1
        );
    }

    #[test]
    fn test_empty_session() {
        let metrics = SessionMetrics::new();
        assert_eq!(metrics.churn_rate(), 0.0);
        assert_eq!(metrics.get_latency_stats().count, 0);
        metrics.print_summary();
    }
}
