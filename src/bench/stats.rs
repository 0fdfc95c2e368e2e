//! Latency accumulator dan report akhir
//!
//! Sample individual tidak disimpan: hanya count, sum, min, max.

use std::fmt;
use std::time::Duration;

/// Running latency statistics
///
/// `min` dimulai dari `Duration::MAX` supaya sample pertama selalu menang.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LatencyStats {
    count: u64,
    sum: Duration,
    min: Duration,
    max: Duration,
}

impl Default for LatencyStats {
    fn default() -> Self {
        Self::new()
    }
}

impl LatencyStats {
    pub fn new() -> Self {
        Self {
            count: 0,
            sum: Duration::ZERO,
            min: Duration::MAX,
            max: Duration::ZERO,
        }
    }

    #[inline(always)]
    pub fn record(&mut self, latency: Duration) {
        self.count += 1;
        self.sum += latency;
        self.min = self.min.min(latency);
        self.max = self.max.max(latency);
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn sum(&self) -> Duration {
        self.sum
    }

    pub fn min(&self) -> Option<Duration> {
        (self.count > 0).then_some(self.min)
    }

    pub fn max(&self) -> Option<Duration> {
        (self.count > 0).then_some(self.max)
    }

    /// sum / count
    pub fn mean(&self) -> Option<Duration> {
        if self.count == 0 {
            return None;
        }
        let nanos = self.sum.as_nanos() / self.count as u128;
        Some(Duration::from_nanos(nanos as u64))
    }
}

impl Extend<Duration> for LatencyStats {
    fn extend<I: IntoIterator<Item = Duration>>(&mut self, iter: I) {
        for latency in iter {
            self.record(latency);
        }
    }
}

impl FromIterator<Duration> for LatencyStats {
    fn from_iter<I: IntoIterator<Item = Duration>>(iter: I) -> Self {
        let mut stats = Self::new();
        stats.extend(iter);
        stats
    }
}

/// Hasil satu run benchmark
#[derive(Debug, Clone, PartialEq)]
pub struct BenchReport {
    /// Wall-clock fase measurement (bukan jumlah latency)
    pub total: Duration,
    pub messages: u64,
    pub min: Duration,
    pub max: Duration,
    pub avg: Duration,
    /// messages / total detik
    pub qps: f64,
}

impl BenchReport {
    pub fn from_stats(stats: &LatencyStats, total: Duration) -> Self {
        let secs = total.as_secs_f64();
        let qps = if secs > 0.0 {
            stats.count() as f64 / secs
        } else {
            0.0
        };

        Self {
            total,
            messages: stats.count(),
            min: stats.min().unwrap_or(Duration::ZERO),
            max: stats.max().unwrap_or(Duration::ZERO),
            avg: stats.mean().unwrap_or(Duration::ZERO),
            qps,
        }
    }
}

fn micros(d: Duration) -> f64 {
    d.as_nanos() as f64 / 1000.0
}

impl fmt::Display for BenchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "📊 RESULTS")?;
        writeln!(f, "==========")?;
        writeln!(
            f,
            "  Total duration:  {:.3} ms",
            self.total.as_secs_f64() * 1000.0
        )?;
        writeln!(f, "  Total messages:  {}", self.messages)?;
        writeln!(f, "\nLatency (round trip):")?;
        writeln!(f, "  Min:             {:.2} μs", micros(self.min))?;
        writeln!(f, "  Max:             {:.2} μs", micros(self.max))?;
        writeln!(f, "  Avg:             {:.2} μs", micros(self.avg))?;
        write!(f, "\n  QPS:             {:.2}", self.qps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn us(v: u64) -> Duration {
        Duration::from_micros(v)
    }

    #[test]
    fn test_accumulates_synthetic_samples() {
        let samples = [us(120), us(80), us(300), us(95), us(105)];
        let stats: LatencyStats = samples.iter().copied().collect();

        assert_eq!(stats.count(), 5);
        assert_eq!(stats.min(), Some(us(80)));
        assert_eq!(stats.max(), Some(us(300)));
        assert_eq!(stats.sum(), us(700));
        assert_eq!(stats.mean(), Some(us(140)));
    }

    #[test]
    fn test_empty_stats() {
        let stats = LatencyStats::new();
        assert_eq!(stats.count(), 0);
        assert_eq!(stats.min(), None);
        assert_eq!(stats.max(), None);
        assert_eq!(stats.mean(), None);
    }

    #[test]
    fn test_single_sample_is_min_and_max() {
        let mut stats = LatencyStats::new();
        stats.record(us(42));
        assert_eq!(stats.min(), Some(us(42)));
        assert_eq!(stats.max(), Some(us(42)));
    }

    #[test]
    fn test_qps_uses_wall_clock_not_latency_sum() {
        let stats: LatencyStats = [us(100), us(100), us(100), us(100)].into_iter().collect();

        // Wall clock lebih panjang dari jumlah latency (overhead loop)
        let report = BenchReport::from_stats(&stats, Duration::from_millis(2));

        assert_eq!(report.messages, 4);
        assert_eq!(report.avg, us(100));
        assert!((report.qps - 2000.0).abs() < 1e-6);
        assert!((report.qps - 4.0 / stats.sum().as_secs_f64()).abs() > 1.0);
    }

    #[test]
    fn test_zero_duration_does_not_divide_by_zero() {
        let stats: LatencyStats = [Duration::ZERO].into_iter().collect();
        let report = BenchReport::from_stats(&stats, Duration::ZERO);
        assert_eq!(report.qps, 0.0);
    }

    #[test]
    fn test_report_display_lists_all_fields() {
        let stats: LatencyStats = [us(10), us(30)].into_iter().collect();
        let text = BenchReport::from_stats(&stats, Duration::from_millis(1)).to_string();

        assert!(text.contains("Total duration:"));
        assert!(text.contains("Total messages:  2"));
        assert!(text.contains("Min:             10.00 μs"));
        assert!(text.contains("Max:             30.00 μs"));
        assert!(text.contains("Avg:             20.00 μs"));
        assert!(text.contains("QPS:             2000.00"));
    }
}
