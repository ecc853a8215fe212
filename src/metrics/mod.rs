mod buffer;
pub mod probe;

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

pub use buffer::{BoundedBuffer, Timestamped};
pub use probe::{CpuUsage, MemoryUsage, ProcessProbe, ResourceProbe};

pub const MEMORY_SAMPLE_INTERVAL: Duration = Duration::from_secs(30);
pub const CPU_SAMPLE_INTERVAL: Duration = Duration::from_secs(60);
/// How often the composition root should call [`MetricsSampler::cleanup`].
pub const CLEANUP_INTERVAL: Duration = Duration::from_secs(30 * 60);

const MEMORY_CAPACITY: usize = 100;
const CPU_CAPACITY: usize = 60;
const CONNECTION_EVENT_CAPACITY: usize = 200;

const MIB: u64 = 1024 * 1024;
const HIGH_MEMORY_WARNING_BYTES: u64 = 200 * MIB;
const HIGH_MEMORY_DEGRADED_BYTES: u64 = 250 * MIB;
const LEAK_PEAK_TO_MEAN_RATIO: f64 = 1.5;
const CONNECTION_ERROR_RATIO: f64 = 0.1;
const DEGRADED_ERROR_COUNT: usize = 5;

const SAMPLE_RETENTION_HOURS: i64 = 1;
const CONNECTION_EVENT_RETENTION_HOURS: i64 = 2;
const RECENT_WINDOW_HOURS: i64 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemorySample {
    pub timestamp: DateTime<Utc>,
    pub heap_used: u64,
    pub heap_total: u64,
    pub resident_set_size: u64,
    pub external: u64,
}

impl MemorySample {
    pub fn new(timestamp: DateTime<Utc>, usage: MemoryUsage) -> Self {
        Self {
            timestamp,
            heap_used: usage.heap_used,
            heap_total: usage.heap_total,
            resident_set_size: usage.resident_set_size,
            external: usage.external,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CpuSample {
    pub timestamp: DateTime<Utc>,
    pub user_micros: u64,
    pub system_micros: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionEventKind {
    Connect,
    Disconnect,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionEvent {
    pub timestamp: DateTime<Utc>,
    pub kind: ConnectionEventKind,
    pub subject_id: String,
}

impl Timestamped for MemorySample {
    fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

impl Timestamped for CpuSample {
    fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

impl Timestamped for ConnectionEvent {
    fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

pub type ErrorTally = BTreeMap<String, u64>;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MemoryStatistics {
    pub current: MemorySample,
    pub peak: MemorySample,
    /// Mean heap used across the retained window, in bytes.
    pub average_heap_used: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConnectionStatistics {
    /// Events still retained, not a lifetime total.
    pub total_events: usize,
    pub last_hour_events: usize,
    pub connects: usize,
    pub disconnects: usize,
    pub errors: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DataPoints {
    pub memory: usize,
    pub cpu: usize,
    pub connections: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PerformanceReport {
    pub uptime: Duration,
    pub memory: Option<MemoryStatistics>,
    pub connections: ConnectionStatistics,
    pub errors: ErrorTally,
    pub running: bool,
    pub data_points: DataPoints,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DegradationVerdict {
    pub high_memory: bool,
    pub possible_leak: bool,
    pub connection_trouble: bool,
    pub degraded: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PruneSummary {
    pub memory: usize,
    pub cpu: usize,
    pub connections: usize,
}

impl PruneSummary {
    pub fn total(&self) -> usize {
        self.memory + self.cpu + self.connections
    }
}

struct Buffers {
    memory: BoundedBuffer<MemorySample>,
    cpu: BoundedBuffer<CpuSample>,
    connections: BoundedBuffer<ConnectionEvent>,
    errors: ErrorTally,
}

impl Buffers {
    fn new() -> Self {
        Self {
            memory: BoundedBuffer::with_capacity(MEMORY_CAPACITY),
            cpu: BoundedBuffer::with_capacity(CPU_CAPACITY),
            connections: BoundedBuffer::with_capacity(CONNECTION_EVENT_CAPACITY),
            errors: ErrorTally::new(),
        }
    }

    fn memory_statistics(&self) -> Option<MemoryStatistics> {
        if self.memory.is_empty() {
            return None;
        }
        let current = *self.memory.latest()?;
        let mut samples = self.memory.iter();
        let mut peak = *samples.next()?;
        let mut sum = peak.heap_used as f64;
        for sample in samples {
            // strict comparison keeps the earliest maximal sample
            if sample.heap_used > peak.heap_used {
                peak = *sample;
            }
            sum += sample.heap_used as f64;
        }

        Some(MemoryStatistics {
            current,
            peak,
            average_heap_used: sum / self.memory.len() as f64,
        })
    }

    fn connection_statistics(&self, now: DateTime<Utc>) -> ConnectionStatistics {
        let cutoff = now - TimeDelta::hours(RECENT_WINDOW_HOURS);
        let mut stats = ConnectionStatistics {
            total_events: self.connections.len(),
            ..Default::default()
        };

        for event in self.connections.iter().filter(|e| e.timestamp > cutoff) {
            stats.last_hour_events += 1;
            match event.kind {
                ConnectionEventKind::Connect => stats.connects += 1,
                ConnectionEventKind::Disconnect => stats.disconnects += 1,
                ConnectionEventKind::Error => stats.errors += 1,
            }
        }
        stats
    }

    fn data_points(&self) -> DataPoints {
        DataPoints {
            memory: self.memory.len(),
            cpu: self.cpu.len(),
            connections: self.connections.len(),
        }
    }

    fn prune(&mut self, now: DateTime<Utc>) -> PruneSummary {
        let sample_cutoff = now - TimeDelta::hours(SAMPLE_RETENTION_HOURS);
        PruneSummary {
            memory: self.memory.retain_newer_than(sample_cutoff),
            cpu: self.cpu.retain_newer_than(sample_cutoff),
            connections: self.connections.retain_newer_than(
                now - TimeDelta::hours(CONNECTION_EVENT_RETENTION_HOURS),
            ),
        }
    }
}

struct SamplerTasks {
    memory: JoinHandle<()>,
    cpu: JoinHandle<()>,
}

pub struct MetricsSampler {
    created_at: Instant,
    probe: Arc<dyn ResourceProbe>,
    buffers: Arc<Mutex<Buffers>>,
    tasks: Mutex<Option<SamplerTasks>>,
}

impl MetricsSampler {
    pub fn new(probe: Arc<dyn ResourceProbe>) -> Self {
        Self {
            created_at: Instant::now(),
            probe,
            buffers: Arc::new(Mutex::new(Buffers::new())),
            tasks: Mutex::new(None),
        }
    }

    /// Must be called from within a tokio runtime.
    pub fn start(&self) {
        let mut tasks = self.tasks.lock();
        if tasks.is_some() {
            tracing::debug!("Performance sampler already running");
            return;
        }

        tracing::info!("📊 Starting performance monitoring...");
        *tasks = Some(SamplerTasks {
            memory: tokio::spawn(sample_memory(self.probe.clone(), self.buffers.clone())),
            cpu: tokio::spawn(sample_cpu(self.probe.clone(), self.buffers.clone())),
        });
    }

    pub fn stop(&self) {
        if let Some(tasks) = self.tasks.lock().take() {
            tracing::info!("📊 Stopping performance monitoring...");
            tasks.memory.abort();
            tasks.cpu.abort();
        }
    }

    pub fn is_running(&self) -> bool {
        self.tasks.lock().is_some()
    }

    pub fn record_connection_event(&self, kind: ConnectionEventKind, subject_id: impl Into<String>) {
        let event = ConnectionEvent {
            timestamp: Utc::now(),
            kind,
            subject_id: subject_id.into(),
        };
        tracing::debug!(kind = ?event.kind, subject_id = %event.subject_id, "Connection event recorded");
        self.buffers.lock().connections.push(event);
    }

    pub fn record_error(&self, category: &str) {
        let count = {
            let mut buffers = self.buffers.lock();
            let count = buffers.errors.entry(category.to_string()).or_insert(0);
            *count += 1;
            *count
        };
        tracing::warn!(category, count, "❌ Error logged");
    }

    pub fn memory_statistics(&self) -> Option<MemoryStatistics> {
        self.buffers.lock().memory_statistics()
    }

    pub fn connection_statistics(&self) -> ConnectionStatistics {
        self.buffers.lock().connection_statistics(Utc::now())
    }

    pub fn error_statistics(&self) -> ErrorTally {
        self.buffers.lock().errors.clone()
    }

    pub fn uptime(&self) -> Duration {
        self.created_at.elapsed()
    }

    pub fn report(&self) -> PerformanceReport {
        let running = self.is_running();
        let buffers = self.buffers.lock();
        PerformanceReport {
            uptime: self.uptime(),
            memory: buffers.memory_statistics(),
            connections: buffers.connection_statistics(Utc::now()),
            errors: buffers.errors.clone(),
            running,
            data_points: buffers.data_points(),
        }
    }

    pub fn cleanup(&self) -> PruneSummary {
        self.cleanup_at(Utc::now())
    }

    fn cleanup_at(&self, now: DateTime<Utc>) -> PruneSummary {
        let summary = self.buffers.lock().prune(now);
        tracing::info!(
            memory = summary.memory,
            cpu = summary.cpu,
            connections = summary.connections,
            "🧹 Cleaned old performance data"
        );
        summary
    }

    /// `None` until at least one memory sample has been recorded.
    pub fn is_degraded(&self) -> Option<DegradationVerdict> {
        self.is_degraded_at(Utc::now())
    }

    fn is_degraded_at(&self, now: DateTime<Utc>) -> Option<DegradationVerdict> {
        let buffers = self.buffers.lock();
        let memory = buffers.memory_statistics()?;
        let connections = buffers.connection_statistics(now);

        let high_memory = memory.current.heap_used > HIGH_MEMORY_DEGRADED_BYTES;
        Some(DegradationVerdict {
            high_memory,
            possible_leak: memory.peak.heap_used as f64
                > memory.average_heap_used * LEAK_PEAK_TO_MEAN_RATIO,
            connection_trouble: connections.errors as f64
                > connections.connects as f64 * CONNECTION_ERROR_RATIO,
            degraded: high_memory || connections.errors > DEGRADED_ERROR_COUNT,
        })
    }
}

impl Drop for MetricsSampler {
    fn drop(&mut self) {
        self.stop();
    }
}

fn push_memory_sample(buffers: &Mutex<Buffers>, sample: MemorySample) {
    buffers.lock().memory.push(sample);

    if sample.heap_used > HIGH_MEMORY_WARNING_BYTES {
        tracing::warn!(
            "⚠️ High memory usage: {:.1}MB",
            sample.heap_used as f64 / MIB as f64
        );
    }
}

fn push_cpu_sample(buffers: &Mutex<Buffers>, sample: CpuSample) {
    buffers.lock().cpu.push(sample);
}

fn ticker(period: Duration) -> tokio::time::Interval {
    let mut interval = tokio::time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval
}

async fn sample_memory(probe: Arc<dyn ResourceProbe>, buffers: Arc<Mutex<Buffers>>) {
    let mut interval = ticker(MEMORY_SAMPLE_INTERVAL);
    loop {
        interval.tick().await;
        push_memory_sample(&buffers, MemorySample::new(Utc::now(), probe.memory()));
    }
}

async fn sample_cpu(probe: Arc<dyn ResourceProbe>, buffers: Arc<Mutex<Buffers>>) {
    let mut interval = ticker(CPU_SAMPLE_INTERVAL);
    loop {
        interval.tick().await;
        let usage = probe.cpu();
        push_cpu_sample(
            &buffers,
            CpuSample {
                timestamp: Utc::now(),
                user_micros: usage.user_micros,
                system_micros: usage.system_micros,
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct FakeProbe {
        heap_used: u64,
        memory_reads: AtomicUsize,
        cpu_reads: AtomicUsize,
    }

    impl ResourceProbe for FakeProbe {
        fn memory(&self) -> MemoryUsage {
            self.memory_reads.fetch_add(1, Ordering::SeqCst);
            MemoryUsage {
                heap_used: self.heap_used,
                heap_total: self.heap_used,
                resident_set_size: self.heap_used * 2,
                external: self.heap_used,
            }
        }

        fn cpu(&self) -> CpuUsage {
            let reads = self.cpu_reads.fetch_add(1, Ordering::SeqCst) as u64;
            CpuUsage {
                user_micros: reads * 1000,
                system_micros: reads * 10,
            }
        }
    }

    impl MetricsSampler {
        fn record_memory_sample(&self, sample: MemorySample) {
            push_memory_sample(&self.buffers, sample);
        }

        fn record_cpu_sample(&self, sample: CpuSample) {
            push_cpu_sample(&self.buffers, sample);
        }
    }

    fn sampler() -> MetricsSampler {
        MetricsSampler::new(Arc::new(FakeProbe::default()))
    }

    fn heap_sample(at: DateTime<Utc>, mib: u64) -> MemorySample {
        MemorySample::new(
            at,
            MemoryUsage {
                heap_used: mib * MIB,
                ..Default::default()
            },
        )
    }

    fn cpu_sample(at: DateTime<Utc>) -> CpuSample {
        CpuSample {
            timestamp: at,
            user_micros: 0,
            system_micros: 0,
        }
    }

    fn push_event(sampler: &MetricsSampler, at: DateTime<Utc>, kind: ConnectionEventKind) {
        sampler.buffers.lock().connections.push(ConnectionEvent {
            timestamp: at,
            kind,
            subject_id: "guild".to_string(),
        });
    }

    #[test]
    fn memory_buffer_keeps_latest_hundred() {
        let sampler = sampler();
        let start = Utc::now();
        for n in 0..=100u64 {
            sampler.record_memory_sample(heap_sample(start + TimeDelta::seconds(n as i64), n + 1));
        }

        let buffers = sampler.buffers.lock();
        assert_eq!(buffers.memory.len(), 100);
        assert!(buffers.memory.iter().all(|s| s.heap_used != MIB));
        assert_eq!(buffers.memory.latest().map(|s| s.heap_used), Some(101 * MIB));
    }

    #[test]
    fn cpu_and_event_buffers_are_bounded() {
        let sampler = sampler();
        let now = Utc::now();
        for _ in 0..75 {
            sampler.record_cpu_sample(cpu_sample(now));
        }
        for n in 0..250 {
            sampler.record_connection_event(ConnectionEventKind::Connect, format!("guild-{n}"));
        }

        let buffers = sampler.buffers.lock();
        assert_eq!(buffers.cpu.len(), 60);
        assert_eq!(buffers.connections.len(), 200);
        assert_eq!(
            buffers.connections.iter().next().map(|e| e.subject_id.as_str()),
            Some("guild-50")
        );
    }

    #[test]
    fn memory_statistics_reports_current_peak_and_mean() {
        let sampler = sampler();
        assert!(sampler.memory_statistics().is_none());

        let start = Utc::now();
        for (n, mib) in [10, 50, 30].into_iter().enumerate() {
            sampler.record_memory_sample(heap_sample(start + TimeDelta::seconds(n as i64), mib));
        }

        let stats = sampler.memory_statistics().expect("samples were recorded");
        assert_eq!(stats.peak.heap_used, 50 * MIB);
        assert_eq!(stats.current.heap_used, 30 * MIB);
        assert!((stats.average_heap_used - (90 * MIB) as f64 / 3.0).abs() < 1.0);
    }

    #[test]
    fn peak_ties_resolve_to_earliest_sample() {
        let sampler = sampler();
        let start = Utc::now();
        sampler.record_memory_sample(heap_sample(start, 40));
        sampler.record_memory_sample(heap_sample(start + TimeDelta::seconds(1), 40));
        sampler.record_memory_sample(heap_sample(start + TimeDelta::seconds(2), 20));

        let stats = sampler.memory_statistics().expect("samples were recorded");
        assert_eq!(stats.peak.timestamp, start);
    }

    #[test]
    fn connection_statistics_count_only_the_last_hour_by_kind() {
        let sampler = sampler();
        let now = Utc::now();
        push_event(&sampler, now - TimeDelta::minutes(90), ConnectionEventKind::Error);
        push_event(&sampler, now - TimeDelta::minutes(30), ConnectionEventKind::Connect);
        push_event(&sampler, now - TimeDelta::minutes(20), ConnectionEventKind::Disconnect);
        push_event(&sampler, now - TimeDelta::minutes(10), ConnectionEventKind::Error);

        let stats = sampler.buffers.lock().connection_statistics(now);
        assert_eq!(
            stats,
            ConnectionStatistics {
                total_events: 4,
                last_hour_events: 3,
                connects: 1,
                disconnects: 1,
                errors: 1,
            }
        );
    }

    #[test]
    fn error_tally_counts_per_category() {
        let sampler = sampler();
        sampler.record_error("command");
        sampler.record_error("command");
        sampler.record_error("track_exception");

        let errors = sampler.error_statistics();
        assert_eq!(errors.get("command"), Some(&2));
        assert_eq!(errors.get("track_exception"), Some(&1));

        sampler.record_error("command");
        assert_eq!(errors.get("command"), Some(&2));
    }

    #[test]
    fn cleanup_prunes_by_age_and_is_idempotent() {
        let sampler = sampler();
        let now = Utc::now();
        sampler.record_memory_sample(heap_sample(now - TimeDelta::minutes(61), 10));
        sampler.record_memory_sample(heap_sample(now - TimeDelta::minutes(5), 10));
        sampler.record_cpu_sample(cpu_sample(now - TimeDelta::minutes(70)));
        sampler.record_cpu_sample(cpu_sample(now - TimeDelta::minutes(1)));
        push_event(&sampler, now - TimeDelta::minutes(121), ConnectionEventKind::Connect);
        push_event(&sampler, now - TimeDelta::minutes(90), ConnectionEventKind::Connect);

        let first = sampler.cleanup_at(now);
        assert_eq!(
            first,
            PruneSummary {
                memory: 1,
                cpu: 1,
                connections: 1,
            }
        );

        let second = sampler.cleanup_at(now);
        assert_eq!(second.total(), 0);

        let points = sampler.report().data_points;
        assert_eq!(
            points,
            DataPoints {
                memory: 1,
                cpu: 1,
                connections: 1,
            }
        );
    }

    #[test]
    fn degradation_requires_memory_samples() {
        let sampler = sampler();
        assert!(sampler.is_degraded().is_none());
    }

    #[test]
    fn high_heap_is_degraded() {
        let sampler = sampler();
        sampler.record_memory_sample(heap_sample(Utc::now(), 260));

        let verdict = sampler.is_degraded().expect("a sample was recorded");
        assert!(verdict.high_memory);
        assert!(verdict.degraded);
    }

    #[test]
    fn modest_heap_without_errors_is_healthy() {
        let sampler = sampler();
        sampler.record_memory_sample(heap_sample(Utc::now(), 50));

        let verdict = sampler.is_degraded().expect("a sample was recorded");
        assert_eq!(
            verdict,
            DegradationVerdict {
                high_memory: false,
                possible_leak: false,
                connection_trouble: false,
                degraded: false,
            }
        );
    }

    #[test]
    fn leak_and_connection_heuristics() {
        let sampler = sampler();
        let now = Utc::now();
        for mib in [10, 10, 10, 100] {
            sampler.record_memory_sample(heap_sample(now, mib));
        }
        for _ in 0..10 {
            push_event(&sampler, now - TimeDelta::minutes(5), ConnectionEventKind::Connect);
        }
        for _ in 0..6 {
            push_event(&sampler, now - TimeDelta::minutes(5), ConnectionEventKind::Error);
        }

        let verdict = sampler.is_degraded_at(now).expect("samples were recorded");
        assert!(verdict.possible_leak);
        assert!(verdict.connection_trouble);
        assert!(!verdict.high_memory);
        assert!(verdict.degraded);
    }

    #[test]
    fn report_reflects_buffers_and_running_state() {
        let sampler = sampler();
        sampler.record_memory_sample(heap_sample(Utc::now(), 12));
        sampler.record_connection_event(ConnectionEventKind::Connect, "1");
        sampler.record_error("command");

        let report = sampler.report();
        assert!(!report.running);
        assert_eq!(report.data_points.memory, 1);
        assert_eq!(report.data_points.connections, 1);
        assert_eq!(report.connections.connects, 1);
        assert_eq!(report.errors.get("command"), Some(&1));
        assert!(report.memory.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn start_samples_on_schedule_and_stop_halts_it() {
        let probe = Arc::new(FakeProbe {
            heap_used: 64 * MIB,
            ..Default::default()
        });
        let sampler = MetricsSampler::new(probe.clone());

        sampler.start();
        sampler.start();
        assert!(sampler.is_running());

        tokio::time::sleep(Duration::from_secs(31)).await;
        assert_eq!(sampler.report().data_points.memory, 1);
        assert_eq!(sampler.report().data_points.cpu, 0);

        tokio::time::sleep(Duration::from_secs(30)).await;
        let points = sampler.report().data_points;
        assert_eq!(points.memory, 2);
        assert_eq!(points.cpu, 1);
        assert_eq!(probe.memory_reads.load(Ordering::SeqCst), 2);

        sampler.stop();
        sampler.stop();
        assert!(!sampler.is_running());

        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(sampler.report().data_points.memory, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn uptime_counts_from_construction() {
        let sampler = sampler();
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(sampler.uptime() >= Duration::from_secs(5));
    }
}
