// Channel statistics aggregation
// Fans out one fetch per channel, folds whatever settled before the deadline and
// never lets a total outage wipe the numbers shown on the site

use async_trait::async_trait;
use futures::future::join_all;
use parking_lot::RwLock;
use serde::Serialize;
use std::{sync::Arc, time::Duration};
use thiserror::Error;
use tokio::time::{timeout_at, Instant};
use tracing::{debug, info, warn};

// Per-source failure, absorbed into the fold and never surfaced to callers
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchFailure {
    #[error("request timed out")]
    Timeout,

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("statistics provider not configured")]
    Unavailable,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChannelStatSnapshot {
    pub source_id: String,
    /// `None` when the channel hides its subscriber count.
    pub subscriber_count: Option<u64>,
    pub video_count: u64,
    pub view_count: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct AggregateStats {
    pub subscribers: u64,
    pub videos: u64,
    pub views: u64,
    pub categories: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    Success(ChannelStatSnapshot),
    Failure {
        source_id: String,
        reason: FetchFailure,
    },
}

impl FetchOutcome {
    pub fn source_id(&self) -> &str {
        match self {
            FetchOutcome::Success(snapshot) => &snapshot.source_id,
            FetchOutcome::Failure { source_id, .. } => source_id,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, FetchOutcome::Success(_))
    }
}

// Result of one aggregation cycle
#[derive(Debug, Clone)]
pub struct AggregateReport {
    pub stats: AggregateStats,
    /// True when any source failed or the fallback was returned.
    pub degraded: bool,
    pub succeeded: usize,
    pub failed: usize,
    pub outcomes: Vec<FetchOutcome>,
}

impl AggregateReport {
    pub fn used_fallback(&self) -> bool {
        self.succeeded == 0
    }
}

// Statistics source, one call per channel id
#[async_trait]
pub trait StatsProvider: Send + Sync + 'static {
    // A provider without credentials reports false and is never called
    fn is_available(&self) -> bool {
        true
    }

    async fn fetch_channel(&self, source_id: &str) -> Result<ChannelStatSnapshot, FetchFailure>;
}

#[derive(Debug, Clone)]
pub struct AggregatorConfig {
    pub timeout_ms: u64,
    pub categories: u32,
    pub fallback: AggregateStats,
    // Channels without a subscriber count fail instead of adding zero
    pub require_subscribers: bool,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 5000,
            categories: 4,
            fallback: AggregateStats {
                subscribers: 500_000,
                videos: 200,
                views: 50_000_000,
                categories: 4,
            },
            require_subscribers: false,
        }
    }
}

pub struct StatsAggregator {
    provider: Arc<dyn StatsProvider>,
    config: AggregatorConfig,
}

impl StatsAggregator {
    pub fn new(provider: Arc<dyn StatsProvider>, config: AggregatorConfig) -> Self {
        Self { provider, config }
    }

    pub fn config(&self) -> &AggregatorConfig {
        &self.config
    }

    /// Runs one fan-out/fold cycle over `source_ids`.
    ///
    /// Every fetch shares a single deadline of `timeout_ms` from the start of the
    /// call. Fetches still pending at the deadline count as
    /// [`FetchFailure::Timeout`] and are dropped; their connections may stay open.
    /// When nothing succeeds, `previous` (or the configured fallback) comes back
    /// untouched.
    pub async fn aggregate(
        &self,
        source_ids: &[String],
        previous: Option<AggregateStats>,
    ) -> AggregateReport {
        let fallback = previous.unwrap_or(self.config.fallback);

        if !self.provider.is_available() {
            warn!("statistics provider not configured, using fallback values");
            let outcomes = source_ids
                .iter()
                .map(|id| FetchOutcome::Failure {
                    source_id: id.clone(),
                    reason: FetchFailure::Unavailable,
                })
                .collect();
            return fold(outcomes, fallback, self.config.categories);
        }

        let deadline = Instant::now() + Duration::from_millis(self.config.timeout_ms);
        let require_subscribers = self.config.require_subscribers;
        let fetches = source_ids.iter().map(|id| {
            let provider = self.provider.clone();
            async move {
                match timeout_at(deadline, provider.fetch_channel(id)).await {
                    Ok(Ok(snapshot)) if require_subscribers && snapshot.subscriber_count.is_none() => {
                        FetchOutcome::Failure {
                            source_id: id.clone(),
                            reason: FetchFailure::Malformed("subscriberCount missing".to_string()),
                        }
                    }
                    Ok(Ok(snapshot)) => FetchOutcome::Success(snapshot),
                    Ok(Err(reason)) => FetchOutcome::Failure {
                        source_id: id.clone(),
                        reason,
                    },
                    Err(_) => FetchOutcome::Failure {
                        source_id: id.clone(),
                        reason: FetchFailure::Timeout,
                    },
                }
            }
        });

        let outcomes = join_all(fetches).await;

        for outcome in &outcomes {
            if let FetchOutcome::Failure { source_id, reason } = outcome {
                warn!(channel = %source_id, error = %reason, "failed to fetch channel statistics");
            }
        }

        let report = fold(outcomes, fallback, self.config.categories);
        if report.used_fallback() {
            warn!("no successful statistics fetches, using fallback values");
        } else {
            debug!(
                succeeded = report.succeeded,
                failed = report.failed,
                subscribers = report.stats.subscribers,
                "aggregated channel statistics"
            );
        }
        report
    }
}

/// Sums the counters of every successful outcome.
///
/// With no successes the fallback counters are returned as is. `categories`
/// always comes from the caller.
pub fn fold(outcomes: Vec<FetchOutcome>, fallback: AggregateStats, categories: u32) -> AggregateReport {
    let mut totals = AggregateStats {
        categories,
        ..AggregateStats::default()
    };
    let mut succeeded = 0;

    for outcome in &outcomes {
        if let FetchOutcome::Success(snapshot) = outcome {
            totals.subscribers = totals.subscribers.saturating_add(snapshot.subscriber_count.unwrap_or(0));
            totals.videos = totals.videos.saturating_add(snapshot.video_count);
            totals.views = totals.views.saturating_add(snapshot.view_count);
            succeeded += 1;
        }
    }

    let failed = outcomes.len() - succeeded;
    let stats = if succeeded == 0 {
        AggregateStats {
            categories,
            ..fallback
        }
    } else {
        totals
    };

    AggregateReport {
        stats,
        degraded: succeeded == 0 || failed > 0,
        succeeded,
        failed,
        outcomes,
    }
}

// Cold until the first cycle with at least one success, warm afterwards
pub struct StatsService {
    aggregator: StatsAggregator,
    source_ids: Vec<String>,
    last_known: RwLock<Option<AggregateStats>>,
}

impl StatsService {
    pub fn new(aggregator: StatsAggregator, source_ids: Vec<String>) -> Self {
        Self {
            aggregator,
            source_ids,
            last_known: RwLock::new(None),
        }
    }

    pub fn source_ids(&self) -> &[String] {
        &self.source_ids
    }

    pub fn is_warm(&self) -> bool {
        self.last_known.read().is_some()
    }

    // Last known aggregate, no I/O
    pub fn current(&self) -> AggregateStats {
        self.last_known
            .read()
            .unwrap_or(self.aggregator.config().fallback)
    }

    pub async fn refresh(&self) -> AggregateReport {
        let previous = *self.last_known.read();
        let report = self.aggregator.aggregate(&self.source_ids, previous).await;

        if !report.used_fallback() {
            *self.last_known.write() = Some(report.stats);
            info!(
                channels = self.source_ids.len(),
                succeeded = report.succeeded,
                "statistics refreshed"
            );
        }
        report
    }
}

/// Decimal places per display unit. Zero truncates to whole units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NumberFormat {
    /// `None` keeps billions in the millions unit ("1500.0M+").
    pub billions: Option<usize>,
    pub millions: usize,
    pub thousands: usize,
}

impl NumberFormat {
    pub const fn uniform(precision: usize) -> Self {
        Self {
            billions: Some(precision),
            millions: precision,
            thousands: precision,
        }
    }

    /// One decimal for millions, whole thousands, no billions unit.
    pub const fn compact() -> Self {
        Self {
            billions: None,
            millions: 1,
            thousands: 0,
        }
    }

    /// Abbreviates `num` for display: "2.35M+", "417K+", "999+".
    pub fn format(&self, num: u64) -> String {
        let units = [
            (1_000_000_000, "B", self.billions),
            (1_000_000, "M", Some(self.millions)),
            (1_000, "K", Some(self.thousands)),
        ];

        for (scale, suffix, precision) in units {
            let Some(precision) = precision else { continue };
            if num >= scale {
                if precision == 0 {
                    return format!("{}{}+", num / scale, suffix);
                }
                return format!("{:.*}{}+", precision, num as f64 / scale as f64, suffix);
            }
        }

        format!("{}+", num)
    }
}

impl Default for NumberFormat {
    fn default() -> Self {
        Self::uniform(2)
    }
}

pub fn format_number(num: u64) -> String {
    NumberFormat::default().format(num)
}


#[cfg(test)]
mod tests {
    use super::mock_provider::MockProvider;
    use super::*;

    fn ids(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn aggregator(provider: Arc<MockProvider>) -> StatsAggregator {
        StatsAggregator::new(provider, AggregatorConfig::default())
    }

    #[tokio::test]
    async fn test_total_failure_returns_fallback_unchanged() {
        let provider = Arc::new(MockProvider::new());
        provider.fail("a", FetchFailure::Http("status 500".into()));
        provider.fail("b", FetchFailure::Malformed("no items".into()));

        let agg = aggregator(provider);
        let report = agg.aggregate(&ids(&["a", "b", "c"]), None).await;

        assert_eq!(report.stats, AggregatorConfig::default().fallback);
        assert!(report.degraded);
        assert!(report.used_fallback());
        assert_eq!(report.failed, 3);

        let previous = AggregateStats {
            subscribers: 1,
            videos: 2,
            views: 3,
            categories: 4,
        };
        let report = agg.aggregate(&ids(&["a", "b"]), Some(previous)).await;
        assert_eq!(report.stats, previous);
    }

    #[tokio::test]
    async fn test_partial_success_sums_only_successful_sources() {
        let provider = Arc::new(MockProvider::new());
        provider.succeed("a", 100, 10, 1_000);
        provider.fail("b", FetchFailure::Malformed("missing statistics".into()));
        provider.succeed("c", 50, 5, 500);

        let report = aggregator(provider)
            .aggregate(&ids(&["a", "b", "c"]), None)
            .await;

        assert_eq!(
            report.stats,
            AggregateStats {
                subscribers: 150,
                videos: 15,
                views: 1_500,
                categories: 4,
            }
        );
        assert!(report.degraded);
        assert_eq!((report.succeeded, report.failed), (2, 1));
        assert_eq!(report.outcomes.len(), 3);
        assert_eq!(report.outcomes[1].source_id(), "b");
        assert!(!report.outcomes[1].is_success());
    }

    #[tokio::test]
    async fn test_full_success_is_not_degraded() {
        let provider = Arc::new(MockProvider::new());
        provider.succeed("a", 7, 1, 70);
        provider.succeed("b", 3, 2, 30);

        let report = aggregator(provider).aggregate(&ids(&["a", "b"]), None).await;
        assert!(!report.degraded);
        assert_eq!(report.stats.subscribers, 10);
    }

    #[tokio::test]
    async fn test_duplicate_ids_double_count() {
        let provider = Arc::new(MockProvider::new());
        provider.succeed("a", 10, 1, 100);

        let report = aggregator(provider.clone())
            .aggregate(&ids(&["a", "a"]), None)
            .await;
        assert_eq!(report.stats.subscribers, 20);
        assert_eq!(provider.calls(), 2);
    }

    #[tokio::test]
    async fn test_aggregate_is_idempotent() {
        let provider = Arc::new(MockProvider::new());
        provider.succeed("a", 123, 4, 5_678);
        provider.succeed("b", 877, 6, 4_322);

        let agg = aggregator(provider);
        let sources = ids(&["a", "b"]);
        let first = agg.aggregate(&sources, None).await;
        let second = agg.aggregate(&sources, None).await;
        assert_eq!(first.stats, second.stats);
    }

    #[tokio::test]
    async fn test_unavailable_provider_short_circuits() {
        let provider = Arc::new(MockProvider::unavailable());
        let report = aggregator(provider.clone())
            .aggregate(&ids(&["a", "b"]), None)
            .await;

        assert_eq!(provider.calls(), 0);
        assert_eq!(report.stats, AggregatorConfig::default().fallback);
        assert!(report.outcomes.iter().all(|o| matches!(
            o,
            FetchOutcome::Failure {
                reason: FetchFailure::Unavailable,
                ..
            }
        )));
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_after_deadline_is_excluded() {
        let provider = Arc::new(MockProvider::new());
        provider.succeed_after("fast", 10, 1, 100, Duration::from_millis(4_999));
        provider.succeed_after("late", 1_000, 100, 10_000, Duration::from_millis(5_001));

        let report = aggregator(provider)
            .aggregate(&ids(&["fast", "late"]), None)
            .await;

        assert_eq!(report.stats.subscribers, 10);
        assert_eq!(report.stats.views, 100);
        assert_eq!(
            report.outcomes[1],
            FetchOutcome::Failure {
                source_id: "late".into(),
                reason: FetchFailure::Timeout,
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_call_never_outlives_deadline() {
        let provider = Arc::new(MockProvider::new());
        provider.succeed_after("slow", 1, 1, 1, Duration::from_secs(60));

        let started = Instant::now();
        let report = aggregator(provider).aggregate(&ids(&["slow"]), None).await;

        assert!(started.elapsed() <= Duration::from_millis(5_000));
        assert!(report.used_fallback());
    }

    #[tokio::test]
    async fn test_service_warms_and_keeps_last_known_value() {
        let provider = Arc::new(MockProvider::new());
        provider.succeed("a", 42, 2, 420);

        let service = StatsService::new(aggregator(provider.clone()), ids(&["a"]));
        assert!(!service.is_warm());
        assert_eq!(service.current(), AggregatorConfig::default().fallback);

        service.refresh().await;
        assert!(service.is_warm());
        assert_eq!(service.current().subscribers, 42);

        // Outage after a good cycle keeps the previous aggregate
        provider.fail("a", FetchFailure::Timeout);
        let report = service.refresh().await;
        assert_eq!(report.stats.subscribers, 42);
        assert_eq!(service.current().subscribers, 42);
    }

    #[test]
    fn test_fold_saturates_instead_of_overflowing() {
        let snapshot = |id: &str| {
            FetchOutcome::Success(ChannelStatSnapshot {
                source_id: id.into(),
                subscriber_count: Some(u64::MAX),
                video_count: 1,
                view_count: 1,
            })
        };
        let report = fold(vec![snapshot("a"), snapshot("b")], AggregateStats::default(), 4);
        assert_eq!(report.stats.subscribers, u64::MAX);
        assert_eq!(report.stats.videos, 2);
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(0), "0+");
        assert_eq!(format_number(999), "999+");
        assert_eq!(format_number(1_500), "1.50K+");
        assert_eq!(format_number(2_350_000), "2.35M+");
        assert_eq!(format_number(1_000_000_000), "1.00B+");
    }

    #[test]
    fn test_format_number_whole_units() {
        let whole = NumberFormat::uniform(0);
        assert_eq!(whole.format(1_500), "1K+");
        assert_eq!(whole.format(417_900), "417K+");
        assert_eq!(whole.format(2_000_000), "2M+");
        assert_eq!(whole.format(12), "12+");
    }

    #[test]
    fn test_compact_format_mixes_precisions() {
        let compact = NumberFormat::compact();
        assert_eq!(compact.format(2_350_000), "2.4M+");
        assert_eq!(compact.format(2_000_000), "2.0M+");
        assert_eq!(compact.format(417_900), "417K+");
        assert_eq!(compact.format(1_500_000_000), "1500.0M+");
        assert_eq!(compact.format(100), "100+");
    }

    #[tokio::test]
    async fn test_hidden_subscribers_fail_when_required() {
        let provider = Arc::new(MockProvider::new());
        provider.succeed_hidden("a", 3, 9);
        provider.succeed_hidden("b", 3, 9);

        let config = AggregatorConfig {
            require_subscribers: true,
            ..AggregatorConfig::default()
        };
        let report = StatsAggregator::new(provider.clone(), config)
            .aggregate(&ids(&["a", "b"]), None)
            .await;

        assert!(report.used_fallback());
        assert!(report.degraded);
        assert_eq!(report.stats.subscribers, 500_000);
        assert!(matches!(
            &report.outcomes[0],
            FetchOutcome::Failure { reason: FetchFailure::Malformed(_), .. }
        ));

        // Without the requirement a hidden count adds nothing but still succeeds
        let report = aggregator(provider).aggregate(&ids(&["a", "b"]), None).await;
        assert_eq!(report.succeeded, 2);
        assert_eq!(report.stats.subscribers, 0);
        assert_eq!(report.stats.views, 18);
    }

    #[test]
    fn test_fallback_takes_configured_categories() {
        let fallback = AggregateStats {
            subscribers: 500_000,
            videos: 200,
            views: 50_000_000,
            categories: 9,
        };
        let outcomes = vec![FetchOutcome::Failure {
            source_id: "a".into(),
            reason: FetchFailure::Timeout,
        }];

        let report = fold(outcomes, fallback, 4);
        assert_eq!(report.stats.categories, 4);
        assert_eq!(report.stats.subscribers, 500_000);
    }
}
