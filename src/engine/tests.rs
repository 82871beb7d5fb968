//! Tests for engine module

use super::*;
use crate::error::Error;
use crate::pagination::{Page, PageRequest};
use async_trait::async_trait;
use futures::StreamExt;
use pretty_assertions::assert_eq;
use std::collections::HashSet;
use std::sync::Mutex;
use test_case::test_case;
use tokio::time::Instant;

/// In-memory source over the numbers `0..total_items`
struct VecSource {
    total_items: u32,
    report_total: bool,
    fail_pages: HashSet<u32>,
    latency: Option<Duration>,
    calls: Mutex<Vec<(u32, Instant)>>,
}

impl VecSource {
    fn new(total_items: u32) -> Self {
        Self {
            total_items,
            report_total: true,
            fail_pages: HashSet::new(),
            latency: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    fn without_total(mut self) -> Self {
        self.report_total = false;
        self
    }

    fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    fn failing_on(mut self, page: u32) -> Self {
        self.fail_pages.insert(page);
        self
    }

    fn pages(&self) -> Vec<u32> {
        self.calls.lock().unwrap().iter().map(|(page, _)| *page).collect()
    }

    fn instants(&self) -> Vec<Instant> {
        self.calls.lock().unwrap().iter().map(|(_, at)| *at).collect()
    }
}

#[async_trait]
impl PageSource for VecSource {
    type Item = u32;

    async fn fetch(
        &self,
        _cancel: &CancellationToken,
        _filters: &Filters,
        request: PageRequest,
    ) -> Result<Page<u32>> {
        self.calls
            .lock()
            .unwrap()
            .push((request.number, Instant::now()));

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        if self.fail_pages.contains(&request.number) {
            return Err(Error::http_status(500, "boom"));
        }

        let start = (request.number - 1).saturating_mul(request.size);
        let end = request
            .number
            .saturating_mul(request.size)
            .min(self.total_items);
        let items: Vec<u32> = (start..end.max(start)).collect();
        let total = self.report_total.then_some(u64::from(self.total_items));
        Ok(Page::from_records(items, request, total))
    }
}

/// Source whose requests never complete
#[derive(Default)]
struct HangingSource {
    calls: Mutex<u32>,
}

#[async_trait]
impl PageSource for HangingSource {
    type Item = u32;

    async fn fetch(
        &self,
        _cancel: &CancellationToken,
        _filters: &Filters,
        _request: PageRequest,
    ) -> Result<Page<u32>> {
        *self.calls.lock().unwrap() += 1;
        std::future::pending::<()>().await;
        Ok(Page::last(Vec::new()))
    }
}

/// Sleeper that records requested delays and returns immediately
#[derive(Default)]
struct RecordingSleeper {
    delays: Mutex<Vec<Duration>>,
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.delays.lock().unwrap().push(duration);
    }
}

fn fast_settings() -> ListingSettings {
    ListingSettings::new().with_max_requests_per_second(10_000)
}

fn max_in_window(instants: &[Instant], window: Duration) -> usize {
    let mut sorted = instants.to_vec();
    sorted.sort();
    (0..sorted.len())
        .map(|i| {
            sorted[i..]
                .iter()
                .take_while(|at| at.saturating_duration_since(sorted[i]) < window)
                .count()
        })
        .max()
        .unwrap_or(0)
}

// ============================================================================
// ListingSettings Tests
// ============================================================================

#[test]
fn test_settings_default() {
    let settings = ListingSettings::default();
    assert_eq!(settings.max_requests_per_second, 5);
    assert_eq!(settings.stream_buffer_length, 10);
    assert_eq!(settings.max_items_per_request, 300);
    assert_eq!(settings.max_fetchers_count, 10);
    assert!(!settings.fail_fast);
    assert!(settings.validate().is_ok());
}

#[test]
fn test_settings_builder() {
    let settings = ListingSettings::new()
        .with_max_requests_per_second(2)
        .with_stream_buffer_length(1)
        .with_max_items_per_request(50)
        .with_max_fetchers_count(4)
        .with_fail_fast(true);

    assert_eq!(settings.max_requests_per_second, 2);
    assert_eq!(settings.stream_buffer_length, 1);
    assert_eq!(settings.max_items_per_request, 50);
    assert_eq!(settings.max_fetchers_count, 4);
    assert!(settings.fail_fast);
}

#[test]
fn test_settings_partial_deserialize() {
    let settings: ListingSettings =
        serde_json::from_str(r#"{"max_fetchers_count": 3}"#).unwrap();
    assert_eq!(settings.max_fetchers_count, 3);
    assert_eq!(settings.max_items_per_request, 300);
}

#[test_case(ListingSettings::new().with_max_requests_per_second(0), "max_requests_per_second" ; "zero rate")]
#[test_case(ListingSettings::new().with_stream_buffer_length(0), "stream_buffer_length" ; "zero buffer")]
#[test_case(ListingSettings::new().with_max_items_per_request(0), "max_items_per_request" ; "zero page size")]
#[test_case(ListingSettings::new().with_max_fetchers_count(0), "max_fetchers_count" ; "zero fetchers")]
fn test_lister_rejects_invalid_settings(settings: ListingSettings, field: &str) {
    let err = Lister::new(settings, VecSource::new(10)).unwrap_err();
    assert!(err.is_config());
    match err {
        Error::InvalidSetting { field: f, .. } => assert_eq!(f, field),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_listing_phase_order() {
    assert!(ListingPhase::Idle < ListingPhase::Discovering);
    assert!(ListingPhase::Discovering < ListingPhase::Streaming);
    assert!(ListingPhase::Streaming < ListingPhase::Draining);
    assert!(ListingPhase::Draining < ListingPhase::Closed);
    assert!(ListingPhase::Closed.is_closed());
    assert!(!ListingPhase::Draining.is_closed());
}

// ============================================================================
// Listing Tests
// ============================================================================

#[tokio::test]
async fn test_list_640_records_with_defaults() {
    let lister = Lister::new(ListingSettings::default(), VecSource::new(640)).unwrap();

    let stream = lister.get(&CancellationToken::new(), Filters::new());
    let (mut items, errors) = stream.collect_all().await;

    assert!(errors.is_empty());
    items.sort_unstable();
    assert_eq!(items, (0..640).collect::<Vec<_>>());

    let mut pages = lister.source().pages();
    pages.sort_unstable();
    assert_eq!(pages, vec![1, 2, 3]);
}

#[tokio::test]
async fn test_stream_reports_closed_and_stats() {
    let lister = Lister::new(ListingSettings::default(), VecSource::new(640)).unwrap();

    let mut stream = lister.get(&CancellationToken::new(), Filters::new());
    let mut count = 0;
    while let Some(envelope) = stream.next().await {
        envelope.unwrap();
        count += 1;
    }

    assert_eq!(count, 640);
    assert_eq!(stream.phase(), ListingPhase::Closed);
    assert_eq!(
        stream.stats(),
        ListingStats {
            pages_requested: 3,
            items_emitted: 640,
            errors: 0,
        }
    );
}

#[test_case(1 ; "single fetcher")]
#[test_case(3 ; "three fetchers")]
#[test_case(10 ; "ten fetchers")]
#[tokio::test]
async fn test_exactly_k_pages_with_total(fetchers: u32) {
    let settings = fast_settings()
        .with_max_items_per_request(100)
        .with_max_fetchers_count(fetchers);
    let lister = Lister::new(settings, VecSource::new(1_000)).unwrap();

    let items = lister
        .get(&CancellationToken::new(), Filters::new())
        .collect_items()
        .await
        .unwrap();
    assert_eq!(items.len(), 1_000);

    let mut pages = lister.source().pages();
    pages.sort_unstable();
    assert_eq!(pages, (1..=10).collect::<Vec<_>>());
}

#[tokio::test]
async fn test_pages_claimed_once_without_total() {
    let settings = fast_settings()
        .with_max_items_per_request(100)
        .with_max_fetchers_count(8);
    let lister = Lister::new(settings, VecSource::new(2_450).without_total()).unwrap();

    let mut items = lister
        .get(&CancellationToken::new(), Filters::new())
        .collect_items()
        .await
        .unwrap();
    items.sort_unstable();
    assert_eq!(items, (0..2_450).collect::<Vec<_>>());

    let mut pages = lister.source().pages();
    pages.sort_unstable();
    assert_eq!(pages, (1..=25).collect::<Vec<_>>());
}

#[test_case(true ; "with total")]
#[test_case(false ; "without total")]
#[tokio::test(start_paused = true)]
async fn test_no_pages_past_end_with_slow_source(report_total: bool) {
    let mut source = VecSource::new(640).with_latency(Duration::from_millis(100));
    if !report_total {
        source = source.without_total();
    }
    let lister = Lister::new(ListingSettings::default(), source).unwrap();

    let mut stream = lister.get(&CancellationToken::new(), Filters::new());
    let mut items = Vec::new();
    while let Some(envelope) = stream.next().await {
        items.push(envelope.unwrap());
    }
    items.sort_unstable();
    assert_eq!(items, (0..640).collect::<Vec<_>>());

    let mut pages = lister.source().pages();
    pages.sort_unstable();
    assert_eq!(pages, vec![1, 2, 3]);
    assert_eq!(stream.stats().pages_requested, 3);
}

#[tokio::test(start_paused = true)]
async fn test_page_error_without_total_does_not_stall() {
    let source = VecSource::new(640)
        .without_total()
        .with_latency(Duration::from_millis(100))
        .failing_on(2);
    let lister = Lister::new(ListingSettings::default(), source).unwrap();

    let (items, errors) = lister
        .get(&CancellationToken::new(), Filters::new())
        .collect_all()
        .await;

    assert_eq!(items.len(), 340);
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].page(), Some(2));
    assert_eq!(lister.source().pages(), vec![1, 2, 3]);
}

#[tokio::test]
async fn test_single_page_listing_spawns_no_workers() {
    let lister = Lister::new(fast_settings(), VecSource::new(120)).unwrap();

    let items = lister
        .get(&CancellationToken::new(), Filters::new())
        .collect_items()
        .await
        .unwrap();

    assert_eq!(items, (0..120).collect::<Vec<_>>());
    assert_eq!(lister.source().pages(), vec![1]);
}

#[tokio::test]
async fn test_empty_collection() {
    let lister = Lister::new(fast_settings(), VecSource::new(0)).unwrap();

    let stream = lister.get(&CancellationToken::new(), Filters::new());
    let (items, errors) = stream.collect_all().await;

    assert!(items.is_empty());
    assert!(errors.is_empty());
    assert_eq!(lister.source().pages(), vec![1]);
}

#[tokio::test]
async fn test_records_of_a_page_keep_order() {
    let settings = fast_settings()
        .with_max_items_per_request(50)
        .with_max_fetchers_count(4);
    let lister = Lister::new(settings, VecSource::new(400)).unwrap();

    let items = lister
        .get(&CancellationToken::new(), Filters::new())
        .collect_items()
        .await
        .unwrap();

    // Records of the same page stay in ascending order
    for page in 0..8u32 {
        let of_page: Vec<u32> = items.iter().copied().filter(|n| n / 50 == page).collect();
        let mut sorted = of_page.clone();
        sorted.sort_unstable();
        assert_eq!(of_page, sorted);
    }
}

// ============================================================================
// Error Tests
// ============================================================================

#[tokio::test]
async fn test_page_error_is_reported_once() {
    let lister = Lister::new(
        ListingSettings::default(),
        VecSource::new(640).failing_on(2),
    )
    .unwrap();

    let stream = lister.get(&CancellationToken::new(), Filters::new());
    let (items, errors) = stream.collect_all().await;

    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].page(), Some(2));
    assert!(matches!(&errors[0], Error::PageFetch { source, .. }
        if matches!(**source, Error::HttpStatus { status: 500, .. })));
    assert_eq!(items.len(), 340);
    assert!(items.iter().all(|n| !(300..600).contains(n)));
}

#[tokio::test]
async fn test_first_page_error_ends_listing() {
    let lister = Lister::new(fast_settings(), VecSource::new(640).failing_on(1)).unwrap();

    let mut stream = lister.get(&CancellationToken::new(), Filters::new());
    let err = stream.recv().await.unwrap().unwrap_err();
    assert_eq!(err.page(), Some(1));
    assert!(stream.recv().await.is_none());
    assert_eq!(lister.source().pages(), vec![1]);
    assert_eq!(stream.stats().errors, 1);
}

#[tokio::test]
async fn test_fail_fast_stops_listing() {
    let settings = fast_settings()
        .with_max_items_per_request(100)
        .with_max_fetchers_count(1)
        .with_fail_fast(true);
    let lister = Lister::new(settings, VecSource::new(3_000).failing_on(2)).unwrap();

    let stream = lister.get(&CancellationToken::new(), Filters::new());
    let token = stream.cancellation_token().clone();
    let (items, errors) = stream.collect_all().await;

    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].page(), Some(2));
    assert!(items.len() <= 100);
    assert!(token.is_cancelled());
    assert_eq!(lister.source().pages(), vec![1, 2]);
}

#[tokio::test]
async fn test_collect_items_returns_first_error() {
    let lister = Lister::new(
        fast_settings().with_max_fetchers_count(1),
        VecSource::new(640).failing_on(2),
    )
    .unwrap();

    let err = lister
        .get(&CancellationToken::new(), Filters::new())
        .collect_items()
        .await
        .unwrap_err();
    assert_eq!(err.page(), Some(2));
}

// ============================================================================
// Rate Limit Tests
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_request_rate_never_exceeded() {
    let settings = ListingSettings::new()
        .with_max_requests_per_second(5)
        .with_max_items_per_request(10)
        .with_max_fetchers_count(10);
    let lister = Lister::new(settings, VecSource::new(200)).unwrap();

    let items = lister
        .get(&CancellationToken::new(), Filters::new())
        .collect_items()
        .await
        .unwrap();
    assert_eq!(items.len(), 200);

    let instants = lister.source().instants();
    assert_eq!(instants.len(), 20);
    assert!(max_in_window(&instants, Duration::from_secs(1)) <= 5);

    let first = instants.iter().min().unwrap();
    let last = instants.iter().max().unwrap();
    assert!(last.duration_since(*first) >= Duration::from_secs(3));
}

#[tokio::test]
async fn test_injected_sleeper_is_used() {
    let settings = ListingSettings::new()
        .with_max_requests_per_second(2)
        .with_max_items_per_request(10)
        .with_max_fetchers_count(1);
    let sleeper = Arc::new(RecordingSleeper::default());
    let lister = Lister::with_sleeper(settings, VecSource::new(60), sleeper.clone()).unwrap();

    let items = lister
        .get(&CancellationToken::new(), Filters::new())
        .collect_items()
        .await
        .unwrap();

    assert_eq!(items.len(), 60);
    // Every page past the second waits for the window
    let delays = sleeper.delays.lock().unwrap().clone();
    assert!(delays.len() >= 2);
    assert!(delays.iter().all(|d| *d <= Duration::from_secs(1)));
}

#[tokio::test(start_paused = true)]
async fn test_shared_rate_gate_across_listers() {
    let gate = Arc::new(RateGate::new(3).unwrap());
    let settings = ListingSettings::new()
        .with_max_items_per_request(10)
        .with_max_fetchers_count(4);
    let first = Lister::new(settings.clone(), VecSource::new(60))
        .unwrap()
        .with_rate_gate(gate.clone());
    let second = Lister::new(settings, VecSource::new(60))
        .unwrap()
        .with_rate_gate(gate.clone());
    assert!(Arc::ptr_eq(first.rate_gate(), second.rate_gate()));

    let cancel = CancellationToken::new();
    let (a, b) = tokio::join!(
        first.get(&cancel, Filters::new()).collect_items(),
        second.get(&cancel, Filters::new()).collect_items(),
    );
    assert_eq!(a.unwrap().len(), 60);
    assert_eq!(b.unwrap().len(), 60);

    let mut instants = first.source().instants();
    instants.extend(second.source().instants());
    assert!(max_in_window(&instants, Duration::from_secs(1)) <= 3);
}

// ============================================================================
// Cancellation Tests
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_cancel_mid_listing_closes_stream() {
    let settings = ListingSettings::new()
        .with_max_requests_per_second(1)
        .with_max_items_per_request(10);
    let lister = Lister::new(settings, VecSource::new(1_000)).unwrap();
    let cancel = CancellationToken::new();

    let mut stream = lister.get(&cancel, Filters::new());
    assert_eq!(stream.recv().await.unwrap().unwrap(), 0);
    cancel.cancel();

    while let Some(envelope) = stream.recv().await {
        assert!(envelope.is_ok(), "cancellation must not surface as an error");
    }
    assert_eq!(stream.phase(), ListingPhase::Closed);

    let fetched = lister.source().pages().len();
    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(lister.source().pages().len(), fetched);
    assert_eq!(fetched, 1);
}

#[tokio::test]
async fn test_pre_cancelled_token_fetches_nothing() {
    let lister = Lister::new(fast_settings(), VecSource::new(640)).unwrap();
    let cancel = CancellationToken::new();
    cancel.cancel();

    let (items, errors) = lister.get(&cancel, Filters::new()).collect_all().await;

    assert!(items.is_empty());
    assert!(errors.is_empty());
    assert!(lister.source().pages().is_empty());
}

#[tokio::test]
async fn test_stream_cancel_does_not_cancel_parent() {
    let lister = Lister::new(fast_settings(), VecSource::new(640)).unwrap();
    let parent = CancellationToken::new();

    let stream = lister.get(&parent, Filters::new());
    stream.cancel();
    let _ = stream.collect_all().await;

    assert!(!parent.is_cancelled());
}

#[tokio::test(start_paused = true)]
async fn test_get_with_timeout_cancels_hanging_source() {
    let lister = Lister::new(fast_settings(), HangingSource::default()).unwrap();

    let stream = lister.get_with_timeout(Duration::from_secs(5), Filters::new());
    let (items, errors) = stream.collect_all().await;

    assert!(items.is_empty());
    assert!(errors.is_empty());
    assert_eq!(*lister.source().calls.lock().unwrap(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_dropping_stream_stops_listing() {
    let settings = ListingSettings::new()
        .with_max_requests_per_second(1)
        .with_max_items_per_request(10);
    let lister = Lister::new(settings, VecSource::new(1_000)).unwrap();

    let stream = lister.get(&CancellationToken::new(), Filters::new());
    let token = stream.cancellation_token().clone();
    drop(stream);
    assert!(token.is_cancelled());

    tokio::time::sleep(Duration::from_secs(30)).await;
    assert!(lister.source().pages().len() <= 1);
}
