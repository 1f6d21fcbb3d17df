use std::{
    collections::{HashMap, HashSet},
    time::Duration,
};

use crate::{Columns, TrackId, TrackMetadata, pc};

/// The two catalog operations the fetcher needs.
///
/// Implemented for [`pc::Client`]; tests substitute an in-memory catalog.
pub trait Catalog {
    /// One page of track search results.
    fn search_tracks(
        &self,
        request: &pc::SearchRequest,
    ) -> impl Future<Output = pc::ClientResult<pc::Paging<pc::Track>>>;

    /// Audio features for a batch of track ids.
    fn audio_features(
        &self,
        ids: &[String],
    ) -> impl Future<Output = pc::ClientResult<Vec<Option<pc::AudioFeatures>>>>;
}
impl<C: pc::CredentialManager> Catalog for pc::Client<C> {
    async fn search_tracks(
        &self,
        request: &pc::SearchRequest,
    ) -> pc::ClientResult<pc::Paging<pc::Track>> {
        pc::Client::search_tracks(self, request).await
    }

    async fn audio_features(
        &self,
        ids: &[String],
    ) -> pc::ClientResult<Vec<Option<pc::AudioFeatures>>> {
        pc::Client::audio_features(self, ids).await
    }
}

/// One bounded search request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchWindow {
    /// The position of this window in the run, from 0
    pub index: u32,
    /// The offset of the first result
    pub offset: u32,
    /// The number of results requested
    pub limit: u32,
}

/// The windows that tile `[0, total_count)` in `page_size` steps, in increasing offset order.
///
/// The final window is shortened if `total_count` is not a multiple of `page_size`.
pub fn windows(page_size: u32, total_count: u32) -> impl Iterator<Item = FetchWindow> {
    let end = if page_size == 0 { 0 } else { total_count };
    (0..end)
        .step_by(page_size.max(1) as usize)
        .enumerate()
        .map(move |(index, offset)| FetchWindow {
            index: index as u32,
            offset,
            limit: page_size.min(total_count - offset),
        })
}

/// How transient failures of a single call are retried before the window is given up on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt. Zero means a failed call skips the window immediately.
    pub max_retries: u32,
    /// The delay before the first retry; doubled for each subsequent one.
    pub base_delay: Duration,
}
impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 0,
            base_delay: Duration::from_secs(1),
        }
    }
}
impl RetryPolicy {
    /// The delay before retry number `attempt` (from 0), absent a server-supplied one.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(2u32.saturating_pow(attempt))
    }

    async fn run<T, Fut>(&self, what: &str, mut call: impl FnMut() -> Fut) -> pc::ClientResult<T>
    where
        Fut: Future<Output = pc::ClientResult<T>>,
    {
        let mut attempt = 0;
        loop {
            match call().await {
                Err(e) if e.is_transient() && attempt < self.max_retries => {
                    let delay = e.retry_after().unwrap_or_else(|| self.delay_for(attempt));
                    tracing::debug!("{what} failed ({e}), retrying in {delay:?}");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                result => return result,
            }
        }
    }
}

/// What to collect.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// The search predicate used for every window.
    pub query: pc::SearchQuery,
    /// Results per window.
    pub page_size: u32,
    /// Total results to request across all windows.
    pub total_count: u32,
    /// Restrict results to tracks playable in this market.
    pub market: Option<String>,
    /// Retry behaviour for transient failures.
    pub retry: RetryPolicy,
}

/// Why a window contributed fewer records than it found.
#[derive(Debug)]
pub enum WindowFailure {
    /// The search call failed; the window contributed nothing.
    Search(pc::ClientError),
    /// The feature lookup failed; every track found in the window was dropped.
    Features(pc::ClientError),
}
impl std::fmt::Display for WindowFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WindowFailure::Search(e) => write!(f, "search failed: {e}"),
            WindowFailure::Features(e) => write!(f, "feature lookup failed: {e}"),
        }
    }
}

/// What happened to one window.
#[derive(Debug)]
pub struct WindowReport {
    /// The window this report is for
    pub window: FetchWindow,
    /// Tracks returned by the search call
    pub tracks_found: usize,
    /// Complete records appended to the columns
    pub records: usize,
    /// Tracks skipped because their id was already collected in this run
    pub duplicates: usize,
    /// Search entries skipped because they were `null` or had an unparseable release date
    pub malformed: usize,
    /// Tracks dropped because the feature lookup had nothing for them
    pub missing_features: usize,
    /// The failure that cut the window short, if any
    pub failure: Option<WindowFailure>,
}
impl WindowReport {
    fn new(window: FetchWindow) -> Self {
        Self {
            window,
            tracks_found: 0,
            records: 0,
            duplicates: 0,
            malformed: 0,
            missing_features: 0,
            failure: None,
        }
    }
}

/// Receives progress updates from [`fetch_all`]. Purely advisory.
pub trait FetchProgress {
    /// Called before a window's search request is issued.
    fn window_started(&mut self, _window: &FetchWindow, _window_count: u32) {}
    /// Called after a window has been fully processed, before anything is logged about it.
    fn window_finished(&mut self, _report: &WindowReport) {}
}
impl FetchProgress for () {}

/// The output of [`fetch_all`].
#[derive(Debug)]
pub struct FetchOutput {
    /// The accumulated records, one column per field.
    pub columns: Columns,
    /// One report per window, in window order.
    pub reports: Vec<WindowReport>,
}
impl FetchOutput {
    /// Totals across every window.
    pub fn summary(&self) -> FetchSummary {
        let mut summary = FetchSummary {
            windows: self.reports.len(),
            ..Default::default()
        };
        for report in &self.reports {
            summary.failed_windows += report.failure.is_some() as usize;
            summary.tracks_found += report.tracks_found;
            summary.records += report.records;
            summary.duplicates += report.duplicates;
            summary.malformed += report.malformed;
            summary.missing_features += report.missing_features;
        }
        summary
    }
}

/// Totals across a run; see [`WindowReport`] for the meaning of each count.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[allow(missing_docs)]
pub struct FetchSummary {
    pub windows: usize,
    pub failed_windows: usize,
    pub tracks_found: usize,
    pub records: usize,
    pub duplicates: usize,
    pub malformed: usize,
    pub missing_features: usize,
}

/// Runs every window in order: a search request, then a feature lookup for the ids it returned.
///
/// Failures are confined to the window they happen in and recorded in its report; the run
/// always covers every window.
pub async fn fetch_all(
    catalog: &impl Catalog,
    config: &FetchConfig,
    progress: &mut impl FetchProgress,
) -> FetchOutput {
    let window_count = windows(config.page_size, config.total_count).count() as u32;
    let mut columns = Columns::default();
    let mut seen = HashSet::new();
    let mut reports = vec![];

    for window in windows(config.page_size, config.total_count) {
        progress.window_started(&window, window_count);
        let report = fetch_window(catalog, config, window, &mut seen, &mut columns).await;
        progress.window_finished(&report);
        if let Some(failure) = &report.failure {
            tracing::warn!(
                "window {} (offset {}): {failure}",
                window.index,
                window.offset
            );
        } else {
            tracing::debug!(
                "window {} (offset {}): {} found, {} recorded",
                window.index,
                window.offset,
                report.tracks_found,
                report.records
            );
        }
        reports.push(report);
    }

    FetchOutput { columns, reports }
}

async fn fetch_window(
    catalog: &impl Catalog,
    config: &FetchConfig,
    window: FetchWindow,
    seen: &mut HashSet<TrackId>,
    columns: &mut Columns,
) -> WindowReport {
    let mut report = WindowReport::new(window);

    let request = pc::SearchRequest {
        query: config.query.clone(),
        limit: window.limit,
        offset: window.offset,
        market: config.market.clone(),
    };
    let page = match config
        .retry
        .run("search", || catalog.search_tracks(&request))
        .await
    {
        Ok(page) => page,
        Err(e) => {
            report.failure = Some(WindowFailure::Search(e));
            return report;
        }
    };
    report.tracks_found = page.items.len();

    let mut pending: Vec<TrackMetadata> = vec![];
    for track in &page.items {
        let Some(track) = track else {
            report.malformed += 1;
            continue;
        };
        let id = TrackId(track.id.clone());
        if seen.contains(&id) || pending.iter().any(|m| m.id == id) {
            report.duplicates += 1;
            continue;
        }
        match TrackMetadata::try_from(track) {
            Ok(metadata) => pending.push(metadata),
            Err(e) => {
                tracing::debug!("skipping track {id}: {e}");
                report.malformed += 1;
            }
        }
    }
    if pending.is_empty() {
        return report;
    }

    let ids: Vec<String> = pending.iter().map(|m| m.id.0.clone()).collect();
    let mut features: HashMap<String, pc::AudioFeatures> = HashMap::new();
    for batch in ids.chunks(pc::AUDIO_FEATURES_BATCH_LIMIT) {
        match config
            .retry
            .run("feature lookup", || catalog.audio_features(batch))
            .await
        {
            Ok(found) => features.extend(found.into_iter().flatten().map(|f| (f.id.clone(), f))),
            Err(e) => {
                report.missing_features = pending.len();
                report.failure = Some(WindowFailure::Features(e));
                return report;
            }
        }
    }

    for metadata in pending {
        let Some(features) = features.remove(&metadata.id.0) else {
            tracing::debug!("no audio features for track {}", metadata.id);
            report.missing_features += 1;
            continue;
        };
        seen.insert(metadata.id.clone());
        columns.push_metadata(metadata);
        columns.push_features(&features);
        report.records += 1;
    }

    report
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::test_util::{features, track};

    #[derive(Default)]
    struct FakeCatalog {
        failing_searches: HashSet<u32>,
        failing_lookups: HashSet<u32>,
        pages: HashMap<u32, Vec<Option<pc::Track>>>,
        missing_features: HashSet<String>,
        reverse_features: bool,
        transient_failures_left: RefCell<u32>,
        searches: RefCell<Vec<(u32, u32)>>,
        lookups: RefCell<Vec<Vec<String>>>,
    }
    impl FakeCatalog {
        fn page(self, offset: u32, tracks: Vec<pc::Track>) -> Self {
            self.page_with_gaps(offset, tracks.into_iter().map(Some).collect())
        }

        fn page_with_gaps(mut self, offset: u32, tracks: Vec<Option<pc::Track>>) -> Self {
            self.pages.insert(offset, tracks);
            self
        }
    }
    impl Catalog for FakeCatalog {
        async fn search_tracks(
            &self,
            request: &pc::SearchRequest,
        ) -> pc::ClientResult<pc::Paging<pc::Track>> {
            self.searches.borrow_mut().push((request.offset, request.limit));
            {
                let mut left = self.transient_failures_left.borrow_mut();
                if *left > 0 {
                    *left -= 1;
                    return Err(pc::ClientError::RateLimited {
                        retry_after: Some(Duration::ZERO),
                    });
                }
            }
            if self.failing_searches.contains(&request.offset) {
                return Err(pc::ClientError::Api {
                    status: 500,
                    message: Some("boom".to_string()),
                });
            }
            Ok(pc::Paging {
                items: self.pages.get(&request.offset).cloned().unwrap_or_default(),
                limit: request.limit,
                offset: request.offset,
                total: 2000,
                next: None,
            })
        }

        async fn audio_features(
            &self,
            ids: &[String],
        ) -> pc::ClientResult<Vec<Option<pc::AudioFeatures>>> {
            self.lookups.borrow_mut().push(ids.to_vec());
            let offset = self
                .pages
                .iter()
                .find(|(_, tracks)| tracks.iter().flatten().any(|t| ids.contains(&t.id)))
                .map(|(offset, _)| *offset);
            if offset.is_some_and(|o| self.failing_lookups.contains(&o)) {
                return Err(pc::ClientError::Api {
                    status: 400,
                    message: None,
                });
            }
            let mut out: Vec<_> = ids
                .iter()
                .map(|id| (!self.missing_features.contains(id)).then(|| features(id)))
                .collect();
            if self.reverse_features {
                out.reverse();
            }
            Ok(out)
        }
    }

    fn config(page_size: u32, total_count: u32) -> FetchConfig {
        FetchConfig {
            query: pc::SearchQuery::year_range(2018, 2020),
            page_size,
            total_count,
            market: None,
            retry: RetryPolicy::default(),
        }
    }

    #[derive(Default)]
    struct RecordingProgress {
        started: Vec<(u32, u32)>,
        finished: Vec<u32>,
    }
    impl FetchProgress for RecordingProgress {
        fn window_started(&mut self, window: &FetchWindow, window_count: u32) {
            self.started.push((window.index, window_count));
        }
        fn window_finished(&mut self, report: &WindowReport) {
            self.finished.push(report.window.index);
        }
    }

    #[test]
    fn test_windows_tile_range() {
        let offsets: Vec<_> = windows(50, 2000).map(|w| (w.offset, w.limit)).collect();
        assert_eq!(offsets.len(), 40);
        for (i, (offset, limit)) in offsets.iter().enumerate() {
            assert_eq!(*offset, i as u32 * 50);
            assert_eq!(*limit, 50);
        }

        let uneven: Vec<_> = windows(50, 120).map(|w| (w.index, w.offset, w.limit)).collect();
        assert_eq!(uneven, vec![(0, 0, 50), (1, 50, 50), (2, 100, 20)]);

        assert_eq!(windows(50, 0).count(), 0);
        assert_eq!(windows(0, 100).count(), 0);
    }

    #[tokio::test]
    async fn test_failed_search_window_is_skipped() {
        let mut catalog = FakeCatalog::default().page(
            2,
            vec![
                track("c", "C", 30, "2019-01-01"),
                track("d", "D", 40, "2019-02-01"),
            ],
        );
        catalog.failing_searches.insert(0);

        let mut progress = RecordingProgress::default();
        let output = fetch_all(&catalog, &config(2, 4), &mut progress).await;

        assert_eq!(*catalog.searches.borrow(), vec![(0, 2), (2, 2)]);
        assert_eq!(catalog.lookups.borrow().len(), 1);
        assert!(matches!(
            output.reports[0].failure,
            Some(WindowFailure::Search(_))
        ));
        assert_eq!(output.reports[0].records, 0);
        assert!(output.reports[1].failure.is_none());
        assert_eq!(output.columns.rectangular_len(), Some(2));
        assert_eq!(output.columns.id, vec![TrackId("c".into()), TrackId("d".into())]);
        assert_eq!(progress.started, vec![(0, 2), (1, 2)]);
        assert_eq!(progress.finished, vec![0, 1]);

        let summary = output.summary();
        assert_eq!(summary.windows, 2);
        assert_eq!(summary.failed_windows, 1);
        assert_eq!(summary.records, 2);
    }

    #[tokio::test]
    async fn test_failed_feature_lookup_drops_window_rows() {
        let mut catalog = FakeCatalog::default()
            .page(0, vec![track("a", "A", 10, "2019"), track("b", "B", 20, "2019")])
            .page(2, vec![track("c", "C", 30, "2019"), track("d", "D", 40, "2019")]);
        catalog.failing_lookups.insert(0);

        let output = fetch_all(&catalog, &config(2, 4), &mut ()).await;

        assert!(matches!(
            output.reports[0].failure,
            Some(WindowFailure::Features(_))
        ));
        assert_eq!(output.reports[0].tracks_found, 2);
        assert_eq!(output.reports[0].missing_features, 2);
        // The next window's lookup only carries its own ids.
        assert_eq!(
            catalog.lookups.borrow()[1],
            vec!["c".to_string(), "d".to_string()]
        );
        assert_eq!(output.columns.rectangular_len(), Some(2));
        assert_eq!(output.columns.name, vec!["C".to_string(), "D".to_string()]);
    }

    #[tokio::test]
    async fn test_features_are_joined_by_id() {
        let mut catalog = FakeCatalog::default().page(
            0,
            vec![
                track("a", "A", 10, "2019"),
                track("b", "B", 20, "2019"),
                track("c", "C", 30, "2019"),
            ],
        );
        catalog.reverse_features = true;
        catalog.missing_features.insert("b".to_string());

        let output = fetch_all(&catalog, &config(3, 3), &mut ()).await;

        let columns = &output.columns;
        assert_eq!(columns.rectangular_len(), Some(2));
        assert_eq!(columns.id, vec![TrackId("a".into()), TrackId("c".into())]);
        // `features` derives tempo from the id, so misalignment would show here.
        assert_eq!(columns.tempo, vec![features("a").tempo, features("c").tempo]);
        assert_eq!(output.reports[0].missing_features, 1);
    }

    #[tokio::test]
    async fn test_duplicates_and_malformed_tracks_are_skipped() {
        let catalog = FakeCatalog::default()
            .page(
                0,
                vec![
                    track("a", "A", 10, "2019"),
                    track("a", "A", 10, "2019"),
                    track("x", "X", 10, "sometime"),
                ],
            )
            .page(3, vec![track("a", "A", 10, "2019"), track("b", "B", 5, "2018")]);

        let output = fetch_all(&catalog, &config(3, 6), &mut ()).await;

        let summary = output.summary();
        assert_eq!(summary.tracks_found, 5);
        assert_eq!(summary.duplicates, 2);
        assert_eq!(summary.malformed, 1);
        assert_eq!(summary.records, 2);
        assert_eq!(output.columns.id, vec![TrackId("a".into()), TrackId("b".into())]);
    }

    #[tokio::test]
    async fn test_transient_failures_are_retried_when_enabled() {
        let catalog = FakeCatalog::default().page(0, vec![track("a", "A", 10, "2019")]);
        *catalog.transient_failures_left.borrow_mut() = 2;

        let mut config = config(1, 1);
        config.retry = RetryPolicy {
            max_retries: 2,
            base_delay: Duration::ZERO,
        };
        let output = fetch_all(&catalog, &config, &mut ()).await;

        assert_eq!(catalog.searches.borrow().len(), 3);
        assert!(output.reports[0].failure.is_none());
        assert_eq!(output.columns.rectangular_len(), Some(1));
    }

    #[tokio::test]
    async fn test_transient_failures_skip_window_by_default() {
        let catalog = FakeCatalog::default().page(0, vec![track("a", "A", 10, "2019")]);
        *catalog.transient_failures_left.borrow_mut() = 1;

        let output = fetch_all(&catalog, &config(1, 1), &mut ()).await;

        assert_eq!(catalog.searches.borrow().len(), 1);
        assert!(matches!(
            output.reports[0].failure,
            Some(WindowFailure::Search(pc::ClientError::RateLimited { .. }))
        ));
        assert_eq!(output.columns.rectangular_len(), Some(0));
    }

    #[tokio::test]
    async fn test_feature_lookups_respect_batch_limit() {
        let tracks: Vec<_> = (0..150)
            .map(|i| track(&format!("t{i}"), "T", 10, "2019"))
            .collect();
        let catalog = FakeCatalog::default().page(0, tracks);

        let output = fetch_all(&catalog, &config(150, 150), &mut ()).await;

        let batch_sizes: Vec<_> = catalog.lookups.borrow().iter().map(Vec::len).collect();
        assert_eq!(batch_sizes, vec![pc::AUDIO_FEATURES_BATCH_LIMIT, 50]);
        assert!(output.reports[0].failure.is_none());
        assert_eq!(output.columns.rectangular_len(), Some(150));
    }

    #[tokio::test]
    async fn test_null_search_items_count_as_malformed() {
        let catalog = FakeCatalog::default().page_with_gaps(
            0,
            vec![Some(track("a", "A", 10, "2019")), None, Some(track("b", "B", 20, "2019"))],
        );

        let output = fetch_all(&catalog, &config(3, 3), &mut ()).await;

        assert_eq!(output.reports[0].tracks_found, 3);
        assert_eq!(output.reports[0].malformed, 1);
        assert_eq!(output.columns.id, vec![TrackId("a".into()), TrackId("b".into())]);
    }

    #[test]
    fn test_retry_delay_doubles() {
        let policy = RetryPolicy {
            max_retries: 3,
            base_delay: Duration::from_millis(100),
        };
        assert_eq!(policy.delay_for(0), Duration::from_millis(100));
        assert_eq!(policy.delay_for(1), Duration::from_millis(200));
        assert_eq!(policy.delay_for(3), Duration::from_millis(800));
    }
}
