use super::{ExtensionMetadata, LookupOutcome, MetadataSource};
use crate::inventory::split_dir_name;
use core::fmt::{Debug, Formatter};
use core::sync::atomic::{AtomicBool, Ordering};
use core::time::Duration;
use indexmap::IndexMap;
use std::sync::Arc;

const LOG_TARGET: &str = "marketplace";

/// Default pause between two consecutive lookups.
pub const DEFAULT_REQUEST_DELAY: Duration = Duration::from_millis(100);

type Observer = Box<dyn Fn(usize, usize, &str) + Send + Sync>;

/// State accumulated by the enrichment pipeline.
///
/// The context is owned by the caller and threaded through [`Enricher::enrich`], so
/// identifiers resolved by an earlier call are never looked up again.
#[derive(Debug, Clone, Default)]
pub struct EnrichmentContext {
    extensions: IndexMap<String, ExtensionMetadata>,
}

impl EnrichmentContext {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Metadata per identifier, in the order the identifiers were resolved.
    #[must_use]
    pub const fn extensions(&self) -> &IndexMap<String, ExtensionMetadata> {
        &self.extensions
    }

    #[must_use]
    pub fn into_extensions(self) -> IndexMap<String, ExtensionMetadata> {
        self.extensions
    }

    #[must_use]
    pub fn is_resolved(&self, identifier: &str) -> bool {
        self.extensions.contains_key(identifier)
    }

    fn record(&mut self, identifier: &str, outcome: LookupOutcome) {
        let _ = self.extensions.insert(identifier.to_string(), outcome.into_metadata(identifier));
    }
}

/// Tally of one [`Enricher::enrich`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnrichmentReport {
    /// Lookups issued by this call.
    pub lookups: usize,
    pub found: usize,
    pub not_found: usize,
    pub failed: usize,

    /// Whether the run stopped early because cancellation was requested.
    pub cancelled: bool,
}

/// Resolves marketplace metadata for a batch of extension directory names.
///
/// Lookups are issued one at a time, once per distinct identifier, with a fixed pause
/// between consecutive lookups. Failures are recorded as placeholder metadata and never
/// abort the batch.
pub struct Enricher<S> {
    source: S,
    delay: Duration,
    observer: Option<Observer>,
    cancel: Option<Arc<AtomicBool>>,
}

impl<S: Debug> Debug for Enricher<S> {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Enricher")
            .field("source", &self.source)
            .field("delay", &self.delay)
            .field("observer", &self.observer.as_ref().map(|_| "<callback>"))
            .field("cancel", &self.cancel)
            .finish()
    }
}

impl<S: MetadataSource> Enricher<S> {
    #[must_use]
    pub const fn new(source: S, delay: Duration) -> Self {
        Self {
            source,
            delay,
            observer: None,
            cancel: None,
        }
    }

    /// Register a callback invoked before each lookup with the 1-based index of the
    /// lookup, the number of lookups planned, and the raw directory name that
    /// introduced the identifier.
    #[must_use]
    pub fn with_observer(mut self, observer: impl Fn(usize, usize, &str) + Send + Sync + 'static) -> Self {
        self.observer = Some(Box::new(observer));
        self
    }

    /// Stop issuing lookups once `flag` is set.
    ///
    /// The flag is checked before each lookup. Entries resolved before that point are kept.
    #[must_use]
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    /// Look up every identifier named by `dir_names` that `context` has not resolved yet.
    pub async fn enrich<I, T>(&self, mut context: EnrichmentContext, dir_names: I) -> (EnrichmentContext, EnrichmentReport)
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        let pending = pending_lookups(&context, dir_names);
        let total = pending.len();
        let mut report = EnrichmentReport::default();

        log::info!(target: LOG_TARGET, "Looking up {total} distinct extension(s)");

        for (index, (identifier, raw_name)) in pending.iter().enumerate() {
            if index > 0 {
                if self.is_cancelled() {
                    report.cancelled = true;
                    break;
                }
                tokio::time::sleep(self.delay).await;
            }

            if self.is_cancelled() {
                report.cancelled = true;
                break;
            }

            if let Some(observer) = &self.observer {
                observer(index + 1, total, raw_name);
            }

            log::debug!(target: LOG_TARGET, "Querying marketplace for '{identifier}' ({}/{total})", index + 1);
            let outcome = self.source.lookup(identifier).await;
            report.lookups += 1;

            match &outcome {
                LookupOutcome::Found(_) => report.found += 1,
                LookupOutcome::NotFound => {
                    report.not_found += 1;
                    log::warn!(target: LOG_TARGET, "Extension '{identifier}' not found in marketplace");
                }
                LookupOutcome::Failed(e) => {
                    report.failed += 1;
                    log::error!(target: LOG_TARGET, "Could not look up '{raw_name}': {e:#}");
                }
            }

            context.record(identifier, outcome);
        }

        if report.cancelled {
            log::warn!(
                target: LOG_TARGET,
                "Lookups cancelled after {} of {total}; keeping the partial results",
                report.lookups
            );
        }

        (context, report)
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(|flag| flag.load(Ordering::Acquire))
    }
}

/// Distinct identifiers not yet in `context`, in first-seen order, each paired with the
/// first raw name that mentioned it.
fn pending_lookups<I, T>(context: &EnrichmentContext, dir_names: I) -> Vec<(String, String)>
where
    I: IntoIterator<Item = T>,
    T: AsRef<str>,
{
    let mut pending: IndexMap<String, String> = IndexMap::new();
    for raw_name in dir_names {
        let raw_name = raw_name.as_ref();
        let (identifier, _) = split_dir_name(raw_name);
        if !context.is_resolved(identifier) && !pending.contains_key(identifier) {
            let _ = pending.insert(identifier.to_string(), raw_name.to_string());
        }
    }

    pending.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ohno::app_err;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Lookup source that answers from a fixed table and records every call.
    #[derive(Debug, Default)]
    struct FakeSource {
        answers: HashMap<String, LookupOutcome>,
        calls: Mutex<Vec<String>>,
    }

    impl FakeSource {
        fn with(mut self, identifier: &str, outcome: LookupOutcome) -> Self {
            let _ = self.answers.insert(identifier.to_string(), outcome);
            self
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl MetadataSource for &FakeSource {
        async fn lookup(&self, identifier: &str) -> LookupOutcome {
            self.calls.lock().unwrap().push(identifier.to_string());
            self.answers.get(identifier).cloned().unwrap_or(LookupOutcome::NotFound)
        }
    }

    fn found(name: &str) -> LookupOutcome {
        LookupOutcome::Found(ExtensionMetadata::new(name, format!("{name} description"), "Publisher"))
    }

    #[tokio::test]
    async fn test_one_lookup_per_identifier() {
        let source = FakeSource::default().with("foo.bar", found("Foo")).with("baz.qux", found("Baz"));
        let enricher = Enricher::new(&source, Duration::ZERO);

        let names = ["foo.bar-1.2.3", "foo.bar-1.2.3", "baz.qux-2.0.0.1-darwin-arm64", "foo.bar-1.3.0"];
        let (context, report) = enricher.enrich(EnrichmentContext::new(), names).await;

        assert_eq!(source.calls(), vec!["foo.bar", "baz.qux"]);
        assert_eq!(report.lookups, 2);
        assert_eq!(report.found, 2);
        assert!(!report.cancelled);

        let keys: Vec<&str> = context.extensions().keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["foo.bar", "baz.qux"]);
        assert_eq!(context.extensions()["foo.bar"].display_name, "Foo");
    }

    #[tokio::test]
    async fn test_not_found_records_placeholder() {
        let source = FakeSource::default();
        let enricher = Enricher::new(&source, Duration::ZERO);

        let (context, report) = enricher.enrich(EnrichmentContext::new(), ["missing.ext-1.0.0"]).await;

        assert_eq!(report.not_found, 1);
        assert_eq!(report.failed, 0);
        assert_eq!(context.extensions()["missing.ext"], ExtensionMetadata::not_found("missing.ext"));
    }

    #[tokio::test]
    async fn test_failure_does_not_stop_batch() {
        let source = FakeSource::default()
            .with("first.ext", found("First"))
            .with("broken.ext", LookupOutcome::Failed(Arc::new(app_err!("connection reset"))))
            .with("last.ext", found("Last"));
        let enricher = Enricher::new(&source, Duration::ZERO);

        let names = ["first.ext-1.0.0", "broken.ext-1.0.0", "last.ext-1.0.0", "broken.ext-1.0.1"];
        let (context, report) = enricher.enrich(EnrichmentContext::new(), names).await;

        assert_eq!(source.calls(), vec!["first.ext", "broken.ext", "last.ext"]);
        assert_eq!(report.found, 2);
        assert_eq!(report.failed, 1);

        let broken = &context.extensions()["broken.ext"];
        assert_eq!(broken.display_name, "broken.ext");
        assert_eq!(broken.publisher, "Unknown");
        assert!(broken.is_lookup_error());
        assert!(broken.description.contains("connection reset"));

        assert_eq!(context.extensions()["last.ext"].display_name, "Last");
    }

    #[tokio::test]
    async fn test_observer_sees_each_lookup() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = Arc::clone(&seen);

        let source = FakeSource::default();
        let enricher = Enricher::new(&source, Duration::ZERO).with_observer(move |index, total, name| {
            seen_clone.lock().unwrap().push((index, total, name.to_string()));
        });

        let names = ["a.b-1.0.0", "a.b-2.0.0", "c.d-1.0.0-darwin-arm64"];
        let _ = enricher.enrich(EnrichmentContext::new(), names).await;

        assert_eq!(
            *seen.lock().unwrap(),
            vec![(1, 2, "a.b-1.0.0".to_string()), (2, 2, "c.d-1.0.0-darwin-arm64".to_string())]
        );
    }

    #[tokio::test]
    async fn test_context_skips_resolved_identifiers() {
        let source = FakeSource::default().with("a.b", found("A"));
        let enricher = Enricher::new(&source, Duration::ZERO);

        let (context, first) = enricher.enrich(EnrichmentContext::new(), ["a.b-1.0.0"]).await;
        let (context, second) = enricher.enrich(context, ["a.b-1.0.0", "c.d-1.0.0"]).await;

        assert_eq!(first.lookups, 1);
        assert_eq!(second.lookups, 1);
        assert_eq!(context.extensions().len(), 2);
        assert_eq!(source.calls(), vec!["a.b", "c.d"]);
    }

    #[tokio::test]
    async fn test_empty_input() {
        let source = FakeSource::default();
        let enricher = Enricher::new(&source, Duration::ZERO);

        let (context, report) = enricher.enrich(EnrichmentContext::new(), Vec::<String>::new()).await;

        assert_eq!(report, EnrichmentReport::default());
        assert!(context.extensions().is_empty());
        assert!(source.calls().is_empty());
    }

    #[tokio::test]
    async fn test_cancel_before_start() {
        let flag = Arc::new(AtomicBool::new(true));
        let source = FakeSource::default();
        let enricher = Enricher::new(&source, Duration::ZERO).with_cancel_flag(flag);

        let (context, report) = enricher.enrich(EnrichmentContext::new(), ["a.b-1.0.0", "c.d-1.0.0"]).await;

        assert!(report.cancelled);
        assert_eq!(report.lookups, 0);
        assert!(context.extensions().is_empty());
        assert!(source.calls().is_empty());
    }

    #[tokio::test]
    async fn test_cancel_keeps_partial_results() {
        let flag = Arc::new(AtomicBool::new(false));
        let flag_clone = Arc::clone(&flag);

        let source = FakeSource::default().with("a.b", found("A"));
        let enricher = Enricher::new(&source, Duration::ZERO)
            .with_cancel_flag(flag)
            .with_observer(move |index, _, _| {
                if index == 2 {
                    flag_clone.store(true, Ordering::Release);
                }
            });

        let names = ["a.b-1.0.0", "c.d-1.0.0", "e.f-1.0.0"];
        let (context, report) = enricher.enrich(EnrichmentContext::new(), names).await;

        // The lookup already announced to the observer still runs; the next one does not
        assert!(report.cancelled);
        assert_eq!(report.lookups, 2);
        assert_eq!(source.calls(), vec!["a.b", "c.d"]);
        assert_eq!(context.extensions()["a.b"].display_name, "A");
        assert!(context.is_resolved("c.d"));
        assert!(!context.is_resolved("e.f"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_delay_only_between_lookups() {
        let delay = Duration::from_millis(100);
        let source = FakeSource::default();
        let enricher = Enricher::new(&source, delay);

        let start = tokio::time::Instant::now();
        let _ = enricher.enrich(EnrichmentContext::new(), ["a.b-1.0.0", "c.d-1.0.0", "e.f-1.0.0"]).await;
        let elapsed = start.elapsed();

        // Two pauses for three lookups, none after the last
        assert_eq!(elapsed, delay * 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_delay_for_single_lookup() {
        let source = FakeSource::default();
        let enricher = Enricher::new(&source, Duration::from_secs(5));

        let start = tokio::time::Instant::now();
        let _ = enricher.enrich(EnrichmentContext::new(), ["a.b-1.0.0", "a.b-1.0.1"]).await;

        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[test]
    fn test_pending_lookups_first_seen_order() {
        let pending = pending_lookups(
            &EnrichmentContext::new(),
            ["z.z-1.0.0", "a.a-1.0.0", "z.z-2.0.0", "no-version"],
        );
        assert_eq!(
            pending,
            vec![
                ("z.z".to_string(), "z.z-1.0.0".to_string()),
                ("a.a".to_string(), "a.a-1.0.0".to_string()),
                ("no-version".to_string(), "no-version".to_string()),
            ]
        );
    }
}
