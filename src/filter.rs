//! Debounced substring filtering over shared in-memory records
//!
//! A [`DebouncedFilter`] owns the search state of one view. Each
//! [`DebouncedFilter::set_query`] call schedules a recomputation after the
//! debounce delay and cancels the one still pending, so a burst of keystrokes
//! costs a single pass over the records.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;

/// Delay between the last query change and the recomputation
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

/// Text fields of a record that a query is matched against.
pub type FieldSelector<T> = Arc<dyn Fn(&T) -> Vec<&str> + Send + Sync>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchOptions {
    /// Ignore Arabic diacritics and letter-form variants when matching
    #[serde(default)]
    pub fold_arabic: bool,
}

/// Normalize Arabic text for matching: removes diacritics, normalizes hamza/alif variants
fn normalize_arabic(text: &str) -> String {
    text.chars()
        .filter_map(|c| match c {
            '\u{064B}'..='\u{065F}' | '\u{0670}' => None,
            'أ' | 'إ' | 'آ' | 'ٱ' => Some('ا'),
            'ؤ' => Some('و'),
            'ئ' | 'ى' => Some('ي'),
            'ک' | 'گ' | 'ڭ' => Some('ك'),
            'ی' | 'ے' => Some('ي'),
            'ۀ' | 'ە' => Some('ه'),
            'ۃ' => Some('ة'),
            _ => Some(c),
        })
        .collect()
}

/// Fold text into the form queries are compared in.
pub fn fold(text: &str, options: MatchOptions) -> String {
    let lower = text.to_lowercase();
    if options.fold_arabic {
        normalize_arabic(&lower)
    } else {
        lower
    }
}

/// Indices of the records whose selected fields contain `query`,
/// case-insensitively, in original order. An empty query keeps everything.
pub fn filter_indices<T>(
    records: &[T],
    query: &str,
    selector: &dyn Fn(&T) -> Vec<&str>,
    options: MatchOptions,
) -> Vec<usize> {
    if query.is_empty() {
        return (0..records.len()).collect();
    }

    let needle = fold(query, options);
    records
        .iter()
        .enumerate()
        .filter(|&(_, record)| {
            selector(record)
                .into_iter()
                .any(|field| fold(field, options).contains(&needle))
        })
        .map(|(i, _)| i)
        .collect()
}

/// Query, matching subset and loading flag of one search box.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchState {
    pub query: String,
    /// Indices into the record array, in original order
    pub matches: Arc<Vec<usize>>,
    /// True while a scheduled recomputation has not fired yet
    pub loading: bool,
    /// Query the current `matches` were computed for
    pub evaluated_query: Option<String>,
    generation: u64,
}

impl SearchState {
    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }
}

pub struct DebouncedFilter<T> {
    records: Arc<Vec<T>>,
    selector: FieldSelector<T>,
    options: MatchOptions,
    delay: Duration,
    state: Arc<watch::Sender<SearchState>>,
    pending: Mutex<Option<JoinHandle<()>>>,
    evaluations: Arc<AtomicU64>,
}

impl<T: Send + Sync + 'static> DebouncedFilter<T> {
    pub fn new(records: Arc<Vec<T>>, selector: FieldSelector<T>, delay: Duration) -> Self {
        let initial = SearchState {
            query: String::new(),
            matches: Arc::new((0..records.len()).collect()),
            loading: false,
            evaluated_query: None,
            generation: 0,
        };
        let (state, _) = watch::channel(initial);

        Self {
            records,
            selector,
            options: MatchOptions::default(),
            delay,
            state: Arc::new(state),
            pending: Mutex::new(None),
            evaluations: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn with_options(mut self, options: MatchOptions) -> Self {
        self.options = options;
        self
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Schedule filtering by `query` after the debounce delay, replacing any
    /// pending recomputation. Outside a tokio runtime the query is applied
    /// immediately.
    pub fn set_query(&self, query: impl Into<String>) {
        let query = query.into();
        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => {
                self.apply_now(query);
                return;
            }
        };

        let generation = self.begin(&query, true);

        let records = Arc::clone(&self.records);
        let selector = Arc::clone(&self.selector);
        let state = Arc::clone(&self.state);
        let evaluations = Arc::clone(&self.evaluations);
        let options = self.options;
        let delay = self.delay;

        let handle = runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            evaluations.fetch_add(1, Ordering::Relaxed);
            let matches = filter_indices(&records, &query, &*selector, options);
            commit(&state, generation, query, matches);
        });

        self.replace_pending(Some(handle));
    }

    /// Filter by `query` right away, cancelling any pending recomputation.
    pub fn apply_now(&self, query: impl Into<String>) {
        let query = query.into();
        self.replace_pending(None);
        let generation = self.begin(&query, false);

        self.evaluations.fetch_add(1, Ordering::Relaxed);
        let matches = filter_indices(&self.records, &query, &*self.selector, self.options);
        commit(&self.state, generation, query, matches);
    }

    fn begin(&self, query: &str, loading: bool) -> u64 {
        let mut generation = 0;
        self.state.send_modify(|s| {
            s.generation += 1;
            s.query = query.to_string();
            s.loading = loading;
            generation = s.generation;
        });
        generation
    }

    fn replace_pending(&self, handle: Option<JoinHandle<()>>) {
        let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(previous) = std::mem::replace(&mut *pending, handle) {
            previous.abort();
        }
    }

    pub fn snapshot(&self) -> SearchState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SearchState> {
        self.state.subscribe()
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().loading
    }

    /// Wait for the pending recomputation, if any, and return the result.
    pub async fn settled(&self) -> SearchState {
        let mut rx = self.state.subscribe();
        loop {
            {
                let state = rx.borrow_and_update();
                if !state.loading {
                    return state.clone();
                }
            }
            if rx.changed().await.is_err() {
                return self.snapshot();
            }
        }
    }

    /// Number of passes made over the records so far.
    pub fn evaluations(&self) -> u64 {
        self.evaluations.load(Ordering::Relaxed)
    }

    pub fn records(&self) -> &Arc<Vec<T>> {
        &self.records
    }

    /// The current matching records, in original order.
    pub fn matching(&self) -> Vec<&T> {
        let matches = Arc::clone(&self.state.borrow().matches);
        matches.iter().filter_map(|&i| self.records.get(i)).collect()
    }

    pub fn results(&self) -> Vec<T>
    where
        T: Clone,
    {
        self.matching().into_iter().cloned().collect()
    }
}

fn commit(state: &watch::Sender<SearchState>, generation: u64, query: String, matches: Vec<usize>) {
    state.send_if_modified(|s| {
        if s.generation != generation {
            debug!(query = %query, "Discarding superseded filter result");
            return false;
        }
        s.matches = Arc::new(matches);
        s.loading = false;
        s.evaluated_query = Some(query);
        true
    });
}

impl<T> Drop for DebouncedFilter<T> {
    fn drop(&mut self) {
        if let Ok(mut pending) = self.pending.lock() {
            if let Some(handle) = pending.take() {
                handle.abort();
            }
        }
    }
}
