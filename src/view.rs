//! Per-unit view state machines
//!
//! A view owns its selection and one [`ViewState`]. Every selection change
//! starts a new request generation; a response is committed only while its
//! generation is still the current one, so a slow answer to an earlier
//! selection can never overwrite a newer one. Dropping a view aborts its
//! in-flight requests.

use crate::align::{align, align_quran, AlignMode, AlignedSurah, Alignment};
use crate::source::{RecordSource, RemoteSource};
use crate::verses::{AyahRef, Edition, UnitKind, UnitText, Verse};
use futures_util::future::try_join;
use std::future::Future;
use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Shown when either request of a two-source view fails
pub const DUAL_SOURCE_ERROR: &str = "Failed to fetch data from one or more APIs";

pub const AYAH_NOT_FOUND: &str =
    "Sorry, we couldn't find the ayah. Please check the reference and try again.";

/// Locator a view opens on.
pub fn default_locator(kind: UnitKind) -> u32 {
    match kind {
        UnitKind::Juz => 30,
        UnitKind::Manzil => 7,
        _ => 1,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ViewState<T> {
    Idle,
    Loading,
    Ready(T),
    Error(String),
}

impl<T> ViewState<T> {
    pub fn is_loading(&self) -> bool {
        matches!(self, ViewState::Loading)
    }

    pub fn ready(&self) -> Option<&T> {
        match self {
            ViewState::Ready(data) => Some(data),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            ViewState::Error(message) => Some(message),
            _ => None,
        }
    }
}

/// A view state tagged with the request generation that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewSnapshot<T> {
    pub generation: u64,
    pub state: ViewState<T>,
}

/// Generation-gated state shared by every view type.
struct ViewCore<T> {
    state: Arc<watch::Sender<ViewSnapshot<T>>>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl<T: Clone + Send + Sync + 'static> ViewCore<T> {
    fn new() -> Self {
        let (state, _) = watch::channel(ViewSnapshot {
            generation: 0,
            state: ViewState::Idle,
        });
        Self {
            state: Arc::new(state),
            tasks: Mutex::new(Vec::new()),
        }
    }

    /// Enter `Loading` under a fresh generation and run `load` in the
    /// background. Earlier requests keep running but can no longer commit.
    fn launch<F>(&self, load: F)
    where
        F: Future<Output = Result<T, String>> + Send + 'static,
    {
        let generation = self.bump(ViewState::Loading);

        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => {
                commit(&self.state, generation, Err("No async runtime to load the view".to_string()));
                return;
            }
        };

        let state = Arc::clone(&self.state);
        let handle = runtime.spawn(async move {
            let outcome = load.await;
            commit(&state, generation, outcome);
        });

        let mut tasks = self.tasks.lock().unwrap_or_else(|e| e.into_inner());
        tasks.retain(|t| !t.is_finished());
        tasks.push(handle);
    }

    /// Settle synchronously, bypassing any request.
    fn fail(&self, message: impl Into<String>) {
        let generation = self.bump(ViewState::Loading);
        commit(&self.state, generation, Err(message.into()));
    }

    fn bump(&self, next: ViewState<T>) -> u64 {
        let mut generation = 0;
        self.state.send_modify(|s| {
            s.generation += 1;
            s.state = next;
            generation = s.generation;
        });
        generation
    }

    fn state(&self) -> ViewState<T> {
        self.state.borrow().state.clone()
    }

    fn subscribe(&self) -> watch::Receiver<ViewSnapshot<T>> {
        self.state.subscribe()
    }

    async fn settled(&self) -> ViewState<T> {
        let mut rx = self.state.subscribe();
        loop {
            {
                let snapshot = rx.borrow_and_update();
                if !snapshot.state.is_loading() {
                    return snapshot.state.clone();
                }
            }
            if rx.changed().await.is_err() {
                return self.state();
            }
        }
    }
}

fn commit<T>(state: &watch::Sender<ViewSnapshot<T>>, generation: u64, outcome: Result<T, String>) {
    state.send_if_modified(|s| {
        if s.generation != generation {
            debug!(generation, current = s.generation, "Discarding stale view response");
            return false;
        }
        s.state = match outcome {
            Ok(data) => ViewState::Ready(data),
            Err(message) => ViewState::Error(message),
        };
        true
    });
}

impl<T> Drop for ViewCore<T> {
    fn drop(&mut self) {
        self.state.send_modify(|s| s.generation += 1);
        if let Ok(mut tasks) = self.tasks.lock() {
            for task in tasks.drain(..) {
                task.abort();
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub locator: u32,
    pub edition: Edition,
}

fn lock_selection(selection: &Mutex<Selection>) -> std::sync::MutexGuard<'_, Selection> {
    selection.lock().unwrap_or_else(|e| e.into_inner())
}

/// Single-source view of one unit (Surah, Juz).
pub struct UnitView {
    kind: UnitKind,
    source: Arc<dyn RecordSource>,
    selection: Mutex<Selection>,
    core: ViewCore<Arc<UnitText>>,
}

impl UnitView {
    pub fn new(kind: UnitKind, source: Arc<dyn RecordSource>, edition: Edition) -> Self {
        Self {
            kind,
            source,
            selection: Mutex::new(Selection {
                locator: default_locator(kind),
                edition,
            }),
            core: ViewCore::new(),
        }
    }

    pub fn kind(&self) -> UnitKind {
        self.kind
    }

    pub fn selection(&self) -> Selection {
        lock_selection(&self.selection).clone()
    }

    pub fn select(&self, locator: u32) {
        lock_selection(&self.selection).locator = locator;
        self.reload();
    }

    pub fn select_edition(&self, edition: Edition) {
        lock_selection(&self.selection).edition = edition;
        self.reload();
    }

    /// Fetch the current selection again.
    pub fn reload(&self) {
        let Selection { locator, edition } = self.selection();
        let kind = self.kind;
        let source = Arc::clone(&self.source);

        self.core.launch(async move {
            source.fetch(kind, locator, &edition).await.map_err(|e| {
                warn!(%kind, locator, %edition, error = %e, "Unit fetch failed");
                format!("Failed to fetch {}", kind.label().to_lowercase())
            })
        });
    }

    pub fn state(&self) -> ViewState<Arc<UnitText>> {
        self.core.state()
    }

    pub fn subscribe(&self) -> watch::Receiver<ViewSnapshot<Arc<UnitText>>> {
        self.core.subscribe()
    }

    /// Wait until the current request, if any, has settled.
    pub async fn settled(&self) -> ViewState<Arc<UnitText>> {
        self.core.settled().await
    }
}

/// A unit fetched from two sources at once and aligned verse by verse:
/// the translation (primary) and the Arabic script (secondary).
pub struct DualSourceView {
    kind: UnitKind,
    primary: Arc<dyn RecordSource>,
    secondary: Arc<dyn RecordSource>,
    secondary_edition: Edition,
    mode: AlignMode,
    selection: Mutex<Selection>,
    core: ViewCore<Arc<Alignment>>,
}

impl DualSourceView {
    pub fn new(kind: UnitKind, primary: Arc<dyn RecordSource>, secondary: Arc<dyn RecordSource>) -> Self {
        Self {
            kind,
            primary,
            secondary,
            secondary_edition: Edition::uthmani(),
            mode: AlignMode::default(),
            selection: Mutex::new(Selection {
                locator: default_locator(kind),
                edition: Edition::asad(),
            }),
            core: ViewCore::new(),
        }
    }

    pub fn with_editions(mut self, primary: Edition, secondary: Edition) -> Self {
        self.selection.get_mut().unwrap_or_else(|e| e.into_inner()).edition = primary;
        self.secondary_edition = secondary;
        self
    }

    pub fn with_mode(mut self, mode: AlignMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn kind(&self) -> UnitKind {
        self.kind
    }

    pub fn selection(&self) -> Selection {
        lock_selection(&self.selection).clone()
    }

    pub fn secondary_edition(&self) -> &Edition {
        &self.secondary_edition
    }

    pub fn select(&self, locator: u32) {
        lock_selection(&self.selection).locator = locator;
        self.reload();
    }

    /// Change the translation edition; the script edition is fixed.
    pub fn select_edition(&self, edition: Edition) {
        lock_selection(&self.selection).edition = edition;
        self.reload();
    }

    pub fn reload(&self) {
        let Selection { locator, edition } = self.selection();
        let kind = self.kind;
        let mode = self.mode;
        let primary = Arc::clone(&self.primary);
        let secondary = Arc::clone(&self.secondary);
        let secondary_edition = self.secondary_edition.clone();

        self.core.launch(async move {
            let fetched = try_join(
                primary.fetch(kind, locator, &edition),
                secondary.fetch(kind, locator, &secondary_edition),
            )
            .await;

            match fetched {
                Ok((translation, script)) => {
                    let alignment = align(Some(translation.ayahs.as_slice()), Some(script.ayahs.as_slice()), mode);
                    if !alignment.is_exact() {
                        warn!(
                            %kind,
                            locator,
                            unmatched_primary = alignment.unmatched_primary.len(),
                            unmatched_secondary = alignment.unmatched_secondary.len(),
                            "Editions do not align exactly"
                        );
                    }
                    Ok(Arc::new(alignment))
                }
                Err(e) => {
                    warn!(%kind, locator, error = %e, "Two-source fetch failed");
                    Err(DUAL_SOURCE_ERROR.to_string())
                }
            }
        });
    }

    pub fn state(&self) -> ViewState<Arc<Alignment>> {
        self.core.state()
    }

    pub fn subscribe(&self) -> watch::Receiver<ViewSnapshot<Arc<Alignment>>> {
        self.core.subscribe()
    }

    pub async fn settled(&self) -> ViewState<Arc<Alignment>> {
        self.core.settled().await
    }
}

/// Lookup of one verse by reference.
pub struct AyahView {
    source: RemoteSource,
    edition: Mutex<Edition>,
    reference: Mutex<Option<AyahRef>>,
    core: ViewCore<Arc<Verse>>,
}

impl AyahView {
    pub fn new(source: RemoteSource) -> Self {
        Self {
            source,
            edition: Mutex::new(Edition::asad()),
            reference: Mutex::new(None),
            core: ViewCore::new(),
        }
    }

    pub fn edition(&self) -> Edition {
        self.edition.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn reference(&self) -> Option<AyahRef> {
        *self.reference.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn select(&self, reference: AyahRef) {
        *self.reference.lock().unwrap_or_else(|e| e.into_inner()) = Some(reference);
        self.reload();
    }

    /// Parse and look up a typed reference such as `2:255` or `262`.
    /// A blank reference is ignored; an unparsable one fails without a request.
    pub fn submit(&self, input: &str) {
        let input = input.trim();
        if input.is_empty() {
            return;
        }
        match input.parse::<AyahRef>() {
            Ok(reference) => self.select(reference),
            Err(e) => {
                debug!(input, error = %e, "Rejected ayah reference");
                self.core.fail(AYAH_NOT_FOUND);
            }
        }
    }

    pub fn select_edition(&self, edition: Edition) {
        *self.edition.lock().unwrap_or_else(|e| e.into_inner()) = edition;
        if self.reference().is_some() {
            self.reload();
        }
    }

    pub fn reload(&self) {
        let reference = match self.reference() {
            Some(reference) => reference,
            None => return,
        };
        let edition = self.edition();
        let source = self.source.clone();

        self.core.launch(async move {
            source.fetch_ayah(reference, &edition).await.map(Arc::new).map_err(|e| {
                warn!(%reference, %edition, error = %e, "Ayah fetch failed");
                AYAH_NOT_FOUND.to_string()
            })
        });
    }

    pub fn state(&self) -> ViewState<Arc<Verse>> {
        self.core.state()
    }

    pub fn subscribe(&self) -> watch::Receiver<ViewSnapshot<Arc<Verse>>> {
        self.core.subscribe()
    }

    pub async fn settled(&self) -> ViewState<Arc<Verse>> {
        self.core.settled().await
    }
}

/// The whole text, script and translation side by side.
pub struct QuranView {
    source: RemoteSource,
    script: Edition,
    translation: Mutex<Edition>,
    mode: AlignMode,
    core: ViewCore<Arc<Vec<AlignedSurah>>>,
}

impl QuranView {
    pub fn new(source: RemoteSource) -> Self {
        Self {
            source,
            script: Edition::uthmani(),
            translation: Mutex::new(Edition::asad()),
            mode: AlignMode::default(),
            core: ViewCore::new(),
        }
    }

    pub fn with_mode(mut self, mode: AlignMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn translation(&self) -> Edition {
        self.translation.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn select_edition(&self, edition: Edition) {
        *self.translation.lock().unwrap_or_else(|e| e.into_inner()) = edition;
        self.reload();
    }

    pub fn reload(&self) {
        let source = self.source.clone();
        let script = self.script.clone();
        let translation = self.translation();
        let mode = self.mode;

        self.core.launch(async move {
            let fetched = try_join(source.fetch_quran(&translation), source.fetch_quran(&script)).await;
            match fetched {
                Ok((translated, arabic)) => Ok(Arc::new(align_quran(&translated, &arabic, mode))),
                Err(e) => {
                    warn!(error = %e, "Complete text fetch failed");
                    Err(DUAL_SOURCE_ERROR.to_string())
                }
            }
        });
    }

    pub fn state(&self) -> ViewState<Arc<Vec<AlignedSurah>>> {
        self.core.state()
    }

    pub fn subscribe(&self) -> watch::Receiver<ViewSnapshot<Arc<Vec<AlignedSurah>>>> {
        self.core.subscribe()
    }

    pub async fn settled(&self) -> ViewState<Arc<Vec<AlignedSurah>>> {
        self.core.settled().await
    }
}
