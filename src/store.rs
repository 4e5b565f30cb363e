//! Client-side synchronization store over remote operations.
//!
//! Process-wide cache of spaces, per-space and global window lists,
//! per-application icon paths and per-window snapshots, plus the busy state
//! of each in-flight fetch. Every cache key follows
//! `absent -> loading -> populated | absent`-on-error; a fetch is issued
//! only for an absent key, failures reset the key so a later attempt can
//! retry, and nothing retries automatically.
//!
//! Per-space and global window lists are independent cache entries even
//! though they describe the same host objects; staleness between the two
//! views is accepted, not an error.
//!
//! All mutation happens inside short lock scopes that never span an await,
//! so UI readers only ever observe complete updates.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tracing::{debug, trace, warn};

use crate::common::collections::HashMap;
use crate::common::config::Config;
use crate::host::{HostBridge, HostError};
use crate::model::{Space, SpaceId, WindowId, WindowInfo};
use crate::remote::Remote;


/// Notifications for the embedding UI. Failures land here instead of being
/// thrown; the store has already reset the affected key by the time the
/// event is delivered.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StoreEvent {
    FetchFailed { context: String, message: String },
}

#[derive(Default)]
struct State {
    spaces: Vec<Space>,
    all_windows: Vec<WindowInfo>,
    space_windows: HashMap<SpaceId, Vec<WindowInfo>>,
    loading_windows: HashMap<SpaceId, bool>,
    app_icons: HashMap<String, PathBuf>,
    /// A present entry with a `None` value means the window was minimized
    /// (or had no surface) at capture time; that is populated, not absent,
    /// so no refetch happens.
    snapshots: HashMap<WindowId, Option<String>>,
    loading_snapshots: HashMap<WindowId, bool>,
    selected_space: Option<SpaceId>,
    /// Count of in-flight fetches feeding the aggregate indicator.
    refreshing: u32,
    /// Bumped on every fetch start; lets the trailing clear task tell
    /// whether a newer fetch has superseded it.
    refresh_epoch: u64,
    is_refreshing: bool,
}

/// Cloneable handle to the shared cache. All mutation goes through these
/// methods; there is no other way to touch the state.
pub struct SpaceStore<B> {
    remote: Arc<Remote<B>>,
    state: Arc<Mutex<State>>,
    events: UnboundedSender<StoreEvent>,
    fetch_snapshot_on_select: bool,
    refresh_clear_delay: Duration,
}

impl<B> Clone for SpaceStore<B> {
    fn clone(&self) -> Self {
        Self {
            remote: Arc::clone(&self.remote),
            state: Arc::clone(&self.state),
            events: self.events.clone(),
            fetch_snapshot_on_select: self.fetch_snapshot_on_select,
            refresh_clear_delay: self.refresh_clear_delay,
        }
    }
}

impl<B: HostBridge> SpaceStore<B> {
    pub fn new(remote: Remote<B>, config: &Config) -> (Self, UnboundedReceiver<StoreEvent>) {
        let (events, events_rx) = unbounded_channel();
        let store = Self {
            remote: Arc::new(remote),
            state: Arc::new(Mutex::new(State::default())),
            events,
            fetch_snapshot_on_select: config.fetch_snapshot_on_select,
            refresh_clear_delay: config.refresh_clear_delay(),
        };
        (store, events_rx)
    }

    /// Refresh the space list. Always hits the host; the space list is the
    /// top-level view and has no per-key dedup.
    pub async fn fetch_spaces(&self) {
        self.begin_refresh();
        let result = self.remote.list_spaces().await;
        self.end_refresh();

        match result {
            Ok(spaces) => {
                debug!(count = spaces.len(), "space list refreshed");
                self.state.lock().spaces = spaces;
            }
            Err(err) => self.report("list spaces", &err),
        }
    }

    /// Refresh the global window list and backfill icons for applications
    /// not seen before.
    pub async fn fetch_all_windows(&self) {
        self.begin_refresh();
        let result = self.remote.list_all_windows().await;
        self.end_refresh();

        match result {
            Ok(windows) => {
                let unseen = {
                    let mut state = self.state.lock();
                    let unseen = unseen_applications(&state, &windows);
                    state.all_windows = windows;
                    unseen
                };
                self.fetch_application_icons(&unseen).await;
            }
            Err(err) => self.report("list all windows", &err),
        }
    }

    /// Fetch the window list of one space, if it is neither cached nor
    /// already being fetched. Two concurrent calls for the same key result
    /// in exactly one remote operation.
    pub async fn fetch_space_windows(&self, space_id: &SpaceId) {
        {
            let mut state = self.state.lock();
            if state.space_windows.contains_key(space_id)
                || state.loading_windows.get(space_id).copied().unwrap_or(false)
            {
                trace!(space = %space_id, "window list already loaded or loading, skipping");
                return;
            }
            state.loading_windows.insert(space_id.clone(), true);
        }

        self.begin_refresh();
        let result = self.remote.list_windows(space_id).await;
        self.end_refresh();

        {
            let mut state = self.state.lock();
            match state.loading_windows.get_mut(space_id) {
                Some(flag) => *flag = false,
                // Space was removed while the fetch was in flight; its
                // cache keys are gone and must stay gone.
                None => return,
            }
        }

        match result {
            Ok(windows) => {
                let unseen = {
                    let mut state = self.state.lock();
                    let unseen = unseen_applications(&state, &windows);
                    state.space_windows.insert(space_id.clone(), windows);
                    unseen
                };
                self.fetch_application_icons(&unseen).await;
            }
            Err(err) => self.report("list windows", &err),
        }
    }

    /// Resolve icon paths for the given application names. Icons are
    /// assumed stable for the process lifetime, so names already resolved
    /// are never re-fetched and nothing invalidates this cache. Failures
    /// are logged but not surfaced; a missing icon degrades the UI, it
    /// does not break it.
    pub async fn fetch_application_icons(&self, names: &[String]) {
        if names.is_empty() {
            return;
        }

        let apps = match self.remote.list_application_paths().await {
            Ok(apps) => apps,
            Err(err) => {
                warn!(error = %err, "failed to resolve application icons");
                return;
            }
        };

        let mut state = self.state.lock();
        for name in names {
            if let Some(app) = apps.iter().find(|app| &app.name == name) {
                state
                    .app_icons
                    .entry(name.clone())
                    .or_insert_with(|| PathBuf::from(&app.path));
            }
        }
    }

    /// Fetch a window's snapshot unless one is cached or in flight. A
    /// minimized window yields a populated `None` entry, so it is not
    /// fetched again.
    pub async fn fetch_window_snapshot(&self, window_id: &WindowId) {
        {
            let mut state = self.state.lock();
            if state.snapshots.contains_key(window_id)
                || state.loading_snapshots.get(window_id).copied().unwrap_or(false)
            {
                trace!(window = %window_id, "snapshot already captured or loading, skipping");
                return;
            }
            state.loading_snapshots.insert(window_id.clone(), true);
        }

        let result = self.remote.window_snapshot(window_id).await;

        let mut state = self.state.lock();
        state.loading_snapshots.insert(window_id.clone(), false);
        match result {
            Ok(snapshot) => {
                state.snapshots.insert(window_id.clone(), snapshot);
            }
            Err(err) => {
                drop(state);
                self.report("capture snapshot", &err);
            }
        }
    }

    /// Create a space on the active screen, navigate to it, and refresh
    /// the space list so the new space shows up marked current.
    pub async fn create_space(&self) {
        match self.remote.create_space().await {
            Ok(id) => {
                debug!(space = %id, "space created");
                self.fetch_spaces().await;
            }
            Err(err) => self.report("create space", &err),
        }
    }

    /// Remove a space and purge every cache keyed by it in the same
    /// mutation, so no orphaned per-space entries survive.
    pub async fn remove_space(&self, space_id: &SpaceId) {
        if let Err(err) = self.remote.remove_space(space_id).await {
            self.report("remove space", &err);
            return;
        }

        let mut state = self.state.lock();
        state.spaces.retain(|space| &space.id != space_id);
        state.space_windows.remove(space_id);
        state.loading_windows.remove(space_id);
    }

    /// Remove the currently focused space (host navigates to its
    /// predecessor first) and purge its caches. The predecessor becomes
    /// the optimistically current space.
    pub async fn remove_current_space(&self) {
        match self.remote.remove_current_space().await {
            Ok(outcome) => {
                let mut state = self.state.lock();
                state.spaces.retain(|space| space.id != outcome.removed);
                state.space_windows.remove(&outcome.removed);
                state.loading_windows.remove(&outcome.removed);
                for space in &mut state.spaces {
                    space.is_current = space.id == outcome.previous;
                }
            }
            Err(err) => self.report("remove current space", &err),
        }
    }

    /// Navigate to a space and optimistically mark it current; the next
    /// full refresh recomputes the flag from host state.
    pub async fn goto_space(&self, space_id: &SpaceId) {
        if let Err(err) = self.remote.goto_space(space_id).await {
            self.report("go to space", &err);
            return;
        }

        let mut state = self.state.lock();
        for space in &mut state.spaces {
            space.is_current = &space.id == space_id;
        }
    }

    pub async fn focus_window(&self, window_id: &WindowId) {
        if let Err(err) = self.remote.focus_window(window_id).await {
            self.report("focus window", &err);
        }
    }

    /// Move the UI selection. Selecting a space lazily fetches its window
    /// list if absent.
    pub async fn select_space(&self, space_id: Option<SpaceId>) {
        self.state.lock().selected_space = space_id.clone();
        if let Some(space_id) = space_id {
            self.fetch_space_windows(&space_id).await;
        }
    }

    /// Selecting a window fetches its snapshot only when configured to;
    /// the default leaves snapshots to explicit fetches.
    pub async fn select_window(&self, window_id: &WindowId) {
        if self.fetch_snapshot_on_select {
            self.fetch_window_snapshot(window_id).await;
        }
    }

    fn begin_refresh(&self) {
        let mut state = self.state.lock();
        state.refreshing += 1;
        state.refresh_epoch += 1;
        state.is_refreshing = true;
    }

    /// Settle one fetch. When the last in-flight fetch settles, the
    /// aggregate indicator clears after a trailing delay so back-to-back
    /// fetches do not flicker it; a fetch starting inside the delay keeps
    /// it on.
    fn end_refresh(&self) {
        let epoch = {
            let mut state = self.state.lock();
            state.refreshing -= 1;
            if state.refreshing > 0 {
                return;
            }
            state.refresh_epoch
        };

        let state = Arc::clone(&self.state);
        let delay = self.refresh_clear_delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let mut state = state.lock();
            if state.refreshing == 0 && state.refresh_epoch == epoch {
                state.is_refreshing = false;
            }
        });
    }

    fn report(&self, context: &str, err: &HostError) {
        warn!(context, error = %err, "remote operation failed");
        let _ = self.events.send(StoreEvent::FetchFailed {
            context: context.to_string(),
            message: err.to_string(),
        });
    }
}

impl<B> SpaceStore<B> {
    pub fn spaces(&self) -> Vec<Space> {
        self.state.lock().spaces.clone()
    }

    pub fn all_windows(&self) -> Vec<WindowInfo> {
        self.state.lock().all_windows.clone()
    }

    pub fn space_windows(&self, space_id: &SpaceId) -> Option<Vec<WindowInfo>> {
        self.state.lock().space_windows.get(space_id).cloned()
    }

    pub fn windows_loading(&self, space_id: &SpaceId) -> bool {
        self.state.lock().loading_windows.get(space_id).copied().unwrap_or(false)
    }

    pub fn app_icon(&self, application: &str) -> Option<PathBuf> {
        self.state.lock().app_icons.get(application).cloned()
    }

    /// Outer `None`: never captured. `Some(None)`: captured while
    /// minimized or surface-less.
    pub fn snapshot(&self, window_id: &WindowId) -> Option<Option<String>> {
        self.state.lock().snapshots.get(window_id).cloned()
    }

    pub fn selected_space(&self) -> Option<SpaceId> {
        self.state.lock().selected_space.clone()
    }

    pub fn is_refreshing(&self) -> bool {
        self.state.lock().is_refreshing
    }
}

/// Application names present in `windows` but without a resolved icon yet,
/// deduplicated in first-seen order.
fn unseen_applications(state: &State, windows: &[WindowInfo]) -> Vec<String> {
    let mut unseen: Vec<String> = Vec::new();
    for window in windows {
        if !state.app_icons.contains_key(&window.application)
            && !unseen.contains(&window.application)
        {
            unseen.push(window.application.clone());
        }
    }
    unseen
}
