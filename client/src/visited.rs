//! Optimistic visited-country store.
//!
//! Membership flips immediately on toggle and is persisted in the background.
//! Each country with requests in flight gets an entry tracking the latest
//! operation and the last membership the remote confirmed, so a late failure
//! can never roll back state owned by a newer toggle.

use std::cell::RefCell;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;

use travelmap_shared::{NewVisit, VisitRecord, countries};

use crate::console;

pub const SAVE_FAILED_MESSAGE: &str = "Failed to save. Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleDirection {
    Add,
    Remove,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryState {
    Idle,
    Pending(ToggleDirection),
    /// The latest operation failed while older ones are still in flight;
    /// visible membership follows whatever the remote confirms.
    Reverting,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Visited(String),
    Removed(String),
    SaveFailed,
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::Visited(name) => write!(f, "Visited {name}"),
            Notice::Removed(name) => write!(f, "Removed {name}"),
            Notice::SaveFailed => f.write_str(SAVE_FAILED_MESSAGE),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct InFlightEntry {
    state: EntryState,
    latest_op: u64,
    in_flight: usize,
    confirmed: bool,
    confirmed_op: u64,
}

/// A toggle that has been applied locally and awaits persistence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingToggle {
    pub op: u64,
    pub user_id: String,
    pub country_id: String,
    pub alpha3: &'static str,
    pub name: String,
    pub direction: ToggleDirection,
}

impl PendingToggle {
    pub fn notice(&self) -> Notice {
        match self.direction {
            ToggleDirection::Add => Notice::Visited(self.name.clone()),
            ToggleDirection::Remove => Notice::Removed(self.name.clone()),
        }
    }

    fn target(&self) -> bool {
        self.direction == ToggleDirection::Add
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Completion {
    /// Visible membership changed as a result of this completion.
    pub changed: bool,
}

#[derive(Debug, Default)]
pub struct VisitedStore {
    visited: BTreeSet<String>,
    loading: bool,
    user_id: Option<String>,
    entries: HashMap<String, InFlightEntry>,
    next_op: u64,
    known_ids: Option<HashSet<String>>,
}

impl VisitedStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn visited(&self) -> &BTreeSet<String> {
        &self.visited
    }

    pub fn is_visited(&self, country_id: &str) -> bool {
        self.visited.contains(country_id)
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    pub fn entry_state(&self, country_id: &str) -> EntryState {
        self.entries
            .get(country_id)
            .map_or(EntryState::Idle, |entry| entry.state)
    }

    pub fn in_flight(&self) -> usize {
        self.entries.values().map(|entry| entry.in_flight).sum()
    }

    /// Switch to another account (or none); membership is cleared.
    pub fn set_user(&mut self, user_id: Option<String>) {
        if self.user_id == user_id {
            return;
        }
        self.user_id = user_id;
        self.loading = false;
        self.visited.clear();
        self.entries.clear();
    }

    /// Restrict membership to ids present in the loaded base map.
    pub fn prune_to(&mut self, ids: HashSet<String>) {
        self.visited.retain(|id| ids.contains(id));
        self.known_ids = Some(ids);
    }

    pub fn begin_load(&mut self, user_id: &str) {
        self.set_user(Some(user_id.to_string()));
        self.loading = true;
    }

    /// Replace membership with the fetched visits. Returns `false` when the
    /// result belongs to a user that is no longer active.
    pub fn finish_load(&mut self, user_id: &str, result: Result<Vec<VisitRecord>, String>) -> bool {
        if self.user_id.as_deref() != Some(user_id) {
            return false;
        }
        self.loading = false;
        let records = result.unwrap_or_default();
        self.visited = records
            .iter()
            .filter_map(|record| countries::numeric_for(&record.country_code))
            .filter(|id| self.known_ids.as_ref().is_none_or(|known| known.contains(*id)))
            .map(str::to_string)
            .collect();

        // Toggles issued during the load still own their countries.
        for (country_id, entry) in &mut self.entries {
            let loaded = self.visited.contains(country_id);
            if entry.confirmed_op == 0 {
                entry.confirmed = loaded;
            }
            let visible = match entry.state {
                EntryState::Pending(direction) => direction == ToggleDirection::Add,
                EntryState::Reverting | EntryState::Idle => entry.confirmed,
            };
            if visible != loaded {
                if visible {
                    self.visited.insert(country_id.clone());
                } else {
                    self.visited.remove(country_id);
                }
            }
        }
        true
    }

    /// Flip membership locally. `None` when there is no user or the id has no
    /// alpha-3 code.
    pub fn begin_toggle(&mut self, country_id: &str) -> Option<PendingToggle> {
        let user_id = self.user_id.clone()?;
        let meta = countries::by_numeric(country_id)?;

        let was_visited = self.visited.contains(country_id);
        let direction = if was_visited {
            self.visited.remove(country_id);
            ToggleDirection::Remove
        } else {
            self.visited.insert(country_id.to_string());
            ToggleDirection::Add
        };

        self.next_op += 1;
        let op = self.next_op;
        let entry = self
            .entries
            .entry(country_id.to_string())
            .or_insert(InFlightEntry {
                state: EntryState::Idle,
                latest_op: 0,
                in_flight: 0,
                confirmed: was_visited,
                confirmed_op: 0,
            });
        entry.latest_op = op;
        entry.in_flight += 1;
        entry.state = EntryState::Pending(direction);

        Some(PendingToggle {
            op,
            user_id,
            country_id: country_id.to_string(),
            alpha3: meta.alpha3,
            name: meta.name.to_string(),
            direction,
        })
    }

    /// Record the remote outcome of a toggle.
    pub fn complete(&mut self, pending: &PendingToggle, success: bool) -> Completion {
        let Some(entry) = self.entries.get_mut(&pending.country_id) else {
            // User switched while the request was in flight.
            return Completion { changed: false };
        };
        entry.in_flight = entry.in_flight.saturating_sub(1);

        let follow_confirmed = if success {
            if pending.op > entry.confirmed_op {
                entry.confirmed = pending.target();
                entry.confirmed_op = pending.op;
            }
            entry.state == EntryState::Reverting
        } else if pending.op == entry.latest_op {
            entry.state = if entry.in_flight > 0 {
                EntryState::Reverting
            } else {
                EntryState::Idle
            };
            true
        } else {
            false
        };

        let confirmed = entry.confirmed;
        if entry.in_flight == 0 {
            self.entries.remove(&pending.country_id);
        }

        let changed = follow_confirmed && self.set_membership(&pending.country_id, confirmed);
        Completion { changed }
    }

    fn set_membership(&mut self, country_id: &str, visited: bool) -> bool {
        if visited {
            self.visited.insert(country_id.to_string())
        } else {
            self.visited.remove(country_id)
        }
    }
}

/// Remote persistence for visits.
#[allow(async_fn_in_trait)]
pub trait VisitRemote {
    async fn fetch_visits(&self, user_id: &str) -> Result<Vec<VisitRecord>, String>;
    async fn insert_visit(&self, user_id: &str, visit: NewVisit) -> Result<(), String>;
    async fn delete_visit(&self, user_id: &str, alpha3: &str) -> Result<(), String>;
}

/// Receives store side effects: membership snapshots, notifications and the
/// persistence hook.
pub trait VisitObserver {
    fn visited_changed(&self, visited: &BTreeSet<String>);
    fn loading_changed(&self, loading: bool);
    fn notify(&self, notice: &Notice);
    fn visit_persisted(&self);
}

/// Load the user's visits, replacing membership wholesale. Transport errors
/// leave an empty set.
pub async fn load<R: VisitRemote, O: VisitObserver>(
    store: &RefCell<VisitedStore>,
    remote: &R,
    observer: &O,
    user_id: &str,
) {
    store.borrow_mut().begin_load(user_id);
    observer.loading_changed(true);

    let result = remote.fetch_visits(user_id).await;
    if let Err(e) = &result {
        console::warn(&format!("Failed to load visited countries: {e}"));
    }

    let snapshot = {
        let mut store = store.borrow_mut();
        if !store.finish_load(user_id, result) {
            return;
        }
        store.visited().clone()
    };
    observer.visited_changed(&snapshot);
    observer.loading_changed(false);
}

/// Toggle a country: apply locally, notify, persist, and roll back on failure.
pub async fn toggle<R: VisitRemote, O: VisitObserver>(
    store: &RefCell<VisitedStore>,
    remote: &R,
    observer: &O,
    country_id: &str,
) {
    let Some((pending, snapshot)) = ({
        let mut store = store.borrow_mut();
        store
            .begin_toggle(country_id)
            .map(|pending| (pending, store.visited().clone()))
    }) else {
        return;
    };
    observer.visited_changed(&snapshot);
    observer.notify(&pending.notice());

    let result = match pending.direction {
        ToggleDirection::Add => {
            remote
                .insert_visit(&pending.user_id, NewVisit::now(pending.alpha3))
                .await
        }
        ToggleDirection::Remove => remote.delete_visit(&pending.user_id, pending.alpha3).await,
    };

    let (completion, snapshot) = {
        let mut store = store.borrow_mut();
        let completion = store.complete(&pending, result.is_ok());
        (completion, store.visited().clone())
    };

    match result {
        Ok(()) => observer.visit_persisted(),
        Err(e) => {
            console::warn(&format!(
                "Failed to persist {} for {}: {e}",
                pending.alpha3, pending.user_id
            ));
            observer.notify(&Notice::SaveFailed);
        }
    }
    if completion.changed {
        observer.visited_changed(&snapshot);
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::collections::VecDeque;
    use std::rc::Rc;

    use chrono::Utc;
    use futures::channel::oneshot;
    use futures::executor::{LocalPool, block_on};
    use futures::task::LocalSpawnExt;

    use super::*;

    type Reply = oneshot::Receiver<Result<(), String>>;

    #[derive(Default)]
    struct FakeRemote {
        visits: RefCell<Option<Result<Vec<VisitRecord>, String>>>,
        calls: RefCell<Vec<String>>,
        replies: RefCell<VecDeque<Reply>>,
        fail_writes: Cell<bool>,
    }

    impl FakeRemote {
        fn with_visits(codes: &[&str]) -> Self {
            let records = codes
                .iter()
                .map(|code| VisitRecord {
                    country_code: code.to_string(),
                    visited_at: Utc::now(),
                })
                .collect();
            let remote = Self::default();
            *remote.visits.borrow_mut() = Some(Ok(records));
            remote
        }

        fn deferred(&self) -> oneshot::Sender<Result<(), String>> {
            let (tx, rx) = oneshot::channel();
            self.replies.borrow_mut().push_back(rx);
            tx
        }

        async fn reply(&self) -> Result<(), String> {
            let next = self.replies.borrow_mut().pop_front();
            match next {
                Some(rx) => rx.await.unwrap_or_else(|_| Err("dropped".into())),
                None if self.fail_writes.get() => Err("HTTP 500".into()),
                None => Ok(()),
            }
        }
    }

    impl VisitRemote for FakeRemote {
        async fn fetch_visits(&self, user_id: &str) -> Result<Vec<VisitRecord>, String> {
            self.calls.borrow_mut().push(format!("fetch {user_id}"));
            self.visits.borrow_mut().take().unwrap_or(Ok(Vec::new()))
        }

        async fn insert_visit(&self, user_id: &str, visit: NewVisit) -> Result<(), String> {
            self.calls
                .borrow_mut()
                .push(format!("insert {user_id} {}", visit.country_code));
            self.reply().await
        }

        async fn delete_visit(&self, user_id: &str, alpha3: &str) -> Result<(), String> {
            self.calls.borrow_mut().push(format!("delete {user_id} {alpha3}"));
            self.reply().await
        }
    }

    #[derive(Default)]
    struct RecordingObserver {
        visible: RefCell<BTreeSet<String>>,
        loading: RefCell<Vec<bool>>,
        notices: RefCell<Vec<String>>,
        persisted: Cell<u32>,
    }

    impl VisitObserver for RecordingObserver {
        fn visited_changed(&self, visited: &BTreeSet<String>) {
            *self.visible.borrow_mut() = visited.clone();
        }

        fn loading_changed(&self, loading: bool) {
            self.loading.borrow_mut().push(loading);
        }

        fn notify(&self, notice: &Notice) {
            self.notices.borrow_mut().push(notice.to_string());
        }

        fn visit_persisted(&self) {
            self.persisted.set(self.persisted.get() + 1);
        }
    }

    fn signed_in() -> RefCell<VisitedStore> {
        let mut store = VisitedStore::new();
        store.set_user(Some("user-1".into()));
        RefCell::new(store)
    }

    fn ids(store: &RefCell<VisitedStore>) -> Vec<String> {
        store.borrow().visited().iter().cloned().collect()
    }

    #[test]
    fn toggle_success_adds_and_notifies() {
        let store = signed_in();
        let remote = FakeRemote::default();
        let observer = RecordingObserver::default();

        block_on(toggle(&store, &remote, &observer, "250"));

        assert_eq!(ids(&store), vec!["250"]);
        assert_eq!(*observer.notices.borrow(), vec!["Visited France"]);
        assert_eq!(observer.persisted.get(), 1);
        assert_eq!(*remote.calls.borrow(), vec!["insert user-1 FRA"]);
        assert!(observer.visible.borrow().contains("250"));
        assert_eq!(store.borrow().in_flight(), 0);
    }

    #[test]
    fn toggle_twice_restores_membership() {
        let store = signed_in();
        let remote = FakeRemote::default();
        let observer = RecordingObserver::default();

        block_on(toggle(&store, &remote, &observer, "392"));
        block_on(toggle(&store, &remote, &observer, "392"));

        assert!(ids(&store).is_empty());
        assert_eq!(
            *remote.calls.borrow(),
            vec!["insert user-1 JPN", "delete user-1 JPN"]
        );
        assert_eq!(
            *observer.notices.borrow(),
            vec!["Visited Japan", "Removed Japan"]
        );
        assert_eq!(observer.persisted.get(), 2);
    }

    #[test]
    fn failed_save_rolls_back() {
        let store = signed_in();
        let remote = FakeRemote::default();
        remote.fail_writes.set(true);
        let observer = RecordingObserver::default();
        block_on(toggle(&store, &remote, &observer, "250"));

        assert!(ids(&store).is_empty());
        assert!(observer.visible.borrow().is_empty());
        assert_eq!(
            *observer.notices.borrow(),
            vec!["Visited France", SAVE_FAILED_MESSAGE]
        );
        assert_eq!(observer.persisted.get(), 0);
    }

    #[test]
    fn unknown_country_or_missing_user_is_ignored() {
        let store = signed_in();
        let remote = FakeRemote::default();
        let observer = RecordingObserver::default();
        block_on(toggle(&store, &remote, &observer, "999"));
        assert!(ids(&store).is_empty());
        assert!(observer.notices.borrow().is_empty());
        assert!(remote.calls.borrow().is_empty());

        let anonymous = RefCell::new(VisitedStore::new());
        block_on(toggle(&anonymous, &remote, &observer, "250"));
        assert!(ids(&anonymous).is_empty());
        assert!(observer.notices.borrow().is_empty());
    }

    #[test]
    fn load_translates_codes_and_drops_unknown() {
        let store = RefCell::new(VisitedStore::new());
        let remote = FakeRemote::with_visits(&["FRA", "XXX", "jpn"]);
        let observer = RecordingObserver::default();

        block_on(load(&store, &remote, &observer, "user-1"));

        assert_eq!(ids(&store), vec!["250", "392"]);
        assert_eq!(*observer.loading.borrow(), vec![true, false]);
        assert!(!store.borrow().is_loading());
        assert_eq!(store.borrow().user_id(), Some("user-1"));
    }

    #[test]
    fn load_failure_leaves_empty_set() {
        let store = signed_in();
        {
            let mut store = store.borrow_mut();
            let add = store.begin_toggle("250").unwrap();
            store.complete(&add, true);
        }
        let remote = FakeRemote::default();
        *remote.visits.borrow_mut() = Some(Err("fetch error: offline".into()));
        let observer = RecordingObserver::default();

        block_on(load(&store, &remote, &observer, "user-1"));

        assert!(ids(&store).is_empty());
        assert_eq!(*observer.loading.borrow(), vec![true, false]);
    }

    #[test]
    fn membership_is_pruned_to_loaded_features() {
        let store = RefCell::new(VisitedStore::new());
        let remote = FakeRemote::with_visits(&["FRA", "JPN"]);
        let observer = RecordingObserver::default();
        block_on(load(&store, &remote, &observer, "user-1"));

        store
            .borrow_mut()
            .prune_to(["250".to_string()].into_iter().collect());
        assert_eq!(ids(&store), vec!["250"]);
    }

    #[test]
    fn stale_load_result_is_discarded() {
        let mut store = VisitedStore::new();
        store.begin_load("user-1");
        store.set_user(Some("user-2".into()));
        assert!(!store.finish_load("user-1", Ok(Vec::new())));
        assert_eq!(store.user_id(), Some("user-2"));
    }

    fn ids_of(store: &VisitedStore) -> Vec<String> {
        store.visited().iter().cloned().collect()
    }

    fn visit(code: &str) -> VisitRecord {
        VisitRecord {
            country_code: code.to_string(),
            visited_at: Utc::now(),
        }
    }

    #[test]
    fn toggle_during_load_survives_the_loaded_set() {
        let mut store = VisitedStore::new();
        store.begin_load("u");
        let add = store.begin_toggle("250").unwrap();
        let add_japan = store.begin_toggle("392").unwrap();
        let remove_japan = store.begin_toggle("392").unwrap();

        assert!(store.finish_load("u", Ok(vec![visit("JPN"), visit("ITA")])));
        assert!(store.is_visited("250"));
        assert!(!store.is_visited("392"));
        assert!(store.is_visited("380"));

        assert!(!store.complete(&add, true).changed);
        assert!(!store.complete(&add_japan, true).changed);
        assert!(!store.complete(&remove_japan, true).changed);
        assert_eq!(ids_of(&store), vec!["250", "380"]);
        assert_eq!(store.in_flight(), 0);
    }

    #[test]
    fn failed_toggle_during_load_reverts_to_loaded_membership() {
        let mut store = VisitedStore::new();
        store.begin_load("u");
        let add = store.begin_toggle("250").unwrap();

        store.finish_load("u", Ok(Vec::new()));
        assert!(store.is_visited("250"));

        assert!(store.complete(&add, false).changed);
        assert!(!store.is_visited("250"));
        assert_eq!(store.entry_state("250"), EntryState::Idle);
    }

    #[test]
    fn latest_failure_reverts_to_confirmed_membership() {
        let mut store = VisitedStore::new();
        store.set_user(Some("u".into()));
        let add = store.begin_toggle("250").unwrap();
        let remove = store.begin_toggle("250").unwrap();
        assert_eq!(
            store.entry_state("250"),
            EntryState::Pending(ToggleDirection::Remove)
        );

        // Newest fails first while the add is still in flight.
        let completion = store.complete(&remove, false);
        assert!(!completion.changed);
        assert_eq!(store.entry_state("250"), EntryState::Reverting);
        assert!(!store.is_visited("250"));

        // The add lands: the remote now has the visit, so the map shows it.
        let completion = store.complete(&add, true);
        assert!(completion.changed);
        assert!(store.is_visited("250"));
        assert_eq!(store.entry_state("250"), EntryState::Idle);
        assert_eq!(store.in_flight(), 0);
    }

    #[test]
    fn superseded_failure_does_not_roll_back() {
        let mut store = VisitedStore::new();
        store.set_user(Some("u".into()));
        let add = store.begin_toggle("250").unwrap();
        let remove = store.begin_toggle("250").unwrap();

        assert!(!store.complete(&remove, true).changed);
        assert!(!store.is_visited("250"));

        // The older add failing late must not resurrect the visit.
        assert!(!store.complete(&add, false).changed);
        assert!(!store.is_visited("250"));
        assert_eq!(store.in_flight(), 0);
    }

    #[test]
    fn older_success_after_newer_success_keeps_newest() {
        let mut store = VisitedStore::new();
        store.set_user(Some("u".into()));
        let add = store.begin_toggle("250").unwrap();
        let remove = store.begin_toggle("250").unwrap();
        store.complete(&remove, true);
        assert!(!store.complete(&add, true).changed);
        assert!(!store.is_visited("250"));
    }

    #[test]
    fn interleaved_toggles_settle_on_remote_outcome() {
        let store = Rc::new(signed_in());
        let remote = Rc::new(FakeRemote::default());
        let observer = Rc::new(RecordingObserver::default());
        let add_reply = remote.deferred();
        let remove_reply = remote.deferred();

        let mut pool = LocalPool::new();
        let spawner = pool.spawner();
        for _ in 0..2 {
            let (store, remote, observer) = (store.clone(), remote.clone(), observer.clone());
            spawner
                .spawn_local(async move { toggle(&store, &*remote, &*observer, "250").await })
                .unwrap();
        }
        pool.run_until_stalled();
        assert_eq!(store.borrow().in_flight(), 2);
        assert!(ids(&store).is_empty());

        remove_reply.send(Err("HTTP 503".into())).unwrap();
        pool.run_until_stalled();
        assert!(ids(&store).is_empty());

        add_reply.send(Ok(())).unwrap();
        pool.run_until_stalled();
        assert_eq!(ids(&store), vec!["250"]);
        assert!(observer.visible.borrow().contains("250"));
        assert_eq!(
            *observer.notices.borrow(),
            vec!["Visited France", "Removed France", SAVE_FAILED_MESSAGE]
        );
        assert_eq!(observer.persisted.get(), 1);
    }
}
