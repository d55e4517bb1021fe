use std::cell::{Cell, RefCell};
use std::collections::{BTreeSet, HashSet};
use std::rc::Rc;

use gloo_storage::Storage;
use gloo_timers::callback::{Interval, Timeout};
use leptos::prelude::*;
use serde::{Deserialize, Serialize};
use wasm_bindgen_futures::spawn_local;

use travelmap_shared::{CountryFeature, LeaderboardEntry, Profile};

use crate::canvas::MapCanvas;
use crate::console;
use crate::leaderboard::{LEADERBOARD_LIMIT, POLL_INTERVAL_MS, leaderboard_rows};
use crate::remote::{self, HttpVisitRemote};
use crate::session::{self, Session};
use crate::stats::{digit_columns, explore_stats};
use crate::toast::{TOAST_DURATION_MS, ToastState};
use crate::viewport::ViewportTransform;
use crate::visited::{self, Notice, VisitObserver, VisitedStore};

const SETTINGS_KEY: &str = "travelmap_settings";

/// Newtype wrappers give each signal a distinct type for Leptos context.
#[derive(Clone, Copy)]
pub(crate) struct BaseMap(pub RwSignal<Vec<CountryFeature>>);
#[derive(Clone, Copy)]
pub(crate) struct VisitedIds(pub RwSignal<BTreeSet<String>>);
#[derive(Clone, Copy)]
pub(crate) struct VisitsLoading(pub RwSignal<bool>);
#[derive(Clone, Copy)]
pub(crate) struct Transform(pub RwSignal<ViewportTransform>);
/// Bumped whenever a flag image finishes decoding.
#[derive(Clone, Copy)]
pub(crate) struct FlagEpoch(pub RwSignal<u64>);
#[derive(Clone, Copy)]
pub(crate) struct ShowLabels(pub RwSignal<bool>);
#[derive(Clone, Copy)]
pub(crate) struct Toast(pub RwSignal<ToastState>);
/// Bumped by successful writes and the poll timer; the leaderboard refetches.
#[derive(Clone, Copy)]
pub(crate) struct LeaderboardNonce(pub RwSignal<u64>);
#[derive(Clone, Copy)]
pub(crate) struct LeaderboardEntries(pub RwSignal<Vec<LeaderboardEntry>>);
#[derive(Clone, Copy)]
pub(crate) struct CurrentSession(pub RwSignal<Option<Session>>);

#[derive(Serialize, Deserialize)]
struct Settings {
    show_labels: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self { show_labels: true }
    }
}

thread_local! {
    static LEADERBOARD_POLL: RefCell<Option<Interval>> = const { RefCell::new(None) };
}

pub(crate) fn show_toast(toast: RwSignal<ToastState>, message: String) {
    let now = js_sys::Date::now();
    let mut generation = 0;
    toast.update(|t| generation = t.show(message, now));
    Timeout::new(TOAST_DURATION_MS as u32, move || {
        toast.update(|t| {
            t.expire(generation);
        });
    })
    .forget();
}

/// Mirrors store side effects into signals.
#[derive(Clone, Copy)]
struct SignalObserver {
    visited: RwSignal<BTreeSet<String>>,
    loading: RwSignal<bool>,
    toast: RwSignal<ToastState>,
    leaderboard_nonce: RwSignal<u64>,
}

impl VisitObserver for SignalObserver {
    fn visited_changed(&self, visited: &BTreeSet<String>) {
        self.visited.set(visited.clone());
    }

    fn loading_changed(&self, loading: bool) {
        self.loading.set(loading);
    }

    fn notify(&self, notice: &Notice) {
        show_toast(self.toast, notice.to_string());
    }

    fn visit_persisted(&self) {
        self.leaderboard_nonce.update(|n| *n = n.wrapping_add(1));
    }
}

/// Explicit handle to the one visited-country store, provided via context.
#[derive(Clone, Copy)]
pub(crate) struct VisitedStoreHandle {
    store: StoredValue<Rc<RefCell<VisitedStore>>, LocalStorage>,
    observer: SignalObserver,
}

impl VisitedStoreHandle {
    fn new(observer: SignalObserver) -> Self {
        Self {
            store: StoredValue::new_local(Rc::new(RefCell::new(VisitedStore::new()))),
            observer,
        }
    }

    pub(crate) fn toggle(&self, country_id: String) {
        let store = self.store.get_value();
        let observer = self.observer;
        spawn_local(async move {
            visited::toggle(&store, &HttpVisitRemote, &observer, &country_id).await;
        });
    }

    /// Switch account; membership is cleared and reloaded for the new user.
    fn sign_in(&self, user_id: Option<String>) {
        let store = self.store.get_value();
        let snapshot = {
            let mut store = store.borrow_mut();
            store.set_user(user_id.clone());
            store.visited().clone()
        };
        self.observer.visited_changed(&snapshot);
        self.observer.loading_changed(false);

        let Some(user_id) = user_id else {
            return;
        };
        let observer = self.observer;
        spawn_local(async move {
            visited::load(&store, &HttpVisitRemote, &observer, &user_id).await;
        });
    }

    fn prune_to(&self, ids: HashSet<String>) {
        let store = self.store.get_value();
        let snapshot = {
            let mut store = store.borrow_mut();
            store.prune_to(ids);
            store.visited().clone()
        };
        self.observer.visited_changed(&snapshot);
    }
}

#[component]
pub fn App() -> impl IntoView {
    let base_map: RwSignal<Vec<CountryFeature>> = RwSignal::new(Vec::new());
    let base_map_failed = RwSignal::new(false);
    let visited_ids: RwSignal<BTreeSet<String>> = RwSignal::new(BTreeSet::new());
    let visits_loading = RwSignal::new(false);
    let transform = RwSignal::new(ViewportTransform::default());
    let flag_epoch = RwSignal::new(0u64);
    let toast = RwSignal::new(ToastState::new());
    let leaderboard_nonce = RwSignal::new(0u64);
    let leaderboard: RwSignal<Vec<LeaderboardEntry>> = RwSignal::new(Vec::new());
    let current_session = RwSignal::new(session::load());

    let saved: Settings = gloo_storage::LocalStorage::get(SETTINGS_KEY).unwrap_or_default();
    let show_labels = RwSignal::new(saved.show_labels);

    let store = VisitedStoreHandle::new(SignalObserver {
        visited: visited_ids,
        loading: visits_loading,
        toast,
        leaderboard_nonce,
    });

    provide_context(BaseMap(base_map));
    provide_context(VisitedIds(visited_ids));
    provide_context(VisitsLoading(visits_loading));
    provide_context(Transform(transform));
    provide_context(FlagEpoch(flag_epoch));
    provide_context(ShowLabels(show_labels));
    provide_context(Toast(toast));
    provide_context(LeaderboardNonce(leaderboard_nonce));
    provide_context(LeaderboardEntries(leaderboard));
    provide_context(CurrentSession(current_session));
    provide_context(store);

    Effect::new(move || {
        let settings = Settings {
            show_labels: show_labels.get(),
        };
        let _ = gloo_storage::LocalStorage::set(SETTINGS_KEY, &settings);
    });

    // Base map: fetched once. On failure the loading indicator stays up.
    Effect::new(move || {
        spawn_local(async move {
            match remote::fetch_world_atlas().await {
                Ok(features) => {
                    console::info(&format!("Loaded {} country boundaries", features.len()));
                    store.prune_to(features.iter().map(|f| f.id.clone()).collect());
                    base_map.set(features);
                }
                Err(e) => {
                    console::warn(&format!("Failed to load base map: {e}"));
                    base_map_failed.set(true);
                }
            }
        });
    });

    // Session changes reload membership and upsert the profile.
    Effect::new(move || {
        let session = current_session.get();
        store.sign_in(session.as_ref().map(|s| s.user_id.clone()));
        let Some(session) = session else {
            return;
        };
        spawn_local(async move {
            let profile = Profile {
                display_name: session.display_name.clone(),
                avatar_url: None,
            };
            match remote::put_profile(&session.user_id, &profile).await {
                Ok(()) => leaderboard_nonce.update(|n| *n = n.wrapping_add(1)),
                Err(e) => console::warn(&format!("Failed to save profile: {e}")),
            }
        });
    });

    // Leaderboard: refetch on every nonce bump; stale responses are dropped.
    let leaderboard_seq = Rc::new(Cell::new(0u64));
    Effect::new(move || {
        leaderboard_nonce.track();
        if current_session.with(Option::is_none) {
            leaderboard.set(Vec::new());
            return;
        }
        let seq = leaderboard_seq.get().wrapping_add(1);
        leaderboard_seq.set(seq);
        let leaderboard_seq = leaderboard_seq.clone();
        spawn_local(async move {
            match remote::fetch_leaderboard(LEADERBOARD_LIMIT).await {
                Ok(entries) if leaderboard_seq.get() == seq => leaderboard.set(entries),
                Ok(_) => {}
                Err(e) => console::warn(&format!("Failed to fetch leaderboard: {e}")),
            }
        });
    });

    Effect::new(move || {
        LEADERBOARD_POLL.with(|slot| {
            let interval = Interval::new(POLL_INTERVAL_MS, move || {
                leaderboard_nonce.update(|n| *n = n.wrapping_add(1));
            });
            // Dropping the previous interval cancels it.
            *slot.borrow_mut() = Some(interval);
        });
        on_cleanup(|| {
            LEADERBOARD_POLL.with(|slot| {
                slot.borrow_mut().take();
            });
        });
    });

    let map_loading = move || {
        (!base_map_failed.get() && base_map.with(Vec::is_empty)) || visits_loading.get()
    };

    view! {
        <style>{ROLL_KEYFRAMES}</style>
        <div style="width: 100%; height: 100%; position: relative; overflow: hidden; background: #0c0e17; font-family: 'Inter', system-ui, sans-serif;">
            <MapCanvas />
            <StatsOverlay />
            <LeaderboardPanel />
            <SessionPanel />
            {move || map_loading().then(|| view! {
                <div style="position: absolute; inset: 0; display: flex; align-items: center; justify-content: center; pointer-events: none; color: #9a9590; font-size: 0.85rem;">
                    "Loading map\u{2026}"
                </div>
            })}
            {move || base_map_failed.get().then(|| view! {
                <div style="position: absolute; inset: 0; display: flex; align-items: center; justify-content: center; pointer-events: none; color: #9a9590; font-size: 0.85rem;">
                    "Map data unavailable"
                </div>
            })}
            <ToastView />
        </div>
    }
}

const ROLL_KEYFRAMES: &str = "@keyframes travelmap-roll { from { transform: translateY(0); } to { transform: translateY(var(--roll-to)); } }";

/// Counter whose digits roll from the previous value to the new one.
#[component]
fn RollingNumber(#[prop(into)] value: Signal<usize>) -> impl IntoView {
    let previous = StoredValue::new(value.get_untracked());
    move || {
        let current = value.get();
        let from = previous.get_value();
        previous.set_value(current);
        digit_columns(from, current)
            .into_iter()
            .map(|column| {
                let steps = column.sequence.len();
                let strip: Vec<u8> = std::iter::once(column.from)
                    .chain(column.sequence.iter().copied())
                    .collect();
                let style = format!(
                    "display: flex; flex-direction: column; --roll-to: -{steps}em; animation: travelmap-roll {}ms cubic-bezier(0.22, 1, 0.36, 1) {}ms both;",
                    column.duration_ms, column.delay_ms
                );
                view! {
                    <span style="display: inline-block; height: 1em; line-height: 1em; overflow: hidden; font-variant-numeric: tabular-nums;">
                        <span style=style>
                            {strip.into_iter().map(|d| view! { <span>{d}</span> }).collect_view()}
                        </span>
                    </span>
                }
            })
            .collect_view()
    }
}

#[component]
fn StatsOverlay() -> impl IntoView {
    let VisitedIds(visited) = expect_context();
    let ShowLabels(show_labels) = expect_context();
    let count = Signal::derive(move || visited.with(BTreeSet::len));
    let stats = Memo::new(move |_| explore_stats(count.get()));

    view! {
        <div style="position: absolute; top: 16px; left: 16px; padding: 12px 16px; background: rgba(19,22,31,0.85); border: 1px solid #282c3e; border-radius: 12px; color: #e2e0d8;">
            <div style="font-size: 1.6rem; display: flex; align-items: baseline; gap: 4px;">
                <RollingNumber value=count />
                <span style="color: #9a9590; font-size: 0.9rem;">{move || format!("/ {}", stats.get().total)}</span>
            </div>
            <div style="color: #c9a96e; font-size: 0.8rem;">
                {move || format!("{}% explored", stats.get().percent)}
            </div>
            <button
                style="margin-top: 8px; background: none; border: 1px solid #282c3e; border-radius: 6px; color: #9a9590; font-size: 0.7rem; cursor: pointer; padding: 2px 8px;"
                on:click=move |_| show_labels.update(|v| *v = !*v)
            >
                {move || if show_labels.get() { "Hide labels" } else { "Show labels" }}
            </button>
        </div>
    }
}

#[component]
fn LeaderboardPanel() -> impl IntoView {
    let LeaderboardEntries(entries) = expect_context();
    let CurrentSession(current_session) = expect_context();

    let rows = Memo::new(move |_| {
        let user_id = current_session.with(|s| s.as_ref().map(|s| s.user_id.clone()));
        entries.with(|e| leaderboard_rows(e, user_id.as_deref()))
    });

    move || {
        let rows = rows.get();
        if rows.is_empty() {
            return ().into_any();
        }
        view! {
            <div style="position: absolute; bottom: 16px; left: 16px; width: 280px; padding: 8px; background: rgba(19,22,31,0.85); border: 1px solid #282c3e; border-radius: 12px; color: #e2e0d8;">
                <div style="font-size: 0.75rem; color: #9a9590; padding: 4px 8px;">"Leaderboard"</div>
                {rows.into_iter().map(|row| {
                    let rank_color = if row.rank <= 3 { "#c9a96e" } else { "#9a9590" };
                    let background = if row.is_current_user { "rgba(201,169,110,0.12)" } else { "transparent" };
                    let count_label = row.count_label();
                    let overflow = row.overflow_label();
                    let avatar = match row.avatar_url.clone() {
                        Some(url) => view! {
                            <img src=url alt="" style="width: 28px; height: 28px; border-radius: 50%; object-fit: cover;" />
                        }.into_any(),
                        None => view! {
                            <div style=format!("width: 28px; height: 28px; border-radius: 50%; display: flex; align-items: center; justify-content: center; font-size: 0.7rem; background: {};", row.avatar_color)>
                                {row.avatar_initials.clone()}
                            </div>
                        }.into_any(),
                    };
                    view! {
                        <div style=format!("display: flex; align-items: center; gap: 10px; padding: 6px 8px; border-radius: 10px; background: {background};")>
                            <span style=format!("width: 16px; text-align: right; color: {rank_color};")>{row.rank}</span>
                            {avatar}
                            <div style="display: flex; flex-direction: column; min-width: 0; flex: 1;">
                                <span style="font-size: 0.9rem; overflow: hidden; text-overflow: ellipsis; white-space: nowrap;">{row.first_name.clone()}</span>
                                <span style="font-size: 0.75rem; color: #9a9590;">{count_label}</span>
                            </div>
                            <div style="display: flex; align-items: center;">
                                {row.flags.iter().map(|flag| view! {
                                    <img
                                        src=flag.flag_url.clone()
                                        alt=flag.name
                                        title=flag.name
                                        style="width: 22px; height: 22px; border-radius: 50%; object-fit: cover; margin-left: -6px; border: 1.5px solid #13161f;"
                                    />
                                }).collect_view()}
                                {overflow.map(|label| view! {
                                    <span style="font-size: 0.7rem; color: #9a9590; margin-left: 4px;">{label}</span>
                                })}
                            </div>
                        </div>
                    }
                }).collect_view()}
            </div>
        }
        .into_any()
    }
}

/// Minimal sign-in stand-in: pick a display name, kept in local storage.
#[component]
fn SessionPanel() -> impl IntoView {
    let CurrentSession(current_session) = expect_context();
    let name_ref = NodeRef::<leptos::html::Input>::new();
    let error: RwSignal<Option<&'static str>> = RwSignal::new(None);

    let on_submit = move |e: web_sys::SubmitEvent| {
        e.prevent_default();
        let Some(input) = name_ref.get_untracked() else {
            return;
        };
        match Session::new(&input.value(), js_sys::Math::random(), js_sys::Date::now()) {
            Ok(session) => {
                session::save(&session);
                error.set(None);
                current_session.set(Some(session));
            }
            Err(reason) => error.set(Some(reason)),
        }
    };

    let sign_out = move |_| {
        session::clear();
        current_session.set(None);
    };

    move || match current_session.get() {
        Some(session) => view! {
            <div style="position: absolute; top: 16px; right: 16px; display: flex; align-items: center; gap: 8px; padding: 6px 10px; background: rgba(19,22,31,0.85); border: 1px solid #282c3e; border-radius: 10px; color: #e2e0d8; font-size: 0.8rem;">
                <span>{session.display_name}</span>
                <button
                    style="background: none; border: none; color: #9a9590; cursor: pointer; font-size: 0.75rem;"
                    on:click=sign_out
                >
                    "Sign out"
                </button>
            </div>
        }
        .into_any(),
        None => view! {
            <form
                on:submit=on_submit
                style="position: absolute; top: 16px; right: 16px; display: flex; flex-direction: column; gap: 6px; padding: 10px; background: rgba(19,22,31,0.85); border: 1px solid #282c3e; border-radius: 10px; color: #e2e0d8; font-size: 0.8rem;"
            >
                <label>"Your name to start marking countries"</label>
                <input
                    node_ref=name_ref
                    type="text"
                    maxlength="40"
                    style="background: #0c0e17; border: 1px solid #282c3e; border-radius: 6px; color: #e2e0d8; padding: 4px 8px;"
                />
                {move || error.get().map(|reason| view! { <span style="color: #e07a5f;">{reason}</span> })}
                <button type="submit" style="background: #c9a96e; border: none; border-radius: 6px; color: #13161f; padding: 4px 8px; cursor: pointer;">
                    "Start"
                </button>
            </form>
        }
        .into_any(),
    }
}

#[component]
fn ToastView() -> impl IntoView {
    let Toast(toast) = expect_context();

    view! {
        <div
            style="position: absolute; bottom: 24px; left: 50%; transform: translateX(-50%); padding: 8px 16px; border-radius: 999px; background: rgba(19,22,31,0.92); border: 1px solid #282c3e; color: #e2e0d8; font-size: 0.85rem; pointer-events: none; transition: opacity 0.2s;"
            style:opacity=move || if toast.with(ToastState::is_visible) { "1" } else { "0" }
        >
            {move || toast.with(|t| t.message().to_string())}
        </div>
    }
}
