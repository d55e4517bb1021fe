use gloo_storage::Storage;
use serde::{Deserialize, Serialize};

const SESSION_KEY: &str = "travelmap_session";
pub const MAX_DISPLAY_NAME_CHARS: usize = 40;

/// Local stand-in for a signed-in account: an opaque id plus the name shown
/// on the leaderboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user_id: String,
    pub display_name: String,
}

impl Session {
    pub fn new(display_name: &str, seed: f64, now_ms: f64) -> Result<Self, &'static str> {
        Ok(Self {
            user_id: new_user_id(seed, now_ms),
            display_name: validate_display_name(display_name)?,
        })
    }
}

/// Trimmed display name, or why it was rejected.
pub fn validate_display_name(raw: &str) -> Result<String, &'static str> {
    let name = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    if name.is_empty() {
        return Err("Enter a name");
    }
    if name.chars().count() > MAX_DISPLAY_NAME_CHARS {
        return Err("Name is too long");
    }
    Ok(name)
}

/// `seed` in `[0, 1)` from `Math.random()`, `now_ms` from `Date.now()`.
pub fn new_user_id(seed: f64, now_ms: f64) -> String {
    let random = (seed.clamp(0.0, 1.0) * u32::MAX as f64) as u32;
    format!("u-{:x}-{random:08x}", now_ms.max(0.0) as u64)
}

pub fn load() -> Option<Session> {
    gloo_storage::LocalStorage::get(SESSION_KEY).ok()
}

pub fn save(session: &Session) {
    let _ = gloo_storage::LocalStorage::set(SESSION_KEY, session);
}

pub fn clear() {
    gloo_storage::LocalStorage::delete(SESSION_KEY);
}
