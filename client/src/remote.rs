use travelmap_shared::{CountryFeature, LeaderboardEntry, NewVisit, Profile, VisitRecord, decode_features};

use crate::visited::VisitRemote;

pub const WORLD_ATLAS_URL: &str = "https://cdn.jsdelivr.net/npm/world-atlas@2/countries-110m.json";
const WORLD_ATLAS_OBJECT: &str = "countries";

fn user_path(user_id: &str) -> String {
    let encoded: String = js_sys::encode_uri_component(user_id).into();
    format!("/api/users/{encoded}")
}

/// Fetch and decode the base map boundaries.
pub async fn fetch_world_atlas() -> Result<Vec<CountryFeature>, String> {
    let resp = gloo_net::http::Request::get(WORLD_ATLAS_URL)
        .send()
        .await
        .map_err(|e| format!("fetch error: {e}"))?;

    if !resp.ok() {
        return Err(format!("HTTP {}", resp.status()));
    }

    let body = resp.text().await.map_err(|e| format!("fetch error: {e}"))?;
    decode_features(&body, WORLD_ATLAS_OBJECT).map_err(|e| format!("parse error: {e}"))
}

/// Fetch the top `limit` leaderboard rows.
pub async fn fetch_leaderboard(limit: u32) -> Result<Vec<LeaderboardEntry>, String> {
    let url = format!("/api/leaderboard?limit={limit}");
    let resp = gloo_net::http::Request::get(&url)
        .send()
        .await
        .map_err(|e| format!("fetch error: {e}"))?;

    if !resp.ok() {
        return Err(format!("HTTP {}", resp.status()));
    }

    resp.json::<Vec<LeaderboardEntry>>()
        .await
        .map_err(|e| format!("parse error: {e}"))
}

pub async fn put_profile(user_id: &str, profile: &Profile) -> Result<(), String> {
    let url = format!("{}/profile", user_path(user_id));
    let resp = gloo_net::http::Request::put(&url)
        .json(profile)
        .map_err(|e| format!("encode error: {e}"))?
        .send()
        .await
        .map_err(|e| format!("fetch error: {e}"))?;

    if !resp.ok() {
        return Err(format!("HTTP {}", resp.status()));
    }
    Ok(())
}

/// Visit persistence backed by the travelmap HTTP API.
#[derive(Clone, Copy, Default)]
pub struct HttpVisitRemote;

impl VisitRemote for HttpVisitRemote {
    async fn fetch_visits(&self, user_id: &str) -> Result<Vec<VisitRecord>, String> {
        let url = format!("{}/visits", user_path(user_id));
        let resp = gloo_net::http::Request::get(&url)
            .send()
            .await
            .map_err(|e| format!("fetch error: {e}"))?;

        if !resp.ok() {
            return Err(format!("HTTP {}", resp.status()));
        }

        resp.json::<Vec<VisitRecord>>()
            .await
            .map_err(|e| format!("parse error: {e}"))
    }

    async fn insert_visit(&self, user_id: &str, visit: NewVisit) -> Result<(), String> {
        let url = format!("{}/visits", user_path(user_id));
        let resp = gloo_net::http::Request::post(&url)
            .json(&visit)
            .map_err(|e| format!("encode error: {e}"))?
            .send()
            .await
            .map_err(|e| format!("fetch error: {e}"))?;

        if !resp.ok() {
            return Err(format!("HTTP {}", resp.status()));
        }
        Ok(())
    }

    async fn delete_visit(&self, user_id: &str, alpha3: &str) -> Result<(), String> {
        let url = format!("{}/visits/{alpha3}", user_path(user_id));
        let resp = gloo_net::http::Request::delete(&url)
            .send()
            .await
            .map_err(|e| format!("fetch error: {e}"))?;

        if !resp.ok() {
            return Err(format!("HTTP {}", resp.status()));
        }
        Ok(())
    }
}
