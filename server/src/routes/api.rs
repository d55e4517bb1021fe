use std::fmt::Write as _;

use axum::Json;
use axum::body::Body;
use axum::extract::{Query, State};
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use travelmap_shared::{LeaderboardEntry, LeaderboardQuery};

use crate::state::{AppState, ObservabilitySnapshot};

const PROMETHEUS_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

pub async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    let observability = state.observability.snapshot();
    Json(serde_json::json!({
        "status": "ok",
        "database_available": state.db.is_some(),
        "leaderboard_cache_entries": state.leaderboard_cache.len(),
        "observability": {
            "visit_reads_total": observability.visit_reads_total,
            "visit_writes_total": observability.visit_writes_total,
            "visit_write_failures_total": observability.visit_write_failures_total,
            "profile_writes_total": observability.profile_writes_total,
            "leaderboard_requests_total": observability.leaderboard_requests_total,
            "leaderboard_cache_hits_total": observability.leaderboard_cache_hits_total,
            "leaderboard_cache_misses_total": observability.leaderboard_cache_misses_total,
        }
    }))
}

pub async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    let body = render_prometheus_metrics(
        state.db.is_some(),
        state.leaderboard_cache.len(),
        state.observability.snapshot(),
    );

    (
        [
            (header::CONTENT_TYPE, PROMETHEUS_CONTENT_TYPE),
            (header::CACHE_CONTROL, "no-store"),
        ],
        body,
    )
}

fn render_prometheus_metrics(
    database_available: bool,
    leaderboard_cache_entries: usize,
    observability: ObservabilitySnapshot,
) -> String {
    let mut body = String::new();
    let _ = writeln!(
        body,
        "# HELP travelmap_database_available Whether PostgreSQL storage is configured (1/0)."
    );
    let _ = writeln!(body, "# TYPE travelmap_database_available gauge");
    let _ = writeln!(
        body,
        "travelmap_database_available {}",
        u8::from(database_available)
    );

    let _ = writeln!(
        body,
        "# HELP travelmap_leaderboard_cache_entries Cached leaderboard bodies, one per limit."
    );
    let _ = writeln!(body, "# TYPE travelmap_leaderboard_cache_entries gauge");
    let _ = writeln!(
        body,
        "travelmap_leaderboard_cache_entries {leaderboard_cache_entries}"
    );

    let counters = [
        (
            "travelmap_visit_reads_total",
            "Total visit list requests served from storage.",
            observability.visit_reads_total,
        ),
        (
            "travelmap_visit_writes_total",
            "Total successful visit inserts and deletes.",
            observability.visit_writes_total,
        ),
        (
            "travelmap_visit_write_failures_total",
            "Total visit inserts and deletes that failed in storage.",
            observability.visit_write_failures_total,
        ),
        (
            "travelmap_profile_writes_total",
            "Total successful profile upserts.",
            observability.profile_writes_total,
        ),
        (
            "travelmap_leaderboard_requests_total",
            "Total leaderboard requests.",
            observability.leaderboard_requests_total,
        ),
        (
            "travelmap_leaderboard_cache_hits_total",
            "Total leaderboard requests served from cache.",
            observability.leaderboard_cache_hits_total,
        ),
        (
            "travelmap_leaderboard_cache_misses_total",
            "Total leaderboard requests that queried storage.",
            observability.leaderboard_cache_misses_total,
        ),
    ];
    for (name, help, value) in counters {
        let _ = writeln!(body, "# HELP {name} {help}");
        let _ = writeln!(body, "# TYPE {name} counter");
        let _ = writeln!(body, "{name} {value}");
    }

    body
}

/// Top users by distinct countries visited. Ties go to whoever reached their
/// count first, then to the lower user id.
pub async fn get_leaderboard(
    State(state): State<AppState>,
    Query(query): Query<LeaderboardQuery>,
) -> Result<Response, StatusCode> {
    state.observability.record_leaderboard_request();
    let limit = query.effective_limit(state.leaderboard_max_limit);

    if let Some(body) = state.cached_leaderboard(limit) {
        state.observability.record_leaderboard_cache_hit();
        return Ok(json_bytes_response(body, "no-store"));
    }
    state.observability.record_leaderboard_cache_miss();

    let pool = state.db.as_ref().ok_or(StatusCode::SERVICE_UNAVAILABLE)?;
    let generation = state.leaderboard_generation();
    let rows = sqlx::query_as::<_, (String, Option<String>, Option<String>, i64, Vec<String>)>(
        "SELECT v.user_id, p.display_name, p.avatar_url, \
                COUNT(*) AS country_count, \
                ARRAY_AGG(v.country_code ORDER BY v.country_code) AS country_codes \
         FROM visited_countries v \
         LEFT JOIN profiles p ON p.user_id = v.user_id \
         GROUP BY v.user_id, p.display_name, p.avatar_url \
         ORDER BY country_count DESC, MAX(v.visited_at) ASC, v.user_id ASC \
         LIMIT $1",
    )
    .bind(i64::from(limit))
    .fetch_all(pool)
    .await
    .map_err(|e| {
        tracing::warn!(error = %e, limit, "failed to query leaderboard");
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    let entries: Vec<LeaderboardEntry> = rows
        .into_iter()
        .map(
            |(user_id, display_name, avatar_url, country_count, country_codes)| LeaderboardEntry {
                user_id,
                display_name,
                avatar_url,
                country_count: u32::try_from(country_count).unwrap_or(u32::MAX),
                country_codes,
            },
        )
        .collect();

    let body = serde_json::to_vec(&entries)
        .map(Bytes::from)
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    state.store_leaderboard(limit, generation, body.clone());
    Ok(json_bytes_response(body, "no-store"))
}

fn json_bytes_response(body: Bytes, cache_control: &'static str) -> Response {
    let mut response = Response::new(Body::from(body));
    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static(cache_control),
    );
    response
}
