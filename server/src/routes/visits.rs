use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use travelmap_shared::countries;
use travelmap_shared::{NewVisit, Profile, VisitRecord};

use crate::config::{MAX_AVATAR_URL_LEN, MAX_DISPLAY_NAME_LEN, MAX_USER_ID_LEN};
use crate::state::AppState;

pub async fn get_visits(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<VisitRecord>>, StatusCode> {
    let user_id = normalize_user_id(&user_id)?;
    let pool = state.db.as_ref().ok_or(StatusCode::SERVICE_UNAVAILABLE)?;
    state.observability.record_visit_read();

    let rows = sqlx::query_as::<_, (String, DateTime<Utc>)>(
        "SELECT country_code, visited_at FROM visited_countries \
         WHERE user_id = $1 ORDER BY visited_at DESC, country_code",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
    .map_err(|e| {
        tracing::warn!(error = %e, user_id, "failed to load visits");
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    Ok(Json(
        rows.into_iter()
            .map(|(country_code, visited_at)| VisitRecord {
                country_code,
                visited_at,
            })
            .collect(),
    ))
}

/// Duplicate inserts keep the first visit time and still return 201.
pub async fn post_visit(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(visit): Json<NewVisit>,
) -> Result<StatusCode, StatusCode> {
    let user_id = normalize_user_id(&user_id)?;
    let country_code = normalize_country_code(&visit.country_code)?;
    let pool = state.db.as_ref().ok_or(StatusCode::SERVICE_UNAVAILABLE)?;

    let result = sqlx::query(
        "INSERT INTO visited_countries (user_id, country_code, visited_at) \
         VALUES ($1, $2, $3) ON CONFLICT (user_id, country_code) DO NOTHING",
    )
    .bind(user_id)
    .bind(country_code)
    .bind(visit.visited_at)
    .execute(pool)
    .await;

    match result {
        Ok(_) => {
            state.observability.record_visit_write();
            state.invalidate_leaderboard();
            Ok(StatusCode::CREATED)
        }
        Err(e) => {
            state.observability.record_visit_write_failure();
            tracing::warn!(error = %e, user_id, country_code, "failed to insert visit");
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Deleting a visit that does not exist is not an error.
pub async fn delete_visit(
    State(state): State<AppState>,
    Path((user_id, country_code)): Path<(String, String)>,
) -> Result<StatusCode, StatusCode> {
    let user_id = normalize_user_id(&user_id)?;
    let country_code = normalize_country_code(&country_code)?;
    let pool = state.db.as_ref().ok_or(StatusCode::SERVICE_UNAVAILABLE)?;

    let result = sqlx::query(
        "DELETE FROM visited_countries WHERE user_id = $1 AND country_code = $2",
    )
    .bind(user_id)
    .bind(country_code)
    .execute(pool)
    .await;

    match result {
        Ok(_) => {
            state.observability.record_visit_write();
            state.invalidate_leaderboard();
            Ok(StatusCode::NO_CONTENT)
        }
        Err(e) => {
            state.observability.record_visit_write_failure();
            tracing::warn!(error = %e, user_id, country_code, "failed to delete visit");
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

pub async fn put_profile(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(profile): Json<Profile>,
) -> Result<StatusCode, StatusCode> {
    let user_id = normalize_user_id(&user_id)?;
    let (display_name, avatar_url) = normalize_profile(&profile)?;
    let pool = state.db.as_ref().ok_or(StatusCode::SERVICE_UNAVAILABLE)?;

    sqlx::query(
        "INSERT INTO profiles (user_id, display_name, avatar_url, updated_at) \
         VALUES ($1, $2, $3, now()) \
         ON CONFLICT (user_id) DO UPDATE \
         SET display_name = EXCLUDED.display_name, \
             avatar_url = EXCLUDED.avatar_url, \
             updated_at = EXCLUDED.updated_at",
    )
    .bind(user_id)
    .bind(display_name)
    .bind(avatar_url)
    .execute(pool)
    .await
    .map_err(|e| {
        tracing::warn!(error = %e, user_id, "failed to upsert profile");
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    state.observability.record_profile_write();
    state.invalidate_leaderboard();
    Ok(StatusCode::NO_CONTENT)
}

pub(crate) fn normalize_user_id(user_id: &str) -> Result<&str, StatusCode> {
    let trimmed = user_id.trim();
    if trimmed.is_empty() || trimmed.len() > MAX_USER_ID_LEN {
        return Err(StatusCode::BAD_REQUEST);
    }

    if trimmed
        .chars()
        .any(|ch| ch.is_control() || ch.is_whitespace() || matches!(ch, '/' | '\\' | '?' | '#'))
    {
        return Err(StatusCode::BAD_REQUEST);
    }

    Ok(trimmed)
}

/// Canonical alpha-3 code for a known country.
fn normalize_country_code(code: &str) -> Result<&'static str, StatusCode> {
    let upper = code.trim().to_ascii_uppercase();
    countries::by_alpha3(&upper)
        .map(|meta| meta.alpha3)
        .ok_or(StatusCode::BAD_REQUEST)
}

fn normalize_profile(profile: &Profile) -> Result<(&str, Option<&str>), StatusCode> {
    let display_name = profile.display_name.trim();
    if display_name.is_empty()
        || display_name.chars().count() > MAX_DISPLAY_NAME_LEN
        || display_name.chars().any(char::is_control)
    {
        return Err(StatusCode::BAD_REQUEST);
    }

    let avatar_url = match profile.avatar_url.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(url) => {
            let has_scheme = url.starts_with("https://") || url.starts_with("http://");
            if !has_scheme || url.len() > MAX_AVATAR_URL_LEN {
                return Err(StatusCode::BAD_REQUEST);
            }
            Some(url)
        }
    };

    Ok((display_name, avatar_url))
}
