use std::path::Path;

use axum::{
    Router,
    extract::Request,
    http::{HeaderValue, header},
    middleware::{self, Next},
    response::Response,
};
use tower_http::compression::CompressionLayer;
use tower_http::services::ServeDir;

use crate::routes;
use crate::state::AppState;

pub(crate) fn build_app(state: AppState) -> Router {
    let static_assets = Router::new()
        .fallback_service(
            ServeDir::new("client/dist")
                .precompressed_br()
                .precompressed_gzip(),
        )
        .layer(middleware::from_fn(set_static_cache_control));

    let app = Router::new()
        .route(
            "/api/users/{user_id}/visits",
            axum::routing::get(routes::visits::get_visits).post(routes::visits::post_visit),
        )
        .route(
            "/api/users/{user_id}/visits/{country_code}",
            axum::routing::delete(routes::visits::delete_visit),
        )
        .route(
            "/api/users/{user_id}/profile",
            axum::routing::put(routes::visits::put_profile),
        )
        .route(
            "/api/leaderboard",
            axum::routing::get(routes::api::get_leaderboard),
        )
        .route("/api/health", axum::routing::get(routes::api::health))
        .route("/api/metrics", axum::routing::get(routes::api::metrics));

    app.layer(CompressionLayer::new())
        .fallback_service(static_assets)
        .with_state(state)
}

async fn set_static_cache_control(request: Request, next: Next) -> Response {
    let path = request.uri().path().to_owned();
    let mut response = next.run(request).await;

    if response.status().is_success() {
        response.headers_mut().insert(
            header::CACHE_CONTROL,
            HeaderValue::from_static(bundle_cache_control(&path)),
        );
    }

    response
}

/// Hashed client bundles never change under the same name; the HTML entry
/// point must be revalidated so it picks up new bundle names.
fn bundle_cache_control(path: &str) -> &'static str {
    if client_bundle_hash(path).is_some() {
        "public, max-age=31536000, immutable"
    } else {
        "no-cache"
    }
}

/// Content hash of a `travelmap-client-<hash>[_bg].{wasm,js}` bundle file.
fn client_bundle_hash(path: &str) -> Option<&str> {
    let file = Path::new(path).file_name()?.to_str()?;
    let stem = file
        .strip_suffix(".wasm")
        .or_else(|| file.strip_suffix(".js"))?;
    let stem = stem.strip_suffix("_bg").unwrap_or(stem);
    let hash = stem.strip_prefix("travelmap-client-")?;
    (hash.len() >= 8 && hash.chars().all(|c| c.is_ascii_hexdigit())).then_some(hash)
}
