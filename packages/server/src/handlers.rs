//! HTTP handler functions for the civic quest API.

use actix_web::{HttpResponse, web};
use civic_quest_pipeline::assemble::build_snapshot;
use civic_quest_pipeline::progress::null_progress;
use civic_quest_server_models::{
    ApiError, ApiHealth, CompareParams, ReloadResponse, SearchParams,
};

use crate::{AppState, queries};

/// `GET /api/health`
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(ApiHealth {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// `GET /api/states`
pub async fn states(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(queries::list_states(&state.store.current()))
}

/// `GET /api/search?q=`
///
/// Returns up to twelve matches; a missing or blank query returns `[]`.
pub async fn search(state: web::Data<AppState>, params: web::Query<SearchParams>) -> HttpResponse {
    let query = params.q.as_deref().unwrap_or_default();
    HttpResponse::Ok().json(queries::search(&state.store.current(), query))
}

/// `GET /api/county/{fips}`
pub async fn county(state: web::Data<AppState>, path: web::Path<String>) -> HttpResponse {
    let fips = path.into_inner();
    queries::county(&state.store.current(), &fips).map_or_else(
        || not_found(&format!("County {fips} not found")),
        |record| HttpResponse::Ok().json(record),
    )
}

/// `GET /api/state/{code}`
pub async fn state_profile(state: web::Data<AppState>, path: web::Path<String>) -> HttpResponse {
    let code = path.into_inner();
    queries::state_profile(&state.store.current(), &code).map_or_else(
        || not_found(&format!("State {code} not found")),
        |profile| HttpResponse::Ok().json(profile),
    )
}

/// `GET /api/compare?a=&b=`
pub async fn compare(state: web::Data<AppState>, params: web::Query<CompareParams>) -> HttpResponse {
    queries::compare(&state.store.current(), &params.a, &params.b).map_or_else(
        || not_found(&format!("State {} or {} not found", params.a, params.b)),
        |comparison| HttpResponse::Ok().json(comparison),
    )
}

/// `GET /api/export`
///
/// Returns the full dataset as a single export document.
pub async fn export(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(state.store.current().to_export())
}

/// `POST /api/reload`
///
/// Rebuilds the snapshot from the raw inputs on a blocking thread and
/// swaps it in. On failure the previous snapshot stays live.
pub async fn reload(state: web::Data<AppState>) -> HttpResponse {
    let config = state.config.clone();
    let result = web::block(move || build_snapshot(&config, &null_progress())).await;

    match result {
        Ok(Ok(snapshot)) => {
            let metadata = snapshot.metadata().clone();
            state.store.replace(snapshot);
            log::info!(
                "Reloaded snapshot: {} counties, {} states",
                metadata.county_count,
                metadata.state_count
            );
            HttpResponse::Ok().json(ReloadResponse { metadata })
        }
        Ok(Err(e)) => {
            log::error!("Failed to rebuild snapshot: {e}");
            HttpResponse::InternalServerError().json(ApiError::new(format!(
                "Failed to rebuild snapshot: {e}"
            )))
        }
        Err(e) => {
            log::error!("Snapshot rebuild task failed: {e}");
            HttpResponse::InternalServerError().json(ApiError::new("Failed to rebuild snapshot"))
        }
    }
}

fn not_found(message: &str) -> HttpResponse {
    HttpResponse::NotFound().json(ApiError::new(message))
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use actix_web::{App, http::StatusCode, test};
    use civic_quest_pipeline::config::PipelineConfig;
    use serde_json::Value;

    use crate::store::SnapshotStore;
    use crate::{AppState, configure};

    fn app_state(root: &Path) -> actix_web::web::Data<AppState> {
        actix_web::web::Data::new(AppState {
            store: SnapshotStore::new(crate::queries::tests::sample_snapshot()),
            config: PipelineConfig::embedded(root.to_path_buf()),
        })
    }

    #[actix_web::test]
    async fn county_found_and_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let app = test::init_service(App::new().app_data(app_state(dir.path())).configure(configure)).await;

        let req = test::TestRequest::get().uri("/api/county/6001").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["fips"], "06001");
        assert_eq!(body["state"], "CA");

        let req = test::TestRequest::get().uri("/api/county/99999").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body: Value = test::read_body_json(resp).await;
        assert!(body["error"].as_str().unwrap().contains("99999"));
    }

    #[actix_web::test]
    async fn empty_search_is_ok_and_empty() {
        let dir = tempfile::tempdir().unwrap();
        let app = test::init_service(App::new().app_data(app_state(dir.path())).configure(configure)).await;

        let req = test::TestRequest::get().uri("/api/search").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body, serde_json::json!([]));

        let req = test::TestRequest::get().uri("/api/search?q=alpine").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body[0]["display"], "Alpine, CA");
    }

    #[actix_web::test]
    async fn state_profile_and_compare() {
        let dir = tempfile::tempdir().unwrap();
        let app = test::init_service(App::new().app_data(app_state(dir.path())).configure(configure)).await;

        let req = test::TestRequest::get().uri("/api/state/al").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["summary"]["state"], "AL");
        assert_eq!(body["top_counties"][0]["name"], "Baldwin");

        let req = test::TestRequest::get().uri("/api/compare?a=CA&b=AL").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["gaps"]["overall"], 0.75);

        let req = test::TestRequest::get().uri("/api/compare?a=CA&b=ZZ").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn failed_reload_keeps_previous_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let state = app_state(dir.path());
        let app = test::init_service(App::new().app_data(state.clone()).configure(configure)).await;

        let req = test::TestRequest::post().uri("/api/reload").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(state.store.current().counties().len(), 16);
    }

    #[actix_web::test]
    async fn reload_swaps_in_rebuilt_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let raw = dir.path().join("raw_data");
        std::fs::create_dir_all(&raw).unwrap();
        std::fs::write(
            raw.join("cnty_counts_cov.csv"),
            "FIPS,TotalPopulation,score\n56001,100,1.0\n",
        )
        .unwrap();
        std::fs::write(raw.join("cnty_civic_type_dashboard.csv"), "fips,class,n\n").unwrap();
        std::fs::write(raw.join("counties.csv"), "GEOID,NAME,STUSPS\n56001,Albany,WY\n").unwrap();

        let state = app_state(dir.path());
        let app = test::init_service(App::new().app_data(state.clone()).configure(configure)).await;

        let req = test::TestRequest::post().uri("/api/reload").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["metadata"]["county_count"], 1);

        let req = test::TestRequest::get().uri("/api/states").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["states"][0]["name"], "Wyoming");
    }

    #[actix_web::test]
    async fn health_reports_version() {
        let dir = tempfile::tempdir().unwrap();
        let app = test::init_service(App::new().app_data(app_state(dir.path())).configure(configure)).await;

        let req = test::TestRequest::get().uri("/api/health").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["healthy"], true);
        assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    }
}
