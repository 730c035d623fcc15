//! A thin `axum` adapter over the generation engine and in-memory store.
//! Not where the specified behavior lives (§4.14): it exists to give the
//! crate a runnable surface, translating `Store`/`Engine`/`Midi` errors
//! into the HTTP status taxonomy at the boundary.

pub mod error;
pub mod routes;
pub mod state;

use axum::routing::{get, patch, post};
use axum::Router;

pub use state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/projects", post(routes::projects::create_project).get(routes::projects::list_projects))
        .route(
            "/projects/{id}",
            get(routes::projects::get_project).patch(routes::projects::update_project),
        )
        .route("/projects/{id}/tracks", post(routes::projects::create_track).get(routes::projects::list_tracks))
        .route("/tracks/{id}", get(routes::projects::get_track))
        .route("/tracks/{id}/mute", patch(routes::projects::mute_track))
        .route("/clips/{id}", patch(routes::clips::update_clip))
        .route("/clips/{id}/mute", patch(routes::clips::mute_clip))
        .route("/clips/{id}/solo", patch(routes::clips::solo_clip))
        .route("/clips/{id}/duplicate", post(routes::clips::duplicate_clip))
        .route("/clips/{id}/offset", post(routes::clips::offset_clip))
        .route("/clips/{id}/time-scale", post(routes::clips::time_scale_clip))
        .route("/clips/{id}/regenerate", post(routes::clips::regenerate_clip))
        .route("/clips/{id}/preview-regenerate", post(routes::clips::preview_regenerate_clip))
        .route("/segments/generate", post(routes::segments::generate_segments))
        .route("/chords/generate/run", post(routes::chords::generate_run))
        .route("/chords/generate/runs/{id}", get(routes::chords::get_run))
        .route("/chords/insert", post(routes::chords::insert_chord_event))
        .route(
            "/chords/events/{id}",
            get(routes::chords::get_chord_event).patch(routes::chords::update_chord_event),
        )
        .route("/clips/{clip_id}/chords", get(routes::chords::list_chord_events))
        .route(
            "/polyrhythms/profiles",
            post(routes::polyrhythms::create_profile).get(routes::polyrhythms::list_profiles),
        )
        .route("/polyrhythms/profiles/{id}", get(routes::polyrhythms::get_profile))
        .route("/polyrhythms/preview", post(routes::polyrhythms::preview_profile))
        .route("/polyrhythms/preview-lanes", post(routes::polyrhythms::preview_lanes))
        .route("/polyrhythms/lanes", post(routes::polyrhythms::create_lane))
        .route("/clips/{clip_id}/lanes", get(routes::polyrhythms::list_lanes))
        .route(
            "/drum-maps",
            post(routes::drum_maps::create_drum_map).get(routes::drum_maps::list_drum_maps),
        )
        .route("/drum-maps/{id}", get(routes::drum_maps::get_drum_map))
        .route("/projects/{id}/export/midi", get(routes::export::export_midi))
        .route("/projects/{id}/export/zip", get(routes::export::export_zip))
        .route("/projects/{id}/export/json", get(routes::export::export_json))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    #[tokio::test]
    async fn unknown_project_returns_404() {
        let app = router(AppState::new());
        let response = app
            .oneshot(Request::builder().uri(format!("/projects/{}", Uuid::new_v4())).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn create_then_fetch_project_round_trips() {
        let app = router(AppState::new());
        let project = reel_model::Project {
            id: Uuid::new_v4(),
            name: "demo".into(),
            bpm: 120,
            time_signature_num: 4,
            time_signature_den: 4,
            bars: 4,
            key_tonic: "C".into(),
            mode: reel_model::Mode::Ionian,
            seed: 1,
        };
        let body = serde_json::to_vec(&project).unwrap();
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/projects")
                    .header("content-type", "application/json")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .oneshot(Request::builder().uri(format!("/projects/{}", project.id)).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    use uuid::Uuid;
}
