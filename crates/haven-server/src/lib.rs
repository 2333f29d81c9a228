//! HTTP server assembly for the haven incident record service.
//!
//! Builds the full application router (JSON API nested under `/api`, request
//! tracing) over any [`IncidentStore`] backend. The binary in `main.rs`
//! wires this to a SQLite store using `config.toml` / `HAVEN_*` settings.

use std::{path::PathBuf, sync::Arc};

use axum::Router;
use haven_core::store::IncidentStore;
use serde::Deserialize;
use tower_http::trace::TraceLayer;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` merged with
/// `HAVEN_`-prefixed environment variables.
#[derive(Deserialize, Clone)]
pub struct ServerConfig {
  pub host:       String,
  pub port:       u16,
  pub store_path: PathBuf,
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the application [`Router`] for `store`.
pub fn router<S>(store: Arc<S>) -> Router
where
  S: IncidentStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  Router::new()
    .nest("/api", haven_api::api_router(store))
    .layer(TraceLayer::new_for_http())
}

// ─── Integration tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use super::*;

  use axum::{
    body::Body,
    http::{Request, StatusCode, header},
  };
  use haven_core::{
    directory::{NewStaff, NewStudent},
    store::IncidentStore as _,
  };
  use haven_store_sqlite::SqliteStore;
  use serde_json::{Value, json};
  use tower::ServiceExt as _;

  /// An in-memory store with the students and staff the scenarios reference.
  async fn seeded_store() -> Arc<SqliteStore> {
    let store = SqliteStore::open_in_memory().await.unwrap();
    for (id, first, last) in
      [("S1", "Alice", "Liddell"), ("S2", "Bob", "Crane")]
    {
      store
        .add_student(NewStudent {
          id:            Some(id.to_string()),
          first_name:    first.to_string(),
          last_name:     last.to_string(),
          date_of_birth: None,
          year_group:    None,
        })
        .await
        .unwrap();
    }
    store
      .add_staff(NewStaff {
        id:           Some(7),
        display_name: "Dana Priest".to_string(),
      })
      .await
      .unwrap();
    Arc::new(store)
  }

  async fn oneshot(
    store: Arc<SqliteStore>,
    method: &str,
    uri: &str,
    body: Option<Value>,
  ) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
      Some(v) => {
        builder = builder.header(header::CONTENT_TYPE, "application/json");
        Body::from(v.to_string())
      }
      None => Body::empty(),
    };
    let resp = router(store)
      .oneshot(builder.body(body).unwrap())
      .await
      .unwrap();

    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
      .await
      .unwrap();
    let value = if bytes.is_empty() {
      Value::Null
    } else {
      serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
  }

  /// The write body clients actually send: snake_case student reference,
  /// camelCase collections.
  fn scenario_body() -> Value {
    json!({
      "id": "42",
      "student_id": "S1",
      "primaryStudent": "S1",
      "linkedStudents": ["S2"],
      "bodyMapMarkers": [{"x": 10.0, "y": 20.0, "note": "bruise"}],
      "notifyStaff": [7],
    })
  }

  // ── Create ──────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn create_returns_201_with_camel_case_envelope() {
    let store = seeded_store().await;
    let (status, body) =
      oneshot(store, "POST", "/api/incidents", Some(scenario_body())).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["reportId"], json!(42));
  }

  #[tokio::test]
  async fn create_then_get_returns_the_full_aggregate() {
    let store = seeded_store().await;
    oneshot(
      store.clone(),
      "POST",
      "/api/incidents",
      Some(scenario_body()),
    )
    .await;

    let (status, body) =
      oneshot(store, "GET", "/api/incidents/42", None).await;
    assert_eq!(status, StatusCode::OK);

    assert_eq!(body["incident"]["id"], json!(42));
    assert_eq!(body["incident"]["category_name"], json!("Uncategorised"));

    let roles: Vec<(&str, &str)> = body["students"]
      .as_array()
      .unwrap()
      .iter()
      .map(|ls| {
        (
          ls["student"]["id"].as_str().unwrap(),
          ls["role"].as_str().unwrap(),
        )
      })
      .collect();
    assert_eq!(roles, [
      ("S1", "involved"),
      ("S1", "primary"),
      ("S2", "involved"),
    ]);

    let marks = body["body_map"].as_array().unwrap();
    assert_eq!(marks.len(), 1);
    assert_eq!(marks[0]["view"], json!("front"));
    assert_eq!(marks[0]["note"], json!("bruise"));

    let notifications = body["notifications"].as_array().unwrap();
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0]["user_id"], json!(7));
    assert_eq!(notifications[0]["user_name"], json!("Dana Priest"));

    assert!(body["degraded"].as_array().unwrap().is_empty());
  }

  #[tokio::test]
  async fn failed_create_returns_500_and_leaves_nothing_behind() {
    let store = seeded_store().await;

    let mut body = scenario_body();
    // No such staff user: the final insert step fails and everything rolls
    // back.
    body["notifyStaff"] = json!([999]);

    let (status, resp) =
      oneshot(store.clone(), "POST", "/api/incidents", Some(body)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(resp["error"].is_string());

    let (status, _) = oneshot(store, "GET", "/api/incidents/42", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
  }

  // ── Read validation ─────────────────────────────────────────────────────────

  #[tokio::test]
  async fn non_numeric_id_is_rejected_with_400() {
    let store = seeded_store().await;
    let (status, body) =
      oneshot(store, "GET", "/api/incidents/abc", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
  }

  #[tokio::test]
  async fn unknown_incident_returns_404() {
    let store = seeded_store().await;
    let (status, body) =
      oneshot(store, "GET", "/api/incidents/12345", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].is_string());
  }

  // ── Browse ──────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn list_returns_created_incidents() {
    let store = seeded_store().await;
    oneshot(
      store.clone(),
      "POST",
      "/api/incidents",
      Some(scenario_body()),
    )
    .await;

    let (status, body) = oneshot(store, "GET", "/api/incidents", None).await;
    assert_eq!(status, StatusCode::OK);
    let rows = body.as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["id"], json!(42));
    assert_eq!(rows[0]["status_name"], json!("Open"));
  }

  // ── Directory ───────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn student_registration_generates_an_id() {
    let store = seeded_store().await;
    let (status, body) = oneshot(
      store,
      "POST",
      "/api/students",
      Some(json!({"first_name": "Cara", "last_name": "Doyle"})),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert!(!body["id"].as_str().unwrap().is_empty());
  }

  #[tokio::test]
  async fn attachment_metadata_round_trips_through_the_aggregate() {
    let store = seeded_store().await;
    oneshot(
      store.clone(),
      "POST",
      "/api/incidents",
      Some(scenario_body()),
    )
    .await;

    let (status, _) = oneshot(
      store.clone(),
      "POST",
      "/api/incidents/42/attachments",
      Some(json!({
        "file_name": "photo.jpg",
        "file_path": "uploads/photo.jpg",
        "media_type": "image/jpeg",
        "uploaded_by": 7,
      })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, body) = oneshot(store, "GET", "/api/incidents/42", None).await;
    let attachments = body["attachments"].as_array().unwrap();
    assert_eq!(attachments.len(), 1);
    assert_eq!(attachments[0]["attachment"]["file_name"], json!("photo.jpg"));
    assert_eq!(attachments[0]["uploaded_by_name"], json!("Dana Priest"));
  }
}
