//! Handlers for `/incidents` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/incidents` | Summary list, newest incident date first |
//! | `POST` | `/incidents` | Body: [`NewIncidentBody`]; returns 201 + `{success, reportId}` |
//! | `GET`  | `/incidents/:id` | 400 if the id is not a decimal number, 404 if absent |
//! | `POST` | `/incidents/:id/attachments` | Metadata only; the binary lives in file storage |
//!
//! The write body keeps the field names clients actually send: the student
//! reference is snake_case, the collections are camelCase.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use chrono::{NaiveDate, NaiveTime};
use haven_core::{
  aggregate::{IncidentAggregate, IncidentSummary},
  directory::NewAttachment,
  incident::{NewBodyMapMark, NewIncident, ReportId},
  store::IncidentStore,
};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /incidents`
pub async fn list<S>(
  State(store): State<Arc<S>>,
) -> Result<Json<Vec<IncidentSummary>>, ApiError>
where
  S: IncidentStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let incidents = store
    .list_incidents()
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(incidents))
}

// ─── Create ───────────────────────────────────────────────────────────────────

/// JSON body accepted by `POST /incidents`.
#[derive(Debug, Deserialize)]
pub struct NewIncidentBody {
  pub id:                 Option<ReportId>,
  pub student_id:         String,
  pub category_id:        Option<i64>,
  pub location_id:        Option<i64>,
  pub incident_date:      Option<NaiveDate>,
  pub incident_time:      Option<NaiveTime>,
  pub details:            Option<String>,
  pub witness_id:         Option<i64>,
  pub actions_taken:      Option<String>,
  #[serde(default)]
  pub requires_follow_up: bool,
  #[serde(default)]
  pub is_confidential:    bool,
  #[serde(default)]
  pub urgent:             bool,
  pub created_by:         Option<i64>,
  #[serde(rename = "primaryStudent")]
  pub primary_student:    Option<String>,
  #[serde(default, rename = "linkedStudents")]
  pub linked_students:    Vec<String>,
  #[serde(default, rename = "bodyMapMarkers")]
  pub body_map_markers:   Vec<NewBodyMapMark>,
  #[serde(default, rename = "notifyStaff")]
  pub notify_staff:       Vec<i64>,
}

impl From<NewIncidentBody> for NewIncident {
  fn from(b: NewIncidentBody) -> Self {
    NewIncident {
      id:                 b.id,
      student_id:         b.student_id,
      category_id:        b.category_id,
      location_id:        b.location_id,
      incident_date:      b.incident_date,
      incident_time:      b.incident_time,
      details:            b.details,
      witness_id:         b.witness_id,
      actions_taken:      b.actions_taken,
      requires_follow_up: b.requires_follow_up,
      is_confidential:    b.is_confidential,
      urgent:             b.urgent,
      created_by:         b.created_by,
      primary_student:    b.primary_student,
      linked_students:    b.linked_students,
      body_map_markers:   b.body_map_markers,
      notify_staff:       b.notify_staff,
    }
  }
}

/// Response envelope for a successful create.
#[derive(Debug, Serialize)]
pub struct CreatedResponse {
  pub success:   bool,
  #[serde(rename = "reportId")]
  pub report_id: ReportId,
}

/// `POST /incidents` — returns 201 + `{"success":true,"reportId":N}`.
pub async fn create<S>(
  State(store): State<Arc<S>>,
  Json(body): Json<NewIncidentBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: IncidentStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let report_id = store
    .create_incident(NewIncident::from(body))
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok((
    StatusCode::CREATED,
    Json(CreatedResponse {
      success: true,
      report_id,
    }),
  ))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /incidents/:id`
///
/// The identifier is validated before any datastore access: anything other
/// than a non-empty decimal string is rejected with 400.
pub async fn get_one<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<String>,
) -> Result<Json<IncidentAggregate>, ApiError>
where
  S: IncidentStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let id: ReportId =
    id.parse().map_err(|e: haven_core::Error| ApiError::BadRequest(e.to_string()))?;

  let aggregate = store
    .get_incident(id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .ok_or_else(|| ApiError::NotFound(format!("incident {id} not found")))?;
  Ok(Json(aggregate))
}

// ─── Attachments ──────────────────────────────────────────────────────────────

/// JSON body accepted by `POST /incidents/:id/attachments`.
#[derive(Debug, Deserialize)]
pub struct AttachmentBody {
  pub file_name:   String,
  pub file_path:   String,
  pub media_type:  String,
  pub uploaded_by: Option<i64>,
}

/// `POST /incidents/:id/attachments` — returns 201 + the stored metadata row.
pub async fn add_attachment<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<String>,
  Json(body): Json<AttachmentBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: IncidentStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let id: ReportId =
    id.parse().map_err(|e: haven_core::Error| ApiError::BadRequest(e.to_string()))?;

  let attachment = store
    .add_attachment(NewAttachment {
      incident_id: id,
      file_name:   body.file_name,
      file_path:   body.file_path,
      media_type:  body.media_type,
      uploaded_by: body.uploaded_by,
    })
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok((StatusCode::CREATED, Json(attachment)))
}
