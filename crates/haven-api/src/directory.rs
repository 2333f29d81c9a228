//! Handlers for the directory endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/students` | Body: [`haven_core::directory::NewStudent`]; id generated if absent |
//! | `POST` | `/students/:id/contacts` | Body: [`ContactBody`] |
//! | `POST` | `/staff` | Body: [`haven_core::directory::NewStaff`] |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use haven_core::{
  directory::{NewEmergencyContact, NewStaff, NewStudent},
  store::IncidentStore,
};
use serde::Deserialize;

use crate::error::ApiError;

// ─── Students ─────────────────────────────────────────────────────────────────

/// `POST /students`
pub async fn create_student<S>(
  State(store): State<Arc<S>>,
  Json(body): Json<NewStudent>,
) -> Result<impl IntoResponse, ApiError>
where
  S: IncidentStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let student = store
    .add_student(body)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok((StatusCode::CREATED, Json(student)))
}

// ─── Emergency contacts ───────────────────────────────────────────────────────

/// JSON body accepted by `POST /students/:id/contacts`. The student comes
/// from the path.
#[derive(Debug, Deserialize)]
pub struct ContactBody {
  pub name:         String,
  pub relationship: Option<String>,
  pub phone:        String,
}

/// `POST /students/:id/contacts`
pub async fn add_contact<S>(
  State(store): State<Arc<S>>,
  Path(student_id): Path<String>,
  Json(body): Json<ContactBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: IncidentStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let contact = store
    .add_emergency_contact(NewEmergencyContact {
      student_id,
      name: body.name,
      relationship: body.relationship,
      phone: body.phone,
    })
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok((StatusCode::CREATED, Json(contact)))
}

// ─── Staff ────────────────────────────────────────────────────────────────────

/// `POST /staff`
pub async fn create_staff<S>(
  State(store): State<Arc<S>>,
  Json(body): Json<NewStaff>,
) -> Result<impl IntoResponse, ApiError>
where
  S: IncidentStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let staff = store
    .add_staff(body)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok((StatusCode::CREATED, Json(staff)))
}
