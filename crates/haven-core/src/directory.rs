//! Directory records the incident core joins against: students and their
//! emergency contacts, staff users, and attachment metadata.
//!
//! These are thin create-only surfaces. Attachment binaries and staff
//! identity live in external systems; only the rows referenced by reports
//! are kept here.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::incident::ReportId;

// ─── Students ────────────────────────────────────────────────────────────────

/// A student known to the service. The id is an external MIS reference
/// (text); when a caller registers a student without one, the store
/// generates an opaque id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Student {
  pub id:            String,
  pub first_name:    String,
  pub last_name:     String,
  pub date_of_birth: Option<NaiveDate>,
  pub year_group:    Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewStudent {
  pub id:            Option<String>,
  pub first_name:    String,
  pub last_name:     String,
  pub date_of_birth: Option<NaiveDate>,
  pub year_group:    Option<String>,
}

// ─── Emergency contacts ──────────────────────────────────────────────────────

/// An emergency contact for one student.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmergencyContact {
  pub id:           i64,
  pub student_id:   String,
  pub name:         String,
  pub relationship: Option<String>,
  pub phone:        String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewEmergencyContact {
  pub student_id:   String,
  pub name:         String,
  pub relationship: Option<String>,
  pub phone:        String,
}

// ─── Staff ───────────────────────────────────────────────────────────────────

/// A staff user as far as this core is concerned: an id to reference and a
/// name to display. Authentication happens elsewhere.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Staff {
  pub id:           i64,
  pub display_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewStaff {
  /// External identity-provider reference; assigned by the store when
  /// absent.
  pub id:           Option<i64>,
  pub display_name: String,
}

// ─── Attachments ─────────────────────────────────────────────────────────────

/// Attachment metadata for a report. The binary lives in file storage;
/// only its path is recorded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attachment {
  pub id:          i64,
  pub incident_id: ReportId,
  pub file_name:   String,
  pub file_path:   String,
  pub media_type:  String,
  pub uploaded_by: Option<i64>,
  pub uploaded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewAttachment {
  pub incident_id: ReportId,
  pub file_name:   String,
  pub file_path:   String,
  pub media_type:  String,
  pub uploaded_by: Option<i64>,
}
