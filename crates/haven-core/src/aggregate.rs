//! The composed read model for an incident — never stored, always derived.
//!
//! An aggregate is reassembled from scratch on every read. Child sections
//! are best-effort: a section whose query fails is returned empty and named
//! in [`IncidentAggregate::degraded`] instead of failing the whole read.
//! Only the incident row itself is critical.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
  directory::{Attachment, EmergencyContact, Student},
  incident::{
    BodyMapMark, IncidentRecord, LinkRole, NotificationRecord, ReportId,
  },
};

// ─── Joined display rows ─────────────────────────────────────────────────────

/// The incident row joined with its reference-table display names.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncidentDetail {
  #[serde(flatten)]
  pub record:          IncidentRecord,
  pub category_name:   String,
  pub location_name:   String,
  pub status_name:     String,
  pub witness_name:    Option<String>,
  pub created_by_name: String,
}

/// A linked student with the role the link carries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkedStudent {
  pub role:    LinkRole,
  pub student: Student,
}

/// An attachment row joined with the uploader's display name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttachmentView {
  pub attachment:       Attachment,
  pub uploaded_by_name: Option<String>,
}

/// A notification row joined with the recipient's display name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationView {
  #[serde(flatten)]
  pub record:    NotificationRecord,
  pub user_name: String,
}

// ─── Aggregate ───────────────────────────────────────────────────────────────

/// A child section of the aggregate, named in `degraded` when its query
/// could not be run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregateSection {
  Students,
  EmergencyContacts,
  Attachments,
  BodyMap,
  Notifications,
}

/// Everything known about one incident, composed at query time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncidentAggregate {
  pub incident:           IncidentDetail,
  pub students:           Vec<LinkedStudent>,
  pub emergency_contacts: Vec<EmergencyContact>,
  pub attachments:        Vec<AttachmentView>,
  pub body_map:           Vec<BodyMapMark>,
  pub notifications:      Vec<NotificationView>,
  /// Sections whose query failed and came back empty.
  pub degraded:           Vec<AggregateSection>,
}

/// One row of the browse view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncidentSummary {
  pub id:            ReportId,
  pub incident_date: chrono::NaiveDate,
  pub category_name: String,
  pub status_name:   String,
  pub urgent:        bool,
  pub created_at:    DateTime<Utc>,
}
