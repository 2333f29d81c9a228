//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings, dates as `YYYY-MM-DD`, times
//! as `HH:MM:SS`. Link roles are stored as lowercase tags; unknown tags are
//! carried through rather than rejected.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use haven_core::{
  aggregate::{
    AttachmentView, IncidentDetail, IncidentSummary, LinkedStudent,
    NotificationView,
  },
  directory::{Attachment, Student},
  incident::{IncidentRecord, LinkRole, NotificationRecord, ReportId},
};

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── NaiveDate / NaiveTime ───────────────────────────────────────────────────

pub fn encode_date(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d")
    .map_err(|e| Error::DateParse(e.to_string()))
}

pub fn encode_time(t: NaiveTime) -> String { t.format("%H:%M:%S").to_string() }

pub fn decode_time(s: &str) -> Result<NaiveTime> {
  NaiveTime::parse_from_str(s, "%H:%M:%S")
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── LinkRole ────────────────────────────────────────────────────────────────

pub fn encode_link_role(role: &LinkRole) -> &str {
  match role {
    LinkRole::Involved => "involved",
    LinkRole::Primary => "primary",
    LinkRole::Other(tag) => tag,
  }
}

pub fn decode_link_role(s: &str) -> LinkRole {
  match s {
    "involved" => LinkRole::Involved,
    "primary" => LinkRole::Primary,
    other => LinkRole::Other(other.to_owned()),
  }
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw values read from an `incidents` row joined with its reference tables.
pub struct RawIncidentDetail {
  pub id:                 i64,
  pub category_id:        i64,
  pub location_id:        i64,
  pub incident_date:      String,
  pub incident_time:      String,
  pub details:            String,
  pub witness_id:         Option<i64>,
  pub actions_taken:      String,
  pub requires_follow_up: bool,
  pub is_confidential:    bool,
  pub urgent:             bool,
  pub created_by:         i64,
  pub status_id:          i64,
  pub created_at:         String,
  // joined display fields
  pub category_name:      String,
  pub location_name:      String,
  pub status_name:        String,
  pub witness_name:       Option<String>,
  pub created_by_name:    String,
}

impl RawIncidentDetail {
  pub fn into_detail(self) -> Result<IncidentDetail> {
    Ok(IncidentDetail {
      record:          IncidentRecord {
        id:                 ReportId(self.id),
        category_id:        self.category_id,
        location_id:        self.location_id,
        incident_date:      decode_date(&self.incident_date)?,
        incident_time:      decode_time(&self.incident_time)?,
        details:            self.details,
        witness_id:         self.witness_id,
        actions_taken:      self.actions_taken,
        requires_follow_up: self.requires_follow_up,
        is_confidential:    self.is_confidential,
        urgent:             self.urgent,
        created_by:         self.created_by,
        status_id:          self.status_id,
        created_at:         decode_dt(&self.created_at)?,
      },
      category_name:   self.category_name,
      location_name:   self.location_name,
      status_name:     self.status_name,
      witness_name:    self.witness_name,
      created_by_name: self.created_by_name,
    })
  }
}

/// Raw values from an `incident_students` row joined with `students`.
pub struct RawLinkedStudent {
  pub role:          String,
  pub id:            String,
  pub first_name:    String,
  pub last_name:     String,
  pub date_of_birth: Option<String>,
  pub year_group:    Option<String>,
}

impl RawLinkedStudent {
  pub fn into_linked(self) -> Result<LinkedStudent> {
    Ok(LinkedStudent {
      role:    decode_link_role(&self.role),
      student: Student {
        id:            self.id,
        first_name:    self.first_name,
        last_name:     self.last_name,
        date_of_birth: self.date_of_birth.as_deref().map(decode_date).transpose()?,
        year_group:    self.year_group,
      },
    })
  }
}

/// Raw values from an `attachments` row joined with the uploader.
pub struct RawAttachment {
  pub id:               i64,
  pub incident_id:      i64,
  pub file_name:        String,
  pub file_path:        String,
  pub media_type:       String,
  pub uploaded_by:      Option<i64>,
  pub uploaded_at:      String,
  pub uploaded_by_name: Option<String>,
}

impl RawAttachment {
  pub fn into_view(self) -> Result<AttachmentView> {
    Ok(AttachmentView {
      attachment:       Attachment {
        id:          self.id,
        incident_id: ReportId(self.incident_id),
        file_name:   self.file_name,
        file_path:   self.file_path,
        media_type:  self.media_type,
        uploaded_by: self.uploaded_by,
        uploaded_at: decode_dt(&self.uploaded_at)?,
      },
      uploaded_by_name: self.uploaded_by_name,
    })
  }
}

/// Raw values from a `notifications` row joined with the recipient.
pub struct RawNotification {
  pub incident_id: i64,
  pub user_id:     i64,
  pub user_name:   String,
  pub created_at:  String,
}

impl RawNotification {
  pub fn into_view(self) -> Result<NotificationView> {
    Ok(NotificationView {
      record:    NotificationRecord {
        incident_id: ReportId(self.incident_id),
        user_id:     self.user_id,
        created_at:  decode_dt(&self.created_at)?,
      },
      user_name: self.user_name,
    })
  }
}

/// Raw values for one row of the browse view.
pub struct RawSummary {
  pub id:            i64,
  pub incident_date: String,
  pub category_name: String,
  pub status_name:   String,
  pub urgent:        bool,
  pub created_at:    String,
}

impl RawSummary {
  pub fn into_summary(self) -> Result<IncidentSummary> {
    Ok(IncidentSummary {
      id:            ReportId(self.id),
      incident_date: decode_date(&self.incident_date)?,
      category_name: self.category_name,
      status_name:   self.status_name,
      urgent:        self.urgent,
      created_at:    decode_dt(&self.created_at)?,
    })
  }
}
