//! Incident report types — the write side of the store.
//!
//! An incident report and its child rows (student links, body-map marks,
//! staff notifications) are created together in one transaction and never
//! updated or deleted afterwards. Missing optional fields are replaced with
//! the documented fallbacks at insert time; no field is rejected as missing.

use std::{fmt, str::FromStr};

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::Error;

// ─── Report identifier ───────────────────────────────────────────────────────

/// Identifier of an incident report.
///
/// Accepted from callers as either a JSON number or a decimal string
/// (clients send both). Always serialised back as a number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ReportId(pub i64);

impl fmt::Display for ReportId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { self.0.fmt(f) }
}

impl FromStr for ReportId {
  type Err = Error;

  /// Parse a non-empty decimal string. Anything else is rejected before any
  /// datastore access is attempted.
  fn from_str(s: &str) -> Result<Self, Error> {
    let trimmed = s.trim();
    if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
      return Err(Error::InvalidReportId(s.to_owned()));
    }
    trimmed
      .parse::<i64>()
      .map(ReportId)
      .map_err(|_| Error::InvalidReportId(s.to_owned()))
  }
}

impl<'de> Deserialize<'de> for ReportId {
  fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
  where
    D: Deserializer<'de>,
  {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
      Number(i64),
      Text(String),
    }

    match Raw::deserialize(deserializer)? {
      Raw::Number(n) => Ok(ReportId(n)),
      Raw::Text(s) => s.parse().map_err(serde::de::Error::custom),
    }
  }
}

// ─── Insert-time fallbacks ───────────────────────────────────────────────────

/// Category used when the caller supplies none.
pub const FALLBACK_CATEGORY_ID: i64 = 1;
/// Location used when the caller supplies none.
pub const FALLBACK_LOCATION_ID: i64 = 1;
/// Recording user used when the caller supplies none.
pub const DEFAULT_CREATOR_ID: i64 = 1;
/// Every new report starts in this status.
pub const INITIAL_STATUS_ID: i64 = 1;
/// Body-map view used when a marker carries none.
pub const DEFAULT_BODY_VIEW: &str = "front";

/// Incident time used when the caller supplies none.
pub fn default_incident_time() -> NaiveTime {
  NaiveTime::from_hms_opt(12, 0, 0).unwrap()
}

// ─── Write input ─────────────────────────────────────────────────────────────

/// Input for creating an incident report together with all of its children.
///
/// Every field except `student_id` is optional; `student_id` is the one
/// student link that is always written (role `involved`).
#[derive(Debug, Clone)]
pub struct NewIncident {
  /// Pre-allocated report identifier. When absent the store assigns the
  /// next one and returns it.
  pub id:                 Option<ReportId>,
  /// Always linked with role `involved`, independently of `primary_student`.
  pub student_id:         String,
  pub category_id:        Option<i64>,
  pub location_id:        Option<i64>,
  pub incident_date:      Option<NaiveDate>,
  pub incident_time:      Option<NaiveTime>,
  pub details:            Option<String>,
  pub witness_id:         Option<i64>,
  pub actions_taken:      Option<String>,
  pub requires_follow_up: bool,
  pub is_confidential:    bool,
  pub urgent:             bool,
  pub created_by:         Option<i64>,
  /// Linked with role `primary`, in addition to the `student_id` link —
  /// the same student may end up with both roles.
  pub primary_student:    Option<String>,
  /// Each linked with role `involved`.
  pub linked_students:    Vec<String>,
  pub body_map_markers:   Vec<NewBodyMapMark>,
  /// Staff user ids to fan a notification row out to.
  pub notify_staff:       Vec<i64>,
}

impl NewIncident {
  /// An input carrying only the unconditional student link; everything else
  /// takes its insert-time fallback.
  pub fn new(student_id: impl Into<String>) -> Self {
    Self {
      id:                 None,
      student_id:         student_id.into(),
      category_id:        None,
      location_id:        None,
      incident_date:      None,
      incident_time:      None,
      details:            None,
      witness_id:         None,
      actions_taken:      None,
      requires_follow_up: false,
      is_confidential:    false,
      urgent:             false,
      created_by:         None,
      primary_student:    None,
      linked_students:    Vec::new(),
      body_map_markers:   Vec::new(),
      notify_staff:       Vec::new(),
    }
  }
}

/// A body-map annotation as supplied by the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewBodyMapMark {
  /// Which silhouette the mark sits on; defaults to `front`.
  pub view: Option<String>,
  /// Percentage of image width.
  pub x:    f64,
  /// Percentage of image height.
  pub y:    f64,
  pub note: Option<String>,
}

// ─── Persisted rows ──────────────────────────────────────────────────────────

/// The incident row as persisted, with all fallbacks applied.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncidentRecord {
  pub id:                 ReportId,
  pub category_id:        i64,
  pub location_id:        i64,
  pub incident_date:      NaiveDate,
  pub incident_time:      NaiveTime,
  pub details:            String,
  pub witness_id:         Option<i64>,
  pub actions_taken:      String,
  pub requires_follow_up: bool,
  pub is_confidential:    bool,
  pub urgent:             bool,
  pub created_by:         i64,
  pub status_id:          i64,
  pub created_at:         DateTime<Utc>,
}

/// The role a student plays on a report. A small open set — unknown tags
/// from older data are carried through rather than rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkRole {
  Involved,
  Primary,
  Other(String),
}

/// One student linked to one report with one role. Reports may carry
/// several rows per student; there is no uniqueness constraint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudentLink {
  pub incident_id: ReportId,
  pub student_id:  String,
  pub role:        LinkRole,
}

/// A persisted body-map annotation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BodyMapMark {
  pub id:          i64,
  pub incident_id: ReportId,
  pub view:        String,
  pub x:           f64,
  pub y:           f64,
  pub note:        String,
}

/// A staff notification fan-out row. Carries no payload beyond the link;
/// read/viewed state lives outside this core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationRecord {
  pub incident_id: ReportId,
  pub user_id:     i64,
  pub created_at:  DateTime<Utc>,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn report_id_parses_plain_decimals_only() {
    assert_eq!("42".parse::<ReportId>().unwrap(), ReportId(42));
    assert_eq!(" 7 ".parse::<ReportId>().unwrap(), ReportId(7));
    assert!("".parse::<ReportId>().is_err());
    assert!("abc".parse::<ReportId>().is_err());
    assert!("12abc".parse::<ReportId>().is_err());
    assert!("-3".parse::<ReportId>().is_err());
  }

  #[test]
  fn report_id_deserialises_from_number_or_string() {
    let n: ReportId = serde_json::from_str("42").unwrap();
    let s: ReportId = serde_json::from_str("\"42\"").unwrap();
    assert_eq!(n, s);
    assert!(serde_json::from_str::<ReportId>("\"nope\"").is_err());
  }
}
