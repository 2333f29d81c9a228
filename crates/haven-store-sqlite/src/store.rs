//! [`SqliteStore`] — the SQLite implementation of [`IncidentStore`].

use std::path::Path;

use chrono::Utc;
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use haven_core::{
  aggregate::{AggregateSection, IncidentAggregate, IncidentSummary},
  directory::{
    Attachment, EmergencyContact, NewAttachment, NewEmergencyContact,
    NewStaff, NewStudent, Staff, Student,
  },
  incident::{
    BodyMapMark, DEFAULT_BODY_VIEW, DEFAULT_CREATOR_ID, FALLBACK_CATEGORY_ID,
    FALLBACK_LOCATION_ID, INITIAL_STATUS_ID, LinkRole, NewIncident, ReportId,
    StudentLink, default_incident_time,
  },
  store::IncidentStore,
};

use crate::{
  Error, Result,
  encode::{
    RawAttachment, RawIncidentDetail, RawLinkedStudent, RawNotification,
    RawSummary, encode_date, encode_dt, encode_link_role, encode_time,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A haven incident store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted. All
/// database work is serialised onto the connection's worker thread; the
/// write transaction is the only atomicity guarantee offered.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Run arbitrary DDL against the live connection. Tests use this to break
  /// individual tables and observe the degraded-read behavior.
  #[cfg(test)]
  pub(crate) async fn execute_batch_raw(&self, sql: &'static str) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        conn.execute_batch(sql)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── Aggregate sub-reads ─────────────────────────────────────────────────────
//
// Each child section has its own query. They run outside any transaction;
// a failing section is degraded to empty by the caller rather than failing
// the whole read.

fn query_detail(
  conn: &rusqlite::Connection,
  id: i64,
) -> rusqlite::Result<Option<RawIncidentDetail>> {
  conn
    .query_row(
      "SELECT
         i.id, i.category_id, i.location_id, i.incident_date, i.incident_time,
         i.details, i.witness_id, i.actions_taken, i.requires_follow_up,
         i.is_confidential, i.urgent, i.created_by, i.status_id, i.created_at,
         c.name          AS category_name,
         l.name          AS location_name,
         st.name         AS status_name,
         w.display_name  AS witness_name,
         cb.display_name AS created_by_name
       FROM incidents i
       JOIN categories c  ON c.id  = i.category_id
       JOIN locations  l  ON l.id  = i.location_id
       JOIN statuses   st ON st.id = i.status_id
       LEFT JOIN staff w  ON w.id  = i.witness_id
       JOIN staff cb      ON cb.id = i.created_by
       WHERE i.id = ?1",
      rusqlite::params![id],
      |row| {
        Ok(RawIncidentDetail {
          id:                 row.get(0)?,
          category_id:        row.get(1)?,
          location_id:        row.get(2)?,
          incident_date:      row.get(3)?,
          incident_time:      row.get(4)?,
          details:            row.get(5)?,
          witness_id:         row.get(6)?,
          actions_taken:      row.get(7)?,
          requires_follow_up: row.get(8)?,
          is_confidential:    row.get(9)?,
          urgent:             row.get(10)?,
          created_by:         row.get(11)?,
          status_id:          row.get(12)?,
          created_at:         row.get(13)?,
          category_name:      row.get(14)?,
          location_name:      row.get(15)?,
          status_name:        row.get(16)?,
          witness_name:       row.get(17)?,
          created_by_name:    row.get(18)?,
        })
      },
    )
    .optional()
}

fn query_students(
  conn: &rusqlite::Connection,
  id: i64,
) -> rusqlite::Result<Vec<RawLinkedStudent>> {
  let mut stmt = conn.prepare(
    "SELECT ls.role, s.id, s.first_name, s.last_name, s.date_of_birth,
            s.year_group
     FROM incident_students ls
     JOIN students s ON s.id = ls.student_id
     WHERE ls.incident_id = ?1
     ORDER BY ls.rowid",
  )?;
  stmt
    .query_map(rusqlite::params![id], |row| {
      Ok(RawLinkedStudent {
        role:          row.get(0)?,
        id:            row.get(1)?,
        first_name:    row.get(2)?,
        last_name:     row.get(3)?,
        date_of_birth: row.get(4)?,
        year_group:    row.get(5)?,
      })
    })?
    .collect()
}

fn query_contacts(
  conn: &rusqlite::Connection,
  student_ids: &[String],
) -> rusqlite::Result<Vec<EmergencyContact>> {
  let placeholders =
    std::iter::repeat("?").take(student_ids.len()).collect::<Vec<_>>().join(",");
  let sql = format!(
    "SELECT id, student_id, name, relationship, phone
     FROM emergency_contacts
     WHERE student_id IN ({placeholders})
     ORDER BY id"
  );
  let mut stmt = conn.prepare(&sql)?;
  stmt
    .query_map(rusqlite::params_from_iter(student_ids.iter()), |row| {
      Ok(EmergencyContact {
        id:           row.get(0)?,
        student_id:   row.get(1)?,
        name:         row.get(2)?,
        relationship: row.get(3)?,
        phone:        row.get(4)?,
      })
    })?
    .collect()
}

fn query_attachments(
  conn: &rusqlite::Connection,
  id: i64,
) -> rusqlite::Result<Vec<RawAttachment>> {
  let mut stmt = conn.prepare(
    "SELECT a.id, a.incident_id, a.file_name, a.file_path, a.media_type,
            a.uploaded_by, a.uploaded_at, u.display_name
     FROM attachments a
     LEFT JOIN staff u ON u.id = a.uploaded_by
     WHERE a.incident_id = ?1
     ORDER BY a.id",
  )?;
  stmt
    .query_map(rusqlite::params![id], |row| {
      Ok(RawAttachment {
        id:               row.get(0)?,
        incident_id:      row.get(1)?,
        file_name:        row.get(2)?,
        file_path:        row.get(3)?,
        media_type:       row.get(4)?,
        uploaded_by:      row.get(5)?,
        uploaded_at:      row.get(6)?,
        uploaded_by_name: row.get(7)?,
      })
    })?
    .collect()
}

fn query_body_map(
  conn: &rusqlite::Connection,
  id: i64,
) -> rusqlite::Result<Vec<BodyMapMark>> {
  let mut stmt = conn.prepare(
    "SELECT id, incident_id, view, x, y, note
     FROM body_map_marks
     WHERE incident_id = ?1
     ORDER BY id",
  )?;
  stmt
    .query_map(rusqlite::params![id], |row| {
      Ok(BodyMapMark {
        id:          row.get(0)?,
        incident_id: ReportId(row.get(1)?),
        view:        row.get(2)?,
        x:           row.get(3)?,
        y:           row.get(4)?,
        note:        row.get(5)?,
      })
    })?
    .collect()
}

fn query_notifications(
  conn: &rusqlite::Connection,
  id: i64,
) -> rusqlite::Result<Vec<RawNotification>> {
  let mut stmt = conn.prepare(
    "SELECT n.incident_id, n.user_id, u.display_name, n.created_at
     FROM notifications n
     JOIN staff u ON u.id = n.user_id
     WHERE n.incident_id = ?1
     ORDER BY n.rowid",
  )?;
  stmt
    .query_map(rusqlite::params![id], |row| {
      Ok(RawNotification {
        incident_id: row.get(0)?,
        user_id:     row.get(1)?,
        user_name:   row.get(2)?,
        created_at:  row.get(3)?,
      })
    })?
    .collect()
}

/// Run one child-section query; on failure log, mark the section degraded,
/// and fall back to an empty collection.
fn best_effort<T>(
  section: AggregateSection,
  degraded: &mut Vec<AggregateSection>,
  result: rusqlite::Result<Vec<T>>,
) -> Vec<T> {
  match result {
    Ok(rows) => rows,
    Err(e) => {
      tracing::warn!(?section, error = %e, "aggregate sub-read failed, returning empty section");
      degraded.push(section);
      Vec::new()
    }
  }
}

/// Everything the aggregate read pulls out of the database, before decoding.
struct RawAggregate {
  detail:        RawIncidentDetail,
  students:      Vec<RawLinkedStudent>,
  contacts:      Vec<EmergencyContact>,
  attachments:   Vec<RawAttachment>,
  body_map:      Vec<BodyMapMark>,
  notifications: Vec<RawNotification>,
  degraded:      Vec<AggregateSection>,
}

// ─── IncidentStore impl ──────────────────────────────────────────────────────

impl IncidentStore for SqliteStore {
  type Error = Error;

  // ── Incident write path ───────────────────────────────────────────────────

  async fn create_incident(&self, input: NewIncident) -> Result<ReportId> {
    // Fallback substitution happens here, unconditionally; no field is
    // rejected as missing.
    let now = Utc::now();
    let id = input.id.map(|r| r.0);
    let category_id = input.category_id.unwrap_or(FALLBACK_CATEGORY_ID);
    let location_id = input.location_id.unwrap_or(FALLBACK_LOCATION_ID);
    let date_str = encode_date(input.incident_date.unwrap_or_else(|| now.date_naive()));
    let time_str = encode_time(input.incident_time.unwrap_or_else(default_incident_time));
    let details = input.details.unwrap_or_default();
    let witness_id = input.witness_id;
    let actions_taken = input.actions_taken.unwrap_or_default();
    let requires_follow_up = input.requires_follow_up;
    let is_confidential = input.is_confidential;
    let urgent = input.urgent;
    let created_by = input.created_by.unwrap_or(DEFAULT_CREATOR_ID);
    let created_at_str = encode_dt(now);

    let student_id = input.student_id;
    let primary_student = input.primary_student;
    let linked_students = input.linked_students;
    let body_map_markers = input.body_map_markers;
    let notify_staff = input.notify_staff;

    let report_id = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        tx.execute(
          "INSERT INTO incidents (
             id, category_id, location_id, incident_date, incident_time,
             details, witness_id, actions_taken, requires_follow_up,
             is_confidential, urgent, created_by, status_id, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
          rusqlite::params![
            id,
            category_id,
            location_id,
            date_str,
            time_str,
            details,
            witness_id,
            actions_taken,
            requires_follow_up,
            is_confidential,
            urgent,
            created_by,
            INITIAL_STATUS_ID,
            created_at_str,
          ],
        )?;
        let report_id = match id {
          Some(v) => v,
          None => tx.last_insert_rowid(),
        };

        // The top-level student link is unconditional and written in
        // addition to any `primary` link for the same student; a student
        // named by both fields ends up with two rows.
        let mut links = Vec::with_capacity(2 + linked_students.len());
        links.push(StudentLink {
          incident_id: ReportId(report_id),
          student_id,
          role: LinkRole::Involved,
        });
        if let Some(primary) = primary_student {
          links.push(StudentLink {
            incident_id: ReportId(report_id),
            student_id:  primary,
            role:        LinkRole::Primary,
          });
        }
        for linked in linked_students {
          links.push(StudentLink {
            incident_id: ReportId(report_id),
            student_id:  linked,
            role:        LinkRole::Involved,
          });
        }

        for link in &links {
          tx.execute(
            "INSERT INTO incident_students (incident_id, student_id, role)
             VALUES (?1, ?2, ?3)",
            rusqlite::params![
              link.incident_id.0,
              link.student_id,
              encode_link_role(&link.role)
            ],
          )?;
        }

        for mark in &body_map_markers {
          tx.execute(
            "INSERT INTO body_map_marks (incident_id, view, x, y, note)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            rusqlite::params![
              report_id,
              mark.view.as_deref().unwrap_or(DEFAULT_BODY_VIEW),
              mark.x,
              mark.y,
              mark.note.as_deref().unwrap_or(""),
            ],
          )?;
        }

        for user_id in &notify_staff {
          tx.execute(
            "INSERT INTO notifications (incident_id, user_id, created_at)
             VALUES (?1, ?2, ?3)",
            rusqlite::params![report_id, user_id, created_at_str],
          )?;
        }

        // Dropping `tx` without reaching this point rolls everything back,
        // the incident row included.
        tx.commit()?;
        Ok(report_id)
      })
      .await?;

    tracing::debug!(report_id, "incident report created");
    Ok(ReportId(report_id))
  }

  // ── Incident reads ────────────────────────────────────────────────────────

  async fn get_incident(&self, id: ReportId) -> Result<Option<IncidentAggregate>> {
    let id_val = id.0;

    let raw: Option<RawAggregate> = self
      .conn
      .call(move |conn| {
        let Some(detail) = query_detail(conn, id_val)? else {
          return Ok(None);
        };

        let mut degraded = Vec::new();

        let students = best_effort(
          AggregateSection::Students,
          &mut degraded,
          query_students(conn, id_val),
        );

        let student_ids: Vec<String> =
          students.iter().map(|s| s.id.clone()).collect();
        let contacts = if student_ids.is_empty() {
          Vec::new()
        } else {
          best_effort(
            AggregateSection::EmergencyContacts,
            &mut degraded,
            query_contacts(conn, &student_ids),
          )
        };

        let attachments = best_effort(
          AggregateSection::Attachments,
          &mut degraded,
          query_attachments(conn, id_val),
        );
        let body_map = best_effort(
          AggregateSection::BodyMap,
          &mut degraded,
          query_body_map(conn, id_val),
        );
        let notifications = best_effort(
          AggregateSection::Notifications,
          &mut degraded,
          query_notifications(conn, id_val),
        );

        Ok(Some(RawAggregate {
          detail,
          students,
          contacts,
          attachments,
          body_map,
          notifications,
          degraded,
        }))
      })
      .await?;

    let Some(raw) = raw else { return Ok(None) };

    Ok(Some(IncidentAggregate {
      incident:           raw.detail.into_detail()?,
      students:           raw
        .students
        .into_iter()
        .map(RawLinkedStudent::into_linked)
        .collect::<Result<_>>()?,
      emergency_contacts: raw.contacts,
      attachments:        raw
        .attachments
        .into_iter()
        .map(RawAttachment::into_view)
        .collect::<Result<_>>()?,
      body_map:           raw.body_map,
      notifications:      raw
        .notifications
        .into_iter()
        .map(RawNotification::into_view)
        .collect::<Result<_>>()?,
      degraded:           raw.degraded,
    }))
  }

  async fn list_incidents(&self) -> Result<Vec<IncidentSummary>> {
    let raws: Vec<RawSummary> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT i.id, i.incident_date, c.name, st.name, i.urgent,
                  i.created_at
           FROM incidents i
           JOIN categories c ON c.id  = i.category_id
           JOIN statuses  st ON st.id = i.status_id
           ORDER BY i.incident_date DESC, i.id DESC",
        )?;
        let rows = stmt
          .query_map([], |row| {
            Ok(RawSummary {
              id:            row.get(0)?,
              incident_date: row.get(1)?,
              category_name: row.get(2)?,
              status_name:   row.get(3)?,
              urgent:        row.get(4)?,
              created_at:    row.get(5)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawSummary::into_summary).collect()
  }

  // ── Directory writes ──────────────────────────────────────────────────────

  async fn add_student(&self, input: NewStudent) -> Result<Student> {
    let student = Student {
      id:            input
        .id
        .unwrap_or_else(|| Uuid::new_v4().hyphenated().to_string()),
      first_name:    input.first_name,
      last_name:     input.last_name,
      date_of_birth: input.date_of_birth,
      year_group:    input.year_group,
    };

    let id = student.id.clone();
    let first_name = student.first_name.clone();
    let last_name = student.last_name.clone();
    let dob_str = student.date_of_birth.map(encode_date);
    let year_group = student.year_group.clone();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO students (id, first_name, last_name, date_of_birth, year_group)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![id, first_name, last_name, dob_str, year_group],
        )?;
        Ok(())
      })
      .await?;

    Ok(student)
  }

  async fn add_staff(&self, input: NewStaff) -> Result<Staff> {
    let id = input.id;
    let display_name = input.display_name.clone();

    let assigned = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO staff (id, display_name) VALUES (?1, ?2)",
          rusqlite::params![id, display_name],
        )?;
        Ok(match id {
          Some(v) => v,
          None => conn.last_insert_rowid(),
        })
      })
      .await?;

    Ok(Staff {
      id:           assigned,
      display_name: input.display_name,
    })
  }

  async fn add_emergency_contact(
    &self,
    input: NewEmergencyContact,
  ) -> Result<EmergencyContact> {
    let student_id = input.student_id.clone();
    let name = input.name.clone();
    let relationship = input.relationship.clone();
    let phone = input.phone.clone();

    let assigned = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO emergency_contacts (student_id, name, relationship, phone)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![student_id, name, relationship, phone],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;

    Ok(EmergencyContact {
      id:           assigned,
      student_id:   input.student_id,
      name:         input.name,
      relationship: input.relationship,
      phone:        input.phone,
    })
  }

  async fn add_attachment(&self, input: NewAttachment) -> Result<Attachment> {
    let uploaded_at = Utc::now();

    let incident_id = input.incident_id.0;
    let file_name = input.file_name.clone();
    let file_path = input.file_path.clone();
    let media_type = input.media_type.clone();
    let uploaded_by = input.uploaded_by;
    let uploaded_at_str = encode_dt(uploaded_at);

    let assigned = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO attachments (
             incident_id, file_name, file_path, media_type, uploaded_by,
             uploaded_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![
            incident_id,
            file_name,
            file_path,
            media_type,
            uploaded_by,
            uploaded_at_str,
          ],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;

    Ok(Attachment {
      id:          assigned,
      incident_id: input.incident_id,
      file_name:   input.file_name,
      file_path:   input.file_path,
      media_type:  input.media_type,
      uploaded_by: input.uploaded_by,
      uploaded_at,
    })
  }
}
