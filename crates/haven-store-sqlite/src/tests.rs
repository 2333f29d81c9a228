//! Integration tests for `SqliteStore` against an in-memory database.

use chrono::{NaiveDate, NaiveTime, Utc};
use haven_core::{
  aggregate::AggregateSection,
  directory::{NewAttachment, NewEmergencyContact, NewStaff, NewStudent},
  incident::{LinkRole, NewIncident, ReportId},
  store::IncidentStore,
};

use crate::SqliteStore;

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

async fn add_student(s: &SqliteStore, id: &str, first: &str, last: &str) {
  s.add_student(NewStudent {
    id:            Some(id.into()),
    first_name:    first.into(),
    last_name:     last.into(),
    date_of_birth: None,
    year_group:    None,
  })
  .await
  .unwrap();
}

async fn add_staff(s: &SqliteStore, id: i64, name: &str) {
  s.add_staff(NewStaff {
    id:           Some(id),
    display_name: name.into(),
  })
  .await
  .unwrap();
}

// ─── Defaults ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn minimal_input_takes_all_fallbacks() {
  let s = store().await;
  add_student(&s, "S1", "Alice", "Liddell").await;

  let id = s.create_incident(NewIncident::new("S1")).await.unwrap();
  let agg = s.get_incident(id).await.unwrap().unwrap();
  let rec = &agg.incident.record;

  assert_eq!(rec.category_id, 1);
  assert_eq!(rec.location_id, 1);
  assert_eq!(rec.status_id, 1);
  assert_eq!(rec.created_by, 1);
  assert_eq!(rec.incident_date, Utc::now().date_naive());
  assert_eq!(rec.incident_time, NaiveTime::from_hms_opt(12, 0, 0).unwrap());
  assert_eq!(rec.details, "");
  assert_eq!(rec.actions_taken, "");
  assert!(rec.witness_id.is_none());
  assert!(!rec.requires_follow_up);
  assert!(!rec.is_confidential);
  assert!(!rec.urgent);

  // Joined display fields come from the seeded fallback rows.
  assert_eq!(agg.incident.category_name, "Uncategorised");
  assert_eq!(agg.incident.location_name, "Unspecified");
  assert_eq!(agg.incident.status_name, "Open");
  assert_eq!(agg.incident.created_by_name, "System");
  assert!(agg.incident.witness_name.is_none());
}

// ─── Report identifiers ──────────────────────────────────────────────────────

#[tokio::test]
async fn caller_supplied_id_is_used_verbatim() {
  let s = store().await;
  add_student(&s, "S1", "Alice", "Liddell").await;

  let mut input = NewIncident::new("S1");
  input.id = Some(ReportId(42));

  let id = s.create_incident(input).await.unwrap();
  assert_eq!(id, ReportId(42));
  assert!(s.get_incident(ReportId(42)).await.unwrap().is_some());
}

#[tokio::test]
async fn store_assigns_id_when_absent() {
  let s = store().await;
  add_student(&s, "S1", "Alice", "Liddell").await;

  let id = s.create_incident(NewIncident::new("S1")).await.unwrap();
  assert!(s.get_incident(id).await.unwrap().is_some());
}

// ─── Student links ───────────────────────────────────────────────────────────

#[tokio::test]
async fn primary_student_is_linked_in_addition_to_involved() {
  let s = store().await;
  add_student(&s, "S1", "Alice", "Liddell").await;

  let mut input = NewIncident::new("S1");
  input.primary_student = Some("S1".into());

  let id = s.create_incident(input).await.unwrap();
  let agg = s.get_incident(id).await.unwrap().unwrap();

  // Two rows for the same student, one per role.
  assert_eq!(agg.students.len(), 2);
  assert!(agg.students.iter().all(|ls| ls.student.id == "S1"));
  assert_eq!(agg.students[0].role, LinkRole::Involved);
  assert_eq!(agg.students[1].role, LinkRole::Primary);
}

#[tokio::test]
async fn linked_students_all_get_involved_role() {
  let s = store().await;
  add_student(&s, "S1", "Alice", "Liddell").await;
  add_student(&s, "S2", "Bob", "Crane").await;
  add_student(&s, "S3", "Cara", "Doyle").await;

  let mut input = NewIncident::new("S1");
  input.linked_students = vec!["S2".into(), "S3".into()];

  let id = s.create_incident(input).await.unwrap();
  let agg = s.get_incident(id).await.unwrap().unwrap();

  assert_eq!(agg.students.len(), 3);
  assert!(agg.students.iter().all(|ls| ls.role == LinkRole::Involved));
  let ids: Vec<&str> =
    agg.students.iter().map(|ls| ls.student.id.as_str()).collect();
  assert_eq!(ids, ["S1", "S2", "S3"]);
}

#[tokio::test]
async fn empty_collections_insert_no_child_rows() {
  let s = store().await;
  add_student(&s, "S1", "Alice", "Liddell").await;

  let mut input = NewIncident::new("S1");
  input.primary_student = Some("S1".into());

  let id = s.create_incident(input).await.unwrap();
  let agg = s.get_incident(id).await.unwrap().unwrap();

  assert_eq!(agg.students.len(), 2);
  assert!(agg.body_map.is_empty());
  assert!(agg.notifications.is_empty());
  assert!(agg.attachments.is_empty());
  assert!(agg.emergency_contacts.is_empty());
}

// ─── Atomicity ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn failed_notification_insert_rolls_back_the_report() {
  let s = store().await;
  add_student(&s, "S1", "Alice", "Liddell").await;

  let mut input = NewIncident::new("S1");
  input.id = Some(ReportId(7));
  input.body_map_markers = vec![haven_core::incident::NewBodyMapMark {
    view: None,
    x:    5.0,
    y:    5.0,
    note: None,
  }];
  // The notification fan-out is the last insert step; an unknown staff id
  // violates its foreign key after every earlier insert has succeeded.
  input.notify_staff = vec![999];

  assert!(s.create_incident(input).await.is_err());
  assert!(s.get_incident(ReportId(7)).await.unwrap().is_none());
}

#[tokio::test]
async fn unknown_student_rolls_back_the_report() {
  let s = store().await;

  let mut input = NewIncident::new("nobody");
  input.id = Some(ReportId(8));

  assert!(s.create_incident(input).await.is_err());
  assert!(s.get_incident(ReportId(8)).await.unwrap().is_none());
}

// ─── The full write path ─────────────────────────────────────────────────────

#[tokio::test]
async fn full_report_round_trip() {
  let s = store().await;
  add_student(&s, "S1", "Alice", "Liddell").await;
  add_student(&s, "S2", "Bob", "Crane").await;
  add_staff(&s, 7, "Dana Priest").await;

  let mut input = NewIncident::new("S1");
  input.id = Some(ReportId(42));
  input.primary_student = Some("S1".into());
  input.linked_students = vec!["S2".into()];
  input.body_map_markers = vec![haven_core::incident::NewBodyMapMark {
    view: None,
    x:    10.0,
    y:    20.0,
    note: Some("bruise".into()),
  }];
  input.notify_staff = vec![7];

  let id = s.create_incident(input).await.unwrap();
  assert_eq!(id, ReportId(42));

  // A read after commit sees the full aggregate; nothing is cached or
  // deferred.
  let agg = s.get_incident(id).await.unwrap().unwrap();

  assert_eq!(agg.incident.record.id, ReportId(42));

  let links: Vec<(&str, &LinkRole)> = agg
    .students
    .iter()
    .map(|ls| (ls.student.id.as_str(), &ls.role))
    .collect();
  assert_eq!(links, [
    ("S1", &LinkRole::Involved),
    ("S1", &LinkRole::Primary),
    ("S2", &LinkRole::Involved),
  ]);

  assert_eq!(agg.body_map.len(), 1);
  assert_eq!(agg.body_map[0].view, "front");
  assert_eq!(agg.body_map[0].x, 10.0);
  assert_eq!(agg.body_map[0].y, 20.0);
  assert_eq!(agg.body_map[0].note, "bruise");

  assert_eq!(agg.notifications.len(), 1);
  assert_eq!(agg.notifications[0].record.incident_id, ReportId(42));
  assert_eq!(agg.notifications[0].record.user_id, 7);
  assert_eq!(agg.notifications[0].user_name, "Dana Priest");

  assert!(agg.degraded.is_empty());
}

// ─── Aggregate reads ─────────────────────────────────────────────────────────

#[tokio::test]
async fn unknown_report_returns_none() {
  let s = store().await;
  assert!(s.get_incident(ReportId(12345)).await.unwrap().is_none());
}

#[tokio::test]
async fn emergency_contacts_cover_every_linked_student() {
  let s = store().await;
  add_student(&s, "S1", "Alice", "Liddell").await;
  add_student(&s, "S2", "Bob", "Crane").await;
  add_student(&s, "S3", "Cara", "Doyle").await;

  for (student, name) in [("S1", "Mrs Liddell"), ("S2", "Mr Crane"), ("S3", "Mr Doyle")] {
    s.add_emergency_contact(NewEmergencyContact {
      student_id:   student.into(),
      name:         name.into(),
      relationship: Some("parent".into()),
      phone:        "01632 960000".into(),
    })
    .await
    .unwrap();
  }

  let mut input = NewIncident::new("S1");
  input.linked_students = vec!["S2".into()];
  let id = s.create_incident(input).await.unwrap();

  let agg = s.get_incident(id).await.unwrap().unwrap();

  // Contacts for the linked students only; S3 is not on this report.
  let names: Vec<&str> =
    agg.emergency_contacts.iter().map(|c| c.name.as_str()).collect();
  assert_eq!(names, ["Mrs Liddell", "Mr Crane"]);
}

#[tokio::test]
async fn attachments_appear_with_uploader_name() {
  let s = store().await;
  add_student(&s, "S1", "Alice", "Liddell").await;
  add_staff(&s, 3, "Evan Frost").await;

  let id = s.create_incident(NewIncident::new("S1")).await.unwrap();
  s.add_attachment(NewAttachment {
    incident_id: id,
    file_name:   "photo.jpg".into(),
    file_path:   "uploads/photo.jpg".into(),
    media_type:  "image/jpeg".into(),
    uploaded_by: Some(3),
  })
  .await
  .unwrap();

  let agg = s.get_incident(id).await.unwrap().unwrap();
  assert_eq!(agg.attachments.len(), 1);
  assert_eq!(agg.attachments[0].attachment.file_name, "photo.jpg");
  assert_eq!(
    agg.attachments[0].uploaded_by_name.as_deref(),
    Some("Evan Frost")
  );
}

// ─── Degraded sections ───────────────────────────────────────────────────────

#[tokio::test]
async fn missing_contacts_table_degrades_that_section_only() {
  let s = store().await;
  add_student(&s, "S1", "Alice", "Liddell").await;
  let id = s.create_incident(NewIncident::new("S1")).await.unwrap();

  s.execute_batch_raw("DROP TABLE emergency_contacts")
    .await
    .unwrap();

  let agg = s.get_incident(id).await.unwrap().unwrap();
  assert!(agg.emergency_contacts.is_empty());
  assert_eq!(agg.degraded, [AggregateSection::EmergencyContacts]);
  // Everything else is intact.
  assert_eq!(agg.students.len(), 1);
}

#[tokio::test]
async fn missing_notifications_table_degrades_that_section_only() {
  let s = store().await;
  add_student(&s, "S1", "Alice", "Liddell").await;
  let id = s.create_incident(NewIncident::new("S1")).await.unwrap();

  s.execute_batch_raw("DROP TABLE notifications").await.unwrap();

  let agg = s.get_incident(id).await.unwrap().unwrap();
  assert!(agg.notifications.is_empty());
  assert_eq!(agg.degraded, [AggregateSection::Notifications]);
  assert_eq!(agg.students.len(), 1);
}

// ─── Browse view ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn list_orders_by_incident_date_newest_first() {
  let s = store().await;
  add_student(&s, "S1", "Alice", "Liddell").await;

  let mut older = NewIncident::new("S1");
  older.incident_date = NaiveDate::from_ymd_opt(2026, 3, 1);
  let mut newer = NewIncident::new("S1");
  newer.incident_date = NaiveDate::from_ymd_opt(2026, 3, 5);
  newer.urgent = true;

  let older_id = s.create_incident(older).await.unwrap();
  let newer_id = s.create_incident(newer).await.unwrap();

  let all = s.list_incidents().await.unwrap();
  assert_eq!(all.len(), 2);
  assert_eq!(all[0].id, newer_id);
  assert_eq!(all[1].id, older_id);
  assert!(all[0].urgent);
  assert_eq!(all[0].category_name, "Uncategorised");
  assert_eq!(all[0].status_name, "Open");
}

// ─── Directory ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn add_student_generates_id_when_missing() {
  let s = store().await;

  let student = s
    .add_student(NewStudent {
      id:            None,
      first_name:    "Alice".into(),
      last_name:     "Liddell".into(),
      date_of_birth: NaiveDate::from_ymd_opt(2014, 6, 1),
      year_group:    Some("Year 7".into()),
    })
    .await
    .unwrap();

  assert!(!student.id.is_empty());
}

#[tokio::test]
async fn add_staff_without_id_gets_one_assigned() {
  let s = store().await;

  let staff = s
    .add_staff(NewStaff {
      id:           None,
      display_name: "Gina Hale".into(),
    })
    .await
    .unwrap();

  // Id 1 is the seeded default user; new staff come after it.
  assert!(staff.id > 1);
}
