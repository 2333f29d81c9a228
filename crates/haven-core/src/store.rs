//! The `IncidentStore` trait.
//!
//! The trait is implemented by storage backends (e.g. `haven-store-sqlite`).
//! Higher layers (`haven-api`, `haven-server`) depend on this abstraction,
//! not on any concrete backend.

use std::future::Future;

use crate::{
  aggregate::{IncidentAggregate, IncidentSummary},
  directory::{
    Attachment, EmergencyContact, NewAttachment, NewEmergencyContact,
    NewStaff, NewStudent, Staff, Student,
  },
  incident::{NewIncident, ReportId},
};

/// Abstraction over an incident store backend.
///
/// The write side is create-only: reports and their children are inserted
/// together in one transaction and never updated or deleted. Reads compose
/// the aggregate fresh on every call.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait IncidentStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Incident write path ───────────────────────────────────────────────

  /// Create a report and all of its child rows as one atomic unit.
  ///
  /// Every insert happens inside a single transaction, in a fixed order:
  /// the report row, the unconditional `involved` link for
  /// `input.student_id`, the optional `primary` link, the linked-student
  /// links, the body-map marks, the notification fan-out. Any failure
  /// rolls the whole transaction back; no partial state survives.
  ///
  /// Returns the report id — the caller-supplied one when present,
  /// otherwise the id the store assigned.
  fn create_incident(
    &self,
    input: NewIncident,
  ) -> impl Future<Output = Result<ReportId, Self::Error>> + Send + '_;

  // ── Incident reads ────────────────────────────────────────────────────

  /// Reassemble one incident and all related child rows.
  ///
  /// Returns `None` if the report does not exist. Child sections are
  /// best-effort — see [`IncidentAggregate::degraded`]. The read is not
  /// transactional; no cross-section consistency is promised.
  fn get_incident(
    &self,
    id: ReportId,
  ) -> impl Future<Output = Result<Option<IncidentAggregate>, Self::Error>> + Send + '_;

  /// List all reports, newest incident date first.
  fn list_incidents(
    &self,
  ) -> impl Future<Output = Result<Vec<IncidentSummary>, Self::Error>> + Send + '_;

  // ── Directory writes ──────────────────────────────────────────────────

  /// Register a student. Generates an id when the input carries none.
  fn add_student(
    &self,
    input: NewStudent,
  ) -> impl Future<Output = Result<Student, Self::Error>> + Send + '_;

  /// Register a staff user.
  fn add_staff(
    &self,
    input: NewStaff,
  ) -> impl Future<Output = Result<Staff, Self::Error>> + Send + '_;

  /// Record an emergency contact for a student.
  fn add_emergency_contact(
    &self,
    input: NewEmergencyContact,
  ) -> impl Future<Output = Result<EmergencyContact, Self::Error>> + Send + '_;

  /// Record attachment metadata for a report. The binary itself lives in
  /// file storage and is outside this store.
  fn add_attachment(
    &self,
    input: NewAttachment,
  ) -> impl Future<Output = Result<Attachment, Self::Error>> + Send + '_;
}
