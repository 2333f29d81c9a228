//! SQL schema for the haven SQLite store.
//!
//! Executed once at connection startup via `PRAGMA user_version`. Future
//! migrations will be gated on that version number.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS` and
/// `INSERT OR IGNORE` for the seeded fallback rows.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- Reference data. Row id 1 of each table is the fallback the write path
-- substitutes when the caller omits the field.
CREATE TABLE IF NOT EXISTS categories (
    id   INTEGER PRIMARY KEY,
    name TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS locations (
    id   INTEGER PRIMARY KEY,
    name TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS statuses (
    id   INTEGER PRIMARY KEY,
    name TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS staff (
    id           INTEGER PRIMARY KEY,
    display_name TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS students (
    id            TEXT PRIMARY KEY,
    first_name    TEXT NOT NULL,
    last_name     TEXT NOT NULL,
    date_of_birth TEXT,
    year_group    TEXT
);

CREATE TABLE IF NOT EXISTS emergency_contacts (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    student_id   TEXT NOT NULL REFERENCES students(id),
    name         TEXT NOT NULL,
    relationship TEXT,
    phone        TEXT NOT NULL
);

-- Reports and their children are created together in one transaction and
-- never updated or deleted.
CREATE TABLE IF NOT EXISTS incidents (
    id                 INTEGER PRIMARY KEY,
    category_id        INTEGER NOT NULL REFERENCES categories(id),
    location_id        INTEGER NOT NULL REFERENCES locations(id),
    incident_date      TEXT NOT NULL,
    incident_time      TEXT NOT NULL,
    details            TEXT NOT NULL DEFAULT '',
    witness_id         INTEGER REFERENCES staff(id),
    actions_taken      TEXT NOT NULL DEFAULT '',
    requires_follow_up INTEGER NOT NULL DEFAULT 0,
    is_confidential    INTEGER NOT NULL DEFAULT 0,
    urgent             INTEGER NOT NULL DEFAULT 0,
    created_by         INTEGER NOT NULL REFERENCES staff(id),
    status_id          INTEGER NOT NULL REFERENCES statuses(id),
    created_at         TEXT NOT NULL
);

-- Deliberately no uniqueness constraint: the same student may be linked
-- more than once with different roles.
CREATE TABLE IF NOT EXISTS incident_students (
    incident_id INTEGER NOT NULL REFERENCES incidents(id),
    student_id  TEXT NOT NULL REFERENCES students(id),
    role        TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS body_map_marks (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    incident_id INTEGER NOT NULL REFERENCES incidents(id),
    view        TEXT NOT NULL DEFAULT 'front',
    x           REAL NOT NULL,
    y           REAL NOT NULL,
    note        TEXT NOT NULL DEFAULT ''
);

-- Metadata only; attachment binaries live in file storage.
CREATE TABLE IF NOT EXISTS attachments (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    incident_id INTEGER NOT NULL REFERENCES incidents(id),
    file_name   TEXT NOT NULL,
    file_path   TEXT NOT NULL,
    media_type  TEXT NOT NULL,
    uploaded_by INTEGER REFERENCES staff(id),
    uploaded_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS notifications (
    incident_id INTEGER NOT NULL REFERENCES incidents(id),
    user_id     INTEGER NOT NULL REFERENCES staff(id),
    created_at  TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS incident_students_incident_idx ON incident_students(incident_id);
CREATE INDEX IF NOT EXISTS body_map_marks_incident_idx    ON body_map_marks(incident_id);
CREATE INDEX IF NOT EXISTS attachments_incident_idx       ON attachments(incident_id);
CREATE INDEX IF NOT EXISTS notifications_incident_idx     ON notifications(incident_id);
CREATE INDEX IF NOT EXISTS emergency_contacts_student_idx ON emergency_contacts(student_id);

INSERT OR IGNORE INTO categories (id, name) VALUES (1, 'Uncategorised');
INSERT OR IGNORE INTO locations  (id, name) VALUES (1, 'Unspecified');
INSERT OR IGNORE INTO statuses   (id, name) VALUES (1, 'Open');
INSERT OR IGNORE INTO staff (id, display_name) VALUES (1, 'System');

PRAGMA user_version = 1;
";
