use crate::model::{AttendanceStatus, Role};
use anyhow::Context;
use rusqlite::{Connection, OptionalExtension};
use std::path::Path;
use tracing::info;

pub const DB_FILE_NAME: &str = "campus.sqlite3";

pub fn open_db(workspace: &Path) -> anyhow::Result<Connection> {
    std::fs::create_dir_all(workspace).with_context(|| {
        format!(
            "failed to create workspace {}",
            workspace.to_string_lossy()
        )
    })?;
    let db_path = workspace.join(DB_FILE_NAME);
    let conn = Connection::open(&db_path)
        .with_context(|| format!("failed to open {}", db_path.to_string_lossy()))?;
    ensure_schema(&conn)?;
    Ok(conn)
}

/// Creates the five portal tables and brings older workspaces up to date.
/// Safe to run on every open.
pub fn ensure_schema(conn: &Connection) -> anyhow::Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS users(
            username TEXT NOT NULL,
            role TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS notifications(
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            sender TEXT NOT NULL,
            message TEXT NOT NULL,
            receiver_role TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS attendance(
            student TEXT NOT NULL,
            status TEXT NOT NULL,
            date TEXT NOT NULL
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_attendance_student ON attendance(student)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS timetable(
            staff TEXT NOT NULL,
            subject TEXT NOT NULL,
            day TEXT NOT NULL,
            time TEXT NOT NULL
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_timetable_staff ON timetable(staff)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS login_log(
            username TEXT NOT NULL,
            role TEXT NOT NULL,
            date TEXT NOT NULL
        )",
        [],
    )?;

    drop_unreadable_rows(conn)?;
    // Workspaces from before registration was deduplicated may hold repeats.
    ensure_users_unique(conn)?;
    ensure_notifications_id(conn)?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_notifications_receiver_role ON notifications(receiver_role)",
        [],
    )?;

    Ok(())
}

fn sql_labels(labels: &[&str]) -> String {
    labels
        .iter()
        .map(|l| format!("'{}'", l))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Older tables had nullable, free-text columns. Rows whose role or status label
/// cannot be read back would fail a whole listing, so they are removed.
fn drop_unreadable_rows(conn: &Connection) -> anyhow::Result<()> {
    let roles = sql_labels(&[
        Role::Admin.as_str(),
        Role::Staff.as_str(),
        Role::PlacementOfficer.as_str(),
        Role::Student.as_str(),
    ]);
    let statuses = sql_labels(&[
        AttendanceStatus::Present.as_str(),
        AttendanceStatus::Absent.as_str(),
    ]);

    let tx = conn.unchecked_transaction()?;
    tx.execute("UPDATE users SET role = TRIM(role) WHERE role <> TRIM(role)", [])?;
    tx.execute(
        "UPDATE attendance SET status = TRIM(status) WHERE status <> TRIM(status)",
        [],
    )?;
    let mut removed = 0;
    removed += tx.execute(
        &format!(
            "DELETE FROM users
             WHERE username IS NULL OR TRIM(username) = '' OR role IS NULL OR role NOT IN ({roles})"
        ),
        [],
    )?;
    removed += tx.execute(
        &format!(
            "DELETE FROM notifications
             WHERE receiver_role NOT IN ({roles})"
        ),
        [],
    )?;
    removed += tx.execute(
        &format!(
            "DELETE FROM attendance
             WHERE student IS NULL OR date IS NULL OR status IS NULL OR status NOT IN ({statuses})"
        ),
        [],
    )?;
    removed += tx.execute(
        &format!(
            "DELETE FROM login_log
             WHERE username IS NULL OR date IS NULL OR role IS NULL OR role NOT IN ({roles})"
        ),
        [],
    )?;
    tx.commit()?;

    if removed > 0 {
        info!(removed, "dropped unreadable rows from an older workspace");
    }
    Ok(())
}

fn ensure_users_unique(conn: &Connection) -> anyhow::Result<()> {
    if index_exists(conn, "idx_users_username")? {
        return Ok(());
    }

    let tx = conn.unchecked_transaction()?;
    // Keep the first registration of each username.
    let removed = tx.execute(
        "DELETE FROM users
         WHERE rowid NOT IN (SELECT MIN(rowid) FROM users GROUP BY username)",
        [],
    )?;
    tx.execute(
        "CREATE UNIQUE INDEX idx_users_username ON users(username)",
        [],
    )?;
    tx.commit()?;

    if removed > 0 {
        info!(removed, "dropped duplicate registrations while migrating users");
    }
    Ok(())
}

fn ensure_notifications_id(conn: &Connection) -> anyhow::Result<()> {
    if table_has_column(conn, "notifications", "id")? {
        return Ok(());
    }

    // SQLite cannot add a primary key in place; rebuild the table in rowid order.
    let tx = conn.unchecked_transaction()?;
    tx.execute("ALTER TABLE notifications RENAME TO notifications_v0", [])?;
    tx.execute(
        "CREATE TABLE notifications(
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            sender TEXT NOT NULL,
            message TEXT NOT NULL,
            receiver_role TEXT NOT NULL
        )",
        [],
    )?;
    let copied = tx.execute(
        "INSERT INTO notifications(sender, message, receiver_role)
         SELECT COALESCE(sender, ''), COALESCE(message, ''), COALESCE(receiver_role, 'Student')
         FROM notifications_v0
         ORDER BY rowid",
        [],
    )?;
    tx.execute("DROP TABLE notifications_v0", [])?;
    tx.commit()?;

    info!(copied, "migrated notifications to numbered ids");
    Ok(())
}

fn index_exists(conn: &Connection, name: &str) -> anyhow::Result<bool> {
    let found = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type = 'index' AND name = ?",
            [name],
            |r| r.get::<_, i64>(0),
        )
        .optional()?;
    Ok(found.is_some())
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> anyhow::Result<bool> {
    let sql = format!("PRAGMA table_info({})", table);
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let name: String = row.get(1)?;
        if name == column {
            return Ok(true);
        }
    }
    Ok(false)
}

#[cfg(test)]
pub(crate) fn memory_db() -> Connection {
    let conn = Connection::open_in_memory().expect("open in-memory db");
    ensure_schema(&conn).expect("schema");
    conn
}
