use crate::error::{required, PortalResult};
use crate::model::{Role, RoleCount};
use rusqlite::{Connection, OptionalExtension};

/// Registers `username` under `role`. A username that is already registered is left
/// untouched; the return value says whether a row was added.
pub fn register(conn: &Connection, username: &str, role: Role) -> PortalResult<bool> {
    let username = required("username", username)?;
    let inserted = conn.execute(
        "INSERT OR IGNORE INTO users(username, role) VALUES(?, ?)",
        (&username, role),
    )?;
    Ok(inserted > 0)
}

/// Names are compared after trimming, the same way `register` stores them.
pub fn is_registered(conn: &Connection, username: &str, role: Role) -> PortalResult<bool> {
    let found = conn
        .query_row(
            "SELECT 1 FROM users WHERE username = ? AND role = ?",
            (username.trim(), role),
            |r| r.get::<_, i64>(0),
        )
        .optional()?;
    Ok(found.is_some())
}

pub fn role_counts(conn: &Connection) -> PortalResult<Vec<RoleCount>> {
    let mut stmt = conn.prepare(
        "SELECT role, COUNT(*)
         FROM users
         GROUP BY role
         ORDER BY role",
    )?;
    let rows = stmt
        .query_map([], |r| {
            Ok(RoleCount {
                role: r.get(0)?,
                count: r.get(1)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}
