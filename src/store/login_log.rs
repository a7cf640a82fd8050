use crate::error::PortalResult;
use crate::model::{date_label, LoginEvent, Role};
use chrono::NaiveDate;
use rusqlite::Connection;

pub fn append(conn: &Connection, username: &str, role: Role, date: NaiveDate) -> PortalResult<()> {
    conn.execute(
        "INSERT INTO login_log(username, role, date) VALUES(?, ?, ?)",
        (username, role, date_label(date)),
    )?;
    Ok(())
}

/// Every recorded login, oldest first.
pub fn list(conn: &Connection) -> PortalResult<Vec<LoginEvent>> {
    let mut stmt = conn.prepare(
        "SELECT username, role, date
         FROM login_log
         ORDER BY rowid",
    )?;
    let rows = stmt
        .query_map([], |r| {
            Ok(LoginEvent {
                username: r.get(0)?,
                role: r.get(1)?,
                date: r.get(2)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}
