use crate::error::{required, PortalResult};
use crate::model::TimetableEntry;
use rusqlite::Connection;

pub fn add(
    conn: &Connection,
    staff: &str,
    subject: &str,
    day: &str,
    time: &str,
) -> PortalResult<TimetableEntry> {
    let entry = TimetableEntry {
        staff: required("staff", staff)?,
        subject: required("subject", subject)?,
        day: required("day", day)?,
        time: required("time", time)?,
    };
    conn.execute(
        "INSERT INTO timetable(staff, subject, day, time) VALUES(?, ?, ?, ?)",
        (&entry.staff, &entry.subject, &entry.day, &entry.time),
    )?;
    Ok(entry)
}

pub fn list_for(conn: &Connection, staff: &str) -> PortalResult<Vec<TimetableEntry>> {
    let mut stmt = conn.prepare(
        "SELECT staff, subject, day, time
         FROM timetable
         WHERE staff = ?
         ORDER BY rowid",
    )?;
    let rows = stmt
        .query_map([staff.trim()], |r| {
            Ok(TimetableEntry {
                staff: r.get(0)?,
                subject: r.get(1)?,
                day: r.get(2)?,
                time: r.get(3)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}
