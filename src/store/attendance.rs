use crate::error::{required, PortalResult};
use crate::model::{date_label, AttendanceRecord, AttendanceStatus};
use chrono::NaiveDate;
use rusqlite::Connection;

pub fn record(
    conn: &Connection,
    student: &str,
    status: AttendanceStatus,
    date: NaiveDate,
) -> PortalResult<AttendanceRecord> {
    let student = required("student", student)?;
    let date = date_label(date);
    conn.execute(
        "INSERT INTO attendance(student, status, date) VALUES(?, ?, ?)",
        (&student, status, &date),
    )?;
    Ok(AttendanceRecord {
        student,
        status,
        date,
    })
}

/// Records for exactly `student` (trimmed, as `record` stores it), oldest first.
pub fn list_for(conn: &Connection, student: &str) -> PortalResult<Vec<AttendanceRecord>> {
    let mut stmt = conn.prepare(
        "SELECT student, status, date
         FROM attendance
         WHERE student = ?
         ORDER BY rowid",
    )?;
    let rows = stmt
        .query_map([student.trim()], |r| {
            Ok(AttendanceRecord {
                student: r.get(0)?,
                status: r.get(1)?,
                date: r.get(2)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory_db;
    use crate::error::PortalError;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 9, d).expect("date")
    }

    #[test]
    fn records_are_filtered_by_student() {
        let conn = memory_db();
        record(&conn, "bob", AttendanceStatus::Present, day(2)).expect("bob 2");
        record(&conn, "sam", AttendanceStatus::Absent, day(2)).expect("sam 2");
        record(&conn, "bob", AttendanceStatus::Absent, day(3)).expect("bob 3");

        let bob: Vec<(AttendanceStatus, String)> = list_for(&conn, "bob")
            .expect("bob")
            .into_iter()
            .map(|r| (r.status, r.date))
            .collect();
        assert_eq!(
            bob,
            vec![
                (AttendanceStatus::Present, "2024-09-02".to_string()),
                (AttendanceStatus::Absent, "2024-09-03".to_string()),
            ]
        );
        assert_eq!(list_for(&conn, "sam").expect("sam").len(), 1);
        assert!(list_for(&conn, "bo").expect("prefix").is_empty());
    }

    #[test]
    fn padded_student_names_find_their_records() {
        let conn = memory_db();
        record(&conn, " bob ", AttendanceStatus::Present, day(4)).expect("record");
        let padded = list_for(&conn, " bob ").expect("padded");
        assert_eq!(padded.len(), 1);
        assert_eq!(padded[0].student, "bob");
        assert_eq!(list_for(&conn, "bob").expect("bare").len(), 1);
    }

    #[test]
    fn student_name_is_required() {
        let conn = memory_db();
        let e = record(&conn, "", AttendanceStatus::Present, day(1)).unwrap_err();
        assert!(matches!(e, PortalError::Validation(_)));
    }
}
