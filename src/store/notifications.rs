use crate::error::PortalResult;
use crate::model::{Notification, Role};
use rusqlite::{Connection, Row};

fn notification_from_row(r: &Row<'_>) -> rusqlite::Result<Notification> {
    Ok(Notification {
        id: r.get(0)?,
        sender: r.get(1)?,
        message: r.get(2)?,
        receiver_role: r.get(3)?,
    })
}

/// Appends a notification and returns its id. Empty messages are accepted.
pub fn post(conn: &Connection, sender: &str, message: &str, receiver_role: Role) -> PortalResult<i64> {
    conn.execute(
        "INSERT INTO notifications(sender, message, receiver_role) VALUES(?, ?, ?)",
        (sender, message, receiver_role),
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn list_for(conn: &Connection, role: Role) -> PortalResult<Vec<Notification>> {
    let mut stmt = conn.prepare(
        "SELECT id, sender, message, receiver_role
         FROM notifications
         WHERE receiver_role = ?
         ORDER BY id",
    )?;
    let rows = stmt
        .query_map([role], notification_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn list_all(conn: &Connection) -> PortalResult<Vec<Notification>> {
    let mut stmt = conn.prepare(
        "SELECT id, sender, message, receiver_role
         FROM notifications
         ORDER BY id",
    )?;
    let rows = stmt
        .query_map([], notification_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Removes notification `id`. Deleting an id that does not exist is not an error.
pub fn delete(conn: &Connection, id: i64) -> PortalResult<bool> {
    let removed = conn.execute("DELETE FROM notifications WHERE id = ?", [id])?;
    Ok(removed > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory_db;

    fn pairs(list: &[Notification]) -> Vec<(&str, &str)> {
        list.iter()
            .map(|n| (n.sender.as_str(), n.message.as_str()))
            .collect()
    }

    #[test]
    fn listing_filters_by_receiver_role() {
        let conn = memory_db();
        post(&conn, "root", "exam moved", Role::Student).expect("post");
        post(&conn, "root", "staff meeting", Role::Staff).expect("post");
        post(&conn, "pat", "drive on friday", Role::Student).expect("post");

        let students = list_for(&conn, Role::Student).expect("students");
        assert_eq!(
            pairs(&students),
            vec![("root", "exam moved"), ("pat", "drive on friday")]
        );
        let staff = list_for(&conn, Role::Staff).expect("staff");
        assert_eq!(pairs(&staff), vec![("root", "staff meeting")]);
        assert!(list_for(&conn, Role::PlacementOfficer)
            .expect("po")
            .is_empty());
    }

    #[test]
    fn ids_ascend_and_empty_messages_are_kept() {
        let conn = memory_db();
        let a = post(&conn, "root", "", Role::Student).expect("a");
        let b = post(&conn, "root", "second", Role::Student).expect("b");
        assert!(b > a);
        let all = list_all(&conn).expect("all");
        assert_eq!(all[0].message, "");
        assert_eq!(all.iter().map(|n| n.id).collect::<Vec<_>>(), vec![a, b]);
    }

    #[test]
    fn delete_is_idempotent() {
        let conn = memory_db();
        let id = post(&conn, "root", "oops", Role::Staff).expect("post");
        let keep = post(&conn, "root", "keep", Role::Staff).expect("post");

        assert!(delete(&conn, id).expect("first delete"));
        assert!(!delete(&conn, id).expect("second delete"));
        assert!(!delete(&conn, 9999).expect("missing id"));

        let ids: Vec<i64> = list_all(&conn).expect("all").iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![keep]);
    }

    #[test]
    fn deleted_ids_are_not_reused() {
        let conn = memory_db();
        let first = post(&conn, "root", "one", Role::Student).expect("post");
        delete(&conn, first).expect("delete");
        let next = post(&conn, "root", "two", Role::Student).expect("post");
        assert!(next > first);
    }
}
