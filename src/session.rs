use crate::error::{required, PortalError, PortalResult};
use crate::model::Role;
use crate::store::{accounts, login_log};
use chrono::NaiveDate;
use rusqlite::Connection;
use serde::Serialize;
use tracing::{info, warn};

/// The identity a client acts under after a successful login. It never changes role;
/// a new login produces a new value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub role: Role,
    pub username: String,
}

/// Admin logins are not checked against the account directory. Every other role must
/// have been registered under exactly this username.
pub fn login(conn: &Connection, role: Role, username: &str, today: NaiveDate) -> PortalResult<Session> {
    let username = required("username", username)?;

    if role == Role::Admin {
        warn!(%username, "admin login accepted without directory check");
    } else if !accounts::is_registered(conn, &username, role)? {
        warn!(%username, %role, "login rejected");
        return Err(PortalError::InvalidCredentials { role, username });
    }

    login_log::append(conn, &username, role, today)?;
    info!(%username, %role, "logged in");
    Ok(Session { role, username })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory_db;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 6).expect("date")
    }

    #[test]
    fn admin_needs_no_registration() {
        let conn = memory_db();
        let s = login(&conn, Role::Admin, "anyname", today()).expect("admin login");
        assert_eq!(s.role, Role::Admin);
        assert_eq!(s.username, "anyname");
    }

    #[test]
    fn unregistered_student_is_rejected_without_logging() {
        let conn = memory_db();
        let e = login(&conn, Role::Student, "bob", today()).unwrap_err();
        assert!(matches!(e, PortalError::InvalidCredentials { .. }));
        assert!(login_log::list(&conn).expect("log").is_empty());

        accounts::register(&conn, "bob", Role::Student).expect("register");
        let s = login(&conn, Role::Student, "bob", today()).expect("login");
        assert_eq!(s.username, "bob");
    }

    #[test]
    fn role_must_match_registration() {
        let conn = memory_db();
        accounts::register(&conn, "alice", Role::Staff).expect("register");
        let e = login(&conn, Role::PlacementOfficer, "alice", today()).unwrap_err();
        assert_eq!(e.code(), "invalid_credentials");
    }

    #[test]
    fn successful_logins_are_recorded() {
        let conn = memory_db();
        login(&conn, Role::Admin, "root", today()).expect("login");
        let log = login_log::list(&conn).expect("log");
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].username, "root");
        assert_eq!(log[0].role, Role::Admin);
        assert_eq!(log[0].date, "2024-05-06");
    }

    #[test]
    fn blank_username_is_rejected_for_admin_too() {
        let conn = memory_db();
        let e = login(&conn, Role::Admin, " ", today()).unwrap_err();
        assert!(matches!(e, PortalError::Validation(_)));
    }
}
