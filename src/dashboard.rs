use crate::error::{PortalError, PortalResult};
use crate::model::{AttendanceStatus, Role};
use crate::session::Session;
use crate::store::{accounts, attendance, login_log, notifications, timetable};
use chrono::NaiveDate;
use rusqlite::Connection;
use serde_json::json;
use tracing::{info, warn};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Capability {
    ViewRoleCounts,
    SendNotification,
    ViewLoginLog,
    ListAllNotifications,
    DeleteNotification,
    RecordAttendance,
    AddTimetableEntry,
    ViewOwnTimetable,
    ViewOwnNotifications,
    ViewOwnAttendance,
}

impl Capability {
    pub const ALL: [Capability; 10] = [
        Capability::ViewRoleCounts,
        Capability::SendNotification,
        Capability::ViewLoginLog,
        Capability::ListAllNotifications,
        Capability::DeleteNotification,
        Capability::RecordAttendance,
        Capability::AddTimetableEntry,
        Capability::ViewOwnTimetable,
        Capability::ViewOwnNotifications,
        Capability::ViewOwnAttendance,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Capability::ViewRoleCounts => "viewRoleCounts",
            Capability::SendNotification => "sendNotification",
            Capability::ViewLoginLog => "viewLoginLog",
            Capability::ListAllNotifications => "listAllNotifications",
            Capability::DeleteNotification => "deleteNotification",
            Capability::RecordAttendance => "recordAttendance",
            Capability::AddTimetableEntry => "addTimetableEntry",
            Capability::ViewOwnTimetable => "viewOwnTimetable",
            Capability::ViewOwnNotifications => "viewOwnNotifications",
            Capability::ViewOwnAttendance => "viewOwnAttendance",
        }
    }

    /// IPC method that invokes this capability.
    pub fn method(self) -> &'static str {
        match self {
            Capability::ViewRoleCounts => "admin.roleCounts",
            Capability::SendNotification => "notifications.send",
            Capability::ViewLoginLog => "admin.loginLog",
            Capability::ListAllNotifications => "notifications.listAll",
            Capability::DeleteNotification => "notifications.delete",
            Capability::RecordAttendance => "attendance.record",
            Capability::AddTimetableEntry => "timetable.add",
            Capability::ViewOwnTimetable => "timetable.listOwn",
            Capability::ViewOwnNotifications => "notifications.listOwn",
            Capability::ViewOwnAttendance => "attendance.listOwn",
        }
    }

    pub fn from_method(method: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.method() == method)
    }
}

pub fn capabilities_for(role: Role) -> &'static [Capability] {
    use Capability::*;
    match role {
        Role::Admin => &[
            ViewRoleCounts,
            SendNotification,
            ViewLoginLog,
            ListAllNotifications,
            DeleteNotification,
        ],
        Role::Staff => &[
            RecordAttendance,
            AddTimetableEntry,
            ViewOwnTimetable,
            SendNotification,
        ],
        Role::PlacementOfficer => &[SendNotification],
        Role::Student => &[ViewOwnNotifications, ViewOwnAttendance],
    }
}

/// Roles a sender may address. Empty for roles that cannot send at all.
pub fn notification_targets(role: Role) -> &'static [Role] {
    match role {
        Role::Admin => &[Role::Staff, Role::PlacementOfficer, Role::Student],
        Role::Staff | Role::PlacementOfficer => &[Role::Student],
        Role::Student => &[],
    }
}

pub fn authorize(session: &Session, capability: Capability) -> PortalResult<()> {
    if capabilities_for(session.role).contains(&capability) {
        return Ok(());
    }
    warn!(
        username = %session.username,
        role = %session.role,
        capability = capability.name(),
        "capability refused"
    );
    Err(PortalError::forbidden(session.role, capability))
}

/// The dashboard description sent to the form layer after login.
pub fn describe(session: &Session) -> serde_json::Value {
    let caps: Vec<serde_json::Value> = capabilities_for(session.role)
        .iter()
        .map(|c| json!({ "name": c.name(), "method": c.method() }))
        .collect();
    let mut view = json!(session);
    view["capabilities"] = json!(caps);
    view["notificationTargets"] = json!(notification_targets(session.role));
    view
}

/// A capability together with the form values it was submitted with.
#[derive(Debug, Clone, PartialEq)]
pub enum Invocation {
    ViewRoleCounts,
    SendNotification { message: String, to: Role },
    ViewLoginLog,
    ListAllNotifications,
    DeleteNotification { id: i64 },
    RecordAttendance { student: String, status: AttendanceStatus },
    AddTimetableEntry { subject: String, day: String, time: String },
    ViewOwnTimetable,
    ViewOwnNotifications,
    ViewOwnAttendance,
}

impl Invocation {
    pub fn capability(&self) -> Capability {
        match self {
            Invocation::ViewRoleCounts => Capability::ViewRoleCounts,
            Invocation::SendNotification { .. } => Capability::SendNotification,
            Invocation::ViewLoginLog => Capability::ViewLoginLog,
            Invocation::ListAllNotifications => Capability::ListAllNotifications,
            Invocation::DeleteNotification { .. } => Capability::DeleteNotification,
            Invocation::RecordAttendance { .. } => Capability::RecordAttendance,
            Invocation::AddTimetableEntry { .. } => Capability::AddTimetableEntry,
            Invocation::ViewOwnTimetable => Capability::ViewOwnTimetable,
            Invocation::ViewOwnNotifications => Capability::ViewOwnNotifications,
            Invocation::ViewOwnAttendance => Capability::ViewOwnAttendance,
        }
    }
}

/// Runs `invocation` on behalf of `session` and returns the view data to display.
/// `today` dates attendance records.
pub fn invoke(
    conn: &Connection,
    session: &Session,
    invocation: Invocation,
    today: NaiveDate,
) -> PortalResult<serde_json::Value> {
    authorize(session, invocation.capability())?;

    match invocation {
        Invocation::ViewRoleCounts => {
            let counts = accounts::role_counts(conn)?;
            Ok(json!({ "counts": counts }))
        }
        Invocation::SendNotification { message, to } => {
            if !notification_targets(session.role).contains(&to) {
                warn!(role = %session.role, receiver = %to, "notification target refused");
                return Err(PortalError::ForbiddenCapability {
                    role: session.role,
                    action: format!("{} to {}", Capability::SendNotification.name(), to),
                });
            }
            let id = notifications::post(conn, &session.username, &message, to)?;
            info!(id, sender = %session.username, receiver = %to, "notification sent");
            Ok(json!({ "id": id, "status": "Notification sent" }))
        }
        Invocation::ViewLoginLog => {
            let events = login_log::list(conn)?;
            Ok(json!({ "events": events }))
        }
        Invocation::ListAllNotifications => {
            let list = notifications::list_all(conn)?;
            Ok(json!({ "notifications": list }))
        }
        Invocation::DeleteNotification { id } => {
            let deleted = notifications::delete(conn, id)?;
            if deleted {
                info!(id, "notification deleted");
            }
            let status = if deleted {
                "Notification deleted"
            } else {
                "Notification already removed"
            };
            // The board is re-sent so the caller can redraw without a second request.
            let list = notifications::list_all(conn)?;
            Ok(json!({
                "deleted": deleted,
                "notifications": list,
                "status": status,
            }))
        }
        Invocation::RecordAttendance { student, status } => {
            let record = attendance::record(conn, &student, status, today)?;
            Ok(json!({ "record": record, "status": "Attendance updated" }))
        }
        Invocation::AddTimetableEntry { subject, day, time } => {
            let entry = timetable::add(conn, &session.username, &subject, &day, &time)?;
            Ok(json!({ "entry": entry, "status": "Timetable updated" }))
        }
        Invocation::ViewOwnTimetable => {
            let entries = timetable::list_for(conn, &session.username)?;
            Ok(json!({ "entries": entries }))
        }
        Invocation::ViewOwnNotifications => {
            let list = notifications::list_for(conn, session.role)?;
            Ok(json!({ "notifications": list }))
        }
        Invocation::ViewOwnAttendance => {
            let records = attendance::list_for(conn, &session.username)?;
            Ok(json!({ "records": records }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory_db;
    use crate::session::login;
    use crate::store::accounts::register;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 10, 1).expect("date")
    }

    fn session(role: Role, username: &str) -> Session {
        Session {
            role,
            username: username.to_string(),
        }
    }

    #[test]
    fn every_capability_has_a_unique_method() {
        for c in Capability::ALL {
            assert_eq!(Capability::from_method(c.method()), Some(c));
        }
        assert_eq!(Capability::from_method("session.login"), None);
    }

    #[test]
    fn capability_sets_per_role() {
        assert!(capabilities_for(Role::Admin).contains(&Capability::DeleteNotification));
        assert!(!capabilities_for(Role::Admin).contains(&Capability::RecordAttendance));
        assert_eq!(
            capabilities_for(Role::PlacementOfficer),
            &[Capability::SendNotification]
        );
        assert_eq!(
            capabilities_for(Role::Student),
            &[Capability::ViewOwnNotifications, Capability::ViewOwnAttendance]
        );
    }

    #[test]
    fn capability_outside_role_is_forbidden() {
        let conn = memory_db();
        let student = session(Role::Student, "sam");
        let e = invoke(&conn, &student, Invocation::ViewLoginLog, today()).unwrap_err();
        assert_eq!(e.code(), "forbidden_capability");

        let po = session(Role::PlacementOfficer, "pat");
        let e = invoke(
            &conn,
            &po,
            Invocation::DeleteNotification { id: 1 },
            today(),
        )
        .unwrap_err();
        assert!(matches!(e, PortalError::ForbiddenCapability { .. }));
    }

    #[test]
    fn staff_may_only_address_students() {
        let conn = memory_db();
        let staff = session(Role::Staff, "alice");
        let e = invoke(
            &conn,
            &staff,
            Invocation::SendNotification {
                message: "hi".to_string(),
                to: Role::Staff,
            },
            today(),
        )
        .unwrap_err();
        assert_eq!(e.code(), "forbidden_capability");
        assert!(notifications::list_all(&conn).expect("all").is_empty());
    }

    #[test]
    fn sender_is_the_username() {
        let conn = memory_db();
        let admin = login(&conn, Role::Admin, "root", today()).expect("admin");
        invoke(
            &conn,
            &admin,
            Invocation::SendNotification {
                message: "update".to_string(),
                to: Role::Student,
            },
            today(),
        )
        .expect("send");

        register(&conn, "sam", Role::Student).expect("register");
        let sam = login(&conn, Role::Student, "sam", today()).expect("sam");
        let view = invoke(&conn, &sam, Invocation::ViewOwnNotifications, today()).expect("view");
        let list = view["notifications"].as_array().expect("list");
        assert_eq!(list.len(), 1);
        assert_eq!(list[0]["sender"], "root");
        assert_eq!(list[0]["message"], "update");
    }

    #[test]
    fn attendance_is_dated_today_and_visible_to_the_student() {
        let conn = memory_db();
        register(&conn, "alice", Role::Staff).expect("alice");
        let alice = login(&conn, Role::Staff, "alice", today()).expect("alice login");
        invoke(
            &conn,
            &alice,
            Invocation::RecordAttendance {
                student: "bob".to_string(),
                status: AttendanceStatus::Present,
            },
            today(),
        )
        .expect("record");

        register(&conn, "bob", Role::Student).expect("bob");
        let bob = login(&conn, Role::Student, "bob", today()).expect("bob login");
        let view = invoke(&conn, &bob, Invocation::ViewOwnAttendance, today()).expect("view");
        assert_eq!(
            view["records"],
            json!([{ "student": "bob", "status": "Present", "date": "2024-10-01" }])
        );
    }

    #[test]
    fn staff_sees_only_their_timetable() {
        let conn = memory_db();
        let alice = session(Role::Staff, "alice");
        let carol = session(Role::Staff, "carol");
        for (s, subject) in [(&alice, "Maths"), (&carol, "Art")] {
            invoke(
                &conn,
                s,
                Invocation::AddTimetableEntry {
                    subject: subject.to_string(),
                    day: "Monday".to_string(),
                    time: "09:00".to_string(),
                },
                today(),
            )
            .expect("add");
        }
        let view = invoke(&conn, &alice, Invocation::ViewOwnTimetable, today()).expect("view");
        let entries = view["entries"].as_array().expect("entries");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0]["subject"], "Maths");
    }

    #[test]
    fn describe_lists_targets() {
        let d = describe(&session(Role::Staff, "alice"));
        assert_eq!(d["notificationTargets"], json!(["Student"]));
        assert_eq!(d["capabilities"][0]["method"], "attendance.record");
        assert_eq!(d["role"], "Staff");
        assert_eq!(d["username"], "alice");

        let po = describe(&session(Role::PlacementOfficer, "pat"));
        assert_eq!(po["role"], "Placement Officer");
    }
}
