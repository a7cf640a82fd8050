use crate::dashboard::{self, Capability, Invocation};
use crate::error::{PortalError, PortalResult};
use crate::ipc::error::respond;
use crate::ipc::helpers::{conn, get_parsed, get_required_str, session, today};
use crate::ipc::types::{AppState, Request};
use crate::model::Role;

/// Reads the form values a capability was submitted with.
fn parse_invocation(capability: Capability, params: &serde_json::Value) -> PortalResult<Invocation> {
    let invocation = match capability {
        Capability::ViewRoleCounts => Invocation::ViewRoleCounts,
        Capability::SendNotification => {
            // Staff and placement officers only ever address students.
            let to = match params.get("receiverRole") {
                None | Some(serde_json::Value::Null) => Role::Student,
                Some(_) => get_parsed(params, "receiverRole")?,
            };
            Invocation::SendNotification {
                message: get_required_str(params, "message")?,
                to,
            }
        }
        Capability::ViewLoginLog => Invocation::ViewLoginLog,
        Capability::ListAllNotifications => Invocation::ListAllNotifications,
        Capability::DeleteNotification => {
            let id = params
                .get("id")
                .and_then(|v| v.as_i64())
                .ok_or_else(|| PortalError::validation("missing id"))?;
            Invocation::DeleteNotification { id }
        }
        Capability::RecordAttendance => Invocation::RecordAttendance {
            student: get_required_str(params, "student")?,
            status: get_parsed(params, "status")?,
        },
        Capability::AddTimetableEntry => Invocation::AddTimetableEntry {
            subject: get_required_str(params, "subject")?,
            day: get_required_str(params, "day")?,
            time: get_required_str(params, "time")?,
        },
        Capability::ViewOwnTimetable => Invocation::ViewOwnTimetable,
        Capability::ViewOwnNotifications => Invocation::ViewOwnNotifications,
        Capability::ViewOwnAttendance => Invocation::ViewOwnAttendance,
    };
    Ok(invocation)
}

fn invoke(
    state: &AppState,
    capability: Capability,
    params: &serde_json::Value,
) -> PortalResult<serde_json::Value> {
    let conn = conn(state)?;
    let session = session(state, params)?;
    // Refuse before looking at the form so a forbidden call never reports bad params.
    dashboard::authorize(session, capability)?;
    let invocation = parse_invocation(capability, params)?;
    dashboard::invoke(conn, session, invocation, today())
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let capability = Capability::from_method(&req.method)?;
    Some(respond(&req.id, invoke(state, capability, &req.params)))
}
