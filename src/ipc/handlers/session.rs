use crate::dashboard;
use crate::error::PortalResult;
use crate::ipc::error::respond;
use crate::ipc::helpers::{conn, get_parsed, get_required_str, get_str, session, today};
use crate::ipc::types::{AppState, Request};
use crate::model::Role;
use crate::session::login;
use crate::store::accounts;
use serde_json::json;
use tracing::info;
use uuid::Uuid;

fn accounts_register(state: &AppState, params: &serde_json::Value) -> PortalResult<serde_json::Value> {
    let conn = conn(state)?;
    let username = get_required_str(params, "username")?;
    let role: Role = get_parsed(params, "role")?;
    let created = accounts::register(conn, &username, role)?;
    let status = if created {
        info!(username = %username.trim(), %role, "account registered");
        "Registered"
    } else {
        "Already registered"
    };
    Ok(json!({ "created": created, "status": status }))
}

fn session_login(state: &mut AppState, params: &serde_json::Value) -> PortalResult<serde_json::Value> {
    let role: Role = get_parsed(params, "role")?;
    let username = get_required_str(params, "username")?;
    let new_session = login(conn(state)?, role, &username, today())?;

    // Re-login under a known id replaces that session. Without one, the same role and
    // username get their existing id back, so repeated logins do not pile up entries.
    let session_id = match get_str(params, "sessionId") {
        Some(sid) if state.sessions.contains_key(sid) => sid.to_string(),
        _ => state
            .sessions
            .iter()
            .find(|(_, s)| **s == new_session)
            .map(|(sid, _)| sid.clone())
            .unwrap_or_else(|| Uuid::new_v4().to_string()),
    };
    let mut result = dashboard::describe(&new_session);
    result["sessionId"] = json!(session_id);
    result["status"] = json!(format!("Logged in as {}", new_session.role));
    state.sessions.insert(session_id, new_session);
    Ok(result)
}

fn session_current(state: &AppState, params: &serde_json::Value) -> PortalResult<serde_json::Value> {
    let s = session(state, params)?;
    Ok(dashboard::describe(s))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "accounts.register" => Some(respond(&req.id, accounts_register(state, &req.params))),
        "session.login" => Some(respond(&req.id, session_login(state, &req.params))),
        "session.current" | "dashboard.capabilities" => {
            Some(respond(&req.id, session_current(state, &req.params)))
        }
        _ => None,
    }
}
