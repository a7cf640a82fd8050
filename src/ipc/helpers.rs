use crate::error::{PortalError, PortalResult};
use crate::ipc::types::AppState;
use crate::session::Session;
use rusqlite::Connection;
use std::str::FromStr;

pub fn get_str<'a>(params: &'a serde_json::Value, key: &str) -> Option<&'a str> {
    params.get(key).and_then(|v| v.as_str())
}

/// A present string field. Blank values are left for the store to judge.
pub fn get_required_str(params: &serde_json::Value, key: &str) -> PortalResult<String> {
    get_str(params, key)
        .map(|s| s.to_string())
        .ok_or_else(|| PortalError::validation(format!("missing {}", key)))
}

pub fn get_parsed<T>(params: &serde_json::Value, key: &str) -> PortalResult<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let raw = get_required_str(params, key)?;
    raw.parse()
        .map_err(|e: T::Err| PortalError::validation(e.to_string()))
}

pub fn conn(state: &AppState) -> PortalResult<&Connection> {
    state.db.as_ref().ok_or(PortalError::NoWorkspace)
}

pub fn session<'a>(state: &'a AppState, params: &serde_json::Value) -> PortalResult<&'a Session> {
    get_str(params, "sessionId")
        .and_then(|sid| state.sessions.get(sid))
        .ok_or(PortalError::NotLoggedIn)
}

pub fn today() -> chrono::NaiveDate {
    chrono::Local::now().date_naive()
}
