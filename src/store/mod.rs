//! Table stores. Each function takes the connection it runs against and issues a
//! single statement, so writes never interleave within one request.

pub mod accounts;
pub mod attendance;
pub mod login_log;
pub mod notifications;
pub mod timetable;
