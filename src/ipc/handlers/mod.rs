pub mod capabilities;
pub mod core;
pub mod session;
