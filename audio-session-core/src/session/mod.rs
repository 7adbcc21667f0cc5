mod active_session;
pub mod controller;
pub(crate) mod progress;
