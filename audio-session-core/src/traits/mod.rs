pub mod capture_engine;
pub mod clock;
pub mod projection;
pub mod recorder_callback;
