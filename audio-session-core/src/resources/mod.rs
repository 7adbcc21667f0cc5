pub mod capture_resources;
pub mod unsupported;
