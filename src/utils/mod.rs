pub mod bce_auth;
pub mod logger;
pub mod redact;
