//! Data models for smsrelay

mod alert;

pub use alert::*;
