//! Alert dispatch
//!
//! Resolves recipient groups for each alert and fans them out to the SMS
//! provider, either inline ([`Dispatcher`]) or on background workers
//! ([`DispatchQueue`]).

mod dispatcher;
mod queue;

pub use dispatcher::{Delivery, DispatchReport, Dispatcher};
pub use queue::DispatchQueue;
