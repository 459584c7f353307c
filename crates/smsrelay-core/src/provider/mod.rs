//! SMS provider integration
//!
//! Turns an alert message and a phone number into the request shape the
//! configured provider expects, encodes the body, and sends it.

mod client;
mod encoding;
mod shaper;

pub use client::{ProviderClient, SendOutcome, SmsSender};
pub use encoding::{encode, ContentType, EncodedBody};
pub use shaper::{shape, OutboundRequest};
