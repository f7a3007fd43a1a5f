//! Inbound webhook boundary.
//!
//! The verification service can push session events to a URL we host.
//! Every delivery is checked before it is trusted:
//! - the HMAC-SHA256 signature over the raw body, when a secret is set
//! - the payload shape
//! - optionally, the event's age
//!
//! Accepted events are fanned out to subscribers over a broadcast channel.

pub mod error;
pub mod event;
pub mod server;
pub mod signature;

pub use error::WebhookError;
pub use event::{EventData, WebhookEvent};
pub use server::{router, WebhookServer, WebhookState, SIGNATURE_HEADER};
pub use signature::WebhookVerifier;
