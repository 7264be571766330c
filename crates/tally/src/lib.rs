//! Tally - per-user calculator sessions.
//!
//! Wires the [`tally_calc::Calculator`] state machine into a
//! [`tally_session::SessionStore`]: one calculator per session key, read,
//! mutated and written back on every token, expiring after a period of
//! inactivity. The API is transport-neutral; a chat front end only has to
//! derive a [`SessionKey`] and render the returned display text.

mod error;
mod sessions;

pub use error::{Result, SessionError};
pub use sessions::{CalculatorSessions, Payload, SessionKey, route_token};
