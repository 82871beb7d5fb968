//! Request rate gate
//!
//! Bounds the aggregate request rate of every fetcher of a listing to the
//! per-account quota of the remote API.
//!
//! # Features
//!
//! - **Shared quota**: one gate is shared by all concurrent fetchers (and may
//!   be shared by several listers bound to the same account)
//! - **Cancellable waits**: a cancelled token ends a wait without consuming quota
//! - **Injectable delay**: the wait primitive is a [`Sleeper`], so tests can
//!   simulate time instead of waiting on the wall clock

mod gate;

pub use gate::{RateGate, Sleeper, TokioSleeper};
