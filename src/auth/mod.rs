//! Session acquisition
//!
//! Exchanges account credentials for a session key through the remote
//! `verifyUser` call. The session is then handed to [`crate::http::ApiClient`],
//! which attaches it to every request.

mod session;
mod types;

pub use session::verify_user;
pub use types::{Credentials, Session};
