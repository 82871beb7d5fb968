//! `verifyUser` call

use super::types::{Credentials, Session};
use crate::error::{Error, Result};
use crate::http::ApiClientConfig;
use crate::models::lenient_i64;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::{debug, info};

#[derive(Debug, Deserialize)]
struct VerifiedUser {
    #[serde(rename = "sessionKey", default)]
    session_key: String,
    #[serde(rename = "sessionLength", default, deserialize_with = "lenient_i64")]
    session_length: i64,
}

/// Open a session for the given credentials
pub async fn verify_user(config: &ApiClientConfig, credentials: &Credentials) -> Result<Session> {
    if credentials.client_code.is_empty() {
        return Err(Error::missing_field("client_code"));
    }
    if credentials.username.is_empty() {
        return Err(Error::missing_field("username"));
    }

    let client = config.build_http()?;
    let mut form = HashMap::new();
    form.insert("username".to_string(), credentials.username.clone());
    form.insert("password".to_string(), credentials.password.clone());

    debug!(client_code = %credentials.client_code, "Verifying user");
    let response = crate::http::post_form::<VerifiedUser>(
        &client,
        config,
        &credentials.client_code,
        "verifyUser",
        form,
    )
    .await
    .map_err(|e| match e {
        Error::Api { code, .. } => Error::auth(format!("verifyUser rejected with code {code}")),
        other => other,
    })?;

    let user = response
        .records
        .into_iter()
        .next()
        .filter(|u| !u.session_key.is_empty())
        .ok_or_else(|| Error::auth("verifyUser returned no session key"))?;

    info!(client_code = %credentials.client_code, "Session established");
    Ok(Session {
        client_code: credentials.client_code.clone(),
        session_key: user.session_key,
        session_length: u64::try_from(user.session_length).ok().filter(|l| *l > 0),
    })
}
