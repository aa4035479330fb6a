use std::time::Duration;

use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;

use crate::error::{Error, Result};

const USER_AGENT: &str = concat!("wxdash/", env!("CARGO_PKG_VERSION"));

/// Shared HTTP client for every upstream the dashboard talks to.
pub fn client(timeout: Duration) -> Result<Client> {
    Ok(Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .build()?)
}

/// Sends `request` and decodes a JSON body. `label` is what gets reported
/// on a non-success status, so it must not carry credentials.
pub(crate) async fn get_json<T: DeserializeOwned>(request: RequestBuilder, label: &str) -> Result<T> {
    let response = request.send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(Error::Status {
            url: label.to_string(),
            status,
        });
    }
    Ok(response.json().await?)
}
