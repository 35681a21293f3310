use crate::utils::error::{ReleaseError, Result};
use reqwest::{Client, Response};
use std::time::Duration;

pub fn build_client(timeout: Duration) -> Result<Client> {
    let client = Client::builder()
        .timeout(timeout)
        .connect_timeout(timeout)
        .build()?;
    Ok(client)
}

/// Base URLs are stored without a trailing slash so paths can be appended with `/`.
pub fn normalize_base_url(base_url: &str) -> String {
    base_url.trim_end_matches('/').to_string()
}

/// Turns a timed-out request into `Timeout`, everything else into `Http`.
pub fn request_error(operation: &str, timeout: Duration, e: reqwest::Error) -> ReleaseError {
    if e.is_timeout() {
        ReleaseError::Timeout {
            operation: operation.to_string(),
            seconds: timeout.as_secs(),
        }
    } else {
        ReleaseError::Http(e)
    }
}

pub async fn ensure_success(service: &str, response: Response) -> Result<Response> {
    let status = response.status();
    tracing::debug!("{} response status: {}", service, status);

    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(ReleaseError::ExternalService {
        service: service.to_string(),
        status: status.as_u16(),
        message: body,
    })
}
