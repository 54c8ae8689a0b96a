//! Request helpers shared by both backends.

use crate::error::ClientError;

/// Ensure the response has a success status code. Returns the response
/// unchanged on success, or a [`ClientError::Api`] containing the status
/// and body text on failure.
pub(crate) async fn ensure_success(
    response: reqwest::Response,
) -> Result<reqwest::Response, ClientError> {
    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<unreadable body>".to_string());
        return Err(ClientError::Api {
            status: status.as_u16(),
            body,
        });
    }
    Ok(response)
}

/// `base` with each of `segments` appended as one percent-encoded path
/// segment. Empty and dot segments are refused; the URL parser would
/// otherwise drop or resolve them.
pub(crate) fn segment_url(base: &str, segments: &[&str]) -> Result<reqwest::Url, ClientError> {
    if let Some(bad) = segments
        .iter()
        .find(|s| matches!(**s, "" | "." | ".."))
    {
        return Err(ClientError::InvalidSegment((*bad).to_string()));
    }

    let mut url = reqwest::Url::parse(base)
        .map_err(|e| ClientError::Config(format!("invalid API URL '{base}': {e}")))?;
    url.path_segments_mut()
        .map_err(|_| ClientError::Config(format!("API URL '{base}' cannot take a path")))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}
