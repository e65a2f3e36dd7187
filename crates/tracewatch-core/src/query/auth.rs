//! Ambient credential resolution via the GCE instance metadata server

use serde::Deserialize;

use crate::error::{Error, Result};

/// Default token endpoint of the instance metadata server
pub(crate) const METADATA_TOKEN_URL: &str =
    "http://metadata.google.internal/computeMetadata/v1/instance/service-accounts/default/token";

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Fetch an access token for the instance's default service account.
///
/// Requires the `Metadata-Flavor: Google` header; anything else the metadata
/// server refuses. Failures surface as [`Error::Init`] so the orchestrator
/// aborts instead of proceeding with an unusable client.
pub(crate) async fn fetch_access_token(http: &reqwest::Client, token_url: &str) -> Result<String> {
    let response = http
        .get(token_url)
        .header("Metadata-Flavor", "Google")
        .send()
        .await
        .map_err(|e| Error::init(format!("metadata server unreachable: {e}")))?;

    if !response.status().is_success() {
        return Err(Error::init(format!(
            "metadata server returned {}",
            response.status()
        )));
    }

    let token: TokenResponse = response
        .json()
        .await
        .map_err(|e| Error::init(format!("malformed token response: {e}")))?;

    Ok(token.access_token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn fetches_token_with_metadata_header() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/token"))
            .and(header("Metadata-Flavor", "Google"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "ya29.test-token",
                "expires_in": 3599,
                "token_type": "Bearer"
            })))
            .mount(&server)
            .await;

        let http = reqwest::Client::new();
        let token = fetch_access_token(&http, &format!("{}/token", server.uri()))
            .await
            .unwrap();
        assert_eq!(token, "ya29.test-token");
    }

    #[tokio::test]
    async fn non_success_status_is_an_init_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let http = reqwest::Client::new();
        let err = fetch_access_token(&http, &format!("{}/token", server.uri()))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Init(_)));
    }
}
