use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufReadExt, BufReader};
use url::Url;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("unexpected status code {status}: {reason}")]
    HttpStatus { status: u16, reason: String },
    #[error("invalid API url: {0}")]
    Url(#[from] url::ParseError),
    #[error("failed to read confirmation: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Serialize)]
struct RequestTokenRequest<'a> {
    consumer_key: &'a str,
    redirect_uri: &'a str,
}

#[derive(Debug, Deserialize)]
struct RequestTokenResponse {
    code: String,
}

#[derive(Debug, Serialize)]
struct AccessTokenRequest<'a> {
    consumer_key: &'a str,
    code: &'a str,
}

/// Credentials returned once the user approved the request token.
#[derive(Debug, Clone, Deserialize)]
pub struct Credentials {
    pub access_token: String,
    #[serde(default)]
    pub username: Option<String>,
}

/// Pocket's three-legged OAuth flow.
pub struct Authorizer {
    client: Client,
    base_url: Url,
    consumer_key: String,
    redirect_uri: String,
}

impl Authorizer {
    pub fn new(base_url: &str, consumer_key: String, redirect_uri: String) -> Result<Self, AuthError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("pocket-mirror/1.0")
            .build()?;
        Ok(Self {
            client,
            base_url: Url::parse(base_url)?,
            consumer_key,
            redirect_uri,
        })
    }

    pub async fn request_token(&self) -> Result<String, AuthError> {
        let request = RequestTokenRequest {
            consumer_key: &self.consumer_key,
            redirect_uri: &self.redirect_uri,
        };
        let response: RequestTokenResponse = self.post("v3/oauth/request", &request).await?;
        Ok(response.code)
    }

    /// Page the user must visit to approve `code`.
    pub fn authorize_url(&self, code: &str) -> Result<Url, AuthError> {
        let url = format!(
            "{}auth/authorize?request_token={}&redirect_uri={}",
            self.base_url,
            urlencoding::encode(code),
            urlencoding::encode(&self.redirect_uri)
        );
        Ok(Url::parse(&url)?)
    }

    pub async fn access_token(&self, code: &str) -> Result<Credentials, AuthError> {
        let request = AccessTokenRequest {
            consumer_key: &self.consumer_key,
            code,
        };
        self.post("v3/oauth/authorize", &request).await
    }

    /// Runs the whole flow, waiting on stdin while the user approves access
    /// in the browser.
    pub async fn authorize_interactive(&self) -> Result<Credentials, AuthError> {
        let code = self.request_token().await?;
        let url = self.authorize_url(&code)?;

        println!("Go to this URL to authorize the app:\n{url}");
        if let Err(e) = open::that(url.as_str()) {
            tracing::debug!("Failed to open browser: {}", e);
        }
        println!("Press Enter after you've authorized the app...");

        let mut line = String::new();
        BufReader::new(tokio::io::stdin()).read_line(&mut line).await?;

        self.access_token(&code).await
    }

    async fn post<B, R>(&self, path: &str, body: &B) -> Result<R, AuthError>
    where
        B: Serialize + ?Sized,
        R: for<'de> Deserialize<'de>,
    {
        let response = self
            .client
            .post(self.base_url.join(path)?)
            .header("X-Accept", "application/json")
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let reason = response
                .headers()
                .get("X-Error")
                .and_then(|v| v.to_str().ok())
                .unwrap_or("")
                .to_string();
            return Err(AuthError::HttpStatus {
                status: status.as_u16(),
                reason,
            });
        }

        Ok(response.json().await?)
    }
}
