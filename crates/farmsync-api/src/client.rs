// PestScout HTTP client
//
// Wraps `reqwest::Client` with base-URL joining, bearer-token injection,
// and status/JSON handling. Endpoint groups live in sibling modules as
// inherent methods so this file stays focused on transport mechanics.

use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tokio::sync::RwLock;
use tracing::{debug, trace};
use url::Url;

use crate::auth::{Credentials, TokenPair};
use crate::error::Error;
use crate::models::{LoginRequest, LoginResponse};
use crate::transport::TransportConfig;

/// Longest body excerpt carried in error messages.
const BODY_PREVIEW: usize = 200;

/// Raw HTTP client for the PestScout API.
///
/// Holds the session token pair after [`login()`](Self::login); every
/// authenticated request sends the access token as a bearer header.
pub struct PestScoutClient {
    http: reqwest::Client,
    base_url: Url,
    tokens: RwLock<Option<TokenPair>>,
}

impl PestScoutClient {
    /// Create a client from a `TransportConfig`.
    ///
    /// `base_url` is the server root (e.g. `https://api.pestscout.app`);
    /// API paths are joined onto it.
    pub fn new(base_url: Url, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self::with_client(http, base_url))
    }

    /// Create a client with a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url) -> Self {
        Self {
            http,
            base_url,
            tokens: RwLock::new(None),
        }
    }

    /// The server base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Install a token pair obtained elsewhere (e.g. a cached session).
    pub async fn set_tokens(&self, tokens: TokenPair) {
        *self.tokens.write().await = Some(tokens);
    }

    // ── Session exchange ─────────────────────────────────────────────

    /// Exchange email/password for a token pair.
    ///
    /// `POST /api/auth/login`. On success the pair is stored and also
    /// returned so hosts can persist it.
    pub async fn login(&self, credentials: &Credentials) -> Result<TokenPair, Error> {
        let url = self.url("api/auth/login")?;
        debug!(email = %credentials.email, "logging in at {}", url);

        let body = LoginRequest {
            email: &credentials.email,
            password: credentials.password.expose_secret(),
        };
        let resp = self.http.post(url).json(&body).send().await?;
        let tokens = self.session_from_response(resp).await?;

        debug!("login successful");
        Ok(tokens)
    }

    async fn session_from_response(&self, resp: reqwest::Response) -> Result<TokenPair, Error> {
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Authentication {
                message: format!("HTTP {status}: {}", preview(&body)),
            });
        }

        let body = resp.text().await?;
        let parsed: LoginResponse = decode(&body)?;
        let tokens = TokenPair {
            access_token: SecretString::from(parsed.access_token),
            refresh_token: SecretString::from(parsed.refresh_token),
        };
        *self.tokens.write().await = Some(tokens.clone());
        Ok(tokens)
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// Join an API path onto the base URL.
    pub(crate) fn url(&self, path: &str) -> Result<Url, Error> {
        let base = self.base_url.as_str().trim_end_matches('/');
        let path = path.trim_start_matches('/');
        Ok(Url::parse(&format!("{base}/{path}"))?)
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// Send an authenticated GET and decode the JSON body.
    pub(crate) async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T, Error> {
        debug!("GET {}", url);
        let builder = self.authorize(self.http.get(url)).await?;
        let resp = builder.send().await?;
        parse_response(resp).await
    }

    async fn authorize(
        &self,
        builder: reqwest::RequestBuilder,
    ) -> Result<reqwest::RequestBuilder, Error> {
        let guard = self.tokens.read().await;
        let tokens = guard.as_ref().ok_or(Error::NotAuthenticated)?;
        Ok(builder.bearer_auth(tokens.access_token.expose_secret()))
    }
}

/// Map status codes to errors, then decode the JSON body.
async fn parse_response<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, Error> {
    let status = resp.status();
    trace!(%status, "response received");

    if status == reqwest::StatusCode::UNAUTHORIZED {
        return Err(Error::Authentication {
            message: "access token expired or invalid".into(),
        });
    }

    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(Error::Api {
            status: status.as_u16(),
            message: preview(&body).to_owned(),
        });
    }

    let body = resp.text().await?;
    decode(&body)
}

fn decode<T: DeserializeOwned>(body: &str) -> Result<T, Error> {
    serde_json::from_str(body).map_err(|e| Error::Deserialization {
        message: format!("{e} (body preview: {:?})", preview(body)),
        body: body.to_owned(),
    })
}

fn preview(body: &str) -> &str {
    let mut end = body.len().min(BODY_PREVIEW);
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    &body[..end]
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn url_joins_without_double_slashes() {
        let client = PestScoutClient::with_client(
            reqwest::Client::new(),
            Url::parse("https://api.example.com/").unwrap(),
        );
        assert_eq!(
            client.url("/api/farms").unwrap().as_str(),
            "https://api.example.com/api/farms"
        );
    }

    #[test]
    fn url_keeps_base_path_prefix() {
        let client = PestScoutClient::with_client(
            reqwest::Client::new(),
            Url::parse("https://example.com/pestscout").unwrap(),
        );
        assert_eq!(
            client.url("api/farms").unwrap().as_str(),
            "https://example.com/pestscout/api/farms"
        );
    }

    #[test]
    fn preview_respects_char_boundaries() {
        let body = "é".repeat(150);
        let cut = preview(&body);
        assert!(cut.len() <= BODY_PREVIEW);
        assert!(body.starts_with(cut));
    }
}
