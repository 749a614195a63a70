// ── Remote source ──
//
// The authoritative full farm list. One call per fetch: no retry, no
// pagination, all-or-nothing.

use std::future::Future;
use std::sync::Arc;

use farmsync_api::{Credentials, FarmDto, PestScoutClient, TlsMode, TokenPair, TransportConfig};
use tracing::{debug, info};

use crate::config::{AuthCredentials, SyncConfig, TlsVerification};
use crate::error::{CoreError, NetworkError};

/// Fetches the complete farm set from wherever the truth lives.
pub trait RemoteSource: Send + Sync + 'static {
    fn fetch_all(&self) -> impl Future<Output = Result<Vec<FarmDto>, NetworkError>> + Send;
}

impl<T: RemoteSource> RemoteSource for Arc<T> {
    fn fetch_all(&self) -> impl Future<Output = Result<Vec<FarmDto>, NetworkError>> + Send {
        (**self).fetch_all()
    }
}

/// [`RemoteSource`] backed by the PestScout REST API.
pub struct HttpRemote {
    client: PestScoutClient,
}

impl HttpRemote {
    pub fn new(client: PestScoutClient) -> Self {
        Self { client }
    }

    /// Build the HTTP client from `config` and establish a session.
    ///
    /// `Tokens` are installed as-is; `Login` performs the email/password
    /// exchange up front so bad credentials fail here, not on first refresh.
    pub async fn connect(config: &SyncConfig) -> Result<Self, CoreError> {
        let transport = TransportConfig {
            tls: tls_mode(&config.tls),
            timeout: config.timeout,
        };
        let client = PestScoutClient::new(config.url.clone(), &transport)?;

        match &config.auth {
            AuthCredentials::None => {
                debug!("connecting without credentials");
            }
            AuthCredentials::Tokens {
                access_token,
                refresh_token,
            } => {
                client
                    .set_tokens(TokenPair {
                        access_token: access_token.clone(),
                        refresh_token: refresh_token.clone(),
                    })
                    .await;
                debug!("using configured token pair");
            }
            AuthCredentials::Login { email, password } => {
                client
                    .login(&Credentials {
                        email: email.clone(),
                        password: password.clone(),
                    })
                    .await?;
                info!(%email, "logged in");
            }
        }

        Ok(Self { client })
    }

    pub fn client(&self) -> &PestScoutClient {
        &self.client
    }
}

impl RemoteSource for HttpRemote {
    async fn fetch_all(&self) -> Result<Vec<FarmDto>, NetworkError> {
        let farms = self.client.list_farms().await?;
        debug!(farms = farms.len(), "fetched remote farm list");
        Ok(farms)
    }
}

fn tls_mode(tls: &TlsVerification) -> TlsMode {
    match tls {
        TlsVerification::SystemDefaults => TlsMode::System,
        TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
        TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
    }
}
