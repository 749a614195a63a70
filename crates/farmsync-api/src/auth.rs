use secrecy::SecretString;

/// Credentials for the login exchange.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub email: String,
    pub password: SecretString,
}

/// Access/refresh token pair produced by the login exchange.
///
/// Consumed opaquely: the client only sends the access token, as a bearer
/// header. Hosts may persist the refresh token for their own use.
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: SecretString,
    pub refresh_token: SecretString,
}
