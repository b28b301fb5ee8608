//! Spotify track lookups.
//!
//! Two providers implement [`TrackMetadataProvider`]:
//! - [`SpotifyApiClient`] performs the client-credentials exchange itself over `ureq`.
//! - `ManagedSpotifyClient` (feature `managed-client`) delegates auth and lookups to `rspotify`.
//!
//! [`select_provider`] picks one at startup.

use anyhow::{Context, Result, bail};
use base64::Engine;
use serde::Deserialize;

use crate::config::SpotifyConfig;
use crate::enrich::{TrackMetadata, TrackMetadataProvider};

const DEFAULT_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
const DEFAULT_API_BASE_URL: &str = "https://api.spotify.com/v1";
const CLIENT_ID_ENV: &str = "SPOTIFY_CLIENT_ID";
const CLIENT_SECRET_ENV: &str = "SPOTIFY_CLIENT_SECRET";
const ERROR_SNIPPET_CHARS: usize = 300;

/// Client id and secret for the client-credentials grant.
#[derive(Clone)]
pub struct ClientCredentials {
    pub client_id: String,
    pub client_secret: String,
}

impl ClientCredentials {
    /// Read `SPOTIFY_CLIENT_ID` / `SPOTIFY_CLIENT_SECRET`; `None` unless both are set.
    pub fn from_env() -> Option<Self> {
        let client_id = std::env::var(CLIENT_ID_ENV).ok().filter(|v| !v.is_empty())?;
        let client_secret = std::env::var(CLIENT_SECRET_ENV)
            .ok()
            .filter(|v| !v.is_empty())?;
        Some(Self {
            client_id,
            client_secret,
        })
    }

    /// `Authorization` header value for the token request.
    pub fn basic_auth_header(&self) -> String {
        let raw = format!("{}:{}", self.client_id, self.client_secret);
        format!(
            "Basic {}",
            base64::engine::general_purpose::STANDARD.encode(raw)
        )
    }
}

impl std::fmt::Debug for ClientCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct TrackResponse {
    name: String,
    artists: Vec<ArtistResponse>,
    external_urls: ExternalUrls,
}

#[derive(Debug, Deserialize)]
struct ArtistResponse {
    name: String,
}

#[derive(Debug, Deserialize)]
struct ExternalUrls {
    spotify: String,
}

impl From<TrackResponse> for TrackMetadata {
    fn from(track: TrackResponse) -> Self {
        TrackMetadata {
            title: track.name,
            artists: track.artists.into_iter().map(|a| a.name).collect(),
            spotify_url: track.external_urls.spotify,
        }
    }
}

/// Direct Web API client using the client-credentials grant.
///
/// A fresh token is requested for every lookup; there are no retries.
pub struct SpotifyApiClient {
    token_url: String,
    api_base_url: String,
    credentials: Option<ClientCredentials>,
    agent: ureq::Agent,
}

impl SpotifyApiClient {
    pub fn new(cfg: &SpotifyConfig, credentials: Option<ClientCredentials>) -> Self {
        Self::with_proxy(cfg, credentials, ureq::Proxy::try_from_env())
    }

    fn with_proxy(
        cfg: &SpotifyConfig,
        credentials: Option<ClientCredentials>,
        proxy: Option<ureq::Proxy>,
    ) -> Self {
        let token_url = cfg
            .token_url
            .as_deref()
            .unwrap_or(DEFAULT_TOKEN_URL)
            .to_string();
        let api_base_url = cfg
            .api_base_url
            .as_deref()
            .unwrap_or(DEFAULT_API_BASE_URL)
            .trim_end_matches('/')
            .to_string();
        let config = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .proxy(proxy)
            .build();
        Self {
            token_url,
            api_base_url,
            credentials,
            agent: ureq::Agent::new_with_config(config),
        }
    }

    /// Exchange client credentials for a bearer token.
    pub fn request_token(&self) -> Result<String> {
        let mut request = self.agent.post(&self.token_url);
        if let Some(credentials) = self.credentials.as_ref() {
            request = request.header("Authorization", credentials.basic_auth_header());
        }
        let resp = match request.send_form([("grant_type", "client_credentials")]) {
            Ok(resp) => resp,
            Err(err) => bail!("token request failed (transport) url={}: {err}", self.token_url),
        };
        let body = read_success_body(resp, "token", &self.token_url)?;
        let token: TokenResponse =
            serde_json::from_str(&body).context("token response parse failed")?;
        Ok(token.access_token)
    }

    /// Fetch one track with an already issued token.
    pub fn request_track(&self, token: &str, track_id: &str) -> Result<TrackMetadata> {
        let url = format!("{}/tracks/{}", self.api_base_url, track_id);
        let resp = match self
            .agent
            .get(&url)
            .header("Authorization", format!("Bearer {token}"))
            .call()
        {
            Ok(resp) => resp,
            Err(err) => bail!("track request failed (transport) url={url}: {err}"),
        };
        let body = read_success_body(resp, "track", &url)?;
        let track: TrackResponse =
            serde_json::from_str(&body).context("track response parse failed")?;
        Ok(track.into())
    }
}

impl TrackMetadataProvider for SpotifyApiClient {
    fn name(&self) -> &'static str {
        "spotify-api"
    }

    fn fetch_track(&self, track_id: &str) -> Result<TrackMetadata> {
        let token = self.request_token()?;
        self.request_track(&token, track_id)
    }
}

fn read_success_body(
    mut resp: ureq::http::Response<ureq::Body>,
    label: &str,
    url: &str,
) -> Result<String> {
    let code = resp.status();
    let body = resp
        .body_mut()
        .read_to_string()
        .with_context(|| format!("{label} response read failed"));
    if !code.is_success() {
        let body = body.unwrap_or_default();
        let trimmed = body.trim();
        if trimmed.is_empty() {
            bail!("{label} request failed (status {code}) url={url}");
        }
        let snippet: String = trimmed.chars().take(ERROR_SNIPPET_CHARS).collect();
        let suffix = if trimmed.chars().count() > ERROR_SNIPPET_CHARS {
            "..."
        } else {
            ""
        };
        bail!("{label} request failed (status {code}) url={url}: {snippet}{suffix}");
    }
    body
}

#[cfg(feature = "managed-client")]
pub use managed::ManagedSpotifyClient;

#[cfg(feature = "managed-client")]
mod managed {
    use anyhow::{Context, Result, anyhow};
    use rspotify::model::TrackId;
    use rspotify::prelude::*;
    use rspotify::{ClientCredsSpotify, Credentials};

    use crate::enrich::{TrackMetadata, TrackMetadataProvider};

    /// `rspotify` client; reads `RSPOTIFY_CLIENT_ID` / `RSPOTIFY_CLIENT_SECRET`.
    pub struct ManagedSpotifyClient {
        spotify: ClientCredsSpotify,
    }

    impl ManagedSpotifyClient {
        /// Returns `None` when the rspotify credentials are not in the environment.
        pub fn from_env() -> Option<Self> {
            let creds = Credentials::from_env()?;
            Some(Self {
                spotify: ClientCredsSpotify::new(creds),
            })
        }
    }

    impl TrackMetadataProvider for ManagedSpotifyClient {
        fn name(&self) -> &'static str {
            "rspotify"
        }

        fn fetch_track(&self, track_id: &str) -> Result<TrackMetadata> {
            self.spotify
                .request_token()
                .context("rspotify token request failed")?;
            let id = TrackId::from_id(track_id)
                .map_err(|err| anyhow!("invalid track id {track_id}: {err}"))?;
            let track = self
                .spotify
                .track(id, None)
                .with_context(|| format!("rspotify track lookup failed for {track_id}"))?;
            let spotify_url = track
                .external_urls
                .get("spotify")
                .cloned()
                .unwrap_or_default();
            Ok(TrackMetadata {
                title: track.name,
                artists: track.artists.into_iter().map(|a| a.name).collect(),
                spotify_url,
            })
        }
    }
}

/// Choose the lookup strategy for this run.
///
/// The managed client is used when the crate was built with `managed-client` and its
/// credentials are available; otherwise the direct HTTP client handles lookups.
pub fn select_provider(cfg: &SpotifyConfig) -> Box<dyn TrackMetadataProvider> {
    #[cfg(feature = "managed-client")]
    if let Some(client) = ManagedSpotifyClient::from_env() {
        tracing::debug!("using rspotify managed client");
        return Box::new(client);
    }

    let credentials = ClientCredentials::from_env();
    if credentials.is_none() {
        tracing::warn!(
            "{CLIENT_ID_ENV}/{CLIENT_SECRET_ENV} not set; requesting token without client auth"
        );
    }
    Box::new(SpotifyApiClient::new(cfg, credentials))
}
