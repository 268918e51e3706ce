//! Google Cloud Storage note backend
//!
//! Talks to the GCS JSON API directly. Each note is an object named by its id
//! whose content is the JSON-encoded note.

use async_trait::async_trait;
use note_core::{Backend, CreateNoteRequest, Note, NoteError, Result};
use reqwest::{header, Client, StatusCode, Url};
use serde::Deserialize;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, info};

pub const GCS_ENDPOINT: &str = "https://storage.googleapis.com";

const METADATA_TOKEN_URL: &str =
    "http://metadata.google.internal/computeMetadata/v1/instance/service-accounts/default/token";

/// Refresh cached tokens this long before they actually expire
const TOKEN_EXPIRY_MARGIN: Duration = Duration::from_secs(60);

/// How requests are authorized
pub enum GcsAuth {
    /// Emulators accept anonymous requests
    Anonymous,
    /// A fixed bearer token
    Static(String),
    /// Tokens fetched from the GCE metadata server
    Metadata {
        token_url: String,
        cache: Mutex<Option<CachedToken>>,
    },
}

impl GcsAuth {
    /// Tokens from the default GCE metadata endpoint
    pub fn metadata() -> Self {
        Self::metadata_at(METADATA_TOKEN_URL)
    }

    pub fn metadata_at(token_url: impl Into<String>) -> Self {
        GcsAuth::Metadata {
            token_url: token_url.into(),
            cache: Mutex::new(None),
        }
    }
}

pub struct CachedToken {
    token: String,
    expires_at: Instant,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ObjectList {
    #[serde(default)]
    items: Vec<ObjectEntry>,
    next_page_token: Option<String>,
}

#[derive(Deserialize)]
struct ObjectEntry {
    name: String,
}

pub struct GcsBackend {
    client: Client,
    endpoint: Url,
    bucket: String,
    auth: GcsAuth,
}

impl GcsBackend {
    pub fn new(endpoint: &str, bucket: impl Into<String>, auth: GcsAuth) -> Result<Self> {
        let endpoint = Url::parse(endpoint)
            .map_err(|e| NoteError::Config(format!("Invalid GCS endpoint {}: {}", endpoint, e)))?;
        if endpoint.cannot_be_a_base() {
            return Err(NoteError::Config(format!(
                "Invalid GCS endpoint: {}",
                endpoint
            )));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| NoteError::Config(format!("Failed to build HTTP client: {}", e)))?;

        let bucket = bucket.into();
        info!("Using GCS bucket {} at {}", bucket, endpoint);

        Ok(Self {
            client,
            endpoint,
            bucket,
            auth,
        })
    }

    /// Build from settings: an emulator host disables auth, otherwise use the
    /// configured token or the metadata server.
    pub fn from_settings(
        bucket: Option<&str>,
        emulator_host: Option<&str>,
        access_token: Option<&str>,
    ) -> Result<Self> {
        let bucket = bucket.ok_or_else(|| {
            NoteError::Config("BUCKET must be set when using the gcs backend".to_string())
        })?;

        match (emulator_host, access_token) {
            (Some(host), _) => Self::new(host, bucket, GcsAuth::Anonymous),
            (None, Some(token)) => Self::new(GCS_ENDPOINT, bucket, GcsAuth::Static(token.to_string())),
            (None, None) => Self::new(GCS_ENDPOINT, bucket, GcsAuth::metadata()),
        }
    }

    /// `{endpoint}/{prefix...}/b/{bucket}/o[/{object}]`
    fn object_url(&self, prefix: &[&str], object: Option<&str>) -> Url {
        let mut url = self.endpoint.clone();
        {
            // endpoint was checked to be a base URL in `new`
            if let Ok(mut segments) = url.path_segments_mut() {
                segments.pop_if_empty();
                segments.extend(prefix);
                segments.extend(["b", self.bucket.as_str(), "o"]);
                if let Some(object) = object {
                    segments.push(object);
                }
            }
        }
        url
    }

    async fn authorize(&self, request: reqwest::RequestBuilder) -> Result<reqwest::RequestBuilder> {
        match &self.auth {
            GcsAuth::Anonymous => Ok(request),
            GcsAuth::Static(token) => Ok(request.bearer_auth(token)),
            GcsAuth::Metadata { token_url, cache } => {
                let mut cache = cache.lock().await;
                if let Some(cached) = cache.as_ref() {
                    if Instant::now() < cached.expires_at {
                        return Ok(request.bearer_auth(&cached.token));
                    }
                }

                let fresh = self.fetch_metadata_token(token_url).await?;
                let request = request.bearer_auth(&fresh.token);
                *cache = Some(fresh);
                Ok(request)
            }
        }
    }

    async fn fetch_metadata_token(&self, token_url: &str) -> Result<CachedToken> {
        debug!("Fetching access token from metadata server");

        let response = self
            .client
            .get(token_url)
            .header("Metadata-Flavor", "Google")
            .send()
            .await
            .map_err(unavailable)?
            .error_for_status()
            .map_err(unavailable)?;

        let body: TokenResponse = response.json().await.map_err(unavailable)?;
        let lifetime = Duration::from_secs(body.expires_in).saturating_sub(TOKEN_EXPIRY_MARGIN);

        Ok(CachedToken {
            token: body.access_token,
            expires_at: Instant::now() + lifetime,
        })
    }
}

#[async_trait]
impl Backend for GcsBackend {
    async fn get(&self, id: &str) -> Result<Note> {
        let mut url = self.object_url(&["storage", "v1"], Some(id));
        url.query_pairs_mut().append_pair("alt", "media");

        let request = self.authorize(self.client.get(url)).await?;
        let response = request.send().await.map_err(unavailable)?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(NoteError::NotFound(id.to_string()));
        }

        let body = response
            .error_for_status()
            .map_err(unavailable)?
            .bytes()
            .await
            .map_err(unavailable)?;

        Note::decode(id, &body)
    }

    async fn set(&self, id: &str, request: &CreateNoteRequest) -> Result<()> {
        debug!("Uploading note {} to bucket {}", id, self.bucket);

        let payload = Note::new(id, request).encode()?;
        let mut url = self.object_url(&["upload", "storage", "v1"], None);
        url.query_pairs_mut()
            .append_pair("uploadType", "media")
            .append_pair("name", id);

        let upload = self
            .client
            .post(url)
            .header(header::CONTENT_TYPE, "application/json")
            .body(payload);

        self.authorize(upload)
            .await?
            .send()
            .await
            .map_err(unavailable)?
            .error_for_status()
            .map_err(unavailable)?;

        Ok(())
    }

    async fn keys(&self) -> Result<Vec<String>> {
        let mut keys = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut url = self.object_url(&["storage", "v1"], None);
            url.query_pairs_mut().append_pair("fields", "items(name),nextPageToken");
            if let Some(token) = &page_token {
                url.query_pairs_mut().append_pair("pageToken", token);
            }

            let page: ObjectList = self
                .authorize(self.client.get(url))
                .await?
                .send()
                .await
                .map_err(unavailable)?
                .error_for_status()
                .map_err(unavailable)?
                .json()
                .await
                .map_err(unavailable)?;

            keys.extend(page.items.into_iter().map(|item| item.name));

            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        Ok(keys)
    }
}

fn unavailable(e: reqwest::Error) -> NoteError {
    NoteError::BackendUnavailable(format!("GCS error: {}", e))
}
