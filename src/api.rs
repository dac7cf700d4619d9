//! Story server endpoints consumed by the client.
//!
//! | Endpoint    | Method | Response                      |
//! |-------------|--------|-------------------------------|
//! | image-check | GET    | `{ image?: string or falsy }` |
//! | snapshot    | GET    | `{ success, data?: opaque }`  |
//! | restore     | POST   | `{ success }`                 |

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::config::Endpoints;
use crate::error::ClientError;
use crate::platform::Transport;
use crate::saves::SaveRecord;

/// Result of one image-check round trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageCheck {
    Ready(String),
    Pending,
}

#[derive(Debug, Deserialize)]
struct ImageCheckBody {
    /// Any falsy or non-string value means the image is not ready.
    #[serde(default)]
    image: Option<Value>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SnapshotBody {
    #[serde(default)]
    success: bool,
    /// `None` only when the key is missing; `data: null` is a valid snapshot.
    #[serde(default, deserialize_with = "present")]
    data: Option<Value>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RestoreBody {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    error: Option<String>,
}

fn present<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Value>, D::Error> {
    Value::deserialize(deserializer).map(Some)
}

/// Typed access to the story server.
pub struct ApiClient<T> {
    transport: T,
    endpoints: Endpoints,
}

impl<T: Transport> ApiClient<T> {
    pub fn new(transport: T, endpoints: Endpoints) -> Self {
        Self {
            transport,
            endpoints,
        }
    }

    /// Ask whether the pending image has been generated.
    pub async fn check_image(&self) -> Result<ImageCheck, ClientError> {
        let raw = self.transport.get(&self.endpoints.image_check, true).await?;
        let body: ImageCheckBody = parse(&raw)?;
        if let Some(err) = body.error.as_deref() {
            tracing::debug!(error = err, "image check reported a server-side error");
        }
        match body.image {
            Some(Value::String(url)) if !url.trim().is_empty() => Ok(ImageCheck::Ready(url)),
            _ => Ok(ImageCheck::Pending),
        }
    }

    /// Fetch an opaque snapshot of the current server-side session.
    pub async fn snapshot(&self) -> Result<Value, ClientError> {
        let raw = self.transport.get(&self.endpoints.snapshot, false).await?;
        let body: SnapshotBody = parse(&raw)?;
        match (body.success, body.data) {
            (true, Some(data)) => Ok(data),
            (true, None) => Err(ClientError::SnapshotError("snapshot carried no data".into())),
            (false, _) => Err(ClientError::SnapshotError(
                body.error.unwrap_or_else(|| "server reported failure".into()),
            )),
        }
    }

    /// Hand a stored record back to the server so it replaces the session state.
    pub async fn restore(&self, record: &SaveRecord) -> Result<(), ClientError> {
        let payload = serde_json::to_string(record)
            .map_err(|e| ClientError::RestoreError(format!("could not encode save: {}", e)))?;
        let raw = self
            .transport
            .post_json(&self.endpoints.restore, payload)
            .await?;
        let body: RestoreBody = parse(&raw)?;
        if body.success {
            Ok(())
        } else {
            Err(ClientError::RestoreError(
                body.error.unwrap_or_else(|| "server reported failure".into()),
            ))
        }
    }
}

fn parse<'a, B: Deserialize<'a>>(raw: &'a str) -> Result<B, ClientError> {
    serde_json::from_str(raw).map_err(|e| ClientError::MalformedResponse(e.to_string()))
}
