//! Catalog REST client.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode, header, multipart};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::dto::{DeleteReceiptDto, ErrorEnvelope, PageDto, UploadReceiptDto, UserDto};
use crate::domain::entities::{
    DeleteReceipt, ImageId, ImageMeta, ImagePage, ImagePatch, UploadReceipt, UserProfile,
};
use crate::domain::errors::ApiError;
use crate::domain::ports::{AuthPort, CatalogPort, OAuthProvider};
use crate::domain::query::{PageSize, QueryKey};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP adapter for the catalog and auth REST surfaces.
pub struct CatalogHttpClient {
    http: Client,
    base_url: String,
    session_cookie: Option<String>,
}

impl CatalogHttpClient {
    /// Creates a client for the service at `base_url`.
    ///
    /// The session cookie, when present, is attached to every request; it
    /// is the product of the browser OAuth dance.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(
        base_url: impl Into<String>,
        session_cookie: Option<String>,
    ) -> Result<Self, ApiError> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .cookie_store(true)
            .build()
            .map_err(|e| ApiError::transient(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            session_cookie,
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let mut builder = self.http.request(method, url);
        if let Some(cookie) = &self.session_cookie {
            builder = builder.header(header::COOKIE, cookie.clone());
        }
        builder
    }

    async fn send_json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, ApiError> {
        let response = builder.send().await.map_err(map_transport)?;
        let status = response.status();
        if !status.is_success() {
            return Err(error_from_response(status, response).await);
        }
        response
            .json()
            .await
            .map_err(|e| ApiError::transient(format!("malformed response: {e}")))
    }

    async fn send_bytes(&self, builder: RequestBuilder) -> Result<Bytes, ApiError> {
        let response = builder.send().await.map_err(map_transport)?;
        let status = response.status();
        if !status.is_success() {
            return Err(error_from_response(status, response).await);
        }
        response
            .bytes()
            .await
            .map_err(|e| ApiError::transient(format!("failed to read body: {e}")))
    }

    /// Requests the page identified by `key`. The key's canonical form is
    /// the request path, so what the cache stores under and what goes on
    /// the wire can never drift apart.
    async fn fetch_page(&self, key: &QueryKey) -> Result<ImagePage, ApiError> {
        debug!(key = %key, "fetching page");
        let dto: PageDto = self.send_json(self.request(Method::GET, &key.to_string())).await?;
        Ok(dto.into())
    }
}

fn map_transport(e: reqwest::Error) -> ApiError {
    if e.is_timeout() {
        ApiError::transient("request timed out")
    } else if e.is_connect() {
        ApiError::transient("failed to connect to the catalog service")
    } else {
        ApiError::transient(e.to_string())
    }
}

async fn error_from_response(status: StatusCode, response: Response) -> ApiError {
    let envelope = response.json::<ErrorEnvelope>().await.ok();
    let message = envelope
        .as_ref()
        .map_or_else(|| format!("HTTP {status}"), ErrorEnvelope::message);

    if status.is_client_error() {
        if envelope.as_ref().is_some_and(ErrorEnvelope::is_validation) {
            ApiError::validation(message)
        } else {
            ApiError::client(status.as_u16(), message)
        }
    } else {
        ApiError::transient(message)
    }
}

fn mime_for(file_name: &str) -> &'static str {
    match file_name.rsplit_once('.').map(|(_, ext)| ext.to_ascii_lowercase()) {
        Some(ext) if ext == "png" => "image/png",
        Some(ext) if ext == "jpg" || ext == "jpeg" => "image/jpeg",
        Some(ext) if ext == "gif" => "image/gif",
        Some(ext) if ext == "webp" => "image/webp",
        Some(ext) if ext == "bmp" => "image/bmp",
        Some(ext) if ext == "tiff" => "image/tiff",
        _ => "application/octet-stream",
    }
}

#[async_trait]
impl CatalogPort for CatalogHttpClient {
    async fn list(&self, page: u32, page_size: u16) -> Result<ImagePage, ApiError> {
        self.fetch_page(&QueryKey::List { page, size: PageSize::snap(page_size) }).await
    }

    async fn search(
        &self,
        query: &str,
        page: u32,
        page_size: u16,
    ) -> Result<ImagePage, ApiError> {
        self.fetch_page(&QueryKey::Search {
            query: query.to_owned(),
            page,
            size: PageSize::snap(page_size),
        })
        .await
    }

    async fn similar(
        &self,
        image_id: &ImageId,
        page: u32,
        page_size: u16,
    ) -> Result<ImagePage, ApiError> {
        self.fetch_page(&QueryKey::Similar {
            image_id: image_id.clone(),
            page,
            size: PageSize::snap(page_size),
        })
        .await
    }

    async fn upload(&self, file_name: &str, bytes: Bytes) -> Result<UploadReceipt, ApiError> {
        debug!(file = %file_name, size = bytes.len(), "uploading");

        let part = multipart::Part::bytes(bytes.to_vec())
            .file_name(file_name.to_owned())
            .mime_str(mime_for(file_name))
            .map_err(|e| ApiError::transient(format!("invalid mime type: {e}")))?;
        let form = multipart::Form::new().part("file", part);

        let dto: UploadReceiptDto = self
            .send_json(self.request(Method::POST, "/images/").multipart(form))
            .await?;
        Ok(dto.into())
    }

    async fn update(
        &self,
        image_id: &ImageId,
        patch: ImagePatch,
    ) -> Result<ImageMeta, ApiError> {
        let mut body = serde_json::Map::new();
        if let Some(name) = patch.name {
            body.insert("name".to_owned(), serde_json::Value::String(name));
        }
        if let Some(tags) = patch.tags {
            body.insert(
                "tags".to_owned(),
                serde_json::Value::Array(
                    tags.into_iter().map(serde_json::Value::String).collect(),
                ),
            );
        }

        let dto: super::dto::ImageMetaDto = self
            .send_json(
                self.request(Method::PATCH, &format!("/images/{image_id}"))
                    .json(&body),
            )
            .await?;
        Ok(dto.into_meta())
    }

    async fn delete(&self, image_id: &ImageId) -> Result<DeleteReceipt, ApiError> {
        let dto: DeleteReceiptDto = self
            .send_json(self.request(Method::DELETE, &format!("/images/{image_id}")))
            .await?;
        Ok(dto.into())
    }

    async fn thumbnail(&self, image_id: &ImageId) -> Result<Bytes, ApiError> {
        self.send_bytes(self.request(Method::GET, &format!("/images/{image_id}/thumb")))
            .await
    }

    async fn full_image(&self, image_id: &ImageId) -> Result<Bytes, ApiError> {
        self.send_bytes(self.request(Method::GET, &format!("/images/{image_id}/")))
            .await
    }
}

#[async_trait]
impl AuthPort for CatalogHttpClient {
    async fn current_user(&self) -> Result<Option<UserProfile>, ApiError> {
        let response = self
            .request(Method::GET, "/auth/me")
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "session check failed to reach the service");
                map_transport(e)
            })?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            // No session is a normal state, not an error.
            return Ok(None);
        }
        if !status.is_success() {
            return Err(error_from_response(status, response).await);
        }

        let dto: UserDto = response
            .json()
            .await
            .map_err(|e| ApiError::transient(format!("malformed session response: {e}")))?;
        Ok(Some(dto.into()))
    }

    async fn logout(&self) -> Result<(), ApiError> {
        let response = self
            .request(Method::POST, "/auth/logout")
            .send()
            .await
            .map_err(map_transport)?;
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(error_from_response(status, response).await)
        }
    }

    fn login_url(&self, provider: OAuthProvider) -> String {
        format!("{}/auth/{provider}/login", self.base_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = CatalogHttpClient::new("http://localhost:8000/", None);
        assert!(client.is_ok());
    }

    #[test]
    fn test_login_url_strips_trailing_slash() {
        let client = CatalogHttpClient::new("http://localhost:8000/", None).unwrap();
        assert_eq!(
            client.login_url(OAuthProvider::Google),
            "http://localhost:8000/auth/google/login"
        );
        assert_eq!(
            client.login_url(OAuthProvider::Github),
            "http://localhost:8000/auth/github/login"
        );
    }

    #[test]
    fn test_mime_for_common_extensions() {
        assert_eq!(mime_for("a.PNG"), "image/png");
        assert_eq!(mime_for("b.jpeg"), "image/jpeg");
        assert_eq!(mime_for("weird"), "application/octet-stream");
    }
}
