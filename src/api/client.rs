use crate::api::ApiError;
use crate::config::ApiConfig;
use crate::invoice::Invoice;
use async_trait::async_trait;
use governor::{DefaultDirectRateLimiter, Jitter, Quota, RateLimiter};
use moka::future::Cache;
use reqwest::multipart::{Form, Part};
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::num::NonZeroU32;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

pub const PDF_MIME: &str = "application/pdf";
pub const INVALID_PDF: &str = "Please select a valid PDF file";

const INVOICES: &str = "/api/Invoice";
const UPLOAD: &str = "/api/Invoice/Upload";
const INVOICE_UPDATE: &str = "/api/invoice";
const CUSTOM_INVOICE: &str = "/api/Invoice/GetCustomInvoice";
const CUSTOM_INVOICE_UPLOAD: &str = "/api/Invoice/UploadCustomInvoice";

/// Operations against the remote invoice store.
///
/// Kept behind a trait so the review workflow can be driven against a mock.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait InvoiceApi: Send + Sync {
    /// `GET /api/Invoice`
    async fn list_invoices(&self) -> Result<Vec<Invoice>, ApiError>;

    /// `GET /api/Invoice/{id}`
    async fn get_invoice(&self, id: &str) -> Result<Invoice, ApiError>;

    /// `PUT /api/invoice/{id}` with the full invoice body
    async fn update_invoice(&self, invoice: &Invoice) -> Result<(), ApiError>;

    /// `POST /api/Invoice/Upload` as multipart field `file`
    async fn upload_invoice(&self, file_name: &str, bytes: Vec<u8>) -> Result<(), ApiError>;

    /// `GET /api/Invoice/GetCustomInvoice/{id}`, the server-rendered output PDF
    async fn get_custom_invoice(&self, id: &str) -> Result<Vec<u8>, ApiError>;

    /// `POST /api/Invoice/UploadCustomInvoice/{id}` as multipart field `file`
    async fn upload_custom_invoice(
        &self,
        id: &str,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<(), ApiError>;

    /// Fetch a document by absolute URL or by path relative to the API base
    async fn fetch_document(&self, url: &str) -> Result<Vec<u8>, ApiError>;
}

/// Accept a file as a PDF when its name says so or its bytes start with the PDF magic
pub fn ensure_pdf(file_name: &str, bytes: &[u8]) -> Result<(), ApiError> {
    let pdf_extension = Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("pdf"))
        .unwrap_or(false);

    if bytes.is_empty() || !(pdf_extension || bytes.starts_with(b"%PDF-")) {
        return Err(ApiError::InvalidUpload(INVALID_PDF.to_string()));
    }
    Ok(())
}

/// reqwest-backed client with client-side rate limiting and a short read cache
#[derive(Debug)]
pub struct InvoiceApiClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
    rate_limiter: Arc<DefaultDirectRateLimiter>,
    cache: Option<Cache<String, Value>>,
}

impl InvoiceApiClient {
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let base_url = config.base_url.trim_end_matches('/').to_string();
        reqwest::Url::parse(&base_url)
            .map_err(|e| ApiError::Client(format!("base_url '{base_url}': {e}")))?;

        let mut builder = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(concat!("invoice-review/", env!("CARGO_PKG_VERSION")));
        if config.accept_invalid_certs {
            warn!("TLS certificate verification disabled for {}", base_url);
            builder = builder.danger_accept_invalid_certs(true);
        }
        let http = builder.build().map_err(|e| ApiError::Client(e.to_string()))?;

        let per_second = NonZeroU32::new(config.requests_per_second).unwrap_or(NonZeroU32::MIN);
        let burst = NonZeroU32::new(config.burst_capacity).unwrap_or(per_second);
        let rate_limiter = Arc::new(RateLimiter::direct(
            Quota::per_second(per_second).allow_burst(burst),
        ));

        let cache = (config.cache_ttl_seconds > 0).then(|| {
            Cache::builder()
                .max_capacity(256)
                .time_to_live(Duration::from_secs(config.cache_ttl_seconds))
                .build()
        });

        Ok(Self {
            http,
            base_url,
            token: config.token.clone().filter(|t| !t.is_empty()),
            rate_limiter,
            cache,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    /// Absolute URL for `prefix` with `id` appended as one percent-encoded segment
    fn id_endpoint(&self, prefix: &str, id: &str) -> Result<String, ApiError> {
        let mut url = reqwest::Url::parse(&self.url(prefix))
            .map_err(|e| ApiError::Client(format!("{prefix}: {e}")))?;
        url.path_segments_mut()
            .map_err(|_| ApiError::Client(format!("base_url '{}' cannot take a path", self.base_url)))?
            .push(id);
        Ok(url.to_string())
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.http.request(method, self.url(path));
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send(&self, endpoint: &str, request: RequestBuilder) -> Result<Response, ApiError> {
        self.rate_limiter
            .until_ready_with_jitter(Jitter::up_to(Duration::from_millis(50)))
            .await;

        debug!(endpoint, "calling invoice API");
        let response = request.send().await.map_err(|source| ApiError::Network {
            endpoint: endpoint.to_string(),
            source,
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(endpoint, status = status.as_u16(), "invoice API returned an error");
            return Err(ApiError::Http {
                status: status.as_u16(),
                endpoint: endpoint.to_string(),
                body,
            });
        }
        Ok(response)
    }

    async fn get_json<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T, ApiError> {
        let decode = |source| ApiError::Decode {
            endpoint: endpoint.to_string(),
            source,
        };

        if let Some(cache) = &self.cache {
            if let Some(cached) = cache.get(endpoint).await {
                debug!(endpoint, "cache hit");
                return serde_json::from_value(cached).map_err(decode);
            }
        }

        let bytes = self.get_bytes(endpoint).await?;
        let value: Value = serde_json::from_slice(&bytes).map_err(decode)?;
        if let Some(cache) = &self.cache {
            cache.insert(endpoint.to_string(), value.clone()).await;
        }
        serde_json::from_value(value).map_err(decode)
    }

    async fn get_bytes(&self, endpoint: &str) -> Result<Vec<u8>, ApiError> {
        let response = self.send(endpoint, self.request(Method::GET, endpoint)).await?;
        let bytes = response.bytes().await.map_err(|source| ApiError::Network {
            endpoint: endpoint.to_string(),
            source,
        })?;
        Ok(bytes.to_vec())
    }

    async fn post_pdf(&self, endpoint: &str, file_name: &str, bytes: Vec<u8>) -> Result<(), ApiError> {
        let size = bytes.len();
        let part = Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str(PDF_MIME)
            .map_err(|e| ApiError::Client(e.to_string()))?;
        let form = Form::new().part("file", part);

        self.send(endpoint, self.request(Method::POST, endpoint).multipart(form))
            .await?;
        self.invalidate_cache().await;
        info!(endpoint, file_name, size, "uploaded PDF");
        Ok(())
    }

    /// Drop cached reads; called after every write
    pub async fn invalidate_cache(&self) {
        if let Some(cache) = &self.cache {
            cache.invalidate_all();
            debug!("invoice cache cleared");
        }
    }
}

#[async_trait]
impl InvoiceApi for InvoiceApiClient {
    async fn list_invoices(&self) -> Result<Vec<Invoice>, ApiError> {
        self.get_json(INVOICES).await
    }

    async fn get_invoice(&self, id: &str) -> Result<Invoice, ApiError> {
        self.get_json(&self.id_endpoint(INVOICES, id)?).await
    }

    async fn update_invoice(&self, invoice: &Invoice) -> Result<(), ApiError> {
        let endpoint = self.id_endpoint(INVOICE_UPDATE, &invoice.id)?;
        self.send(&endpoint, self.request(Method::PUT, &endpoint).json(invoice))
            .await?;
        self.invalidate_cache().await;
        info!(invoice_id = %invoice.id, state = %invoice.state, "invoice updated");
        Ok(())
    }

    async fn upload_invoice(&self, file_name: &str, bytes: Vec<u8>) -> Result<(), ApiError> {
        ensure_pdf(file_name, &bytes)?;
        self.post_pdf(UPLOAD, file_name, bytes).await
    }

    async fn get_custom_invoice(&self, id: &str) -> Result<Vec<u8>, ApiError> {
        self.get_bytes(&self.id_endpoint(CUSTOM_INVOICE, id)?).await
    }

    async fn upload_custom_invoice(
        &self,
        id: &str,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<(), ApiError> {
        let endpoint = self.id_endpoint(CUSTOM_INVOICE_UPLOAD, id)?;
        self.post_pdf(&endpoint, file_name, bytes).await
    }

    async fn fetch_document(&self, url: &str) -> Result<Vec<u8>, ApiError> {
        self.get_bytes(url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_pdf_accepts_extension_or_magic() {
        assert!(ensure_pdf("scan.PDF", b"anything").is_ok());
        assert!(ensure_pdf("scan.bin", b"%PDF-1.7\n").is_ok());
        assert!(matches!(
            ensure_pdf("notes.txt", b"hello"),
            Err(ApiError::InvalidUpload(msg)) if msg == INVALID_PDF
        ));
        assert!(ensure_pdf("empty.pdf", b"").is_err());
    }

    #[test]
    fn test_client_rejects_bad_base_url() {
        let config = ApiConfig {
            base_url: "not a url".to_string(),
            ..ApiConfig::default()
        };
        assert!(matches!(InvoiceApiClient::new(&config), Err(ApiError::Client(_))));
    }

    #[tokio::test]
    async fn test_url_joining() {
        let config = ApiConfig {
            base_url: "https://localhost:44307/".to_string(),
            ..ApiConfig::default()
        };
        let client = InvoiceApiClient::new(&config).unwrap();
        assert_eq!(client.base_url(), "https://localhost:44307");
        assert_eq!(client.url("/api/Invoice"), "https://localhost:44307/api/Invoice");
        assert_eq!(client.url("files/a.pdf"), "https://localhost:44307/files/a.pdf");
        assert_eq!(client.url("https://cdn.example.com/a.pdf"), "https://cdn.example.com/a.pdf");
    }

    #[test]
    fn test_ids_are_a_single_encoded_segment() {
        let config = ApiConfig {
            base_url: "https://localhost:44307/app/".to_string(),
            ..ApiConfig::default()
        };
        let client = InvoiceApiClient::new(&config).unwrap();
        assert_eq!(
            client.id_endpoint(INVOICES, "7").unwrap(),
            "https://localhost:44307/app/api/Invoice/7"
        );
        assert_eq!(
            client.id_endpoint(CUSTOM_INVOICE, "A/7 b?x").unwrap(),
            "https://localhost:44307/app/api/Invoice/GetCustomInvoice/A%2F7%20b%3Fx"
        );
    }
}
