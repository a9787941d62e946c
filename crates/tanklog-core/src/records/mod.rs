//! Fuel-record endpoint client.
//!
//! Wraps the `/api/fuel-records` resource group: receipt upload (server-side
//! OCR extraction), paginated listing, single-record fetch, and deletion.
//! Query results are cached in memory per page and per id; successful
//! mutations invalidate the cache so the next read refetches.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Response};
use serde::{Deserialize, Serialize};

use crate::config::normalize_base_url;
use crate::error::{api_error, Error, Result};
use crate::guard::{request_signature, RequestCoalescer};
use crate::store::TokenStore;
use crate::token::decode_claims;
use crate::util::{unix_timestamp_millis_now, unix_timestamp_now};

// OCR extraction is slow; the record wrapper waits far longer than auth.
const RECORDS_HTTP_TIMEOUT_SECS: u64 = 120;

/// A fuel receipt record owned by the server.
///
/// Created on successful upload once OCR extraction finishes; fields the
/// extraction could not recover stay empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FuelReceiptRecord {
    pub id: i64,
    #[serde(default)]
    pub station_name: Option<String>,
    #[serde(default)]
    pub station_brand: Option<String>,
    #[serde(default)]
    pub amount: Option<f64>,
    #[serde(default)]
    pub liters: Option<f64>,
    #[serde(default)]
    pub price_per_liter: Option<f64>,
    #[serde(default)]
    pub receipt_image_url: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub purchase_date: Option<String>,
    pub created_at: String,
    pub ocr_processed: bool,
    #[serde(default)]
    pub ocr_confidence: Option<f64>,
}

/// One page of records in the backend's pagination envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordPage {
    pub content: Vec<FuelReceiptRecord>,
    pub total_elements: i64,
    pub total_pages: i64,
    pub number: u32,
    pub size: u32,
}

/// A receipt image plus the optional fields the user filled in manually.
#[derive(Debug, Clone)]
pub struct UploadReceipt {
    pub bytes: Vec<u8>,
    pub file_name: String,
    pub content_type: String,
    pub station_name: Option<String>,
    pub location: Option<String>,
    pub purchase_date: Option<String>,
}

/// HTTP client for the `/api/fuel-records` endpoint group.
///
/// A 401/403 from any record request purges the persisted credential keys:
/// any auth rejection is treated as terminal for the stored session.
pub struct FuelRecordClient<S: TokenStore> {
    records_url: String,
    client: Client,
    store: S,
    guard: Mutex<RequestCoalescer>,
    cache: Mutex<RecordCache>,
}

impl<S: TokenStore> FuelRecordClient<S> {
    pub fn new(records_url: impl AsRef<str>, store: S) -> Result<Self> {
        Ok(Self {
            records_url: normalize_base_url(records_url.as_ref())?,
            client: Client::builder()
                .timeout(Duration::from_secs(RECORDS_HTTP_TIMEOUT_SECS))
                .build()?,
            store,
            guard: Mutex::new(RequestCoalescer::new()),
            cache: Mutex::new(RecordCache::default()),
        })
    }

    /// Upload a receipt image for OCR extraction.
    ///
    /// Guarded against near-simultaneous duplicate submissions: all uploads
    /// collapse to one signature, so a second call within the dedup window
    /// is rejected before any network activity.
    pub async fn upload_receipt(&self, upload: UploadReceipt) -> Result<FuelReceiptRecord> {
        self.check_duplicate(&request_signature("upload-receipt", None))?;
        self.log_expired_token_preflight();

        let mut form = Form::new().part(
            "receiptImage",
            Part::bytes(upload.bytes)
                .file_name(upload.file_name)
                .mime_str(&upload.content_type)?,
        );
        if let Some(station_name) = upload.station_name {
            form = form.text("stationName", station_name);
        }
        if let Some(location) = upload.location {
            form = form.text("location", location);
        }
        if let Some(purchase_date) = upload.purchase_date {
            form = form.text("purchaseDate", purchase_date);
        }

        // No explicit content-type header: reqwest supplies the
        // boundary-bearing multipart value.
        let request = self.authorized(
            self.client
                .post(format!("{}/upload-receipt", self.records_url))
                .multipart(form),
        )?;
        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(self.fail(response).await);
        }

        let record = response.json::<FuelReceiptRecord>().await?;
        tracing::info!(record_id = record.id, "receipt uploaded");

        let mut cache = self.lock_cache();
        cache.invalidate_pages();
        cache.insert_record(record.clone());
        Ok(record)
    }

    /// Fetch one page of records, served from cache when present.
    pub async fn list(&self, page: u32, size: u32) -> Result<RecordPage> {
        if let Some(cached) = self.lock_cache().page(page, size) {
            tracing::debug!(page, size, "serving record page from cache");
            return Ok(cached);
        }

        let request = self.authorized(
            self.client
                .get(&self.records_url)
                .query(&[("page", page), ("size", size)]),
        )?;
        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(self.fail(response).await);
        }

        let page_data = response.json::<RecordPage>().await?;
        self.lock_cache().insert_page(page, size, page_data.clone());
        Ok(page_data)
    }

    /// Fetch a single record by id, served from cache when present.
    pub async fn get(&self, id: i64) -> Result<FuelReceiptRecord> {
        if let Some(cached) = self.lock_cache().record(id) {
            return Ok(cached);
        }

        let request = self.authorized(
            self.client
                .get(format!("{}/{id}", self.records_url)),
        )?;
        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(self.fail(response).await);
        }

        let record = response.json::<FuelReceiptRecord>().await?;
        self.lock_cache().insert_record(record.clone());
        Ok(record)
    }

    /// Delete a record. Evicts it from the cache and invalidates cached
    /// pages so the next list refetches.
    pub async fn delete(&self, id: i64) -> Result<()> {
        let body = serde_json::json!({ "id": id });
        self.check_duplicate(&request_signature("delete", Some(&body)))?;

        let request = self.authorized(
            self.client
                .delete(format!("{}/{id}", self.records_url)),
        )?;
        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(self.fail(response).await);
        }

        self.lock_cache().invalidate_record(id);
        Ok(())
    }

    fn check_duplicate(&self, signature: &str) -> Result<()> {
        let mut guard = self
            .guard
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if guard.should_send(signature, unix_timestamp_millis_now()) {
            Ok(())
        } else {
            Err(Error::DuplicateRequest(signature.to_string()))
        }
    }

    /// Latency optimization only: log an apparently expired token but let
    /// the request proceed. Clock skew or an already-rotated token can make
    /// this check wrong, and the server re-validates regardless.
    fn log_expired_token_preflight(&self) {
        let Ok(Some(token)) = self.store.access_token() else {
            return;
        };
        match decode_claims(&token) {
            Ok(claims) if claims.is_expired(unix_timestamp_now()) => {
                tracing::warn!("stored token appears expired, proceeding anyway");
            }
            Ok(_) => {}
            Err(error) => tracing::warn!(%error, "could not inspect stored token"),
        }
    }

    /// Attach the stored bearer token when present; otherwise defer the
    /// authorization decision to the server.
    fn authorized(&self, request: RequestBuilder) -> Result<RequestBuilder> {
        match self.store.access_token()? {
            Some(token) => Ok(request.bearer_auth(token)),
            None => {
                tracing::warn!("no stored access token, sending request unauthenticated");
                Ok(request)
            }
        }
    }

    async fn fail(&self, response: Response) -> Error {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        self.handle_failure(status, &body)
    }

    fn handle_failure(&self, status: u16, body: &str) -> Error {
        let error = api_error(status, body);

        if error.is_auth_rejection() {
            // Any auth rejection invalidates the stored credentials, even
            // when triggered by an unrelated in-flight request.
            tracing::warn!(status, "auth rejected, purging stored credentials");
            if let Err(storage_error) = self.store.clear_session() {
                tracing::error!(%storage_error, "failed to purge stored credentials");
            }
        }
        error
    }

    fn lock_cache(&self) -> std::sync::MutexGuard<'_, RecordCache> {
        self.cache
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

/// In-memory cache of fetched records, keyed by page and by id.
#[derive(Debug, Default)]
struct RecordCache {
    pages: HashMap<(u32, u32), RecordPage>,
    by_id: HashMap<i64, FuelReceiptRecord>,
}

impl RecordCache {
    fn page(&self, page: u32, size: u32) -> Option<RecordPage> {
        self.pages.get(&(page, size)).cloned()
    }

    fn insert_page(&mut self, page: u32, size: u32, data: RecordPage) {
        for record in &data.content {
            self.by_id.insert(record.id, record.clone());
        }
        self.pages.insert((page, size), data);
    }

    fn record(&self, id: i64) -> Option<FuelReceiptRecord> {
        self.by_id.get(&id).cloned()
    }

    fn insert_record(&mut self, record: FuelReceiptRecord) {
        self.by_id.insert(record.id, record);
    }

    fn invalidate_pages(&mut self) {
        self.pages.clear();
    }

    fn invalidate_record(&mut self, id: i64) {
        self.pages.clear();
        self.by_id.remove(&id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryTokenStore, ACCESS_TOKEN_KEY, SESSION_KEYS};
    use pretty_assertions::assert_eq;

    fn sample_record(id: i64) -> FuelReceiptRecord {
        FuelReceiptRecord {
            id,
            station_name: Some("Shell Downtown".to_string()),
            station_brand: Some("Shell".to_string()),
            amount: Some(54.2),
            liters: Some(31.5),
            price_per_liter: Some(1.72),
            receipt_image_url: None,
            location: Some("Springfield".to_string()),
            purchase_date: Some("2026-08-01".to_string()),
            created_at: "2026-08-01T10:00:00Z".to_string(),
            ocr_processed: true,
            ocr_confidence: Some(0.93),
        }
    }

    fn sample_page(ids: &[i64]) -> RecordPage {
        RecordPage {
            content: ids.iter().map(|id| sample_record(*id)).collect(),
            total_elements: ids.len() as i64,
            total_pages: 1,
            number: 0,
            size: 20,
        }
    }

    // Unroutable endpoint: requests fail at the transport layer, which is
    // enough to exercise everything that happens before and after the send.
    fn offline_client(store: MemoryTokenStore) -> FuelRecordClient<MemoryTokenStore> {
        FuelRecordClient::new("http://127.0.0.1:9/api/fuel-records", store).unwrap()
    }

    #[test]
    fn record_parses_backend_wire_format() {
        let raw = r#"{
            "id": 42,
            "stationName": "Shell Downtown",
            "amount": 54.2,
            "liters": 31.5,
            "pricePerLiter": 1.72,
            "createdAt": "2026-08-01T10:00:00Z",
            "ocrProcessed": true,
            "ocrConfidence": 0.93
        }"#;
        let record: FuelReceiptRecord = serde_json::from_str(raw).unwrap();
        assert_eq!(record.id, 42);
        assert_eq!(record.price_per_liter, Some(1.72));
        assert_eq!(record.station_brand, None);
    }

    #[test]
    fn page_parses_pagination_envelope() {
        let raw = r#"{
            "content": [],
            "totalElements": 0,
            "totalPages": 0,
            "number": 0,
            "size": 20
        }"#;
        let page: RecordPage = serde_json::from_str(raw).unwrap();
        assert_eq!(page.size, 20);
        assert!(page.content.is_empty());
    }

    #[test]
    fn cache_serves_inserted_pages_and_records() {
        let mut cache = RecordCache::default();
        cache.insert_page(0, 20, sample_page(&[1, 2]));

        assert!(cache.page(0, 20).is_some());
        assert!(cache.page(1, 20).is_none());
        assert_eq!(cache.record(2).map(|record| record.id), Some(2));
    }

    #[test]
    fn deleting_a_record_evicts_it_and_cached_pages() {
        let mut cache = RecordCache::default();
        cache.insert_page(0, 20, sample_page(&[1, 2, 3]));

        cache.invalidate_record(2);
        assert!(cache.page(0, 20).is_none());
        assert!(cache.record(2).is_none());
        // Unrelated records stay cached by id.
        assert!(cache.record(1).is_some());
    }

    #[test]
    fn upload_invalidates_pages_but_keeps_record_entries() {
        let mut cache = RecordCache::default();
        cache.insert_page(0, 20, sample_page(&[1]));

        cache.invalidate_pages();
        cache.insert_record(sample_record(9));
        assert!(cache.page(0, 20).is_none());
        assert!(cache.record(9).is_some());
    }

    #[tokio::test]
    async fn second_upload_within_window_is_rejected_without_a_request() {
        let client = offline_client(MemoryTokenStore::new());
        let upload = UploadReceipt {
            bytes: vec![0xFF, 0xD8],
            file_name: "receipt.jpg".to_string(),
            content_type: "image/jpeg".to_string(),
            station_name: None,
            location: None,
            purchase_date: None,
        };

        // First attempt reaches the transport layer and fails there.
        let first = client.upload_receipt(upload.clone()).await;
        assert!(matches!(first, Err(Error::Http(_))));

        // Second attempt never leaves the process.
        let second = client.upload_receipt(upload).await;
        assert!(matches!(second, Err(Error::DuplicateRequest(_))));
    }

    #[tokio::test]
    async fn transport_failures_do_not_purge_credentials() {
        let store = MemoryTokenStore::new();
        store.save(ACCESS_TOKEN_KEY, "token").unwrap();
        let client = offline_client(store.clone());

        let result = client.list(0, 20).await;
        assert!(result.is_err());
        assert_eq!(store.load(ACCESS_TOKEN_KEY).unwrap().as_deref(), Some("token"));
    }

    #[test]
    fn auth_rejection_purges_all_stored_keys() {
        let store = MemoryTokenStore::new();
        for key in SESSION_KEYS {
            store.save(key, "value").unwrap();
        }
        let client = offline_client(store.clone());

        // Exercise the response-handling path directly: a 403 from the
        // backend must leave the three keys absent afterward.
        let error = client.handle_failure(403, r#"{"message": "Forbidden"}"#);

        assert!(error.is_auth_rejection());
        for key in SESSION_KEYS {
            assert_eq!(store.load(key).unwrap(), None);
        }
    }

    /// Serves each canned response to one connection, in order, then stops.
    /// `connection: close` forces the client onto a fresh connection per
    /// request, so the served count equals the request count.
    async fn spawn_canned_backend(
        responses: Vec<(u16, String)>,
    ) -> (String, tokio::task::JoinHandle<usize>) {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let mut served = 0;
            for (status, body) in responses {
                let (mut stream, _) = listener.accept().await.unwrap();
                let mut request = Vec::new();
                let mut buffer = [0u8; 4096];
                loop {
                    let read = stream.read(&mut buffer).await.unwrap();
                    request.extend_from_slice(&buffer[..read]);
                    if read == 0 || request.windows(4).any(|window| window == b"\r\n\r\n") {
                        break;
                    }
                }
                let response = format!(
                    "HTTP/1.1 {status} OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                    body.len()
                );
                stream.write_all(response.as_bytes()).await.unwrap();
                stream.shutdown().await.ok();
                served += 1;
            }
            served
        });
        (format!("http://{addr}/api/fuel-records"), handle)
    }

    fn page_body(ids: &[i64]) -> String {
        let content: Vec<serde_json::Value> = ids
            .iter()
            .map(|id| {
                serde_json::json!({
                    "id": id,
                    "createdAt": "2026-08-01T10:00:00Z",
                    "ocrProcessed": true,
                })
            })
            .collect();
        serde_json::json!({
            "content": content,
            "totalElements": ids.len(),
            "totalPages": 1,
            "number": 0,
            "size": 20,
        })
        .to_string()
    }

    #[tokio::test]
    async fn delete_evicts_cached_pages_so_list_refetches() {
        let responses = vec![
            (200, page_body(&[1, 2])),
            (204, String::new()),
            (200, page_body(&[1])),
        ];
        let (records_url, backend) = spawn_canned_backend(responses).await;
        let client = FuelRecordClient::new(&records_url, MemoryTokenStore::new()).unwrap();

        let before = client.list(0, 20).await.unwrap();
        assert!(before.content.iter().any(|record| record.id == 2));

        client.delete(2).await.unwrap();

        // A stale cache would still contain record 2 here; the refetch
        // must go back to the backend instead.
        let after = client.list(0, 20).await.unwrap();
        assert!(after.content.iter().all(|record| record.id != 2));
        assert_eq!(backend.await.unwrap(), 3);
    }
}
