//! Typed client for the gallery backend.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::header::AUTHORIZATION;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::domain::entities::{
    AuthResponse, AuthToken, Credentials, DataSource, ImageId, ImagePage, ImagePatch,
    ImageRecord, ListQuery, ProfilePatch, SearchResults, UserProfile,
};
use crate::domain::errors::{AuthError, HttpError};
use crate::domain::ports::{
    AuthPort, ImageApiPort, ProgressCallback, TokenStoragePort, UploadRequest,
};
use crate::infrastructure::cache::ResponseCache;
use crate::infrastructure::http::{
    FilePart, HttpClient, HttpResponse, MultipartForm, TransferProgress,
};

use super::fallback;
use super::session::Session;

const IMAGES_ENDPOINT: &str = "/api/images";
const UPLOAD_ENDPOINT: &str = "/api/upload";
const SEARCH_ENDPOINT: &str = "/api/search";
const USER_ENDPOINT: &str = "/api/user";
const LOGIN_ENDPOINT: &str = "/api/auth/login";
const LOGOUT_ENDPOINT: &str = "/api/auth/logout";
const REGISTER_ENDPOINT: &str = "/api/auth/register";
const HEALTH_ENDPOINT: &str = "/health";

/// Behavior switches of [`ApiService`].
#[derive(Debug, Clone, Copy)]
pub struct ApiOptions {
    /// Serve sample data when a read fails transiently.
    pub offline_fallback: bool,
    /// Lifetime of cached reads; `None` uses the cache default.
    pub cache_ttl: Option<Duration>,
}

impl Default for ApiOptions {
    fn default() -> Self {
        Self {
            offline_fallback: true,
            cache_ttl: None,
        }
    }
}

/// One method per backend capability, with auth and caching wired in.
pub struct ApiService {
    client: HttpClient,
    cache: Arc<ResponseCache>,
    session: Arc<Session>,
    token_storage: Arc<dyn TokenStoragePort>,
    options: ApiOptions,
}

impl ApiService {
    /// Wraps `client`, registering the auth interceptors on it.
    #[must_use]
    pub fn new(
        mut client: HttpClient,
        cache: Arc<ResponseCache>,
        token_storage: Arc<dyn TokenStoragePort>,
        options: ApiOptions,
    ) -> Self {
        let session = Arc::new(Session::default());

        let outgoing = Arc::clone(&session);
        client.add_request_interceptor(move |config| {
            if let Some(token) = outgoing.token() {
                config.set_header(AUTHORIZATION.as_str(), &token.bearer());
            }
        });

        let incoming = Arc::clone(&session);
        client.add_response_interceptor(move |response| {
            if response.status == StatusCode::UNAUTHORIZED {
                warn!("Backend rejected the session token");
                incoming.invalidate();
            }
        });

        Self {
            client,
            cache,
            session,
            token_storage,
            options,
        }
    }

    /// Authentication state shared with the interceptors.
    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Response cache used for reads.
    #[must_use]
    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    /// Fetches the profile of the signed-in user.
    ///
    /// # Errors
    /// Returns the request error unless it is replaced by sample data.
    pub async fn get_user(&self) -> Result<(UserProfile, DataSource), HttpError> {
        match self.get_cached(USER_ENDPOINT, Vec::new()).await {
            Ok(found) => Ok(found),
            Err(e) => self.fallback_or(e, || (fallback::sample_user(), DataSource::Fallback)),
        }
    }

    /// Updates the profile of the signed-in user.
    ///
    /// # Errors
    /// Returns error if the request fails.
    pub async fn update_user(&self, patch: &ProfilePatch) -> Result<UserProfile, HttpError> {
        let result = self.client.put(USER_ENDPOINT, patch).await;
        let profile = self.settle(result).await?.json()?;
        self.cache.delete(USER_ENDPOINT);
        Ok(profile)
    }

    /// Queries the backend health endpoint.
    ///
    /// # Errors
    /// Returns error if the backend is unreachable or unhealthy.
    pub async fn health(&self) -> Result<Value, HttpError> {
        let result = self.client.get(HEALTH_ENDPOINT, Vec::<(String, String)>::new()).await;
        self.settle(result).await?.json_value()
    }

    async fn get_cached<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: Vec<(&'static str, String)>,
    ) -> Result<(T, DataSource), HttpError> {
        let key = ResponseCache::<Value>::generate_key(endpoint, params.iter().cloned());

        if let Some(value) = self.cache.get(&key) {
            debug!(key = %key, "Serving cached response");
            let parsed = serde_json::from_value(value)
                .map_err(|e| HttpError::decode(format!("cached {endpoint}: {e}")))?;
            return Ok((parsed, DataSource::Cache));
        }

        let result = self.client.get(endpoint, params).await;
        let value = self.settle(result).await?.json_value()?;
        let parsed = serde_json::from_value(value.clone())
            .map_err(|e| HttpError::decode(format!("{endpoint}: {e}")))?;
        self.cache.set(key, value, self.options.cache_ttl);

        Ok((parsed, DataSource::Live))
    }

    /// Forgets the persisted token once the backend has rejected it.
    async fn settle(
        &self,
        result: Result<HttpResponse, HttpError>,
    ) -> Result<HttpResponse, HttpError> {
        if let Err(e) = &result
            && e.is_unauthorized()
            && let Err(store_err) = self.token_storage.delete_token().await
        {
            warn!(error = %store_err, "Failed to delete rejected token");
        }
        result
    }

    fn fallback_or<T>(&self, error: HttpError, sample: impl FnOnce() -> T) -> Result<T, HttpError> {
        if self.options.offline_fallback && error.is_transient() {
            warn!(error = %error, "Backend unavailable, serving sample data");
            Ok(sample())
        } else {
            Err(error)
        }
    }

    fn invalidate_reads(&self) {
        debug!("Invalidating cached reads");
        self.cache.clear();
    }

    async fn authenticate(
        &self,
        endpoint: &str,
        credentials: &Credentials,
    ) -> Result<AuthResponse, AuthError> {
        let response = self
            .client
            .post(endpoint, credentials)
            .await
            .map_err(|e| match e.status_code() {
                Some(status) if (400..500).contains(&status) => {
                    AuthError::rejected(e.to_string())
                }
                _ => AuthError::from(e),
            })?;
        let auth: AuthResponse = response.json()?;

        if let Some(raw) = auth.token.as_deref() {
            let token = AuthToken::new(raw)
                .ok_or_else(|| AuthError::invalid_format("backend issued an empty token"))?;
            self.session.set_token(token);
            self.invalidate_reads();
        }

        Ok(auth)
    }
}

fn image_path(id: &ImageId) -> String {
    format!("{IMAGES_ENDPOINT}/{id}")
}

fn percent_progress(progress: ProgressCallback) -> TransferProgress {
    Arc::new(move |sent, total| {
        if total > 0 {
            let percent = (sent.saturating_mul(100) / total).min(100);
            progress(u8::try_from(percent).unwrap_or(100));
        }
    })
}

#[async_trait]
impl ImageApiPort for ApiService {
    async fn list_images(&self, query: ListQuery) -> Result<ImagePage, HttpError> {
        let params = vec![
            ("page", query.page.to_string()),
            ("limit", query.limit.to_string()),
            ("sort", query.sort.to_string()),
            ("order", query.order.to_string()),
        ];

        match self.get_cached::<ImagePage>(IMAGES_ENDPOINT, params).await {
            Ok((mut page, source)) => {
                page.source = source;
                Ok(page)
            }
            Err(e) => self.fallback_or(e, || fallback::sample_page(query)),
        }
    }

    async fn search_images(
        &self,
        query: &str,
        page: u32,
        limit: u32,
    ) -> Result<SearchResults, HttpError> {
        let params = vec![
            ("q", query.to_string()),
            ("page", page.to_string()),
            ("limit", limit.to_string()),
        ];

        match self.get_cached::<SearchResults>(SEARCH_ENDPOINT, params).await {
            Ok((mut results, source)) => {
                results.source = source;
                Ok(results)
            }
            Err(e) => self.fallback_or(e, || fallback::sample_search(query, page, limit)),
        }
    }

    async fn upload_image(
        &self,
        request: UploadRequest,
        progress: ProgressCallback,
    ) -> Result<ImageRecord, HttpError> {
        let UploadRequest { file, metadata } = request;
        let tags = serde_json::to_string(&metadata.tags)
            .map_err(|e| HttpError::decode(format!("failed to encode tags: {e}")))?;

        info!(file = %file.name, size = file.size(), "Uploading image");

        let form = MultipartForm::new()
            .text("title", metadata.title)
            .text("description", metadata.description)
            .text("tags", tags)
            .file(FilePart {
                field_name: "image".to_string(),
                filename: file.name,
                mime: file.mime,
                bytes: file.bytes,
                progress: Some(percent_progress(progress)),
            });

        let result = self.client.upload(UPLOAD_ENDPOINT, form).await;
        let record: ImageRecord = self.settle(result).await?.json()?;
        self.invalidate_reads();

        info!(id = %record.id, "Upload accepted");
        Ok(record)
    }

    async fn delete_image(&self, id: &ImageId) -> Result<(), HttpError> {
        let result = self.client.delete(&image_path(id)).await;
        self.settle(result).await?;
        self.invalidate_reads();
        info!(id = %id, "Image deleted");
        Ok(())
    }

    async fn update_image(
        &self,
        id: &ImageId,
        patch: ImagePatch,
    ) -> Result<ImageRecord, HttpError> {
        let result = self.client.put(&image_path(id), &patch).await;
        let record = self.settle(result).await?.json()?;
        self.invalidate_reads();
        Ok(record)
    }
}

#[async_trait]
impl AuthPort for ApiService {
    async fn login(&self, credentials: &Credentials) -> Result<AuthResponse, AuthError> {
        self.authenticate(LOGIN_ENDPOINT, credentials).await
    }

    async fn register(&self, credentials: &Credentials) -> Result<AuthResponse, AuthError> {
        self.authenticate(REGISTER_ENDPOINT, credentials).await
    }

    async fn logout(&self) -> Result<(), AuthError> {
        let result = self.client.post(LOGOUT_ENDPOINT, &serde_json::json!({})).await;
        self.session.clear();
        self.invalidate_reads();
        result.map(|_| ()).map_err(AuthError::from)
    }

    async fn current_user(&self) -> Result<UserProfile, AuthError> {
        if !self.session.is_authenticated() {
            return Err(AuthError::NoTokenAvailable);
        }
        let result = self
            .client
            .get(USER_ENDPOINT, Vec::<(String, String)>::new())
            .await;
        Ok(self.settle(result).await?.json()?)
    }

    fn activate_token(&self, token: Option<AuthToken>) {
        match token {
            Some(token) => self.session.set_token(token),
            None => self.session.clear(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{SourceFile, UploadMetadata};
    use crate::domain::ports::MemoryTokenStorage;
    use crate::infrastructure::http::testing::{ScriptedTransport, Step};
    use crate::infrastructure::http::{HttpClientConfig, RequestBody, RetryPolicy};
    use parking_lot::Mutex;

    const PAGE_JSON: &str = r#"{
        "images": [{"id": "a", "url": "http://x/a.png", "title": "A", "size": 5}],
        "total": 1, "page": 1, "totalPages": 1, "hasMore": false
    }"#;

    struct Fixture {
        transport: Arc<ScriptedTransport>,
        storage: Arc<MemoryTokenStorage>,
        api: ApiService,
    }

    fn fixture(steps: Vec<Step>, offline_fallback: bool) -> Fixture {
        let transport = Arc::new(ScriptedTransport::new(steps));
        let config = HttpClientConfig::new("http://localhost:5001")
            .with_retry(RetryPolicy::new(0, Duration::from_millis(1)));
        let client = HttpClient::with_transport(config, transport.clone());
        let storage = Arc::new(MemoryTokenStorage::new());
        let api = ApiService::new(
            client,
            Arc::new(ResponseCache::with_defaults()),
            storage.clone(),
            ApiOptions {
                offline_fallback,
                cache_ttl: None,
            },
        );
        Fixture {
            transport,
            storage,
            api,
        }
    }

    #[tokio::test]
    async fn test_list_images_is_cached() {
        let f = fixture(vec![Step::Respond(StatusCode::OK, PAGE_JSON.to_string())], false);

        let first = f.api.list_images(ListQuery::default()).await.unwrap();
        assert_eq!(first.source, DataSource::Live);
        assert_eq!(first.images[0].title, "A");

        let second = f.api.list_images(ListQuery::default()).await.unwrap();
        assert_eq!(second.source, DataSource::Cache);
        assert_eq!(f.transport.request_count(), 1);

        let url = f.transport.requests.lock()[0].url.to_string();
        assert!(url.contains("page=1"));
        assert!(url.contains("sort=date"));
        assert!(url.contains("order=desc"));
    }

    #[tokio::test]
    async fn test_network_failure_falls_back_to_flagged_samples() {
        let f = fixture(vec![Step::Fail(HttpError::network("refused"))], true);

        let page = f.api.list_images(ListQuery::default()).await.unwrap();
        assert_eq!(page.source, DataSource::Fallback);
        assert!(!page.images.is_empty());
    }

    #[tokio::test]
    async fn test_fallback_disabled_propagates() {
        let f = fixture(vec![Step::Fail(HttpError::network("refused"))], false);

        let result = f.api.list_images(ListQuery::default()).await;
        assert!(matches!(result, Err(HttpError::Network { .. })));
    }

    #[tokio::test]
    async fn test_client_errors_are_never_masked() {
        let f = fixture(
            vec![Step::Respond(StatusCode::BAD_REQUEST, String::new())],
            true,
        );

        let result = f.api.search_images("x", 1, 20).await;
        assert_eq!(result.unwrap_err().status_code(), Some(400));
    }

    #[tokio::test]
    async fn test_bearer_token_is_attached() {
        let f = fixture(vec![Step::Respond(StatusCode::OK, PAGE_JSON.to_string())], false);
        f.api.activate_token(Some(AuthToken::new_unchecked("secret")));

        f.api.list_images(ListQuery::default()).await.unwrap();

        let requests = f.transport.requests.lock();
        assert_eq!(requests[0].headers[AUTHORIZATION], "Bearer secret");
    }

    #[tokio::test]
    async fn test_unauthorized_clears_session_and_stored_token() {
        let f = fixture(
            vec![Step::Respond(StatusCode::UNAUTHORIZED, String::new())],
            true,
        );
        let token = AuthToken::new_unchecked("stale");
        f.storage.store_token(&token).await.unwrap();
        f.api.activate_token(Some(token));

        let result = f.api.get_user().await;

        assert!(result.unwrap_err().is_unauthorized());
        assert!(f.api.session().is_unauthorized());
        assert!(!f.api.session().is_authenticated());
        assert!(!f.storage.has_token().await.unwrap());
    }

    #[tokio::test]
    async fn test_upload_sends_multipart_and_reports_percentages() {
        let record = r#"{"id": "new", "url": "http://x/new.png", "title": "T"}"#;
        let f = fixture(
            vec![
                Step::Respond(StatusCode::OK, PAGE_JSON.to_string()),
                Step::Respond(StatusCode::CREATED, record.to_string()),
            ],
            false,
        );
        f.api.list_images(ListQuery::default()).await.unwrap();
        assert_eq!(f.api.cache().len(), 1);

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let progress: ProgressCallback = Arc::new(move |p| sink.lock().push(p));

        let request = UploadRequest::new(
            SourceFile::from_name("a.png", vec![0u8; 10]),
            UploadMetadata {
                title: "T".to_string(),
                description: "d".to_string(),
                tags: vec!["x".to_string(), "y".to_string()],
            },
        );
        let created = f.api.upload_image(request, progress).await.unwrap();

        assert_eq!(created.title, "T");
        assert!(f.api.cache().is_empty());

        let requests = f.transport.requests.lock();
        let RequestBody::Multipart(form) = &requests[1].body else {
            panic!("expected multipart body");
        };
        assert!(
            form.fields
                .contains(&("tags".to_string(), r#"["x","y"]"#.to_string()))
        );
        let file = form.file.as_ref().unwrap();
        assert_eq!(file.field_name, "image");
        assert_eq!(file.mime, "image/png");

        let report = file.progress.as_ref().unwrap();
        report(5, 10);
        report(10, 10);
        report(3, 0);
        assert_eq!(*seen.lock(), vec![50, 100]);
    }

    #[tokio::test]
    async fn test_delete_failure_propagates() {
        let f = fixture(
            vec![Step::Respond(StatusCode::NOT_FOUND, String::new())],
            true,
        );

        let result = f.api.delete_image(&ImageId::new("gone")).await;
        assert_eq!(result.unwrap_err().status_code(), Some(404));
        assert!(
            f.transport.requests.lock()[0]
                .url
                .path()
                .ends_with("/api/images/gone")
        );
    }

    #[tokio::test]
    async fn test_login_activates_token() {
        let body = r#"{"token": "fresh", "user": {"id": "1", "username": "ann"}}"#;
        let f = fixture(vec![Step::Respond(StatusCode::OK, body.to_string())], false);
        let credentials = Credentials {
            email: "ann@example.com".to_string(),
            password: "pw".to_string(),
            username: None,
        };

        let response = f.api.login(&credentials).await.unwrap();

        assert_eq!(response.user.unwrap().username, "ann");
        assert_eq!(f.api.session().token().unwrap().as_str(), "fresh");
    }

    #[tokio::test]
    async fn test_login_rejection_maps_to_auth_error() {
        let f = fixture(
            vec![Step::Respond(StatusCode::UNAUTHORIZED, String::new())],
            false,
        );
        let credentials = Credentials {
            email: "ann@example.com".to_string(),
            password: "wrong".to_string(),
            username: None,
        };

        let result = f.api.login(&credentials).await;
        assert!(matches!(result, Err(AuthError::Rejected { .. })));
    }

    #[tokio::test]
    async fn test_current_user_requires_token() {
        let f = fixture(Vec::new(), false);
        let result = f.api.current_user().await;
        assert!(matches!(result, Err(AuthError::NoTokenAvailable)));
        assert_eq!(f.transport.request_count(), 0);
    }
}
