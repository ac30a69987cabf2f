//! Network transport behind the HTTP client.

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::{Stream, StreamExt, stream};
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Client};
use tracing::{trace, warn};

use crate::domain::errors::HttpError;

use super::request::{
    FilePart, HttpResponse, MultipartForm, OutgoingRequest, RequestBody, TransferProgress,
};

const USER_AGENT: &str = concat!("carousel/", env!("CARGO_PKG_VERSION"));
const UPLOAD_CHUNK_SIZE: usize = 64 * 1024;

/// Sends one fully resolved request.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Dispatches `request` and buffers the response.
    async fn send(&self, request: OutgoingRequest) -> Result<HttpResponse, HttpError>;
}

/// `reqwest` implementation of [`Transport`].
///
/// Timeouts are enforced by the client so that they can be retried; the
/// underlying `reqwest::Client` has none of its own.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Creates a transport.
    ///
    /// # Errors
    /// Returns error if HTTP client creation fails.
    pub fn new() -> Result<Self, HttpError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| HttpError::network(format!("failed to create HTTP client: {e}")))?;

        Ok(Self { client })
    }

    fn build_form(form: MultipartForm) -> Result<Form, HttpError> {
        let mut out = Form::new();
        for (name, value) in form.fields {
            out = out.text(name, value);
        }
        if let Some(file) = form.file {
            let field_name = file.field_name.clone();
            out = out.part(field_name, Self::build_file_part(file)?);
        }
        Ok(out)
    }

    fn build_file_part(file: FilePart) -> Result<Part, HttpError> {
        let total = file.bytes.len() as u64;
        let body = Body::wrap_stream(progress_chunks(file.bytes, file.progress));

        Part::stream_with_length(body, total)
            .file_name(file.filename)
            .mime_str(&file.mime)
            .map_err(|e| HttpError::network(format!("invalid MIME type: {e}")))
    }
}

/// Splits `bytes` into chunks, reporting cumulative progress as each is pulled.
fn progress_chunks(
    bytes: Bytes,
    progress: Option<TransferProgress>,
) -> impl Stream<Item = Result<Bytes, std::io::Error>> + Send + 'static {
    let total = bytes.len() as u64;
    let chunks: Vec<Bytes> = (0..bytes.len())
        .step_by(UPLOAD_CHUNK_SIZE)
        .map(|start| bytes.slice(start..(start + UPLOAD_CHUNK_SIZE).min(bytes.len())))
        .collect();

    let mut sent = 0u64;
    stream::iter(chunks).map(move |chunk| {
        sent += chunk.len() as u64;
        if let Some(progress) = &progress {
            progress(sent, total);
        }
        Ok(chunk)
    })
}

fn map_send_error(error: &reqwest::Error) -> HttpError {
    if error.is_timeout() {
        HttpError::network("request timed out")
    } else if error.is_connect() {
        HttpError::network(format!("failed to connect: {error}"))
    } else {
        HttpError::network(error.to_string())
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: OutgoingRequest) -> Result<HttpResponse, HttpError> {
        trace!(method = %request.method, url = %request.url, "Dispatching request");

        let mut builder = self
            .client
            .request(request.method, request.url)
            .headers(request.headers);

        builder = match request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => {
                let bytes = serde_json::to_vec(&value)
                    .map_err(|e| HttpError::decode(format!("failed to encode body: {e}")))?;
                builder.body(bytes)
            }
            RequestBody::Multipart(form) => builder.multipart(Self::build_form(form)?),
        };

        let response = builder.send().await.map_err(|e| {
            warn!(error = %e, "Request failed");
            map_send_error(&e)
        })?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await.map_err(|e| map_send_error(&e))?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[test]
    fn test_transport_creation() {
        let transport = ReqwestTransport::new();
        assert!(transport.is_ok());
    }

    #[test]
    fn test_multipart_form_builds() {
        let form = MultipartForm::new().text("title", "T").file(FilePart {
            field_name: "image".to_string(),
            filename: "a.png".to_string(),
            mime: "image/png".to_string(),
            bytes: Bytes::from_static(b"\x89PNG"),
            progress: None,
        });

        assert!(ReqwestTransport::build_form(form).is_ok());
    }

    #[tokio::test]
    async fn test_chunked_body_reports_increasing_progress() {
        let reports = Arc::new(Mutex::new(Vec::new()));
        let progress: TransferProgress = {
            let reports = Arc::clone(&reports);
            Arc::new(move |sent, total| reports.lock().push((sent, total)))
        };
        let total = UPLOAD_CHUNK_SIZE * 2 + 100;

        let chunks: Vec<Bytes> = progress_chunks(Bytes::from(vec![3u8; total]), Some(progress))
            .map(Result::unwrap)
            .collect()
            .await;

        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks.iter().map(Bytes::len).sum::<usize>(), total);

        let reports = reports.lock().clone();
        let total = total as u64;
        assert_eq!(reports.len(), 3);
        assert!(reports.windows(2).all(|w| w[0].0 < w[1].0));
        assert!(reports.iter().all(|&(_, t)| t == total));
        assert_eq!(reports.last(), Some(&(total, total)));
    }
}
