//! HTTP request pipeline.

mod client;
mod request;
mod retry;
mod transport;

pub use client::{HttpClient, HttpClientConfig, RequestInterceptor, ResponseInterceptor};
pub use request::{
    FilePart, HttpResponse, MultipartForm, OutgoingRequest, RequestBody, RequestConfig,
    TransferProgress,
};
pub use retry::{AttemptOutcome, RetryPolicy};
pub use transport::{ReqwestTransport, Transport};

#[cfg(test)]
pub(crate) use client::testing;
