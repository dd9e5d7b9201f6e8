use std::time::Duration;

use reqwest::header::CONTENT_TYPE;

use crate::runtime::contract::CustomResourceResponse;

use super::run_blocking;

/// Delivers the single terminal callback of an invocation.
pub trait ResponseSignaler {
    fn send(&self, response_url: &str, response: &CustomResourceResponse) -> Result<(), String>;
}

impl<T: ResponseSignaler + ?Sized> ResponseSignaler for &T {
    fn send(&self, response_url: &str, response: &CustomResourceResponse) -> Result<(), String> {
        (**self).send(response_url, response)
    }
}

/// PUTs the callback body to the presigned URL from the event.
#[derive(Debug, Clone)]
pub struct HttpResponseSignaler {
    client: reqwest::Client,
}

impl HttpResponseSignaler {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

impl ResponseSignaler for HttpResponseSignaler {
    fn send(&self, response_url: &str, response: &CustomResourceResponse) -> Result<(), String> {
        if response_url.trim().is_empty() {
            return Err("event has no ResponseURL".to_string());
        }

        let body = serde_json::to_string(response)
            .map_err(|error| format!("failed to serialize response body: {error}"))?;
        let client = self.client.clone();
        let url = response_url.to_string();

        run_blocking(async move {
            // Presigned URLs are signed without a content type.
            client
                .put(url)
                .header(CONTENT_TYPE, "")
                .body(body)
                .send()
                .await
                .and_then(reqwest::Response::error_for_status)
                .map(|_| ())
                .map_err(|error| format!("failed to put response: {error}"))
        })
    }
}
