//! `fetch`-backed transport.

use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{Headers, Request, RequestCache, RequestCredentials, RequestInit, Response};

use crate::error::ClientError;
use crate::platform::Transport;

/// Same-origin requests carrying the session cookie.
#[derive(Debug, Clone, Copy, Default)]
pub struct FetchTransport;

impl Transport for FetchTransport {
    async fn get(&self, path: &str, no_cache: bool) -> Result<String, ClientError> {
        let init = RequestInit::new();
        init.set_method("GET");
        init.set_credentials(RequestCredentials::SameOrigin);
        let headers = Headers::new().map_err(js_error)?;
        if no_cache {
            init.set_cache(RequestCache::NoStore);
            headers
                .set("Cache-Control", "no-cache, no-store, must-revalidate")
                .map_err(js_error)?;
            headers.set("Pragma", "no-cache").map_err(js_error)?;
            headers.set("Expires", "0").map_err(js_error)?;
        }
        init.set_headers(&headers);
        send(path, &init).await
    }

    async fn post_json(&self, path: &str, body: String) -> Result<String, ClientError> {
        let init = RequestInit::new();
        init.set_method("POST");
        init.set_credentials(RequestCredentials::SameOrigin);
        let headers = Headers::new().map_err(js_error)?;
        headers
            .set("Content-Type", "application/json")
            .map_err(js_error)?;
        init.set_headers(&headers);
        init.set_body(&JsValue::from_str(&body));
        send(path, &init).await
    }
}

async fn send(path: &str, init: &RequestInit) -> Result<String, ClientError> {
    let window =
        web_sys::window().ok_or_else(|| ClientError::NetworkFailure("no window".into()))?;
    let request = Request::new_with_str_and_init(path, init).map_err(js_error)?;
    let value = JsFuture::from(window.fetch_with_request(&request))
        .await
        .map_err(js_error)?;
    let response: Response = value
        .dyn_into()
        .map_err(|_| ClientError::NetworkFailure("fetch did not yield a Response".into()))?;
    if !response.ok() {
        return Err(ClientError::NetworkFailure(format!(
            "HTTP {} for {}",
            response.status(),
            path
        )));
    }
    let text = JsFuture::from(response.text().map_err(js_error)?)
        .await
        .map_err(js_error)?;
    text.as_string()
        .ok_or_else(|| ClientError::MalformedResponse("response body is not text".into()))
}

fn js_error(value: JsValue) -> ClientError {
    ClientError::NetworkFailure(
        value
            .as_string()
            .unwrap_or_else(|| format!("{:?}", value)),
    )
}
