// Async HTTP client for the vision backend.
//
// Every endpoint is described by a declarative `RequestSpec` and executed
// through `call` / `call_bytes`. Raw edge errors are folded into an
// `ApiError` tagged with the endpoint family before they leave this module;
// nothing here retries.

use bytes::Bytes;
use reqwest::Method;
use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use url::Url;

use crate::error::{EndpointFamily, EndpointResult, Error};
use crate::models::{ImageFile, ImageSource};
use crate::transport::TransportConfig;

// ── Request description ─────────────────────────────────────────────

/// Request body encoding.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Body {
    #[default]
    None,
    Json(serde_json::Value),
    Multipart(Vec<FormField>),
}

/// One field of a multipart form.
#[derive(Debug, Clone, PartialEq)]
pub enum FormField {
    Text { name: String, value: String },
    File { name: String, file: ImageFile },
}

impl FormField {
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Text {
            name: name.into(),
            value: value.into(),
        }
    }

    pub fn file(name: impl Into<String>, file: ImageFile) -> Self {
        Self::File {
            name: name.into(),
            file,
        }
    }

    /// The `source` field plus the uploaded `file` when there is one.
    pub fn image_fields(source: &ImageSource) -> Vec<Self> {
        let mut fields = vec![Self::text("source", source.as_str())];
        if let ImageSource::Upload(file) = source {
            fields.push(Self::file("file", file.clone()));
        }
        fields
    }
}

/// Method, path, query and body of a single backend call.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestSpec {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Body,
}

impl RequestSpec {
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: Body::None,
        }
    }

    #[must_use]
    pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    #[must_use]
    pub fn json(mut self, value: serde_json::Value) -> Self {
        self.body = Body::Json(value);
        self
    }

    #[must_use]
    pub fn multipart(mut self, fields: Vec<FormField>) -> Self {
        self.body = Body::Multipart(fields);
        self
    }
}

// ── Client ──────────────────────────────────────────────────────────

/// Client for the vision backend.
///
/// Cheap to clone: both inner `reqwest::Client`s are reference counted.
#[derive(Debug, Clone)]
pub struct VisionClient {
    http: reqwest::Client,
    stream_http: reqwest::Client,
    base_url: Url,
}

impl VisionClient {
    /// Build a client for `base_url` (e.g. `http://localhost:8000`).
    pub fn new(base_url: &str, transport: &TransportConfig) -> Result<Self, Error> {
        Ok(Self {
            http: transport.build_client()?,
            stream_http: transport.build_stream_client()?,
            base_url: Self::normalize_base_url(base_url)?,
        })
    }

    /// Wrap an existing `reqwest::Client` for both calls and streams.
    pub fn from_reqwest(base_url: &str, http: reqwest::Client) -> Result<Self, Error> {
        Ok(Self {
            stream_http: http.clone(),
            http,
            base_url: Self::normalize_base_url(base_url)?,
        })
    }

    /// Parse the base and force a trailing slash so relative joins append.
    fn normalize_base_url(raw: &str) -> Result<Url, Error> {
        let mut url = Url::parse(raw)?;
        let path = url.path().trim_end_matches('/').to_owned();
        url.set_path(&format!("{path}/"));
        Ok(url)
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub(crate) fn stream_http(&self) -> &reqwest::Client {
        &self.stream_http
    }

    /// Absolute URL for an endpoint path plus query pairs.
    pub fn url(&self, path: &str, query: &[(String, String)]) -> Result<Url, Error> {
        let mut url = self.base_url.join(path.trim_start_matches('/'))?;
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url)
    }

    // ── Execution ────────────────────────────────────────────────────

    /// Execute `spec` and decode the JSON response.
    pub async fn call<T: DeserializeOwned>(
        &self,
        family: EndpointFamily,
        spec: RequestSpec,
    ) -> EndpointResult<T> {
        let result = match self.send(&self.http, &spec).await {
            Ok(resp) => Self::decode(resp).await,
            Err(e) => Err(e),
        };
        result.map_err(|e| Self::fold(family, &spec, e))
    }

    /// Execute `spec` and return the raw response body.
    pub async fn call_bytes(&self, family: EndpointFamily, spec: RequestSpec) -> EndpointResult<Bytes> {
        let result = match self.send(&self.http, &spec).await {
            Ok(resp) => resp.bytes().await.map_err(Error::Transport),
            Err(e) => Err(e),
        };
        result.map_err(|e| Self::fold(family, &spec, e))
    }

    /// Send the request and reject non-2xx statuses, keeping the body.
    pub(crate) async fn send(
        &self,
        http: &reqwest::Client,
        spec: &RequestSpec,
    ) -> Result<reqwest::Response, Error> {
        let url = self.url(&spec.path, &spec.query)?;
        debug!("{} {url}", spec.method);

        let mut req = http.request(spec.method.clone(), url);
        match &spec.body {
            Body::None => {}
            Body::Json(value) => req = req.json(value),
            Body::Multipart(fields) => req = req.multipart(build_form(fields)?),
        }

        let resp = req.send().await?;
        let status = resp.status();
        if status.is_success() {
            Ok(resp)
        } else {
            let body = resp.text().await.unwrap_or_default();
            Err(Error::Status {
                status: status.as_u16(),
                body,
            })
        }
    }

    async fn decode<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, Error> {
        let body = resp.text().await?;
        serde_json::from_str(&body).map_err(|e| {
            let preview: String = body.chars().take(200).collect();
            Error::Deserialization {
                message: format!("{e} (body preview: {preview:?})"),
                body,
            }
        })
    }

    fn fold(family: EndpointFamily, spec: &RequestSpec, err: Error) -> crate::ApiError {
        if err.is_transient() {
            debug!(%family, path = %spec.path, error = %err, "transient backend failure");
        } else {
            warn!(%family, path = %spec.path, error = %err, "backend call failed");
        }
        err.into_api_error(family)
    }
}

fn build_form(fields: &[FormField]) -> Result<Form, Error> {
    let mut form = Form::new();
    for field in fields {
        form = match field {
            FormField::Text { name, value } => form.text(name.clone(), value.clone()),
            FormField::File { name, file } => {
                let part = Part::bytes(file.bytes.to_vec())
                    .file_name(file.filename.clone())
                    .mime_str(&file.mime)?;
                form.part(name.clone(), part)
            }
        };
    }
    Ok(form)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_without_trailing_slash_still_appends() {
        let client =
            VisionClient::from_reqwest("http://cam.local:8000/api", reqwest::Client::new())
                .expect("valid base");
        let url = client
            .url("face/last", &[])
            .expect("joinable path");
        assert_eq!(url.as_str(), "http://cam.local:8000/api/face/last");
    }

    #[test]
    fn query_pairs_are_encoded() {
        let client = VisionClient::from_reqwest("http://localhost:8000", reqwest::Client::new())
            .expect("valid base");
        let spec = RequestSpec::get("/timeline").query("limit", 80);
        let url = client.url(&spec.path, &spec.query).expect("url");
        assert_eq!(url.as_str(), "http://localhost:8000/timeline?limit=80");
    }

    #[test]
    fn live_source_sends_no_file_field() {
        let fields = FormField::image_fields(&ImageSource::Live);
        assert_eq!(fields, vec![FormField::text("source", "live")]);
    }

    #[test]
    fn upload_source_sends_file_field() {
        let file = ImageFile::new("me.png", "image/png", vec![1_u8, 2, 3]);
        let fields = FormField::image_fields(&ImageSource::Upload(file.clone()));
        assert_eq!(
            fields,
            vec![
                FormField::text("source", "upload"),
                FormField::file("file", file)
            ]
        );
    }

    #[test]
    fn garbage_base_url_is_rejected() {
        assert!(matches!(
            VisionClient::from_reqwest("not a url", reqwest::Client::new()),
            Err(Error::InvalidUrl(_))
        ));
    }
}
