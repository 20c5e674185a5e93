use std::time::Duration;

use reqwest::blocking::{multipart, Client};
use reqwest::header::CONTENT_TYPE;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{from_str, Value};
use tracing::debug;

use crate::error::{Error, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Body {
    Empty,
    Json(Value),
    Form(Vec<(String, String)>),
    Multipart(Vec<Part>),
}

/// One field of a `multipart/form-data` upload.
#[derive(Clone, Debug, PartialEq)]
pub enum Part {
    Text {
        name: String,
        value: String,
    },
    File {
        name: String,
        filename: String,
        mime: String,
        bytes: Vec<u8>,
    },
}

#[derive(Clone, Debug)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Body,
}

impl HttpRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            body: Body::Empty,
        }
    }

    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    pub fn header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.push((name.to_string(), value.into()));
        self
    }

    pub fn json<B: Serialize>(mut self, body: &B) -> Result<Self> {
        self.body = Body::Json(serde_json::to_value(body)?);
        Ok(self)
    }

    pub fn form(mut self, fields: &[(&str, &str)]) -> Self {
        self.body = Body::Form(
            fields
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        );
        self
    }

    pub fn multipart(mut self, parts: Vec<Part>) -> Self {
        self.body = Body::Multipart(parts);
        self
    }
}

#[derive(Clone, Debug)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

/// One blocking round trip. Implementations return `Error::Network` for
/// transport failures and non-2xx statuses.
pub trait Transport: Send + Sync {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse>;
}

pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::network(None, e.to_string()))?;
        Ok(Self { client })
    }
}

impl Transport for HttpTransport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse> {
        let mut builder = match request.method {
            Method::Get => self.client.get(&request.url),
            Method::Post => self.client.post(&request.url),
            Method::Put => self.client.put(&request.url),
            Method::Delete => self.client.delete(&request.url),
        };
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(value) = content_type(&request.body) {
            builder = builder.header(CONTENT_TYPE, value);
        }
        builder = match &request.body {
            Body::Empty => builder,
            Body::Json(value) => builder.body(value.to_string()),
            Body::Form(fields) => builder.body(encode_form(fields)),
            Body::Multipart(parts) => builder.multipart(multipart_form(parts)?),
        };

        let resp = builder
            .send()
            .map_err(|e| Error::network(e.status().map(|s| s.as_u16()), e.to_string()))?;
        let status = resp.status();
        let text = resp.text().map_err(|e| {
            Error::network(
                Some(status.as_u16()),
                format!("{:?} {} body read failed: {}", request.method, request.url, e),
            )
        })?;
        debug!(method = ?request.method, url = %request.url, status = status.as_u16(), "http round trip");
        if !status.is_success() {
            return Err(Error::network(
                Some(status.as_u16()),
                format!(
                    "{:?} {} failed: {} {}",
                    request.method,
                    request.url,
                    status.canonical_reason().unwrap_or(""),
                    text
                ),
            ));
        }
        Ok(HttpResponse {
            status: status.as_u16(),
            body: text,
        })
    }
}

/// Header for bodies we serialize ourselves. Multipart gets its boundary
/// from reqwest.
pub fn content_type(body: &Body) -> Option<&'static str> {
    match body {
        Body::Json(_) => Some("application/json"),
        Body::Form(_) => Some("application/x-www-form-urlencoded"),
        Body::Empty | Body::Multipart(_) => None,
    }
}

fn multipart_form(parts: &[Part]) -> Result<multipart::Form> {
    let mut form = multipart::Form::new();
    for part in parts {
        form = match part {
            Part::Text { name, value } => form.text(name.clone(), value.clone()),
            Part::File {
                name,
                filename,
                mime,
                bytes,
            } => form.part(
                name.clone(),
                multipart::Part::bytes(bytes.clone())
                    .file_name(filename.clone())
                    .mime_str(mime)
                    .map_err(|e| Error::InvalidInput(format!("bad mime type {}: {}", mime, e)))?,
            ),
        };
    }
    Ok(form)
}

pub fn encode_form(fields: &[(String, String)]) -> String {
    url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(fields.iter().map(|(k, v)| (k.as_str(), v.as_str())))
        .finish()
}

pub fn get_text(transport: &dyn Transport, url: &str) -> Result<String> {
    Ok(transport.execute(&HttpRequest::new(Method::Get, url))?.body)
}

/// POSTs `body` as JSON, whatever method `request` was built with.
pub fn post_json<T: DeserializeOwned, B: Serialize>(
    transport: &dyn Transport,
    request: HttpRequest,
    body: &B,
) -> Result<T> {
    decode(transport, request.with_method(Method::Post).json(body)?)
}

pub fn put_json<T: DeserializeOwned, B: Serialize>(
    transport: &dyn Transport,
    request: HttpRequest,
    body: &B,
) -> Result<T> {
    decode(transport, request.with_method(Method::Put).json(body)?)
}

pub fn post_multipart<T: DeserializeOwned>(
    transport: &dyn Transport,
    request: HttpRequest,
    parts: Vec<Part>,
) -> Result<T> {
    decode(transport, request.with_method(Method::Post).multipart(parts))
}

pub fn post_form(transport: &dyn Transport, url: &str, fields: &[(&str, &str)]) -> Result<String> {
    let request = HttpRequest::new(Method::Post, url).form(fields);
    Ok(transport.execute(&request)?.body)
}

fn decode<T: DeserializeOwned>(transport: &dyn Transport, request: HttpRequest) -> Result<T> {
    let resp = transport.execute(&request)?;
    from_str::<T>(&resp.body).map_err(|e| {
        Error::Parse(format!(
            "{:?} {} decode failed: {} | {}",
            request.method, request.url, e, resp.body
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        methods: Mutex<Vec<Method>>,
    }

    impl Transport for Recorder {
        fn execute(&self, request: &HttpRequest) -> Result<HttpResponse> {
            self.methods.lock().unwrap().push(request.method);
            Ok(HttpResponse {
                status: 200,
                body: "{}".to_string(),
            })
        }
    }

    #[test]
    fn json_helpers_pick_their_own_method() {
        let recorder = Recorder::default();
        let _: Value = put_json(&recorder, HttpRequest::new(Method::Post, "http://q/c"), &1).expect("put");
        let _: Value = post_json(&recorder, HttpRequest::new(Method::Get, "http://q/c"), &1).expect("post");
        assert_eq!(*recorder.methods.lock().unwrap(), vec![Method::Put, Method::Post]);
    }

    #[test]
    fn content_type_follows_body_kind() {
        assert_eq!(content_type(&Body::Json(serde_json::json!({}))), Some("application/json"));
        assert_eq!(
            content_type(&Body::Form(vec![("answer".to_string(), "1".to_string())])),
            Some("application/x-www-form-urlencoded")
        );
        assert_eq!(content_type(&Body::Empty), None);
        assert_eq!(content_type(&Body::Multipart(Vec::new())), None);
    }

    #[test]
    fn multipart_rejects_malformed_mime() {
        let parts = vec![Part::File {
            name: "file".to_string(),
            filename: "a.mp3".to_string(),
            mime: "not a mime".to_string(),
            bytes: vec![1, 2, 3],
        }];
        assert!(matches!(multipart_form(&parts), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn form_encoding_escapes_reserved_characters() {
        let fields = vec![
            ("username".to_string(), "tester".to_string()),
            ("answer".to_string(), "1 + 1 & more".to_string()),
        ];
        assert_eq!(encode_form(&fields), "username=tester&answer=1+%2B+1+%26+more");
    }

    #[test]
    fn request_builder_collects_headers_and_body() {
        let req = HttpRequest::new(Method::Post, "http://x/verify")
            .header("api-key", "k")
            .json(&serde_json::json!({"a": 1}))
            .expect("json body");
        assert_eq!(req.headers, vec![("api-key".to_string(), "k".to_string())]);
        assert_eq!(req.body, Body::Json(serde_json::json!({"a": 1})));
    }
}
