use bytes::Bytes;
use reqwest::header::HeaderMap;
use reqwest::multipart::{Form, Part};
use reqwest::Method;
use url::Url;

/// Which backend a URL belongs to. The two namespaces are disjoint and
/// determine whether cookie forwarding applies (auth base only).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceBase {
    Auth,
    Docs,
}

impl ServiceBase {
    pub fn classify(url: &Url, auth_base: &Url, docs_base: &Url) -> Option<ServiceBase> {
        if url.as_str().starts_with(auth_base.as_str()) {
            Some(ServiceBase::Auth)
        } else if url.as_str().starts_with(docs_base.as_str()) {
            Some(ServiceBase::Docs)
        } else {
            None
        }
    }
}

/// A single file for a multipart upload. Bytes are held so the body can
/// be rebuilt if the request is reissued after a token refresh.
#[derive(Debug, Clone)]
pub struct MultipartFile {
    pub field: String,
    pub file_name: String,
    pub mime: String,
    pub bytes: Bytes,
}

impl MultipartFile {
    pub(crate) fn to_form(&self) -> Form {
        let part = Part::bytes(self.bytes.to_vec()).file_name(self.file_name.clone());
        let part = match part.mime_str(&self.mime) {
            Ok(part) => part,
            // Malformed mime string: fall back to the part's default.
            Err(_) => Part::bytes(self.bytes.to_vec()).file_name(self.file_name.clone()),
        };
        Form::new().part(self.field.clone(), part)
    }
}

/// Rebuildable request body. `reqwest`'s own body types are consumed on
/// send, so the descriptor keeps the source data instead.
#[derive(Debug, Clone)]
pub enum RequestBody {
    Empty,
    Json(serde_json::Value),
    Multipart(MultipartFile),
}

/// Everything the gateway needs to issue (and reissue) one request.
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    pub method: Method,
    pub url: Url,
    /// Extra caller headers; credential headers are attached on top.
    pub headers: HeaderMap,
    pub body: RequestBody,
}

impl RequestDescriptor {
    pub fn get(url: Url) -> Self {
        Self {
            method: Method::GET,
            url,
            headers: HeaderMap::new(),
            body: RequestBody::Empty,
        }
    }

    pub fn post_json(url: Url, body: serde_json::Value) -> Self {
        Self {
            method: Method::POST,
            url,
            headers: HeaderMap::new(),
            body: RequestBody::Json(body),
        }
    }

    pub fn upload(url: Url, file: MultipartFile) -> Self {
        Self {
            method: Method::POST,
            url,
            headers: HeaderMap::new(),
            body: RequestBody::Multipart(file),
        }
    }
}
