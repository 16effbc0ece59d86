//! Response descriptor with eagerly derived body views.
//!
//! Every [`Response`] carries three interpretations of its body next to the
//! raw bytes: [`text`](Response::text), an HTML document
//! ([`html`](Response::html)) and a JSON object ([`json`](Response::json)).
//! All three are always present. A body that is not JSON yields an empty map,
//! never an error; check [`json_state`](Response::json_state) or the
//! `Content-Type` header before trusting it.

use std::net::SocketAddr;

use reqwest::header::HeaderMap;
use reqwest::{StatusCode, Version};
use scraper::Html;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::debug;
use url::Url;

use crate::request::Request;

/// Outcome of decoding the body as a JSON object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewState {
    /// The body is a JSON object and the view holds its members.
    Parsed,
    /// The body is empty or only whitespace.
    Empty,
    /// The body is something else: HTML, a JSON array, truncated JSON, ...
    Malformed,
}

/// Transport-level details of the reply not otherwise surfaced.
#[derive(Debug, Clone)]
pub struct ReplyInfo {
    /// URL the body was finally served from, after redirects.
    pub final_url: Url,
    /// HTTP version negotiated for the exchange.
    pub version: Version,
    /// Address of the peer that answered (the proxy, when one is used).
    pub remote_addr: Option<SocketAddr>,
    /// `Content-Length` announced by the server, if any.
    pub content_length: Option<u64>,
}

impl ReplyInfo {
    pub(crate) fn from_blocking(reply: &reqwest::blocking::Response) -> Self {
        Self {
            final_url: reply.url().clone(),
            version: reply.version(),
            remote_addr: reply.remote_addr(),
            content_length: reply.content_length(),
        }
    }

    pub(crate) fn from_async(reply: &reqwest::Response) -> Self {
        Self {
            final_url: reply.url().clone(),
            version: reply.version(),
            remote_addr: reply.remote_addr(),
            content_length: reply.content_length(),
        }
    }
}

/// Result of one completed exchange.
///
/// Built once at the end of a download and read-only afterwards. Borrows the
/// [`Request`] that produced it.
///
/// The parsed HTML document is not `Send`; read what you need from the
/// response on the thread that downloaded it.
#[derive(Debug)]
pub struct Response<'r> {
    url: Url,
    status: StatusCode,
    headers: HeaderMap,
    body: Vec<u8>,
    request: &'r Request,
    reply: ReplyInfo,
    text: String,
    html: Html,
    json: Map<String, Value>,
    json_state: ViewState,
}

impl<'r> Response<'r> {
    /// Assembles a response and derives the text, HTML and JSON views.
    pub(crate) fn assemble(
        request: &'r Request,
        status: StatusCode,
        headers: HeaderMap,
        reply: ReplyInfo,
        body: Vec<u8>,
    ) -> Self {
        let text = String::from_utf8_lossy(&body).into_owned();
        let html = Html::parse_document(&text);
        let (json, json_state) = decode_json_object(&body);

        Self {
            url: request.url.clone(),
            status,
            headers,
            body,
            request,
            reply,
            text,
            html,
            json,
            json_state,
        }
    }

    /// URL that was requested.
    #[must_use]
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// HTTP status code. Non-2xx codes are not errors.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Response headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Body bytes exactly as received (after transfer decompression).
    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// The request this response answers.
    #[must_use]
    pub fn request(&self) -> &'r Request {
        self.request
    }

    /// Low-level reply details.
    #[must_use]
    pub fn reply(&self) -> &ReplyInfo {
        &self.reply
    }

    /// Body as text.
    ///
    /// Identical to the body for UTF-8 content. Invalid UTF-8 sequences are
    /// replaced with U+FFFD; use [`body`](Self::body) for the exact bytes.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Body parsed as an HTML document. Never fails: an empty or non-HTML
    /// body gives a document with an empty `<html><head></head><body>` tree.
    #[must_use]
    pub fn html(&self) -> &Html {
        &self.html
    }

    /// Body decoded as a JSON object, or an empty map when it is not one.
    #[must_use]
    pub fn json(&self) -> &Map<String, Value> {
        &self.json
    }

    /// Whether [`json`](Self::json) holds a decoded object.
    #[must_use]
    pub fn json_state(&self) -> ViewState {
        self.json_state
    }

    /// Decodes the body into `T`.
    ///
    /// # Errors
    ///
    /// Returns the decoder error when the body does not match `T`.
    pub fn json_as<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }

    /// Consumes the response and returns the body bytes.
    #[must_use]
    pub fn into_body(self) -> Vec<u8> {
        self.body
    }
}

fn decode_json_object(body: &[u8]) -> (Map<String, Value>, ViewState) {
    if body.iter().all(u8::is_ascii_whitespace) {
        return (Map::new(), ViewState::Empty);
    }
    match serde_json::from_slice::<Map<String, Value>>(body) {
        Ok(map) => (map, ViewState::Parsed),
        Err(error) => {
            debug!(%error, "body is not a JSON object; json view left empty");
            (Map::new(), ViewState::Malformed)
        }
    }
}
