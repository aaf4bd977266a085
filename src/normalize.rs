//! Maps raw API responses onto a single [`OperationResult`].
//!
//! Success bodies are not uniform across capabilities. Shapes are matched in
//! a fixed order:
//!
//! 1. `result_url`: a single URL.
//! 2. `result` / `urls` holding nested lists whose first element is a URL
//!    (grouped variants, e.g. background replace and lifestyle shots).
//! 3. `result` / `urls` holding objects with their own `urls` list
//!    (grouped results from text-to-image generation).
//! 4. `result` / `urls` holding plain URL strings.
//! 5. `file`: inline base64 image data.
//!
//! Anything else is reported as [`Failure::UnexpectedShape`] rather than
//! guessed at.

use crate::request::Capability;
use base64::Engine;
use serde_json::{Map, Value};

/// Remote status meaning the service could not fetch the input URL.
pub const STATUS_UNREACHABLE_INPUT: u16 = 460;
/// Remote status meaning the request failed content validation.
pub const STATUS_VALIDATION_REJECTED: u16 = 422;

/// Fields that may hold a list of results.
const LIST_FIELDS: [&str; 2] = ["result", "urls"];

/// Successful output of an operation.
#[derive(Clone, PartialEq, Eq)]
pub enum ResultPayload {
    /// One or more temporary result URLs.
    Urls(Vec<String>),
    /// Decoded inline image data.
    Bytes(Vec<u8>),
}

impl std::fmt::Debug for ResultPayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Urls(urls) => f.debug_tuple("Urls").field(urls).finish(),
            Self::Bytes(data) => f.debug_tuple("Bytes").field(&data.len()).finish(),
        }
    }
}

/// Why an operation failed after the remote service answered.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Failure {
    /// The service could not download the given image URL.
    #[error(
        "failed to download image from '{input}'; make sure it is directly accessible and not behind a firewall or authentication"
    )]
    UnreachableInput {
        /// The input URL as sent.
        input: String,
    },

    /// The service's own validation rejected the request.
    #[error("request rejected by remote validation: {0}")]
    ValidationRejected(String),

    /// Any other non-success status.
    #[error("remote error: HTTP {status} - {body}")]
    RemoteError {
        /// HTTP status code.
        status: u16,
        /// Raw response body.
        body: String,
    },

    /// Success status, but no known result shape in the body.
    #[error("unexpected response shape: {0}")]
    UnexpectedShape(String),

    /// Success status, but the body could not be parsed.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// Every requested variant came back empty (e.g. moderation blocks).
    #[error("all {rejected} variant(s) were rejected by the remote service")]
    AllVariantsRejected {
        /// Number of dropped variants.
        rejected: usize,
    },
}

/// Normalized outcome of one operation call.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "operation results should be inspected"]
pub enum OperationResult {
    /// Results are available now.
    Ready(ResultPayload),
    /// Result URLs were issued but may not be retrievable yet.
    Pending(Vec<String>),
    /// The remote service answered with a failure.
    Failed(Failure),
}

impl OperationResult {
    /// Shorthand for a ready list of URLs.
    pub fn ready_urls<I, S>(urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Ready(ResultPayload::Urls(urls.into_iter().map(Into::into).collect()))
    }

    /// Returns true for [`OperationResult::Ready`].
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }

    /// Returns true for [`OperationResult::Pending`].
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending(_))
    }

    /// URLs carried by a ready or pending result.
    pub fn urls(&self) -> &[String] {
        match self {
            Self::Ready(ResultPayload::Urls(urls)) | Self::Pending(urls) => urls,
            _ => &[],
        }
    }

    /// The failure, if any.
    pub fn failure(&self) -> Option<&Failure> {
        match self {
            Self::Failed(failure) => Some(failure),
            _ => None,
        }
    }

    /// Reclassifies ready URLs as pending; other variants are unchanged.
    pub fn into_pending(self) -> Self {
        match self {
            Self::Ready(ResultPayload::Urls(urls)) => Self::Pending(urls),
            other => other,
        }
    }
}

/// A variant dropped from a successful response.
#[derive(Debug, Clone, PartialEq)]
pub struct VariantDiagnostic {
    /// Position of the entry in the result list.
    pub index: usize,
    /// The raw entry as returned by the service.
    pub entry: Value,
}

impl std::fmt::Display for VariantDiagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "variant {} blocked or invalid: {}", self.index, self.entry)
    }
}

/// Normalized result plus per-variant diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized {
    /// The outcome.
    pub result: OperationResult,
    /// Variants that were dropped from a successful response.
    pub diagnostics: Vec<VariantDiagnostic>,
}

impl Normalized {
    fn outcome(result: OperationResult) -> Self {
        Self {
            result,
            diagnostics: Vec::new(),
        }
    }

    fn failed(failure: Failure) -> Self {
        Self::outcome(OperationResult::Failed(failure))
    }
}

/// Normalizes one HTTP response.
///
/// `input_ref` names the original input (URL or upload) for error messages.
pub fn normalize_response(
    status: u16,
    body: &[u8],
    capability: Capability,
    input_ref: &str,
) -> Normalized {
    if !(200..300).contains(&status) {
        return Normalized::failed(classify_error(status, body, input_ref));
    }

    let value: Value = match serde_json::from_slice(body) {
        Ok(value) => value,
        Err(e) => {
            return Normalized::failed(Failure::MalformedResponse(format!(
                "{} returned a non-JSON body ({e}): {}",
                capability.display_name(),
                String::from_utf8_lossy(body)
            )));
        }
    };

    let Some(fields) = value.as_object() else {
        return Normalized::failed(Failure::UnexpectedShape(value.to_string()));
    };

    if let Some(url) = fields.get("result_url") {
        return scalar_url(url, &value);
    }
    for key in LIST_FIELDS {
        if let Some(list) = fields.get(key) {
            return url_list(list, &value);
        }
    }
    if let Some(data) = fields.get("file") {
        return inline_image(data, &value);
    }

    Normalized::failed(Failure::UnexpectedShape(value.to_string()))
}

fn classify_error(status: u16, body: &[u8], input_ref: &str) -> Failure {
    match status {
        STATUS_UNREACHABLE_INPUT => Failure::UnreachableInput {
            input: input_ref.to_string(),
        },
        STATUS_VALIDATION_REJECTED => Failure::ValidationRejected(error_detail(body)),
        _ => Failure::RemoteError {
            status,
            body: String::from_utf8_lossy(body).into_owned(),
        },
    }
}

/// Pulls a human-readable message out of an error body.
fn error_detail(body: &[u8]) -> String {
    if let Ok(Value::Object(fields)) = serde_json::from_slice::<Value>(body) {
        if let Some(detail) = detail_field(&fields) {
            return detail;
        }
    }
    String::from_utf8_lossy(body).into_owned()
}

fn detail_field(fields: &Map<String, Value>) -> Option<String> {
    ["detail", "message", "error"]
        .iter()
        .find_map(|key| fields.get(*key))
        .map(|value| match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
}

fn scalar_url(url: &Value, body: &Value) -> Normalized {
    match url {
        Value::String(url) if !url.is_empty() => {
            Normalized::outcome(OperationResult::ready_urls([url.as_str()]))
        }
        Value::String(_) => Normalized {
            result: OperationResult::Failed(Failure::AllVariantsRejected { rejected: 1 }),
            diagnostics: vec![VariantDiagnostic {
                index: 0,
                entry: url.clone(),
            }],
        },
        _ => Normalized::failed(Failure::UnexpectedShape(body.to_string())),
    }
}

fn url_list(list: &Value, body: &Value) -> Normalized {
    let entries = match list.as_array() {
        Some(entries) if !entries.is_empty() => entries,
        _ => return Normalized::failed(Failure::UnexpectedShape(body.to_string())),
    };

    let nested = entries.iter().all(Value::is_array);
    let grouped = entries.iter().all(Value::is_object);
    let flat = entries
        .iter()
        .all(|entry| entry.is_string() || entry.is_null());
    if !nested && !grouped && !flat {
        return Normalized::failed(Failure::UnexpectedShape(body.to_string()));
    }

    let mut urls = Vec::with_capacity(entries.len());
    let mut diagnostics = Vec::new();
    for (index, entry) in entries.iter().enumerate() {
        if grouped {
            match entry.get("urls").and_then(Value::as_array) {
                Some(group) if !group.is_empty() => {
                    for url in group {
                        match url.as_str() {
                            Some(url) if !url.is_empty() => urls.push(url.to_string()),
                            _ => diagnostics.push(VariantDiagnostic {
                                index,
                                entry: url.clone(),
                            }),
                        }
                    }
                }
                _ => diagnostics.push(VariantDiagnostic {
                    index,
                    entry: entry.clone(),
                }),
            }
            continue;
        }

        let url = if nested {
            entry.get(0).and_then(Value::as_str)
        } else {
            entry.as_str()
        };
        match url {
            Some(url) if !url.is_empty() => urls.push(url.to_string()),
            _ => diagnostics.push(VariantDiagnostic {
                index,
                entry: entry.clone(),
            }),
        }
    }

    let result = if urls.is_empty() {
        OperationResult::Failed(Failure::AllVariantsRejected {
            rejected: diagnostics.len(),
        })
    } else {
        OperationResult::Ready(ResultPayload::Urls(urls))
    };
    Normalized {
        result,
        diagnostics,
    }
}

fn inline_image(data: &Value, body: &Value) -> Normalized {
    let encoded = match data.as_str() {
        Some(encoded) if !encoded.is_empty() => encoded,
        _ => return Normalized::failed(Failure::UnexpectedShape(body.to_string())),
    };
    // Tolerate data URLs as well as bare base64.
    let encoded = match encoded.split_once(";base64,") {
        Some((_, payload)) => payload,
        None => encoded,
    };

    match base64::engine::general_purpose::STANDARD.decode(encoded) {
        Ok(bytes) => Normalized::outcome(OperationResult::Ready(ResultPayload::Bytes(bytes))),
        Err(e) => Normalized::failed(Failure::MalformedResponse(format!(
            "inline image is not valid base64: {e}"
        ))),
    }
}
