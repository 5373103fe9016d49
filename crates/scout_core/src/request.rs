use std::fmt;

use serde::Serialize;

/// Opaque identifier correlating a search stream with its stop notification.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// A fresh random identifier.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SessionId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What the operator asked for: free text plus the information fields wanted.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SearchRequest {
    pub request_string: String,
    pub info_fields: Vec<String>,
}

impl SearchRequest {
    pub fn new<I, S>(request_string: &str, info_fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut fields = Vec::new();
        for field in info_fields {
            push_info_field(&mut fields, field.as_ref());
        }
        Self {
            request_string: request_string.trim().to_string(),
            info_fields: fields,
        }
    }

    /// Wire body for `POST {base}/search`.
    pub fn body<'a>(&'a self, session_id: &'a SessionId) -> SearchBody<'a> {
        SearchBody {
            request_string: &self.request_string,
            info_type: &self.info_fields,
            stream_id: session_id,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SearchBody<'a> {
    pub request_string: &'a str,
    pub info_type: &'a [String],
    pub stream_id: &'a SessionId,
}

#[derive(Debug, Serialize)]
pub struct StopBody<'a> {
    pub stream_id: &'a SessionId,
}

/// Adds a trimmed info field unless it is empty or already present (ignoring case).
/// Returns whether the list changed.
pub(crate) fn push_info_field(fields: &mut Vec<String>, raw: &str) -> bool {
    let field = raw.trim();
    if field.is_empty() || fields.iter().any(|f| f.eq_ignore_ascii_case(field)) {
        return false;
    }
    fields.push(field.to_string());
    true
}

pub(crate) fn remove_info_field(fields: &mut Vec<String>, raw: &str) -> bool {
    let field = raw.trim();
    let before = fields.len();
    fields.retain(|f| !f.eq_ignore_ascii_case(field));
    fields.len() != before
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn info_fields_are_trimmed_and_deduped_ignoring_case() {
        let request = SearchRequest::new("  MS21042L3 x 200 ", ["Price", " price", "", "Stock ", "PRICE"]);
        assert_eq!(request.request_string, "MS21042L3 x 200");
        assert_eq!(request.info_fields, vec!["Price".to_string(), "Stock".to_string()]);
    }

    #[test]
    fn body_serializes_wire_names() {
        let request = SearchRequest::new("nut", ["price"]);
        let id = SessionId::from("abc");
        let json = serde_json::to_value(request.body(&id)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"request_string": "nut", "info_type": ["price"], "stream_id": "abc"})
        );
    }

    #[test]
    fn generated_ids_differ() {
        assert_ne!(SessionId::generate(), SessionId::generate());
    }
}
