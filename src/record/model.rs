use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::record::parse;

/// One tabular result row, keyed by column name in server order.
pub type Row = serde_json::Map<String, Value>;

/// A single answer from the backend; one card in the transcript.
///
/// The wire shape is produced by the backend's function-call routing; every
/// field except `data` may be absent, so all of them default. `id` and
/// `display_name` are stamped on this side, see [`crate::record::ingest`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResponseRecord {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "displayName", default)]
    pub display_name: String,
    #[serde(default)]
    pub component_name: Option<String>,
    #[serde(default)]
    pub user_input: String,
    #[serde(default)]
    pub queries: Vec<String>,
    #[serde(default)]
    pub prompts: Vec<String>,
    #[serde(default)]
    pub data: PayloadData,
    #[serde(default)]
    pub result: Vec<Row>,
}

impl ResponseRecord {
    pub fn kind(&self) -> ComponentKind {
        ComponentKind::from_tag(self.component_name.as_deref())
    }

    /// The decoded payload, if ingestion managed to decode one.
    pub fn payload(&self) -> Option<&ContentPayload> {
        match &self.data {
            PayloadData::Structured(payload) => Some(payload),
            PayloadData::Text(_) => None,
        }
    }

    /// Body text for rendering: decoded content when available, otherwise
    /// the raw payload verbatim.
    pub fn body_text(&self) -> &str {
        match &self.data {
            PayloadData::Structured(payload) => &payload.content,
            PayloadData::Text(raw) => raw,
        }
    }

    pub fn suggestions(&self) -> &[String] {
        match &self.data {
            PayloadData::Structured(payload) => &payload.suggestions,
            PayloadData::Text(_) => &[],
        }
    }
}

/// Which renderer a record is drawn with. Unknown or missing tags land on
/// `Fallback`, so dispatch is total and a new server tag cannot break the
/// panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentKind {
    Markdown,
    Html,
    BarGraph,
    Fallback,
}

impl ComponentKind {
    pub fn from_tag(tag: Option<&str>) -> Self {
        match tag {
            Some("markdown_component") => Self::Markdown,
            Some("html_component") => Self::Html,
            Some("bargraph_component") => Self::BarGraph,
            _ => Self::Fallback,
        }
    }
}

/// The `data` field as received: either an already structured payload or a
/// free-form string the model emitted. Strings are decoded at ingestion, not
/// at render time.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PayloadData {
    Structured(ContentPayload),
    Text(String),
}

impl Default for PayloadData {
    fn default() -> Self {
        Self::Text(String::new())
    }
}

impl<'de> Deserialize<'de> for PayloadData {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(match value {
            Value::String(text) => Self::Text(text),
            Value::Object(_) => Self::Structured(parse::payload_from_value(&value)),
            other => Self::Text(other.to_string()),
        })
    }
}

/// Structured answer payload: prose plus follow-up suggestions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentPayload {
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub suggestions: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispatch_is_total() {
        assert_eq!(
            ComponentKind::from_tag(Some("markdown_component")),
            ComponentKind::Markdown
        );
        assert_eq!(
            ComponentKind::from_tag(Some("html_component")),
            ComponentKind::Html
        );
        assert_eq!(
            ComponentKind::from_tag(Some("bargraph_component")),
            ComponentKind::BarGraph
        );
        assert_eq!(
            ComponentKind::from_tag(Some("pie_component")),
            ComponentKind::Fallback
        );
        assert_eq!(ComponentKind::from_tag(Some("")), ComponentKind::Fallback);
        assert_eq!(ComponentKind::from_tag(None), ComponentKind::Fallback);
    }

    #[test]
    fn data_decodes_string_as_text() {
        let record: ResponseRecord =
            serde_json::from_str(r#"{"data":"{\"content\":\"hi\"}"}"#).unwrap();
        assert_eq!(
            record.data,
            PayloadData::Text(r#"{"content":"hi"}"#.to_string())
        );
    }

    #[test]
    fn data_decodes_object_with_coercion() {
        let record: ResponseRecord =
            serde_json::from_str(r#"{"data":{"content":42,"suggestions":"nope"}}"#).unwrap();
        assert_eq!(
            record.data,
            PayloadData::Structured(ContentPayload {
                content: "42".to_string(),
                suggestions: Vec::new(),
            })
        );
    }

    #[test]
    fn data_decodes_scalar_as_text() {
        let record: ResponseRecord = serde_json::from_str(r#"{"data":7}"#).unwrap();
        assert_eq!(record.data, PayloadData::Text("7".to_string()));
    }

    #[test]
    fn display_name_uses_wire_casing() {
        let record: ResponseRecord =
            serde_json::from_str(r#"{"displayName":"quiet-harbor-03","data":""}"#).unwrap();
        assert_eq!(record.display_name, "quiet-harbor-03");
        let back = serde_json::to_value(&record).unwrap();
        assert_eq!(back["displayName"], "quiet-harbor-03");
    }

    #[test]
    fn missing_fields_default() {
        let record: ResponseRecord = serde_json::from_str("{}").unwrap();
        assert!(record.result.is_empty());
        assert!(record.component_name.is_none());
        assert_eq!(record.kind(), ComponentKind::Fallback);
        assert_eq!(record.data, PayloadData::Text(String::new()));
    }

    #[test]
    fn body_text_prefers_decoded_content() {
        let record = ResponseRecord {
            data: PayloadData::Structured(ContentPayload {
                content: "decoded".to_string(),
                suggestions: Vec::new(),
            }),
            ..ResponseRecord::default()
        };
        assert_eq!(record.body_text(), "decoded");
        let raw = ResponseRecord {
            data: PayloadData::Text("raw stuff".to_string()),
            ..ResponseRecord::default()
        };
        assert_eq!(raw.body_text(), "raw stuff");
    }
}
