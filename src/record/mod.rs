pub mod model;
pub mod naming;
pub mod parse;

use model::{PayloadData, ResponseRecord};
use uuid::Uuid;

/// Prepares a freshly received record for the transcript: stamps the
/// client-side identity fields and decodes a textual `data` payload exactly
/// once. A payload that cannot be decoded stays raw; renderers handle both
/// shapes.
pub fn ingest(mut record: ResponseRecord) -> ResponseRecord {
    if record.id.is_empty() {
        record.id = Uuid::new_v4().to_string();
    }
    if record.display_name.is_empty() {
        record.display_name = naming::display_name();
    }
    record.data = match record.data {
        PayloadData::Text(raw) if !raw.trim().is_empty() => {
            match parse::parse_loose_payload(&raw) {
                Ok(payload) => PayloadData::Structured(payload),
                Err(err) => {
                    tracing::debug!("keeping payload as raw text: {err}");
                    PayloadData::Text(raw)
                }
            }
        }
        other => other,
    };
    record
}

#[cfg(test)]
mod tests {
    use super::model::{ContentPayload, PayloadData, ResponseRecord};
    use super::*;

    fn record_with_data(data: PayloadData) -> ResponseRecord {
        ResponseRecord {
            data,
            ..ResponseRecord::default()
        }
    }

    #[test]
    fn ingest_stamps_missing_identity() {
        let record = ingest(record_with_data(PayloadData::default()));
        assert!(!record.id.is_empty());
        assert!(!record.display_name.is_empty());
    }

    #[test]
    fn ingest_keeps_existing_identity() {
        let mut record = record_with_data(PayloadData::default());
        record.id = "abc".to_string();
        record.display_name = "kept-name".to_string();
        let record = ingest(record);
        assert_eq!(record.id, "abc");
        assert_eq!(record.display_name, "kept-name");
    }

    #[test]
    fn ingest_decodes_textual_payload_once() {
        let raw = r#"{"content":"hi","suggestions":["next"]}"#.to_string();
        let record = ingest(record_with_data(PayloadData::Text(raw)));
        assert_eq!(
            record.data,
            PayloadData::Structured(ContentPayload {
                content: "hi".to_string(),
                suggestions: vec!["next".to_string()],
            })
        );
    }

    #[test]
    fn ingest_leaves_undecodable_payload_raw() {
        let record = ingest(record_with_data(PayloadData::Text("plain words".into())));
        assert_eq!(record.data, PayloadData::Text("plain words".to_string()));
    }
}
