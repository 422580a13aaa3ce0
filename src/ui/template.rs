use minijinja::Environment;

use crate::record::model::ResponseRecord;

/// Expands `{{ field }}` placeholders in card content against the record
/// the content arrived with, so an answer can refer to its own question,
/// queries or rows. A template that fails to render falls back to the
/// source text unchanged.
pub fn expand(source: &str, record: &ResponseRecord) -> String {
    if !source.contains("{{") {
        return source.to_string();
    }
    let env = Environment::new();
    match env.render_str(source, minijinja::Value::from_serialize(record)) {
        Ok(text) => text,
        Err(err) => {
            tracing::debug!("template left unexpanded: {err}");
            source.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> ResponseRecord {
        ResponseRecord {
            id: "r1".to_string(),
            display_name: "calm-falcon-07".to_string(),
            user_input: "how many users?".to_string(),
            ..ResponseRecord::default()
        }
    }

    #[test]
    fn fields_interpolate_with_wire_names() {
        let out = expand("<b>{{ user_input }}</b> via {{ displayName }}", &record());
        assert_eq!(out, "<b>how many users?</b> via calm-falcon-07");
    }

    #[test]
    fn missing_fields_render_empty() {
        assert_eq!(expand("[{{ nothing_here }}]", &record()), "[]");
    }

    #[test]
    fn broken_template_falls_back_to_source() {
        let source = "{{ user_input";
        assert_eq!(expand(source, &record()), source);
    }

    #[test]
    fn plain_text_passes_through() {
        assert_eq!(expand("no placeholders", &record()), "no placeholders");
    }
}
