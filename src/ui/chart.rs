use serde_json::Value;

use crate::ui::canvas::{Canvas, TextStyle};
use crate::ui::theme;

const CHART_HEIGHT: i32 = 170;
const BAR_GAP: i32 = 8;

/// One bar, from a `{label, value}` object in the payload content.
#[derive(Debug, Clone, PartialEq)]
pub struct BarEntry {
    pub label: String,
    pub value: f64,
}

/// Second-level decode for bargraph cards. The content string must itself be
/// JSON: either an array of `{label, value}` objects or an object wrapping
/// such an array under `content`. Anything else, or any entry without a
/// numeric value, produces no bars rather than an error.
pub fn parse_bar_entries(content: &str) -> Vec<BarEntry> {
    let Ok(value) = serde_json::from_str::<Value>(content) else {
        return Vec::new();
    };
    let items = match &value {
        Value::Array(items) => items.as_slice(),
        Value::Object(map) => match map.get("content") {
            Some(Value::Array(items)) => items.as_slice(),
            _ => return Vec::new(),
        },
        _ => return Vec::new(),
    };
    items.iter().filter_map(entry_of).collect()
}

fn entry_of(item: &Value) -> Option<BarEntry> {
    let object = item.as_object()?;
    let label = match object.get("label") {
        Some(Value::String(text)) => text.clone(),
        Some(other) => other.to_string(),
        None => String::new(),
    };
    let value = number_of(object.get("value")?)?;
    Some(BarEntry { label, value })
}

fn number_of(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

pub fn height(canvas: &Canvas, entries: &[BarEntry]) -> i32 {
    if entries.is_empty() {
        canvas.line_height(TextStyle::sans(canvas.base_size()))
    } else {
        CHART_HEIGHT
    }
}

pub fn draw(canvas: &mut Canvas, x: i32, y: i32, width: i32, entries: &[BarEntry]) -> i32 {
    if entries.is_empty() {
        let style = TextStyle::sans(canvas.base_size());
        canvas.draw_text(x, y, "no chart data", style, theme::MUTED);
        return canvas.line_height(style);
    }

    let small = TextStyle::sans(canvas.base_size() * 0.8);
    let label_lh = canvas.line_height(small);
    let area_h = CHART_HEIGHT - 2 * label_lh - 4;
    let baseline = y + label_lh + area_h;
    let max = entries.iter().map(|e| e.value).fold(0.0f64, f64::max);

    let n = entries.len() as i32;
    let bar_w = ((width - BAR_GAP * (n - 1)) / n).clamp(4, 96);
    let step = bar_w + BAR_GAP;

    canvas.draw_line(x, baseline, x + width, baseline, theme::GRID, 1);
    for (i, entry) in entries.iter().enumerate() {
        let bx = x + i as i32 * step;
        if bx + bar_w > x + width {
            break;
        }
        let bar_h = if max > 0.0 {
            ((entry.value.max(0.0) / max) * area_h as f64).round() as i32
        } else {
            0
        };
        canvas.fill_rect(
            bx,
            baseline - bar_h.max(1),
            bar_w as u32,
            bar_h.max(1) as u32,
            theme::BAR,
        );

        let value_text = format_value(entry.value);
        let vw = canvas.text_width(&value_text, small);
        let vx = (bx + (bar_w - vw as i32) / 2).max(x);
        canvas.draw_text(vx, baseline - bar_h.max(1) - label_lh, &value_text, small, theme::TEXT);

        let label = canvas.truncate(&entry.label, small, step as f32 - 2.0);
        let lw = canvas.text_width(&label, small);
        let lx = (bx + (bar_w - lw as i32) / 2).max(x);
        canvas.draw_text(lx, baseline + 3, &label, small, theme::MUTED);
    }
    CHART_HEIGHT
}

fn format_value(value: f64) -> String {
    if (value - value.round()).abs() < 1e-9 {
        format!("{}", value.round() as i64)
    } else {
        format!("{value:.1}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entries_decode_label_value_pairs() {
        let entries =
            parse_bar_entries(r#"[{"label":"jan","value":3},{"label":"feb","value":5}]"#);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].label, "jan");
        assert_eq!(entries[0].value, 3.0);
        assert_eq!(entries[1].label, "feb");
        assert_eq!(entries[1].value, 5.0);
    }

    #[test]
    fn extra_fields_are_ignored() {
        let entries = parse_bar_entries(r#"[{"label":"x","value":"2","c":9}]"#);
        assert_eq!(entries, vec![BarEntry { label: "x".to_string(), value: 2.0 }]);
    }

    #[test]
    fn labels_coerce_values_must_be_numeric() {
        let entries =
            parse_bar_entries(r#"[{"label":1,"value":2},{"label":"bad","value":"nope"}]"#);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].label, "1");
    }

    #[test]
    fn entries_without_a_value_are_skipped() {
        assert!(parse_bar_entries(r#"[{"label":"lonely"}]"#).is_empty());
        let entries = parse_bar_entries(r#"[{"value":4}]"#);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].label, "");
    }

    #[test]
    fn wrapped_content_object_is_unwrapped() {
        let entries = parse_bar_entries(r#"{"content":[{"label":"a","value":1}]}"#);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].label, "a");
    }

    #[test]
    fn undecodable_content_yields_nothing() {
        assert!(parse_bar_entries("{}").is_empty());
        assert!(parse_bar_entries(r#"{"content":"not an array"}"#).is_empty());
        assert!(parse_bar_entries("not json").is_empty());
        assert!(parse_bar_entries("").is_empty());
    }

    #[test]
    fn values_format_compactly() {
        assert_eq!(format_value(3.0), "3");
        assert_eq!(format_value(2.5), "2.5");
        assert_eq!(format_value(0.0), "0");
    }
}
