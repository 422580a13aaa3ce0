use serde_json::Value;

use crate::record::model::Row;
use crate::ui::canvas::{Canvas, TextStyle};
use crate::ui::theme;

const CELL_PAD: i32 = 6;
const MIN_COL_WIDTH: i32 = 56;

/// Column layout for a result set. The first row dictates the columns, in
/// the order the server sent them; later rows may miss keys and render
/// empty cells. The fingerprint names the column shape for the logs.
pub struct TablePlan {
    pub columns: Vec<String>,
    pub fingerprint: String,
}

pub fn plan_columns(rows: &[Row]) -> Option<TablePlan> {
    let first = rows.first()?;
    let columns: Vec<String> = first.keys().cloned().collect();
    if columns.is_empty() {
        return None;
    }
    let fingerprint = columns.join("-");
    Some(TablePlan {
        columns,
        fingerprint,
    })
}

pub fn cell_text(row: &Row, column: &str) -> String {
    match row.get(column) {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(text)) => text.clone(),
        Some(other) => other.to_string(),
    }
}

fn row_height(canvas: &Canvas) -> i32 {
    canvas.line_height(TextStyle::sans(canvas.base_size() * 0.85)) + 6
}

/// One line for the header, one per row. Every row is drawn; a result taller
/// than the window spills off the bottom like any other long card body.
fn line_count(rows: &[Row]) -> i32 {
    rows.len() as i32 + 1
}

pub fn height(canvas: &Canvas, rows: &[Row]) -> i32 {
    if plan_columns(rows).is_none() {
        return 0;
    }
    row_height(canvas) * line_count(rows)
}

pub fn draw(canvas: &mut Canvas, x: i32, y: i32, width: i32, rows: &[Row]) -> i32 {
    let Some(plan) = plan_columns(rows) else {
        return 0;
    };
    tracing::trace!(fingerprint = %plan.fingerprint, rows = rows.len(), "drawing result table");

    let style = TextStyle::sans(canvas.base_size() * 0.85);
    let header_style = style.bold();
    let rh = row_height(canvas);

    let max_cols = ((width / MIN_COL_WIDTH).max(1) as usize).min(plan.columns.len());
    let columns = &plan.columns[..max_cols];
    let col_w = width / columns.len() as i32;

    canvas.fill_rect(x, y, width as u32, rh as u32, theme::TABLE_HEAD_BG);
    for (c, column) in columns.iter().enumerate() {
        let cx = x + c as i32 * col_w;
        let text = canvas.truncate(column, header_style, (col_w - 2 * CELL_PAD) as f32);
        canvas.draw_text(cx + CELL_PAD, y + 3, &text, header_style, theme::TEXT);
    }

    for (r, row) in rows.iter().enumerate() {
        let ry = y + rh * (r as i32 + 1);
        canvas.draw_line(x, ry, x + width, ry, theme::GRID, 1);
        for (c, column) in columns.iter().enumerate() {
            let cx = x + c as i32 * col_w;
            let text = canvas.truncate(&cell_text(row, column), style, (col_w - 2 * CELL_PAD) as f32);
            canvas.draw_text(cx + CELL_PAD, ry + 3, &text, style, theme::TEXT);
        }
    }
    let used = rh * line_count(rows);
    for c in 1..columns.len() {
        let cx = x + c as i32 * col_w;
        canvas.draw_line(cx, y, cx, y + used, theme::GRID, 1);
    }
    used
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(json: &str) -> Row {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn first_row_dictates_columns_in_order() {
        let rows = vec![row(r#"{"z":1,"a":2}"#), row(r#"{"a":3,"extra":4}"#)];
        let plan = plan_columns(&rows).unwrap();
        assert_eq!(plan.columns, vec!["z", "a"]);
        assert_eq!(plan.fingerprint, "z-a");
    }

    #[test]
    fn missing_cells_render_empty() {
        let rows = vec![row(r#"{"a":1,"b":2}"#), row(r#"{"a":3}"#)];
        let plan = plan_columns(&rows).unwrap();
        assert_eq!(cell_text(&rows[1], &plan.columns[0]), "3");
        assert_eq!(cell_text(&rows[1], &plan.columns[1]), "");
    }

    #[test]
    fn cells_coerce_to_text() {
        let single = row(r#"{"s":"plain","n":4.5,"b":true,"nul":null,"o":{"k":1}}"#);
        assert_eq!(cell_text(&single, "s"), "plain");
        assert_eq!(cell_text(&single, "n"), "4.5");
        assert_eq!(cell_text(&single, "b"), "true");
        assert_eq!(cell_text(&single, "nul"), "");
        assert_eq!(cell_text(&single, "o"), r#"{"k":1}"#);
    }

    #[test]
    fn no_rows_no_plan() {
        assert!(plan_columns(&[]).is_none());
        assert!(plan_columns(&[Row::new()]).is_none());
    }

    #[test]
    fn every_row_gets_a_line() {
        let rows: Vec<Row> = (0..30).map(|i| row(&format!(r#"{{"n":{i}}}"#))).collect();
        assert_eq!(line_count(&rows), 31);
        assert_eq!(line_count(&rows[..1]), 2);
    }
}
