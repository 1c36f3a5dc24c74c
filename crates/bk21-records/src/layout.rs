//! Formatting requests for the personal review sheets.

use serde_json::{Value, json};

use crate::models::Table;

/// Narrowest column, in pixels.
pub const MIN_WIDTH: u32 = 50;
/// Widest column, in pixels.
pub const MAX_WIDTH: u32 = 350;
/// Pixels per character.
pub const PIXELS_PER_CHAR: f64 = 12.0;
/// Rows sampled when sizing a column.
pub const SAMPLE_ROWS: usize = 50;
/// Header text counts this much wider than body text.
const HEADER_WEIGHT: f64 = 1.5;
/// Columns A..Z get wrapped text.
const WRAP_COLUMNS: usize = 26;
/// Extra rows below the data that get wrapped text too.
const WRAP_SLACK_ROWS: usize = 20;

/// Pixel width for every column of `table`, from the header and the first
/// `sample_rows` rows.
#[must_use]
pub fn column_widths(table: &Table, sample_rows: usize) -> Vec<u32> {
    table
        .headers
        .iter()
        .enumerate()
        .map(|(col, header)| {
            let longest_cell = table
                .rows
                .iter()
                .take(sample_rows)
                .filter_map(|row| row.get(col))
                .map(|cell| cell.chars().count())
                .max()
                .unwrap_or(0);

            let chars = (header.chars().count() as f64 * HEADER_WEIGHT).max(longest_cell as f64);
            let pixels = (chars * PIXELS_PER_CHAR) as u32;
            pixels.clamp(MIN_WIDTH, MAX_WIDTH)
        })
        .collect()
}

/// Set one column's width.
#[must_use]
pub fn column_width_request(sheet_id: i64, col: usize, pixels: u32) -> Value {
    json!({
        "updateDimensionProperties": {
            "range": {
                "sheetId": sheet_id,
                "dimension": "COLUMNS",
                "startIndex": col,
                "endIndex": col + 1
            },
            "properties": { "pixelSize": pixels },
            "fields": "pixelSize"
        }
    })
}

/// Wrap text in columns A..Z down to `rows` rows.
#[must_use]
pub fn wrap_request(sheet_id: i64, rows: usize) -> Value {
    json!({
        "repeatCell": {
            "range": {
                "sheetId": sheet_id,
                "startRowIndex": 0,
                "endRowIndex": rows,
                "startColumnIndex": 0,
                "endColumnIndex": WRAP_COLUMNS
            },
            "cell": { "userEnteredFormat": { "wrapStrategy": "WRAP" } },
            "fields": "userEnteredFormat.wrapStrategy"
        }
    })
}

/// Bold, grey, centered header row.
#[must_use]
pub fn header_style_request(sheet_id: i64) -> Value {
    json!({
        "repeatCell": {
            "range": { "sheetId": sheet_id, "startRowIndex": 0, "endRowIndex": 1 },
            "cell": {
                "userEnteredFormat": {
                    "textFormat": { "bold": true },
                    "backgroundColor": { "red": 0.9, "green": 0.9, "blue": 0.9 },
                    "horizontalAlignment": "CENTER",
                    "verticalAlignment": "MIDDLE"
                }
            },
            "fields": "userEnteredFormat(textFormat,backgroundColor,horizontalAlignment,verticalAlignment)"
        }
    })
}

/// Every request for one data tab: wrapping and widths when there is data,
/// header style always.
#[must_use]
pub fn tab_format_requests(sheet_id: i64, table: &Table) -> Vec<Value> {
    let mut requests = Vec::new();

    if !table.is_empty() {
        requests.push(wrap_request(sheet_id, table.len() + 1 + WRAP_SLACK_ROWS));
        requests.extend(
            column_widths(table, SAMPLE_ROWS)
                .into_iter()
                .enumerate()
                .map(|(col, px)| column_width_request(sheet_id, col, px)),
        );
    }
    requests.push(header_style_request(sheet_id));
    requests
}
