//! Google Sheets v4 client and the spreadsheet-backed record store.

use reqwest::Method;
use serde::de::IgnoredAny;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use url::Url;

use super::GoogleClient;
use crate::config::Config;
use crate::error::{ClientError, ClientResult};
use crate::models::{Table, a1};

/// Sheet tab properties.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetProperties {
    /// Numeric tab id used by batch updates.
    pub sheet_id: i64,

    /// Tab title.
    pub title: String,

    /// Position among the tabs.
    #[serde(default)]
    pub index: u32,
}

/// Spreadsheet metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpreadsheetInfo {
    /// Spreadsheet id.
    pub id: String,

    /// Document title.
    pub title: String,

    /// Browser URL.
    pub url: String,

    /// Tabs in display order.
    pub sheets: Vec<SheetProperties>,
}

impl SpreadsheetInfo {
    /// Tab with the given title.
    #[must_use]
    pub fn sheet(&self, title: &str) -> Option<&SheetProperties> {
        self.sheets.iter().find(|s| s.title == title)
    }

    /// The first tab.
    #[must_use]
    pub fn first_sheet(&self) -> Option<&SheetProperties> {
        self.sheets.iter().min_by_key(|s| s.index)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SpreadsheetResource {
    #[serde(default)]
    spreadsheet_id: String,
    #[serde(default)]
    spreadsheet_url: Option<String>,
    #[serde(default)]
    properties: Option<DocumentProperties>,
    #[serde(default)]
    sheets: Vec<SheetEntry>,
}

#[derive(Debug, Deserialize)]
struct DocumentProperties {
    title: String,
}

#[derive(Debug, Deserialize)]
struct SheetEntry {
    properties: SheetProperties,
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct BatchUpdateResponse {
    #[serde(default)]
    replies: Vec<Value>,
}

/// Browser URL of a spreadsheet.
#[must_use]
pub fn spreadsheet_url(id: &str) -> String {
    format!("https://docs.google.com/spreadsheets/d/{id}/edit")
}

/// Extract the id from a spreadsheet URL. Bare ids are returned unchanged.
#[must_use]
pub fn spreadsheet_id_from_url(input: &str) -> String {
    let input = input.trim();
    input
        .split_once("/spreadsheets/d/")
        .map(|(_, rest)| rest.split(['/', '?', '#']).next().unwrap_or(rest))
        .unwrap_or(input)
        .to_string()
}

/// Sheets API client.
#[derive(Debug, Clone)]
pub struct SheetsClient {
    google: GoogleClient,
    base_url: String,
}

impl SheetsClient {
    /// Create a new client.
    #[must_use]
    pub fn new(config: &Config, google: GoogleClient) -> Self {
        Self { google, base_url: config.sheets_api_url.clone() }
    }

    /// Handle for one spreadsheet (id or URL).
    #[must_use]
    pub fn open(&self, id_or_url: &str) -> Spreadsheet {
        Spreadsheet { client: self.clone(), id: spreadsheet_id_from_url(id_or_url) }
    }

    fn endpoint(&self, segments: &[&str]) -> ClientResult<String> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| ClientError::bad_request(format!("invalid Sheets URL: {e}")))?;
        url.path_segments_mut()
            .map_err(|()| ClientError::bad_request("Sheets URL cannot be a base"))?
            .pop_if_empty()
            .push("spreadsheets")
            .extend(segments);
        Ok(url.into())
    }

    /// Title, URL and tabs of a spreadsheet.
    pub async fn info(&self, spreadsheet_id: &str) -> ClientResult<SpreadsheetInfo> {
        let url = self.endpoint(&[spreadsheet_id])?;
        let resource: SpreadsheetResource = self
            .google
            .get_json(&url, &[("fields", "spreadsheetId,spreadsheetUrl,properties.title,sheets.properties")])
            .await?;
        Ok(to_info(resource, spreadsheet_id))
    }

    /// Document title.
    pub async fn spreadsheet_title(&self, spreadsheet_id: &str) -> ClientResult<String> {
        Ok(self.info(spreadsheet_id).await?.title)
    }

    /// Tab properties in display order.
    pub async fn sheet_ids(&self, spreadsheet_id: &str) -> ClientResult<Vec<SheetProperties>> {
        Ok(self.info(spreadsheet_id).await?.sheets)
    }

    /// Read a whole tab as a table.
    pub async fn read_table(&self, spreadsheet_id: &str, tab: &str) -> ClientResult<Table> {
        let range = a1::qualified(tab, "A:ZZ");
        let url = self.endpoint(&[spreadsheet_id, "values", &range])?;
        let values: ValueRange = self.google.get_json(&url, &[]).await?;

        tracing::debug!(tab, rows = values.values.len(), "Read sheet values");
        Ok(Table::from_values(tab, values.values))
    }

    /// Write values starting at an A1 reference inside a tab.
    pub async fn update_range(
        &self,
        spreadsheet_id: &str,
        tab: &str,
        start: &str,
        values: &[Vec<String>],
    ) -> ClientResult<()> {
        let range = a1::qualified(tab, start);
        let url = self.endpoint(&[spreadsheet_id, "values", &range])?;
        let body = json!({ "range": range, "majorDimension": "ROWS", "values": values });

        let _: IgnoredAny = self
            .google
            .send_json(Method::PUT, &url, &[("valueInputOption", "USER_ENTERED")], &body)
            .await?;
        Ok(())
    }

    /// Write one cell (1-based row, 0-based column).
    pub async fn update_cell(
        &self,
        spreadsheet_id: &str,
        tab: &str,
        row: usize,
        col: usize,
        value: &str,
    ) -> ClientResult<()> {
        self.update_range(spreadsheet_id, tab, &a1::cell(row, col), &[vec![value.to_string()]])
            .await
    }

    /// Append rows after the last non-empty row of a tab.
    pub async fn append_rows(
        &self,
        spreadsheet_id: &str,
        tab: &str,
        rows: &[Vec<String>],
    ) -> ClientResult<()> {
        let range = format!("{}:append", a1::qualified(tab, "A1"));
        let url = self.endpoint(&[spreadsheet_id, "values", &range])?;
        let body = json!({ "majorDimension": "ROWS", "values": rows });

        let _: IgnoredAny = self
            .google
            .send_json(
                Method::POST,
                &url,
                &[("valueInputOption", "USER_ENTERED"), ("insertDataOption", "INSERT_ROWS")],
                &body,
            )
            .await?;
        tracing::debug!(tab, rows = rows.len(), "Appended rows");
        Ok(())
    }

    /// Clear values (not formatting) of a range inside a tab.
    pub async fn clear_range(&self, spreadsheet_id: &str, tab: &str, range: &str) -> ClientResult<()> {
        let range = format!("{}:clear", a1::qualified(tab, range));
        let url = self.endpoint(&[spreadsheet_id, "values", &range])?;

        let _: IgnoredAny = self.google.send_json(Method::POST, &url, &[], &json!({})).await?;
        Ok(())
    }

    /// Run structural or formatting requests; returns one reply per request.
    pub async fn batch_update(
        &self,
        spreadsheet_id: &str,
        requests: Vec<Value>,
    ) -> ClientResult<Vec<Value>> {
        if requests.is_empty() {
            return Ok(Vec::new());
        }
        let url = self.endpoint(&[&format!("{spreadsheet_id}:batchUpdate")])?;
        let body = json!({ "requests": requests });

        let response: BatchUpdateResponse =
            self.google.send_json(Method::POST, &url, &[], &body).await?;
        Ok(response.replies)
    }

    /// Add a tab with the given grid size.
    pub async fn add_sheet(
        &self,
        spreadsheet_id: &str,
        title: &str,
        rows: usize,
        cols: usize,
    ) -> ClientResult<SheetProperties> {
        let request = json!({
            "addSheet": {
                "properties": {
                    "title": title,
                    "gridProperties": { "rowCount": rows, "columnCount": cols }
                }
            }
        });

        let replies = self.batch_update(spreadsheet_id, vec![request]).await?;
        let properties = replies
            .into_iter()
            .next()
            .and_then(|mut reply| reply.get_mut("addSheet").map(|r| r["properties"].take()))
            .ok_or_else(|| ClientError::UnexpectedStatus {
                status: 200,
                message: "addSheet reply missing".to_string(),
            })?;

        tracing::debug!(title, "Added tab");
        Ok(serde_json::from_value(properties)?)
    }

    /// Rename a tab.
    pub async fn rename_sheet(&self, spreadsheet_id: &str, sheet_id: i64, title: &str) -> ClientResult<()> {
        let request = json!({
            "updateSheetProperties": {
                "properties": { "sheetId": sheet_id, "title": title },
                "fields": "title"
            }
        });
        self.batch_update(spreadsheet_id, vec![request]).await?;
        Ok(())
    }

    /// Create an empty spreadsheet in the caller's Drive root.
    pub async fn create_spreadsheet(&self, title: &str) -> ClientResult<SpreadsheetInfo> {
        let url = self.endpoint(&[])?;
        let body = json!({ "properties": { "title": title } });

        let resource: SpreadsheetResource =
            self.google.send_json(Method::POST, &url, &[], &body).await?;
        let info = to_info(resource, "");
        tracing::info!(title, id = %info.id, "Created spreadsheet");
        Ok(info)
    }
}

fn to_info(resource: SpreadsheetResource, fallback_id: &str) -> SpreadsheetInfo {
    let id = if resource.spreadsheet_id.is_empty() {
        fallback_id.to_string()
    } else {
        resource.spreadsheet_id
    };
    let mut sheets: Vec<SheetProperties> = resource.sheets.into_iter().map(|s| s.properties).collect();
    sheets.sort_by_key(|s| s.index);

    SpreadsheetInfo {
        url: resource.spreadsheet_url.unwrap_or_else(|| spreadsheet_url(&id)),
        title: resource.properties.map(|p| p.title).unwrap_or_default(),
        id,
        sheets,
    }
}

/// Row storage used by the batch tasks.
///
/// Rows are 1-based (the header is row 1) and columns are 0-based, matching
/// [`crate::models::Record::row_number`] and [`Table::column`].
#[async_trait::async_trait]
pub trait RecordStore: Send + Sync {
    /// Read a whole tab.
    async fn read_table(&self, tab: &str) -> ClientResult<Table>;

    /// Write one cell.
    async fn update_cell(&self, tab: &str, row: usize, col: usize, value: &str) -> ClientResult<()>;

    /// Append rows at the end of a tab.
    async fn append_rows(&self, tab: &str, rows: &[Vec<String>]) -> ClientResult<()>;

    /// Clear one column from `from_row` down.
    async fn clear_column(&self, tab: &str, col: usize, from_row: usize) -> ClientResult<()>;

    /// Add missing header cells after the last column; returns the column
    /// index of every requested header, in order.
    async fn ensure_columns(&self, table: &mut Table, columns: &[&str]) -> ClientResult<Vec<usize>> {
        let mut indices = Vec::with_capacity(columns.len());
        for &name in columns {
            let col = if let Some(col) = table.column(name) {
                col
            } else {
                let col = table.add_column(name);
                self.update_cell(&table.name, 1, col, name).await?;
                tracing::info!(tab = %table.name, column = name, "Added column");
                col
            };
            indices.push(col);
        }
        Ok(indices)
    }
}

/// One spreadsheet bound to a [`SheetsClient`].
#[derive(Debug, Clone)]
pub struct Spreadsheet {
    client: SheetsClient,
    id: String,
}

impl Spreadsheet {
    /// Spreadsheet id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Title, URL and tabs.
    pub async fn info(&self) -> ClientResult<SpreadsheetInfo> {
        self.client.info(&self.id).await
    }

    /// Title of the first tab.
    pub async fn first_tab(&self) -> ClientResult<String> {
        self.info()
            .await?
            .first_sheet()
            .map(|s| s.title.clone())
            .ok_or_else(|| ClientError::not_found(format!("tabs of spreadsheet {}", self.id)))
    }
}

#[async_trait::async_trait]
impl RecordStore for Spreadsheet {
    async fn read_table(&self, tab: &str) -> ClientResult<Table> {
        self.client.read_table(&self.id, tab).await
    }

    async fn update_cell(&self, tab: &str, row: usize, col: usize, value: &str) -> ClientResult<()> {
        self.client.update_cell(&self.id, tab, row, col, value).await
    }

    async fn append_rows(&self, tab: &str, rows: &[Vec<String>]) -> ClientResult<()> {
        self.client.append_rows(&self.id, tab, rows).await
    }

    async fn clear_column(&self, tab: &str, col: usize, from_row: usize) -> ClientResult<()> {
        let letter = a1::column_letter(col);
        self.client.clear_range(&self.id, tab, &format!("{letter}{from_row}:{letter}")).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spreadsheet_id_from_url() {
        assert_eq!(
            spreadsheet_id_from_url(
                "https://docs.google.com/spreadsheets/d/1nfE8lcFRsUf-YkdV/edit?usp=sharing"
            ),
            "1nfE8lcFRsUf-YkdV"
        );
        assert_eq!(spreadsheet_id_from_url("https://docs.google.com/spreadsheets/d/abc"), "abc");
        assert_eq!(spreadsheet_id_from_url(" abc123 "), "abc123");
    }

    #[test]
    fn test_to_info_sorts_tabs_and_builds_url() {
        let resource: SpreadsheetResource = serde_json::from_value(json!({
            "spreadsheetId": "sid",
            "properties": { "title": "명단" },
            "sheets": [
                { "properties": { "sheetId": 7, "title": "논문", "index": 1 } },
                { "properties": { "sheetId": 0, "title": "안내", "index": 0 } }
            ]
        }))
        .unwrap();

        let info = to_info(resource, "");
        assert_eq!(info.title, "명단");
        assert_eq!(info.url, "https://docs.google.com/spreadsheets/d/sid/edit");
        assert_eq!(info.first_sheet().unwrap().title, "안내");
        assert_eq!(info.sheet("논문").unwrap().sheet_id, 7);
    }

    #[test]
    fn test_endpoint_encodes_range() {
        let config = Config::for_testing("http://localhost:1");
        let google = GoogleClient::new(
            &config,
            std::sync::Arc::new(crate::google::TokenProvider::fixed(&config, "t").unwrap()),
        )
        .unwrap();
        let client = SheetsClient::new(&config, google);

        let url = client.endpoint(&["sid", "values", "'학술 대회'!A:ZZ"]).unwrap();
        assert!(url.starts_with("http://localhost:1/sheets/v4/spreadsheets/sid/values/"));
        assert!(url.contains("%20"));
        assert!(!url.contains(' '));
    }
}
