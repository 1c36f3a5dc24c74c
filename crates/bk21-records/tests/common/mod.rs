//! In-memory fakes shared by the task tests.
#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use bk21_records::error::{ClientError, ClientResult, MailError, MailResult};
use bk21_records::google::RecordStore;
use bk21_records::mail::{Mailer, OutgoingMail};
use bk21_records::models::{OrganicResult, Table, ThesisDetails};
use bk21_records::search::{ThesisSource, WebSearch};

/// Build a table from string literals; the first row is the header.
pub fn table(name: &str, rows: &[&[&str]]) -> Table {
    Table::from_values(
        name,
        rows.iter().map(|r| r.iter().map(|c| (*c).to_string()).collect()).collect(),
    )
}

/// A cell write: tab, 1-based row, 0-based column, value.
pub type CellWrite = (String, usize, usize, String);

/// Spreadsheet held in memory.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<HashMap<String, Table>>,
    writes: Mutex<Vec<CellWrite>>,
    appended: Mutex<Vec<(String, Vec<Vec<String>>)>>,
    failing_rows: HashSet<usize>,
}

impl MemoryStore {
    pub fn new(tables: Vec<Table>) -> Self {
        Self {
            tables: Mutex::new(tables.into_iter().map(|t| (t.name.clone(), t)).collect()),
            ..Default::default()
        }
    }

    /// Writes to these rows fail.
    pub fn failing_on(mut self, rows: &[usize]) -> Self {
        self.failing_rows = rows.iter().copied().collect();
        self
    }

    pub fn table(&self, name: &str) -> Table {
        self.tables.lock().unwrap().get(name).cloned().unwrap_or_default()
    }

    pub fn writes(&self) -> Vec<CellWrite> {
        self.writes.lock().unwrap().clone()
    }

    pub fn appended(&self) -> Vec<(String, Vec<Vec<String>>)> {
        self.appended.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl RecordStore for MemoryStore {
    async fn read_table(&self, tab: &str) -> ClientResult<Table> {
        self.tables
            .lock()
            .unwrap()
            .get(tab)
            .cloned()
            .ok_or_else(|| ClientError::bad_request(format!("Unable to parse range: '{tab}'!A:ZZ")))
    }

    async fn update_cell(&self, tab: &str, row: usize, col: usize, value: &str) -> ClientResult<()> {
        if self.failing_rows.contains(&row) {
            return Err(ClientError::server(503, "backend unavailable"));
        }

        let mut tables = self.tables.lock().unwrap();
        let table = tables.entry(tab.to_string()).or_default();
        if row == 1 {
            while table.headers.len() <= col {
                table.add_column("");
            }
            table.headers[col] = value.to_string();
        } else {
            while table.headers.len() <= col {
                table.add_column("");
            }
            while table.rows.len() < row - 1 {
                table.rows.push(vec![String::new(); table.headers.len()]);
            }
            table.set(row - 2, col, value);
        }

        self.writes.lock().unwrap().push((tab.to_string(), row, col, value.to_string()));
        Ok(())
    }

    async fn append_rows(&self, tab: &str, rows: &[Vec<String>]) -> ClientResult<()> {
        self.appended.lock().unwrap().push((tab.to_string(), rows.to_vec()));
        Ok(())
    }

    async fn clear_column(&self, tab: &str, col: usize, from_row: usize) -> ClientResult<()> {
        let mut tables = self.tables.lock().unwrap();
        if let Some(table) = tables.get_mut(tab) {
            for index in from_row.saturating_sub(2)..table.rows.len() {
                table.set(index, col, "");
            }
        }
        Ok(())
    }
}

/// Web search answering from a fixed map of query substrings to links.
#[derive(Default)]
pub struct FakeSearch {
    answers: Vec<(String, String)>,
    pub queries: Mutex<Vec<String>>,
}

impl FakeSearch {
    pub fn answering(answers: &[(&str, &str)]) -> Self {
        Self {
            answers: answers.iter().map(|(q, l)| ((*q).to_string(), (*l).to_string())).collect(),
            ..Default::default()
        }
    }
}

#[async_trait::async_trait]
impl WebSearch for FakeSearch {
    async fn search(&self, query: &str, _num: u32) -> ClientResult<Vec<OrganicResult>> {
        self.queries.lock().unwrap().push(query.to_string());
        Ok(self
            .answers
            .iter()
            .filter(|(needle, _)| query.contains(needle.as_str()))
            .map(|(_, link)| OrganicResult { link: link.clone(), ..Default::default() })
            .collect())
    }
}

/// Repository with canned detail pages and search anchors.
#[derive(Default)]
pub struct FakeSource {
    pub details: HashMap<String, ThesisDetails>,
    pub candidates: Vec<(String, String)>,
}

#[async_trait::async_trait]
impl ThesisSource for FakeSource {
    async fn fetch_details(&self, url: &str) -> ClientResult<ThesisDetails> {
        self.details.get(url).cloned().ok_or_else(|| ClientError::not_found(url))
    }

    async fn search_candidates(&self, _title: &str) -> ClientResult<Vec<(String, String)>> {
        Ok(self.candidates.clone())
    }
}

/// Mailer recording every message; rejects the listed addresses.
#[derive(Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<OutgoingMail>>,
    pub rejected: HashSet<String>,
}

impl RecordingMailer {
    pub fn rejecting(addresses: &[&str]) -> Self {
        Self { rejected: addresses.iter().map(|a| (*a).to_string()).collect(), ..Default::default() }
    }

    pub fn recipients(&self) -> Vec<String> {
        self.sent.lock().unwrap().iter().map(|m| m.to.clone()).collect()
    }
}

#[async_trait::async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, mail: &OutgoingMail) -> MailResult<()> {
        if self.rejected.contains(&mail.to) {
            return Err(MailError::Build(format!("mailbox unavailable: {}", mail.to)));
        }
        self.sent.lock().unwrap().push(mail.clone());
        Ok(())
    }
}
