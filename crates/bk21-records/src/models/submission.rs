//! Research output submitted by a student.

use serde::{Deserialize, Serialize};

use crate::error::{TaskError, TaskResult};

/// Kind of research output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputKind {
    /// Journal paper.
    #[serde(rename = "논문", alias = "paper")]
    Paper,
    /// Book.
    #[serde(rename = "저서", alias = "book")]
    Book,
    /// Conference talk.
    #[serde(rename = "학술대회 발표", alias = "conference")]
    Conference,
}

impl OutputKind {
    /// Sheet label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Paper => "논문",
            Self::Book => "저서",
            Self::Conference => "학술대회 발표",
        }
    }

    /// Roles a student may hold for this kind of output.
    #[must_use]
    pub const fn roles(self) -> &'static [Role] {
        match self {
            Self::Paper => &[Role::Sole, Role::FirstAuthor, Role::CoAuthor, Role::Corresponding],
            Self::Book => {
                &[Role::SoleAuthor, Role::ChapterCoAuthor, Role::FullCoAuthor, Role::Editor]
            }
            Self::Conference => &[Role::Presenter, Role::CoResearcher],
        }
    }
}

/// Participation role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    /// Only author of a paper.
    #[serde(rename = "단독")]
    Sole,
    /// First author.
    #[serde(rename = "제1저자")]
    FirstAuthor,
    /// Co-author.
    #[serde(rename = "공동저자")]
    CoAuthor,
    /// Corresponding author.
    #[serde(rename = "교신저자")]
    Corresponding,
    /// Only author of a book.
    #[serde(rename = "단독저자")]
    SoleAuthor,
    /// Wrote some chapters of a co-authored book.
    #[serde(rename = "공동저자(챕터 집필)")]
    ChapterCoAuthor,
    /// Co-wrote a whole book.
    #[serde(rename = "공동저자(전체 공저)")]
    FullCoAuthor,
    /// Lead author or editor.
    #[serde(rename = "대표저자/에디터")]
    Editor,
    /// Presented the talk.
    #[serde(rename = "발표자")]
    Presenter,
    /// Co-researcher who did not present.
    #[serde(rename = "공동연구자(발표안함)")]
    CoResearcher,
}

impl Role {
    /// Sheet label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Sole => "단독",
            Self::FirstAuthor => "제1저자",
            Self::CoAuthor => "공동저자",
            Self::Corresponding => "교신저자",
            Self::SoleAuthor => "단독저자",
            Self::ChapterCoAuthor => "공동저자(챕터 집필)",
            Self::FullCoAuthor => "공동저자(전체 공저)",
            Self::Editor => "대표저자/에디터",
            Self::Presenter => "발표자",
            Self::CoResearcher => "공동연구자(발표안함)",
        }
    }
}

fn default_author_count() -> u32 {
    1
}

/// One research output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionItem {
    /// Output kind.
    pub kind: OutputKind,

    /// Student's role.
    pub role: Role,

    /// All authors in published order.
    #[serde(default)]
    pub authors_all: String,

    /// Total number of authors.
    #[serde(default = "default_author_count")]
    pub author_count: u32,

    /// Paper, book or talk title.
    pub title: String,

    /// Journal, publisher or conference.
    #[serde(default)]
    pub venue: String,

    /// Volume/issue/pages, ISBN or venue location.
    #[serde(default)]
    pub details: String,

    /// Publication or presentation date.
    #[serde(default)]
    pub date: String,
}

/// A student's submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submission {
    /// Student name.
    pub name: String,

    /// Student number.
    pub student_id: String,

    /// Outputs.
    #[serde(default)]
    pub items: Vec<SubmissionItem>,
}

impl Submission {
    /// Check required fields and role/kind consistency.
    pub fn validate(&self) -> TaskResult<()> {
        if self.name.trim().is_empty() {
            return Err(TaskError::validation("name", "cannot be empty"));
        }
        if self.student_id.trim().is_empty() {
            return Err(TaskError::validation("student_id", "cannot be empty"));
        }
        if self.items.is_empty() {
            return Err(TaskError::validation("items", "at least one output is required"));
        }

        for (i, item) in self.items.iter().enumerate() {
            if !item.kind.roles().contains(&item.role) {
                return Err(TaskError::validation(
                    format!("items[{i}].role"),
                    format!("'{}' is not a valid role for {}", item.role.label(), item.kind.label()),
                ));
            }
            if item.author_count == 0 {
                return Err(TaskError::validation(
                    format!("items[{i}].author_count"),
                    "must be at least 1",
                ));
            }
            if item.title.trim().is_empty() {
                return Err(TaskError::validation(format!("items[{i}].title"), "cannot be empty"));
            }
        }

        Ok(())
    }

    /// Rows for the intake sheet: timestamp, name, id, kind, role, authors,
    /// author count, title, venue, details, date, remark.
    #[must_use]
    pub fn to_rows(&self, timestamp: &str) -> Vec<Vec<String>> {
        self.items
            .iter()
            .map(|item| {
                vec![
                    timestamp.to_string(),
                    self.name.trim().to_string(),
                    self.student_id.trim().to_string(),
                    item.kind.label().to_string(),
                    item.role.label().to_string(),
                    item.authors_all.clone(),
                    item.author_count.to_string(),
                    item.title.clone(),
                    item.venue.clone(),
                    item.details.clone(),
                    item.date.clone(),
                    String::new(),
                ]
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Submission {
        serde_json::from_str(
            r#"{
                "name": "홍길동",
                "student_id": "20241234",
                "items": [{
                    "kind": "논문",
                    "role": "제1저자",
                    "authors_all": "홍길동, 김철수",
                    "author_count": 2,
                    "title": "미군정기 영화 검열 연구",
                    "venue": "한국문학연구",
                    "details": "Vol.10, No.2, pp.10-20",
                    "date": "2024-05"
                }]
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_valid_submission() {
        assert!(sample().validate().is_ok());
    }

    #[test]
    fn test_role_must_match_kind() {
        let mut submission = sample();
        submission.items[0].role = Role::Presenter;
        let err = submission.validate().unwrap_err();
        assert!(err.to_string().contains("items[0].role"));
    }

    #[test]
    fn test_empty_items_rejected() {
        let mut submission = sample();
        submission.items.clear();
        assert!(submission.validate().is_err());
    }

    #[test]
    fn test_rows_layout() {
        let rows = sample().to_rows("2025-01-20 10:00:00");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].len(), 12);
        assert_eq!(rows[0][3], "논문");
        assert_eq!(rows[0][4], "제1저자");
        assert_eq!(rows[0][6], "2");
        assert_eq!(rows[0][11], "");
    }

    #[test]
    fn test_kind_alias() {
        let kind: OutputKind = serde_json::from_str(r#""conference""#).unwrap();
        assert_eq!(kind, OutputKind::Conference);
    }

    #[test]
    fn test_role_names_match_labels() {
        for kind in [OutputKind::Paper, OutputKind::Book, OutputKind::Conference] {
            for role in kind.roles() {
                let json = serde_json::to_string(role).unwrap();
                assert_eq!(json, format!("\"{}\"", role.label()));
            }
        }
    }
}
