//! Batch task tests against in-memory fakes.

mod common;

use std::collections::HashMap;
use std::time::Duration;

use bk21_records::config::sheets;
use bk21_records::error::TaskError;
use bk21_records::mail::MailTemplate;
use bk21_records::models::{Submission, ThesisDetails};
use bk21_records::search::{LinkFinder, Thresholds};
use bk21_records::tasks::{self, Campaign, CollectOptions, MailOptions};

use common::{FakeSearch, FakeSource, MemoryStore, RecordingMailer, table};

const FOUND_LINK: &str =
    "https://www.riss.kr/search/detail/DetailView.do?p_mat_type=be54&control_no=abc123";
const DIRECT_LINK: &str = "https://www.riss.kr/search/detail/DetailView.do?control_no=zz9";

fn thresholds() -> Thresholds {
    Thresholds { min_score: 0.3, accept_score: 0.6 }
}

fn finder<'a>(search: &'a FakeSearch, source: &'a FakeSource) -> LinkFinder<'a> {
    LinkFinder {
        search,
        source,
        results_per_query: 3,
        delay: Duration::ZERO,
        thresholds: thresholds(),
    }
}

fn paper_tab() -> bk21_records::models::Table {
    table(
        sheets::PAPER,
        &[
            &["이름", "학번", "논문명", "RISS_링크"],
            &["홍길동", "2024001", "미군정기 영화 검열 연구", ""],
            &["김철수", "2024002", "", ""],
            &["이영희", "2024003", "존재하지 않는 논문", ""],
            &["박민수", "2024004", "기존 논문", "https://www.riss.kr/link"],
            &["최지훈", "2024005", "다시 찾는 논문", "검색실패"],
        ],
    )
}

// =============================================================================
// collect
// =============================================================================

#[tokio::test]
async fn test_collect_enriches_and_marks_failures() {
    let store = MemoryStore::new(vec![paper_tab()]);
    let search = FakeSearch::answering(&[("미군정기 영화 검열 연구", FOUND_LINK)]);
    let source = FakeSource {
        details: HashMap::from([(
            FOUND_LINK.to_string(),
            ThesisDetails {
                control_no: "abc123".into(),
                abstract_text: "이 논문은 미군정기의 영화 검열을 다룬다.".into(),
                keywords: "영화, 검열".into(),
            },
        )]),
        candidates: Vec::new(),
    };

    let summary = tasks::collect(&store, &finder(&search, &source), &CollectOptions::default())
        .await
        .unwrap();

    assert_eq!(summary.searched, 3);
    assert_eq!(summary.found, 1);
    assert_eq!(summary.not_found, 2);
    assert_eq!(summary.skipped, 2);
    assert_eq!(summary.write_errors, 0);

    let result = store.table(sheets::PAPER);
    assert_eq!(result.headers, vec!["이름", "학번", "논문명", "RISS_링크", "논문ID", "초록", "주제어"]);

    let rows: Vec<_> = result.records().collect();
    assert_eq!(rows[0].get(sheets::RISS_LINK), FOUND_LINK);
    assert_eq!(rows[0].get(sheets::PAPER_ID), "abc123");
    assert_eq!(rows[0].get(sheets::KEYWORDS), "영화, 검열");
    assert!(rows[0].get(sheets::ABSTRACT).starts_with("이 논문은"));

    // Empty link cell gets the failure marker, an existing URL stays.
    assert_eq!(rows[2].get(sheets::RISS_LINK), sheets::SEARCH_FAILED);
    assert_eq!(rows[3].get(sheets::RISS_LINK), "https://www.riss.kr/link");
    assert_eq!(rows[4].get(sheets::RISS_LINK), sheets::SEARCH_FAILED);

    // No write touched rows 3, 5 or 6.
    assert!(store.writes().iter().all(|(_, row, _, _)| ![3, 5, 6].contains(row)));
}

#[tokio::test]
async fn test_collect_direct_match_falls_back_to_link_control_no() {
    let store = MemoryStore::new(vec![table(
        sheets::PAPER,
        &[&["이름", "논문명"], &["홍길동", "한국 근대 소설의 형성"]],
    )]);
    let search = FakeSearch::default();
    let source = FakeSource {
        details: HashMap::new(),
        candidates: vec![
            ("전혀 다른 제목".into(), "https://www.riss.kr/search/detail/DetailView.do?control_no=no".into()),
            ("한국 근대 소설의 형성 연구".into(), DIRECT_LINK.into()),
        ],
    };

    let summary = tasks::collect(&store, &finder(&search, &source), &CollectOptions::default())
        .await
        .unwrap();
    assert_eq!(summary.found, 1);

    let result = store.table(sheets::PAPER);
    let row = result.records().next().unwrap();
    assert_eq!(row.get(sheets::RISS_LINK), DIRECT_LINK);
    assert_eq!(row.get(sheets::PAPER_ID), "zz9");
    assert_eq!(row.get(sheets::ABSTRACT), "");

    // Web search ran every stage before the repository search.
    assert_eq!(search.queries.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn test_collect_counts_write_errors_and_respects_limit() {
    let store = MemoryStore::new(vec![paper_tab()]).failing_on(&[2]);
    let search = FakeSearch::answering(&[("미군정기", FOUND_LINK)]);
    let source = FakeSource::default();
    let options = CollectOptions { limit: Some(1), ..Default::default() };

    let summary = tasks::collect(&store, &finder(&search, &source), &options).await.unwrap();

    assert_eq!(summary.searched, 1);
    assert_eq!(summary.write_errors, 1);
    assert!(store.writes().iter().all(|(_, row, _, _)| *row == 1));
}

#[tokio::test]
async fn test_collect_requires_title_column() {
    let store = MemoryStore::new(vec![table(sheets::PAPER, &[&["이름"], &["홍길동"]])]);
    let search = FakeSearch::default();
    let source = FakeSource::default();

    let err = tasks::collect(&store, &finder(&search, &source), &CollectOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, TaskError::MissingColumn { .. }));
}

// =============================================================================
// mailing
// =============================================================================

fn check_roster() -> bk21_records::models::Table {
    table(
        sheets::CHECK_LIST,
        &[
            &["name_2", "email", "Student_No", "개별시트링크", "발송여부"],
            &["홍길동", "a@example.com", "2024001", "https://docs.google.com/a", ""],
            &["김철수", "b@example.com", "2024002", "https://docs.google.com/b", "Sent"],
            &["이영희", "", "2024003", "https://docs.google.com/c", ""],
            &["박민수", "d@example.com", "2024004", "", ""],
            &["최지훈", "e@example.com", "2024005", "https://docs.google.com/e", ""],
            &["정수진", "f@example.com", "2024006", "https://docs.google.com/f", ""],
        ],
    )
}

fn flags() -> bk21_records::models::Table {
    table(
        sheets::PAPER,
        &[&["학번", "연구성과유무"], &["2024001", "X"], &["2024006", "O"]],
    )
}

#[tokio::test]
async fn test_check_campaign_skips_and_marks() {
    let store = MemoryStore::new(vec![check_roster(), flags()]);
    let mailer = RecordingMailer::rejecting(&["e@example.com"]);
    let options = MailOptions { deadline: "1월 24일(토) 오전".into(), ..Default::default() };

    let summary = tasks::run_campaign(&store, &mailer, Campaign::Check, &options).await.unwrap();

    assert_eq!(summary.sent, 2);
    assert_eq!(summary.already_sent, 1);
    assert_eq!(summary.incomplete, 1);
    assert_eq!(summary.no_link, 1);
    assert_eq!(summary.failed, 1);

    assert_eq!(mailer.recipients(), vec!["a@example.com", "f@example.com"]);
    let sent = mailer.sent.lock().unwrap().clone();
    assert!(sent[0].subject.starts_with("[중요] 홍길동"));
    assert!(sent[1].subject.contains("(정수진 학생)"));

    // Exactly the delivered rows are marked.
    let marked: Vec<usize> = store.writes().iter().map(|(_, row, _, _)| *row).collect();
    assert_eq!(marked, vec![2, 7]);
    assert!(store.writes().iter().all(|(tab, _, col, value)| {
        tab == sheets::CHECK_LIST && *col == 4 && value == sheets::SENT
    }));
}

#[tokio::test]
async fn test_rerun_sends_nothing_twice() {
    let roster = table(
        sheets::INVITE_LIST,
        &[
            &["Name_2", "E-mail", "발송여부"],
            &["홍길동", "a@example.com", ""],
            &["김철수", "b@example.com", ""],
        ],
    );
    let store = MemoryStore::new(vec![roster]);
    let mailer = RecordingMailer::default();
    let options = MailOptions {
        template: Some(MailTemplate::new("# 안내\n{{이름}}님, 연구실적을 입력해 주세요.")),
        deadline: "1/23".into(),
        ..Default::default()
    };

    let first = tasks::run_campaign(&store, &mailer, Campaign::Invite, &options).await.unwrap();
    let second = tasks::run_campaign(&store, &mailer, Campaign::Invite, &options).await.unwrap();

    assert_eq!(first.sent, 2);
    assert_eq!(second.sent, 0);
    assert_eq!(second.already_sent, 2);
    assert_eq!(mailer.recipients().len(), 2);

    let mail = &mailer.sent.lock().unwrap()[0];
    assert_eq!(mail.subject, "[BK21] 연구실적 입력 요청 (1/23 마감)");
    assert!(mail.html.contains("홍길동님, 연구실적을 입력해 주세요."));
}

#[tokio::test]
async fn test_dry_run_neither_sends_nor_writes() {
    let roster = table(
        sheets::REMIND_LIST,
        &[&["name_2", "email", "발송여부"], &["홍길동", "a@example.com", ""]],
    );
    let store = MemoryStore::new(vec![roster]);
    let mailer = RecordingMailer::default();
    let options = MailOptions {
        template: Some(MailTemplate::from_text("# 제목\n본문입니다.", true)),
        deadline: "1/25".into(),
        dry_run: true,
        ..Default::default()
    };

    let summary = tasks::run_campaign(&store, &mailer, Campaign::Remind, &options).await.unwrap();

    assert_eq!(summary.sent, 1);
    assert_eq!(summary.previews.len(), 1);
    assert!(summary.previews[0].subject.starts_with("[긴급] 홍길동 학생"));
    assert!(!summary.previews[0].html.contains("제목"));
    assert!(mailer.recipients().is_empty());
    assert!(store.writes().is_empty());
}

#[tokio::test]
async fn test_campaign_setup_errors() {
    let store = MemoryStore::new(vec![table(
        sheets::INVITE_LIST,
        &[&["Name_2", "E-mail"], &["홍길동", "a@example.com"]],
    )]);
    let mailer = RecordingMailer::default();

    let no_template =
        tasks::run_campaign(&store, &mailer, Campaign::Invite, &MailOptions::default()).await;
    assert!(matches!(no_template, Err(TaskError::Config(_))));

    let options =
        MailOptions { template: Some(MailTemplate::new("본문")), ..Default::default() };
    let no_status = tasks::run_campaign(&store, &mailer, Campaign::Invite, &options).await;
    assert!(matches!(no_status, Err(TaskError::MissingColumn { .. })));
    assert!(mailer.recipients().is_empty());
}

// =============================================================================
// submit and probe
// =============================================================================

fn submission() -> Submission {
    serde_json::from_value(serde_json::json!({
        "name": "홍길동",
        "student_id": "2024001",
        "items": [
            {"kind": "paper", "role": "제1저자", "title": "미군정기 영화 검열 연구", "author_count": 2},
            {"kind": "conference", "role": "발표자", "title": "해방기 영화 담론"}
        ]
    }))
    .unwrap()
}

#[tokio::test]
async fn test_submit_appends_one_row_per_item() {
    let store = MemoryStore::default();

    let written = tasks::submit(&store, "응답", &submission(), "2025-01-20 10:00:00").await.unwrap();

    assert_eq!(written, 2);
    let appended = store.appended();
    assert_eq!(appended.len(), 1);
    assert_eq!(appended[0].0, "응답");
    assert_eq!(appended[0].1[1][3], "학술대회 발표");
    assert_eq!(appended[0].1[0][0], "2025-01-20 10:00:00");
}

#[tokio::test]
async fn test_submit_rejects_invalid_submission() {
    let store = MemoryStore::default();
    let mut invalid = submission();
    invalid.student_id = " ".into();

    let err = tasks::submit(&store, "응답", &invalid, "now").await.unwrap_err();
    assert!(matches!(err, TaskError::Validation { .. }));
    assert!(store.appended().is_empty());
}

#[tokio::test]
async fn test_probe_adds_site_filter_once() {
    let search = FakeSearch::answering(&[("영화", FOUND_LINK)]);

    let results = tasks::probe(&search, "영화 검열", 5).await.unwrap();
    tasks::probe(&search, "site:riss.kr 영화", 5).await.unwrap();

    assert_eq!(results.len(), 1);
    let queries = search.queries.lock().unwrap().clone();
    assert_eq!(queries, vec!["site:riss.kr 영화 검열", "site:riss.kr 영화"]);
}
