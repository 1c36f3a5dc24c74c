//! Status mail campaigns driven by a roster tab.

use std::collections::HashSet;
use std::fmt;

use serde::Serialize;

use super::is_link;
use crate::config::sheets;
use crate::error::{TaskError, TaskResult};
use crate::google::RecordStore;
use crate::mail::{MailTemplate, Mailer, OutgoingMail, styled};
use crate::models::Record;

const CHECK_BODY: &str = include_str!("../../templates/check.html");
const CHECK_NO_RESULTS_BODY: &str = include_str!("../../templates/check_no_results.html");

/// Which mail to send.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Campaign {
    /// Ask everyone on the list to enter their results.
    Invite,
    /// Ask students to review their personal sheet.
    Check,
    /// Remind students who have not submitted.
    Remind,
}

impl Campaign {
    /// Roster tab of the campaign.
    #[must_use]
    pub const fn roster_tab(self) -> &'static str {
        match self {
            Self::Invite => sheets::INVITE_LIST,
            Self::Check => sheets::CHECK_LIST,
            Self::Remind => sheets::REMIND_LIST,
        }
    }

    /// Whether a leading template heading is dropped.
    #[must_use]
    pub const fn strips_heading(self) -> bool {
        matches!(self, Self::Remind)
    }

    /// Whether a Markdown template file is needed.
    #[must_use]
    pub const fn needs_template(self) -> bool {
        !matches!(self, Self::Check)
    }

    fn default_subject(self) -> &'static str {
        match self {
            Self::Invite => "[BK21] 연구실적 입력 요청 ({{마감}} 마감)",
            Self::Check => "[BK21] 연구실적 입력 결과 확인 요청 ({{이름}} 학생)",
            Self::Remind => {
                "[긴급] {{이름}} 학생, BK21 참여학생 연구실적 유/무를 입력해주세요 ({{마감}} 마감)"
            }
        }
    }
}

const NO_RESULTS_SUBJECT: &str = "[중요] {{이름}} 학생에게, BK21 참여학생 연구실적 입력 결과 확인 요청";

/// Campaign settings.
#[derive(Debug, Clone, Default)]
pub struct MailOptions {
    /// Markdown body for invite and remind.
    pub template: Option<MailTemplate>,

    /// Subject override; `{{이름}}` and `{{마감}}` are substituted.
    pub subject: Option<String>,

    /// Deadline text substituted for `{{마감}}`.
    pub deadline: String,

    /// Render without sending or writing.
    pub dry_run: bool,
}

/// Outcome of a campaign.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MailSummary {
    /// Mails delivered (or rendered, on a dry run).
    pub sent: usize,

    /// Rows already marked `Sent`.
    pub already_sent: usize,

    /// Rows without a name or email.
    pub incomplete: usize,

    /// Check rows without a personal sheet link.
    pub no_link: usize,

    /// Delivery failures.
    pub failed: usize,

    /// Sent mails whose status cell could not be written.
    pub write_errors: usize,

    /// Rendered mails, kept on dry runs.
    #[serde(skip)]
    pub previews: Vec<OutgoingMail>,
}

impl fmt::Display for MailSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "sent {}, already sent {}, incomplete {}, no link {}, failed {}, write errors {}",
            self.sent, self.already_sent, self.incomplete, self.no_link, self.failed, self.write_errors
        )
    }
}

/// Students whose paper rows are flagged as having no results.
#[must_use]
pub fn no_result_students(paper: &crate::models::Table) -> HashSet<String> {
    if paper.column(sheets::HAS_RESULTS).is_none() || paper.column(sheets::STUDENT_ID).is_none() {
        tracing::warn!(
            tab = %paper.name,
            "No results flag or student id column missing; every student gets the regular mail"
        );
        return HashSet::new();
    }

    paper
        .records()
        .filter(|r| r.get(sheets::HAS_RESULTS) == sheets::NO_RESULTS)
        .map(|r| r.get(sheets::STUDENT_ID).to_string())
        .collect()
}

struct Composer<'a> {
    campaign: Campaign,
    options: &'a MailOptions,
    no_results: HashSet<String>,
}

impl Composer<'_> {
    fn compose(&self, record: &Record<'_>, name: &str, email: &str) -> OutgoingMail {
        let link = record.get(sheets::PERSONAL_LINK);
        let vars = [("이름", name), ("링크", link), ("마감", self.options.deadline.as_str())];

        let (subject, body) = match self.campaign {
            Campaign::Check => {
                let student_id = record.get_any(&[sheets::STUDENT_NO, sheets::STUDENT_ID]);
                if self.no_results.contains(student_id) {
                    (NO_RESULTS_SUBJECT, MailTemplate::new(CHECK_NO_RESULTS_BODY).render(&vars))
                } else {
                    (self.subject(), MailTemplate::new(CHECK_BODY).render(&vars))
                }
            }
            Campaign::Invite | Campaign::Remind => (
                self.subject(),
                self.options.template.as_ref().map(|t| t.render_html(&vars)).unwrap_or_default(),
            ),
        };

        OutgoingMail {
            to: email.to_string(),
            subject: MailTemplate::new(subject).render(&vars),
            html: styled(&body),
        }
    }

    fn subject(&self) -> &str {
        self.options.subject.as_deref().unwrap_or(self.campaign.default_subject())
    }
}

/// Send one campaign. Rows marked `Sent` are never mailed again; after each
/// delivery the row is marked `Sent`.
pub async fn run_campaign(
    store: &dyn RecordStore,
    mailer: &dyn Mailer,
    campaign: Campaign,
    options: &MailOptions,
) -> TaskResult<MailSummary> {
    if campaign.needs_template() && options.template.is_none() {
        return Err(TaskError::config(format!("{campaign:?} mail needs a template file")));
    }

    let roster = store.read_table(campaign.roster_tab()).await?;
    let status_col = roster.require_column(sheets::MAIL_STATUS)?;

    let no_results = if campaign == Campaign::Check {
        no_result_students(&store.read_table(sheets::PAPER).await?)
    } else {
        HashSet::new()
    };
    let composer = Composer { campaign, options, no_results };

    tracing::info!(?campaign, rows = roster.len(), dry_run = options.dry_run, "Campaign started");
    let mut summary = MailSummary::default();

    for record in roster.records() {
        let name = record.get_any(&[sheets::NAME, sheets::NAME_LOWER]);
        let email = record.get_any(sheets::EMAIL);

        if name.is_empty() || email.is_empty() {
            summary.incomplete += 1;
            continue;
        }
        if campaign == Campaign::Check && !is_link(record.get(sheets::PERSONAL_LINK)) {
            summary.no_link += 1;
            continue;
        }
        if record.get(sheets::MAIL_STATUS) == sheets::SENT {
            tracing::info!(name, "Already sent");
            summary.already_sent += 1;
            continue;
        }

        let mail = composer.compose(&record, name, email);

        if options.dry_run {
            tracing::info!(name, to = email, subject = %mail.subject, "Dry run");
            summary.sent += 1;
            summary.previews.push(mail);
            continue;
        }

        match mailer.send(&mail).await {
            Ok(()) => {
                summary.sent += 1;
                if let Err(e) =
                    store.update_cell(&roster.name, record.row_number, status_col, sheets::SENT).await
                {
                    tracing::warn!(name, error = %e, "Could not mark row as sent");
                    summary.write_errors += 1;
                }
            }
            Err(e) => {
                tracing::warn!(name, to = email, error = %e, "Delivery failed");
                summary.failed += 1;
            }
        }
    }

    tracing::info!(?campaign, %summary, "Campaign finished");
    Ok(summary)
}
