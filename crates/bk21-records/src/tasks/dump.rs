//! Save the full text of one RISS detail page.

use std::path::{Path, PathBuf};

use crate::client::RissClient;
use crate::error::TaskResult;
use crate::matching;
use crate::models::ThesisDump;

/// File name for a dump: `paper_<stem>.txt`.
#[must_use]
pub fn dump_file_name(dump: &ThesisDump) -> String {
    format!("paper_{}.txt", matching::safe_file_stem(&dump.title))
}

/// Scrape `url` and write the capture into `dir`. Returns the file path.
pub async fn dump(riss: &RissClient, url: &str, dir: &Path) -> TaskResult<PathBuf> {
    let capture = riss.fetch_dump(url).await?;

    tokio::fs::create_dir_all(dir).await?;
    let path = dir.join(dump_file_name(&capture));
    tokio::fs::write(&path, capture.render()).await?;

    tracing::info!(path = %path.display(), title = %capture.title, "Saved page dump");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dump_file_name() {
        let capture = ThesisDump {
            title: "미군정기(1945-1948) 영화 검열: 연구".into(),
            ..Default::default()
        };
        assert_eq!(dump_file_name(&capture), "paper_미군정기19451948 영화 검열 연구.txt");
    }
}
