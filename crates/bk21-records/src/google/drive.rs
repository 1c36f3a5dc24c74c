//! Google Drive v3 client: folders, permissions, copies.

use reqwest::Method;
use serde::de::IgnoredAny;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::GoogleClient;
use crate::config::Config;
use crate::error::ClientResult;

/// MIME type of Drive folders.
pub const FOLDER_MIME: &str = "application/vnd.google-apps.folder";

const FILE_FIELDS: &str = "id,name,mimeType,parents,webViewLink";

/// A Drive file or folder.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriveFile {
    /// File id.
    pub id: String,

    /// Display name.
    #[serde(default)]
    pub name: String,

    /// MIME type.
    #[serde(default)]
    pub mime_type: String,

    /// Parent folder ids.
    #[serde(default)]
    pub parents: Vec<String>,

    /// Browser link.
    #[serde(default)]
    pub web_view_link: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FileList {
    #[serde(default)]
    files: Vec<DriveFile>,
}

/// Quote a value for a Drive search query.
#[must_use]
pub fn quote(value: &str) -> String {
    format!("'{}'", value.replace('\\', "\\\\").replace('\'', "\\'"))
}

/// Query for a non-trashed folder by name, optionally under a parent.
#[must_use]
pub fn folder_query(name: &str, parent: Option<&str>) -> String {
    let mut query =
        format!("mimeType='{FOLDER_MIME}' and name={} and trashed=false", quote(name));
    if let Some(parent) = parent {
        query.push_str(&format!(" and {} in parents", quote(parent)));
    }
    query
}

/// Drive API client.
#[derive(Debug, Clone)]
pub struct DriveClient {
    google: GoogleClient,
    base_url: String,
}

impl DriveClient {
    /// Create a new client.
    #[must_use]
    pub fn new(config: &Config, google: GoogleClient) -> Self {
        Self { google, base_url: config.drive_api_url.trim_end_matches('/').to_string() }
    }

    fn files_url(&self) -> String {
        format!("{}/files", self.base_url)
    }

    fn file_url(&self, id: &str) -> String {
        format!("{}/files/{id}", self.base_url)
    }

    /// First folder with this name (under `parent` when given).
    pub async fn find_folder(&self, name: &str, parent: Option<&str>) -> ClientResult<Option<String>> {
        let query = folder_query(name, parent);
        let list: FileList = self
            .google
            .get_json(&self.files_url(), &[("q", query.as_str()), ("fields", "files(id, name)")])
            .await?;

        let found = list.files.into_iter().next().map(|f| f.id);
        tracing::debug!(name, found = found.is_some(), "Folder lookup");
        Ok(found)
    }

    /// Create a folder (under `parent` when given).
    pub async fn create_folder(&self, name: &str, parent: Option<&str>) -> ClientResult<String> {
        let mut body = json!({ "name": name, "mimeType": FOLDER_MIME });
        if let Some(parent) = parent {
            body["parents"] = json!([parent]);
        }

        let file: DriveFile =
            self.google.send_json(Method::POST, &self.files_url(), &[("fields", "id")], &body).await?;
        tracing::info!(name, id = %file.id, "Created folder");
        Ok(file.id)
    }

    /// Existing folder id, or a newly created one.
    pub async fn find_or_create_folder(&self, name: &str, parent: Option<&str>) -> ClientResult<String> {
        match self.find_folder(name, parent).await? {
            Some(id) => Ok(id),
            None => self.create_folder(name, parent).await,
        }
    }

    /// Grant read access to anyone with the link.
    pub async fn make_public(&self, id: &str) -> ClientResult<()> {
        let url = format!("{}/permissions", self.file_url(id));
        let body = json!({ "type": "anyone", "role": "reader" });

        let _: IgnoredAny =
            self.google.send_json(Method::POST, &url, &[("fields", "id")], &body).await?;
        Ok(())
    }

    /// File metadata.
    pub async fn get(&self, id: &str) -> ClientResult<DriveFile> {
        self.google.get_json(&self.file_url(id), &[("fields", FILE_FIELDS)]).await
    }

    /// Move a file into `folder`, detaching it from its current parents.
    pub async fn move_file(&self, id: &str, folder: &str) -> ClientResult<()> {
        let current = self.get(id).await?;
        let previous = current.parents.join(",");

        let _: IgnoredAny = self
            .google
            .send_json(
                Method::PATCH,
                &self.file_url(id),
                &[("addParents", folder), ("removeParents", previous.as_str()), ("fields", "id,parents")],
                &json!({}),
            )
            .await?;
        tracing::debug!(id, folder, "Moved file");
        Ok(())
    }

    /// Copy a file into `folder` under a new name.
    pub async fn copy_file(&self, id: &str, folder: &str, new_name: &str) -> ClientResult<DriveFile> {
        let url = format!("{}/copy", self.file_url(id));
        let body = json!({ "name": new_name, "parents": [folder] });

        let copy: DriveFile =
            self.google.send_json(Method::POST, &url, &[("fields", FILE_FIELDS)], &body).await?;
        tracing::info!(source = id, copy = %copy.id, name = new_name, "Copied file");
        Ok(copy)
    }

    /// Delete a file or folder (folders take their contents with them).
    pub async fn delete(&self, id: &str) -> ClientResult<()> {
        self.google.delete(&self.file_url(id), &[]).await?;
        tracing::info!(id, "Deleted file");
        Ok(())
    }
}
