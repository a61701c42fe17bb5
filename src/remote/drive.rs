use std::env;
use std::fs::File;
use std::path::Path;
use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder, Response};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};

use crate::error::{RemoteError, Result};
use crate::remote::{RemoteEntry, RemoteStore, FOLDER_MIME, ZIP_MIME};

const API_BASE: &str = "https://www.googleapis.com/drive/v3";
const UPLOAD_BASE: &str = "https://www.googleapis.com/upload/drive/v3";
const ENTRY_FIELDS: &str = "id,name,mimeType";
const LIST_FIELDS: &str = "nextPageToken,files(id,name,mimeType)";
const PAGE_SIZE: &str = "1000";

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileList {
    #[serde(default)]
    next_page_token: Option<String>,
    #[serde(default)]
    files: Vec<RemoteEntry>,
}

/// Google Drive v3 backend. Authentication happens elsewhere; this store only carries a
/// ready OAuth access token.
pub struct DriveStore {
    client: Client,
    token: String,
}

impl DriveStore {
    pub fn from_env(token_env: &str, timeout: Duration) -> Result<Self> {
        let token = env::var(token_env)
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .ok_or_else(|| {
                RemoteError::Auth(format!("environment variable {} is not set", token_env))
            })?;
        Self::new(token, timeout)
    }

    pub fn new(token: String, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(RemoteError::from)?;
        Ok(Self { client, token })
    }

    fn list(&self, parent: &str) -> Result<Vec<RemoteEntry>> {
        let query = children_query(parent);
        let mut out = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let mut params = vec![
                ("q", query.clone()),
                ("fields", LIST_FIELDS.to_string()),
                ("pageSize", PAGE_SIZE.to_string()),
            ];
            if let Some(token) = &page_token {
                params.push(("pageToken", token.clone()));
            }
            let request = self
                .client
                .get(format!("{}/files", API_BASE))
                .query(&params);
            let page: FileList = self
                .send(request)?
                .json()
                .map_err(RemoteError::from)?;
            out.extend(page.files);
            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }
        debug!("listed {} entries under {}", out.len(), parent);
        Ok(out)
    }

    fn send(&self, request: RequestBuilder) -> Result<Response> {
        let response = request
            .bearer_auth(&self.token)
            .send()
            .map_err(RemoteError::from)?;
        let status = response.status().as_u16();
        if response.status().is_success() {
            return Ok(response);
        }
        let body = response.text().unwrap_or_default();
        if status == 401 || status == 403 {
            return Err(RemoteError::Auth(format!(
                "drive rejected the access token ({}): {}",
                status, body
            ))
            .into());
        }
        Err(RemoteError::Status { status, body }.into())
    }
}

impl RemoteStore for DriveStore {
    fn list_root(&self) -> Result<Vec<RemoteEntry>> {
        self.list("root")
    }

    fn list_folder(&self, folder_id: &str) -> Result<Vec<RemoteEntry>> {
        self.list(folder_id)
    }

    fn create_folder(&mut self, name: &str) -> Result<String> {
        let request = self
            .client
            .post(format!("{}/files", API_BASE))
            .query(&[("fields", ENTRY_FIELDS)])
            .json(&json!({ "name": name, "mimeType": FOLDER_MIME }));
        let entry: RemoteEntry = self.send(request)?.json().map_err(RemoteError::from)?;
        Ok(entry.id)
    }

    fn upload(&mut self, local: &Path, name: &str, folder_id: &str) -> Result<RemoteEntry> {
        let file = File::open(local)?;
        let request = self
            .client
            .post(format!("{}/files", API_BASE))
            .query(&[("fields", ENTRY_FIELDS)])
            .json(&json!({ "name": name, "parents": [folder_id], "mimeType": ZIP_MIME }));
        let entry: RemoteEntry = self.send(request)?.json().map_err(RemoteError::from)?;

        let request = self
            .client
            .patch(format!("{}/files/{}", UPLOAD_BASE, entry.id))
            .query(&[("uploadType", "media"), ("fields", ENTRY_FIELDS)])
            .header(reqwest::header::CONTENT_TYPE, ZIP_MIME)
            .body(file);
        match self.send(request) {
            Ok(response) => Ok(response.json().map_err(RemoteError::from)?),
            Err(err) => {
                if let Err(cleanup) = self.delete(&entry.id) {
                    warn!("could not remove empty remote file {}: {}", entry.id, cleanup);
                }
                Err(err)
            }
        }
    }

    fn delete(&mut self, id: &str) -> Result<()> {
        let request = self.client.delete(format!("{}/files/{}", API_BASE, id));
        self.send(request)?;
        Ok(())
    }
}

fn children_query(parent: &str) -> String {
    let escaped = parent.replace('\\', "\\\\").replace('\'', "\\'");
    format!("'{}' in parents and trashed=false", escaped)
}
