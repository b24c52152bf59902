// SPDX-License-Identifier: AGPL-3.0-or-later
//! Google Drive item store
//!
//! Drive API v3 client over an OAuth 2.0 + PKCE session. Items are addressed
//! by id only; path handling lives in the navigator.

mod auth;

pub use auth::{AuthRequest, GoogleAuth, GoogleTokens};

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use dpn_core::{
    AccountInfo, DpnError, DpnResult, Item, ItemId, ItemKind, ItemStore, Metadata, NewItem,
    StorageQuota, FOLDER_MIME_TYPE,
};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;

const DRIVE_API_URL: &str = "https://www.googleapis.com/drive/v3";
const DRIVE_UPLOAD_URL: &str = "https://www.googleapis.com/upload/drive/v3";
const FILE_FIELDS: &str = "id,name,mimeType,size,createdTime,modifiedTime,parents,trashed,md5Checksum";
const PROVIDER: &str = "gdrive";

fn default_redirect_port() -> u16 {
    8080
}

fn default_page_size() -> u32 {
    1000
}

/// Google Drive store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoogleDriveConfig {
    pub client_id: String,
    #[serde(default)]
    pub client_secret: Option<String>,
    /// Loopback port for the OAuth redirect; 0 picks a free one
    #[serde(default = "default_redirect_port")]
    pub redirect_port: u16,
    /// Where tokens are persisted between sessions
    #[serde(default)]
    pub token_file: Option<PathBuf>,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

impl Default for GoogleDriveConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: None,
            redirect_port: default_redirect_port(),
            token_file: None,
            page_size: default_page_size(),
        }
    }
}

/// Google Drive store
pub struct GoogleDriveStore {
    id: String,
    config: GoogleDriveConfig,
    auth: GoogleAuth,
    tokens: Arc<RwLock<Option<GoogleTokens>>>,
    root_id: RwLock<Option<ItemId>>,
    http: Client,
}

impl GoogleDriveStore {
    pub fn new(id: impl Into<String>, config: GoogleDriveConfig) -> Self {
        let http = Client::new();
        Self {
            id: id.into(),
            auth: GoogleAuth::new(&config, http.clone()),
            config,
            tokens: Arc::new(RwLock::new(None)),
            root_id: RwLock::new(None),
            http,
        }
    }

    pub fn auth(&self) -> &GoogleAuth {
        &self.auth
    }

    /// Set tokens directly
    pub async fn set_tokens(&self, tokens: GoogleTokens) {
        *self.tokens.write().await = Some(tokens);
    }

    pub async fn tokens(&self) -> Option<GoogleTokens> {
        self.tokens.read().await.clone()
    }

    /// Establish a session.
    ///
    /// Reuses the token file when it holds usable tokens, refreshing them if
    /// needed; otherwise runs the browser flow, handing the consent URL to
    /// `open_url`. New tokens are written back to the token file.
    pub async fn authenticate<F>(&self, open_url: F) -> DpnResult<()>
    where
        F: FnOnce(&str),
    {
        let stored = match self.config.token_file {
            Some(ref path) => GoogleTokens::load(path).await?,
            None => None,
        };

        let tokens = match stored {
            Some(tokens) if !tokens.is_expired() => tokens,
            Some(GoogleTokens { refresh_token: Some(refresh), .. }) => {
                match self.auth.refresh(&refresh).await {
                    Ok(tokens) => self.persist(tokens).await?,
                    Err(e) => {
                        tracing::warn!("stored refresh token rejected: {}", e);
                        self.persist(self.auth.local_webserver_auth(open_url).await?).await?
                    }
                }
            }
            _ => self.persist(self.auth.local_webserver_auth(open_url).await?).await?,
        };

        self.set_tokens(tokens).await;
        tracing::debug!("authentication successful");
        Ok(())
    }

    async fn persist(&self, tokens: GoogleTokens) -> DpnResult<GoogleTokens> {
        if let Some(ref path) = self.config.token_file {
            tokens.save(path).await?;
        }
        Ok(tokens)
    }

    /// Current access token, refreshed first when it has expired
    async fn access_token(&self) -> DpnResult<String> {
        let current = self.tokens.read().await.clone();
        match current {
            None => Err(DpnError::AuthRequired("Not authenticated".into())),
            Some(tokens) if !tokens.is_expired() => Ok(tokens.access_token),
            Some(GoogleTokens { refresh_token: Some(refresh), .. }) => {
                let tokens = self.persist(self.auth.refresh(&refresh).await?).await?;
                let access = tokens.access_token.clone();
                *self.tokens.write().await = Some(tokens);
                Ok(access)
            }
            Some(_) => Err(DpnError::TokenExpired),
        }
    }

    async fn send(&self, request: RequestBuilder, what: &str) -> DpnResult<Response> {
        let token = self.access_token().await?;
        let response = request
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| DpnError::Network(e.to_string()))?;
        check_status(response, what).await
    }

    async fn send_json<T: for<'de> Deserialize<'de>>(
        &self,
        request: RequestBuilder,
        what: &str,
    ) -> DpnResult<T> {
        self.send(request, what)
            .await?
            .json()
            .await
            .map_err(|e| DpnError::Serialization(e.to_string()))
    }

    fn file_url(id: &ItemId) -> String {
        format!("{}/files/{}", DRIVE_API_URL, id)
    }
}

/// Map a non-success response onto the error taxonomy
async fn check_status(response: Response, what: &str) -> DpnResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    match status {
        StatusCode::NOT_FOUND => Err(DpnError::NotFound(what.to_string())),
        StatusCode::UNAUTHORIZED => Err(DpnError::TokenExpired),
        StatusCode::TOO_MANY_REQUESTS => Err(DpnError::RateLimited {
            retry_after_secs: response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok()),
        }),
        _ => {
            let error_text = response.text().await.unwrap_or_default();
            if status == StatusCode::FORBIDDEN && is_inaccessible(&error_text) {
                return Err(DpnError::NotFound(what.to_string()));
            }
            Err(DpnError::ProviderApi {
                provider: PROVIDER.into(),
                message: format!("{}: {}", status, error_text),
            })
        }
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    errors: Vec<ErrorReason>,
}

#[derive(Debug, Deserialize)]
struct ErrorReason {
    #[serde(default)]
    reason: String,
}

/// Whether a 403 body says the item is hidden from this account, as opposed
/// to a quota or rate limit refusal
fn is_inaccessible(body: &str) -> bool {
    serde_json::from_str::<ErrorBody>(body)
        .map(|body| {
            body.error
                .errors
                .iter()
                .any(|e| matches!(e.reason.as_str(), "notFound" | "insufficientFilePermissions"))
        })
        .unwrap_or(false)
}

/// Query selecting the non-trashed children of `parent`
fn children_query(parent: &ItemId) -> String {
    let escaped = parent.as_str().replace('\\', "\\\\").replace('\'', "\\'");
    format!("'{}' in parents and trashed = false", escaped)
}

/// Google Drive file metadata
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DriveFile {
    id: String,
    name: String,
    mime_type: String,
    #[serde(default)]
    size: Option<String>,
    created_time: Option<String>,
    modified_time: Option<String>,
    #[serde(default)]
    parents: Vec<String>,
    #[serde(default)]
    trashed: bool,
    md5_checksum: Option<String>,
}

fn parse_time(raw: &Option<String>) -> Option<DateTime<Utc>> {
    raw.as_deref()
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

impl DriveFile {
    fn into_item(self) -> Item {
        let metadata = Metadata {
            size: self.size.as_ref().and_then(|s| s.parse().ok()),
            created: parse_time(&self.created_time),
            modified: parse_time(&self.modified_time),
            mime_type: Some(self.mime_type.clone()),
            content_hash: self.md5_checksum,
            ..Default::default()
        };

        Item {
            id: ItemId::new(self.id),
            title: self.name,
            kind: ItemKind::from_mime_type(&self.mime_type),
            parents: self.parents.into_iter().map(ItemId::new).collect(),
            trashed: self.trashed,
            metadata,
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileList {
    #[serde(default)]
    files: Vec<DriveFile>,
    next_page_token: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateMetadata<'a> {
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    mime_type: Option<&'a str>,
    parents: Vec<&'a str>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct About {
    user: AboutUser,
    #[serde(default)]
    storage_quota: Option<AboutQuota>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AboutUser {
    display_name: String,
    email_address: Option<String>,
    permission_id: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AboutQuota {
    limit: Option<String>,
    usage: Option<String>,
    usage_in_drive_trash: Option<String>,
}

impl About {
    fn into_account(self) -> AccountInfo {
        let parse = |v: Option<String>| v.and_then(|s| s.parse().ok());
        let quota = self
            .storage_quota
            .map(|q| StorageQuota {
                limit: parse(q.limit),
                usage: parse(q.usage),
                usage_in_trash: parse(q.usage_in_drive_trash),
            })
            .unwrap_or_default();

        AccountInfo {
            display_name: self.user.display_name,
            email_address: self.user.email_address,
            permission_id: self.user.permission_id,
            quota,
        }
    }
}

#[async_trait]
impl ItemStore for GoogleDriveStore {
    fn id(&self) -> &str {
        &self.id
    }

    fn display_name(&self) -> &str {
        "Google Drive"
    }

    async fn root_id(&self) -> DpnResult<ItemId> {
        if let Some(id) = self.root_id.read().await.clone() {
            return Ok(id);
        }

        #[derive(Deserialize)]
        struct RootRef {
            id: String,
        }

        let root: RootRef = self
            .send_json(
                self.http
                    .get(Self::file_url(&ItemId::root()))
                    .query(&[("fields", "id")]),
                "root",
            )
            .await?;
        let id = ItemId::new(root.id);
        *self.root_id.write().await = Some(id.clone());
        Ok(id)
    }

    async fn list_children(&self, parent: &ItemId) -> DpnResult<Vec<Item>> {
        let query = children_query(parent);
        let fields = format!("nextPageToken,files({})", FILE_FIELDS);
        let page_size = self.config.page_size.to_string();

        let mut items = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut request = self.http.get(format!("{}/files", DRIVE_API_URL)).query(&[
                ("q", query.as_str()),
                ("fields", fields.as_str()),
                ("pageSize", page_size.as_str()),
            ]);
            if let Some(ref token) = page_token {
                request = request.query(&[("pageToken", token.as_str())]);
            }

            let list: FileList = self.send_json(request, parent.as_str()).await?;
            items.extend(list.files.into_iter().map(DriveFile::into_item));

            page_token = list.next_page_token;
            if page_token.is_none() {
                break;
            }
        }

        tracing::debug!("listed {} children of {}", items.len(), parent);
        Ok(items)
    }

    async fn get_item(&self, id: &ItemId) -> DpnResult<Item> {
        let file: DriveFile = self
            .send_json(
                self.http.get(Self::file_url(id)).query(&[("fields", FILE_FIELDS)]),
                id.as_str(),
            )
            .await?;
        Ok(file.into_item())
    }

    async fn create_item(&self, item: &NewItem) -> DpnResult<Item> {
        let parents = item.effective_parents();
        let metadata = CreateMetadata {
            name: &item.title,
            mime_type: match item.kind {
                ItemKind::Folder => Some(FOLDER_MIME_TYPE),
                ItemKind::File => None,
            },
            parents: parents.iter().map(ItemId::as_str).collect(),
        };

        let file: DriveFile = self
            .send_json(
                self.http
                    .post(format!("{}/files", DRIVE_API_URL))
                    .query(&[("fields", FILE_FIELDS)])
                    .json(&metadata),
                &item.title,
            )
            .await?;
        Ok(file.into_item())
    }

    async fn read_content(&self, id: &ItemId) -> DpnResult<Bytes> {
        self.send(
            self.http.get(Self::file_url(id)).query(&[("alt", "media")]),
            id.as_str(),
        )
        .await?
        .bytes()
        .await
        .map_err(|e| DpnError::Network(e.to_string()))
    }

    async fn write_content(&self, id: &ItemId, data: Bytes) -> DpnResult<Item> {
        let file: DriveFile = self
            .send_json(
                self.http
                    .patch(format!("{}/files/{}", DRIVE_UPLOAD_URL, id))
                    .query(&[("uploadType", "media"), ("fields", FILE_FIELDS)])
                    .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
                    .body(data),
                id.as_str(),
            )
            .await?;
        Ok(file.into_item())
    }

    async fn copy_item(&self, id: &ItemId, title: &str, parents: &[ItemId]) -> DpnResult<Item> {
        let metadata = CreateMetadata {
            name: title,
            mime_type: None,
            parents: parents.iter().map(ItemId::as_str).collect(),
        };

        let file: DriveFile = self
            .send_json(
                self.http
                    .post(format!("{}/copy", Self::file_url(id)))
                    .query(&[("fields", FILE_FIELDS)])
                    .json(&metadata),
                id.as_str(),
            )
            .await?;
        Ok(file.into_item())
    }

    async fn trash(&self, id: &ItemId) -> DpnResult<()> {
        self.send(
            self.http
                .patch(Self::file_url(id))
                .json(&serde_json::json!({ "trashed": true })),
            id.as_str(),
        )
        .await?;
        Ok(())
    }

    async fn restore(&self, id: &ItemId) -> DpnResult<Item> {
        let file: DriveFile = self
            .send_json(
                self.http
                    .patch(Self::file_url(id))
                    .query(&[("fields", FILE_FIELDS)])
                    .json(&serde_json::json!({ "trashed": false })),
                id.as_str(),
            )
            .await?;
        Ok(file.into_item())
    }

    async fn delete(&self, id: &ItemId) -> DpnResult<()> {
        self.send(self.http.delete(Self::file_url(id)), id.as_str()).await?;
        Ok(())
    }

    async fn about(&self) -> DpnResult<AccountInfo> {
        let about: About = self
            .send_json(
                self.http.get(format!("{}/about", DRIVE_API_URL)).query(&[(
                    "fields",
                    "user(displayName,emailAddress,permissionId),storageQuota(limit,usage,usageInDriveTrash)",
                )]),
                "about",
            )
            .await?;
        Ok(about.into_account())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_children_query() {
        assert_eq!(
            children_query(&ItemId::root()),
            "'root' in parents and trashed = false"
        );
        assert_eq!(
            children_query(&ItemId::new("a'b")),
            "'a\\'b' in parents and trashed = false"
        );
    }

    #[test]
    fn test_forbidden_reasons() {
        let hidden = r#"{"error":{"code":403,"errors":[{"domain":"global","reason":"insufficientFilePermissions","message":"no access"}]}}"#;
        let missing = r#"{"error":{"code":403,"errors":[{"reason":"notFound"}]}}"#;
        let limited = r#"{"error":{"code":403,"errors":[{"domain":"usageLimits","reason":"userRateLimitExceeded"}]}}"#;

        assert!(is_inaccessible(hidden));
        assert!(is_inaccessible(missing));
        assert!(!is_inaccessible(limited));
        assert!(!is_inaccessible("not json"));
    }

    #[test]
    fn test_drive_file_into_item() {
        let raw = r#"{
            "id": "1abc",
            "name": "report.pdf",
            "mimeType": "application/pdf",
            "size": "2048",
            "modifiedTime": "2024-03-01T10:00:00.000Z",
            "parents": ["0root", "0other"],
            "md5Checksum": "d41d8cd98f00b204e9800998ecf8427e"
        }"#;
        let item = serde_json::from_str::<DriveFile>(raw).unwrap().into_item();

        assert_eq!(item.id, ItemId::new("1abc"));
        assert_eq!(item.title, "report.pdf");
        assert!(item.is_file());
        assert!(!item.trashed);
        assert_eq!(item.size(), Some(2048));
        assert_eq!(item.first_parent(), Some(&ItemId::new("0root")));
        assert!(item.metadata.modified.is_some());
        assert!(item.metadata.created.is_none());
        assert_eq!(
            item.metadata.content_hash.as_deref(),
            Some("d41d8cd98f00b204e9800998ecf8427e")
        );
    }

    #[test]
    fn test_drive_folder_into_item() {
        let raw = r#"{"id":"f1","name":"docs","mimeType":"application/vnd.google-apps.folder","trashed":true}"#;
        let item = serde_json::from_str::<DriveFile>(raw).unwrap().into_item();
        assert!(item.is_folder());
        assert!(item.trashed);
        assert!(item.parents.is_empty());
    }

    #[test]
    fn test_create_metadata_serialization() {
        let folder = CreateMetadata {
            name: "docs",
            mime_type: Some(FOLDER_MIME_TYPE),
            parents: vec!["root"],
        };
        let json = serde_json::to_value(&folder).unwrap();
        assert_eq!(json["mimeType"], FOLDER_MIME_TYPE);
        assert_eq!(json["parents"][0], "root");

        let file = CreateMetadata { name: "a.txt", mime_type: None, parents: vec![] };
        let json = serde_json::to_value(&file).unwrap();
        assert!(json.get("mimeType").is_none());
    }

    #[test]
    fn test_about_into_account() {
        let raw = r#"{
            "user": {"displayName": "Ada", "emailAddress": "ada@example.com", "permissionId": "p1"},
            "storageQuota": {"limit": "100", "usage": "40", "usageInDriveTrash": "5"}
        }"#;
        let account = serde_json::from_str::<About>(raw).unwrap().into_account();
        assert_eq!(account.display_name, "Ada");
        assert_eq!(account.email_address.as_deref(), Some("ada@example.com"));
        assert_eq!(account.quota.available(), Some(60));
        assert_eq!(account.quota.usage_in_trash, Some(5));
    }

    #[test]
    fn test_config_defaults_from_toml() {
        let config: GoogleDriveConfig = toml::from_str(r#"client_id = "abc""#).unwrap();
        assert_eq!(config.client_id, "abc");
        assert_eq!(config.redirect_port, 8080);
        assert_eq!(config.page_size, 1000);
        assert!(config.token_file.is_none());
    }

    #[tokio::test]
    async fn test_requests_need_authentication() {
        let store = GoogleDriveStore::new("gdrive", GoogleDriveConfig::default());
        let err = store.get_item(&ItemId::root()).await.unwrap_err();
        assert!(matches!(err, DpnError::AuthRequired(_)));
    }

    #[tokio::test]
    async fn test_expired_tokens_without_refresh() {
        let store = GoogleDriveStore::new("gdrive", GoogleDriveConfig::default());
        store
            .set_tokens(GoogleTokens {
                access_token: "old".into(),
                refresh_token: None,
                expires_at: Some(Utc::now() - chrono::Duration::hours(1)),
            })
            .await;
        assert!(matches!(store.access_token().await, Err(DpnError::TokenExpired)));
    }
}
