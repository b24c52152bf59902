// SPDX-License-Identifier: AGPL-3.0-or-later
//! Google OAuth 2.0 + PKCE with a loopback redirect listener

use chrono::{DateTime, Utc};
use dpn_core::{DpnError, DpnResult};
use oauth2::{
    basic::BasicClient, AuthUrl, ClientId, CsrfToken, PkceCodeChallenge, PkceCodeVerifier,
    RedirectUrl, Scope, TokenUrl,
};
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use super::GoogleDriveConfig;

const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const DRIVE_SCOPE: &str = "https://www.googleapis.com/auth/drive";

/// Tokens are treated as expired this long before Google says so
const EXPIRY_MARGIN_SECS: i64 = 60;
const MAX_REQUEST_HEAD: usize = 16 * 1024;

const SUCCESS_PAGE: &str = "<html><body>The authentication flow has completed. \
You may close this window.</body></html>";

/// Google OAuth tokens
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoogleTokens {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl GoogleTokens {
    pub fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(expires) => Utc::now() + chrono::Duration::seconds(EXPIRY_MARGIN_SECS) >= expires,
            None => false,
        }
    }

    pub async fn load(path: &Path) -> DpnResult<Option<Self>> {
        match tokio::fs::read(path).await {
            Ok(raw) => serde_json::from_slice(&raw)
                .map(Some)
                .map_err(|e| DpnError::Serialization(e.to_string())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn save(&self, path: &Path) -> DpnResult<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let raw = serde_json::to_vec_pretty(self)
            .map_err(|e| DpnError::Serialization(e.to_string()))?;
        tokio::fs::write(path, raw).await?;
        Ok(())
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: Option<String>,
    expires_in: Option<i64>,
}

/// Pending browser authorization
pub struct AuthRequest {
    pub url: String,
    pub csrf: CsrfToken,
    pub verifier: PkceCodeVerifier,
}

/// OAuth client for the Drive scope
pub struct GoogleAuth {
    client_id: String,
    client_secret: Option<String>,
    redirect_port: u16,
    http: Client,
}

impl GoogleAuth {
    pub fn new(config: &GoogleDriveConfig, http: Client) -> Self {
        Self {
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            redirect_port: config.redirect_port,
            http,
        }
    }

    fn redirect_uri(&self, port: u16) -> String {
        format!("http://127.0.0.1:{}/", port)
    }

    /// Build the consent URL for a redirect to `port`
    pub fn authorize(&self, port: u16) -> DpnResult<AuthRequest> {
        let config_err = |e: oauth2::url::ParseError| DpnError::Config(e.to_string());

        let client = BasicClient::new(ClientId::new(self.client_id.clone()))
            .set_auth_uri(AuthUrl::new(GOOGLE_AUTH_URL.to_string()).map_err(config_err)?)
            .set_token_uri(TokenUrl::new(GOOGLE_TOKEN_URL.to_string()).map_err(config_err)?)
            .set_redirect_uri(RedirectUrl::new(self.redirect_uri(port)).map_err(config_err)?);

        let (pkce_challenge, verifier) = PkceCodeChallenge::new_random_sha256();

        let (url, csrf) = client
            .authorize_url(CsrfToken::new_random)
            .add_scope(Scope::new(DRIVE_SCOPE.to_string()))
            .set_pkce_challenge(pkce_challenge)
            .add_extra_param("access_type", "offline")
            .add_extra_param("prompt", "consent")
            .url();

        Ok(AuthRequest { url: url.to_string(), csrf, verifier })
    }

    /// Run the interactive flow: listen on the loopback port, hand the
    /// consent URL to `open_url`, wait for the redirect and exchange the code.
    pub async fn local_webserver_auth<F>(&self, open_url: F) -> DpnResult<GoogleTokens>
    where
        F: FnOnce(&str),
    {
        let listener = TcpListener::bind(("127.0.0.1", self.redirect_port)).await?;
        let port = listener.local_addr()?.port();
        let request = self.authorize(port)?;

        tracing::info!("waiting for authorization on port {}", port);
        open_url(&request.url);

        let code = capture_code(&listener, request.csrf.secret()).await?;
        self.exchange_code(&code, request.verifier, port).await
    }

    /// Complete OAuth flow with authorization code
    pub async fn exchange_code(
        &self,
        code: &str,
        verifier: PkceCodeVerifier,
        port: u16,
    ) -> DpnResult<GoogleTokens> {
        let mut params = vec![
            ("code", code.to_string()),
            ("grant_type", "authorization_code".to_string()),
            ("client_id", self.client_id.clone()),
            ("redirect_uri", self.redirect_uri(port)),
            ("code_verifier", verifier.secret().to_string()),
        ];
        if let Some(ref secret) = self.client_secret {
            params.push(("client_secret", secret.clone()));
        }

        let tokens = self.token_request(&params, None).await?;
        tracing::debug!("authorization code exchanged");
        Ok(tokens)
    }

    pub async fn refresh(&self, refresh_token: &str) -> DpnResult<GoogleTokens> {
        let mut params = vec![
            ("grant_type", "refresh_token".to_string()),
            ("refresh_token", refresh_token.to_string()),
            ("client_id", self.client_id.clone()),
        ];
        if let Some(ref secret) = self.client_secret {
            params.push(("client_secret", secret.clone()));
        }

        let tokens = self.token_request(&params, Some(refresh_token)).await?;
        tracing::debug!("access token refreshed");
        Ok(tokens)
    }

    async fn token_request(
        &self,
        params: &[(&str, String)],
        previous_refresh: Option<&str>,
    ) -> DpnResult<GoogleTokens> {
        let response = self
            .http
            .post(GOOGLE_TOKEN_URL)
            .form(params)
            .send()
            .await
            .map_err(|e| DpnError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(DpnError::AuthFailed(format!("Token request failed: {}", error_text)));
        }

        let token_resp: TokenResponse = response
            .json()
            .await
            .map_err(|e| DpnError::Serialization(e.to_string()))?;

        // Refresh responses omit the refresh token; keep the one we had
        Ok(GoogleTokens {
            access_token: token_resp.access_token,
            refresh_token: token_resp
                .refresh_token
                .or_else(|| previous_refresh.map(String::from)),
            expires_at: token_resp
                .expires_in
                .map(|secs| Utc::now() + chrono::Duration::seconds(secs)),
        })
    }
}

/// Accept one redirect on `listener` and return its authorization code
pub(crate) async fn capture_code(listener: &TcpListener, expected_state: &str) -> DpnResult<String> {
    let (mut socket, peer) = listener.accept().await?;
    tracing::debug!("redirect received from {}", peer);

    let mut head = Vec::new();
    let mut buf = [0u8; 1024];
    while !head.windows(4).any(|w| w == b"\r\n\r\n") {
        let n = socket.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        head.extend_from_slice(&buf[..n]);
        if head.len() > MAX_REQUEST_HEAD {
            return Err(DpnError::AuthFailed("redirect request too large".into()));
        }
    }

    let head = String::from_utf8_lossy(&head);
    let result = parse_redirect(&head, expected_state);

    let (status, body) = match result {
        Ok(_) => ("200 OK", SUCCESS_PAGE.to_string()),
        Err(ref e) => ("400 Bad Request", format!("<html><body>{}</body></html>", e)),
    };
    let reply = format!(
        "HTTP/1.1 {}\r\nContent-Type: text/html; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        body.len(),
        body
    );
    socket.write_all(reply.as_bytes()).await?;
    socket.shutdown().await?;

    result
}

/// Pull the `code` out of a `GET /?code=..&state=..` request head
pub(crate) fn parse_redirect(head: &str, expected_state: &str) -> DpnResult<String> {
    let target = head
        .lines()
        .next()
        .and_then(|line| {
            let mut parts = line.split_whitespace();
            match (parts.next(), parts.next()) {
                (Some("GET"), Some(target)) => Some(target),
                _ => None,
            }
        })
        .ok_or_else(|| DpnError::AuthFailed("malformed redirect request".into()))?;

    let url = Url::parse(&format!("http://127.0.0.1{}", target))
        .map_err(|e| DpnError::AuthFailed(e.to_string()))?;

    let mut code = None;
    let mut state = None;
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "code" => code = Some(value.into_owned()),
            "state" => state = Some(value.into_owned()),
            "error" => return Err(DpnError::AuthFailed(format!("authorization denied: {}", value))),
            _ => {}
        }
    }

    if state.as_deref() != Some(expected_state) {
        return Err(DpnError::AuthFailed("state mismatch in redirect".into()));
    }
    code.ok_or_else(|| DpnError::AuthFailed("redirect carried no code".into()))
}
