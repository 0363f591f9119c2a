use std::time::Duration as StdDuration;

use chrono::Utc;
use reqwest::header::AUTHORIZATION;
use reqwest::Url;
use serde_json::{json, Value as JsonValue};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{AiErrorCode, AppError, AppResult};
use crate::models::credential::{Credential, CredentialState, MAX_EXPIRE_SECONDS};
use crate::services::scoring_service::{error_from_reqwest, map_http_error};
use crate::utils::bce_auth::sign_request;
use crate::utils::redact::{mask_secret, redact_sensitive_data};

const TOKEN_PATH: &str = "/v1/BCE-BEARER/token";
const DEFAULT_IAM_BASE_URL: &str = "https://iam.bj.baidubce.com";

#[derive(Debug, Clone)]
pub struct CredentialConfig {
    pub iam_base_url: String,
    pub http_timeout: StdDuration,
}

impl Default for CredentialConfig {
    fn default() -> Self {
        Self {
            iam_base_url: DEFAULT_IAM_BASE_URL.to_string(),
            http_timeout: StdDuration::from_secs(10),
        }
    }
}

impl CredentialConfig {
    pub fn from_env() -> Self {
        let iam_base_url = std::env::var("EFFORT_TRACKER_IAM_BASE_URL")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_IAM_BASE_URL.to_string());

        Self {
            iam_base_url,
            ..Self::default()
        }
    }
}

/// Holds the single bearer credential for the scoring provider.
///
/// Acquired once at startup and read-only afterwards; restarting the process
/// is the refresh mechanism.
#[derive(Debug, Clone, Default)]
pub struct CredentialManager {
    state: CredentialState,
}

impl CredentialManager {
    pub fn absent() -> Self {
        Self::default()
    }

    pub fn from_state(state: CredentialState) -> Self {
        Self { state }
    }

    /// Exchange the application key pair for a bearer token. Every failure
    /// (rejection, malformed body, transport error) yields an absent credential.
    pub async fn acquire(
        config: &CredentialConfig,
        app_key: &str,
        app_secret: &str,
        expire_seconds: u32,
    ) -> Self {
        info!(target: "app::credential", "acquiring bearer token");

        match request_token(config, app_key, app_secret, expire_seconds).await {
            Ok(credential) => {
                info!(
                    target: "app::credential",
                    token = %mask_secret(credential.token()),
                    expire_hours = credential.expires_in().num_hours(),
                    expires_at = %credential.expires_at().to_rfc3339(),
                    "bearer token acquired"
                );
                Self::from_state(CredentialState::Valid(credential))
            }
            Err(error) => {
                warn!(
                    target: "app::credential",
                    error = %error,
                    code = ?error.ai_code(),
                    "bearer token unavailable, scoring will use the fallback pair"
                );
                Self::absent()
            }
        }
    }

    pub fn state(&self) -> &CredentialState {
        &self.state
    }

    /// The token if present and not yet expired.
    pub fn bearer_token(&self) -> Option<&str> {
        self.state.bearer_token_at(Utc::now())
    }

    pub fn is_valid(&self) -> bool {
        self.bearer_token().is_some()
    }
}

async fn request_token(
    config: &CredentialConfig,
    app_key: &str,
    app_secret: &str,
    expire_seconds: u32,
) -> AppResult<Credential> {
    let app_key = app_key.trim();
    let app_secret = app_secret.trim();
    if app_key.is_empty() || app_secret.is_empty() {
        return Err(AppError::ai(
            AiErrorCode::MissingCredential,
            "AK 和 SK 不能为空",
        ));
    }
    if expire_seconds == 0 {
        return Err(AppError::ai(
            AiErrorCode::InvalidRequest,
            "Token 有效期必须大于 0 秒",
        ));
    }
    if expire_seconds > MAX_EXPIRE_SECONDS {
        warn!(
            target: "app::credential",
            requested = expire_seconds,
            max = MAX_EXPIRE_SECONDS,
            "token lifetime capped at maximum"
        );
    }
    let expire_seconds = expire_seconds.min(MAX_EXPIRE_SECONDS);

    let mut url = Url::parse(&format!(
        "{}{}",
        config.iam_base_url.trim_end_matches('/'),
        TOKEN_PATH
    ))
    .map_err(|err| AppError::other(format!("IAM 地址无效: {err}")))?;
    url.query_pairs_mut()
        .append_pair("expireInSeconds", &expire_seconds.to_string());

    let host = match (url.host_str(), url.port()) {
        (Some(host), Some(port)) => format!("{host}:{port}"),
        (Some(host), None) => host.to_string(),
        (None, _) => return Err(AppError::other("IAM 地址缺少主机名")),
    };

    let signed = sign_request(
        app_key,
        app_secret,
        "GET",
        &host,
        url.path(),
        &[("expireInSeconds", expire_seconds.to_string())],
        Utc::now(),
    );

    let client = reqwest::Client::builder()
        .timeout(config.http_timeout)
        .build()
        .map_err(|err| AppError::other(format!("初始化 IAM HTTP 客户端失败: {err}")))?;

    let correlation_id = Uuid::new_v4().to_string();
    debug!(
        target: "app::credential",
        correlation_id = %correlation_id,
        url = %url,
        "requesting bearer token"
    );

    let response = client
        .get(url)
        .header(AUTHORIZATION, signed.authorization)
        .header("x-bce-date", signed.bce_date)
        .send()
        .await
        .map_err(|err| error_from_reqwest(err, &correlation_id))?;

    let status = response.status();
    let body: Option<JsonValue> = response.json().await.ok();

    if !status.is_success() {
        let details = body.as_ref().map(provider_error_details);
        warn!(
            target: "app::credential",
            status = status.as_u16(),
            details = ?details,
            "IAM rejected token exchange"
        );
        return Err(map_http_error(status, &correlation_id));
    }

    let body = body.ok_or_else(|| {
        AppError::ai(AiErrorCode::InvalidResponse, "IAM 响应不是有效 JSON")
    })?;

    debug!(
        target: "app::credential",
        body = %redact_sensitive_data(&body),
        "IAM responded"
    );

    let token = body.get("token").and_then(JsonValue::as_str).ok_or_else(|| {
        AppError::ai_with_details(
            AiErrorCode::InvalidResponse,
            "响应体无 token 字段",
            None,
            Some(provider_error_details(&body)),
        )
    })?;

    Credential::new(token, Utc::now(), expire_seconds)
        .ok_or_else(|| AppError::ai(AiErrorCode::InvalidResponse, "IAM 返回的 token 为空"))
}

/// Pull the error code/message out of either error body shape the IAM uses.
fn provider_error_details(body: &JsonValue) -> JsonValue {
    let code = body
        .get("code")
        .or_else(|| body.get("error_code"))
        .cloned()
        .unwrap_or(JsonValue::Null);
    let message = body
        .get("message")
        .or_else(|| body.get("error_msg"))
        .cloned()
        .unwrap_or(JsonValue::Null);
    json!({ "code": code, "message": message })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_details_cover_both_body_shapes() {
        let bce = json!({"requestId": "r", "code": "InvalidAccessKeyId", "message": "bad ak"});
        assert_eq!(
            provider_error_details(&bce),
            json!({"code": "InvalidAccessKeyId", "message": "bad ak"})
        );

        let legacy = json!({"error_code": 110, "error_msg": "Access token invalid"});
        assert_eq!(
            provider_error_details(&legacy),
            json!({"code": 110, "message": "Access token invalid"})
        );
    }

    #[test]
    fn absent_manager_has_no_token() {
        let manager = CredentialManager::absent();
        assert!(manager.bearer_token().is_none());
        assert!(!manager.is_valid());
        assert_eq!(manager.state(), &CredentialState::Absent);
    }
}
