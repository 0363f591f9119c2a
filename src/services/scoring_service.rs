use std::sync::Arc;
use std::time::{Duration as StdDuration, Instant};

use reqwest::StatusCode;
use serde_json::{json, Value as JsonValue};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{AiErrorCode, AppError, AppResult};
use crate::models::score::{ScorePair, ScoreRequest};
use crate::services::credential_service::CredentialManager;
use crate::services::prompt_templates::build_score_payload;
use crate::services::score_parser::parse_scores;
use crate::utils::redact::{mask_secret, redact_sensitive_data};

const DEFAULT_ENDPOINT: &str = "https://qianfan.baidubce.com/v2/chat/completions";
const DEFAULT_MODEL: &str = "deepseek-v3.1-250821";
const HTTP_TIMEOUT: StdDuration = StdDuration::from_secs(10);

#[derive(Debug, Clone)]
pub struct ScoringConfig {
    pub endpoint: String,
    pub model: String,
    pub http_timeout: StdDuration,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            http_timeout: HTTP_TIMEOUT,
        }
    }
}

impl ScoringConfig {
    pub fn from_env() -> Self {
        let read = |key: &str| {
            std::env::var(key)
                .ok()
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let defaults = Self::default();
        Self {
            endpoint: read("EFFORT_TRACKER_QIANFAN_ENDPOINT").unwrap_or(defaults.endpoint),
            model: read("EFFORT_TRACKER_QIANFAN_MODEL").unwrap_or(defaults.model),
            http_timeout: defaults.http_timeout,
        }
    }
}

/// Something that can turn task fields into a score pair, or fail trying.
#[async_trait::async_trait]
pub trait ScoreProvider: Send + Sync {
    async fn score(&self, request: &ScoreRequest) -> AppResult<ScorePair>;
}

/// Total scoring front: every failure of the provider becomes
/// [`ScorePair::FALLBACK`], so callers never see an error.
#[derive(Clone)]
pub struct ScoringService {
    provider: Arc<dyn ScoreProvider>,
}

impl ScoringService {
    pub fn new(config: &ScoringConfig, credential: CredentialManager) -> AppResult<Self> {
        let provider = QianfanProvider::try_new(config, credential)?;
        Ok(Self::with_provider(Arc::new(provider)))
    }

    pub fn with_provider(provider: Arc<dyn ScoreProvider>) -> Self {
        Self { provider }
    }

    pub async fn score(&self, request: &ScoreRequest) -> ScorePair {
        match self.provider.score(request).await {
            Ok(pair) => {
                info!(
                    target: "app::scoring",
                    effort_score = pair.effort_score(),
                    ability_score = pair.ability_score(),
                    "task scored"
                );
                pair
            }
            Err(error) => {
                warn!(
                    target: "app::scoring",
                    code = ?error.ai_code(),
                    correlation_id = ?error.ai_correlation_id(),
                    error = %error,
                    "scoring failed, using fallback pair"
                );
                ScorePair::FALLBACK
            }
        }
    }
}

/// Chat-completion client for the Qianfan endpoint. One attempt per call, no retries.
struct QianfanProvider {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    credential: CredentialManager,
}

impl QianfanProvider {
    fn try_new(config: &ScoringConfig, credential: CredentialManager) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .pool_max_idle_per_host(2)
            .pool_idle_timeout(Some(StdDuration::from_secs(90)))
            .build()
            .map_err(|err| AppError::other(format!("初始化千帆 HTTP 客户端失败: {err}")))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            credential,
        })
    }
}

#[async_trait::async_trait]
impl ScoreProvider for QianfanProvider {
    async fn score(&self, request: &ScoreRequest) -> AppResult<ScorePair> {
        let token = self.credential.bearer_token().ok_or_else(|| {
            AppError::ai(AiErrorCode::MissingCredential, "千帆 Token 无效或已过期")
        })?;

        let correlation_id = Uuid::new_v4().to_string();
        let payload = build_score_payload(&self.model, request);

        debug!(
            target: "app::scoring::qianfan",
            correlation_id = %correlation_id,
            authorization = %mask_secret(token),
            payload = %redact_sensitive_data(&payload),
            "invoking Qianfan"
        );

        let start = Instant::now();
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(token)
            .json(&payload)
            .send()
            .await
            .map_err(|err| error_from_reqwest(err, &correlation_id))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|err| error_from_reqwest(err, &correlation_id))?;
        let latency_ms = start.elapsed().as_millis();

        debug!(
            target: "app::scoring::qianfan",
            correlation_id = %correlation_id,
            status = status.as_u16(),
            latency_ms,
            body = %text,
            "Qianfan responded"
        );

        if !status.is_success() {
            return Err(map_http_error(status, &correlation_id));
        }

        let body: JsonValue = serde_json::from_str(&text).map_err(|err| {
            AppError::ai_with_details(
                AiErrorCode::InvalidResponse,
                format!("解析千帆响应失败: {err}"),
                Some(correlation_id.as_str()),
                Some(json!({ "reason": "invalid_json" })),
            )
        })?;

        let content = body
            .pointer("/choices/0/message/content")
            .and_then(JsonValue::as_str)
            .ok_or_else(|| {
                AppError::ai_with_details(
                    AiErrorCode::InvalidResponse,
                    "千帆响应缺少 choices[0].message.content",
                    Some(correlation_id.as_str()),
                    Some(json!({ "reason": "empty_choices" })),
                )
            })?;

        parse_scores(content).map_err(|err| {
            AppError::ai_with_details(
                AiErrorCode::InvalidResponse,
                format!("分数提取失败：{err}"),
                Some(correlation_id.as_str()),
                Some(json!({ "reason": err.reason(), "content": content })),
            )
        })
    }
}

pub(crate) fn map_http_error(status: StatusCode, correlation_id: &str) -> AppError {
    let (code, message) = match status {
        StatusCode::UNAUTHORIZED => (
            AiErrorCode::MissingCredential,
            "千帆鉴权失败，Token 无效或未授权".to_string(),
        ),
        StatusCode::FORBIDDEN => (AiErrorCode::Forbidden, "千帆 API 权限不足".to_string()),
        StatusCode::TOO_MANY_REQUESTS => (
            AiErrorCode::RateLimited,
            "千帆请求过于频繁".to_string(),
        ),
        status if status.is_server_error() => (
            AiErrorCode::ProviderUnavailable,
            format!("千帆服务暂时不可用 (状态码 {})", status.as_u16()),
        ),
        StatusCode::BAD_REQUEST => (AiErrorCode::InvalidRequest, "千帆请求格式无效".to_string()),
        StatusCode::NOT_FOUND => (AiErrorCode::InvalidRequest, "千帆接口地址无效".to_string()),
        status => (
            AiErrorCode::Unknown,
            format!("千帆返回错误状态码 {}", status.as_u16()),
        ),
    };

    AppError::ai_with_details(
        code,
        message,
        Some(correlation_id),
        Some(json!({ "status": status.as_u16() })),
    )
}

pub(crate) fn error_from_reqwest(err: reqwest::Error, correlation_id: &str) -> AppError {
    if err.is_timeout() {
        AppError::ai_with_details(
            AiErrorCode::HttpTimeout,
            "千帆请求超时",
            Some(correlation_id),
            None,
        )
    } else if err.is_connect() {
        AppError::ai_with_details(
            AiErrorCode::ProviderUnavailable,
            "千帆网络连接失败",
            Some(correlation_id),
            None,
        )
    } else if let Some(status) = err.status() {
        map_http_error(status, correlation_id)
    } else {
        AppError::ai_with_details(
            AiErrorCode::Unknown,
            format!("千帆请求失败: {err}"),
            Some(correlation_id),
            None,
        )
    }
}
