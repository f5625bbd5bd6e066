//! 评分流程 API 客户端
//!
//! 只负责"发一次 POST 并拿回响应文本"，不做 JSON 解析和重试

use std::time::Duration;

use tracing::debug;

use crate::config::Config;
use crate::error::{ApiError, AppError, AppResult};
use crate::models::FlowRequest;
use crate::utils::truncate_text;

/// 评分流程的传输层
///
/// 返回 2xx 响应的原始 body；网络错误和非 2xx 状态作为错误返回
#[allow(async_fn_in_trait)]
pub trait FlowTransport {
    async fn post_json(&self, url: &str, payload: &FlowRequest<'_>) -> AppResult<String>;
}

/// 基于 reqwest 的评分流程客户端
#[derive(Clone)]
pub struct FlowClient {
    http: reqwest::Client,
    token: Option<String>,
}

impl FlowClient {
    /// 根据配置创建客户端
    pub fn new(config: &Config) -> AppResult<Self> {
        Self::with_timeout(
            Duration::from_secs(config.request_timeout_secs),
            config.application_token.clone(),
        )
    }

    /// 使用自定义超时创建客户端
    pub fn with_timeout(timeout: Duration, token: Option<String>) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::ClientBuildFailed {
                source: Box::new(e),
            })?;

        Ok(Self { http, token })
    }
}

impl FlowTransport for FlowClient {
    async fn post_json(&self, url: &str, payload: &FlowRequest<'_>) -> AppResult<String> {
        // .json() 会设置 Content-Type: application/json
        let mut request = self.http.post(url).json(payload);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AppError::api_request_failed(url, e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AppError::api_request_failed(url, e))?;

        debug!("评分流程响应: status={}, {} 字节", status, body.len());

        if !status.is_success() {
            return Err(ApiError::BadStatus {
                endpoint: url.to_string(),
                status: status.as_u16(),
                body: truncate_text(&body, 200),
            }
            .into());
        }

        Ok(body)
    }
}
