//! 评分服务 - 业务能力层
//!
//! 只负责"把一段文本交给评分流程并拿回分数"，不关心文件从哪里来
//!
//! ## 重试策略
//! - 只有"响应不是合法 JSON"会重试，最多 3 次
//! - 等待时间按 `multiplier * 2^(n-1)` 指数增长，限制在 [4s, 10s]
//! - 超时、连接失败、非 2xx 状态不重试，直接返回错误
//! - 3 次都不是合法 JSON 时按空对象处理，得到哨兵 Judge Output

use std::time::Duration;

use serde_json::{Map, Value};
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::clients::{FlowClient, FlowTransport};
use crate::config::Config;
use crate::error::AppResult;
use crate::models::{FlowRequest, JudgeOutput, JudgeScores};
use crate::utils::truncate_text;

/// 重试配置
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    /// 最大尝试次数（包括第一次）
    pub max_attempts: usize,
    /// 指数退避的基数
    pub multiplier: Duration,
    /// 最短等待
    pub min_delay: Duration,
    /// 最长等待
    pub max_delay: Duration,
}

const DEFAULT_MAX_ATTEMPTS: usize = 3;
const DEFAULT_MIN_DELAY_SECS: u64 = 4;
const DEFAULT_MAX_DELAY_SECS: u64 = 10;

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            multiplier: Duration::from_secs(1),
            min_delay: Duration::from_secs(DEFAULT_MIN_DELAY_SECS),
            max_delay: Duration::from_secs(DEFAULT_MAX_DELAY_SECS),
        }
    }
}

impl RetryPolicy {
    /// 不等待的重试策略（测试用）
    pub fn immediate(max_attempts: usize) -> Self {
        Self {
            max_attempts,
            multiplier: Duration::ZERO,
            min_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    /// 第 `attempt` 次（从 1 开始）失败后的等待时间
    pub fn delay_after(&self, attempt: usize) -> Duration {
        let exp = attempt.saturating_sub(1).min(16) as u32;
        self.multiplier
            .saturating_mul(1u32 << exp)
            .max(self.min_delay)
            .min(self.max_delay)
    }
}

/// 评分流程的地址
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FlowEndpoint {
    pub base_url: String,
    pub langflow_id: Option<String>,
    pub flow_id: String,
    pub endpoint: Option<String>,
}

impl FlowEndpoint {
    pub fn from_config(config: &Config) -> Self {
        Self {
            base_url: config.base_api_url.clone(),
            langflow_id: config.langflow_id.clone(),
            flow_id: config.flow_id.clone(),
            endpoint: config.endpoint.clone(),
        }
    }

    /// 拼接运行流程的 URL，命名端点优先于流程 ID
    pub fn api_url(&self) -> String {
        let base = self.base_url.trim_end_matches('/');
        let target = self
            .endpoint
            .as_deref()
            .filter(|e| !e.is_empty())
            .unwrap_or(&self.flow_id);

        match self.langflow_id.as_deref().filter(|id| !id.is_empty()) {
            Some(langflow_id) => format!("{}/lf/{}/api/v1/run/{}", base, langflow_id, target),
            None => format!("{}/api/v1/run/{}", base, target),
        }
    }
}

/// 评分服务
///
/// 职责：
/// - 调用评分流程，拿到 Judge Output
/// - 从 Judge Output 中解析分数
/// - 只处理单个文档的文本
pub struct ScoreRunner<T = FlowClient> {
    transport: T,
    endpoint: FlowEndpoint,
    retry: RetryPolicy,
    verbose_logging: bool,
}

impl ScoreRunner<FlowClient> {
    /// 根据配置创建评分服务
    pub fn new(config: &Config) -> AppResult<Self> {
        Ok(Self::with_transport(
            FlowClient::new(config)?,
            FlowEndpoint::from_config(config),
            RetryPolicy::default(),
        )
        .verbose(config.verbose_logging))
    }
}

impl<T: FlowTransport> ScoreRunner<T> {
    pub fn with_transport(transport: T, endpoint: FlowEndpoint, retry: RetryPolicy) -> Self {
        Self {
            transport,
            endpoint,
            retry,
            verbose_logging: false,
        }
    }

    pub fn verbose(mut self, verbose_logging: bool) -> Self {
        self.verbose_logging = verbose_logging;
        self
    }

    pub fn api_url(&self) -> String {
        self.endpoint.api_url()
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// 运行评分流程，返回 Judge Output 组件
    ///
    /// # 参数
    /// - `text`: 文档文本（不做校验，空字符串原样提交）
    ///
    /// # 返回
    /// 找到组件时返回该组件，否则返回哨兵值；网络错误和非 2xx 状态返回错误
    pub async fn run_flow(&self, text: &str) -> AppResult<JudgeOutput> {
        let api_url = self.api_url();
        info!("🌐 调用评分流程: {}", api_url);

        let response = self.fetch_response(&api_url, text).await?;
        let judge_output = JudgeOutput::from_response(&response);

        if judge_output.is_sentinel() {
            warn!("⚠️ 响应中没有 Judge Output 组件，使用默认值");
        } else {
            info!("✓ 已提取 Judge Output 组件");
        }

        Ok(judge_output)
    }

    /// 从 Judge Output 中解析 (最终分数, 评分详情)，不会失败
    pub fn extract_scores(judge_output: &JudgeOutput) -> JudgeScores {
        JudgeScores::parse(judge_output.message_text())
    }

    /// 发送请求并解析 JSON，只在 JSON 非法时重试
    async fn fetch_response(&self, api_url: &str, text: &str) -> AppResult<Value> {
        let payload = FlowRequest::chat(text);
        let max_attempts = self.retry.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            let body = self.transport.post_json(api_url, &payload).await.map_err(|e| {
                error!("❌ 评分流程请求失败: {}", e);
                e
            })?;

            match serde_json::from_str::<Value>(&body) {
                Ok(response) => {
                    if self.verbose_logging {
                        debug!("响应内容: {}", truncate_text(&body, 500));
                    }
                    return Ok(response);
                }
                Err(e) => {
                    error!(
                        "响应不是合法的 JSON (第 {}/{} 次): {}",
                        attempt, max_attempts, e
                    );
                    debug!("响应内容: {}", truncate_text(&body, 500));

                    if attempt >= max_attempts {
                        warn!(
                            "⚠️ 已尝试 {} 次仍无法解析响应，按空响应处理",
                            max_attempts
                        );
                        return Ok(Value::Object(Map::new()));
                    }

                    let delay = self.retry.delay_after(attempt);
                    info!("⏳ {:?} 后重试...", delay);
                    sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ApiError, AppError};
    use crate::models::FinalScore;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::io::Write;
    use std::sync::Mutex;

    /// 按顺序返回预设结果的传输层
    struct ScriptedTransport {
        replies: Mutex<VecDeque<AppResult<String>>>,
        calls: Mutex<Vec<(String, String)>>,
    }

    impl ScriptedTransport {
        fn new(replies: Vec<AppResult<String>>) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    impl FlowTransport for ScriptedTransport {
        async fn post_json(&self, url: &str, payload: &FlowRequest<'_>) -> AppResult<String> {
            self.calls
                .lock()
                .unwrap()
                .push((url.to_string(), payload.input_value.to_string()));
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok("{}".to_string()))
        }
    }

    fn endpoint() -> FlowEndpoint {
        FlowEndpoint {
            base_url: "http://flow.local".to_string(),
            langflow_id: None,
            flow_id: "flow-1".to_string(),
            endpoint: None,
        }
    }

    fn runner(replies: Vec<AppResult<String>>) -> ScoreRunner<ScriptedTransport> {
        ScoreRunner::with_transport(
            ScriptedTransport::new(replies),
            endpoint(),
            RetryPolicy::immediate(3),
        )
    }

    fn judge_response(text: &str) -> String {
        json!({
            "outputs": [{
                "outputs": [
                    {"component_display_name": "Chat Output", "results": {"message": {"text": "ignored"}}},
                    {"component_display_name": "Judge Output", "results": {"message": {"text": text}}}
                ]
            }]
        })
        .to_string()
    }

    fn connection_refused() -> AppError {
        AppError::Api(ApiError::RequestFailed {
            endpoint: "http://flow.local/api/v1/run/flow-1".to_string(),
            source: Box::new(std::io::Error::from(std::io::ErrorKind::ConnectionRefused)),
        })
    }

    #[test]
    fn test_api_url_shapes() {
        let mut ep = endpoint();
        assert_eq!(ep.api_url(), "http://flow.local/api/v1/run/flow-1");

        ep.endpoint = Some("judge".to_string());
        assert_eq!(ep.api_url(), "http://flow.local/api/v1/run/judge");

        ep.langflow_id = Some("tenant-9".to_string());
        assert_eq!(ep.api_url(), "http://flow.local/lf/tenant-9/api/v1/run/judge");

        ep.endpoint = Some(String::new());
        assert_eq!(ep.api_url(), "http://flow.local/lf/tenant-9/api/v1/run/flow-1");

        ep.base_url = "http://flow.local/".to_string();
        ep.langflow_id = None;
        assert_eq!(ep.api_url(), "http://flow.local/api/v1/run/flow-1");
    }

    #[test]
    fn test_default_backoff() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_after(1), Duration::from_secs(4));
        assert_eq!(policy.delay_after(2), Duration::from_secs(4));
        assert_eq!(policy.delay_after(3), Duration::from_secs(4));
        assert_eq!(policy.delay_after(4), Duration::from_secs(8));
        assert_eq!(policy.delay_after(5), Duration::from_secs(10));
        assert_eq!(policy.delay_after(40), Duration::from_secs(10));
    }

    #[tokio::test]
    async fn test_run_flow_returns_judge_output() {
        let runner = runner(vec![Ok(judge_response(
            r#"{"Final Score": "85/100", "Score Detail": {"clarity": "good"}}"#,
        ))]);

        let judge = runner.run_flow("my build log").await.unwrap();
        assert_eq!(judge.component_display_name(), "Judge Output");

        let scores = ScoreRunner::<ScriptedTransport>::extract_scores(&judge);
        assert_eq!(scores.final_score, FinalScore::from("85/100"));
        assert_eq!(scores.score_detail["clarity"], json!("good"));

        let calls = runner.transport().calls.lock().unwrap().clone();
        assert_eq!(
            calls,
            vec![(
                "http://flow.local/api/v1/run/flow-1".to_string(),
                "my build log".to_string()
            )]
        );
    }

    #[tokio::test]
    async fn test_empty_outputs_give_sentinel() {
        let runner = runner(vec![Ok(r#"{"outputs": []}"#.to_string())]);
        let judge = runner.run_flow("").await.unwrap();
        assert_eq!(judge, JudgeOutput::sentinel());
        assert_eq!(runner.transport().call_count(), 1);
    }

    #[tokio::test]
    async fn test_invalid_json_retried_until_success() {
        let runner = runner(vec![
            Ok("<html>502</html>".to_string()),
            Ok(r#"{"outputs": [{"outputs": [{"component_"#.to_string()),
            Ok(judge_response(r#"{"Final Score": 91}"#)),
        ]);

        let judge = runner.run_flow("doc").await.unwrap();

        assert_eq!(runner.transport().call_count(), 3);
        let scores = ScoreRunner::<ScriptedTransport>::extract_scores(&judge);
        assert_eq!(scores.final_score, FinalScore::Int(91));
    }

    #[tokio::test]
    async fn test_invalid_json_every_time_falls_back_to_sentinel() {
        let runner = runner(vec![
            Ok("not json".to_string()),
            Ok("not json".to_string()),
            Ok("not json".to_string()),
            Ok(judge_response("never reached")),
        ]);

        let judge = runner.run_flow("doc").await.unwrap();

        assert_eq!(runner.transport().call_count(), 3);
        assert!(judge.is_sentinel());
        assert_eq!(
            ScoreRunner::<ScriptedTransport>::extract_scores(&judge),
            JudgeScores::default()
        );
    }

    #[tokio::test]
    async fn test_network_error_not_retried() {
        let runner = runner(vec![
            Err(connection_refused()),
            Ok(judge_response("never reached")),
        ]);

        let err = runner.run_flow("doc").await.unwrap_err();

        assert_eq!(runner.transport().call_count(), 1);
        assert!(matches!(err, AppError::Api(ApiError::RequestFailed { .. })));
    }

    #[tokio::test]
    async fn test_timeout_not_retried() {
        let mut server = mockito::Server::new_async().await;
        let slow = server
            .mock("POST", "/api/v1/run/flow-1")
            .with_status(200)
            .with_chunked_body(|w| {
                std::thread::sleep(Duration::from_secs(3));
                w.write_all(b"{}")
            })
            .expect(1)
            .create_async()
            .await;

        let runner = ScoreRunner::with_transport(
            FlowClient::with_timeout(Duration::from_secs(1), None).unwrap(),
            FlowEndpoint {
                base_url: server.url(),
                ..endpoint()
            },
            RetryPolicy::immediate(3),
        );

        let err = runner.run_flow("slow doc").await.unwrap_err();

        slow.assert_async().await;
        assert!(err.is_timeout());
        assert!(matches!(err, AppError::Api(ApiError::Timeout { .. })));
    }

    #[tokio::test]
    async fn test_bad_status_not_retried() {
        let runner = runner(vec![Err(AppError::Api(ApiError::BadStatus {
            endpoint: "x".to_string(),
            status: 500,
            body: "{}".to_string(),
        }))]);

        let err = runner.run_flow("doc").await.unwrap_err();

        assert_eq!(runner.transport().call_count(), 1);
        assert!(matches!(
            err,
            AppError::Api(ApiError::BadStatus { status: 500, .. })
        ));
    }

    #[test]
    fn test_extract_scores_not_json() {
        let judge = JudgeOutput::from(json!({
            "component_display_name": "Judge Output",
            "results": {"message": {"text": "not json"}}
        }));
        let scores = ScoreRunner::<ScriptedTransport>::extract_scores(&judge);
        assert_eq!(scores.final_score, FinalScore::not_available());
        assert!(scores.score_detail.is_empty());
    }

    #[test]
    fn test_extract_scores_missing_path() {
        let judge = JudgeOutput::from(json!({"component_display_name": "Judge Output"}));
        assert_eq!(
            ScoreRunner::<ScriptedTransport>::extract_scores(&judge),
            JudgeScores::default()
        );
    }
}
