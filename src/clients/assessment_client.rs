/// 考试服务端 API 客户端
///
/// 封装所有与考试服务端的 HTTP 交互，统一处理鉴权头与响应信封
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;
use tracing::debug;

use crate::api::dto::{
    ApiEnvelope, AttemptStructureResponse, NavigateRequest, QuestionPayload, ReviewRequest,
    SaveAnswerRequest, SubmitResponse, SyncResponse, SyncSnapshot, WindowEventRequest,
};
use crate::api::AssessmentApi;
use crate::config::Config;
use crate::error::AppError;
use crate::models::SubmitReason;

/// 考试服务端 API 客户端
pub struct AssessmentClient {
    http: Client,
    base_url: String,
    token: String,
}

impl AssessmentClient {
    /// 创建新的服务端客户端
    pub fn new(config: &Config) -> Self {
        Self {
            http: Client::new(),
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            token: config.api_token.clone(),
        }
    }

    /// 构建会话级接口地址
    fn attempt_url(&self, attempt_id: i64, endpoint: &str) -> String {
        format!("{}/api/attempt/{}/{}", self.base_url, attempt_id, endpoint)
    }

    /// GET 请求并拆开响应信封
    async fn get_json<T: DeserializeOwned>(&self, url: &str, endpoint: &str) -> Result<T> {
        let resp = self
            .http
            .get(url)
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| AppError::api_request_failed(endpoint, e))?;

        Self::unwrap_envelope(resp, endpoint).await
    }

    /// POST 请求并拆开响应信封
    async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        url: &str,
        endpoint: &str,
        body: &B,
    ) -> Result<T> {
        let resp = self
            .http
            .post(url)
            .bearer_auth(&self.token)
            .json(body)
            .send()
            .await
            .map_err(|e| AppError::api_request_failed(endpoint, e))?;

        Self::unwrap_envelope(resp, endpoint).await
    }

    /// POST 请求，只校验信封状态码、不关心数据体
    async fn post_unit<B: Serialize>(&self, url: &str, endpoint: &str, body: &B) -> Result<()> {
        let resp = self
            .http
            .post(url)
            .bearer_auth(&self.token)
            .json(body)
            .send()
            .await
            .map_err(|e| AppError::api_request_failed(endpoint, e))?;

        let envelope: ApiEnvelope<serde_json::Value> = resp
            .json()
            .await
            .map_err(|e| AppError::api_request_failed(endpoint, e))?;

        if !Self::is_success_response(envelope.code) {
            return Err(
                AppError::api_bad_response(endpoint, Some(envelope.code), envelope.message).into(),
            );
        }

        Ok(())
    }

    /// 拆开响应信封，取出数据体
    async fn unwrap_envelope<T: DeserializeOwned>(
        resp: reqwest::Response,
        endpoint: &str,
    ) -> Result<T> {
        let envelope: ApiEnvelope<T> = resp
            .json()
            .await
            .map_err(|e| AppError::api_request_failed(endpoint, e))?;

        if !Self::is_success_response(envelope.code) {
            return Err(
                AppError::api_bad_response(endpoint, Some(envelope.code), envelope.message).into(),
            );
        }

        envelope
            .data
            .ok_or_else(|| AppError::api_empty_response(endpoint).into())
    }

    /// 检查信封状态码是否成功
    pub fn is_success_response(code: u64) -> bool {
        code == 200
    }
}

#[async_trait]
impl AssessmentApi for AssessmentClient {
    async fn get_attempt_structure(&self, attempt_id: i64) -> Result<AttemptStructureResponse> {
        let url = self.attempt_url(attempt_id, "structure");

        debug!("拉取试卷结构: attempt={}", attempt_id);

        self.get_json(&url, "structure")
            .await
            .context("拉取试卷结构失败")
    }

    async fn get_attempt_question(
        &self,
        attempt_id: i64,
        question_id: i64,
    ) -> Result<QuestionPayload> {
        let url = self.attempt_url(attempt_id, &format!("question/{}", question_id));

        debug!("拉取题目内容: question={}", question_id);

        self.get_json(&url, "question").await.context("拉取题目失败")
    }

    async fn save_answer(&self, attempt_id: i64, req: SaveAnswerRequest) -> Result<()> {
        let url = self.attempt_url(attempt_id, "answer");

        debug!(
            "保存作答: question={} answered={}",
            req.question_id, req.is_answered
        );

        self.post_unit(&url, "answer", &req).await
    }

    async fn mark_for_review(&self, attempt_id: i64, req: ReviewRequest) -> Result<()> {
        let url = self.attempt_url(attempt_id, "review");

        self.post_unit(&url, "review", &req).await
    }

    async fn log_navigation(&self, attempt_id: i64, req: NavigateRequest) -> Result<()> {
        let url = self.attempt_url(attempt_id, "navigate");

        self.post_unit(&url, "navigate", &req).await
    }

    async fn sync_attempt(&self, attempt_id: i64, snapshot: SyncSnapshot) -> Result<SyncResponse> {
        let url = self.attempt_url(attempt_id, "sync");

        debug!("心跳同步: remaining={}ms", snapshot.time_remaining_ms);

        self.post_json(&url, "sync", &snapshot).await
    }

    async fn submit_attempt(
        &self,
        attempt_id: i64,
        reason: SubmitReason,
    ) -> Result<SubmitResponse> {
        let url = self.attempt_url(attempt_id, "submit");
        let body = json!({ "reason": reason.as_str() });

        debug!("提交试卷: reason={}", reason.as_str());

        self.post_json(&url, "submit", &body).await
    }

    async fn log_window_event(&self, attempt_id: i64, event: WindowEventRequest) -> Result<()> {
        let url = self.attempt_url(attempt_id, "window-event");

        self.post_unit(&url, "window-event", &event).await
    }
}
