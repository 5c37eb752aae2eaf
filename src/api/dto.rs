//! 考试服务端收发报文定义
//!
//! 服务端是 camelCase 的 REST/JSON 接口，所有报文统一在这里建模，
//! 引擎内部模型（`models/`）不直接出现在网络边界上。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::answer::AnswerState;
use crate::models::question::{QuestionContent, QuestionOption, QuestionType};

/// 统一响应信封
#[derive(Debug, Clone, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct ApiEnvelope<T> {
    pub code: u64,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Option<T>,
}

// ========== 结构加载 ==========

/// `getAttemptStructure` 响应：整场考试的结构骨架
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptStructureResponse {
    pub attempt_id: i64,
    pub test_id: i64,
    #[serde(default)]
    pub total_duration_min: u32,
    /// 服务端计算的剩余分钟数，可带小数
    pub remaining_time_min: f64,
    pub total_sections: usize,
    pub total_questions: usize,
    pub sections: Vec<SectionDto>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionDto {
    pub section_id: i64,
    pub name: String,
    pub questions: Vec<QuestionRefDto>,
}

/// 结构中的题目条目，携带服务端已知的作答标记位
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionRefDto {
    pub test_question_id: i64,
    pub question_order: u32,
    #[serde(default)]
    pub is_answered: bool,
    #[serde(default)]
    pub is_reviewed: bool,
    #[serde(default)]
    pub status: Option<String>,
}

impl QuestionRefDto {
    /// 服务端标记该题是否访问过
    pub fn was_visited(&self) -> bool {
        self.is_answered || self.status.as_deref() == Some("visited")
    }
}

// ========== 题目内容 ==========

/// `getAttemptQuestion` 响应：完整题目内容 + 当前作答状态
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionPayload {
    pub test_question_id: i64,
    pub question_text: String,
    pub question_type: QuestionType,
    #[serde(default)]
    pub options: Vec<QuestionOption>,
    #[serde(default)]
    pub marks: f64,
    #[serde(default)]
    pub negative_marks: f64,
    #[serde(default)]
    pub selected_option_id: Option<i64>,
    #[serde(default)]
    pub selected_option_ids: Vec<i64>,
    #[serde(default)]
    pub selected_answer: Option<String>,
    #[serde(default)]
    pub is_answered: bool,
    #[serde(default)]
    pub is_reviewed: bool,
}

impl QuestionPayload {
    /// 拆分为不可变内容与服务端作答状态
    pub fn into_parts(self) -> (QuestionContent, AnswerState) {
        let answer = AnswerState {
            selected_option_id: self.selected_option_id,
            selected_option_ids: self.selected_option_ids,
            selected_answer: self.selected_answer,
            is_answered: self.is_answered,
            is_reviewed: self.is_reviewed,
            visited: true,
        };
        let content = QuestionContent {
            test_question_id: self.test_question_id,
            question_text: self.question_text,
            question_type: self.question_type,
            options: self.options,
            marks: self.marks,
            negative_marks: self.negative_marks,
        };
        (content, answer)
    }
}

// ========== 作答保存 ==========

/// `saveAnswer` 请求
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveAnswerRequest {
    pub question_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_option_id: Option<i64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub selected_option_ids: Vec<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_answer: Option<String>,
    pub is_answered: bool,
    /// 该题展示以来的停留秒数
    pub time_spent_sec: u64,
}

impl SaveAnswerRequest {
    /// 以当前本地作答状态为准构建保存请求
    pub fn from_state(question_id: i64, answer: &AnswerState, time_spent_sec: u64) -> Self {
        Self {
            question_id,
            selected_option_id: answer.selected_option_id,
            selected_option_ids: answer.selected_option_ids.clone(),
            selected_answer: answer.selected_answer.clone(),
            is_answered: answer.is_answered,
            time_spent_sec,
        }
    }
}

/// `markForReview` 请求
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewRequest {
    pub question_id: i64,
    pub is_reviewed: bool,
}

// ========== 切题审计 ==========

/// `navigate` 请求（仅作审计记录，失败可容忍）
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigateRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_question_id: Option<i64>,
    pub to_question_id: i64,
    pub time_spent_sec: u64,
}

// ========== 时钟同步 ==========

/// `syncAttempt` 请求：上报本地计时与位置的瞬时快照
///
/// 快照只存在于当前心跳内，不做本地持久化。
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncSnapshot {
    pub time_remaining_ms: u64,
    pub current_section_id: i64,
    pub current_question_id: i64,
}

/// `syncAttempt` 响应：服务端权威剩余时间
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncResponse {
    pub remaining_time_min: f64,
}

// ========== 交卷 ==========

/// `submitAttempt` 响应
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResponse {
    pub status: String,
}

// ========== 窗口完整性事件 ==========

/// 完整性事件类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowEventType {
    /// 退出全屏
    FullscreenExit,
    /// 标签页被切换/隐藏
    TabHidden,
}

/// `logWindowEvent` 请求：只追加的违规事件上报
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowEventRequest {
    pub event_type: WindowEventType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_question_id: Option<i64>,
    pub occurred_at: DateTime<Utc>,
}
