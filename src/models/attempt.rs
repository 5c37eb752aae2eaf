//! 考试会话（attempt）模型
//!
//! `Attempt` 在页面生命周期内由引擎独占持有，`status` 只允许
//! `in_progress → submitting → submitted` 单向迁移。一旦进入 `submitted`，
//! 任何计时、同步、作答保存都不得再修改会话状态。

use serde::{Deserialize, Serialize};

/// 会话状态
///
/// `Submitting` 是提交在途的占位状态：交卷入口通过
/// `in_progress → submitting` 的比较交换实现一次性闸门，并发的第二次
/// 提交请求会在这里被拒绝。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptStatus {
    InProgress,
    Submitting,
    Submitted,
}

impl AttemptStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InProgress => "in_progress",
            Self::Submitting => "submitting",
            Self::Submitted => "submitted",
        }
    }
}

/// 交卷原因
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmitReason {
    /// 考生主动交卷
    Manual,
    /// 从检查页确认交卷
    Review,
    /// 倒计时归零触发
    AutoTimeout,
}

impl SubmitReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Manual => "manual",
            Self::Review => "review",
            Self::AutoTimeout => "auto_timeout",
        }
    }
}

/// 一次考试会话
#[derive(Debug, Clone)]
pub struct Attempt {
    pub attempt_id: i64,
    pub test_id: i64,
    pub total_duration_min: u32,
    /// 剩余时间（毫秒）。`in_progress` 期间单调不增，且始终 ≥ 0
    pub remaining_time_ms: u64,
    pub total_sections: usize,
    pub total_questions: usize,
    pub status: AttemptStatus,
}

impl Attempt {
    /// 提交闸门：仅当会话仍在进行中时占位成功
    pub fn begin_submission(&mut self) -> bool {
        if self.status == AttemptStatus::InProgress {
            self.status = AttemptStatus::Submitting;
            true
        } else {
            false
        }
    }

    /// 提交成功，进入终态
    pub fn confirm_submitted(&mut self) {
        self.status = AttemptStatus::Submitted;
    }

    /// 提交失败，释放闸门允许重试
    pub fn reopen(&mut self) {
        if self.status == AttemptStatus::Submitting {
            self.status = AttemptStatus::InProgress;
        }
    }

    pub fn is_in_progress(&self) -> bool {
        self.status == AttemptStatus::InProgress
    }
}

/// 服务端下发的剩余分钟数换算为毫秒
///
/// 服务端按分钟（可带小数）计时，本地一律以毫秒驱动倒计时。
pub fn remaining_min_to_ms(remaining_min: f64) -> u64 {
    (remaining_min * 60_000.0).round().max(0.0) as u64
}
