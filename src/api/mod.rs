//! 考试服务端接口契约 - 接口层
//!
//! 服务端是考试状态的唯一权威方。引擎只依赖这里的 `AssessmentApi` 抽象，
//! 生产环境由 `clients::AssessmentClient` 走 HTTP 实现，测试用内存桩实现。

pub mod dto;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::SubmitReason;

pub use dto::{
    ApiEnvelope, AttemptStructureResponse, NavigateRequest, QuestionPayload, QuestionRefDto,
    ReviewRequest, SaveAnswerRequest, SectionDto, SubmitResponse, SyncResponse, SyncSnapshot,
    WindowEventRequest, WindowEventType,
};

/// 考试服务端的八个操作
///
/// 其中结构加载与交卷会阻塞界面状态，其余都是后台调用：
/// 保存作答、复查标记、切题审计、违规上报失败时记录日志后吞掉，
/// 同步心跳失败由下一次心跳无条件重试。
#[async_trait]
pub trait AssessmentApi: Send + Sync + 'static {
    /// 拉取整场考试的结构骨架（含服务端计算的剩余时间）
    async fn get_attempt_structure(&self, attempt_id: i64) -> Result<AttemptStructureResponse>;

    /// 拉取单题完整内容及其当前作答状态
    async fn get_attempt_question(
        &self,
        attempt_id: i64,
        question_id: i64,
    ) -> Result<QuestionPayload>;

    /// 保存单题作答
    async fn save_answer(&self, attempt_id: i64, req: SaveAnswerRequest) -> Result<()>;

    /// 标记/取消标记复查
    async fn mark_for_review(&self, attempt_id: i64, req: ReviewRequest) -> Result<()>;

    /// 上报切题审计记录
    async fn log_navigation(&self, attempt_id: i64, req: NavigateRequest) -> Result<()>;

    /// 心跳同步：上报本地快照，取回服务端权威剩余时间
    async fn sync_attempt(&self, attempt_id: i64, snapshot: SyncSnapshot) -> Result<SyncResponse>;

    /// 交卷（终态操作）
    async fn submit_attempt(&self, attempt_id: i64, reason: SubmitReason) -> Result<SubmitResponse>;

    /// 上报窗口完整性事件
    async fn log_window_event(&self, attempt_id: i64, event: WindowEventRequest) -> Result<()>;
}
