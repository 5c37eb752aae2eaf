//! # Exam Attempt Engine
//!
//! 在线考试平台的限时答题引擎
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 接口层（Api / Clients）
//! - `api/` - 服务端契约（`AssessmentApi` 抽象 + 收发报文）
//! - `clients/` - `AssessmentClient`，走 HTTP 的生产实现
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，以显式依赖注入引擎
//! - `Notifier` - 加载指示 / toast 提示能力
//! - `FullscreenPort` - 请求进入全屏能力
//! - `ResumeStore` - 断点恢复提示读写能力
//!
//! ### ③ 引擎层（Engine）
//! - `engine/` - 一场考试的全部可变状态与状态机
//! - `timer` / `sync` / `cache` / `navigation` / `integrity` - 纯状态运算
//! - `AttemptSession` - 流程编排（加载 → 答题 → 同步 → 交卷）
//!
//! ### ④ 编排层（App）
//! - `app` - 无界面运行器，把一场考试从头跑到尾
//!
//! ## 模块结构

pub mod api;
pub mod app;
pub mod clients;
pub mod config;
pub mod engine;
pub mod error;
pub mod logger;
pub mod models;
pub mod services;
pub mod utils;

// 重新导出常用类型
pub use api::AssessmentApi;
pub use app::App;
pub use clients::AssessmentClient;
pub use config::Config;
pub use engine::{AttemptSession, TickOutcome, TimerPhase, WindowSignal};
pub use error::{AppError, AppResult};
pub use models::{AnswerState, Attempt, AttemptStatus, QuestionView, SubmitReason};
pub use services::{
    FullscreenPort, LogFullscreen, LogNotifier, MemoryResumeStore, Notifier, ResumeHint,
    ResumeStore,
};
