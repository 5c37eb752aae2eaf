//! 无界面运行器 - 编排层
//!
//! ## 职责
//!
//! 1. **应用初始化**：构建 HTTP 客户端与考试会话
//! 2. **引导**：加载结构、启动倒计时与心跳
//! 3. **守候**：周期性输出进度，直到会话进入终态
//! 4. **收尾**：停掉时钟任务、输出统计
//!
//! 真实部署里会话由界面宿主驱动；这个运行器用于联调与压测，
//! 把一场考试从头跑到尾（到时自动交卷）。

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tracing::{info, warn};

use crate::clients::AssessmentClient;
use crate::config::Config;
use crate::engine::{AttemptSession, TimerPhase};
use crate::models::{AttemptStatus, SubmitReason};
use crate::utils::logging::{log_attempt_finished, log_startup};

/// 应用主结构
pub struct App {
    session: AttemptSession,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        log_startup(&config);

        let client = Arc::new(AssessmentClient::new(&config));
        let session = AttemptSession::new(config, client);

        Ok(Self { session })
    }

    /// 运行应用主逻辑：跑完一整场考试
    pub async fn run(&self) -> Result<()> {
        self.session.load().await?;
        self.session.start_clocks();

        self.wait_until_finished().await;
        self.session.shutdown().await;

        let overview = self.session.attempt_overview();
        let (answered, _) = self.session.progress();
        log_attempt_finished(answered, overview.total_questions, self.session.violation_count());

        Ok(())
    }

    /// 守候到会话终态
    ///
    /// 到时但自动交卷失败的场合，每 30 秒补一次交卷重试。
    async fn wait_until_finished(&self) {
        let mut interval = tokio::time::interval(Duration::from_secs(1));
        let mut elapsed_sec: u64 = 0;

        loop {
            interval.tick().await;

            if self.session.status() == AttemptStatus::Submitted {
                break;
            }

            elapsed_sec += 1;

            if elapsed_sec % 60 == 0 {
                let (answered, reviewed) = self.session.progress();
                info!(
                    "⏳ 剩余 {} 秒 | 已作答 {} | 待复查 {}",
                    self.session.remaining_time_ms() / 1_000,
                    answered,
                    reviewed
                );
            }

            // 到时但未能交卷：周期性补交
            if self.session.timer_phase() == TimerPhase::Expired
                && self.session.status() == AttemptStatus::InProgress
                && elapsed_sec % 30 == 0
            {
                warn!("到时后交卷仍未完成，重试...");
                if let Err(e) = self.session.submit(SubmitReason::AutoTimeout).await {
                    warn!("补交失败: {}", e);
                }
            }
        }
    }
}
