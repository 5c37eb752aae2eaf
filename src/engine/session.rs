//! 考试会话 - 流程层
//!
//! 核心职责：编排一场考试从结构加载到交卷的完整生命周期
//!
//! 流程顺序：
//! 1. load → 拉结构、建作答状态、起倒计时、定位首题
//! 2. start_clocks → 挂起 1 秒倒计时节拍与 5 秒心跳两个独立任务
//! 3. 作答/切题/完整性信号 → 乐观更新本地状态 + 后台持久化
//! 4. submit（主动 / 检查页 / 到时自动）→ 终态，时钟随之停止
//!
//! 两个周期任务各持有共享状态句柄，每次醒来读取最新状态；
//! 观察到会话终结即自行退出，`shutdown` 再兜底中止并等待句柄。

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use futures::future::join_all;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use crate::api::dto::{NavigateRequest, ReviewRequest, SaveAnswerRequest};
use crate::api::AssessmentApi;
use crate::config::Config;
use crate::engine::integrity::{self, WindowSignal};
use crate::engine::state::{lock_state, AttemptState, Cursor, SharedState};
use crate::engine::timer::{TickOutcome, TimerPhase};
use crate::engine::{cache, navigation, sync, timer};
use crate::error::AppError;
use crate::models::{AnswerState, Attempt, AttemptStatus, QuestionView, SubmitReason};
use crate::services::{
    FileResumeStore, FullscreenPort, LogFullscreen, LogNotifier, Notifier, ResumeHint, ResumeStore,
};
use crate::utils::logging::preview;

/// 考试会话
///
/// - 独占持有整场考试的可变状态
/// - 只依赖 `AssessmentApi` 抽象与注入的界面/存储能力
/// - 可克隆：克隆体共享同一份状态，周期任务、并发调用都拿克隆体工作
#[derive(Clone)]
pub struct AttemptSession {
    api: Arc<dyn AssessmentApi>,
    config: Config,
    state: SharedState,
    notifier: Arc<dyn Notifier>,
    fullscreen: Arc<dyn FullscreenPort>,
    resume: Arc<dyn ResumeStore>,
    clocks: Arc<Mutex<Vec<JoinHandle<()>>>>,
}

impl AttemptSession {
    /// 创建新的考试会话（注入项使用默认实现）
    pub fn new(config: Config, api: Arc<dyn AssessmentApi>) -> Self {
        let state = Arc::new(Mutex::new(AttemptState::unloaded(config.attempt_id)));
        let resume = Arc::new(FileResumeStore::with_path(config.resume_file.clone()));

        Self {
            api,
            config,
            state,
            notifier: Arc::new(LogNotifier),
            fullscreen: Arc::new(LogFullscreen),
            resume,
            clocks: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// 替换界面提示实现
    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    /// 替换全屏入口实现
    pub fn with_fullscreen(mut self, fullscreen: Arc<dyn FullscreenPort>) -> Self {
        self.fullscreen = fullscreen;
        self
    }

    /// 替换恢复提示存储实现
    pub fn with_resume_store(mut self, resume: Arc<dyn ResumeStore>) -> Self {
        self.resume = resume;
        self
    }

    // ========== 加载（一次性引导） ==========

    /// 拉取试卷结构并完成引导
    ///
    /// 失败即终态：结构拿不到，考试无法开始，这里不做重试。
    /// 全屏请求作为副作用提前发出，与加载结果无关。
    pub async fn load(&self) -> Result<()> {
        info!("📋 正在加载试卷结构: attempt={}", self.config.attempt_id);
        self.notifier.set_loading(true);
        self.fullscreen.request_fullscreen();

        let resp = match self
            .api
            .get_attempt_structure(self.config.attempt_id)
            .await
        {
            Ok(resp) => resp,
            Err(e) => {
                self.notifier.set_loading(false);
                self.notifier.toast("试卷加载失败，请联系监考人员");
                error!("❌ 试卷结构加载失败: {}", e);
                return Err(e).context("结构加载失败，会话无法继续");
            }
        };

        let (first_question, expired_on_load) = {
            let mut state = lock_state(&self.state);
            state.apply_structure(resp);

            // 断点恢复：提示仍然有效就把光标放回上次位置
            if let Ok(Some(hint)) = self.resume.load() {
                if hint.attempt_id == state.attempt.attempt_id
                    && state.ref_at(hint.section_idx, hint.question_idx).is_some()
                {
                    info!(
                        "🔖 按恢复提示回到 第{}大题 第{}题",
                        hint.section_idx + 1,
                        hint.question_idx + 1
                    );
                    state.cursor = Cursor {
                        section_idx: hint.section_idx,
                        question_idx: hint.question_idx,
                    };
                }
            }

            let expired = if timer::start(&mut state) {
                false
            } else {
                // 服务端下发的剩余时间已不为正，不进入倒计时
                timer::expire_immediately(&mut state);
                true
            };

            info!(
                "✓ 结构加载完成: {} 个大题 / {} 道题, 剩余 {} 秒",
                state.attempt.total_sections,
                state.attempt.total_questions,
                state.attempt.remaining_time_ms / 1_000
            );

            (state.current_question_id(), expired)
        };

        self.save_resume_hint();

        if let Some(question_id) = first_question {
            if let Err(e) = self.load_question(question_id).await {
                warn!("首题加载失败: {}", e);
            }
        }

        self.notifier.set_loading(false);

        if expired_on_load {
            warn!("⚠️ 结构下发时剩余时间已为零，直接自动交卷");
            if let Err(e) = self.submit(SubmitReason::AutoTimeout).await {
                error!("自动交卷失败: {}", e);
            }
        }

        Ok(())
    }

    // ========== 题目加载与缓存 ==========

    /// 加载一道题的渲染视图
    ///
    /// 命中缓存时同步返回，不发网络请求；未命中时拉取入缓存，
    /// 并用服务端报文初始化该题作答状态。拉取失败会提示用户，
    /// 由调用方决定光标去留。
    pub async fn load_question(&self, question_id: i64) -> Result<QuestionView> {
        {
            let mut state = lock_state(&self.state);
            if let Some(view) = cache::lookup(&mut state, question_id) {
                debug!("缓存命中: question={}", question_id);
                return Ok(view);
            }
        }

        match self
            .api
            .get_attempt_question(self.config.attempt_id, question_id)
            .await
        {
            Ok(payload) => {
                let mut state = lock_state(&self.state);
                let view = cache::store(&mut state, payload);
                if self.config.verbose_logging {
                    info!("题干: {}", preview(&view.content.question_text, 80));
                }
                Ok(view)
            }
            Err(e) => {
                self.notifier.toast("题目加载失败，请重试");
                warn!("题目拉取失败: question={} ({})", question_id, e);
                Err(e)
            }
        }
    }

    // ========== 切题 ==========

    /// 跳转到指定大题/题目下标
    ///
    /// 目标越界按无操作处理。光标先行更新（界面不等网络），切题审计
    /// 与内容加载并发进行；内容拉取失败则把光标退回原题。
    pub async fn navigate_to(
        &self,
        section_idx: usize,
        question_idx: usize,
    ) -> Result<Option<QuestionView>> {
        let (target, from_question_id, prev_cursor, time_spent) = {
            let mut state = lock_state(&self.state);
            if !state.loaded {
                return Err(AppError::structure_not_loaded().into());
            }
            if !state.attempt.is_in_progress() {
                return Ok(None);
            }

            let Some(target_id) = navigation::resolve(&state.sections, section_idx, question_idx)
            else {
                debug!("切题目标越界，忽略: ({}, {})", section_idx, question_idx);
                return Ok(None);
            };

            let from = state.current_question_id();
            let prev = state.cursor;
            let spent = state.time_spent_sec();

            state.cursor = Cursor {
                section_idx,
                question_idx,
            };
            state.question_shown_at = Instant::now();

            (target_id, from, prev, spent)
        };

        self.spawn_navigation_log(from_question_id, target, time_spent);

        match self.load_question(target).await {
            Ok(view) => {
                self.save_resume_hint();
                Ok(Some(view))
            }
            Err(_) => {
                // 内容拿不到就留在原题
                let mut state = lock_state(&self.state);
                state.cursor = prev_cursor;
                state.question_shown_at = Instant::now();
                Ok(None)
            }
        }
    }

    /// 下一题（大题末尾衔接下一大题，全卷最后一题无操作）
    pub async fn next_question(&self) -> Result<Option<QuestionView>> {
        let next = {
            let state = lock_state(&self.state);
            navigation::step_next(&state.sections, state.cursor)
        };
        match next {
            Some(c) => self.navigate_to(c.section_idx, c.question_idx).await,
            None => Ok(None),
        }
    }

    /// 上一题（大题开头衔接上一大题末尾，全卷第一题无操作）
    pub async fn prev_question(&self) -> Result<Option<QuestionView>> {
        let prev = {
            let state = lock_state(&self.state);
            navigation::step_prev(&state.sections, state.cursor)
        };
        match prev {
            Some(c) => self.navigate_to(c.section_idx, c.question_idx).await,
            None => Ok(None),
        }
    }

    // ========== 作答捕获 ==========
    // 四个操作同一模式：本地乐观更新，然后后台持久化（不阻塞界面）。
    // 保存失败只记日志——本地状态是界面的唯一事实，心跳同步负责兜底。

    /// 单选
    pub fn select_single(&self, option_id: i64) {
        self.mutate_answer("单选", |ans| ans.select_single(option_id));
    }

    /// 多选增删一个选项
    pub fn toggle_multi(&self, option_id: i64) {
        self.mutate_answer("多选", |ans| ans.toggle_multi(option_id));
    }

    /// 数值/填空作答
    pub fn set_numeric(&self, value: &str) {
        let value = value.to_string();
        self.mutate_answer("数值", move |ans| ans.set_numeric(&value));
    }

    /// 清除当前题作答
    pub fn clear_answer(&self) {
        self.mutate_answer("清除", |ans| ans.clear());
    }

    /// 标记/取消标记当前题待复查
    pub fn toggle_review(&self, reviewed: bool) {
        let req = {
            let mut state = lock_state(&self.state);
            if !state.attempt.is_in_progress() {
                return;
            }
            let Some(question_id) = state.current_question_id() else {
                return;
            };
            let Some(ans) = state.answers.get_mut(&question_id) else {
                return;
            };
            ans.set_reviewed(reviewed);
            ReviewRequest {
                question_id,
                is_reviewed: reviewed,
            }
        };

        let api = self.api.clone();
        let attempt_id = self.config.attempt_id;
        tokio::spawn(async move {
            if let Err(e) = api.mark_for_review(attempt_id, req).await {
                warn!("复查标记上报失败（已忽略）: {}", e);
            }
        });
    }

    fn mutate_answer(&self, op: &str, f: impl FnOnce(&mut AnswerState)) {
        let req = {
            let mut state = lock_state(&self.state);
            if !state.attempt.is_in_progress() {
                debug!("会话已终结，忽略{}操作", op);
                return;
            }
            let Some(question_id) = state.current_question_id() else {
                return;
            };
            let spent = state.time_spent_sec();
            let Some(ans) = state.answers.get_mut(&question_id) else {
                return;
            };
            f(ans);
            SaveAnswerRequest::from_state(question_id, ans, spent)
        };

        debug!("{}作答已更新: question={}", op, req.question_id);
        self.spawn_save(req);
    }

    fn spawn_save(&self, req: SaveAnswerRequest) {
        let api = self.api.clone();
        let attempt_id = self.config.attempt_id;
        tokio::spawn(async move {
            if let Err(e) = api.save_answer(attempt_id, req).await {
                warn!("作答保存失败（已忽略）: {}", e);
            }
        });
    }

    fn spawn_navigation_log(&self, from: Option<i64>, to: i64, time_spent_sec: u64) {
        let api = self.api.clone();
        let attempt_id = self.config.attempt_id;
        let req = NavigateRequest {
            from_question_id: from,
            to_question_id: to,
            time_spent_sec,
        };
        tokio::spawn(async move {
            if let Err(e) = api.log_navigation(attempt_id, req).await {
                warn!("切题审计上报失败（已忽略）: {}", e);
            }
        });
    }

    // ========== 完整性信号 ==========

    /// 处理宿主环境的窗口信号
    ///
    /// 违规只计数、上报、拉弹窗，不暂停倒计时与心跳。
    pub fn handle_window_signal(&self, signal: WindowSignal) {
        let report = {
            let mut state = lock_state(&self.state);
            integrity::record_signal(&mut state, signal)
        };

        if let Some(event) = report {
            let api = self.api.clone();
            let attempt_id = self.config.attempt_id;
            tokio::spawn(async move {
                if let Err(e) = api.log_window_event(attempt_id, event).await {
                    warn!("违规上报失败（已忽略）: {}", e);
                }
            });
        }
    }

    // ========== 时钟 ==========

    /// 执行一个倒计时节拍；首次归零时在这里触发自动交卷
    pub async fn timer_tick(&self) -> TickOutcome {
        let outcome = {
            let mut state = lock_state(&self.state);
            timer::tick(&mut state, self.config.timer_tick_ms)
        };

        if outcome == TickOutcome::Expired {
            info!("⏰ 考试时间到，触发自动交卷");
            if let Err(e) = self.submit(SubmitReason::AutoTimeout).await {
                error!("自动交卷失败: {}", e);
            }
        }

        outcome
    }

    /// 执行一次心跳同步；返回心跳是否应继续
    pub async fn sync_tick(&self) -> bool {
        let snapshot = {
            let state = lock_state(&self.state);
            sync::build_snapshot(&state)
        };
        let Some(snapshot) = snapshot else {
            return false;
        };

        match self.api.sync_attempt(self.config.attempt_id, snapshot).await {
            Ok(resp) => {
                let mut state = lock_state(&self.state);
                sync::apply_correction(&mut state, &resp, self.config.max_drift_warn_ms);
            }
            Err(e) => {
                // 单次失败不碰本地倒计时，下个周期无条件重试
                warn!("心跳同步失败（已忽略）: {}", e);
            }
        }
        true
    }

    /// 挂起倒计时与心跳两个周期任务
    ///
    /// 两个任务的节拍互相独立；都在观察到会话终结后自行退出。
    pub fn start_clocks(&self) {
        let timer_task = {
            let session = self.clone();
            let tick = Duration::from_millis(self.config.timer_tick_ms);
            tokio::spawn(async move {
                let mut interval = tokio::time::interval(tick);
                interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
                interval.tick().await; // 首个 tick 立即完成，跳过

                loop {
                    interval.tick().await;
                    match session.timer_tick().await {
                        TickOutcome::Ticked(_) => {}
                        TickOutcome::Expired | TickOutcome::Stopped => break,
                    }
                }
                debug!("倒计时任务退出");
            })
        };

        let sync_task = {
            let session = self.clone();
            let initial = Duration::from_millis(self.config.sync_initial_delay_ms);
            let period = Duration::from_millis(self.config.sync_interval_ms);
            tokio::spawn(async move {
                tokio::time::sleep(initial).await;
                let mut interval = tokio::time::interval(period);
                interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
                interval.tick().await; // 首个 tick 立即完成，跳过

                loop {
                    if !session.sync_tick().await {
                        break;
                    }
                    interval.tick().await;
                }
                debug!("心跳任务退出");
            })
        };

        let mut clocks = self.clocks.lock().unwrap_or_else(|e| e.into_inner());
        clocks.push(timer_task);
        clocks.push(sync_task);
    }

    /// 停止并等待所有时钟任务
    ///
    /// 周期任务正常情况下已随终态自行退出，这里兜底中止，
    /// 保证离开页面时没有悬挂的定时器。
    pub async fn shutdown(&self) {
        let handles: Vec<JoinHandle<()>> = {
            let mut clocks = self.clocks.lock().unwrap_or_else(|e| e.into_inner());
            clocks.drain(..).collect()
        };

        for handle in &handles {
            handle.abort();
        }
        let _ = join_all(handles).await;
        debug!("时钟任务已全部停止");
    }

    // ========== 交卷 ==========

    /// 交卷：唯一入口，整场考试只允许成功一次
    ///
    /// 通过 `in_progress → submitting` 的占位拒绝并发的第二次提交；
    /// 成功后进入终态并清除恢复提示，失败则释放占位允许重试。
    pub async fn submit(&self, reason: SubmitReason) -> Result<()> {
        {
            let mut state = lock_state(&self.state);
            if !state.loaded {
                return Err(AppError::structure_not_loaded().into());
            }
            if !state.attempt.begin_submission() {
                debug!("提交在途或已交卷，忽略此次 {} 提交", reason.as_str());
                return Ok(());
            }
        }

        info!("📤 正在交卷: reason={}", reason.as_str());
        self.notifier.set_loading(true);

        match self.api.submit_attempt(self.config.attempt_id, reason).await {
            Ok(resp) => {
                {
                    let mut state = lock_state(&self.state);
                    state.attempt.confirm_submitted();
                }
                if let Err(e) = self.resume.clear() {
                    warn!("清除恢复提示失败: {}", e);
                }
                self.notifier.set_loading(false);
                info!("✓ 交卷成功: status={}", resp.status);
                Ok(())
            }
            Err(e) => {
                {
                    let mut state = lock_state(&self.state);
                    state.attempt.reopen();
                }
                self.notifier.set_loading(false);
                self.notifier.toast("交卷失败，请重试");
                error!("❌ 交卷失败: {}", e);
                Err(e).context("交卷未完成，可重试")
            }
        }
    }

    // ========== 状态只读访问 ==========

    pub fn status(&self) -> AttemptStatus {
        lock_state(&self.state).attempt.status
    }

    pub fn remaining_time_ms(&self) -> u64 {
        lock_state(&self.state).attempt.remaining_time_ms
    }

    pub fn timer_phase(&self) -> TimerPhase {
        lock_state(&self.state).timer
    }

    pub fn is_loaded(&self) -> bool {
        lock_state(&self.state).loaded
    }

    pub fn cursor(&self) -> Cursor {
        lock_state(&self.state).cursor
    }

    pub fn current_question_id(&self) -> Option<i64> {
        lock_state(&self.state).current_question_id()
    }

    pub fn violation_count(&self) -> u32 {
        lock_state(&self.state).violations
    }

    pub fn modal_blocked(&self) -> bool {
        lock_state(&self.state).modal_blocked
    }

    /// 会话元信息快照（日志/界面头部用）
    pub fn attempt_overview(&self) -> Attempt {
        lock_state(&self.state).attempt.clone()
    }

    /// 已作答/已标记复查的题数
    pub fn progress(&self) -> (usize, usize) {
        lock_state(&self.state).progress()
    }

    /// 当前题的渲染视图（仅缓存，不发网络请求）
    pub fn current_view(&self) -> Option<QuestionView> {
        let mut state = lock_state(&self.state);
        let question_id = state.current_question_id()?;
        cache::lookup(&mut state, question_id)
    }

    // ========== 内部辅助 ==========

    fn save_resume_hint(&self) {
        let hint = {
            let state = lock_state(&self.state);
            ResumeHint {
                attempt_id: state.attempt.attempt_id,
                section_idx: state.cursor.section_idx,
                question_idx: state.cursor.question_idx,
            }
        };
        if let Err(e) = self.resume.save(&hint) {
            debug!("恢复提示写入失败（已忽略）: {}", e);
        }
    }
}
