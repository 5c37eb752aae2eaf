//! 考试会话引擎集成测试
//!
//! 用内存桩服务端驱动完整会话，验证倒计时、缓存、作答捕获、
//! 心跳同步、完整性监控与交卷的行为约定。

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use exam_attempt_engine::api::dto::{
    AttemptStructureResponse, NavigateRequest, QuestionPayload, QuestionRefDto, ReviewRequest,
    SaveAnswerRequest, SectionDto, SubmitResponse, SyncResponse, SyncSnapshot, WindowEventRequest,
};
use exam_attempt_engine::api::AssessmentApi;
use exam_attempt_engine::models::QuestionType;
use exam_attempt_engine::{
    AttemptSession, AttemptStatus, Config, MemoryResumeStore, ResumeHint, ResumeStore,
    SubmitReason, TickOutcome, TimerPhase, WindowSignal,
};

// ========== 桩服务端 ==========

/// 内存桩服务端：记录每个接口的调用次数，可按需注入故障
struct MockApi {
    remaining_min: f64,
    structure_calls: AtomicUsize,
    question_calls: AtomicUsize,
    save_calls: AtomicUsize,
    review_calls: AtomicUsize,
    nav_calls: AtomicUsize,
    sync_calls: AtomicUsize,
    submit_calls: AtomicUsize,
    window_calls: AtomicUsize,
    fail_structure: AtomicBool,
    fail_sync: AtomicBool,
    fail_nav: AtomicBool,
    fail_question_id: Mutex<Option<i64>>,
    sync_remaining_min: Mutex<f64>,
    submit_delay: Duration,
    last_submit_reason: Mutex<Option<SubmitReason>>,
    last_save: Mutex<Option<SaveAnswerRequest>>,
}

impl MockApi {
    fn new(remaining_min: f64) -> Self {
        Self {
            remaining_min,
            structure_calls: AtomicUsize::new(0),
            question_calls: AtomicUsize::new(0),
            save_calls: AtomicUsize::new(0),
            review_calls: AtomicUsize::new(0),
            nav_calls: AtomicUsize::new(0),
            sync_calls: AtomicUsize::new(0),
            submit_calls: AtomicUsize::new(0),
            window_calls: AtomicUsize::new(0),
            fail_structure: AtomicBool::new(false),
            fail_sync: AtomicBool::new(false),
            fail_nav: AtomicBool::new(false),
            fail_question_id: Mutex::new(None),
            sync_remaining_min: Mutex::new(remaining_min),
            submit_delay: Duration::ZERO,
            last_submit_reason: Mutex::new(None),
            last_save: Mutex::new(None),
        }
    }

    fn with_submit_delay(mut self, delay: Duration) -> Self {
        self.submit_delay = delay;
        self
    }

    /// 两个大题：单选 [101, 102]，多选 [201]
    fn structure(&self, attempt_id: i64) -> AttemptStructureResponse {
        AttemptStructureResponse {
            attempt_id,
            test_id: 9,
            total_duration_min: 30,
            remaining_time_min: self.remaining_min,
            total_sections: 2,
            total_questions: 3,
            sections: vec![
                SectionDto {
                    section_id: 1,
                    name: "单选".to_string(),
                    questions: vec![
                        QuestionRefDto {
                            test_question_id: 101,
                            question_order: 1,
                            is_answered: false,
                            is_reviewed: false,
                            status: None,
                        },
                        QuestionRefDto {
                            test_question_id: 102,
                            question_order: 2,
                            is_answered: false,
                            is_reviewed: false,
                            status: None,
                        },
                    ],
                },
                SectionDto {
                    section_id: 2,
                    name: "多选".to_string(),
                    questions: vec![QuestionRefDto {
                        test_question_id: 201,
                        question_order: 1,
                        is_answered: false,
                        is_reviewed: false,
                        status: None,
                    }],
                },
            ],
        }
    }
}

#[async_trait]
impl AssessmentApi for MockApi {
    async fn get_attempt_structure(&self, attempt_id: i64) -> Result<AttemptStructureResponse> {
        self.structure_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_structure.load(Ordering::SeqCst) {
            return Err(anyhow!("结构接口不可用"));
        }
        Ok(self.structure(attempt_id))
    }

    async fn get_attempt_question(
        &self,
        _attempt_id: i64,
        question_id: i64,
    ) -> Result<QuestionPayload> {
        self.question_calls.fetch_add(1, Ordering::SeqCst);
        if *self.fail_question_id.lock().unwrap() == Some(question_id) {
            return Err(anyhow!("题目接口不可用"));
        }
        Ok(QuestionPayload {
            test_question_id: question_id,
            question_text: format!("题目 {}", question_id),
            question_type: QuestionType::SingleChoice,
            options: Vec::new(),
            marks: 4.0,
            negative_marks: 1.0,
            selected_option_id: None,
            selected_option_ids: Vec::new(),
            selected_answer: None,
            is_answered: false,
            is_reviewed: false,
        })
    }

    async fn save_answer(&self, _attempt_id: i64, req: SaveAnswerRequest) -> Result<()> {
        self.save_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_save.lock().unwrap() = Some(req);
        Ok(())
    }

    async fn mark_for_review(&self, _attempt_id: i64, _req: ReviewRequest) -> Result<()> {
        self.review_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn log_navigation(&self, _attempt_id: i64, _req: NavigateRequest) -> Result<()> {
        self.nav_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_nav.load(Ordering::SeqCst) {
            return Err(anyhow!("审计接口不可用"));
        }
        Ok(())
    }

    async fn sync_attempt(&self, _attempt_id: i64, _snapshot: SyncSnapshot) -> Result<SyncResponse> {
        self.sync_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_sync.load(Ordering::SeqCst) {
            return Err(anyhow!("心跳接口不可用"));
        }
        Ok(SyncResponse {
            remaining_time_min: *self.sync_remaining_min.lock().unwrap(),
        })
    }

    async fn submit_attempt(
        &self,
        _attempt_id: i64,
        reason: SubmitReason,
    ) -> Result<SubmitResponse> {
        self.submit_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_submit_reason.lock().unwrap() = Some(reason);
        if !self.submit_delay.is_zero() {
            tokio::time::sleep(self.submit_delay).await;
        }
        Ok(SubmitResponse {
            status: "submitted".to_string(),
        })
    }

    async fn log_window_event(&self, _attempt_id: i64, _event: WindowEventRequest) -> Result<()> {
        self.window_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

// ========== 测试辅助 ==========

fn test_config() -> Config {
    Config {
        attempt_id: 1,
        ..Config::default()
    }
}

async fn loaded_session(api: Arc<MockApi>) -> AttemptSession {
    let session = AttemptSession::new(test_config(), api)
        .with_resume_store(Arc::new(MemoryResumeStore::new()));
    session.load().await.expect("结构加载应成功");
    session
}

/// 等待已分离的后台任务（保存/上报）跑完
async fn drain_background_tasks() {
    tokio::time::sleep(Duration::from_millis(20)).await;
}

// ========== 倒计时 ==========

#[tokio::test]
async fn test_countdown_matches_tick_count() {
    let api = Arc::new(MockApi::new(30.0));
    let session = loaded_session(api.clone()).await;

    assert_eq!(session.remaining_time_ms(), 1_800_000, "30 分钟应换算为 1,800,000 毫秒");

    for _ in 0..5 {
        session.timer_tick().await;
    }
    assert_eq!(session.remaining_time_ms(), 1_795_000);
}

#[tokio::test]
async fn test_full_countdown_auto_submits_exactly_once() {
    let api = Arc::new(MockApi::new(30.0));
    let session = loaded_session(api.clone()).await;

    for _ in 0..1_800 {
        session.timer_tick().await;
    }

    assert_eq!(session.remaining_time_ms(), 0);
    assert_eq!(session.status(), AttemptStatus::Submitted);
    assert_eq!(api.submit_calls.load(Ordering::SeqCst), 1, "自动交卷只允许一次");
    assert_eq!(
        *api.last_submit_reason.lock().unwrap(),
        Some(SubmitReason::AutoTimeout)
    );

    // 后续节拍不再产生任何效果
    for _ in 0..3 {
        assert_eq!(session.timer_tick().await, TickOutcome::Stopped);
    }
    assert_eq!(api.submit_calls.load(Ordering::SeqCst), 1);
    assert_eq!(session.remaining_time_ms(), 0);
}

// ========== 题目缓存 ==========

#[tokio::test]
async fn test_revisit_never_refetches() {
    let api = Arc::new(MockApi::new(30.0));
    let session = loaded_session(api.clone()).await;

    // 加载时拉了首题
    assert_eq!(api.question_calls.load(Ordering::SeqCst), 1);

    session.navigate_to(0, 1).await.expect("切题应成功");
    assert_eq!(api.question_calls.load(Ordering::SeqCst), 2);

    // 回到首题：必须命中缓存
    session.navigate_to(0, 0).await.expect("切题应成功");
    assert_eq!(api.question_calls.load(Ordering::SeqCst), 2, "重访不得再发请求");
    assert_eq!(session.current_question_id(), Some(101));
}

#[tokio::test]
async fn test_question_fetch_failure_stays_on_previous() {
    let api = Arc::new(MockApi::new(30.0));
    let session = loaded_session(api.clone()).await;

    *api.fail_question_id.lock().unwrap() = Some(102);

    let view = session.navigate_to(0, 1).await.expect("切题不应崩溃");
    assert!(view.is_none());
    assert_eq!(session.current_question_id(), Some(101), "应退回原题");
    assert_eq!(api.question_calls.load(Ordering::SeqCst), 2, "确实尝试过拉取");

    // 接口恢复后再切题成功
    *api.fail_question_id.lock().unwrap() = None;
    let view = session.navigate_to(0, 1).await.expect("切题应成功");
    assert!(view.is_some());
    assert_eq!(session.current_question_id(), Some(102));
}

// ========== 作答捕获 ==========

#[tokio::test]
async fn test_clear_then_reselect_keeps_last_write() {
    let api = Arc::new(MockApi::new(30.0));
    let session = loaded_session(api.clone()).await;

    session.select_single(11);
    session.clear_answer();
    session.select_single(12);

    let view = session.current_view().expect("首题应有视图");
    assert_eq!(view.answer.selected_option_id, Some(12), "应保留最后一次操作");
    assert!(view.answer.is_answered);

    drain_background_tasks().await;
    assert_eq!(api.save_calls.load(Ordering::SeqCst), 3, "每次操作都应发起持久化");

    let last = api.last_save.lock().unwrap().clone().expect("应有保存记录");
    assert_eq!(last.selected_option_id, Some(12));
    assert!(last.is_answered);
}

#[tokio::test]
async fn test_review_toggle_reports_mark_endpoint() {
    let api = Arc::new(MockApi::new(30.0));
    let session = loaded_session(api.clone()).await;

    session.toggle_review(true);
    drain_background_tasks().await;

    assert_eq!(api.review_calls.load(Ordering::SeqCst), 1);
    let view = session.current_view().expect("首题应有视图");
    assert!(view.answer.is_reviewed);
}

#[tokio::test]
async fn test_capture_ignored_after_submission() {
    let api = Arc::new(MockApi::new(30.0));
    let session = loaded_session(api.clone()).await;

    session.submit(SubmitReason::Manual).await.expect("交卷应成功");

    session.select_single(5);
    drain_background_tasks().await;
    assert_eq!(api.save_calls.load(Ordering::SeqCst), 0, "终态后不得再保存");

    assert!(!session.sync_tick().await, "终态后心跳应停止");
    assert_eq!(api.sync_calls.load(Ordering::SeqCst), 0);
}

// ========== 心跳同步 ==========

#[tokio::test]
async fn test_failed_sync_keeps_remaining_and_next_tick_retries() {
    let api = Arc::new(MockApi::new(30.0));
    let session = loaded_session(api.clone()).await;

    api.fail_sync.store(true, Ordering::SeqCst);
    let before = session.remaining_time_ms();

    assert!(session.sync_tick().await, "失败的心跳不应终止心跳循环");
    assert_eq!(session.remaining_time_ms(), before, "失败不得改动剩余时间");
    assert_eq!(api.sync_calls.load(Ordering::SeqCst), 1);

    // 下一跳无条件重试，成功后服务端值胜出
    api.fail_sync.store(false, Ordering::SeqCst);
    *api.sync_remaining_min.lock().unwrap() = 20.0;

    assert!(session.sync_tick().await);
    assert_eq!(session.remaining_time_ms(), 1_200_000, "应采用服务端权威值");
    assert_eq!(api.sync_calls.load(Ordering::SeqCst), 2);
}

// ========== 切题 ==========

#[tokio::test]
async fn test_out_of_range_navigation_is_noop() {
    let api = Arc::new(MockApi::new(30.0));
    let session = loaded_session(api.clone()).await;

    let view = session.navigate_to(9, 9).await.expect("越界不应报错");
    assert!(view.is_none());
    assert_eq!(session.current_question_id(), Some(101), "当前题应保持不变");
    assert_eq!(api.question_calls.load(Ordering::SeqCst), 1, "不应发起任何拉取");
}

#[tokio::test]
async fn test_next_prev_wrap_across_sections_but_not_ends() {
    let api = Arc::new(MockApi::new(30.0));
    let session = loaded_session(api.clone()).await;

    session.next_question().await.expect("切题应成功");
    assert_eq!(session.current_question_id(), Some(102));

    // 大题末尾衔接下一大题
    session.next_question().await.expect("切题应成功");
    assert_eq!(session.current_question_id(), Some(201));

    // 全卷最后一题不再前进
    let view = session.next_question().await.expect("无操作不应报错");
    assert!(view.is_none());
    assert_eq!(session.current_question_id(), Some(201));

    // 大题开头衔接上一大题末尾
    session.prev_question().await.expect("切题应成功");
    assert_eq!(session.current_question_id(), Some(102));
}

#[tokio::test]
async fn test_navigation_log_failure_is_tolerated() {
    let api = Arc::new(MockApi::new(30.0));
    let session = loaded_session(api.clone()).await;

    api.fail_nav.store(true, Ordering::SeqCst);

    let view = session.navigate_to(0, 1).await.expect("切题应成功");
    assert!(view.is_some(), "审计失败不影响切题");
    assert_eq!(session.current_question_id(), Some(102));

    drain_background_tasks().await;
    assert_eq!(api.nav_calls.load(Ordering::SeqCst), 1, "审计确实发起过");
}

// ========== 完整性监控 ==========

#[tokio::test]
async fn test_fullscreen_exit_violation_and_modal_flow() {
    let api = Arc::new(MockApi::new(30.0));
    let session = loaded_session(api.clone()).await;
    let remaining = session.remaining_time_ms();

    session.handle_window_signal(WindowSignal::FullscreenExited);
    assert_eq!(session.violation_count(), 1);
    assert!(session.modal_blocked(), "退出全屏应拉起阻塞弹窗");

    drain_background_tasks().await;
    assert_eq!(api.window_calls.load(Ordering::SeqCst), 1);

    session.handle_window_signal(WindowSignal::FullscreenEntered);
    assert!(!session.modal_blocked(), "回到全屏应解除弹窗");
    assert_eq!(session.violation_count(), 1, "违规数不回退");
    assert_eq!(session.remaining_time_ms(), remaining, "剩余时间不受影响");
}

#[tokio::test]
async fn test_tab_hidden_counts_violation() {
    let api = Arc::new(MockApi::new(30.0));
    let session = loaded_session(api.clone()).await;

    session.handle_window_signal(WindowSignal::TabHidden);
    session.handle_window_signal(WindowSignal::TabVisible);

    assert_eq!(session.violation_count(), 1);
    assert!(!session.modal_blocked(), "切屏不拉弹窗");

    drain_background_tasks().await;
    assert_eq!(api.window_calls.load(Ordering::SeqCst), 1);
}

// ========== 交卷 ==========

#[tokio::test]
async fn test_concurrent_submits_issue_single_network_call() {
    let api = Arc::new(MockApi::new(30.0).with_submit_delay(Duration::from_millis(50)));
    let session = loaded_session(api.clone()).await;

    let (a, b) = tokio::join!(
        session.submit(SubmitReason::Manual),
        session.submit(SubmitReason::Review)
    );

    assert!(a.is_ok() && b.is_ok(), "并发提交双方都应平静返回");
    assert_eq!(api.submit_calls.load(Ordering::SeqCst), 1, "只允许一次网络提交");
    assert_eq!(session.status(), AttemptStatus::Submitted);
}

// ========== 引导与恢复 ==========

#[tokio::test]
async fn test_structure_load_failure_is_terminal() {
    let api = Arc::new(MockApi::new(30.0));
    api.fail_structure.store(true, Ordering::SeqCst);

    let session = AttemptSession::new(test_config(), api.clone())
        .with_resume_store(Arc::new(MemoryResumeStore::new()));

    assert!(session.load().await.is_err(), "结构拿不到应直接报错");
    assert!(!session.is_loaded());
    assert_eq!(session.timer_phase(), TimerPhase::Idle, "倒计时不得启动");
}

#[tokio::test]
async fn test_resume_hint_restores_cursor_and_submit_clears_it() {
    let api = Arc::new(MockApi::new(30.0));
    let store = Arc::new(MemoryResumeStore::with_hint(ResumeHint {
        attempt_id: 1,
        section_idx: 1,
        question_idx: 0,
    }));

    let session = AttemptSession::new(test_config(), api.clone())
        .with_resume_store(store.clone() as Arc<dyn ResumeStore>);
    session.load().await.expect("结构加载应成功");

    assert_eq!(session.current_question_id(), Some(201), "应按提示回到上次位置");

    session.submit(SubmitReason::Manual).await.expect("交卷应成功");
    assert_eq!(store.load().expect("读取提示应成功"), None, "交卷后应清除提示");
}

#[tokio::test]
async fn test_zero_remaining_structure_auto_submits_on_load() {
    let api = Arc::new(MockApi::new(0.0));
    let session = AttemptSession::new(test_config(), api.clone())
        .with_resume_store(Arc::new(MemoryResumeStore::new()));

    session.load().await.expect("加载本身应成功");

    assert_eq!(session.status(), AttemptStatus::Submitted);
    assert_eq!(api.submit_calls.load(Ordering::SeqCst), 1);
    assert_eq!(
        *api.last_submit_reason.lock().unwrap(),
        Some(SubmitReason::AutoTimeout)
    );
}

// ========== 时钟任务 ==========

#[tokio::test]
async fn test_clocks_drive_attempt_to_auto_submit() {
    // 把节拍压到 10ms、总时长压到 60ms，整场考试几百毫秒内走完
    let api = Arc::new(MockApi::new(0.001));
    let config = Config {
        attempt_id: 1,
        timer_tick_ms: 10,
        sync_interval_ms: 30,
        sync_initial_delay_ms: 5,
        ..Config::default()
    };

    let session = AttemptSession::new(config, api.clone())
        .with_resume_store(Arc::new(MemoryResumeStore::new()));
    session.load().await.expect("结构加载应成功");
    session.start_clocks();

    tokio::time::sleep(Duration::from_millis(500)).await;

    assert_eq!(session.status(), AttemptStatus::Submitted, "到时应自动交卷");
    assert_eq!(api.submit_calls.load(Ordering::SeqCst), 1);

    // 终态后时钟任务应已自行退出，shutdown 只是兜底且不得悬挂
    session.shutdown().await;
}
