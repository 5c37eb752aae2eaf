//! 引擎共享状态
//!
//! 整场考试的可变状态集中在一个 `AttemptState` 里，由
//! `Arc<Mutex<..>>` 共享给倒计时任务、心跳任务和会话方法。
//! 周期任务每次被唤醒时从这个状态单元读取最新值，而不是在
//! 状态变化时重建任务。
//!
//! 锁只在同步代码段内短暂持有，绝不跨 await 点。

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

use crate::api::dto::AttemptStructureResponse;
use crate::engine::timer::TimerPhase;
use crate::models::{
    remaining_min_to_ms, AnswerState, Attempt, AttemptStatus, QuestionContent, QuestionRef, Section,
};

/// 光标：当前停留的大题/题目下标
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
    pub section_idx: usize,
    pub question_idx: usize,
}

/// 引擎共享状态单元
#[derive(Debug)]
pub struct AttemptState {
    /// 会话元信息（状态机字段在这里）
    pub attempt: Attempt,
    /// 试卷结构，加载完成后不可变
    pub sections: Vec<Section>,
    /// 每题一个作答状态，生命周期内只修改不删除
    pub answers: HashMap<i64, AnswerState>,
    /// 题目内容缓存，入缓存后原样复用
    pub cache: HashMap<i64, QuestionContent>,
    /// 当前光标
    pub cursor: Cursor,
    /// 倒计时状态机
    pub timer: TimerPhase,
    /// 当前题开始展示的时间，用于计算 timeSpentSec
    pub question_shown_at: Instant,
    /// 违规累计次数（仅供界面门控）
    pub violations: u32,
    /// 退出全屏后的阻塞弹窗标志
    pub modal_blocked: bool,
    /// 结构是否加载完成
    pub loaded: bool,
}

/// 共享状态句柄
pub type SharedState = Arc<Mutex<AttemptState>>;

/// 取锁，毒化时取回内部值继续
///
/// 状态单元里没有跨字段的不变量会被半途崩溃破坏，吞掉毒化标记是安全的。
pub fn lock_state(state: &SharedState) -> MutexGuard<'_, AttemptState> {
    state.lock().unwrap_or_else(|e| e.into_inner())
}

impl AttemptState {
    /// 加载前的占位状态
    pub fn unloaded(attempt_id: i64) -> Self {
        Self {
            attempt: Attempt {
                attempt_id,
                test_id: 0,
                total_duration_min: 0,
                remaining_time_ms: 0,
                total_sections: 0,
                total_questions: 0,
                status: AttemptStatus::InProgress,
            },
            sections: Vec::new(),
            answers: HashMap::new(),
            cache: HashMap::new(),
            cursor: Cursor {
                section_idx: 0,
                question_idx: 0,
            },
            timer: TimerPhase::Idle,
            question_shown_at: Instant::now(),
            violations: 0,
            modal_blocked: false,
            loaded: false,
        }
    }

    /// 用结构响应填充状态：建结构树、逐题建作答状态、换算剩余毫秒
    pub fn apply_structure(&mut self, resp: AttemptStructureResponse) {
        let mut answers = HashMap::new();
        let sections: Vec<Section> = resp
            .sections
            .into_iter()
            .map(|s| {
                let mut questions: Vec<QuestionRef> = s
                    .questions
                    .into_iter()
                    .map(|q| {
                        answers.insert(
                            q.test_question_id,
                            AnswerState::seeded(q.is_answered, q.is_reviewed, q.was_visited()),
                        );
                        QuestionRef {
                            test_question_id: q.test_question_id,
                            question_order: q.question_order,
                        }
                    })
                    .collect();
                questions.sort_by_key(|q| q.question_order);
                Section {
                    section_id: s.section_id,
                    name: s.name,
                    questions,
                }
            })
            .collect();

        self.answers = answers;
        self.sections = sections;

        self.attempt = Attempt {
            attempt_id: resp.attempt_id,
            test_id: resp.test_id,
            total_duration_min: resp.total_duration_min,
            remaining_time_ms: remaining_min_to_ms(resp.remaining_time_min),
            total_sections: resp.total_sections,
            total_questions: resp.total_questions,
            status: AttemptStatus::InProgress,
        };
        self.cursor = Cursor {
            section_idx: 0,
            question_idx: 0,
        };
        self.timer = TimerPhase::Idle;
        self.question_shown_at = Instant::now();
        self.loaded = true;
    }

    /// 指定下标处的题目条目
    pub fn ref_at(&self, section_idx: usize, question_idx: usize) -> Option<&QuestionRef> {
        self.sections.get(section_idx)?.questions.get(question_idx)
    }

    /// 光标所指的题目条目
    pub fn current_ref(&self) -> Option<&QuestionRef> {
        self.ref_at(self.cursor.section_idx, self.cursor.question_idx)
    }

    /// 光标所指的题目ID
    pub fn current_question_id(&self) -> Option<i64> {
        self.current_ref().map(|r| r.test_question_id)
    }

    /// 光标所在大题的ID
    pub fn current_section_id(&self) -> Option<i64> {
        self.sections
            .get(self.cursor.section_idx)
            .map(|s| s.section_id)
    }

    /// 当前题展示以来的停留秒数
    pub fn time_spent_sec(&self) -> u64 {
        self.question_shown_at.elapsed().as_secs()
    }

    /// 已作答/已标记复查的题数（进度日志用）
    pub fn progress(&self) -> (usize, usize) {
        let answered = self.answers.values().filter(|a| a.is_answered).count();
        let reviewed = self.answers.values().filter(|a| a.is_reviewed).count();
        (answered, reviewed)
    }
}
