//! 倒计时控制器
//!
//! 状态机 `idle → running → expired`：结构加载给出正的剩余时间后才进入
//! `running`，避免慢加载时误报"时间到"。每个节拍固定扣减一个步长，
//! 在剩余时间首次归零的那个节拍上给出一次（且仅一次）到时结果，
//! 之后不再扣减。节拍本身不受同步校正和界面重绘影响。

use crate::engine::state::AttemptState;

/// 倒计时状态机
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerPhase {
    /// 等待结构加载
    Idle,
    /// 倒计时进行中
    Running,
    /// 已归零（单向闩锁）
    Expired,
}

/// 单个节拍的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// 正常扣减，携带剩余毫秒
    Ticked(u64),
    /// 本节拍首次归零，调用方负责触发自动交卷
    Expired,
    /// 倒计时不在运行（未启动/已到时/会话已终结）
    Stopped,
}

/// 启动倒计时，只接受正的剩余时间
pub(crate) fn start(state: &mut AttemptState) -> bool {
    if state.timer == TimerPhase::Idle && state.attempt.remaining_time_ms > 0 {
        state.timer = TimerPhase::Running;
        true
    } else {
        false
    }
}

/// 结构给出的剩余时间已经为零，直接进入到时态
pub(crate) fn expire_immediately(state: &mut AttemptState) {
    state.attempt.remaining_time_ms = 0;
    state.timer = TimerPhase::Expired;
}

/// 执行一个倒计时节拍
///
/// 会话终结后节拍不再改动任何状态；到时闩锁保证 `Expired`
/// 结果在整场考试中至多出现一次。
pub(crate) fn tick(state: &mut AttemptState, tick_ms: u64) -> TickOutcome {
    if !state.attempt.is_in_progress() {
        return TickOutcome::Stopped;
    }

    match state.timer {
        TimerPhase::Running => {
            let left = state.attempt.remaining_time_ms.saturating_sub(tick_ms);
            state.attempt.remaining_time_ms = left;

            if left == 0 {
                state.timer = TimerPhase::Expired;
                TickOutcome::Expired
            } else {
                TickOutcome::Ticked(left)
            }
        }
        TimerPhase::Idle | TimerPhase::Expired => TickOutcome::Stopped,
    }
}
