//! 时钟同步
//!
//! 心跳把本地 `{剩余毫秒, 当前大题, 当前题目}` 快照报给服务端，
//! 成功时用服务端的权威剩余时间覆写本地倒计时——服务端时钟永远赢过
//! 客户端漂移。单次心跳失败只记日志，下一次心跳无条件重试（不退避、
//! 不熔断）：正确性只依赖最终收敛，不依赖任何一次心跳成功。

use tracing::{debug, warn};

use crate::api::dto::{SyncResponse, SyncSnapshot};
use crate::engine::state::AttemptState;
use crate::engine::timer::TimerPhase;
use crate::models::remaining_min_to_ms;

/// 组装本次心跳快照；会话不在进行中或结构未加载时返回 `None`（心跳应停止）
pub(crate) fn build_snapshot(state: &AttemptState) -> Option<SyncSnapshot> {
    if !state.loaded || !state.attempt.is_in_progress() {
        return None;
    }

    Some(SyncSnapshot {
        time_remaining_ms: state.attempt.remaining_time_ms,
        current_section_id: state.current_section_id()?,
        current_question_id: state.current_question_id()?,
    })
}

/// 应用服务端校正
///
/// 只在倒计时运行中且会话未终结时生效；到时闩锁已合上的倒计时
/// 不允许被校正"复活"。偏差超过告警阈值时输出 warn 日志，但仍然
/// 应用服务端值（始终信任服务端）。
pub(crate) fn apply_correction(state: &mut AttemptState, resp: &SyncResponse, max_drift_warn_ms: u64) {
    if !state.attempt.is_in_progress() || state.timer != TimerPhase::Running {
        return;
    }

    let server_ms = remaining_min_to_ms(resp.remaining_time_min);
    let local_ms = state.attempt.remaining_time_ms;
    let drift = server_ms.abs_diff(local_ms);

    if drift > max_drift_warn_ms {
        warn!(
            "⚠️ 时钟偏差较大: 本地 {}ms, 服务端 {}ms (偏差 {}ms)",
            local_ms, server_ms, drift
        );
    } else {
        debug!("同步校正: {}ms -> {}ms", local_ms, server_ms);
    }

    state.attempt.remaining_time_ms = server_ms;
}
