//! 窗口完整性监控
//!
//! 监听宿主环境送入的全屏/可见性变化信号：退出全屏或标签页被隐藏都
//! 计一次违规并生成上报事件（带最后停留的题目ID）。退出全屏额外拉起
//! 阻塞弹窗，只有重新进入全屏才能解除。监控是纯观察性的：不暂停
//! 倒计时，也不暂停心跳，处置策略在服务端。

use chrono::Utc;
use tracing::{debug, warn};

use crate::api::dto::{WindowEventRequest, WindowEventType};
use crate::engine::state::AttemptState;

/// 宿主环境的窗口信号
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowSignal {
    /// 进入全屏
    FullscreenEntered,
    /// 退出全屏
    FullscreenExited,
    /// 标签页被隐藏
    TabHidden,
    /// 标签页恢复可见
    TabVisible,
}

/// 处理一个窗口信号，违规时返回待上报的事件
///
/// 会话终结后信号一律忽略。
pub(crate) fn record_signal(
    state: &mut AttemptState,
    signal: WindowSignal,
) -> Option<WindowEventRequest> {
    if !state.attempt.is_in_progress() {
        return None;
    }

    match signal {
        WindowSignal::FullscreenExited => {
            state.violations += 1;
            state.modal_blocked = true;
            warn!("⚠️ 退出全屏，累计违规 {} 次", state.violations);
            Some(report(state, WindowEventType::FullscreenExit))
        }
        WindowSignal::TabHidden => {
            state.violations += 1;
            warn!("⚠️ 切换窗口/隐藏标签页，累计违规 {} 次", state.violations);
            Some(report(state, WindowEventType::TabHidden))
        }
        WindowSignal::FullscreenEntered => {
            state.modal_blocked = false;
            debug!("已回到全屏，解除弹窗");
            None
        }
        WindowSignal::TabVisible => None,
    }
}

fn report(state: &AttemptState, event_type: WindowEventType) -> WindowEventRequest {
    WindowEventRequest {
        event_type,
        last_question_id: state.current_question_id(),
        occurred_at: Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> AttemptState {
        let mut s = AttemptState::unloaded(1);
        s.attempt.remaining_time_ms = 60_000;
        s.loaded = true;
        s
    }

    #[test]
    fn test_fullscreen_exit_counts_and_blocks() {
        let mut s = state();

        let event = record_signal(&mut s, WindowSignal::FullscreenExited);
        assert_eq!(s.violations, 1);
        assert!(s.modal_blocked, "退出全屏应拉起阻塞弹窗");
        assert_eq!(
            event.map(|e| e.event_type),
            Some(WindowEventType::FullscreenExit)
        );
    }

    #[test]
    fn test_reenter_clears_modal_without_touching_clock() {
        let mut s = state();
        record_signal(&mut s, WindowSignal::FullscreenExited);

        let event = record_signal(&mut s, WindowSignal::FullscreenEntered);
        assert!(event.is_none(), "回到全屏不产生上报");
        assert!(!s.modal_blocked);
        assert_eq!(s.violations, 1, "回到全屏不减违规数");
        assert_eq!(s.attempt.remaining_time_ms, 60_000, "不影响剩余时间");
    }

    #[test]
    fn test_tab_hidden_counts_without_modal() {
        let mut s = state();

        let event = record_signal(&mut s, WindowSignal::TabHidden);
        assert_eq!(s.violations, 1);
        assert!(!s.modal_blocked, "切屏不拉弹窗");
        assert_eq!(event.map(|e| e.event_type), Some(WindowEventType::TabHidden));
    }

    #[test]
    fn test_signals_ignored_after_submission() {
        let mut s = state();
        s.attempt.begin_submission();
        s.attempt.confirm_submitted();

        assert!(record_signal(&mut s, WindowSignal::FullscreenExited).is_none());
        assert_eq!(s.violations, 0);
    }
}
