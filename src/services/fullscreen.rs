//! 全屏控制服务 - 业务能力层
//!
//! 只负责"请求进入全屏"能力。全屏/可见性的变化信号由宿主环境
//! 通过 `engine::WindowSignal` 送入引擎，这里只管出方向的请求。

use tracing::info;

/// 全屏入口接口
pub trait FullscreenPort: Send + Sync + 'static {
    /// 请求进入全屏（尽力而为，失败无需反馈）
    fn request_fullscreen(&self);
}

/// 默认实现：输出到日志
#[derive(Debug, Default)]
pub struct LogFullscreen;

impl FullscreenPort for LogFullscreen {
    fn request_fullscreen(&self) {
        info!("🖥️ 请求进入全屏");
    }
}
