//! 界面提示服务 - 业务能力层
//!
//! 只负责"告诉界面发生了什么"能力，不关心流程
//!
//! 加载指示与 toast 提示以显式依赖的方式注入引擎，
//! 不使用模块级全局回调。

use tracing::info;

/// 界面提示接口
///
/// 职责：
/// - 切换全局加载指示
/// - 弹出一条用户可见的提示
/// - 不持有引擎状态
pub trait Notifier: Send + Sync + 'static {
    /// 切换加载指示
    fn set_loading(&self, active: bool);

    /// 弹出用户可见提示
    fn toast(&self, message: &str);
}

/// 默认实现：输出到日志
///
/// 无界面环境（压测、联调）下用它兜底。
#[derive(Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn set_loading(&self, active: bool) {
        if active {
            info!("⏳ 加载中...");
        } else {
            info!("加载结束");
        }
    }

    fn toast(&self, message: &str) {
        info!("💬 {}", message);
    }
}
