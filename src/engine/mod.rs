//! 考试会话引擎 - 引擎层
//!
//! ## 职责
//!
//! 驱动一场限时考试从结构加载到交卷的全过程：
//!
//! 1. **加载器**：一次性引导，拉结构、建作答状态、起倒计时
//! 2. **题目缓存**：重访零网络请求
//! 3. **作答存储**：乐观更新 + 后台持久化
//! 4. **倒计时**：固定节拍扣减，到时一次性自动交卷
//! 5. **心跳同步**：周期性向服务端对时，服务端时钟永远赢
//! 6. **完整性监控**：全屏/可见性违规计数与上报
//! 7. **切题控制**：跨大题衔接、越界无操作
//! 8. **交卷控制**：比较交换闸门保证恰好一次
//!
//! 纯状态运算放在各子模块的自由函数里，网络协调统一在
//! [`session::AttemptSession`]。

pub mod cache;
pub mod integrity;
pub mod navigation;
pub mod session;
pub mod state;
pub mod sync;
pub mod timer;

pub use integrity::WindowSignal;
pub use session::AttemptSession;
pub use state::{AttemptState, Cursor, SharedState};
pub use timer::{TickOutcome, TimerPhase};
