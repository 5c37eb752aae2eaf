pub mod fullscreen;
pub mod notifier;
pub mod resume;

pub use fullscreen::{FullscreenPort, LogFullscreen};
pub use notifier::{LogNotifier, Notifier};
pub use resume::{FileResumeStore, MemoryResumeStore, ResumeHint, ResumeStore};
