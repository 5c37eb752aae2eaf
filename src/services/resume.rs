//! 断点恢复提示服务 - 业务能力层
//!
//! 只负责"记住考生上次停在哪"能力，不关心流程
//!
//! 提示是尽力而为的：刷新后重新进场时用它把光标放回原位，
//! 但试卷结构、剩余时间一律以服务端 `getAttemptStructure` 为准，
//! 这里从不充当数据源。

use std::fs;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{AppError, AppResult, StorageError};

/// 恢复提示：会话ID + 上次停留的光标位置
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumeHint {
    pub attempt_id: i64,
    pub section_idx: usize,
    pub question_idx: usize,
}

/// 恢复提示存储接口
///
/// 职责：
/// - 保存/读取/清除一条恢复提示
/// - 不校验提示是否仍然有效（由加载器决定用不用）
pub trait ResumeStore: Send + Sync + 'static {
    fn save(&self, hint: &ResumeHint) -> AppResult<()>;

    fn load(&self) -> AppResult<Option<ResumeHint>>;

    fn clear(&self) -> AppResult<()>;
}

/// 文件实现：单个 JSON 文件
pub struct FileResumeStore {
    path: String,
}

impl FileResumeStore {
    /// 使用自定义文件路径创建
    pub fn with_path(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }
}

impl ResumeStore for FileResumeStore {
    fn save(&self, hint: &ResumeHint) -> AppResult<()> {
        let json = serde_json::to_string(hint)?;

        fs::write(&self.path, json).map_err(|e| {
            AppError::Storage(StorageError::WriteFailed {
                path: self.path.clone(),
                source: Box::new(e),
            })
        })?;

        debug!("已写入恢复提示: {:?}", hint);
        Ok(())
    }

    fn load(&self) -> AppResult<Option<ResumeHint>> {
        if !std::path::Path::new(&self.path).exists() {
            return Ok(None);
        }

        let raw = fs::read_to_string(&self.path).map_err(|e| {
            AppError::Storage(StorageError::ReadFailed {
                path: self.path.clone(),
                source: Box::new(e),
            })
        })?;

        // 文件损坏按没有提示处理，不让它挡住进场
        match serde_json::from_str(&raw) {
            Ok(hint) => Ok(Some(hint)),
            Err(e) => {
                debug!("恢复提示解析失败，忽略: {}", e);
                Ok(None)
            }
        }
    }

    fn clear(&self) -> AppResult<()> {
        if !std::path::Path::new(&self.path).exists() {
            return Ok(());
        }

        fs::remove_file(&self.path).map_err(|e| {
            AppError::Storage(StorageError::DeleteFailed {
                path: self.path.clone(),
                source: Box::new(e),
            })
        })
    }
}

/// 内存实现：测试与无盘环境用
#[derive(Default)]
pub struct MemoryResumeStore {
    cell: Mutex<Option<ResumeHint>>,
}

impl MemoryResumeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 预置一条提示（模拟上一次会话留下的文件）
    pub fn with_hint(hint: ResumeHint) -> Self {
        Self {
            cell: Mutex::new(Some(hint)),
        }
    }
}

impl ResumeStore for MemoryResumeStore {
    fn save(&self, hint: &ResumeHint) -> AppResult<()> {
        *self.cell.lock().unwrap_or_else(|e| e.into_inner()) = Some(*hint);
        Ok(())
    }

    fn load(&self) -> AppResult<Option<ResumeHint>> {
        Ok(*self.cell.lock().unwrap_or_else(|e| e.into_inner()))
    }

    fn clear(&self) -> AppResult<()> {
        *self.cell.lock().unwrap_or_else(|e| e.into_inner()) = None;
        Ok(())
    }
}
