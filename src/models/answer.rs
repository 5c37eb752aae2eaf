//! 作答状态模型
//!
//! 每道题在整场考试中有且仅有一个 `AnswerState`，由加载器在拉取试卷结构时
//! 创建，之后只被修改、从不删除。界面渲染以这里的本地状态为准，与题目内容
//! 是否命中缓存无关。

use serde::{Deserialize, Serialize};

/// 单题作答状态
///
/// 四类作答操作（单选、多选、数值、清除）都遵循同一模式：
/// 先乐观更新本地状态，再由会话层发起不阻塞的持久化请求。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerState {
    /// 单选题选中的选项
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_option_id: Option<i64>,
    /// 多选题选中的选项集合
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub selected_option_ids: Vec<i64>,
    /// 数值/填空题的作答内容
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_answer: Option<String>,
    /// 是否已作答
    #[serde(default)]
    pub is_answered: bool,
    /// 是否标记待复查
    #[serde(default)]
    pub is_reviewed: bool,
    /// 是否访问过该题
    #[serde(default)]
    pub visited: bool,
}

impl AnswerState {
    /// 从试卷结构里的标记位创建初始状态（此时还没有具体选项数据）
    pub fn seeded(is_answered: bool, is_reviewed: bool, visited: bool) -> Self {
        Self {
            is_answered,
            is_reviewed,
            visited,
            ..Default::default()
        }
    }

    /// 单选：设置选中项并清掉其他作答模式的残留
    pub fn select_single(&mut self, option_id: i64) {
        self.selected_option_id = Some(option_id);
        self.selected_option_ids.clear();
        self.selected_answer = None;
        self.is_answered = true;
    }

    /// 多选：在集合中增删该选项，是否已作答取决于集合是否为空
    pub fn toggle_multi(&mut self, option_id: i64) {
        self.selected_option_id = None;
        self.selected_answer = None;
        match self.selected_option_ids.iter().position(|id| *id == option_id) {
            Some(pos) => {
                self.selected_option_ids.remove(pos);
            }
            None => self.selected_option_ids.push(option_id),
        }
        self.is_answered = !self.selected_option_ids.is_empty();
    }

    /// 数值作答：空白输入视为未作答
    pub fn set_numeric(&mut self, value: &str) {
        self.selected_option_id = None;
        self.selected_option_ids.clear();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            self.selected_answer = None;
            self.is_answered = false;
        } else {
            self.selected_answer = Some(trimmed.to_string());
            self.is_answered = true;
        }
    }

    /// 清除当前题的所有作答
    pub fn clear(&mut self) {
        self.selected_option_id = None;
        self.selected_option_ids.clear();
        self.selected_answer = None;
        self.is_answered = false;
    }

    /// 设置复查标记
    pub fn set_reviewed(&mut self, reviewed: bool) {
        self.is_reviewed = reviewed;
    }
}
