//! 试卷结构与题目内容模型

use serde::{Deserialize, Serialize};

use crate::models::answer::AnswerState;

/// 大题（试卷结构中的一个部分），加载完成后不可变
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    pub section_id: i64,
    pub name: String,
    pub questions: Vec<QuestionRef>,
}

/// 结构树中的轻量题目条目，区别于完整题目内容
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionRef {
    pub test_question_id: i64,
    pub question_order: u32,
}

/// 题型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    SingleChoice,
    MultipleChoice,
    Numeric,
}

/// 题目选项
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionOption {
    pub option_id: i64,
    pub option_text: String,
}

/// 完整题目内容，懒加载、入缓存后不可变
///
/// 考试过程中题目内容不会变化，所以同一题第二次访问必须直接命中缓存，
/// 不允许再发起网络请求。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionContent {
    pub test_question_id: i64,
    pub question_text: String,
    pub question_type: QuestionType,
    pub options: Vec<QuestionOption>,
    #[serde(default)]
    pub marks: f64,
    #[serde(default)]
    pub negative_marks: f64,
}

/// 渲染视图：不可变内容 + 当前作答状态的合并结果
#[derive(Debug, Clone)]
pub struct QuestionView {
    pub content: QuestionContent,
    pub answer: AnswerState,
}
