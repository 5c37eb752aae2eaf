//! 切题控制
//!
//! 只负责光标目标的解析与前后步进：跨大题边界时衔接到相邻大题，
//! 但不越过全卷第一题/最后一题。网络侧的切题审计与内容加载由会话层
//! 并发发起，这里是纯结构运算。

use crate::engine::state::Cursor;
use crate::models::Section;

/// 解析目标下标，越界返回 `None`（调用方按无操作处理）
pub(crate) fn resolve(sections: &[Section], section_idx: usize, question_idx: usize) -> Option<i64> {
    sections
        .get(section_idx)?
        .questions
        .get(question_idx)
        .map(|q| q.test_question_id)
}

/// 下一题；大题末尾接下一大题开头，全卷最后一题返回 `None`
pub(crate) fn step_next(sections: &[Section], cursor: Cursor) -> Option<Cursor> {
    let section = sections.get(cursor.section_idx)?;

    if cursor.question_idx + 1 < section.questions.len() {
        return Some(Cursor {
            section_idx: cursor.section_idx,
            question_idx: cursor.question_idx + 1,
        });
    }

    // 跳到下一个非空大题的第一题
    let mut next_section = cursor.section_idx + 1;
    while let Some(s) = sections.get(next_section) {
        if !s.questions.is_empty() {
            return Some(Cursor {
                section_idx: next_section,
                question_idx: 0,
            });
        }
        next_section += 1;
    }
    None
}

/// 上一题；大题开头接上一大题末尾，全卷第一题返回 `None`
pub(crate) fn step_prev(sections: &[Section], cursor: Cursor) -> Option<Cursor> {
    if cursor.question_idx > 0 {
        return Some(Cursor {
            section_idx: cursor.section_idx,
            question_idx: cursor.question_idx - 1,
        });
    }

    let mut prev_section = cursor.section_idx;
    while prev_section > 0 {
        prev_section -= 1;
        if let Some(s) = sections.get(prev_section) {
            if !s.questions.is_empty() {
                return Some(Cursor {
                    section_idx: prev_section,
                    question_idx: s.questions.len() - 1,
                });
            }
        }
    }
    None
}
