//! 题目内容缓存
//!
//! 命中时把缓存的不可变内容与该题当前作答状态合并后同步返回，
//! 不发任何网络请求——重访同一题绝不允许二次拉取。未命中时由会话层
//! 拉取后调用 `store` 入缓存，并用服务端报文初始化该题作答状态。

use crate::api::dto::QuestionPayload;
use crate::engine::state::AttemptState;
use crate::models::{AnswerState, QuestionView};

/// 缓存命中查询：命中则标记已访问并返回合并视图
pub(crate) fn lookup(state: &mut AttemptState, question_id: i64) -> Option<QuestionView> {
    let content = state.cache.get(&question_id)?.clone();

    let answer = match state.answers.get_mut(&question_id) {
        Some(ans) => {
            ans.visited = true;
            ans.clone()
        }
        None => AnswerState::default(),
    };

    Some(QuestionView { content, answer })
}

/// 首次拉取入缓存
///
/// 服务端报文同时带回该题的作答状态，首访时以它初始化本地状态；
/// 之后的访问都走缓存，服务端值不会再覆盖本地编辑。
pub(crate) fn store(state: &mut AttemptState, payload: QuestionPayload) -> QuestionView {
    let (content, server_answer) = payload.into_parts();
    let question_id = content.test_question_id;

    state.cache.insert(question_id, content.clone());
    state.answers.insert(question_id, server_answer.clone());

    QuestionView {
        content,
        answer: server_answer,
    }
}
