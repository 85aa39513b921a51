//! 题型判定 - 业务能力层
//!
//! ## 职责
//! - 只看题目元素的 DOM 结构判定题型
//! - 每条规则都是独立的纯函数，可以单独测试
//! - 按固定顺序匹配，第一条命中的规则决定题型；都不命中时是选择题

use crate::infrastructure::{ChildNode, Element};
use crate::models::QuestionType;
use crate::services::normalizer::collapse_whitespace;
use crate::services::selectors::{BLANK_RUN, DRAG_DROP_MARKER, NO_OPTION, QUESTION_CONTENT};

/// 判定题型
pub fn classify(question: Element<'_>) -> QuestionType {
    let content = content_element(question);

    if has_table(question) {
        QuestionType::TrueFalse
    } else if has_image_span_run(content) || mentions_drag_drop(content) {
        QuestionType::DragDrop
    } else if has_blank_run(content) {
        QuestionType::FillBlank
    } else if has_no_option_marker(question) {
        QuestionType::ShortAnswer
    } else {
        QuestionType::Choice
    }
}

/// 题干元素；找不到题干时退回整个题目元素
pub fn content_element(question: Element<'_>) -> Element<'_> {
    question.first(QUESTION_CONTENT).unwrap_or(question)
}

/// 有表格的是判断题（每行一个判断）
pub fn has_table(question: Element<'_>) -> bool {
    question.contains("table")
}

/// 任意一个 `<p>` 里出现连续两个以上带图片的 `<span>`
pub fn has_image_span_run(content: Element<'_>) -> bool {
    let paragraphs = if content.name() == "p" {
        vec![content]
    } else {
        content.select("p")
    };
    paragraphs.into_iter().any(paragraph_has_image_span_run)
}

/// 单个段落的直接子节点里是否有连续的图片 span
///
/// 非空文本或其他标签会打断连续；纯空白文本不打断。
pub fn paragraph_has_image_span_run(paragraph: Element<'_>) -> bool {
    let mut run = 0usize;
    for node in paragraph.child_nodes() {
        match node {
            ChildNode::Element(el) if el.name() == "span" && el.contains("img") => {
                run += 1;
                if run >= 2 {
                    return true;
                }
            }
            ChildNode::Element(_) => run = 0,
            ChildNode::Text(text) if !text.trim().is_empty() => run = 0,
            ChildNode::Text(_) | ChildNode::Other => {}
        }
    }
    false
}

/// 题干文字里写明"kéo thả"
pub fn mentions_drag_drop(content: Element<'_>) -> bool {
    collapse_whitespace(&content.text())
        .to_lowercase()
        .contains(DRAG_DROP_MARKER)
}

/// 题干文字里有连续下划线
pub fn has_blank_run(content: Element<'_>) -> bool {
    content.text().contains(BLANK_RUN)
}

/// 答案区标明没有选项
pub fn has_no_option_marker(question: Element<'_>) -> bool {
    question.contains(NO_OPTION)
}
