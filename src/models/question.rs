use serde::{Deserialize, Serialize};

/// 题型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    /// 选择题
    Choice,
    /// 判断题
    TrueFalse,
    /// 简答/填数题
    ShortAnswer,
    /// 填空题
    FillBlank,
    /// 拖拽题
    DragDrop,
}

impl QuestionType {
    pub fn as_str(self) -> &'static str {
        match self {
            QuestionType::Choice => "choice",
            QuestionType::TrueFalse => "true_false",
            QuestionType::ShortAnswer => "short_answer",
            QuestionType::FillBlank => "fill_blank",
            QuestionType::DragDrop => "drag_drop",
        }
    }
}

impl std::fmt::Display for QuestionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// 题型及其专属字段
///
/// 每种题型只带自己有意义的字段，互斥关系由枚举本身保证。
/// 选择题、拖拽题、填空题的内容在答案记录里。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum QuestionKind {
    Choice,
    TrueFalse {
        /// 旧式单答案判断题的结论；成组判断题为 `None`，结论在各个答案上
        #[serde(skip_serializing_if = "Option::is_none")]
        true_false: Option<bool>,
    },
    ShortAnswer {
        #[serde(skip_serializing_if = "Option::is_none")]
        short_answer: Option<String>,
    },
    FillBlank,
    DragDrop,
}

impl QuestionKind {
    pub fn question_type(&self) -> QuestionType {
        match self {
            QuestionKind::Choice => QuestionType::Choice,
            QuestionKind::TrueFalse { .. } => QuestionType::TrueFalse,
            QuestionKind::ShortAnswer { .. } => QuestionType::ShortAnswer,
            QuestionKind::FillBlank => QuestionType::FillBlank,
            QuestionKind::DragDrop => QuestionType::DragDrop,
        }
    }
}

/// 题目
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: u64,
    pub exam_id: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paragraph_id: Option<u64>,
    pub order_index: u32,
    /// 题干 HTML
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    #[serde(flatten)]
    pub kind: QuestionKind,
}

#[derive(Debug, Clone, PartialEq)]
pub struct QuestionDraft {
    pub exam_id: u64,
    pub paragraph_id: Option<u64>,
    pub order_index: u32,
    pub content: String,
    pub explanation: Option<String>,
    pub kind: QuestionKind,
}

impl Question {
    pub fn from_draft(id: u64, draft: QuestionDraft) -> Self {
        Self {
            id,
            exam_id: draft.exam_id,
            paragraph_id: draft.paragraph_id,
            order_index: draft.order_index,
            content: draft.content,
            explanation: draft.explanation,
            kind: draft.kind,
        }
    }

    pub fn question_type(&self) -> QuestionType {
        self.kind.question_type()
    }
}

/// 答案
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    pub id: u64,
    pub question_id: u64,
    /// 答案 HTML（保留图片、公式）
    pub content: String,
    pub is_correct: bool,
    pub order_index: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnswerDraft {
    pub question_id: u64,
    pub content: String,
    pub is_correct: bool,
    pub order_index: u32,
}

impl Answer {
    pub fn from_draft(id: u64, draft: AnswerDraft) -> Self {
        Self {
            id,
            question_id: draft.question_id,
            content: draft.content,
            is_correct: draft.is_correct,
            order_index: draft.order_index,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn question_serializes_type_tag_with_its_own_fields_only() {
        let question = Question {
            id: 1,
            exam_id: 2,
            paragraph_id: None,
            order_index: 1,
            content: "<p>x</p>".into(),
            explanation: None,
            kind: QuestionKind::ShortAnswer {
                short_answer: Some("12".into()),
            },
        };
        let json = serde_json::to_value(&question).unwrap();
        assert_eq!(json["type"], "short_answer");
        assert_eq!(json["short_answer"], "12");
        assert!(json.get("true_false").is_none());

        let back: Question = serde_json::from_value(json).unwrap();
        assert_eq!(back, question);
    }
}
