//! 层级记录：科目 → 课程 → 课时 → 试卷 → 段落
//!
//! 这些记录都有自然键（URL，或 段落标题+试卷 id），重复抓取时按自然键更新而不是新增。

use serde::{Deserialize, Serialize};

/// 可以按自然键对账的记录
///
/// `Draft` 同时用作新建时的属性和更新时的部分属性：
/// 取值为 `None` 的可选字段在更新时保持原值。
pub trait Record: Clone {
    type Draft: Clone;

    /// 记录种类名（用于日志和错误信息）
    const KIND: &'static str;

    fn id(&self) -> u64;

    fn natural_key(&self) -> &str;

    fn draft_key(draft: &Self::Draft) -> &str;

    fn from_draft(id: u64, draft: Self::Draft) -> Self;

    /// 部分更新
    fn apply(&mut self, draft: Self::Draft);
}

/// 科目
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subject {
    pub id: u64,
    pub title: String,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubjectDraft {
    pub title: String,
    pub url: String,
    pub image: Option<String>,
}

impl Record for Subject {
    type Draft = SubjectDraft;
    const KIND: &'static str = "subject";

    fn id(&self) -> u64 {
        self.id
    }

    fn natural_key(&self) -> &str {
        &self.url
    }

    fn draft_key(draft: &SubjectDraft) -> &str {
        &draft.url
    }

    fn from_draft(id: u64, draft: SubjectDraft) -> Self {
        Self {
            id,
            title: draft.title,
            url: draft.url,
            image: draft.image,
        }
    }

    fn apply(&mut self, draft: SubjectDraft) {
        self.title = draft.title;
        self.url = draft.url;
        if draft.image.is_some() {
            self.image = draft.image;
        }
    }
}

/// 课程（页面上的一个章节）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    pub id: u64,
    pub title: String,
    pub url: String,
    pub is_exam: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject_id: Option<u64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CourseDraft {
    pub title: String,
    pub url: String,
    pub is_exam: Option<bool>,
    pub subject_id: Option<u64>,
}

impl From<&Course> for CourseDraft {
    fn from(course: &Course) -> Self {
        Self {
            title: course.title.clone(),
            url: course.url.clone(),
            is_exam: Some(course.is_exam),
            subject_id: course.subject_id,
        }
    }
}

impl Record for Course {
    type Draft = CourseDraft;
    const KIND: &'static str = "course";

    fn id(&self) -> u64 {
        self.id
    }

    fn natural_key(&self) -> &str {
        &self.url
    }

    fn draft_key(draft: &CourseDraft) -> &str {
        &draft.url
    }

    fn from_draft(id: u64, draft: CourseDraft) -> Self {
        Self {
            id,
            title: draft.title,
            url: draft.url,
            is_exam: draft.is_exam.unwrap_or(false),
            subject_id: draft.subject_id,
        }
    }

    fn apply(&mut self, draft: CourseDraft) {
        self.title = draft.title;
        self.url = draft.url;
        if let Some(is_exam) = draft.is_exam {
            self.is_exam = is_exam;
        }
        if draft.subject_id.is_some() {
            self.subject_id = draft.subject_id;
        }
    }
}

/// 课时
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lesson {
    pub id: u64,
    pub title: String,
    pub url: String,
    pub order_index: u32,
    pub course_id: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LessonDraft {
    pub title: String,
    pub url: String,
    pub order_index: u32,
    pub course_id: u64,
}

impl Record for Lesson {
    type Draft = LessonDraft;
    const KIND: &'static str = "lesson";

    fn id(&self) -> u64 {
        self.id
    }

    fn natural_key(&self) -> &str {
        &self.url
    }

    fn draft_key(draft: &LessonDraft) -> &str {
        &draft.url
    }

    fn from_draft(id: u64, draft: LessonDraft) -> Self {
        Self {
            id,
            title: draft.title,
            url: draft.url,
            order_index: draft.order_index,
            course_id: draft.course_id,
        }
    }

    fn apply(&mut self, draft: LessonDraft) {
        self.title = draft.title;
        self.url = draft.url;
        self.order_index = draft.order_index;
        self.course_id = draft.course_id;
    }
}

/// 试卷
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exam {
    pub id: u64,
    pub title: String,
    pub url: String,
    pub order_index: u32,
    pub lesson_id: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub course_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question_quantity: Option<u32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExamDraft {
    pub title: String,
    pub url: String,
    pub order_index: u32,
    pub lesson_id: u64,
    pub course_id: Option<u64>,
    pub question_quantity: Option<u32>,
}

impl Record for Exam {
    type Draft = ExamDraft;
    const KIND: &'static str = "exam";

    fn id(&self) -> u64 {
        self.id
    }

    fn natural_key(&self) -> &str {
        &self.url
    }

    fn draft_key(draft: &ExamDraft) -> &str {
        &draft.url
    }

    fn from_draft(id: u64, draft: ExamDraft) -> Self {
        Self {
            id,
            title: draft.title,
            url: draft.url,
            order_index: draft.order_index,
            lesson_id: draft.lesson_id,
            course_id: draft.course_id,
            question_quantity: draft.question_quantity,
        }
    }

    fn apply(&mut self, draft: ExamDraft) {
        self.title = draft.title;
        self.url = draft.url;
        self.order_index = draft.order_index;
        self.lesson_id = draft.lesson_id;
        if draft.course_id.is_some() {
            self.course_id = draft.course_id;
        }
        if draft.question_quantity.is_some() {
            self.question_quantity = draft.question_quantity;
        }
    }
}

/// 阅读段落（没有 URL，用 标题+试卷 id 作为自然键）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paragraph {
    pub id: u64,
    pub title: String,
    pub content: String,
    pub exam_id: u64,
    pub title_exam_key: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParagraphDraft {
    pub title: String,
    pub content: String,
    pub exam_id: u64,
    pub title_exam_key: String,
}

impl ParagraphDraft {
    pub fn new(title: impl Into<String>, content: impl Into<String>, exam_id: u64) -> Self {
        let title = title.into();
        Self {
            title_exam_key: title_exam_key(&title, exam_id),
            title,
            content: content.into(),
            exam_id,
        }
    }
}

/// 段落的自然键：可见标题直接拼上所属试卷 id
pub fn title_exam_key(title: &str, exam_id: u64) -> String {
    format!("{}{}", title, exam_id)
}

impl Record for Paragraph {
    type Draft = ParagraphDraft;
    const KIND: &'static str = "paragraph";

    fn id(&self) -> u64 {
        self.id
    }

    fn natural_key(&self) -> &str {
        &self.title_exam_key
    }

    fn draft_key(draft: &ParagraphDraft) -> &str {
        &draft.title_exam_key
    }

    fn from_draft(id: u64, draft: ParagraphDraft) -> Self {
        Self {
            id,
            title: draft.title,
            content: draft.content,
            exam_id: draft.exam_id,
            title_exam_key: draft.title_exam_key,
        }
    }

    fn apply(&mut self, draft: ParagraphDraft) {
        self.title = draft.title;
        self.content = draft.content;
        self.exam_id = draft.exam_id;
        self.title_exam_key = draft.title_exam_key;
    }
}
