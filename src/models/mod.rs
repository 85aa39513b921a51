pub mod entities;
pub mod question;
pub mod report;

pub use entities::{
    Course, CourseDraft, Exam, ExamDraft, Lesson, LessonDraft, Paragraph, ParagraphDraft, Record,
    Subject, SubjectDraft,
};
pub use question::{Answer, AnswerDraft, Question, QuestionDraft, QuestionKind, QuestionType};
pub use report::{
    CrawlCounts, CrawlResult, ExamFailure, FullCrawlData, HierarchyData, Metadata, QuestionsData,
    SubjectsData,
};
