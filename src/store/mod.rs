//! 持久化契约（Persistence）
//!
//! 抓取核心只通过这里的 trait 读写数据：
//! - `Repository<R>` - 层级记录按自然键查找、新建、部分更新
//! - `QuestionRepository` - 题目和答案只新建（以及按试卷整体删除）
//!
//! 实现必须保证同一进程内"写后可读"。

pub mod memory;

use crate::error::StoreResult;
use crate::models::{
    Answer, AnswerDraft, Course, Exam, Lesson, Paragraph, Question, QuestionDraft, Record, Subject,
};

pub use memory::MemoryStore;

/// 单一记录种类的持久化能力
pub trait Repository<R: Record> {
    fn find_by_natural_key(&self, key: &str) -> StoreResult<Option<R>>;

    fn find_by_id(&self, id: u64) -> StoreResult<Option<R>>;

    fn create(&self, draft: R::Draft) -> StoreResult<R>;

    /// 部分更新，返回更新后的记录
    fn update(&self, id: u64, patch: R::Draft) -> StoreResult<R>;

    fn count(&self) -> StoreResult<usize>;
}

/// 题目和答案的持久化能力
pub trait QuestionRepository {
    fn create_question(&self, draft: QuestionDraft) -> StoreResult<Question>;

    fn create_answer(&self, draft: AnswerDraft) -> StoreResult<Answer>;

    /// 删除试卷下所有题目及其答案，返回删除的题目数
    fn delete_questions_for_exam(&self, exam_id: u64) -> StoreResult<usize>;

    fn question_count(&self) -> StoreResult<usize>;

    fn answer_count(&self) -> StoreResult<usize>;
}

/// 完整的存储：所有记录种类
pub trait Store:
    Repository<Subject>
    + Repository<Course>
    + Repository<Lesson>
    + Repository<Exam>
    + Repository<Paragraph>
    + QuestionRepository
{
}

impl<T> Store for T where
    T: Repository<Subject>
        + Repository<Course>
        + Repository<Lesson>
        + Repository<Exam>
        + Repository<Paragraph>
        + QuestionRepository
{
}
