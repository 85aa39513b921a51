//! 流程层（Workflow）
//!
//! - `ExamCtx` - 日志上下文
//! - `HierarchyWalker` - 科目 → 课程 → 课时 → 试卷
//! - `QuestionFlow` - 一张试卷的段落 → 题目 → 答案

pub mod exam_ctx;
pub mod hierarchy_walker;
pub mod question_flow;

pub use exam_ctx::ExamCtx;
pub use hierarchy_walker::HierarchyWalker;
pub use question_flow::{ExamLayout, GroupState, QuestionFlow};
