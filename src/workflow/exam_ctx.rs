//! 试卷处理上下文
//!
//! 封装"我正在处理第几张试卷"这一信息，只用于日志前缀

use std::fmt::Display;

/// 试卷处理上下文
#[derive(Debug, Clone, Copy)]
pub struct ExamCtx {
    /// 试卷 id
    pub exam_id: u64,

    /// 在本次抓取中的序号（从 1 开始）
    pub index: usize,

    /// 本次抓取的试卷总数
    pub total: usize,
}

impl ExamCtx {
    pub fn new(exam_id: u64, index: usize, total: usize) -> Self {
        Self {
            exam_id,
            index,
            total,
        }
    }

    /// 单独抓取一张试卷
    pub fn single(exam_id: u64) -> Self {
        Self::new(exam_id, 1, 1)
    }
}

impl Display for ExamCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[试卷 {}/{} #{}]", self.index, self.total, self.exam_id)
    }
}
