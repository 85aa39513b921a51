//! 题目处理流程 - 流程层
//!
//! 核心职责：定义"一张试卷的题目"的完整处理流程
//!
//! 流程顺序：
//! 1. 抓取试卷页，抽取题目区（抽完即丢掉文档）
//! 2. 按策略处理旧题目（保留 / 删除）
//! 3. 按页面布局走状态机入库：
//!    - 普通试卷：成组判断题状态机 `GroupState`
//!    - TSA 试卷：阅读段落状态机 `ParagraphState`

use tracing::{debug, info};

use crate::config::{Config, QuestionPolicy};
use crate::error::AppResult;
use crate::infrastructure::{Document, PageFetcher, Transport};
use crate::models::entities::title_exam_key;
use crate::models::{
    AnswerDraft, Exam, Paragraph, ParagraphDraft, QuestionDraft, QuestionKind, QuestionsData,
};
use crate::services::extractor::{extract_exam_blocks, ExamBlock, ScrapedQuestion};
use crate::services::selectors::GROUP_SIZE;
use crate::services::upsert;
use crate::store::Store;
use crate::utils::logging::truncate_text;
use crate::workflow::exam_ctx::ExamCtx;

/// 试卷页的布局
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExamLayout {
    /// 独立题目 + 成组判断题
    Plain,
    /// 阅读段落 + 挂在段落下的题目
    ParagraphLinked,
}

/// 成组判断题状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupState {
    /// 题目元素各自成题
    Standalone,
    /// 题目元素作为当前组的答案
    InGroup {
        question_id: u64,
        answers_consumed: usize,
    },
}

impl GroupState {
    /// 组内吸收一个子题后的状态；吸收满 `GROUP_SIZE` 个后回到独立模式
    pub fn after_absorbing(self) -> Self {
        match self {
            GroupState::InGroup {
                question_id,
                answers_consumed,
            } if answers_consumed + 1 < GROUP_SIZE => GroupState::InGroup {
                question_id,
                answers_consumed: answers_consumed + 1,
            },
            _ => GroupState::Standalone,
        }
    }
}

/// 已读到标题、还没遇到正文的段落
#[derive(Debug)]
struct PendingTitle {
    title: String,
    key: String,
}

/// 阅读段落状态
#[derive(Debug, Default)]
struct ParagraphState {
    pending: Option<PendingTitle>,
    /// 之后的题目挂在这个段落下
    current: Option<u64>,
}

/// 题目处理流程
///
/// - 不持有网络资源（抓取器由调用方传入）
/// - 题目和答案每次都新建，不做对账
/// - 段落按 标题+试卷 id 对账
pub struct QuestionFlow<'a, S> {
    store: &'a S,
    policy: QuestionPolicy,
}

impl<'a, S: Store> QuestionFlow<'a, S> {
    pub fn new(store: &'a S, config: &Config) -> Self {
        Self {
            store,
            policy: config.question_policy,
        }
    }

    pub fn with_policy(store: &'a S, policy: QuestionPolicy) -> Self {
        Self { store, policy }
    }

    /// 抓取并入库一张试卷的题目
    pub async fn run<T: Transport>(
        &self,
        fetcher: &PageFetcher<T>,
        exam: &Exam,
        layout: ExamLayout,
        ctx: &ExamCtx,
        cookie: Option<&str>,
    ) -> AppResult<QuestionsData> {
        info!("{} 📝 抓取试卷: {}", ctx, exam.title);

        let html = fetcher.fetch(&exam.url, cookie).await?;
        let blocks = extract_exam_blocks(&Document::parse(&html));
        debug!("{} 题目区共 {} 个元素", ctx, blocks.len());

        self.persist(exam.id, layout, blocks, ctx)
    }

    /// 入库已经抽取好的题目区
    pub fn persist(
        &self,
        exam_id: u64,
        layout: ExamLayout,
        blocks: Vec<ExamBlock>,
        ctx: &ExamCtx,
    ) -> AppResult<QuestionsData> {
        if self.policy == QuestionPolicy::Replace {
            let removed = self.store.delete_questions_for_exam(exam_id)?;
            if removed > 0 {
                info!("{} 🗑️ 删除旧题目 {} 道", ctx, removed);
            }
        }

        let data = match layout {
            ExamLayout::Plain => self.persist_plain(exam_id, blocks, ctx)?,
            ExamLayout::ParagraphLinked => self.persist_linked(exam_id, blocks, ctx)?,
        };

        info!(
            "{} ✓ 完成: {} 个段落, {} 道题目, {} 个答案",
            ctx,
            data.paragraphs.len(),
            data.questions.len(),
            data.answers.len()
        );
        Ok(data)
    }

    fn persist_plain(
        &self,
        exam_id: u64,
        blocks: Vec<ExamBlock>,
        ctx: &ExamCtx,
    ) -> AppResult<QuestionsData> {
        let mut data = QuestionsData::default();
        let mut state = GroupState::Standalone;

        for block in blocks {
            match block {
                ExamBlock::GroupMarker(content) => {
                    if let GroupState::InGroup {
                        answers_consumed, ..
                    } = state
                    {
                        debug!("{} 新的成组判断题，上一组只有 {} 个子题", ctx, answers_consumed);
                    }
                    let question = self.store.create_question(QuestionDraft {
                        exam_id,
                        paragraph_id: None,
                        order_index: next_order(&data),
                        content,
                        explanation: None,
                        kind: QuestionKind::TrueFalse { true_false: None },
                    })?;
                    state = GroupState::InGroup {
                        question_id: question.id,
                        answers_consumed: 0,
                    };
                    data.questions.push(question);
                }
                ExamBlock::Question(scraped) => match state {
                    GroupState::InGroup {
                        question_id,
                        answers_consumed,
                    } => {
                        let is_correct = scraped.marked_correct();
                        let answer = self.store.create_answer(AnswerDraft {
                            question_id,
                            content: scraped.content,
                            is_correct,
                            order_index: (answers_consumed + 1) as u32,
                        })?;
                        data.answers.push(answer);
                        state = state.after_absorbing();
                    }
                    GroupState::Standalone => {
                        self.persist_question(exam_id, None, scraped, &mut data, ctx)?;
                    }
                },
                ExamBlock::EmptyItem => match state {
                    GroupState::InGroup {
                        answers_consumed, ..
                    } => {
                        debug!("{} 成组判断题第 {} 个子题没有题干，占位跳过", ctx, answers_consumed + 1);
                        state = state.after_absorbing();
                    }
                    GroupState::Standalone => debug!("{} 跳过没有题干的题目", ctx),
                },
                ExamBlock::ParagraphTitle(_) | ExamBlock::ParagraphBody(_) => {
                    debug!("{} 普通试卷忽略段落元素", ctx);
                }
            }
        }
        Ok(data)
    }

    fn persist_linked(
        &self,
        exam_id: u64,
        blocks: Vec<ExamBlock>,
        ctx: &ExamCtx,
    ) -> AppResult<QuestionsData> {
        let mut data = QuestionsData::default();
        let mut state = ParagraphState::default();

        for block in blocks {
            match block {
                ExamBlock::ParagraphTitle(title) => {
                    if title.is_empty() {
                        debug!("{} 跳过空的段落标题", ctx);
                        continue;
                    }
                    state = ParagraphState {
                        pending: Some(PendingTitle {
                            key: title_exam_key(&title, exam_id),
                            title,
                        }),
                        current: None,
                    };
                }
                ExamBlock::ParagraphBody(content) => {
                    if content.is_empty() {
                        debug!("{} 跳过空的段落正文", ctx);
                        continue;
                    }
                    let Some(pending) = state.pending.take() else {
                        debug!("{} 段落正文前没有标题，跳过", ctx);
                        continue;
                    };
                    let paragraph = upsert::<Paragraph, _>(
                        self.store,
                        ParagraphDraft {
                            title: pending.title,
                            content,
                            exam_id,
                            title_exam_key: pending.key,
                        },
                    )?
                    .record;
                    debug!("{} 段落 #{}: {}", ctx, paragraph.id, paragraph.title);
                    state.current = Some(paragraph.id);
                    data.paragraphs.push(paragraph);
                }
                ExamBlock::Question(scraped) => {
                    self.persist_question(exam_id, state.current, scraped, &mut data, ctx)?;
                }
                ExamBlock::GroupMarker(_) => {
                    debug!("{} 阅读试卷忽略成组判断题标记", ctx);
                }
                ExamBlock::EmptyItem => debug!("{} 跳过没有题干的题目", ctx),
            }
        }
        Ok(data)
    }

    fn persist_question(
        &self,
        exam_id: u64,
        paragraph_id: Option<u64>,
        scraped: ScrapedQuestion,
        data: &mut QuestionsData,
        ctx: &ExamCtx,
    ) -> AppResult<()> {
        let ScrapedQuestion {
            content,
            kind,
            explanation,
            answers,
            ..
        } = scraped;

        let question = self.store.create_question(QuestionDraft {
            exam_id,
            paragraph_id,
            order_index: next_order(data),
            content,
            explanation,
            kind,
        })?;

        for (j, answer) in answers.into_iter().enumerate() {
            let answer = self.store.create_answer(AnswerDraft {
                question_id: question.id,
                content: answer.content,
                is_correct: answer.is_correct,
                order_index: (j + 1) as u32,
            })?;
            data.answers.push(answer);
        }

        debug!(
            "{} 题目 #{} ({}): {}",
            ctx,
            question.order_index,
            question.question_type(),
            truncate_text(&question.content, 40)
        );
        data.questions.push(question);
        Ok(())
    }
}

fn next_order(data: &QuestionsData) -> u32 {
    data.questions.len() as u32 + 1
}
