//! 页面抽取 - 业务能力层
//!
//! ## 职责
//! - 把解析后的页面转换成自有数据（草稿），不持有任何文档引用
//! - 缺少最低字段（标题、URL、题目数量）的条目直接跳过，记 debug 日志
//! - 不访问网络，不访问存储
//!
//! 文档对象不能跨 `.await` 存活，所以调用方先抽取、丢掉文档，再入库。

use std::sync::OnceLock;

use regex::Regex;
use tracing::debug;

use crate::infrastructure::{Document, Element};
use crate::models::{QuestionKind, QuestionType, SubjectDraft};
use crate::services::classifier::classify;
use crate::services::normalizer::normalize;
use crate::services::selectors::*;

/// TSA 课程页上要抓的章节类别
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ChapterMode {
    /// 只要标题带考试标记的章节
    ExamChapters,
    /// 只要普通章节
    #[default]
    NonExamChapters,
}

impl ChapterMode {
    /// 章节是否属于当前模式
    pub fn accepts(self, chapter_title: &str) -> bool {
        is_exam_title(chapter_title) == (self == ChapterMode::ExamChapters)
    }

    pub fn is_exam(self) -> bool {
        self == ChapterMode::ExamChapters
    }
}

/// 课程页上的一个章节
#[derive(Debug, Clone, PartialEq)]
pub struct ScrapedChapter {
    pub title: String,
    pub url: String,
    pub lessons: Vec<ScrapedLesson>,
}

/// 章节下的课时
#[derive(Debug, Clone, PartialEq)]
pub struct ScrapedLesson {
    pub title: String,
    /// 折叠区锚点（`#collapse-…`），拼在课程 URL 后面作为课时 URL
    pub anchor: String,
    pub exams: Vec<ScrapedExam>,
}

/// 课时折叠区里的试卷
#[derive(Debug, Clone, PartialEq)]
pub struct ScrapedExam {
    pub title: String,
    pub url: String,
    pub quantity: Option<u32>,
}

/// 题目区的一个直接子元素
#[derive(Debug, Clone, PartialEq)]
pub enum ExamBlock {
    /// 成组判断题的题干
    GroupMarker(String),
    /// 阅读段落标题
    ParagraphTitle(String),
    /// 阅读段落正文（已规范化）
    ParagraphBody(String),
    Question(ScrapedQuestion),
    /// 没有题干的题目元素；成组判断题按位置计数，所以要占位
    EmptyItem,
}

/// 抽取出的一道题
#[derive(Debug, Clone, PartialEq)]
pub struct ScrapedQuestion {
    /// 题干（已规范化）
    pub content: String,
    pub kind: QuestionKind,
    /// 解析 HTML（已规范化）
    pub explanation: Option<String>,
    /// 解析的纯文本
    pub explanation_text: String,
    pub answers: Vec<ScrapedAnswer>,
}

impl ScrapedQuestion {
    /// 作为成组判断题的子题时，解析里写着"Đúng"（且前面不是否定词）即为正确
    pub fn marked_correct(&self) -> bool {
        let text = self.explanation_text.to_lowercase();
        text.match_indices(CORRECT_MARKER).any(|(at, _)| {
            let before = text[..at].trim_end();
            !NEGATION_MARKERS.iter().any(|n| before.ends_with(n))
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScrapedAnswer {
    pub content: String,
    pub is_correct: bool,
}

// ========== 科目 ==========

/// 科目列表
pub fn extract_subjects(doc: &Document) -> Vec<SubjectDraft> {
    let mut subjects = Vec::new();
    for item in doc.select(SUBJECT_ITEM) {
        let link = item.first(SUBJECT_LINK);
        let title = item
            .first(SUBJECT_TITLE)
            .map(|t| t.text())
            .filter(|t| !t.is_empty())
            .or_else(|| link.map(|l| l.text()))
            .unwrap_or_default();
        let url = link
            .and_then(|l| l.attribute("href"))
            .map(str::trim)
            .unwrap_or_default();

        if title.is_empty() || url.is_empty() {
            debug!("跳过不完整的科目条目: title={:?} url={:?}", title, url);
            continue;
        }

        subjects.push(SubjectDraft {
            title,
            url: url.to_string(),
            image: item
                .first(SUBJECT_IMAGE)
                .and_then(|img| img.attribute("src"))
                .map(str::to_string),
        });
    }
    subjects
}

// ========== 章节 → 课时 → 试卷 ==========

/// 课程页上的全部章节（未过滤，保持页面顺序）
pub fn extract_chapters(doc: &Document) -> Vec<ScrapedChapter> {
    doc.select(CHAPTER_ITEM)
        .into_iter()
        .map(|chapter| ScrapedChapter {
            title: chapter
                .first(CHAPTER_TITLE)
                .map(|t| t.text())
                .unwrap_or_default(),
            url: chapter
                .first(CHAPTER_LINK)
                .and_then(|a| a.attribute("href"))
                .unwrap_or_default()
                .trim()
                .to_string(),
            lessons: extract_lessons(chapter),
        })
        .collect()
}

fn extract_lessons(chapter: Element<'_>) -> Vec<ScrapedLesson> {
    let mut lessons = Vec::new();
    for item in chapter.select(LESSON_ITEM) {
        if item.has_ancestor_within(COLLAPSE, &chapter) {
            continue;
        }
        let Some(link) = item.first(LESSON_LINK) else {
            debug!("跳过没有链接的课时");
            continue;
        };
        let title = link.text();
        if title.is_empty() {
            debug!("跳过没有标题的课时");
            continue;
        }

        lessons.push(ScrapedLesson {
            title,
            anchor: link.attribute("href").unwrap_or_default().trim().to_string(),
            exams: extract_exams(item),
        });
    }
    lessons
}

fn extract_exams(lesson: Element<'_>) -> Vec<ScrapedExam> {
    let mut exams = Vec::new();
    for item in lesson.select(EXAM_ITEM) {
        let link = item.first(EXAM_LINK);
        let title = link.map(|l| l.text()).unwrap_or_default();
        let url = link
            .and_then(|l| l.attribute("href"))
            .map(str::trim)
            .unwrap_or_default();
        if title.is_empty() || url.is_empty() {
            debug!("跳过不完整的试卷: title={:?} url={:?}", title, url);
            continue;
        }

        let quantity = item
            .attribute(EXAM_QUANTITY_ATTR)
            .or_else(|| link.and_then(|l| l.attribute(EXAM_QUANTITY_ATTR)))
            .and_then(|q| q.trim().parse::<u32>().ok());

        exams.push(ScrapedExam {
            title,
            url: url.to_string(),
            quantity,
        });
    }
    exams
}

/// TSA 课程页：按模式保留章节
pub fn select_tsa_chapters(chapters: Vec<ScrapedChapter>, mode: ChapterMode) -> Vec<ScrapedChapter> {
    chapters
        .into_iter()
        .filter(|chapter| {
            if chapter.title.is_empty() || chapter.url.is_empty() {
                debug!("跳过不完整的章节: {:?}", chapter.title);
                return false;
            }
            mode.accepts(&chapter.title)
        })
        .collect()
}

/// 科目课程页：按名单丢掉最后一个章节，只保留已发布（带题目数量）的试卷
pub fn select_subject_chapters(
    mut chapters: Vec<ScrapedChapter>,
    subject_id: u64,
    trailing_chapter_skip: &[u64],
) -> Vec<ScrapedChapter> {
    if trailing_chapter_skip.contains(&subject_id) {
        if let Some(last) = chapters.pop() {
            debug!("科目 #{} 丢掉最后一个章节: {:?}", subject_id, last.title);
        }
    }

    chapters
        .into_iter()
        .filter(|chapter| !chapter.title.is_empty() && !chapter.url.is_empty())
        .map(|mut chapter| {
            for lesson in &mut chapter.lessons {
                lesson.exams.retain(|exam| {
                    if exam.quantity.is_none() {
                        debug!("跳过未发布的试卷: {}", exam.url);
                    }
                    exam.quantity.is_some()
                });
            }
            chapter
        })
        .collect()
}

// ========== 题目 ==========

/// 试卷页上的题目区，按页面顺序
///
/// 没有题目容器时，页面上每个题目元素都当作独立题目。
pub fn extract_exam_blocks(doc: &Document) -> Vec<ExamBlock> {
    let Some(container) = doc.first(QA_CONTAINER) else {
        return doc
            .select(QUESTION_ITEM)
            .into_iter()
            .filter_map(scrape_question)
            .map(ExamBlock::Question)
            .collect();
    };

    let mut blocks = Vec::new();
    for child in container.children() {
        if child.has_class(GROUP_MARKER_CLASS) {
            let content = normalize(&group_marker_content(child).inner_markup());
            if content.is_empty() {
                debug!("跳过空的成组判断题题干");
                continue;
            }
            blocks.push(ExamBlock::GroupMarker(content));
        } else if child.has_class(PARAGRAPH_TITLE_CLASS) {
            blocks.push(ExamBlock::ParagraphTitle(child.text()));
        } else if child.has_class(PARAGRAPH_BODY_CLASS) {
            blocks.push(ExamBlock::ParagraphBody(normalize(&child.inner_markup())));
        } else if child.has_class(QUESTION_ITEM_CLASS) {
            blocks.push(
                scrape_question(child)
                    .map(ExamBlock::Question)
                    .unwrap_or(ExamBlock::EmptyItem),
            );
        }
    }
    blocks
}

fn group_marker_content(marker: Element<'_>) -> Element<'_> {
    marker.first(GROUP_MARKER_CONTENT).unwrap_or(marker)
}

/// 抽取一道独立题目；题干为空时返回 `None`
pub fn scrape_question(item: Element<'_>) -> Option<ScrapedQuestion> {
    let content = item
        .first(QUESTION_CONTENT)
        .map(|c| normalize(&c.inner_markup()))
        .unwrap_or_default();
    if content.is_empty() {
        debug!("跳过没有题干的题目");
        return None;
    }

    let explanation_el = item.first(EXPLANATION);
    let explanation = explanation_el
        .map(|e| normalize(&e.inner_markup()))
        .filter(|e| !e.is_empty());
    let explanation_text = explanation_el.map(|e| e.text()).unwrap_or_default();

    let options = scrape_options(item);
    let (kind, answers) = match classify(item) {
        QuestionType::Choice => (QuestionKind::Choice, options),
        QuestionType::FillBlank => (QuestionKind::FillBlank, options),
        QuestionType::DragDrop => (QuestionKind::DragDrop, options),
        QuestionType::ShortAnswer => (
            QuestionKind::ShortAnswer {
                short_answer: parse_short_answer(&explanation_text),
            },
            options,
        ),
        QuestionType::TrueFalse => match options.len() {
            0 => (
                QuestionKind::TrueFalse { true_false: None },
                scrape_table_rows(item),
            ),
            1 => (
                QuestionKind::TrueFalse {
                    true_false: Some(options[0].is_correct),
                },
                options,
            ),
            _ => (QuestionKind::TrueFalse { true_false: None }, options),
        },
    };

    Some(ScrapedQuestion {
        content,
        kind,
        explanation,
        explanation_text,
        answers,
    })
}

fn scrape_options(item: Element<'_>) -> Vec<ScrapedAnswer> {
    item.select(ANSWER_OPTION)
        .into_iter()
        .filter_map(|option| {
            let content = option
                .first(OPTION_CONTENT)
                .map(|c| normalize(&c.inner_markup()))
                .unwrap_or_default();
            if content.is_empty() {
                return None;
            }
            Some(ScrapedAnswer {
                content,
                is_correct: option.attribute(CORRECT_ATTR) == Some(CORRECT_VALUE),
            })
        })
        .collect()
}

/// 表格判断题：每个带单元格的行是一个判断
fn scrape_table_rows(item: Element<'_>) -> Vec<ScrapedAnswer> {
    let marked = format!("[{}=\"{}\"]", CORRECT_ATTR, CORRECT_VALUE);
    item.select(TABLE_ROW)
        .into_iter()
        .filter_map(|row| {
            let cell = row.first("td")?;
            let content = normalize(&cell.inner_markup());
            if content.is_empty() {
                return None;
            }
            Some(ScrapedAnswer {
                content,
                is_correct: row.attribute(CORRECT_ATTR) == Some(CORRECT_VALUE)
                    || row.contains(&marked),
            })
        })
        .collect()
}

/// 从解析文字里取"Đáp án"后面的答案，截到第一句话
pub fn parse_short_answer(explanation_text: &str) -> Option<String> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    let re = PATTERN
        .get_or_init(|| Regex::new(SHORT_ANSWER_PATTERN).ok())
        .as_ref()?;

    let captured = re.captures(explanation_text)?.get(1)?.as_str();
    let sentence = captured.split(". ").next().unwrap_or(captured);
    let value = sentence.trim().trim_end_matches('.').trim();
    if value.is_empty() {
        return None;
    }
    Some(value.chars().take(SHORT_ANSWER_MAX_CHARS).collect())
}
