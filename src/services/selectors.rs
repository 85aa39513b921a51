//! 目标站点的标记约定
//!
//! 选择器和站点用词集中在这里，站点改版时只改这一个文件。

// ========== 科目列表页 ==========

pub const SUBJECT_ITEM: &str = ".list-subject .subject-item";
pub const SUBJECT_LINK: &str = "a";
pub const SUBJECT_TITLE: &str = ".subject-title";
pub const SUBJECT_IMAGE: &str = "img";

// ========== 课程页（章节 → 课时 → 试卷） ==========

pub const CHAPTER_ITEM: &str = ".chapter-item";
pub const CHAPTER_LINK: &str = ".chapter-head a";
pub const CHAPTER_TITLE: &str = ".chapter-head a span";
/// 章节下的课时；折叠区里的试卷项也会匹配，要按 [`COLLAPSE`] 祖先排除
pub const LESSON_ITEM: &str = "ul.lesson-wrapper > li.exam-item";
pub const COLLAPSE: &str = ".collapse";
pub const LESSON_LINK: &str = ".exam-body > p.exam-test.mb-0 > a";
pub const EXAM_ITEM: &str = ".collapse ul.lesson-wrapper li.exam-item.last-item";
pub const EXAM_LINK: &str = ".exam-body p.exam-test a.url-main";
/// 试卷题目数量；没有这个属性的试卷还没发布
pub const EXAM_QUANTITY_ATTR: &str = "data-quantity";

// ========== 试卷页 ==========

pub const QA_CONTAINER: &str = ".quiz-answer-list";
pub const QUESTION_ITEM: &str = ".quiz-answer-item";
pub const QUESTION_ITEM_CLASS: &str = "quiz-answer-item";
/// 成组判断题的题干标记
pub const GROUP_MARKER_CLASS: &str = "quiz-paragraph";
/// TSA 阅读段落标题
pub const PARAGRAPH_TITLE_CLASS: &str = "paragraph-title";
/// TSA 阅读段落正文
pub const PARAGRAPH_BODY_CLASS: &str = "paragraph-content";

pub const QUESTION_CONTENT: &str = ".quiz-answer-left .question .title-question";
/// 成组判断题题干里的标题
pub const GROUP_MARKER_CONTENT: &str = ".title-question";
pub const ANSWER_OPTION: &str = ".answer-check .option-choices.js-answer";
pub const OPTION_CONTENT: &str = ".option-content";
pub const CORRECT_ATTR: &str = "data-answer";
pub const CORRECT_VALUE: &str = "Y";
/// 没有选项的题（简答题）
pub const NO_OPTION: &str = ".answer-check .no-option";
pub const EXPLANATION: &str = ".quiz-answer-right .result.box-hint";
pub const TABLE_ROW: &str = "table tr";

// ========== 站点用词（越南语，小写比较） ==========

/// 章节/课时标题里表示"考试/模拟考"的词
pub const EXAM_TITLE_MARKERS: &[&str] = &["đề thi", "thi thử"];
/// "拖拽"
pub const DRAG_DROP_MARKER: &str = "kéo thả";
/// "正确"
pub const CORRECT_MARKER: &str = "đúng";
/// 紧挨在"đúng"前面时表示否定（"không đúng"、"chưa đúng"）
pub const NEGATION_MARKERS: &[&str] = &["không", "chưa"];
/// 连续下划线表示填空
pub const BLANK_RUN: &str = "_____";

/// 成组判断题最多吸收的子题数
pub const GROUP_SIZE: usize = 4;

/// 解析里简答题答案的引导词"Đáp án"（答案），后面跟答案本身
pub const SHORT_ANSWER_PATTERN: &str = r"(?i)đáp\s+án\s*[:：]?\s*(.+)";

/// 简答题答案的最大长度（字符）
pub const SHORT_ANSWER_MAX_CHARS: usize = 100;

/// 标题里是否带有考试标记
pub fn is_exam_title(title: &str) -> bool {
    let lower = title.to_lowercase();
    EXAM_TITLE_MARKERS.iter().any(|marker| lower.contains(marker))
}
