//! 抓取结果信封
//!
//! 所有对外操作都返回同一种结构：`{ success, data?, error?, metadata }`

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::entities::{Course, Exam, Lesson, Paragraph, Subject};
use crate::models::question::{Answer, Question};

/// 各类记录的数量，未涉及的类别不输出
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrawlCounts {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub courses_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lessons_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exams_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paragraphs_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub questions_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answers_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed_exams: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    pub timestamp: DateTime<Utc>,
    pub url: String,
    #[serde(flatten)]
    pub counts: CrawlCounts,
}

/// 抓取结果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlResult<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub metadata: Metadata,
}

impl<T> CrawlResult<T> {
    pub fn ok(data: T, url: impl Into<String>, counts: CrawlCounts) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            metadata: Metadata {
                timestamp: Utc::now(),
                url: url.into(),
                counts,
            },
        }
    }

    pub fn fail(error: impl ToString, url: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.to_string()),
            metadata: Metadata {
                timestamp: Utc::now(),
                url: url.into(),
                counts: CrawlCounts::default(),
            },
        }
    }
}

/// 科目列表
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubjectsData {
    pub subjects: Vec<Subject>,
}

/// 课程 → 课时 → 试卷 层级
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HierarchyData {
    pub courses: Vec<Course>,
    pub lessons: Vec<Lesson>,
    pub exams: Vec<Exam>,
}

/// 单张试卷的题目和答案
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QuestionsData {
    pub paragraphs: Vec<Paragraph>,
    pub questions: Vec<Question>,
    pub answers: Vec<Answer>,
}

/// 单张试卷抓取失败的记录
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamFailure {
    pub exam_id: u64,
    pub url: String,
    pub error: String,
}

/// 层级 + 全部试卷题目的汇总
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FullCrawlData {
    #[serde(flatten)]
    pub hierarchy: HierarchyData,
    pub total_paragraphs: usize,
    pub total_questions: usize,
    pub total_answers: usize,
    pub failures: Vec<ExamFailure>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_envelope_has_error_and_no_data() {
        let result: CrawlResult<SubjectsData> = CrawlResult::fail("boom", "https://x");
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["error"], "boom");
        assert_eq!(json["metadata"]["url"], "https://x");
        assert!(json.get("data").is_none());
        assert!(json["metadata"].get("coursesCount").is_none());
    }

    #[test]
    fn counts_are_camel_case_and_flattened() {
        let counts = CrawlCounts {
            courses_count: Some(2),
            ..Default::default()
        };
        let result = CrawlResult::ok(HierarchyData::default(), "", counts);
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["metadata"]["coursesCount"], 2);
        assert!(json["metadata"]["timestamp"].is_string());
    }
}
