//! 内存存储 + JSON 快照
//!
//! 所有表放在一把锁后面；命令行每次运行前从快照加载、运行后写回。

use std::io::ErrorKind;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{AppResult, FileError, StoreError, StoreResult};
use crate::models::{
    Answer, AnswerDraft, Course, Exam, Lesson, Paragraph, Question, QuestionDraft, Record, Subject,
};
use crate::store::{QuestionRepository, Repository};

#[derive(Debug, Default, Serialize, Deserialize)]
struct Tables {
    next_id: u64,
    subjects: Vec<Subject>,
    courses: Vec<Course>,
    lessons: Vec<Lesson>,
    exams: Vec<Exam>,
    paragraphs: Vec<Paragraph>,
    questions: Vec<Question>,
    answers: Vec<Answer>,
}

impl Tables {
    fn allocate_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

/// 内存存储
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 从快照文件加载；文件不存在时返回空存储
    pub fn load(path: &Path) -> AppResult<Self> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!("快照文件不存在，使用空存储: {}", path.display());
                return Ok(Self::new());
            }
            Err(source) => {
                return Err(FileError::ReadFailed {
                    path: path.display().to_string(),
                    source,
                }
                .into())
            }
        };

        let tables: Tables = serde_json::from_str(&content).map_err(StoreError::Snapshot)?;
        debug!(
            "快照已加载: {} 门课程, {} 张试卷, {} 道题目",
            tables.courses.len(),
            tables.exams.len(),
            tables.questions.len()
        );
        Ok(Self {
            tables: Mutex::new(tables),
        })
    }

    /// 写出快照文件
    pub fn save(&self, path: &Path) -> AppResult<()> {
        let json = {
            let tables = self.lock()?;
            serde_json::to_string_pretty(&*tables).map_err(StoreError::Snapshot)?
        };
        std::fs::write(path, json).map_err(|source| FileError::WriteFailed {
            path: path.display().to_string(),
            source,
        })?;
        info!("快照已保存至: {}", path.display());
        Ok(())
    }

    /// 某张试卷下的题目，按创建顺序
    pub fn questions_for_exam(&self, exam_id: u64) -> StoreResult<Vec<Question>> {
        let tables = self.lock()?;
        Ok(tables
            .questions
            .iter()
            .filter(|q| q.exam_id == exam_id)
            .cloned()
            .collect())
    }

    /// 某道题目的答案，按创建顺序
    pub fn answers_for_question(&self, question_id: u64) -> StoreResult<Vec<Answer>> {
        let tables = self.lock()?;
        Ok(tables
            .answers
            .iter()
            .filter(|a| a.question_id == question_id)
            .cloned()
            .collect())
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Tables>> {
        self.tables.lock().map_err(|_| StoreError::Poisoned)
    }
}

macro_rules! impl_repository {
    ($record:ty, $table:ident) => {
        impl Repository<$record> for MemoryStore {
            fn find_by_natural_key(&self, key: &str) -> StoreResult<Option<$record>> {
                let tables = self.lock()?;
                Ok(tables.$table.iter().find(|r| r.natural_key() == key).cloned())
            }

            fn find_by_id(&self, id: u64) -> StoreResult<Option<$record>> {
                let tables = self.lock()?;
                Ok(tables.$table.iter().find(|r| r.id == id).cloned())
            }

            fn create(&self, draft: <$record as Record>::Draft) -> StoreResult<$record> {
                let mut tables = self.lock()?;
                let id = tables.allocate_id();
                let record = <$record as Record>::from_draft(id, draft);
                tables.$table.push(record.clone());
                Ok(record)
            }

            fn update(&self, id: u64, patch: <$record as Record>::Draft) -> StoreResult<$record> {
                let mut tables = self.lock()?;
                let record = tables
                    .$table
                    .iter_mut()
                    .find(|r| r.id == id)
                    .ok_or(StoreError::MissingRecord {
                        kind: <$record as Record>::KIND,
                        id,
                    })?;
                record.apply(patch);
                Ok(record.clone())
            }

            fn count(&self) -> StoreResult<usize> {
                Ok(self.lock()?.$table.len())
            }
        }
    };
}

impl_repository!(Subject, subjects);
impl_repository!(Course, courses);
impl_repository!(Lesson, lessons);
impl_repository!(Exam, exams);
impl_repository!(Paragraph, paragraphs);

impl QuestionRepository for MemoryStore {
    fn create_question(&self, draft: QuestionDraft) -> StoreResult<Question> {
        let mut tables = self.lock()?;
        let id = tables.allocate_id();
        let question = Question::from_draft(id, draft);
        tables.questions.push(question.clone());
        Ok(question)
    }

    fn create_answer(&self, draft: AnswerDraft) -> StoreResult<Answer> {
        let mut tables = self.lock()?;
        let id = tables.allocate_id();
        let answer = Answer::from_draft(id, draft);
        tables.answers.push(answer.clone());
        Ok(answer)
    }

    fn delete_questions_for_exam(&self, exam_id: u64) -> StoreResult<usize> {
        let mut tables = self.lock()?;
        let removed: Vec<u64> = tables
            .questions
            .iter()
            .filter(|q| q.exam_id == exam_id)
            .map(|q| q.id)
            .collect();
        tables.questions.retain(|q| q.exam_id != exam_id);
        tables.answers.retain(|a| !removed.contains(&a.question_id));
        Ok(removed.len())
    }

    fn question_count(&self) -> StoreResult<usize> {
        Ok(self.lock()?.questions.len())
    }

    fn answer_count(&self) -> StoreResult<usize> {
        Ok(self.lock()?.answers.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CourseDraft, QuestionKind};

    fn course_draft(url: &str) -> CourseDraft {
        CourseDraft {
            title: "Chương 1".into(),
            url: url.into(),
            is_exam: None,
            subject_id: None,
        }
    }

    #[test]
    fn created_records_are_readable_by_key_and_id() {
        let store = MemoryStore::new();
        let course = Repository::<Course>::create(&store, course_draft("https://a")).unwrap();

        let by_key = Repository::<Course>::find_by_natural_key(&store, "https://a").unwrap();
        assert_eq!(by_key, Some(course.clone()));
        let by_id = Repository::<Course>::find_by_id(&store, course.id).unwrap();
        assert_eq!(by_id, Some(course));
        assert_eq!(Repository::<Course>::count(&store).unwrap(), 1);
    }

    #[test]
    fn updating_missing_record_fails() {
        let store = MemoryStore::new();
        let err = Repository::<Course>::update(&store, 99, course_draft("x")).unwrap_err();
        assert!(matches!(err, StoreError::MissingRecord { kind: "course", id: 99 }));
    }

    #[test]
    fn deleting_exam_questions_cascades_to_answers() {
        let store = MemoryStore::new();
        let q = store
            .create_question(QuestionDraft {
                exam_id: 5,
                paragraph_id: None,
                order_index: 1,
                content: "q".into(),
                explanation: None,
                kind: QuestionKind::Choice,
            })
            .unwrap();
        store
            .create_answer(AnswerDraft {
                question_id: q.id,
                content: "a".into(),
                is_correct: true,
                order_index: 1,
            })
            .unwrap();

        assert_eq!(store.delete_questions_for_exam(5).unwrap(), 1);
        assert_eq!(store.question_count().unwrap(), 0);
        assert_eq!(store.answer_count().unwrap(), 0);
    }

    #[test]
    fn snapshot_round_trip_keeps_ids_moving_forward() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snapshot.json");

        let store = MemoryStore::new();
        let first = Repository::<Course>::create(&store, course_draft("https://a")).unwrap();
        store.save(&path).unwrap();

        let reloaded = MemoryStore::load(&path).unwrap();
        assert_eq!(Repository::<Course>::count(&reloaded).unwrap(), 1);
        let second = Repository::<Course>::create(&reloaded, course_draft("https://b")).unwrap();
        assert!(second.id > first.id);
    }

    #[test]
    fn missing_snapshot_is_an_empty_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = MemoryStore::load(&dir.path().join("none.json")).unwrap();
        assert_eq!(store.question_count().unwrap(), 0);
    }
}
