//! 按自然键对账 - 业务能力层
//!
//! 同一自然键的记录已存在时做部分更新，否则新建。
//! 对同样的输入重复调用不会让表变大。题目和答案不走这里。

use tracing::debug;

use crate::error::StoreResult;
use crate::models::Record;
use crate::store::Repository;

/// 对账结果
#[derive(Debug, Clone, PartialEq)]
pub struct Upserted<R> {
    pub record: R,
    /// 是否为新建
    pub created: bool,
}

/// 按草稿的自然键新建或更新
pub fn upsert<R, S>(store: &S, draft: R::Draft) -> StoreResult<Upserted<R>>
where
    R: Record,
    S: Repository<R> + ?Sized,
{
    match store.find_by_natural_key(R::draft_key(&draft))? {
        Some(existing) => {
            let record = store.update(existing.id(), draft)?;
            debug!("更新 {} #{}: {}", R::KIND, record.id(), record.natural_key());
            Ok(Upserted {
                record,
                created: false,
            })
        }
        None => {
            let record = store.create(draft)?;
            debug!("新建 {} #{}: {}", R::KIND, record.id(), record.natural_key());
            Ok(Upserted {
                record,
                created: true,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Course, CourseDraft};
    use crate::store::MemoryStore;

    fn draft(title: &str, url: &str, is_exam: Option<bool>) -> CourseDraft {
        CourseDraft {
            title: title.into(),
            url: url.into(),
            is_exam,
            subject_id: None,
        }
    }

    #[test]
    fn matching_url_updates_in_place() {
        let store = MemoryStore::new();
        let first = upsert::<Course, _>(&store, draft("Cũ", "https://c/1", Some(false))).unwrap();
        assert!(first.created);

        let second = upsert::<Course, _>(&store, draft("Mới", "https://c/1", Some(true))).unwrap();
        assert!(!second.created);
        assert_eq!(second.record.id, first.record.id);
        assert_eq!(second.record.title, "Mới");
        assert!(second.record.is_exam);
        assert_eq!(Repository::<Course>::count(&store).unwrap(), 1);
    }

    #[test]
    fn novel_url_inserts_exactly_one_row() {
        let store = MemoryStore::new();
        upsert::<Course, _>(&store, draft("A", "https://c/1", None)).unwrap();
        let other = upsert::<Course, _>(&store, draft("B", "https://c/2", None)).unwrap();
        assert!(other.created);
        assert_eq!(Repository::<Course>::count(&store).unwrap(), 2);
    }

    #[test]
    fn absent_optional_fields_are_preserved_on_update() {
        let store = MemoryStore::new();
        upsert::<Course, _>(&store, draft("A", "https://c/1", Some(true))).unwrap();
        let again = upsert::<Course, _>(&store, draft("A", "https://c/1", None)).unwrap();
        assert!(again.record.is_exam);
    }
}
