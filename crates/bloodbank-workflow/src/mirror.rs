//! 集合镜像
//!
//! 远程集合在客户端的有序副本。每次变更在远程确认后按ID对账，
//! 不做乐观更新：远程失败时镜像保持原样。

use bloodbank_core::{Identified, RecordId, Result};
use std::future::Future;
use tracing::{debug, warn};

/// 新记录的插入位置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertPosition {
    /// 新申请需出现在"最近"视图顶部
    Front,
    Back,
}

/// 对账结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Replaced { index: usize },
    Inserted { index: usize },
}

/// 远程集合的本地镜像
#[derive(Debug, Clone)]
pub struct Mirror<T> {
    items: Vec<T>,
    insert_position: InsertPosition,
    loaded: bool,
}

impl<T: Identified + Clone> Mirror<T> {
    pub fn new(insert_position: InsertPosition) -> Self {
        Self {
            items: Vec::new(),
            insert_position,
            loaded: false,
        }
    }

    /// 新记录前插（用血申请）
    pub fn prepending() -> Self {
        Self::new(InsertPosition::Front)
    }

    /// 新记录追加（库存、医院、献血者）
    pub fn appending() -> Self {
        Self::new(InsertPosition::Back)
    }

    /// 用重新拉取的结果整体替换
    pub fn replace_all(&mut self, items: Vec<T>) {
        debug!("Mirror replaced wholesale with {} records", items.len());
        self.items = items;
        self.loaded = true;
    }

    /// 是否已从远程加载过
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// 用远程确认的记录对账：同ID原位替换，否则按约定插入
    pub fn upsert_from_server(&mut self, record: T) -> UpsertOutcome {
        let id = record.id();
        if let Some(index) = self.position(id) {
            self.items[index] = record;
            return UpsertOutcome::Replaced { index };
        }

        match self.insert_position {
            InsertPosition::Front => {
                self.items.insert(0, record);
                UpsertOutcome::Inserted { index: 0 }
            }
            InsertPosition::Back => {
                self.items.push(record);
                UpsertOutcome::Inserted {
                    index: self.items.len() - 1,
                }
            }
        }
    }

    /// 按ID删除；不存在时为空操作
    pub fn remove_by_id(&mut self, id: RecordId) -> Option<T> {
        match self.position(id) {
            Some(index) => Some(self.items.remove(index)),
            None => {
                debug!("Record {} already absent from mirror", id);
                None
            }
        }
    }

    /// 切换布尔字段
    ///
    /// 读取当前值，把取反后的目标值交给 `send` 提交到远程，
    /// 成功后以远程返回的记录替换本地记录。记录不存在时返回 `Ok(None)`，不触达远程。
    pub async fn toggle_boolean_field<F, Fut>(
        &mut self,
        id: RecordId,
        field: fn(&T) -> bool,
        send: F,
    ) -> Result<Option<T>>
    where
        F: FnOnce(RecordId, bool) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let desired = match self.get(id) {
            Some(record) => !field(record),
            None => {
                debug!("Toggle skipped: record {} not in mirror", id);
                return Ok(None);
            }
        };

        let confirmed = send(id, desired).await?;
        if field(&confirmed) != desired {
            warn!(
                "Store answered toggle of {} with {}, adopting store value",
                id,
                field(&confirmed)
            );
        }

        self.upsert_from_server(confirmed.clone());
        Ok(Some(confirmed))
    }

    pub fn get(&self, id: RecordId) -> Option<&T> {
        self.items.iter().find(|item| item.id() == id)
    }

    pub fn contains(&self, id: RecordId) -> bool {
        self.position(id).is_some()
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn position(&self, id: RecordId) -> Option<usize> {
        self.items.iter().position(|item| item.id() == id)
    }
}
