//! 在线连接表

use std::sync::Arc;

use dashmap::DashMap;
use domain::ConnectionId;
use tracing::{debug, info};

use crate::connection::StreamTarget;

/// 以连接 ID 为键的在线目标集合，注册与移除都是 O(1)。
///
/// 只保存目标句柄；底层传输由网络层持有。
#[derive(Default)]
pub struct ConnectionRegistry {
    targets: DashMap<ConnectionId, Arc<dyn StreamTarget>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, target: Arc<dyn StreamTarget>) -> Arc<dyn StreamTarget> {
        let id = target.id();
        self.targets.insert(id, Arc::clone(&target));
        info!(client_id = %id, connections = self.targets.len(), "stream client registered");
        target
    }

    /// 移除连接；已不存在的 ID 直接忽略。返回是否真的移除了。
    pub fn remove(&self, id: &ConnectionId) -> bool {
        match self.targets.remove(id) {
            Some((_, target)) => {
                target.close();
                info!(client_id = %id, connections = self.targets.len(), "stream client removed");
                true
            }
            None => {
                debug!(client_id = %id, "stream client already removed");
                false
            }
        }
    }

    /// 当前仍可写的目标
    pub fn list_live(&self) -> Vec<Arc<dyn StreamTarget>> {
        self.targets
            .iter()
            .filter(|entry| entry.value().is_live())
            .map(|entry| Arc::clone(entry.value()))
            .collect()
    }

    /// 全部已注册目标的快照，包括已经失效但还没移除的
    pub fn snapshot(&self) -> Vec<Arc<dyn StreamTarget>> {
        self.targets
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect()
    }

    /// 关闭并移除全部连接，返回移除的数量。停机时用它结束所有事件流。
    pub fn close_all(&self) -> usize {
        let ids: Vec<ConnectionId> = self.targets.iter().map(|entry| *entry.key()).collect();
        ids.iter().filter(|id| self.remove(id)).count()
    }

    pub fn contains(&self, id: &ConnectionId) -> bool {
        self.targets.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}
