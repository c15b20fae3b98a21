// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::queue_item::{QueueItem, QueueItemStatus};
use crate::domain::models::session::{CrawlConfig, ExcludePattern};
use crate::utils::url_utils::normalize_str;
use chrono::Utc;
use std::collections::{BTreeSet, HashMap, HashSet};
use thiserror::Error;
use uuid::Uuid;

/// 队列错误类型
#[derive(Error, Debug, PartialEq)]
pub enum QueueError {
    /// 队列项不存在
    #[error("Queue item {0} not found")]
    UnknownItem(Uuid),

    /// 非法的状态转换
    #[error("Queue item {id} cannot leave state {from}")]
    InvalidTransition { id: Uuid, from: QueueItemStatus },
}

/// 入队被拒绝的原因
///
/// 拒绝不是错误，调用方只需丢弃该URL。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// 无法解析或非 http(s)
    InvalidUrl,
    /// 会话内已存在
    Duplicate,
    /// 超过最大深度
    TooDeep,
    /// 命中排除规则
    Excluded,
    /// 已爬取数加未完成数达到上限
    CapReached,
}

/// 入队结果
#[derive(Debug, Clone)]
pub enum EnqueueOutcome {
    Accepted(QueueItem),
    Rejected(RejectReason),
}

/// 失败处理结果
#[derive(Debug, Clone)]
pub enum FailOutcome {
    /// 仍在重试预算内，已回到 pending
    Retried(QueueItem),
    /// 永久失败
    Failed(QueueItem),
}

/// 队列存储
///
/// 单个会话的队列状态机：以ID寻址的队列项集合，加上按规范化URL的去重索引
/// 和按（深度，入队序号）排序的待领取集合。本身不加锁，由会话运行时在
/// 同一把锁内调用全部操作。
#[derive(Debug)]
pub struct QueueStore {
    session_id: Uuid,
    max_urls: i32,
    max_depth: i32,
    max_retries: i32,
    excludes: Vec<ExcludePattern>,
    items: HashMap<Uuid, QueueItem>,
    known: HashSet<String>,
    pending: BTreeSet<(i32, i64, Uuid)>,
    processing: HashSet<Uuid>,
    next_seq: i64,
    completed: i32,
    failed: i32,
}

impl QueueStore {
    /// 创建队列存储
    ///
    /// # 参数
    ///
    /// * `session_id` - 所属会话
    /// * `config` - 会话配置，排除规则必须已通过校验
    /// * `max_retries` - 可重试失败的最大重试次数
    pub fn new(session_id: Uuid, config: &CrawlConfig, max_retries: i32) -> Result<Self, String> {
        Ok(Self {
            session_id,
            max_urls: config.max_urls,
            max_depth: config.max_depth,
            max_retries: max_retries.max(0),
            excludes: config.compile_excludes()?,
            items: HashMap::new(),
            known: HashSet::new(),
            pending: BTreeSet::new(),
            processing: HashSet::new(),
            next_seq: 0,
            completed: 0,
            failed: 0,
        })
    }

    /// 入队URL
    ///
    /// 依次检查：URL 可解析、未出现过、深度不超过上限、未命中排除规则、
    /// 已完成数加未完成数小于 `max_urls`。
    pub fn enqueue(
        &mut self,
        url: &str,
        depth: i32,
        discovered_from: Option<Uuid>,
    ) -> EnqueueOutcome {
        let Some(url) = normalize_str(url) else {
            return EnqueueOutcome::Rejected(RejectReason::InvalidUrl);
        };
        if self.known.contains(&url) {
            return EnqueueOutcome::Rejected(RejectReason::Duplicate);
        }
        if depth < 0 || depth > self.max_depth {
            return EnqueueOutcome::Rejected(RejectReason::TooDeep);
        }
        if self.excludes.iter().any(|p| p.matches(&url)) {
            return EnqueueOutcome::Rejected(RejectReason::Excluded);
        }
        if self.completed + self.outstanding() >= self.max_urls {
            return EnqueueOutcome::Rejected(RejectReason::CapReached);
        }

        let item = QueueItem::new(self.session_id, url.clone(), depth, discovered_from, self.next_seq);
        self.next_seq += 1;
        self.known.insert(url);
        self.pending.insert((item.depth, item.seq, item.id));
        self.items.insert(item.id, item.clone());
        EnqueueOutcome::Accepted(item)
    }

    /// 领取一个待处理项
    ///
    /// 按深度升序、同深度按入队顺序选择，并标记为 processing。
    pub fn claim(&mut self) -> Option<QueueItem> {
        let (_, _, id) = self.pending.pop_first()?;
        let item = self.items.get_mut(&id)?;
        item.status = QueueItemStatus::Processing;
        item.attempt_count += 1;
        item.updated_at = Utc::now();
        self.processing.insert(id);
        Some(item.clone())
    }

    /// 完成处理中的队列项
    pub fn complete(&mut self, id: Uuid) -> Result<QueueItem, QueueError> {
        let item = self.take_processing(id)?;
        item.status = QueueItemStatus::Completed;
        item.updated_at = Utc::now();
        let item = item.clone();
        self.completed += 1;
        Ok(item)
    }

    /// 处理失败
    ///
    /// # 参数
    ///
    /// * `id` - 队列项ID
    /// * `retryable` - 错误是否可重试；不可重试的错误直接永久失败
    pub fn fail(&mut self, id: Uuid, retryable: bool) -> Result<FailOutcome, QueueError> {
        let max_attempts = 1 + self.max_retries;
        let item = self.take_processing(id)?;
        item.updated_at = Utc::now();

        if retryable && item.attempt_count < max_attempts {
            item.status = QueueItemStatus::Pending;
            let item = item.clone();
            self.pending.insert((item.depth, item.seq, item.id));
            Ok(FailOutcome::Retried(item))
        } else {
            item.status = QueueItemStatus::Failed;
            let item = item.clone();
            self.failed += 1;
            Ok(FailOutcome::Failed(item))
        }
    }

    /// 放弃全部待处理项（会话取消）
    ///
    /// 返回被标记为 cancelled 的队列项，处理中的项不受影响。
    pub fn abandon_pending(&mut self) -> Vec<QueueItem> {
        let now = Utc::now();
        let pending = std::mem::take(&mut self.pending);
        pending
            .into_iter()
            .filter_map(|(_, _, id)| {
                let item = self.items.get_mut(&id)?;
                item.status = QueueItemStatus::Cancelled;
                item.updated_at = now;
                Some(item.clone())
            })
            .collect()
    }

    fn take_processing(&mut self, id: Uuid) -> Result<&mut QueueItem, QueueError> {
        let item = self.items.get_mut(&id).ok_or(QueueError::UnknownItem(id))?;
        if item.status != QueueItemStatus::Processing {
            return Err(QueueError::InvalidTransition {
                id,
                from: item.status,
            });
        }
        self.processing.remove(&id);
        Ok(item)
    }

    /// 没有 pending 也没有 processing 项
    pub fn is_drained(&self) -> bool {
        self.pending.is_empty() && self.processing.is_empty()
    }

    /// 待领取项数量
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// 处理中项数量
    pub fn in_flight(&self) -> usize {
        self.processing.len()
    }

    /// 未完成项数量（pending + processing）
    pub fn outstanding(&self) -> i32 {
        (self.pending.len() + self.processing.len()) as i32
    }

    /// 已完成项数量
    pub fn completed_count(&self) -> i32 {
        self.completed
    }

    /// 永久失败项数量
    pub fn failed_count(&self) -> i32 {
        self.failed
    }

    /// 前沿是否已关闭
    ///
    /// 数量上限已占满，或者没有任何未完成项比 `max_depth` 浅，
    /// 此后不会再有新URL入队。
    pub fn frontier_closed(&self) -> bool {
        if self.completed + self.outstanding() >= self.max_urls {
            return true;
        }
        let shallow_pending = self
            .pending
            .first()
            .is_some_and(|(depth, _, _)| *depth < self.max_depth);
        let shallow_processing = self
            .processing
            .iter()
            .filter_map(|id| self.items.get(id))
            .any(|item| item.depth < self.max_depth);
        !shallow_pending && !shallow_processing
    }

    /// 按ID获取队列项
    pub fn get(&self, id: Uuid) -> Option<&QueueItem> {
        self.items.get(&id)
    }

    /// 按入队顺序列出全部队列项
    pub fn items(&self) -> Vec<QueueItem> {
        let mut items: Vec<QueueItem> = self.items.values().cloned().collect();
        items.sort_by_key(|i| i.seq);
        items
    }
}
