// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::application::errors::SessionError;
use crate::domain::models::event::{SessionEvent, SessionEventKind};
use crate::domain::models::queue_item::{QueueItem, QueueItemStatus};
use crate::domain::models::session::{CrawlSession, SessionStatus};
use crate::domain::repositories::queue_item_repository::QueueItemRepository;
use crate::domain::repositories::session_repository::SessionRepository;
use crate::infrastructure::metrics::SESSIONS_TOTAL;
use crate::queue::queue_store::{EnqueueOutcome, FailOutcome, QueueError, QueueStore};
use chrono::Utc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{broadcast, watch, Mutex};
use tracing::{debug, error, info, warn};
use url::Url;
use uuid::Uuid;

/// 领取结果
#[derive(Debug, Clone)]
pub enum Claim {
    /// 领取到一个队列项，已标记为 processing
    Item(QueueItem),
    /// 暂时没有可领取项，但其他工作器可能即将入队新链接
    Empty,
    /// 会话已结束或已请求取消，工作器应退出
    Finished,
}

/// 锁内状态
struct RuntimeState {
    session: CrawlSession,
    queue: QueueStore,
}

/// 会话运行时
///
/// 单个会话的互斥域：队列、计数器、状态与取消标志都在同一把锁下修改，
/// 队列项与会话行也在锁内持久化。完成判定与入队因此是线性化的，
/// 不会出现最后一项完成的同时另一个工作器正在入队新链接的竞争。
///
/// 每次状态或计数器变化都向事件通道推送一条与快照同源的事件。
pub struct SessionRuntime {
    session_id: Uuid,
    state: Mutex<RuntimeState>,
    cancel_requested: AtomicBool,
    events: broadcast::Sender<SessionEvent>,
    status: watch::Sender<SessionStatus>,
    sessions: Arc<dyn SessionRepository>,
    queue_items: Arc<dyn QueueItemRepository>,
}

impl std::fmt::Debug for SessionRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionRuntime")
            .field("session_id", &self.session_id)
            .finish_non_exhaustive()
    }
}

impl SessionRuntime {
    /// 为一个 pending 会话创建运行时
    ///
    /// # 参数
    ///
    /// * `session` - 已持久化的会话
    /// * `max_retries` - 可重试失败的最大重试次数
    /// * `event_buffer` - 事件通道容量
    /// * `sessions` - 会话仓库
    /// * `queue_items` - 队列项仓库
    ///
    /// # 返回值
    ///
    /// * `Ok(SessionRuntime)` - 运行时实例
    /// * `Err(SessionError::InvalidConfig)` - 排除规则无法编译
    pub fn new(
        session: CrawlSession,
        max_retries: i32,
        event_buffer: usize,
        sessions: Arc<dyn SessionRepository>,
        queue_items: Arc<dyn QueueItemRepository>,
    ) -> Result<Self, SessionError> {
        let queue = QueueStore::new(session.id, &session.config, max_retries)
            .map_err(SessionError::InvalidConfig)?;
        let (events, _) = broadcast::channel(event_buffer.max(1));
        let (status, _) = watch::channel(session.status);

        Ok(Self {
            session_id: session.id,
            state: Mutex::new(RuntimeState { session, queue }),
            cancel_requested: AtomicBool::new(false),
            events,
            status,
            sessions,
            queue_items,
        })
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// 当前会话快照
    pub async fn snapshot(&self) -> CrawlSession {
        self.state.lock().await.session.clone()
    }

    /// 是否已请求取消
    pub fn is_cancel_requested(&self) -> bool {
        self.cancel_requested.load(Ordering::SeqCst)
    }

    /// 订阅会话事件
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// 等待会话进入终态并返回最终快照
    pub async fn wait_finished(&self) -> CrawlSession {
        let mut rx = self.status.subscribe();
        // The sender lives as long as self, so wait_for only fails if self is dropped
        let _ = rx.wait_for(|status| status.is_terminal()).await;
        self.snapshot().await
    }

    /// 处理中的队列项数量
    pub async fn in_flight(&self) -> usize {
        self.state.lock().await.queue.in_flight()
    }

    /// 所有队列项（含终态）
    pub async fn queue_items(&self) -> Vec<QueueItem> {
        self.state.lock().await.queue.items()
    }

    /// 启动会话：以深度0入队根URL并进入 running
    ///
    /// # 返回值
    ///
    /// * `Ok(CrawlSession)` - 启动后的会话
    /// * `Err(SessionError::AlreadyStarted)` - 会话不处于 pending
    pub async fn start(&self, root_url: &Url) -> Result<CrawlSession, SessionError> {
        let mut state = self.state.lock().await;
        if state.session.status != SessionStatus::Pending {
            return Err(SessionError::AlreadyStarted);
        }

        self.transition(&mut state, SessionStatus::Running);
        self.publish(&state.session, SessionEventKind::StatusChanged);

        let seeded = match state.queue.enqueue(root_url.as_str(), 0, None) {
            EnqueueOutcome::Accepted(item) => {
                info!(session_id = %self.session_id, url = %item.url, "Session seeded");
                Some(item)
            }
            EnqueueOutcome::Rejected(reason) => {
                warn!(session_id = %self.session_id, url = %root_url, ?reason, "Root URL rejected by config");
                None
            }
        };

        self.refresh_total(&mut state);
        let finished = self.observe(&mut state);

        if let Some(item) = &seeded {
            self.store_item(item, true).await;
        }
        self.store_state(&state, finished).await;
        Ok(state.session.clone())
    }

    /// 种子阶段的致命错误：pending → running → failed
    pub async fn fail_seed(&self, message: &str) -> Result<CrawlSession, SessionError> {
        let mut state = self.state.lock().await;
        if state.session.status != SessionStatus::Pending {
            return Err(SessionError::AlreadyStarted);
        }

        self.transition(&mut state, SessionStatus::Running);
        self.publish(&state.session, SessionEventKind::StatusChanged);
        error!(session_id = %self.session_id, "Fatal seed error: {}", message);
        state.session.error_message = Some(message.to_string());
        self.finish(&mut state, SessionStatus::Failed);
        self.store_session(&state.session).await;
        Ok(state.session.clone())
    }

    /// 领取下一个队列项
    ///
    /// 队列已耗尽或已请求取消时，在返回 `Finished` 之前完成终态判定，
    /// 因此所有工作器退出时会话一定已经进入终态。
    pub async fn claim(&self) -> Result<Claim, SessionError> {
        let mut state = self.state.lock().await;
        if state.session.status != SessionStatus::Running {
            return Ok(Claim::Finished);
        }

        if !self.is_cancel_requested() {
            if let Some(item) = state.queue.claim() {
                self.store_item(&item, false).await;
                return Ok(Claim::Item(item));
            }
            if !state.queue.is_drained() {
                return Ok(Claim::Empty);
            }
        }

        if self.observe(&mut state) {
            self.store_state(&state, true).await;
        }
        Ok(Claim::Finished)
    }

    /// 完成队列项，并在同一临界区内入队新发现的内部链接
    ///
    /// 内存状态先行更新并完成终态判定，随后才写穿到仓库。
    ///
    /// # 参数
    ///
    /// * `item_id` - 处理中的队列项
    /// * `links` - 新发现的内部链接，深度为当前项深度加一
    ///
    /// # 返回值
    ///
    /// * `Ok(usize)` - 被接受入队的链接数
    /// * `Err(SessionError::Queue)` - 队列项未知或不处于 processing
    pub async fn complete(&self, item_id: Uuid, links: &[String]) -> Result<usize, SessionError> {
        let mut state = self.state.lock().await;
        let (depth, status) = state
            .queue
            .get(item_id)
            .map(|item| (item.depth, item.status))
            .ok_or(QueueError::UnknownItem(item_id))?;
        if status != QueueItemStatus::Processing {
            return Err(QueueError::InvalidTransition {
                id: item_id,
                from: status,
            }
            .into());
        }

        let mut accepted = Vec::new();
        if !self.is_cancel_requested() && state.session.status == SessionStatus::Running {
            for link in links {
                if let EnqueueOutcome::Accepted(item) =
                    state.queue.enqueue(link, depth + 1, Some(item_id))
                {
                    accepted.push(item);
                }
            }
        }

        let item = state.queue.complete(item_id)?;
        state.session.crawled_urls = state.queue.completed_count();
        state.session.updated_at = Utc::now();
        self.refresh_total(&mut state);
        debug!(
            session_id = %self.session_id,
            crawled = state.session.crawled_urls,
            accepted = accepted.len(),
            "Queue item completed"
        );

        self.publish(&state.session, SessionEventKind::CountersChanged);
        let finished = self.observe(&mut state);

        for new_item in &accepted {
            self.store_item(new_item, true).await;
        }
        self.store_item(&item, false).await;
        self.store_state(&state, finished).await;
        Ok(accepted.len())
    }

    /// 队列项处理失败
    ///
    /// 重试预算内回到 pending；否则永久失败并计入 `failed_urls`。
    /// 根URL永久失败是致命错误，会话转为 failed。
    pub async fn fail(
        &self,
        item_id: Uuid,
        retryable: bool,
        reason: &str,
    ) -> Result<FailOutcome, SessionError> {
        let mut state = self.state.lock().await;
        let outcome = state.queue.fail(item_id, retryable)?;
        let mut finished = false;

        match &outcome {
            FailOutcome::Retried(item) => {
                debug!(session_id = %self.session_id, url = %item.url, attempt = item.attempt_count, "Queue item will be retried");
            }
            FailOutcome::Failed(item) => {
                state.session.failed_urls = state.queue.failed_count();
                state.session.updated_at = Utc::now();
                warn!(session_id = %self.session_id, url = %item.url, "Queue item failed permanently: {}", reason);

                if item.depth == 0 && state.session.status == SessionStatus::Running {
                    let message = format!("Root URL {} could not be fetched: {}", item.url, reason);
                    error!(session_id = %self.session_id, "{}", message);
                    state.session.error_message = Some(message);
                    state.queue.abandon_pending();
                    self.finish(&mut state, SessionStatus::Failed);
                    finished = true;
                } else {
                    self.refresh_total(&mut state);
                    self.publish(&state.session, SessionEventKind::CountersChanged);
                }
            }
        }
        finished |= self.observe(&mut state);

        let item = match &outcome {
            FailOutcome::Retried(item) | FailOutcome::Failed(item) => item,
        };
        self.store_item(item, false).await;
        self.store_state(&state, finished).await;
        Ok(outcome)
    }

    /// 请求停止
    ///
    /// 已领取的项继续完成，不再领取新项；没有处理中的项时立即进入 cancelled。
    ///
    /// # 返回值
    ///
    /// * `Ok(CrawlSession)` - 当前会话（终态会话直接返回）
    /// * `Err(SessionError::InvalidState)` - 会话尚未启动
    pub async fn request_stop(&self) -> Result<CrawlSession, SessionError> {
        let mut state = self.state.lock().await;
        match state.session.status {
            SessionStatus::Pending => {
                return Err(SessionError::InvalidState(
                    "session has not been started".to_string(),
                ))
            }
            status if status.is_terminal() => return Ok(state.session.clone()),
            _ => {}
        }

        if !self.cancel_requested.swap(true, Ordering::SeqCst) {
            info!(
                session_id = %self.session_id,
                in_flight = state.queue.in_flight(),
                "Stop requested"
            );
        }
        let finished = self.observe(&mut state);
        self.store_state(&state, finished).await;
        Ok(state.session.clone())
    }

    /// 在锁内判定会话是否结束
    ///
    /// # 返回值
    ///
    /// 本次调用使会话进入终态时返回 `true`
    fn observe(&self, state: &mut RuntimeState) -> bool {
        if state.session.status != SessionStatus::Running {
            return false;
        }

        if self.is_cancel_requested() {
            if state.queue.in_flight() > 0 {
                return false;
            }
            let abandoned = state.queue.abandon_pending();
            info!(session_id = %self.session_id, abandoned = abandoned.len(), "Session cancelled");
            self.finish(state, SessionStatus::Cancelled);
            true
        } else if state.queue.is_drained() {
            info!(
                session_id = %self.session_id,
                crawled = state.session.crawled_urls,
                failed = state.session.failed_urls,
                "Session completed"
            );
            self.finish(state, SessionStatus::Completed);
            true
        } else {
            false
        }
    }

    /// 前沿关闭后 `total_urls` 变为已知，此后跟踪已完成数加未完成数
    fn refresh_total(&self, state: &mut RuntimeState) {
        if state.session.total_urls.is_some() || state.queue.frontier_closed() {
            state.session.total_urls =
                Some(state.queue.completed_count() + state.queue.outstanding());
        }
    }

    fn finish(&self, state: &mut RuntimeState, status: SessionStatus) {
        state.session.total_urls = Some(state.session.crawled_urls);
        state.session.completed_at = Some(Utc::now());
        self.transition(state, status);
        metrics::counter!(SESSIONS_TOTAL, "status" => status.to_string()).increment(1);
        self.publish(&state.session, SessionEventKind::StatusChanged);
    }

    fn transition(&self, state: &mut RuntimeState, next: SessionStatus) {
        let current = state.session.status;
        if !current.can_transition_to(next) {
            // Callers check the current status first, so this is a programming error
            error!(session_id = %self.session_id, %current, %next, "Rejected session transition");
            return;
        }
        state.session.status = next;
        state.session.updated_at = Utc::now();
        self.status.send_replace(next);
    }

    fn publish(&self, session: &CrawlSession, kind: SessionEventKind) {
        // No subscribers is not an error
        let _ = self
            .events
            .send(SessionEvent::from_session(kind, session));
    }

    /// 写穿队列项
    ///
    /// 内存队列是权威副本，写入失败只记录日志，不回滚也不中断状态推进。
    async fn store_item(&self, item: &QueueItem, is_new: bool) {
        let result = if is_new {
            self.queue_items.insert(item).await
        } else {
            self.queue_items.update(item).await
        };
        if let Err(e) = result {
            error!(
                session_id = %self.session_id,
                item_id = %item.id,
                url = %item.url,
                status = %item.status,
                "Failed to persist queue item: {}",
                e
            );
        }
    }

    async fn store_session(&self, session: &CrawlSession) {
        if let Err(e) = self.sessions.update(session).await {
            error!(
                session_id = %self.session_id,
                status = %session.status,
                "Failed to persist session: {}",
                e
            );
        }
    }

    /// 写穿会话行；刚进入 cancelled 或 failed 时同时作废剩余 pending 行
    async fn store_state(&self, state: &RuntimeState, finished: bool) {
        let abandoned = matches!(
            state.session.status,
            SessionStatus::Cancelled | SessionStatus::Failed
        );
        if finished && abandoned {
            if let Err(e) = self.queue_items.cancel_pending(self.session_id).await {
                error!(session_id = %self.session_id, "Failed to cancel pending queue items: {}", e);
            }
        }
        self.store_session(&state.session).await;
    }
}
