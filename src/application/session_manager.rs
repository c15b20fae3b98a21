// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::application::dto::query_request::ProgressDto;
use crate::application::errors::SessionError;
use crate::application::session_runtime::SessionRuntime;
use crate::config::settings::CrawlerSettings;
use crate::domain::models::event::SessionEvent;
use crate::domain::models::project::Project;
use crate::domain::models::session::{CrawlConfig, CrawlSession};
use crate::domain::repositories::project_repository::ProjectRepository;
use crate::domain::repositories::queue_item_repository::QueueItemRepository;
use crate::domain::repositories::session_repository::SessionRepository;
use crate::domain::services::progress_estimator;
use chrono::Utc;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// 工作器启动器
///
/// 会话启动后由会话管理器调用，为该会话拉起工作器池。
pub trait WorkerLauncher: Send + Sync {
    /// 为会话启动工作器
    ///
    /// # 参数
    ///
    /// * `runtime` - 会话运行时
    /// * `project` - 会话所属项目
    fn launch(&self, runtime: Arc<SessionRuntime>, project: Project);
}

/// 会话管理器
///
/// 持有未结束会话的运行时注册表。每个会话是独立的上下文，
/// 拥有自己的队列分区、计数器与取消标志。会话进入终态后运行时被移出
/// 注册表，之后的查询读取仓库中的会话行。
pub struct SessionManager {
    projects: Arc<dyn ProjectRepository>,
    sessions: Arc<dyn SessionRepository>,
    queue_items: Arc<dyn QueueItemRepository>,
    launcher: Arc<dyn WorkerLauncher>,
    settings: CrawlerSettings,
    runtimes: Arc<DashMap<Uuid, Arc<SessionRuntime>>>,
    create_lock: Mutex<()>,
}

impl SessionManager {
    /// 创建会话管理器
    pub fn new(
        projects: Arc<dyn ProjectRepository>,
        sessions: Arc<dyn SessionRepository>,
        queue_items: Arc<dyn QueueItemRepository>,
        launcher: Arc<dyn WorkerLauncher>,
        settings: CrawlerSettings,
    ) -> Self {
        Self {
            projects,
            sessions,
            queue_items,
            launcher,
            settings,
            runtimes: Arc::new(DashMap::new()),
            create_lock: Mutex::new(()),
        }
    }

    /// 创建会话
    ///
    /// # 参数
    ///
    /// * `project_id` - 项目ID
    /// * `config` - 爬取配置
    ///
    /// # 返回值
    ///
    /// * `Ok(CrawlSession)` - pending 状态的新会话
    /// * `Err(SessionError::InvalidConfig)` - 配置越界
    /// * `Err(SessionError::ProjectNotFound)` - 项目不存在
    /// * `Err(SessionError::Conflict)` - 项目已有活跃会话
    pub async fn create_session(
        &self,
        project_id: Uuid,
        config: CrawlConfig,
    ) -> Result<CrawlSession, SessionError> {
        config.validate().map_err(SessionError::InvalidConfig)?;

        // Serializes the active-session check with the insert
        let _guard = self.create_lock.lock().await;

        if self.projects.find_by_id(project_id).await?.is_none() {
            return Err(SessionError::ProjectNotFound);
        }
        if let Some(active) = self.sessions.find_active_by_project(project_id).await? {
            return Err(SessionError::Conflict(format!(
                "project {} already has an active session {}",
                project_id, active.id
            )));
        }

        let session = self
            .sessions
            .create(&CrawlSession::new(project_id, config))
            .await?;
        let runtime = SessionRuntime::new(
            session.clone(),
            self.settings.max_retries,
            self.settings.event_buffer,
            self.sessions.clone(),
            self.queue_items.clone(),
        )?;
        let runtime = Arc::new(runtime);
        self.runtimes.insert(session.id, runtime.clone());
        self.evict_when_finished(runtime);

        info!(session_id = %session.id, %project_id, "Session created");
        Ok(session)
    }

    /// 启动会话
    ///
    /// 以项目根URL为种子进入 running 并拉起工作器。项目域名无法构成URL时
    /// 会话转为 failed 并返回 `FatalSeed`。
    pub async fn start(&self, session_id: Uuid) -> Result<CrawlSession, SessionError> {
        let runtime = self.runtime(session_id)?;
        let session = runtime.snapshot().await;
        let project = self
            .projects
            .find_by_id(session.project_id)
            .await?
            .ok_or(SessionError::ProjectNotFound)?;

        let Some(root_url) = project.root_url() else {
            let message = format!("Project domain '{}' is not a valid URL", project.domain);
            runtime.fail_seed(&message).await?;
            return Err(SessionError::FatalSeed(format!(
                "session {}: {}",
                session_id, message
            )));
        };

        let session = runtime.start(&root_url).await?;
        if !session.status.is_terminal() {
            self.launcher.launch(runtime.clone(), project);
        }
        Ok(session)
    }

    /// 创建并立即启动会话
    pub async fn launch(
        &self,
        project_id: Uuid,
        config: CrawlConfig,
    ) -> Result<CrawlSession, SessionError> {
        let session = self.create_session(project_id, config).await?;
        self.start(session.id).await
    }

    /// 请求停止会话
    pub async fn stop(&self, session_id: Uuid) -> Result<CrawlSession, SessionError> {
        match self.runtimes.get(&session_id).map(|r| r.value().clone()) {
            Some(runtime) => runtime.request_stop().await,
            None => self.settled(session_id).await,
        }
    }

    /// 获取会话快照
    pub async fn get(&self, session_id: Uuid) -> Result<CrawlSession, SessionError> {
        if let Some(runtime) = self.runtimes.get(&session_id).map(|r| r.value().clone()) {
            return Ok(runtime.snapshot().await);
        }
        self.sessions
            .find_by_id(session_id)
            .await?
            .ok_or(SessionError::NotFound)
    }

    /// 获取会话进度
    pub async fn progress(&self, session_id: Uuid) -> Result<ProgressDto, SessionError> {
        let session = self.get(session_id).await?;
        let end = session.completed_at.unwrap_or_else(Utc::now);
        let progress = progress_estimator::estimate(
            session.crawled_urls,
            session.total_urls,
            session.started_at,
            end,
        );
        Ok(ProgressDto {
            session_id: session.id,
            status: session.status,
            crawled_urls: session.crawled_urls,
            failed_urls: session.failed_urls,
            total_urls: session.total_urls,
            progress,
        })
    }

    /// 订阅会话事件，同时返回订阅时刻的快照
    ///
    /// 已结束的会话返回仓库中的快照与一个已关闭的订阅。
    pub async fn subscribe(
        &self,
        session_id: Uuid,
    ) -> Result<(CrawlSession, broadcast::Receiver<SessionEvent>), SessionError> {
        if let Some(runtime) = self.runtimes.get(&session_id).map(|r| r.value().clone()) {
            // Subscribe first so no event between the two calls is lost
            let receiver = runtime.subscribe();
            return Ok((runtime.snapshot().await, receiver));
        }

        let session = self.settled(session_id).await?;
        let (_, receiver) = broadcast::channel(1);
        Ok((session, receiver))
    }

    /// 等待会话进入终态
    ///
    /// # 返回值
    ///
    /// * `Ok(CrawlSession)` - 终态快照
    /// * `Err(SessionError::NotFound)` - 会话不存在
    /// * `Err(SessionError::InvalidState)` - 会话未结束且不由本进程管理
    pub async fn wait_finished(&self, session_id: Uuid) -> Result<CrawlSession, SessionError> {
        match self.runtimes.get(&session_id).map(|r| r.value().clone()) {
            Some(runtime) => Ok(runtime.wait_finished().await),
            None => self.settled(session_id).await,
        }
    }

    /// 获取会话运行时
    ///
    /// 只有未结束的会话持有运行时。
    pub fn runtime(&self, session_id: Uuid) -> Result<Arc<SessionRuntime>, SessionError> {
        self.runtimes
            .get(&session_id)
            .map(|r| r.value().clone())
            .ok_or(SessionError::NotFound)
    }

    /// 注册表中的运行时数量
    pub fn tracked_sessions(&self) -> usize {
        self.runtimes.len()
    }

    /// 会话进入终态后把运行时移出注册表
    ///
    /// 移除前再写一次终态快照，运行时自身的写入失败只记日志。
    fn evict_when_finished(&self, runtime: Arc<SessionRuntime>) {
        let runtimes = self.runtimes.clone();
        let sessions = self.sessions.clone();
        tokio::spawn(async move {
            let session = runtime.wait_finished().await;
            if let Err(e) = sessions.update(&session).await {
                warn!(session_id = %session.id, "Failed to store final session state: {}", e);
            }
            runtimes.remove(&session.id);
            debug!(session_id = %session.id, status = %session.status, "Session runtime released");
        });
    }

    /// 仓库中已结束的会话
    async fn settled(&self, session_id: Uuid) -> Result<CrawlSession, SessionError> {
        let session = self
            .sessions
            .find_by_id(session_id)
            .await?
            .ok_or(SessionError::NotFound)?;
        if session.status.is_terminal() {
            Ok(session)
        } else {
            Err(SessionError::InvalidState(
                "session is not managed by this process".to_string(),
            ))
        }
    }
}
