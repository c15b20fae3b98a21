// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::application::session_manager::WorkerLauncher;
use crate::application::session_runtime::SessionRuntime;
use crate::domain::models::project::Project;
use crate::workers::crawl_worker::{CrawlWorker, WorkerDeps};
use crate::workers::host_pacer::HostPacer;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::oneshot;
use tokio::task::{AbortHandle, JoinSet};
use tracing::{error, info};
use uuid::Uuid;

/// 工作器池
///
/// 为每个启动的会话拉起固定数量的 [`CrawlWorker`]。会话之间互不共享
/// 队列、节流器或取消标志，只共享无状态的抓取与分析依赖。
pub struct WorkerPool {
    deps: WorkerDeps,
    sessions: Arc<DashMap<Uuid, AbortHandle>>,
}

impl WorkerPool {
    /// 创建工作器池
    pub fn new(deps: WorkerDeps) -> Self {
        Self {
            deps,
            sessions: Arc::new(DashMap::new()),
        }
    }

    /// 仍有工作器在运行的会话数
    pub fn active_sessions(&self) -> usize {
        self.sessions.len()
    }

    /// 立即中止所有工作器
    ///
    /// 进程退出时使用；正常停止会话应通过会话管理器的 `stop`。
    pub fn shutdown(&self) {
        for entry in self.sessions.iter() {
            entry.value().abort();
        }
        self.sessions.clear();
        info!("Worker pool shut down");
    }
}

impl WorkerLauncher for WorkerPool {
    fn launch(&self, runtime: Arc<SessionRuntime>, project: Project) {
        let session_id = runtime.session_id();
        let deps = self.deps.clone();
        let sessions = self.sessions.clone();
        let worker_count = deps.settings.worker_count.max(1);
        let project_host = project.host().unwrap_or_default();

        let (registered_tx, registered_rx) = oneshot::channel::<()>();

        let supervisor = tokio::spawn(async move {
            // Wait for registration so the removal below can never precede the insert
            let _ = registered_rx.await;
            let config = runtime.snapshot().await.config;
            let pacer = Arc::new(HostPacer::new(config.delay_duration()));

            // Dropping the set aborts the workers, so aborting the supervisor stops them too
            let mut workers = JoinSet::new();
            for index in 0..worker_count {
                let worker = CrawlWorker::new(
                    index,
                    runtime.clone(),
                    deps.clone(),
                    pacer.clone(),
                    config.clone(),
                    project_host.clone(),
                );
                workers.spawn(worker.run());
            }
            info!(%session_id, worker_count, "Session workers started");

            while let Some(result) = workers.join_next().await {
                if let Err(e) = result {
                    if e.is_panic() {
                        error!(%session_id, "Crawl worker panicked: {}", e);
                    }
                }
            }

            sessions.remove(&session_id);
            let session = runtime.snapshot().await;
            info!(
                %session_id,
                status = %session.status,
                crawled = session.crawled_urls,
                failed = session.failed_urls,
                "Session workers exited"
            );
        });

        self.sessions.insert(session_id, supervisor.abort_handle());
        let _ = registered_tx.send(());
    }
}
