// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The supervisor: composes a message bus, health monitor, quota probe,
//! and a fleet of daemons behind the process table. Owns admission,
//! crash recovery, scaling, config reload, and bus routing.

use crate::process_table::{PromoteRequest, PromotionQueue};
use crate::status::{AgentStatus, StatusSnapshot};
use crate::{admission, crash};
use actl_adapters::{IdentityProvider, WorkspaceProvisioner};
use actl_bus::MessageBus;
use actl_core::{
    BusMessage, Clock, Config, DaemonEvent, DaemonState, Envelope, Role, SupervisorError, Target,
    Task,
};
use actl_daemon::{Daemon, Executor};
use actl_health::HealthMonitor;
use actl_quota::{QuotaProbe, UsageReport};
use indexmap::IndexMap;
use parking_lot::Mutex;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// The identity the supervisor itself connects to the bus under, to
/// receive routed `TASK_AVAILABLE`/`ASSIGN` traffic for its fleet.
pub const SUPERVISOR_AGENT_ID: &str = "supervisor";

struct SupervisorState<E: Executor, C: Clock> {
    process_table: IndexMap<String, crate::process_table::ProcessEntry<E, C>>,
    promotion_queue: PromotionQueue,
    /// Tasks announced by `broadcastTask` still awaiting a claim, so the
    /// first `CLAIM` back can be turned into a targeted `ASSIGN`.
    pending_tasks: Vec<Task>,
    active_count: usize,
    promotions_paused: bool,
    tokens_used: u64,
    running: bool,
    next_index: usize,
}

impl<E: Executor, C: Clock> Default for SupervisorState<E, C> {
    fn default() -> Self {
        Self {
            process_table: IndexMap::new(),
            promotion_queue: PromotionQueue::new(),
            pending_tasks: Vec::new(),
            active_count: 0,
            promotions_paused: false,
            tokens_used: 0,
            running: false,
            next_index: 0,
        }
    }
}

/// A scale operation's result, per spec section 4.E: `{from, to, added,
/// removed}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScaleResult {
    pub from: usize,
    pub to: usize,
    pub added: usize,
    pub removed: usize,
}

/// A partial config update, per spec section 4.E's
/// `reloadConfig({maxActive?, tokenBudget?, heartbeatIntervalMs?})`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConfigReload {
    pub max_active: Option<usize>,
    pub token_budget: Option<u64>,
    pub heartbeat_interval_ms: Option<u64>,
}

/// Composes the bus, health monitor, quota probe, and a fleet of daemons.
/// Generic over the executor (real subprocess or a fake for tests) and
/// the clock (real or fake), matching `actl-daemon`'s own generics.
pub struct Supervisor<E: Executor + Clone, C: Clock> {
    config: Mutex<Config>,
    state: Mutex<SupervisorState<E, C>>,
    bus: Arc<dyn MessageBus>,
    identity: Arc<dyn IdentityProvider>,
    workspace: Arc<dyn WorkspaceProvisioner>,
    health: Arc<HealthMonitor<C>>,
    quota: Mutex<Option<Arc<QuotaProbe>>>,
    clock: C,
    executor: E,
    pidfile: crate::pidfile::Pidfile,
    event_tx: mpsc::Sender<DaemonEvent>,
    event_rx: Mutex<Option<mpsc::Receiver<DaemonEvent>>>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
    started_at: Mutex<Option<Instant>>,
}

impl<E: Executor + Clone, C: Clock> Supervisor<E, C> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: Config,
        bus: Arc<dyn MessageBus>,
        identity: Arc<dyn IdentityProvider>,
        workspace: Arc<dyn WorkspaceProvisioner>,
        clock: C,
        executor: E,
    ) -> Arc<Self> {
        let health = Arc::new(HealthMonitor::new(
            clock.clone(),
            Duration::from_millis(config.heartbeat_interval_ms),
            config.miss_threshold,
            config.memory_limit_mb,
            config.cpu_limit_pct,
        ));
        let pidfile = crate::pidfile::Pidfile::new(config.pidfile.clone());
        let (event_tx, event_rx) = mpsc::channel(1024);
        Arc::new(Self {
            config: Mutex::new(config),
            state: Mutex::new(SupervisorState::default()),
            bus,
            identity,
            workspace,
            health,
            quota: Mutex::new(None),
            clock,
            executor,
            pidfile,
            event_tx,
            event_rx: Mutex::new(Some(event_rx)),
            tasks: Mutex::new(Vec::new()),
            started_at: Mutex::new(None),
        })
    }

    /// Attach a quota probe. Supervisor section 4.E: on `budget_exhausted`
    /// the supervisor pauses promotions; `budget_warning`/`usage` are
    /// logged only.
    pub fn attach_quota(&self, probe: Arc<QuotaProbe>) {
        *self.quota.lock() = Some(probe);
    }

    pub fn is_running(&self) -> bool {
        self.state.lock().running
    }

    fn primary_channel(&self) -> String {
        self.config
            .lock()
            .channels
            .first()
            .cloned()
            .unwrap_or_else(|| "agents".to_string())
    }

    // ---- lifecycle --------------------------------------------------

    /// Spec section 4.E `start()`.
    pub async fn start(self: &Arc<Self>) -> Result<(), SupervisorError> {
        {
            let state = self.state.lock();
            if state.running {
                return Err(SupervisorError::AlreadyRunning(
                    self.pidfile.path().to_path_buf(),
                ));
            }
        }
        self.pidfile.acquire(std::process::id())?;

        let log_dir = self.config.lock().log_dir.clone();
        if let Err(error) = std::fs::create_dir_all(&log_dir) {
            tracing::warn!(%error, path = %log_dir.display(), "failed to create log directory");
        }

        let channels = self.config.lock().channels.clone();
        let (inbound_tx, inbound_rx) = mpsc::channel(1024);
        match self.bus.connect(SUPERVISOR_AGENT_ID, inbound_tx).await {
            Ok(()) => {
                for channel in &channels {
                    if let Err(error) = self.bus.join(SUPERVISOR_AGENT_ID, channel).await {
                        tracing::warn!(%error, %channel, "bus_join_failed");
                    }
                }
                let handle = self.spawn_bus_reader(inbound_rx);
                self.tasks.lock().push(handle);
            }
            Err(error) => {
                tracing::warn!(%error, event = "bus_connect_failed", "continuing without bus");
            }
        }

        let count = self.config.lock().count;
        for _ in 0..count {
            self.spawn_new_daemon().await;
        }

        let event_rx = self.event_rx.lock().take().ok_or_else(|| {
            SupervisorError::AlreadyRunning(self.pidfile.path().to_path_buf())
        })?;
        let mut tasks = self.tasks.lock();
        tasks.push(self.spawn_dispatcher(event_rx));
        tasks.push(self.spawn_heartbeat_ticker());
        tasks.push(self.spawn_health_ticker());
        tasks.push(self.spawn_task_watchdog());
        drop(tasks);

        {
            let mut state = self.state.lock();
            state.running = true;
        }
        *self.started_at.lock() = Some(self.clock.now());
        tracing::info!(event = "started", count, "supervisor started");
        Ok(())
    }

    /// Spec section 4.E `stop()`. A no-op if not running.
    pub async fn stop(self: &Arc<Self>) {
        let was_running = {
            let mut state = self.state.lock();
            let was = state.running;
            state.running = false;
            was
        };
        if !was_running {
            return;
        }

        let _ = self.bus.disconnect(SUPERVISOR_AGENT_ID).await;

        for handle in self.tasks.lock().drain(..) {
            handle.abort();
        }

        let daemons: Vec<_> = {
            self.state
                .lock()
                .process_table
                .values()
                .map(|e| Arc::clone(&e.daemon))
                .collect()
        };
        for daemon in &daemons {
            daemon.terminate_executor();
        }
        let shutdown_timeout = Duration::from_millis(self.config.lock().shutdown_timeout_ms);
        let _ = tokio::time::timeout(shutdown_timeout, wait_all_idle(daemons)).await;

        let persist = self.config.lock().persist;
        {
            let mut state = self.state.lock();
            for (agent_id, entry) in state.process_table.drain(..) {
                self.health.unregister(&agent_id);
                if !persist {
                    if let Err(error) = self.workspace.teardown(&entry.workdir) {
                        tracing::warn!(%error, %agent_id, "failed to tear down workspace");
                    }
                }
            }
            state.promotion_queue.clear();
            state.pending_tasks.clear();
            state.active_count = 0;
        }
        self.pidfile.release(std::process::id());
        tracing::info!(event = "stopped");
    }

    // ---- fleet management --------------------------------------------

    async fn spawn_new_daemon(&self) {
        let role_str = self.config.lock().role.clone();
        let index = {
            let mut state = self.state.lock();
            let i = state.next_index;
            state.next_index += 1;
            i
        };
        let name = format!("swarm-{role_str}-{index:03}");
        self.materialize_daemon(name, role_str, 0, None).await;
    }

    /// Crash recovery's replacement spawn: reuses the crashed slot's name
    /// but mints a fresh identity and workspace, carrying forward the
    /// restart bookkeeping so backoff/degradation tracking survives.
    pub(crate) async fn spawn_replacement(
        &self,
        name: String,
        role_str: String,
        restart_count: u32,
        first_restart_at: Option<Instant>,
    ) -> String {
        self.materialize_daemon(name, role_str, restart_count, first_restart_at)
            .await
    }

    /// Mint an identity, provision a workspace, build the daemon, and
    /// insert it into the process table under `name`. Shared by initial
    /// spawn, scale-up, and crash-recovery replacement — only the restart
    /// bookkeeping they carry forward differs.
    async fn materialize_daemon(
        &self,
        name: String,
        role_str: String,
        restart_count: u32,
        first_restart_at: Option<Instant>,
    ) -> String {
        let executor_command = self.config.lock().executor_command.clone();
        let identity = self.identity.mint();
        let workdir = self.workspace.provision(&name).unwrap_or_else(|error| {
            tracing::warn!(%error, %name, "failed to provision workspace");
            std::env::temp_dir().join(&name)
        });
        let role = Role::new(role_str);
        let daemon = Arc::new(Daemon::new(
            identity.agent_id.clone(),
            name,
            role,
            self.executor.clone(),
            self.clock.clone(),
            executor_command,
            workdir.clone(),
            self.event_tx.clone(),
        ));
        self.health.register(&identity.agent_id, None);

        let now = self.clock.now();
        let mut entry = crate::process_table::ProcessEntry::fresh(daemon, now, workdir);
        entry.restart_count = restart_count;
        entry.first_restart_at = first_restart_at;

        let agent_id = identity.agent_id;
        self.state.lock().process_table.insert(agent_id.clone(), entry);
        agent_id
    }

    /// Spec section 4.E `scale(target)`.
    pub async fn scale(self: &Arc<Self>, target: usize) -> Result<ScaleResult, SupervisorError> {
        if !self.is_running() {
            return Err(SupervisorError::NotRunning);
        }
        if target == 0 {
            let from = self.state.lock().process_table.len();
            self.stop().await;
            return Ok(ScaleResult {
                from,
                to: 0,
                added: 0,
                removed: from,
            });
        }

        let current = self.state.lock().process_table.len();
        if target > current {
            let to_add = target - current;
            for _ in 0..to_add {
                self.spawn_new_daemon().await;
            }
            tracing::info!(event = "scaled_up", from = current, to = target, "scaled up");
            return Ok(ScaleResult {
                from: current,
                to: current + to_add,
                added: to_add,
                removed: 0,
            });
        }
        if target < current {
            let to_remove = current - target;
            let mut idle_candidates: Vec<(String, Instant)> = {
                self.state
                    .lock()
                    .process_table
                    .iter()
                    .filter(|(_, e)| e.daemon.state() == DaemonState::Idle)
                    .map(|(id, e)| (id.clone(), e.stable_since))
                    .collect()
            };
            idle_candidates.sort_by_key(|(_, stable_since)| *stable_since);
            let remove_ids: Vec<String> = idle_candidates
                .into_iter()
                .take(to_remove)
                .map(|(id, _)| id)
                .collect();
            let removed = remove_ids.len();
            let persist = self.config.lock().persist;
            for agent_id in &remove_ids {
                let entry = self.state.lock().process_table.shift_remove(agent_id);
                if let Some(entry) = entry {
                    self.health.unregister(agent_id);
                    if !persist {
                        if let Err(error) = self.workspace.teardown(&entry.workdir) {
                            tracing::warn!(%error, %agent_id, "failed to tear down workspace");
                        }
                    }
                }
            }
            let to = self.state.lock().process_table.len();
            tracing::info!(event = "scaled_down", from = current, to, removed, "scaled down");
            return Ok(ScaleResult {
                from: current,
                to,
                added: 0,
                removed,
            });
        }
        Ok(ScaleResult {
            from: current,
            to: current,
            added: 0,
            removed: 0,
        })
    }

    /// Spec section 4.E `reloadConfig`.
    pub async fn reload_config(self: &Arc<Self>, patch: ConfigReload) -> Result<(), SupervisorError> {
        if patch.max_active == Some(0) {
            return Err(SupervisorError::InvalidConfig(
                "max_active must be greater than zero".to_string(),
            ));
        }
        if let Some(max_active) = patch.max_active {
            self.config.lock().max_active = max_active;
        }
        if let Some(heartbeat_interval_ms) = patch.heartbeat_interval_ms {
            self.config.lock().heartbeat_interval_ms = heartbeat_interval_ms;
            self.health
                .set_heartbeat_interval(Duration::from_millis(heartbeat_interval_ms));
        }
        if let Some(token_budget) = patch.token_budget {
            self.config.lock().token_budget = token_budget;
            if let Some(probe) = self.quota.lock().as_ref() {
                probe.set_budget(token_budget);
            }
            let tokens_used = self.state.lock().tokens_used;
            if token_budget > tokens_used {
                self.state.lock().promotions_paused = false;
            }
        }
        admission::process_promotion_queue(self).await;
        Ok(())
    }

    /// Spec section 4.E status snapshot.
    pub fn status(&self) -> StatusSnapshot {
        let state = self.state.lock();
        let uptime_ms = self
            .started_at
            .lock()
            .map(|started| {
                self.clock
                    .now()
                    .saturating_duration_since(started)
                    .as_millis() as u64
            })
            .unwrap_or(0);

        let mut agents = Vec::with_capacity(state.process_table.len());
        let (mut idle, mut active, mut promoting, mut crashed) = (0usize, 0usize, 0usize, 0usize);
        for entry in state.process_table.values() {
            let info = entry.daemon.info();
            match info.state {
                DaemonState::Idle => idle += 1,
                DaemonState::Active => active += 1,
                DaemonState::Promoting => promoting += 1,
                DaemonState::Crashed => crashed += 1,
                DaemonState::Demoting => {}
            }
            agents.push(AgentStatus {
                agent_id: info.agent_id,
                name: info.name,
                state: info.state,
                role: info.role,
                restart_count: entry.restart_count,
                current_task: info.current_task,
            });
        }

        StatusSnapshot {
            running: state.running,
            uptime_ms,
            total: state.process_table.len(),
            active,
            idle,
            promoting,
            crashed,
            promotions_paused: state.promotions_paused,
            queue_length: state.promotion_queue.len(),
            agents,
        }
    }

    // ---- task distribution --------------------------------------------

    /// Spec section 4.E `broadcastTask`: publish on the primary channel
    /// *and* deliver the same record locally (the bus suppresses a
    /// sender's own broadcasts from reaching it back).
    pub async fn broadcast_task(&self, task: Task) -> Result<(), SupervisorError> {
        let envelope = Envelope::TaskAvailable { task };
        let msg = BusMessage {
            from: SUPERVISOR_AGENT_ID.to_string(),
            to: Target::channel(self.primary_channel()),
            content: envelope.to_json(),
            ts: self.clock.epoch_ms(),
        };
        if let Envelope::TaskAvailable { task } = &envelope {
            self.state.lock().pending_tasks.push(task.clone());
        }
        if let Err(error) = self.bus.send(msg).await {
            tracing::warn!(%error, "bus send failed for broadcast_task");
        }
        self.deliver_locally(&envelope).await;
        Ok(())
    }

    /// Spec section 4.E `assignTask`.
    pub async fn assign_task(&self, agent_id: &str, task: Task) -> Result<(), SupervisorError> {
        let envelope = Envelope::Assign {
            agent_id: agent_id.to_string(),
            task,
        };
        let msg = BusMessage {
            from: SUPERVISOR_AGENT_ID.to_string(),
            to: Target::agent(agent_id),
            content: envelope.to_json(),
            ts: self.clock.epoch_ms(),
        };
        if let Err(error) = self.bus.send(msg).await {
            tracing::warn!(%error, "bus send failed for assign_task");
        }
        self.deliver_locally(&envelope).await;
        Ok(())
    }

    async fn deliver_locally(&self, envelope: &Envelope) {
        let daemons: Vec<_> = {
            self.state
                .lock()
                .process_table
                .values()
                .map(|e| Arc::clone(&e.daemon))
                .collect()
        };
        for daemon in daemons {
            daemon.handle_message(envelope.clone()).await;
        }
    }

    // ---- background tasks --------------------------------------------

    fn spawn_bus_reader(
        self: &Arc<Self>,
        mut inbound: mpsc::Receiver<BusMessage>,
    ) -> JoinHandle<()> {
        let sup = Arc::clone(self);
        tokio::spawn(async move {
            while let Some(msg) = inbound.recv().await {
                let Some(envelope) = Envelope::parse(&msg.content) else {
                    continue;
                };
                match envelope {
                    Envelope::TaskAvailable { .. } | Envelope::Assign { .. } => {
                        sup.deliver_locally(&envelope).await;
                    }
                    _ => {}
                }
            }
        })
    }

    fn spawn_dispatcher(
        self: &Arc<Self>,
        mut events: mpsc::Receiver<DaemonEvent>,
    ) -> JoinHandle<()> {
        let sup = Arc::clone(self);
        tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                sup.handle_daemon_event(event).await;
            }
        })
    }

    fn spawn_heartbeat_ticker(self: &Arc<Self>) -> JoinHandle<()> {
        let sup = Arc::clone(self);
        tokio::spawn(async move {
            loop {
                let interval_ms = sup.config.lock().heartbeat_interval_ms.max(1);
                tokio::time::sleep(Duration::from_millis(interval_ms)).await;
                if !sup.is_running() {
                    return;
                }
                let daemons: Vec<_> = {
                    sup.state
                        .lock()
                        .process_table
                        .values()
                        .map(|e| Arc::clone(&e.daemon))
                        .collect()
                };
                for daemon in daemons {
                    daemon.tick_heartbeat().await;
                }
            }
        })
    }

    /// Spec section 5: "An executor exceeding `maxTaskDurationMs` ... is
    /// terminated by the supervisor; the daemon treats the termination as
    /// a normal exit with a failure result." Polls at a fixed cadence
    /// independent of the heartbeat interval, since the watchdog window is
    /// its own, separately configured duration.
    fn spawn_task_watchdog(self: &Arc<Self>) -> JoinHandle<()> {
        const WATCHDOG_POLL: Duration = Duration::from_secs(1);
        let sup = Arc::clone(self);
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(WATCHDOG_POLL).await;
                if !sup.is_running() {
                    return;
                }
                let max_duration = Duration::from_millis(sup.config.lock().max_task_duration_ms);
                let daemons: Vec<_> = {
                    sup.state
                        .lock()
                        .process_table
                        .values()
                        .map(|e| Arc::clone(&e.daemon))
                        .collect()
                };
                for daemon in daemons {
                    if daemon.state() != DaemonState::Active {
                        continue;
                    }
                    if let Some(elapsed) = daemon.task_elapsed() {
                        if elapsed >= max_duration {
                            tracing::warn!(
                                agent_id = daemon.agent_id(),
                                event = "task_watchdog_timeout",
                                "terminating executor that exceeded max_task_duration_ms"
                            );
                            daemon.terminate_executor();
                        }
                    }
                }
            }
        })
    }

    fn spawn_health_ticker(self: &Arc<Self>) -> JoinHandle<()> {
        let sup = Arc::clone(self);
        tokio::spawn(async move {
            loop {
                let interval_ms = sup.config.lock().heartbeat_interval_ms.max(1);
                tokio::time::sleep(Duration::from_millis(interval_ms)).await;
                if !sup.is_running() {
                    return;
                }
                for alert in sup.health.check() {
                    sup.handle_health_alert(alert).await;
                }
            }
        })
    }

    async fn handle_health_alert(self: &Arc<Self>, alert: actl_core::HealthAlert) {
        match alert {
            actl_core::HealthAlert::Unresponsive { agent_id } => {
                crash::handle_crash(self, agent_id, "heartbeat timeout".to_string()).await;
            }
            actl_core::HealthAlert::MemoryLimit { agent_id, memory_mb } => {
                tracing::warn!(event = "memory_limit", %agent_id, memory_mb, "resource alert");
            }
            actl_core::HealthAlert::CpuLimit { agent_id, cpu_pct } => {
                tracing::warn!(event = "cpu_limit", %agent_id, cpu_pct, "resource alert");
            }
        }
    }

    async fn handle_daemon_event(self: &Arc<Self>, event: DaemonEvent) {
        match event {
            DaemonEvent::Started { .. } | DaemonEvent::Stopped { .. } => {}
            DaemonEvent::Heartbeat { agent_id } => {
                self.health.heartbeat(&agent_id);
            }
            DaemonEvent::Claim {
                agent_id,
                component,
                role,
            } => {
                let claimed_task = {
                    let mut state = self.state.lock();
                    let position = state
                        .pending_tasks
                        .iter()
                        .position(|task| task.component == component);
                    position.map(|i| state.pending_tasks.remove(i))
                };
                self.publish(Envelope::Claim {
                    agent_id: agent_id.clone(),
                    component,
                    role,
                })
                .await;
                if let Some(task) = claimed_task {
                    let _ = self.assign_task(&agent_id, task).await;
                }
            }
            DaemonEvent::PromoteRequest { agent_id, task } => {
                admission::handle_promote_request(self, PromoteRequest { agent_id, task }).await;
            }
            DaemonEvent::Promoted { agent_id, pid } => {
                self.state.lock().active_count += 1;
                self.health.update_pid(&agent_id, Some(pid as i32));
            }
            DaemonEvent::Unclaim { .. } => {}
            DaemonEvent::Output { .. } => {}
            DaemonEvent::Done {
                agent_id,
                task,
                output_len,
                duration_ms,
                ..
            } => {
                self.record_usage(&agent_id, output_len, duration_ms).await;
                self.publish(Envelope::TaskDone {
                    agent_id,
                    task,
                    success: true,
                })
                .await;
            }
            DaemonEvent::Fail {
                agent_id,
                task,
                error,
                output_len,
                duration_ms,
                ..
            } => {
                self.record_usage(&agent_id, output_len, duration_ms).await;
                self.publish(Envelope::TaskFail {
                    agent_id,
                    task,
                    error: error.unwrap_or_default(),
                })
                .await;
            }
            DaemonEvent::Demoted { agent_id } => {
                self.health.update_pid(&agent_id, None);
                {
                    let mut state = self.state.lock();
                    state.active_count = state.active_count.saturating_sub(1);
                }
                admission::process_promotion_queue(self).await;
            }
            DaemonEvent::Crashed { agent_id, error } => {
                crash::handle_crash(self, agent_id, error).await;
            }
            DaemonEvent::Error { agent_id, message } => {
                tracing::warn!(%agent_id, %message, "daemon reported an error");
            }
        }
    }

    async fn record_usage(&self, agent_id: &str, output_len: usize, duration_ms: u64) {
        let Some(probe) = self.quota.lock().clone() else {
            return;
        };
        let report = UsageReport {
            output_len: Some(output_len),
            duration_ms: Some(duration_ms),
            tokens: None,
        };
        let events = probe.record(agent_id, report, self.clock.now());
        let total = probe.total_tokens();
        self.state.lock().tokens_used = total;
        for event in events {
            match event {
                actl_core::QuotaEvent::Usage { .. } => {}
                actl_core::QuotaEvent::BudgetWarning { pct, .. } => {
                    tracing::warn!(event = "budget_warning", pct, "token budget warning");
                }
                actl_core::QuotaEvent::BudgetExhausted { total_tokens, budget } => {
                    self.state.lock().promotions_paused = true;
                    tracing::warn!(
                        event = "budget_exhausted",
                        total_tokens,
                        budget,
                        "token budget exhausted, pausing promotions"
                    );
                }
            }
        }
    }

    async fn publish(&self, envelope: Envelope) {
        let msg = BusMessage {
            from: SUPERVISOR_AGENT_ID.to_string(),
            to: Target::channel(self.primary_channel()),
            content: envelope.to_json(),
            ts: self.clock.epoch_ms(),
        };
        if let Err(error) = self.bus.send(msg).await {
            tracing::debug!(%error, "bus send failed (continuing without bus)");
        }
    }
}

/// Accessors the admission/crash modules need without exposing the
/// process table by reference (spec section 9).
impl<E: Executor + Clone, C: Clock> Supervisor<E, C> {
    pub(crate) fn config_snapshot(&self) -> Config {
        self.config.lock().clone()
    }

    pub(crate) fn daemon_for(&self, agent_id: &str) -> Option<Arc<Daemon<E, C>>> {
        self.state
            .lock()
            .process_table
            .get(agent_id)
            .map(|e| Arc::clone(&e.daemon))
    }

    pub(crate) fn clock(&self) -> &C {
        &self.clock
    }

    pub(crate) fn health(&self) -> &Arc<HealthMonitor<C>> {
        &self.health
    }

    pub(crate) fn workspace_provisioner(&self) -> &Arc<dyn WorkspaceProvisioner> {
        &self.workspace
    }

    pub(crate) fn with_state<R>(
        &self,
        f: impl FnOnce(&mut SupervisorStateHandle<'_, E, C>) -> R,
    ) -> R {
        let mut guard = self.state.lock();
        let mut handle = SupervisorStateHandle { inner: &mut guard };
        f(&mut handle)
    }
}

/// A narrow, locked view over the supervisor's serialized state, handed
/// to the admission and crash-recovery modules so they never see the
/// process table as a bare field.
pub(crate) struct SupervisorStateHandle<'a, E: Executor, C: Clock> {
    inner: &'a mut SupervisorState<E, C>,
}

impl<'a, E: Executor, C: Clock> SupervisorStateHandle<'a, E, C> {
    pub(crate) fn promotions_paused(&self) -> bool {
        self.inner.promotions_paused
    }

    pub(crate) fn set_promotions_paused(&mut self, paused: bool) {
        self.inner.promotions_paused = paused;
    }

    pub(crate) fn active_count(&self) -> usize {
        self.inner.active_count
    }

    pub(crate) fn tokens_used(&self) -> u64 {
        self.inner.tokens_used
    }

    pub(crate) fn enqueue_promotion(&mut self, req: PromoteRequest) {
        self.inner.promotion_queue.push_back(req);
    }

    pub(crate) fn pop_promotion(&mut self) -> Option<PromoteRequest> {
        self.inner.promotion_queue.pop_front()
    }

    pub(crate) fn daemon_state(&self, agent_id: &str) -> Option<DaemonState> {
        self.inner
            .process_table
            .get(agent_id)
            .map(|e| e.daemon.state())
    }

    pub(crate) fn restart_entry(
        &mut self,
        agent_id: &str,
    ) -> Option<&mut crate::process_table::ProcessEntry<E, C>> {
        self.inner.process_table.get_mut(agent_id)
    }

    pub(crate) fn remove(&mut self, agent_id: &str) -> Option<crate::process_table::ProcessEntry<E, C>> {
        self.inner.process_table.shift_remove(agent_id)
    }
}

async fn wait_all_idle<E: Executor, C: Clock>(daemons: Vec<Arc<Daemon<E, C>>>) {
    loop {
        let all_settled = daemons.iter().all(|d| {
            matches!(
                d.state(),
                DaemonState::Idle | DaemonState::Crashed
            )
        });
        if all_settled {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

#[cfg(test)]
#[path = "supervisor_tests.rs"]
mod tests;
