use std::net::SocketAddr;
use std::sync::Arc;

use tokio::sync::{Mutex, watch};

use crate::config::ClientConfig;
use crate::kernel::constants;
use crate::kernel::error::{Error, Result};
use crate::kernel::monitor::ConnectivityMonitor;
use crate::kernel::phase::LifecyclePhase;
use crate::kernel::restart::ProcessRestarter;
use crate::plugin_system::{
    Partition, PhaseReport, PluginCatalog, PluginLifecycleError, PluginRegistry, PluginSupervisor,
};
use crate::resource::{FrontEnd, ResourceTree};
use crate::site::{SiteHandle, setup_site};
use crate::transport::{Transport, TransportError};
use crate::utils;

/// How a startup attempt ended.
#[derive(Debug)]
pub enum StartupOutcome {
    /// Every step succeeded and the connectivity monitor is armed
    Serving,
    /// A step failed; the error says which
    Failed(Error),
    /// A shutdown was requested before Serving was reached
    Cancelled,
}

impl StartupOutcome {
    pub fn is_serving(&self) -> bool {
        matches!(self, StartupOutcome::Serving)
    }
}

/// Errors collected by a best-effort shutdown.
#[derive(Debug, Default)]
pub struct ShutdownReport {
    pub errors: Vec<Error>,
}

impl ShutdownReport {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Runs the client node's startup and shutdown sequences.
///
/// Owns the plugin supervisor, the resource tree, the transport, the open
/// sites and the connectivity monitor. The phase only ever moves forward;
/// shutdown may be requested at any point through the watch channel passed
/// to [`new`](Self::new) and is honoured between steps.
pub struct Orchestrator {
    config: ClientConfig,
    supervisor: PluginSupervisor,
    transport: Arc<dyn Transport>,
    monitor: Arc<ConnectivityMonitor>,
    shutdown_rx: watch::Receiver<bool>,
    phase: LifecyclePhase,
    sites: Vec<SiteHandle>,
    plugins_torn_down: bool,
}

impl Orchestrator {
    /// Build the orchestrator and prepare the scratch directory.
    pub fn new(
        config: ClientConfig,
        catalog: PluginCatalog,
        transport: Arc<dyn Transport>,
        restarter: Arc<dyn ProcessRestarter>,
        shutdown_rx: watch::Receiver<bool>,
    ) -> Result<Self> {
        let plugin_set = config.plugin_set()?;
        let dir_mode = config.dir_mode()?;
        let tmp_path = config.paths.tmp_path.clone();
        utils::ensure_dir_with_mode(&tmp_path, dir_mode)
            .map_err(|e| Error::io(e, "create temp directory", &tmp_path))?;
        log::debug!("Using temp directory {} (mode {:o})", tmp_path.display(), dir_mode);

        let supervisor = PluginSupervisor::new(
            plugin_set,
            catalog,
            Arc::new(ResourceTree::new()),
            config.platform_settings(),
        );

        Ok(Self {
            config,
            supervisor,
            transport,
            monitor: Arc::new(ConnectivityMonitor::new(restarter)),
            shutdown_rx,
            phase: LifecyclePhase::Disconnected,
            sites: Vec::new(),
            plugins_torn_down: false,
        })
    }

    pub fn phase(&self) -> LifecyclePhase {
        self.phase
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn supervisor(&self) -> &PluginSupervisor {
        &self.supervisor
    }

    pub fn registry(&self) -> &Arc<Mutex<PluginRegistry>> {
        self.supervisor.registry()
    }

    pub fn resources(&self) -> &Arc<ResourceTree> {
        self.supervisor.resources()
    }

    pub fn monitor(&self) -> &Arc<ConnectivityMonitor> {
        &self.monitor
    }

    /// Bound addresses of the running front-ends, in bring-up order
    pub fn site_addrs(&self) -> Vec<(String, SocketAddr)> {
        self.sites
            .iter()
            .map(|site| (site.name().to_string(), site.local_addr()))
            .collect()
    }

    /// Run startup, wait for a shutdown request, then shut down.
    ///
    /// A failed startup leaves the node up in a degraded state until the
    /// request arrives; the startup error is returned after shutdown.
    pub async fn run(&mut self) -> Result<()> {
        let outcome = self.startup().await;
        if !matches!(outcome, StartupOutcome::Cancelled) {
            self.wait_for_shutdown_request().await;
        }
        let report = self.shutdown().await;
        if !report.is_clean() {
            log::warn!("Shutdown finished with {} error(s)", report.errors.len());
        }
        match outcome {
            StartupOutcome::Failed(e) => Err(e),
            StartupOutcome::Serving | StartupOutcome::Cancelled => Ok(()),
        }
    }

    /// Bring the node from Disconnected to Serving.
    pub async fn startup(&mut self) -> StartupOutcome {
        if self.phase != LifecyclePhase::Disconnected {
            return StartupOutcome::Failed(Error::KernelLifecycleError {
                phase: self.phase,
                message: "startup already ran".to_string(),
            });
        }
        log::info!("Starting {} v{}", constants::APP_NAME, constants::APP_VERSION);

        self.advance(LifecyclePhase::Connecting);
        if self.shutdown_requested() {
            return self.cancelled();
        }
        match self.connect().await {
            Ok(true) => {}
            Ok(false) => return self.cancelled(),
            Err(e) => {
                log::error!("{}", e);
                return StartupOutcome::Failed(e);
            }
        }

        // Core before optional, load before start
        let steps = [
            (LifecyclePhase::LoadingCore, Partition::Core),
            (LifecyclePhase::LoadingOptional, Partition::Optional),
            (LifecyclePhase::StartingCore, Partition::Core),
            (LifecyclePhase::StartingOptional, Partition::Optional),
        ];
        for (phase, partition) in steps {
            if self.shutdown_requested() {
                return self.cancelled();
            }
            self.advance(phase);
            let report = match phase {
                LifecyclePhase::LoadingCore | LifecyclePhase::LoadingOptional => {
                    self.supervisor.load_plugins(partition).await
                }
                _ => self.supervisor.start_plugins(partition).await,
            };
            if let Some(cause) = core_failure(report) {
                return self.rollback(cause).await;
            }
        }

        if self.shutdown_requested() {
            return self.cancelled();
        }
        if let Err(e) = self.bring_up_front_ends().await {
            log::error!("Front-end bring-up failed: {}", e);
            return self.abandon_startup(e).await;
        }

        // Subscribe before checking so a drop after the check is still seen
        let peer = self.config.server.peer_name.clone();
        let status = self.transport.subscribe_status(&peer);
        if !self.transport.is_online(&peer) {
            let e = Error::Connect(TransportError::NotConnected(peer));
            log::error!("Server session lost during startup: {}", e);
            return self.abandon_startup(e).await;
        }

        self.advance(LifecyclePhase::Serving);
        self.monitor.arm(status);
        log::info!(
            "{} is running, version={}",
            constants::APP_NAME,
            self.config.platform_version
        );
        StartupOutcome::Serving
    }

    /// Tear down whatever startup reached, in reverse. Calling it again is a no-op.
    pub async fn shutdown(&mut self) -> ShutdownReport {
        let mut report = ShutdownReport::default();
        if self.phase == LifecyclePhase::Unloaded {
            log::debug!("Shutdown already complete");
            return report;
        }
        let reached = self.phase;
        log::info!("Shutting down {} from {}", constants::APP_NAME, reached);
        self.advance(LifecyclePhase::ShuttingDown);
        self.monitor.disarm();

        // Front-ends first, mirror image of bring-up
        report.errors.extend(self.close_sites().await);

        if reached.reached_plugins() {
            report.errors.extend(self.teardown_plugins().await);
        }

        if reached >= LifecyclePhase::Connecting {
            self.transport.shutdown().await;
        }

        self.advance(LifecyclePhase::Unloaded);
        log::info!("{} shut down", constants::APP_NAME);
        report
    }

    /// Move forward to `to`. Moving backwards is ignored.
    fn advance(&mut self, to: LifecyclePhase) {
        if to > self.phase {
            log::info!("Lifecycle phase {} -> {}", self.phase, to);
            self.phase = to;
        } else {
            log::debug!("Ignoring phase change {} -> {}", self.phase, to);
        }
    }

    fn shutdown_requested(&self) -> bool {
        *self.shutdown_rx.borrow()
    }

    fn cancelled(&self) -> StartupOutcome {
        log::info!("Startup cancelled during {}", self.phase);
        StartupOutcome::Cancelled
    }

    async fn wait_for_shutdown_request(&self) {
        let mut rx = self.shutdown_rx.clone();
        if rx.wait_for(|requested| *requested).await.is_err() {
            log::debug!("Shutdown channel closed, shutting down");
        }
    }

    /// One connect attempt bounded by the configured timeout. `Ok(false)`
    /// means a shutdown request abandoned the attempt.
    async fn connect(&self) -> Result<bool> {
        let server = &self.config.server;
        let after = self.config.connect_timeout();
        let mut shutdown_rx = self.shutdown_rx.clone();

        tokio::select! {
            result = tokio::time::timeout(
                after,
                self.transport.connect(&server.peer_name, &server.host, server.transport_port),
            ) => match result {
                Ok(Ok(())) => Ok(true),
                Ok(Err(e)) => Err(Error::Connect(e)),
                Err(_) => Err(Error::Connect(TransportError::Timeout {
                    peer: server.peer_name.clone(),
                    after,
                })),
            },
            _ = shutdown_signalled(&mut shutdown_rx) => Ok(false),
        }
    }

    async fn rollback(&mut self, cause: PluginLifecycleError) -> StartupOutcome {
        log::error!("Core {}, rolling back", cause);
        self.abandon_startup(Error::CorePluginFailed(cause)).await
    }

    /// Degraded state after a failed startup: no front-ends, no plugins, the
    /// transport stays up until shutdown.
    async fn abandon_startup(&mut self, error: Error) -> StartupOutcome {
        self.advance(LifecyclePhase::ShuttingDown);
        for e in self.close_sites().await {
            log::warn!("Rollback: {}", e);
        }
        for e in self.teardown_plugins().await {
            log::warn!("Rollback: {}", e);
        }
        StartupOutcome::Failed(error)
    }

    /// Close every open front-end and detach the transport endpoints.
    async fn close_sites(&mut self) -> Vec<Error> {
        let mut errors = Vec::new();
        while let Some(site) = self.sites.pop() {
            if let Err(e) = site.close().await {
                log::error!("{}", e);
                errors.push(e.into());
            }
        }
        for front_end in [FrontEnd::Mobile, FrontEnd::Desktop] {
            self.resources()
                .root(front_end)
                .delete_child(constants::TRANSPORT_RESOURCE_NAME);
        }
        errors
    }

    async fn teardown_plugins(&mut self) -> Vec<Error> {
        if self.plugins_torn_down {
            return Vec::new();
        }
        self.plugins_torn_down = true;

        let mut errors = Vec::new();
        let reports = [
            self.supervisor.stop_plugins(Partition::Optional).await,
            self.supervisor.stop_plugins(Partition::Core).await,
            self.supervisor.unload_plugins(Partition::Optional).await,
            self.supervisor.unload_plugins(Partition::Core).await,
        ];
        for report in reports {
            errors.extend(report.failures.into_iter().map(Error::Plugin));
        }
        errors
    }

    async fn bring_up_front_ends(&mut self) -> Result<()> {
        let resources = Arc::clone(self.resources());
        let options = self.config.site_options();
        let ports = self.config.sites.clone();
        let endpoint = constants::TRANSPORT_RESOURCE_NAME;

        self.transport.create_server(endpoint, resources.root(FrontEnd::Mobile))?;
        let mobile = setup_site(
            "Outpost Mobile Site",
            Arc::clone(resources.root(FrontEnd::Mobile)),
            ports.mobile_port,
            &options,
        )
        .await?;
        self.sites.push(mobile);

        self.transport.create_server(endpoint, resources.root(FrontEnd::Desktop))?;
        let desktop = setup_site(
            "Outpost Desktop Site",
            Arc::clone(resources.root(FrontEnd::Desktop)),
            ports.desktop_port,
            &options,
        )
        .await?;
        self.sites.push(desktop);

        let doc = setup_site(
            "Outpost Documentation Site",
            Arc::clone(resources.root(FrontEnd::Doc)),
            ports.doc_port,
            &options,
        )
        .await?;
        self.sites.push(doc);

        let websocket = self
            .transport
            .create_websocket_server("Outpost WebSocket", ports.websocket_port, &options)
            .await?;
        self.sites.push(websocket);
        Ok(())
    }
}

/// The first failure of a core report; optional failures are only logged.
fn core_failure(report: PhaseReport) -> Option<PluginLifecycleError> {
    if report.is_clean() {
        return None;
    }
    match report.partition {
        Partition::Core => report.failures.into_iter().next(),
        Partition::Optional => {
            log::warn!(
                "{} optional plugin(s) failed to {}, continuing",
                report.failures.len(),
                report.phase
            );
            None
        }
    }
}

/// Resolves once a shutdown is requested; pends forever if the sender is gone.
async fn shutdown_signalled(rx: &mut watch::Receiver<bool>) {
    if rx.wait_for(|requested| *requested).await.is_err() {
        std::future::pending::<()>().await;
    }
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("phase", &self.phase)
            .field("sites", &self.site_addrs())
            .field("monitor", &self.monitor)
            .finish_non_exhaustive()
    }
}
