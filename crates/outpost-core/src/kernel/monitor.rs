use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tokio::task::JoinHandle;
use tokio_stream::StreamExt;

use crate::kernel::restart::ProcessRestarter;
use crate::transport::StatusStream;

/// Restarts the process the first time the server goes offline after the
/// node reached Serving.
///
/// Transitions seen before [`arm`](Self::arm) or after
/// [`disarm`](Self::disarm) are ignored, and the restarter is invoked at most
/// once for the lifetime of the monitor.
pub struct ConnectivityMonitor {
    restarter: Arc<dyn ProcessRestarter>,
    armed: AtomicBool,
    restart_requested: AtomicBool,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl ConnectivityMonitor {
    pub fn new(restarter: Arc<dyn ProcessRestarter>) -> Self {
        Self {
            restarter,
            armed: AtomicBool::new(false),
            restart_requested: AtomicBool::new(false),
            task: Mutex::new(None),
        }
    }

    /// Start watching `status` for offline transitions.
    pub fn arm(self: &Arc<Self>, status: StatusStream) {
        if self.armed.swap(true, Ordering::SeqCst) {
            log::warn!("Connectivity monitor already armed");
            return;
        }
        let monitor = Arc::clone(self);
        let task = tokio::spawn(async move {
            let mut offline = status.filter(|online| !*online);
            while offline.next().await.is_some() {
                if monitor.handle_status(false) {
                    break;
                }
            }
        });
        *self.task.lock().unwrap_or_else(PoisonError::into_inner) = Some(task);
        log::info!("Connectivity monitor armed");
    }

    /// React to one status value. Returns true if this call triggered the restart.
    pub fn handle_status(&self, online: bool) -> bool {
        if online || !self.is_armed() {
            return false;
        }
        if self.restart_requested.swap(true, Ordering::SeqCst) {
            return false;
        }
        log::warn!("Lost connection to the server, restarting");
        self.restarter.restart_process();
        true
    }

    /// Stop watching; later transitions are ignored.
    pub fn disarm(&self) {
        self.armed.store(false, Ordering::SeqCst);
        if let Some(task) = self.task.lock().unwrap_or_else(PoisonError::into_inner).take() {
            task.abort();
            log::debug!("Connectivity monitor disarmed");
        }
    }

    pub fn is_armed(&self) -> bool {
        self.armed.load(Ordering::SeqCst)
    }

    pub fn restart_requested(&self) -> bool {
        self.restart_requested.load(Ordering::SeqCst)
    }
}

impl fmt::Debug for ConnectivityMonitor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectivityMonitor")
            .field("armed", &self.is_armed())
            .field("restart_requested", &self.restart_requested())
            .finish_non_exhaustive()
    }
}
