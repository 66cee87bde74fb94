/// Terminal action taken when the server connection is lost while serving.
pub trait ProcessRestarter: Send + Sync {
    /// Replace the running process. Implementations normally do not return.
    fn restart_process(&self);
}

/// Re-executes the current binary with the same arguments.
///
/// On Unix the process image is replaced in place; elsewhere a child is
/// spawned and the current process exits.
#[derive(Debug, Default, Clone, Copy)]
pub struct ReexecRestarter;

impl ReexecRestarter {
    pub fn new() -> Self {
        Self
    }
}

impl ProcessRestarter for ReexecRestarter {
    fn restart_process(&self) {
        let exe = match std::env::current_exe() {
            Ok(exe) => exe,
            Err(e) => {
                log::error!("Cannot locate current executable for restart: {}", e);
                std::process::exit(1);
            }
        };
        let args: Vec<std::ffi::OsString> = std::env::args_os().skip(1).collect();
        log::warn!("Restarting {}", exe.display());

        let mut command = std::process::Command::new(&exe);
        command.args(&args);

        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            // Only returns on failure
            let e = command.exec();
            log::error!("Re-exec of {} failed: {}", exe.display(), e);
            std::process::exit(1);
        }

        #[cfg(not(unix))]
        {
            match command.spawn() {
                Ok(_) => std::process::exit(0),
                Err(e) => {
                    log::error!("Spawning {} failed: {}", exe.display(), e);
                    std::process::exit(1);
                }
            }
        }
    }
}
