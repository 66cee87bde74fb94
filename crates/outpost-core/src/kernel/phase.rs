use std::fmt;

/// Where the client node is in its startup/shutdown sequence.
///
/// Variants are declared in sequence order, so `<` means "earlier". The
/// orchestrator only ever moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LifecyclePhase {
    Disconnected,
    Connecting,
    LoadingCore,
    LoadingOptional,
    StartingCore,
    StartingOptional,
    Serving,
    ShuttingDown,
    Unloaded,
}

impl LifecyclePhase {
    /// True once plugin loading has begun
    pub fn reached_plugins(self) -> bool {
        self >= LifecyclePhase::LoadingCore
    }
}

impl fmt::Display for LifecyclePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LifecyclePhase::Disconnected => "Disconnected",
            LifecyclePhase::Connecting => "Connecting",
            LifecyclePhase::LoadingCore => "LoadingCore",
            LifecyclePhase::LoadingOptional => "LoadingOptional",
            LifecyclePhase::StartingCore => "StartingCore",
            LifecyclePhase::StartingOptional => "StartingOptional",
            LifecyclePhase::Serving => "Serving",
            LifecyclePhase::ShuttingDown => "ShuttingDown",
            LifecyclePhase::Unloaded => "Unloaded",
        };
        f.write_str(name)
    }
}
