//! Small filesystem helpers shared by the kernel and bundled plugins.
pub mod fs;

pub use fs::{ensure_dir_with_mode, read_optional_string};
