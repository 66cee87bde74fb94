use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResourceError {
    #[error("A different subtree is already mounted at '{name}' under the {root} root")]
    MountConflict { name: String, root: String },

    #[error("Nothing is mounted at '{name}' under the {root} root")]
    NotMounted { name: String, root: String },
}
