use filedrop_files::FilesError;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("failed to create directory {path}: {source}", path = path.display())]
    DirectoryCreation {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Files(#[from] FilesError),
}

pub type CoreResult<T> = std::result::Result<T, CoreError>;
