use thiserror::Error;

#[derive(Debug, Error)]
pub enum RosterError {
    #[error("IO error at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Roster document is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Person not found: {0}")]
    NotFound(String),

    #[error("{0}")]
    Validation(String),
}

impl RosterError {
    pub fn io(path: &std::path::Path, source: std::io::Error) -> Self {
        RosterError::Io {
            path: path.display().to_string(),
            source,
        }
    }
}
