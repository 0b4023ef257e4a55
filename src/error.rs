use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum VizError {
    #[error("malformed topology snapshot: {0}")]
    MalformedTopology(String),

    #[error("malformed network update: {0}")]
    MalformedUpdate(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("unable to load status: {0}")]
    Fetch(String),
}

impl VizError {
    pub fn kind_label(&self) -> &'static str {
        match self {
            Self::MalformedTopology(_) => "topology",
            Self::MalformedUpdate(_) => "update",
            Self::Transport(_) => "transport",
            Self::Fetch(_) => "status",
        }
    }
}
