//! Pipeline failures, tagged with the stage that produced them

use std::fmt;

use cartoonist_common::Error;
use thiserror::Error;

/// Pipeline stage, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Expand,
    Synthesize,
    Fetch,
    Store,
    Record,
    List,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Expand => "expand",
            Stage::Synthesize => "synthesize",
            Stage::Fetch => "fetch",
            Stage::Store => "store",
            Stage::Record => "record",
            Stage::List => "list",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("{0}")]
    LanguageModel(String),

    #[error("{message}")]
    ImageModel { message: String, timed_out: bool },

    #[error("{0}")]
    ArtifactRetrieval(String),

    #[error("{0}")]
    StorageWrite(String),

    #[error("{0}")]
    MetadataWrite(String),

    #[error("{0}")]
    MetadataRead(String),
}

impl PipelineError {
    pub fn stage(&self) -> Stage {
        match self {
            PipelineError::LanguageModel(_) => Stage::Expand,
            PipelineError::ImageModel { .. } => Stage::Synthesize,
            PipelineError::ArtifactRetrieval(_) => Stage::Fetch,
            PipelineError::StorageWrite(_) => Stage::Store,
            PipelineError::MetadataWrite(_) => Stage::Record,
            PipelineError::MetadataRead(_) => Stage::List,
        }
    }
}

impl From<PipelineError> for Error {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::LanguageModel(m) => Error::UpstreamLanguageModel(m),
            PipelineError::ImageModel { message, timed_out } => {
                Error::UpstreamImageModel { message, timed_out }
            }
            PipelineError::ArtifactRetrieval(m) => Error::ArtifactRetrieval(m),
            PipelineError::StorageWrite(m) => Error::StorageWrite(m),
            PipelineError::MetadataWrite(m) => Error::MetadataWrite(m),
            PipelineError::MetadataRead(m) => Error::MetadataRead(m),
        }
    }
}
