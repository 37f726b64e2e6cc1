use std::fmt::{Debug, Display, Formatter};
use thiserror::Error;

/// The step of an invocation that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Load,
    Instantiate,
    Resolve,
    Allocate,
    Reserve,
    Invoke,
    Decode,
}

impl Display for Stage {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::Load => {
                write!(f, "load")
            }
            Stage::Instantiate => {
                write!(f, "instantiate")
            }
            Stage::Resolve => {
                write!(f, "resolve")
            }
            Stage::Allocate => {
                write!(f, "allocate")
            }
            Stage::Reserve => {
                write!(f, "reserve")
            }
            Stage::Invoke => {
                write!(f, "invoke")
            }
            Stage::Decode => {
                write!(f, "decode")
            }
        }
    }
}

#[derive(Error, Debug)]
#[error("{stage} stage failed")]
pub struct Error {
    stage: Stage,
    source: anyhow::Error,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
    pub fn new(stage: Stage, source: impl Into<anyhow::Error>) -> Self {
        Self {
            stage,
            source: source.into(),
        }
    }

    pub fn msg<M>(stage: Stage, message: M) -> Self
    where
        M: Display + Debug + Send + Sync + 'static,
    {
        Self::new(stage, anyhow::Error::msg(message))
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn cause(&self) -> &anyhow::Error {
        &self.source
    }
}

/// Tags a fallible result with the stage it belongs to.
pub trait StageContext<T> {
    fn stage(self, stage: Stage) -> Result<T>;

    fn stage_with<C, F>(self, stage: Stage, f: F) -> Result<T>
    where
        C: Display + Send + Sync + 'static,
        F: FnOnce() -> C;
}

impl<T, E> StageContext<T> for std::result::Result<T, E>
where
    E: Into<anyhow::Error>,
{
    fn stage(self, stage: Stage) -> Result<T> {
        self.map_err(|e| Error::new(stage, e))
    }

    fn stage_with<C, F>(self, stage: Stage, f: F) -> Result<T>
    where
        C: Display + Send + Sync + 'static,
        F: FnOnce() -> C,
    {
        self.map_err(|e| Error::new(stage, Into::<anyhow::Error>::into(e).context(f())))
    }
}
