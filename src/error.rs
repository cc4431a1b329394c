use std::{collections::BTreeMap, fmt, sync::Arc};

use thiserror::Error;

use crate::animation::Frame;

#[derive(Debug, Clone)]
pub struct MotionError {
    pub key: &'static str,
    pub args: BTreeMap<&'static str, String>,
    pub causes: Vec<MotionCause>,
}

#[derive(Debug, Clone)]
pub enum MotionCause {
    Motion(Box<MotionError>),
    Std(Arc<dyn std::error::Error + Send + Sync>),
}

impl MotionError {
    pub fn new(key: &'static str) -> Self {
        Self {
            key,
            args: BTreeMap::new(),
            causes: Vec::new(),
        }
    }

    pub fn with_arg(mut self, k: &'static str, v: impl ToString) -> Self {
        self.args.insert(k, v.to_string());
        self
    }

    pub fn push_motion(mut self, cause: MotionError) -> Self {
        self.causes.push(MotionCause::Motion(Box::new(cause)));
        self
    }

    pub fn push_std(mut self, cause: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.causes.push(MotionCause::Std(Arc::new(cause)));
        self
    }
}

impl fmt::Display for MotionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.key)?;
        let mut first = true;
        for (k, v) in &self.args {
            if !first {
                write!(f, ", ")?;
            }
            first = false;
            write!(f, "{k}={v}")?;
        }
        write!(f, ")")?;
        for cause in &self.causes {
            match cause {
                MotionCause::Motion(e) => write!(f, ": {e}")?,
                MotionCause::Std(e) => write!(f, ": {e}")?,
            }
        }
        Ok(())
    }
}

impl std::error::Error for MotionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.causes.iter().find_map(|c| match c {
            MotionCause::Motion(e) => Some(e.as_ref() as &dyn std::error::Error),
            MotionCause::Std(e) => Some(e.as_ref() as &(dyn std::error::Error + 'static)),
        })
    }
}

/// Failures while reading the BVH text format
#[derive(Error, Debug)]
pub enum BvhError {
    #[error("unexpected end of file, expected {expected}")]
    UnexpectedEof { expected: &'static str },

    #[error("line {line}: expected {expected}, found '{found}'")]
    UnexpectedToken {
        line: usize,
        expected: &'static str,
        found: String,
    },

    #[error("line {line}: invalid number '{token}'")]
    InvalidNumber { line: usize, token: String },

    #[error("line {line}: unknown channel '{name}'")]
    UnknownChannel { line: usize, name: String },

    #[error("frame {frame}: expected {expected} channel values, found {found}")]
    ChannelCountMismatch {
        frame: usize,
        expected: usize,
        found: usize,
    },

    #[error("header declares {expected} frames, found {found}")]
    FrameCountMismatch { expected: usize, found: usize },

    #[error("motion section has no frames")]
    NoFrames,
}

/// Recoverable failures of frame interpolation and lookup
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FrameError {
    /// The frames disagree on joint count. `partial` interpolates the joints both frames share.
    #[error("frames have different joint counts ({left} vs {right})")]
    JointCountMismatch {
        left: usize,
        right: usize,
        partial: Frame,
    },

    #[error("frame index {index} out of range for {len} frames")]
    OutOfRange { index: usize, len: usize },
}
