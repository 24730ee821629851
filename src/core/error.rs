// typed errors carried inside anyhow::Error, recover them with `downcast_ref`

use std::{path::PathBuf, process::ExitStatus};
use thiserror::Error;

/// Invalid command line input, raised before anything on disk is touched.
#[derive(Error, Debug)]
pub enum UsageError {
    #[error("only MP4 video files are supported, got {0:?}")]
    UnsupportedContainer(PathBuf),
}

/// Failures of the external multiplexer.
#[derive(Error, Debug)]
pub enum MuxError {
    #[error("unable to start {program}, has it been installed and is it part of the system PATH?")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("could not wait for {program} to finish")]
    Wait {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} did not complete successfully ({status}), check its output above")]
    Failed { program: String, status: ExitStatus },

    #[error("interrupted while waiting for {program}")]
    Interrupted { program: String },
}

impl MuxError {
    pub fn is_interrupted(&self) -> bool {
        matches!(self, MuxError::Interrupted { .. })
    }
}

/// True when `err` was caused by a user interrupt anywhere in its chain.
pub fn is_interrupted(err: &anyhow::Error) -> bool {
    err.chain()
        .filter_map(|cause| cause.downcast_ref::<MuxError>())
        .any(MuxError::is_interrupted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn interrupt_is_found_behind_context() {
        let err = Err::<(), _>(MuxError::Interrupted {
            program: "MP4Box".to_string(),
        })
        .context("merging movie.mp4")
        .unwrap_err();
        assert!(is_interrupted(&err));
    }

    #[test]
    fn other_errors_are_not_interrupts() {
        let err = anyhow::Error::new(UsageError::UnsupportedContainer("a.mkv".into()));
        assert!(!is_interrupted(&err));
    }
}
