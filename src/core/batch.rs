// runs the lifecycle over one video or every video in a directory

use crate::core::{
    data::{is_video_name, VideoFile},
    error::is_interrupted,
    lifecycle::{recover_directory, Lifecycle, ProcessReport},
    mp4box::Muxer,
};
use anyhow::{Context, Result};
use itertools::Itertools;
use std::path::{Path, PathBuf};

#[derive(Debug, Default)]
pub struct BatchSummary {
    pub processed: Vec<ProcessReport>,
    pub failed: Vec<(PathBuf, anyhow::Error)>,
}

impl BatchSummary {
    pub fn merged(&self) -> usize {
        self.processed.iter().map(|report| report.merged).sum()
    }
}

/// Processes a single video. Any failure is returned as is.
pub async fn run_single<M: Muxer>(lifecycle: &Lifecycle<M>, video: &VideoFile) -> Result<ProcessReport> {
    lifecycle.process(video).await
}

/// Processes every `.mp4` file in `dir`, one at a time and in name order.
///
/// A failing video is logged and recorded in the summary, the next one is still attempted.
/// Only an interrupt stops the batch early.
pub async fn run_directory<M: Muxer>(lifecycle: &Lifecycle<M>, dir: &Path) -> Result<BatchSummary> {
    for (video, recovery) in recover_directory(dir)? {
        match recovery {
            Ok(recovery) => log::info!("recovered {video:#?}: {recovery:?}"),
            Err(err) => log::error!("could not recover {video:#?}: {err:#}"),
        }
    }

    let mut summary = BatchSummary::default();
    for path in videos_in(dir)? {
        let video = VideoFile::new(&path)?;
        match lifecycle.process(&video).await {
            Ok(report) => summary.processed.push(report),
            Err(err) if is_interrupted(&err) => return Err(err),
            Err(err) => {
                log::error!("{err:#}");
                summary.failed.push((path, err));
            }
        }
    }
    Ok(summary)
}

/// Regular files in `dir` with the video extension, sorted by name.
pub fn videos_in(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut videos = vec![];
    for entry in std::fs::read_dir(dir).with_context(|| format!("could not list folder {dir:#?}"))? {
        let path = entry
            .with_context(|| format!("could not list folder {dir:#?}"))?
            .path();
        if path.is_file() && is_video_name(&path) {
            videos.push(path);
        }
    }
    Ok(videos.into_iter().sorted().collect_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn only_mp4_files_are_listed() {
        let dir = TempDir::new().unwrap();
        for name in ["b.mp4", "a.mp4", "c.mkv", "d.MP4", "notes.txt"] {
            fs::write(dir.path().join(name), "").unwrap();
        }
        fs::create_dir(dir.path().join("folder.mp4")).unwrap();

        assert_eq!(
            videos_in(dir.path()).unwrap(),
            [dir.path().join("a.mp4"), dir.path().join("b.mp4")]
        );
    }
}
