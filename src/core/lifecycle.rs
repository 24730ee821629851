// takes one video from "subtitles next to it" to "subtitles inside it"

use crate::core::{
    data::{VideoFile, MARKER_EXTENSION, VIDEO_EXTENSION},
    locate::{locate, SubtitleSet},
    mp4box::Muxer,
};
use anyhow::{bail, Context, Result};
use std::{
    fs,
    path::{Path, PathBuf},
};

/// How the merged file takes the place of the original.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReplaceStrategy {
    /// A single rename over the original. Atomic on the same filesystem.
    #[default]
    Atomic,
    /// Park the original as `<stem>.orig`, move the merged file in, then delete the original.
    /// The steps run under a `<stem>.replacing` marker so a crash in between can be
    /// repaired by [`recover`].
    Staged,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessReport {
    pub video: PathBuf,
    /// number of subtitle tracks merged, 0 when none were found
    pub merged: usize,
}

/// What [`recover`] found and did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recovery {
    /// nothing left over from an earlier run
    Clean,
    /// merged video was already in place, the leftover `.orig` was deleted
    DroppedBackup,
    /// merged `.subs` output was moved into place and the `.orig` deleted
    Resumed,
    /// no merged output survived, the `.orig` was moved back
    RolledBack,
    /// the marker was left but the original had not been moved yet
    DroppedMarker,
    /// stale `.subs` output of an unfinished merge was deleted
    DroppedScratch,
}

pub struct Lifecycle<M> {
    muxer: M,
    replace: ReplaceStrategy,
}

impl<M: Muxer> Lifecycle<M> {
    pub fn new(muxer: M) -> Self {
        Lifecycle {
            muxer,
            replace: ReplaceStrategy::default(),
        }
    }

    pub fn with_replace(mut self, replace: ReplaceStrategy) -> Self {
        self.replace = replace;
        self
    }

    /// Merges the subtitles found for `video` into it and deletes the merged subtitle files.
    ///
    /// Each step only runs if the previous one succeeded. A video without subtitles is
    /// not an error, it is reported with `merged: 0`.
    pub async fn process(&self, video: &VideoFile) -> Result<ProcessReport> {
        recover(video)?;
        if !video.path().is_file() {
            bail!("video file {:#?} does not exist", video.path());
        }

        let mut report = ProcessReport {
            video: video.path().to_path_buf(),
            merged: 0,
        };

        let Some(subtitles) = locate(video.working_dir(), video.stem())? else {
            log::info!("No subtitle files found for file {0}", video.display_name());
            return Ok(report);
        };
        log::debug!(
            "merging {0} subtitle files from {1:#?}",
            subtitles.len(),
            subtitles.folder()
        );

        let merged = self
            .muxer
            .merge(video, &subtitles)
            .await
            .with_context(|| format!("could not merge subtitles into {:#?}", video.path()))?;

        replace(video, &merged, self.replace)?;
        remove_consumed(&subtitles)?;

        report.merged = subtitles.len();
        log::info!(
            "{0} subtitle files merged successfully into video {1}",
            report.merged,
            video.display_name()
        );
        Ok(report)
    }
}

/// Puts the file at `merged` where `video` is.
pub fn replace(video: &VideoFile, merged: &Path, strategy: ReplaceStrategy) -> Result<()> {
    match strategy {
        ReplaceStrategy::Atomic => rename(merged, video.path()),
        ReplaceStrategy::Staged => {
            let marker = video.marker_path();
            let backup = video.backup_path();
            fs::write(&marker, "").with_context(|| format!("could not create {marker:#?}"))?;
            rename(video.path(), &backup)?;
            rename(merged, video.path())?;
            remove_file(&backup)?;
            remove_file(&marker)
        }
    }
}

/// Deletes every subtitle in the set. A folder emptied this way is removed, and so is
/// its parent if that is now empty too. Nothing further up is touched.
pub fn remove_consumed(subtitles: &SubtitleSet) -> Result<()> {
    for subtitle in subtitles {
        remove_file(&subtitle.path)?;

        let Some(folder) = subtitle.path.parent() else {
            continue;
        };
        if remove_if_empty(folder)? {
            if let Some(parent) = folder.parent() {
                remove_if_empty(parent)?;
            }
        }
    }
    Ok(())
}

fn remove_if_empty(folder: &Path) -> Result<bool> {
    let is_empty = fs::read_dir(folder)
        .with_context(|| format!("could not list folder {folder:#?}"))?
        .next()
        .is_none();
    if is_empty {
        fs::remove_dir(folder).with_context(|| format!("could not remove folder {folder:#?}"))?;
        log::debug!("removed empty folder {folder:#?}");
    }
    Ok(is_empty)
}

/// Repairs what an interrupted earlier run left next to `video`.
///
/// A `.orig` file is only ever touched while its `.replacing` marker exists, so files
/// that merely share the suffix are left alone.
pub fn recover(video: &VideoFile) -> Result<Recovery> {
    let marker = video.marker_path();
    let backup = video.backup_path();
    let scratch = video.scratch_path();

    let mut recovery = Recovery::Clean;
    if marker.is_file() {
        recovery = if !backup.is_file() {
            Recovery::DroppedMarker
        } else if video.path().is_file() {
            log::warn!("{0:#?} was already replaced, removing leftover {backup:#?}", video.path());
            remove_file(&backup)?;
            Recovery::DroppedBackup
        } else if scratch.is_file() {
            log::warn!("finishing interrupted replace of {0:#?}", video.path());
            rename(&scratch, video.path())?;
            remove_file(&backup)?;
            Recovery::Resumed
        } else {
            log::warn!("restoring {0:#?} from {backup:#?}", video.path());
            rename(&backup, video.path())?;
            Recovery::RolledBack
        };
        remove_file(&marker)?;
        if recovery != Recovery::DroppedMarker {
            return Ok(recovery);
        }
    }

    if scratch.is_file() && video.path().is_file() {
        log::warn!("removing output of an unfinished merge {scratch:#?}");
        remove_file(&scratch)?;
        return Ok(Recovery::DroppedScratch);
    }

    Ok(recovery)
}

/// Runs [`recover`] for every `<stem>.replacing` marker in `dir`. Videos whose original is
/// still parked under `.orig` would otherwise not be found when listing the directory.
///
/// Each marker is recovered on its own, a failure is returned next to its video and does
/// not stop the others.
pub fn recover_directory(dir: &Path) -> Result<Vec<(PathBuf, Result<Recovery>)>> {
    let mut recovered = vec![];
    for entry in fs::read_dir(dir).with_context(|| format!("could not list folder {dir:#?}"))? {
        let path = entry
            .with_context(|| format!("could not list folder {dir:#?}"))?
            .path();
        if !path.is_file() || !path.extension().is_some_and(|ext| ext == MARKER_EXTENSION) {
            continue;
        }

        let video = VideoFile::new(path.with_extension(VIDEO_EXTENSION))?;
        let recovery = recover(&video);
        if !matches!(recovery, Ok(Recovery::Clean)) {
            recovered.push((video.path().to_path_buf(), recovery));
        }
    }
    Ok(recovered)
}

fn rename(from: &Path, to: &Path) -> Result<()> {
    fs::rename(from, to).with_context(|| format!("could not rename {from:#?} to {to:#?}"))
}

fn remove_file(path: &Path) -> Result<()> {
    fs::remove_file(path).with_context(|| format!("could not delete {path:#?}"))
}
