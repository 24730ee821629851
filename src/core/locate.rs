// finds the subtitle files that belong to a video

use crate::core::{data::is_subtitle_name, language};
use anyhow::{Context, Result};
use itertools::Itertools;
use std::{
    ffi::OsStr,
    path::{Path, PathBuf},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubtitleCandidate {
    pub path: PathBuf,
    pub language: &'static str,
}

/// Subtitles from a single folder, never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubtitleSet {
    folder: PathBuf,
    subtitles: Vec<SubtitleCandidate>,
}

impl SubtitleSet {
    fn new(folder: PathBuf, subtitles: Vec<SubtitleCandidate>) -> Option<Self> {
        if subtitles.is_empty() {
            None
        } else {
            Some(SubtitleSet { folder, subtitles })
        }
    }

    pub fn folder(&self) -> &Path {
        &self.folder
    }

    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.subtitles.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SubtitleCandidate> {
        self.subtitles.iter()
    }
}

impl<'a> IntoIterator for &'a SubtitleSet {
    type Item = &'a SubtitleCandidate;
    type IntoIter = std::slice::Iter<'a, SubtitleCandidate>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Folders searched for subtitles, in priority order.
pub fn search_folders(working_dir: &Path, video_stem: &OsStr) -> [PathBuf; 4] {
    let subs = working_dir.join("subs");
    [
        working_dir.to_path_buf(),
        working_dir.join(video_stem),
        subs.clone(),
        subs.join(video_stem),
    ]
}

/// Returns the subtitles to merge into the video named `video_stem`.
///
/// The first folder holding any `.srt` file is the only one used, even when none of
/// its files has a recognised language. Files with an unknown language are left out.
/// `None` means there is nothing to merge.
pub fn locate(working_dir: &Path, video_stem: &OsStr) -> Result<Option<SubtitleSet>> {
    for folder in search_folders(working_dir, video_stem) {
        if !folder.is_dir() {
            continue;
        }

        let files = srt_files(&folder)?;
        if files.is_empty() {
            continue;
        }

        log::debug!("using subtitles folder {folder:#?}");
        let mut subtitles = vec![];
        for path in files {
            let language = language::resolve(&path.file_name().unwrap_or_default().to_string_lossy());
            match language {
                Some(language) => subtitles.push(SubtitleCandidate { path, language }),
                None => log::debug!("skipping {path:#?}, language could not be determined"),
            }
        }
        return Ok(SubtitleSet::new(folder, subtitles));
    }

    Ok(None)
}

// regular files ending in ".srt", sorted by name so track order is stable
fn srt_files(folder: &Path) -> Result<Vec<PathBuf>> {
    let mut files = vec![];
    for entry in
        std::fs::read_dir(folder).with_context(|| format!("could not list folder {folder:#?}"))?
    {
        let entry = entry.with_context(|| format!("could not list folder {folder:#?}"))?;
        let path = entry.path();
        if path.is_file() && is_subtitle_name(&path) {
            files.push(path);
        }
    }
    Ok(files.into_iter().sorted().collect_vec())
}
