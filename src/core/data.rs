use crate::core::error::UsageError;
use anyhow::{Context, Result};
use itertools::Itertools;
use std::{
    ffi::OsStr,
    path::{Path, PathBuf},
};

pub const VIDEO_EXTENSION: &str = "mp4";
pub const SUBTITLE_EXTENSION: &str = "srt";

/// suffix of the muxer's output before it is swapped in
pub const SCRATCH_EXTENSION: &str = "subs";
/// suffix the original video is parked under during a staged replace
pub const BACKUP_EXTENSION: &str = "orig";
/// suffix of the empty file that marks a staged replace in progress
pub const MARKER_EXTENSION: &str = "replacing";

/// A video file being processed, always held by absolute path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoFile {
    path: PathBuf,
}

impl VideoFile {
    /// Fails with [`UsageError::UnsupportedContainer`] unless the extension is exactly `mp4`.
    /// The file itself does not need to exist yet, recovery may still have to restore it.
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !is_video_name(path) {
            return Err(UsageError::UnsupportedContainer(path.to_path_buf()).into());
        }
        let path = std::path::absolute(path)
            .with_context(|| format!("could not resolve absolute path of {path:#?}"))?;
        Ok(VideoFile { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The directory the video lives in; subtitles are searched relative to it.
    pub fn working_dir(&self) -> &Path {
        // absolute paths with a file name always have a parent
        self.path.parent().unwrap_or_else(|| Path::new("/"))
    }

    pub fn stem(&self) -> &OsStr {
        self.path.file_stem().unwrap_or_default()
    }

    pub fn display_name(&self) -> String {
        self.stem().to_string_lossy().into_owned()
    }

    pub fn scratch_path(&self) -> PathBuf {
        self.path.with_extension(SCRATCH_EXTENSION)
    }

    pub fn backup_path(&self) -> PathBuf {
        self.path.with_extension(BACKUP_EXTENSION)
    }

    pub fn marker_path(&self) -> PathBuf {
        self.path.with_extension(MARKER_EXTENSION)
    }
}

pub fn is_video_name(path: &Path) -> bool {
    has_extension(path, VIDEO_EXTENSION)
}

pub fn is_subtitle_name(path: &Path) -> bool {
    has_extension(path, SUBTITLE_EXTENSION)
}

// case sensitive on purpose, "Movie.MP4" is not picked up
fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension().is_some_and(|ext| ext == extension)
        && path.file_stem().is_some_and(|stem| !stem.is_empty())
}

/// Renders a command the way it could be pasted into a shell, for logging.
pub fn pretty_cmd(command: &std::process::Command) -> String {
    std::iter::once(command.get_program())
        .chain(command.get_args())
        .map(|part| {
            let part = part.to_string_lossy();
            if part.contains(char::is_whitespace) {
                format!("\"{part}\"")
            } else {
                part.into_owned()
            }
        })
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::process::Command;

    #[test]
    fn only_mp4_is_accepted() {
        assert!(VideoFile::new("/media/movie.mp4").is_ok());

        for bad in ["/media/movie.mkv", "/media/movie.MP4", "/media/movie", "/media/.mp4"] {
            let err = VideoFile::new(bad).unwrap_err();
            assert!(err.downcast_ref::<UsageError>().is_some(), "{bad}");
        }
    }

    #[test]
    fn derived_paths_share_the_stem() {
        let video = VideoFile::new("/media/shows/movie.mp4").unwrap();
        assert_eq!(video.working_dir(), Path::new("/media/shows"));
        assert_eq!(video.stem(), "movie");
        assert_eq!(video.scratch_path(), PathBuf::from("/media/shows/movie.subs"));
        assert_eq!(video.backup_path(), PathBuf::from("/media/shows/movie.orig"));
        assert_eq!(video.marker_path(), PathBuf::from("/media/shows/movie.replacing"));
    }

    #[test]
    fn relative_paths_become_absolute() {
        let video = VideoFile::new("movie.mp4").unwrap();
        assert!(video.path().is_absolute());
        assert_eq!(video.working_dir(), std::env::current_dir().unwrap());
    }

    #[test]
    fn subtitle_extension_is_case_sensitive() {
        assert!(is_subtitle_name(Path::new("2_English.srt")));
        assert!(!is_subtitle_name(Path::new("2_English.SRT")));
        assert!(!is_subtitle_name(Path::new("2_English.srt.bak")));
    }

    #[test]
    fn pretty_cmd_quotes_spaces() {
        let mut command = Command::new("MP4Box");
        command.arg("-add").arg("my subs.srt:lang=en-US");
        assert_eq!(
            pretty_cmd(&command),
            "MP4Box -add \"my subs.srt:lang=en-US\""
        );
    }
}
