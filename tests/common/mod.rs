//! Shared fixtures for the integration tests

#![allow(dead_code)]

use anyhow::Result;
use async_trait::async_trait;
use itertools::Itertools;
use std::{
    fs,
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};
use submerge::core::{data::VideoFile, locate::SubtitleSet, mp4box::Muxer};

pub const SRT: &str = "1\n00:00:01,000 --> 00:00:04,000\nThis is a test subtitle.\n";

/// Writes `content` to `dir/relative`, creating folders on the way.
pub fn create_file(dir: &Path, relative: &str, content: &str) -> PathBuf {
    let path = dir.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, content).unwrap();
    path
}

pub fn create_video(dir: &Path, name: &str) -> VideoFile {
    VideoFile::new(create_file(dir, name, "original video")).unwrap()
}

/// Stands in for MP4Box: writes the scratch file with the tracks it was asked to add.
/// Clones share the call counter, keep one to inspect after handing the other over.
#[derive(Default, Clone)]
pub struct StubMuxer {
    calls: Arc<AtomicUsize>,
}

impl StubMuxer {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

pub fn merged_content(subtitles: &SubtitleSet) -> String {
    let tracks = subtitles.iter().map(|s| s.language).join(",");
    format!("merged video [{tracks}]")
}

#[async_trait]
impl Muxer for StubMuxer {
    async fn merge(&self, video: &VideoFile, subtitles: &SubtitleSet) -> Result<PathBuf> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let output = video.scratch_path();
        fs::write(&output, merged_content(subtitles))?;
        Ok(output)
    }
}

/// Writes an executable shell script, used in place of the MP4Box binary.
#[cfg(unix)]
pub fn create_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = create_file(dir, name, &format!("#!/bin/sh\n{body}\n"));
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}

/// Script that copies the input video to the `-out` path with a note of what it added.
#[cfg(unix)]
pub fn create_copying_muxer(dir: &Path) -> PathBuf {
    create_script(
        dir,
        "fake-mp4box",
        r#"tracks=""
input=""
while [ $# -gt 0 ]; do
  case "$1" in
    -add) tracks="$tracks $2"; shift 2 ;;
    -out) out="$2"; shift 2 ;;
    *) input="$1"; shift ;;
  esac
done
echo "muxing$tracks"
{ cat "$input"; echo " +subs"; } > "$out""#,
    )
}
