// functions that invoke MP4Box
use crate::core::{
    data::{pretty_cmd, VideoFile},
    error::MuxError,
    interrupt::Interrupt,
    locate::{SubtitleCandidate, SubtitleSet},
};
use anyhow::Result;
use async_trait::async_trait;
use std::{
    ffi::OsString,
    future::Future,
    path::{Path, PathBuf},
    process::{ExitStatus, Stdio},
};
use tokio::{
    io::{AsyncBufReadExt, AsyncRead, BufReader},
    process::Command,
};

pub const DEFAULT_PROGRAM: &str = "MP4Box";

/// Something that can add subtitle tracks to a video.
#[async_trait]
pub trait Muxer: Send + Sync {
    /// Writes a copy of `video` with `subtitles` embedded and returns the path it was written to.
    /// The original video is left untouched.
    async fn merge(&self, video: &VideoFile, subtitles: &SubtitleSet) -> Result<PathBuf>;
}

/// The GPAC `MP4Box` command line tool, looked up on PATH unless `program` is a path.
#[derive(Debug, Clone)]
pub struct Mp4Box {
    program: String,
    interrupt: Interrupt,
}

impl Mp4Box {
    pub fn new(program: impl Into<String>) -> Self {
        Mp4Box {
            program: program.into(),
            interrupt: Interrupt::new(),
        }
    }

    /// Stops waiting for the tool, and kills it, once `interrupt` fires.
    pub fn with_interrupt(mut self, interrupt: Interrupt) -> Self {
        self.interrupt = interrupt;
        self
    }

    pub fn command(&self, video: &VideoFile, subtitles: &SubtitleSet, output: &Path) -> Command {
        let mut command = Command::new(&self.program);
        for subtitle in subtitles {
            command
                .arg("-add") // one subtitle track per file
                .arg(track_argument(subtitle));
        }
        command
            .arg(video.path()) // the input video
            .arg("-out") // write to the scratch file instead of in place
            .arg(output)
            // non-ascii file names and log output must survive the round trip
            .env("LC_ALL", "C.UTF-8")
            .env("LANG", "C.UTF-8");
        command
    }
}

impl Default for Mp4Box {
    fn default() -> Self {
        Mp4Box::new(DEFAULT_PROGRAM)
    }
}

#[async_trait]
impl Muxer for Mp4Box {
    async fn merge(&self, video: &VideoFile, subtitles: &SubtitleSet) -> Result<PathBuf> {
        let output = video.scratch_path();
        if self.interrupt.is_triggered() {
            return Err(MuxError::Interrupted {
                program: self.program.clone(),
            }
            .into());
        }

        let command = self.command(video, subtitles, &output);
        let status = run_logged(command, self.interrupt.triggered()).await?;
        check_status(&self.program, status, self.interrupt.is_triggered())?;

        Ok(output)
    }
}

/// `<path>:hdlr=sbtl:lang=<tag>`
pub fn track_argument(subtitle: &SubtitleCandidate) -> OsString {
    let mut argument = subtitle.path.clone().into_os_string();
    argument.push(format!(":hdlr=sbtl:lang={}", subtitle.language));
    argument
}

/// Turns the tool's exit status into a result.
///
/// Ctrl-C reaches the whole foreground process group, so the tool may die of it before
/// the interrupt is noticed here. Death by SIGINT, the shell's 130, or an interrupt
/// latched in the meantime all count as [`MuxError::Interrupted`].
pub fn check_status(program: &str, status: ExitStatus, interrupted: bool) -> Result<(), MuxError> {
    if status.success() {
        return Ok(());
    }
    if interrupted || killed_by_interrupt(&status) {
        return Err(MuxError::Interrupted {
            program: program.to_string(),
        });
    }
    Err(MuxError::Failed {
        program: program.to_string(),
        status,
    })
}

#[cfg(unix)]
fn killed_by_interrupt(status: &ExitStatus) -> bool {
    use std::os::unix::process::ExitStatusExt;

    const SIGINT: i32 = 2;
    status.signal() == Some(SIGINT) || status.code() == Some(128 + SIGINT)
}

#[cfg(not(unix))]
fn killed_by_interrupt(status: &ExitStatus) -> bool {
    // STATUS_CONTROL_C_EXIT
    status.code() == Some(0xC000013Au32 as i32)
}

/// Runs `command` to completion, logging its stdout and stderr line by line as they arrive.
///
/// If `cancel` resolves first the child is killed and reaped and
/// [`MuxError::Interrupted`] is returned. There is no timeout.
pub async fn run_logged<F>(mut command: Command, cancel: F) -> Result<ExitStatus, MuxError>
where
    F: Future<Output = ()>,
{
    let program = command
        .as_std()
        .get_program()
        .to_string_lossy()
        .into_owned();
    log::debug!("{0}", pretty_cmd(command.as_std()));

    command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    let mut child = command.spawn().map_err(|source| MuxError::Spawn {
        program: program.clone(),
        source,
    })?;

    let pumps = [
        child.stdout.take().map(|out| tokio::spawn(log_lines(out))),
        child.stderr.take().map(|err| tokio::spawn(log_lines(err))),
    ];

    let status = tokio::select! {
        status = child.wait() => status.map_err(|source| MuxError::Wait {
            program: program.clone(),
            source,
        })?,
        _ = cancel => {
            log::warn!("interrupted, stopping {program}");
            if let Err(err) = child.kill().await {
                log::warn!("could not stop {program}: {err}");
            }
            return Err(MuxError::Interrupted { program });
        }
    };

    for pump in pumps.into_iter().flatten() {
        // the streams hit EOF once the child is gone
        if let Err(err) = pump.await {
            log::warn!("lost some output of {program}: {err}");
        }
    }
    log::debug!("{program} exited with {status}");

    Ok(status)
}

async fn log_lines(stream: impl AsyncRead + Unpin + Send + 'static) {
    let mut segments = BufReader::new(stream).split(b'\n');
    loop {
        match segments.next_segment().await {
            Ok(Some(bytes)) => {
                // undecodable lines are dropped, they are only log output
                let Ok(line) = String::from_utf8(bytes) else {
                    continue;
                };
                let line = line.trim();
                if !line.is_empty() {
                    log::info!("{line}");
                }
            }
            Ok(None) => break,
            Err(err) => {
                log::warn!("stopped reading tool output: {err}");
                break;
            }
        }
    }
}
