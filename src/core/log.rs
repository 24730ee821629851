use anyhow::{Context, Result};
use simplelog::*;

/// Maps the `-v`/`-q` flags to a level, warnings and errors are always shown.
pub fn level_from_flags(verbose: u8, quiet: bool) -> LevelFilter {
    if quiet {
        return LevelFilter::Warn;
    }
    match verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

pub fn initialize_logging(level: LevelFilter) -> Result<()> {
    let config = ConfigBuilder::new()
        .set_time_level(LevelFilter::Off)
        .set_target_level(LevelFilter::Off)
        .set_thread_level(LevelFilter::Off)
        .build();

    CombinedLogger::init(vec![TermLogger::new(
        level,
        config,
        TerminalMode::Stderr,
        ColorChoice::Auto,
    )])
    .context("could not initialize logging")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_map_to_levels() {
        assert_eq!(level_from_flags(0, false), LevelFilter::Info);
        assert_eq!(level_from_flags(1, false), LevelFilter::Debug);
        assert_eq!(level_from_flags(3, false), LevelFilter::Trace);
        assert_eq!(level_from_flags(2, true), LevelFilter::Warn);
    }
}
