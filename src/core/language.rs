// maps subtitle file names to the language tags handed to the muxer

/// Ordered (substring, tag) pairs. Keys are lowercase and matched by
/// containment; the first hit wins, so more specific keys go first.
pub const LANGUAGES: &[(&str, &str)] = &[
    ("english", "en-US"),
    ("_eng", "en-US"),
    ("icelandic", "is-is"),
];

/// Resolves the language of a subtitle file from its name.
/// `None` means the language is unknown and the file should not be merged.
pub fn resolve(file_name: &str) -> Option<&'static str> {
    resolve_with(LANGUAGES, file_name)
}

pub fn resolve_with(table: &[(&str, &'static str)], file_name: &str) -> Option<&'static str> {
    let lowered = file_name.to_lowercase();
    table
        .iter()
        .find(|(key, _)| lowered.contains(*key))
        .map(|(_, tag)| *tag)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_names_resolve() {
        assert_eq!(resolve("2_English.srt"), Some("en-US"));
        assert_eq!(resolve("movie_ENG.srt"), Some("en-US"));
        assert_eq!(resolve("3_Icelandic.srt"), Some("is-is"));
    }

    #[test]
    fn unknown_names_do_not_resolve() {
        assert_eq!(resolve("Unknown_Lang.srt"), None);
        assert_eq!(resolve("movie.srt"), None);
        // "eng" alone is not a key, the underscore is part of it
        assert_eq!(resolve("eng.srt"), None);
    }

    #[test]
    fn first_entry_wins() {
        assert_eq!(resolve("english_icelandic.srt"), Some("en-US"));
        assert_eq!(resolve("icelandic_english.srt"), Some("en-US"));

        let flipped: &[(&str, &str)] = &[("icelandic", "is-is"), ("english", "en-US")];
        assert_eq!(resolve_with(flipped, "icelandic_english.srt"), Some("is-is"));
    }
}
