use unicode_normalization::UnicodeNormalization;

/// Reduce user input to a filename stem safe to join under a media directory.
///
/// Accents are folded to ASCII, path separators and whitespace runs become `_`,
/// anything outside `[A-Za-z0-9_.-]` is dropped and leading/trailing `.`/`_`
/// are stripped. May return an empty string.
pub fn secure_filename(raw: &str) -> String {
    let ascii: String = raw.nfkd().filter(char::is_ascii).collect();
    let spaced = ascii.replace(['/', '\\'], " ");
    let joined = spaced.split_whitespace().collect::<Vec<_>>().join("_");

    joined
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
        .collect::<String>()
        .trim_matches(|c| c == '.' || c == '_')
        .to_string()
}

/// File ids are trimmed and lowercased before sanitizing.
pub fn normalize_file_id(raw: &str) -> String {
    secure_filename(&raw.trim().to_lowercase())
}
