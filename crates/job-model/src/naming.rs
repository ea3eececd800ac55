//! Output file naming.

use crate::job::DEFAULT_FILENAME;

/// Longest output stem, in characters, before the extension is appended.
pub const MAX_OUTPUT_STEM_CHARS: usize = 50;

/// Container extension of every rendered video.
pub const OUTPUT_EXTENSION: &str = "mp4";

/// Derive the output file stem from a job's requested filename.
///
/// Spaces and path separators become `_`, then the result is cut to
/// [`MAX_OUTPUT_STEM_CHARS`] characters.
pub fn output_stem(filename: &str) -> String {
    let stem: String = filename
        .chars()
        .map(|c| match c {
            ' ' | '/' | '\\' => '_',
            other => other,
        })
        .take(MAX_OUTPUT_STEM_CHARS)
        .collect();

    if stem.is_empty() {
        DEFAULT_FILENAME.to_string()
    } else {
        stem
    }
}

/// Full output file name, e.g. `My_Cool_Video!!.mp4`.
pub fn output_file_name(filename: &str) -> String {
    format!("{}.{}", output_stem(filename), OUTPUT_EXTENSION)
}
