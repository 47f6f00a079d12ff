//! Output file naming

use chrono::{DateTime, SecondsFormat, Utc};

use crate::codec::OutputFormat;

/// Base name used when the input name sanitizes to nothing
const FALLBACK_STEM: &str = "image";

/// Drop the last `.ext` from a file name, if any
pub fn strip_extension(name: &str) -> &str {
    match name.rfind('.') {
        Some(dot) if dot + 1 < name.len() && !name[dot + 1..].contains('/') => &name[..dot],
        _ => name,
    }
}

/// Replace every character outside `[a-zA-Z0-9_.-]` with `_`
pub fn sanitize_stem(stem: &str) -> String {
    stem.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// `<stem>_<w>x<h>.<ext>` for an original file name
pub fn output_filename(original: &str, width: u32, height: u32, format: OutputFormat) -> String {
    let base = original.rsplit(['/', '\\']).next().unwrap_or(original);
    let stem = sanitize_stem(strip_extension(base));
    let stem = if stem.is_empty() { FALLBACK_STEM } else { stem.as_str() };
    format!("{}_{}x{}.{}", stem, width, height, format.extension())
}

/// Name given to an image read from stdin or the clipboard
pub fn pasted_image_name(now: DateTime<Utc>) -> String {
    let stamp = now
        .to_rfc3339_opts(SecondsFormat::Millis, true)
        .replace(':', "-");
    format!("pasted-image-{}.jpg", stamp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_strip_extension() {
        assert_eq!(strip_extension("photo.png"), "photo");
        assert_eq!(strip_extension("archive.tar.gz"), "archive.tar");
        assert_eq!(strip_extension("noext"), "noext");
        assert_eq!(strip_extension("trailing."), "trailing.");
    }

    #[test]
    fn test_sanitize_stem() {
        assert_eq!(sanitize_stem("my photo (1)"), "my_photo__1_");
        assert_eq!(sanitize_stem("ok_name-2.v3"), "ok_name-2.v3");
        assert_eq!(sanitize_stem("写真"), "__");
    }

    #[test]
    fn test_output_filename() {
        assert_eq!(
            output_filename("name.png", 1000, 1000, OutputFormat::Jpeg),
            "name_1000x1000.jpg"
        );
        assert_eq!(
            output_filename("/tmp/in/My Shot.jpeg", 800, 600, OutputFormat::Png),
            "My_Shot_800x600.png"
        );
        assert_eq!(
            output_filename(".png", 10, 10, OutputFormat::Webp),
            "image_10x10.webp"
        );
    }

    #[test]
    fn test_pasted_image_name() {
        let now = Utc.with_ymd_and_hms(2026, 10, 19, 8, 30, 5).unwrap();
        let name = pasted_image_name(now);
        assert_eq!(name, "pasted-image-2026-10-19T08-30-05.000Z.jpg");
        assert_eq!(
            output_filename(&name, 1000, 1000, OutputFormat::Jpeg),
            "pasted-image-2026-10-19T08-30-05.000Z_1000x1000.jpg"
        );
    }
}
