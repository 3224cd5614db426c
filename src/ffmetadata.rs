//! FFMETADATA1 sidecar: global tags plus chapter marks, as imported by ffmpeg

use crate::libby::BookMetadata;
use crate::timeline::Timeline;

pub const HEADER: &str = ";FFMETADATA1";
pub const GENRE: &str = "Audiobook";
/// Chapter START/END values are milliseconds
pub const TIMEBASE: &str = "1/1000";

/// Render the sidecar for a book and its resolved chapters.
///
/// ffmpeg reads this as a flat key/value stream keyed by the last `[CHAPTER]`
/// marker seen, so line order and the blank separators are fixed.
pub fn render(book: &BookMetadata, timeline: &Timeline) -> String {
    let mut lines: Vec<String> = vec![
        HEADER.to_string(),
        String::new(),
        tag("title", &book.title),
        tag("artist", book.narrator().unwrap_or_default()),
        tag("album_artist", book.author().unwrap_or_default()),
        tag("album", &book.title),
        tag("genre", GENRE),
        tag("comment", &book.comment()),
        String::new(),
    ];

    for chapter in &timeline.chapters {
        lines.push("[CHAPTER]".to_string());
        lines.push(format!("TIMEBASE={}", TIMEBASE));
        lines.push(format!("START={}", chapter.start_millis));
        lines.push(format!("END={}", chapter.end_millis));
        lines.push(tag("title", &chapter.title));
        lines.push(String::new());
    }

    lines.join("\n")
}

fn tag(key: &str, value: &str) -> String {
    format!("{}={}", key, escape_value(value))
}

/// Backslash-escape the characters FFMETADATA treats as syntax
fn escape_value(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '=' | ';' | '#' | '\\' | '\n') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::libby::Creator;
    use crate::timeline::{ChapterMarker, SpineEntry};

    fn sample_book() -> BookMetadata {
        BookMetadata {
            title: "The Long Way".to_string(),
            creators: vec![
                Creator::new("Sam Writer", "author"),
                Creator::new("Jane Reader", "narrator"),
            ],
            description: "<p>Hello <b>world</b></p>".to_string(),
            cover_url: None,
            year: None,
        }
    }

    fn two_part_timeline() -> Timeline {
        Timeline::build(
            &[SpineEntry::new(300.0), SpineEntry::new(300.0)],
            &[
                ChapterMarker::new("Ch1", 0, 0.0),
                ChapterMarker::new("Ch2", 1, 10.0),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_render_full_sidecar() {
        let sidecar = render(&sample_book(), &two_part_timeline());
        let expected = "\
;FFMETADATA1

title=The Long Way
artist=Jane Reader
album_artist=Sam Writer
album=The Long Way
genre=Audiobook
comment=Hello world

[CHAPTER]
TIMEBASE=1/1000
START=0
END=310000
title=Ch1

[CHAPTER]
TIMEBASE=1/1000
START=310000
END=600000
title=Ch2
";
        assert_eq!(sidecar, expected);
    }

    #[test]
    fn test_zero_chapters_has_only_book_tags() {
        let timeline = Timeline::build(&[SpineEntry::new(60.0)], &[]).unwrap();
        let sidecar = render(&sample_book(), &timeline);

        assert!(sidecar.starts_with(";FFMETADATA1\n"));
        assert!(sidecar.contains("comment=Hello world\n"));
        assert!(!sidecar.contains("[CHAPTER]"));
    }

    #[test]
    fn test_missing_roles_keep_empty_keys() {
        let book = BookMetadata {
            title: "Solo".to_string(),
            creators: vec![Creator::new("Jane Reader", "narrator")],
            ..Default::default()
        };
        let timeline = Timeline::build(&[SpineEntry::new(60.0)], &[]).unwrap();
        let sidecar = render(&book, &timeline);

        assert!(sidecar.lines().any(|l| l == "album_artist="));
        assert!(sidecar.lines().any(|l| l == "artist=Jane Reader"));
        assert!(sidecar.lines().any(|l| l == "comment="));
    }

    #[test]
    fn test_deduplicated_chapters_render_once() {
        let timeline = Timeline::build(
            &[SpineEntry::new(100.0)],
            &[
                ChapterMarker::new("A", 0, 0.0),
                ChapterMarker::new("A", 0, 5.0),
                ChapterMarker::new("B", 0, 20.0),
            ],
        )
        .unwrap();
        let sidecar = render(&sample_book(), &timeline);

        assert_eq!(sidecar.matches("[CHAPTER]").count(), 2);
        assert!(sidecar.contains("START=0\nEND=20000\ntitle=A\n"));
        assert!(sidecar.contains("START=20000\nEND=100000\ntitle=B\n"));
    }

    #[test]
    fn test_escape_value() {
        assert_eq!(escape_value("plain text"), "plain text");
        assert_eq!(escape_value("a=b"), "a\\=b");
        assert_eq!(escape_value("Part 1; Part 2"), "Part 1\\; Part 2");
        assert_eq!(escape_value("#1"), "\\#1");
        assert_eq!(escape_value("back\\slash"), "back\\\\slash");
        assert_eq!(escape_value("two\nlines"), "two\\\nlines");
    }

    #[test]
    fn test_multiline_description_stays_in_comment() {
        let book = BookMetadata {
            title: "T".to_string(),
            description: "<p>First</p>\n<p>title=Second</p>".to_string(),
            ..Default::default()
        };
        let timeline = Timeline::build(&[SpineEntry::new(60.0)], &[]).unwrap();
        let sidecar = render(&book, &timeline);

        assert!(sidecar.contains("comment=First\\\ntitle\\=Second\n"));
        assert_eq!(sidecar.lines().filter(|l| l.starts_with("title=")).count(), 1);
    }
}
