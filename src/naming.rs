use anyhow::{bail, Result};
use std::path::PathBuf;

use crate::libby::BookMetadata;

/// Author/Title - Year/Title.m4b
pub const DEFAULT_FORMAT: &str = "{author}/{title} - {year?}/{title}";

pub const FALLBACK_TITLE: &str = "Audiobook";
pub const FALLBACK_AUTHOR: &str = "Unknown Author";

/// Available format placeholders with descriptions
pub const PLACEHOLDERS: &[(&str, &str)] = &[
    ("author", "First credited author (\"Unknown Author\" if none)"),
    ("narrator", "First credited narrator"),
    ("title", "Book title (falls back to the folder name)"),
    ("year", "Publication year"),
];

/// Values a template can refer to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamingFields {
    pub title: String,
    pub author: String,
    pub narrator: Option<String>,
    pub year: Option<String>,
}

impl NamingFields {
    /// Build naming fields for a book, using `fallback_title` (usually the
    /// folder name) when the document has no title
    pub fn from_book(book: &BookMetadata, fallback_title: Option<&str>) -> Self {
        let title = Some(book.title.trim())
            .filter(|t| !t.is_empty())
            .or(fallback_title.map(str::trim).filter(|t| !t.is_empty()))
            .unwrap_or(FALLBACK_TITLE)
            .to_string();

        Self {
            title,
            author: book
                .author()
                .map(str::trim)
                .filter(|a| !a.is_empty())
                .unwrap_or(FALLBACK_AUTHOR)
                .to_string(),
            narrator: book.narrator().map(String::from),
            year: book.year.clone(),
        }
    }

    fn get(&self, name: &str) -> Option<String> {
        match name {
            "title" => Some(self.title.clone()),
            "author" => Some(self.author.clone()),
            "narrator" => self.narrator.clone(),
            "year" => self.year.clone(),
            _ => None,
        }
    }
}

/// A parsed naming template with placeholder segments
#[derive(Debug, Clone)]
pub struct FormatTemplate {
    segments: Vec<Segment>,
}

#[derive(Debug, Clone)]
enum Segment {
    Literal(String),
    Placeholder { name: String, optional: bool },
}

impl FormatTemplate {
    /// Parse a template like "{author}/{title} - {year?}/{title}"
    pub fn parse(format: &str) -> Result<Self> {
        if format.trim().is_empty() {
            bail!("Format string is empty");
        }
        if format.trim_end().ends_with(['/', std::path::MAIN_SEPARATOR]) {
            bail!("Format string must end with a file name, not a directory separator");
        }

        let mut segments = Vec::new();
        let mut chars = format.chars().peekable();
        let mut literal = String::new();

        while let Some(c) = chars.next() {
            if c == '{' {
                if !literal.is_empty() {
                    segments.push(Segment::Literal(std::mem::take(&mut literal)));
                }

                let mut placeholder = String::new();
                let mut found_close = false;

                for inner in chars.by_ref() {
                    if inner == '}' {
                        found_close = true;
                        break;
                    }
                    placeholder.push(inner);
                }

                if !found_close {
                    bail!("Unclosed placeholder '{{' in format string");
                }

                let optional = placeholder.ends_with('?');
                let name = placeholder.trim_end_matches('?').to_string();

                let valid_names: Vec<&str> = PLACEHOLDERS.iter().map(|(n, _)| *n).collect();
                if !valid_names.contains(&name.as_str()) {
                    bail!(
                        "Unknown placeholder '{}'. Valid placeholders: {}",
                        name,
                        valid_names.join(", ")
                    );
                }

                segments.push(Segment::Placeholder { name, optional });
            } else {
                literal.push(c);
            }
        }

        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Ok(Self { segments })
    }

    /// Generate the relative output path (ending in `.m4b`).
    ///
    /// Returns the names of missing required fields on failure. A missing
    /// optional placeholder drops itself together with the literal text that
    /// separates it from the previous value in the same path component.
    pub fn generate_path(&self, fields: &NamingFields) -> Result<PathBuf, Vec<String>> {
        let mut missing = Vec::new();
        let mut path_parts: Vec<String> = Vec::new();
        let mut current_part = String::new();
        // End of the last substituted value within current_part
        let mut value_end = 0;

        for segment in &self.segments {
            match segment {
                Segment::Literal(s) => {
                    for (i, part) in s.split(['/', std::path::MAIN_SEPARATOR]).enumerate() {
                        if i > 0 {
                            if !current_part.trim().is_empty() {
                                path_parts.push(std::mem::take(&mut current_part));
                            }
                            current_part.clear();
                            value_end = 0;
                        }
                        current_part.push_str(part);
                    }
                }
                Segment::Placeholder { name, optional } => match fields.get(name) {
                    Some(v) if !v.trim().is_empty() => {
                        current_part.push_str(&sanitize_path_component(&v));
                        value_end = current_part.len();
                    }
                    _ if *optional => {
                        current_part.truncate(value_end);
                    }
                    _ => {
                        missing.push(name.clone());
                    }
                },
            }
        }

        if !missing.is_empty() {
            return Err(missing);
        }

        let file_stem = current_part.trim().to_string();
        if file_stem.is_empty() {
            return Err(vec!["title".to_string()]);
        }

        let mut path = PathBuf::new();
        for part in path_parts {
            path.push(part.trim());
        }
        path.push(format!("{}.m4b", file_stem));

        Ok(path)
    }
}

/// Sanitize a string for use as a path component
fn sanitize_path_component(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            _ => c,
        })
        .collect::<String>()
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::libby::Creator;

    fn sample_fields() -> NamingFields {
        NamingFields {
            title: "Project Hail Mary".to_string(),
            author: "Andy Weir".to_string(),
            narrator: Some("Ray Porter".to_string()),
            year: Some("2021".to_string()),
        }
    }

    #[test]
    fn test_default_format_with_year() {
        let template = FormatTemplate::parse(DEFAULT_FORMAT).unwrap();
        let path = template.generate_path(&sample_fields()).unwrap();
        assert_eq!(
            path,
            PathBuf::from("Andy Weir/Project Hail Mary - 2021/Project Hail Mary.m4b")
        );
    }

    #[test]
    fn test_default_format_without_year() {
        let template = FormatTemplate::parse(DEFAULT_FORMAT).unwrap();
        let fields = NamingFields {
            year: None,
            ..sample_fields()
        };
        let path = template.generate_path(&fields).unwrap();
        assert_eq!(
            path,
            PathBuf::from("Andy Weir/Project Hail Mary/Project Hail Mary.m4b")
        );
    }

    #[test]
    fn test_flat_format() {
        let template = FormatTemplate::parse("{title}").unwrap();
        let path = template.generate_path(&sample_fields()).unwrap();
        assert_eq!(path, PathBuf::from("Project Hail Mary.m4b"));
    }

    #[test]
    fn test_title_with_dots_keeps_full_name() {
        let template = FormatTemplate::parse("{title}").unwrap();
        let fields = NamingFields {
            title: "Mr. Mercedes".to_string(),
            ..sample_fields()
        };
        let path = template.generate_path(&fields).unwrap();
        assert_eq!(path, PathBuf::from("Mr. Mercedes.m4b"));
    }

    #[test]
    fn test_missing_required_field() {
        let template = FormatTemplate::parse("{author}/{narrator}/{title}").unwrap();
        let fields = NamingFields {
            narrator: None,
            ..sample_fields()
        };
        let result = template.generate_path(&fields);
        assert_eq!(result.unwrap_err(), vec!["narrator"]);
    }

    #[test]
    fn test_invalid_placeholder() {
        assert!(FormatTemplate::parse("{author}/{series}/{title}").is_err());
    }

    #[test]
    fn test_unclosed_placeholder() {
        assert!(FormatTemplate::parse("{author/{title}").is_err());
    }

    #[test]
    fn test_format_must_end_with_file_name() {
        assert!(FormatTemplate::parse("{author}/").is_err());
        assert!(FormatTemplate::parse("   ").is_err());
    }

    #[test]
    fn test_sanitize_path_component() {
        assert_eq!(sanitize_path_component("Hello: World"), "Hello_ World");
        assert_eq!(sanitize_path_component("Book/Part 1"), "Book_Part 1");
        assert_eq!(
            sanitize_path_component(r#"a\b*c?d"e<f>g|h"#),
            "a_b_c_d_e_f_g_h"
        );
    }

    #[test]
    fn test_values_are_sanitized_in_path() {
        let template = FormatTemplate::parse("{author}/{title}").unwrap();
        let fields = NamingFields {
            title: "Who? What: Why/How".to_string(),
            ..sample_fields()
        };
        let path = template.generate_path(&fields).unwrap();
        assert_eq!(path, PathBuf::from("Andy Weir/Who_ What_ Why_How.m4b"));
    }

    #[test]
    fn test_fields_from_book_fallbacks() {
        let book = BookMetadata::default();
        let fields = NamingFields::from_book(&book, Some("Part Folder"));
        assert_eq!(fields.title, "Part Folder");
        assert_eq!(fields.author, FALLBACK_AUTHOR);
        assert!(fields.narrator.is_none());

        let fields = NamingFields::from_book(&book, None);
        assert_eq!(fields.title, FALLBACK_TITLE);
    }

    #[test]
    fn test_fields_from_book() {
        let book = BookMetadata {
            title: "Dune".to_string(),
            creators: vec![
                Creator::new("Scott Brick", "narrator"),
                Creator::new("Frank Herbert", "author"),
            ],
            year: Some("1965".to_string()),
            ..Default::default()
        };
        let fields = NamingFields::from_book(&book, Some("ignored"));
        assert_eq!(fields.title, "Dune");
        assert_eq!(fields.author, "Frank Herbert");
        assert_eq!(fields.narrator.as_deref(), Some("Scott Brick"));
        assert_eq!(fields.year.as_deref(), Some("1965"));
    }
}
