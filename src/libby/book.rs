use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

static MARKUP_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]+>").expect("markup pattern is valid"));

/// A person credited on the book
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Creator {
    pub name: String,
    #[serde(default)]
    pub role: String,
}

impl Creator {
    pub fn new(name: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            role: role.into(),
        }
    }
}

/// Book-level fields pulled out of the metadata document
#[derive(Debug, Clone, Default, Serialize)]
pub struct BookMetadata {
    pub title: String,
    pub creators: Vec<Creator>,
    /// Description as published, markup included
    pub description: String,
    pub cover_url: Option<String>,
    pub year: Option<String>,
}

impl BookMetadata {
    /// First creator (in list order) credited with `role`
    pub fn first_with_role(&self, role: &str) -> Option<&str> {
        self.creators
            .iter()
            .find(|c| c.role.eq_ignore_ascii_case(role))
            .map(|c| c.name.as_str())
    }

    pub fn author(&self) -> Option<&str> {
        self.first_with_role("author")
    }

    pub fn narrator(&self) -> Option<&str> {
        self.first_with_role("narrator")
    }

    /// Description with markup tags removed
    pub fn comment(&self) -> String {
        strip_markup(&self.description)
    }
}

/// Remove every `<...>` tag. Entities are left alone.
pub fn strip_markup(text: &str) -> String {
    MARKUP_TAG.replace_all(text, "").into_owned()
}
