//! Defines the [`Post`] type and its [`Frontmatter`] schema, along with the
//! conversions from posts into template [`Value`]s (see [`Post::to_value`],
//! [`Post::summarize`] and [`Post::link`]).

use chrono::NaiveDate;
use gtmpl::Value;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// The display format for post dates, e.g. `May 02, 2020`.
pub const DATE_FORMAT: &str = "%B %d, %Y";

/// A single published (or draft) blog post. Posts are produced by
/// [`crate::parser::Parser`] and never mutated afterwards.
#[derive(Clone, Debug, PartialEq)]
pub struct Post {
    /// The URL path identifying the post, e.g. `/hello-world/`.
    pub slug: String,

    pub title: String,

    pub date: NaiveDate,

    /// The post's tags in frontmatter order. Tags are case-sensitive and are
    /// never normalized.
    pub tags: Vec<String>,

    /// The frontmatter `draft` flag. Only posts that explicitly say
    /// `draft: false` are published; see [`Post::is_published`].
    pub draft: Option<bool>,

    pub description: Option<String>,

    /// A plain-text prefix of the post body. See [`crate::markdown::excerpt`].
    pub excerpt: String,

    /// The rendered HTML body.
    pub body: String,

    /// Set when the post was loaded from a bundle directory.
    pub bundle: Option<Bundle>,
}

/// A post directory holding an `index.md` file and the assets it links to.
#[derive(Clone, Debug, PartialEq)]
pub struct Bundle {
    /// The absolute source directory of the bundle.
    pub directory: PathBuf,

    /// Asset paths relative to `directory`.
    pub assets: Vec<PathBuf>,
}

/// The YAML header at the top of every post source file.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Frontmatter {
    pub title: String,

    /// The post date as `YYYY-MM-DD`. A trailing time component is accepted
    /// and ignored.
    pub date: String,

    #[serde(default)]
    pub draft: Option<bool>,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub tags: Option<Vec<String>>,
}

impl Post {
    /// Whether the post is published. A post without a `draft` field is
    /// treated like a draft.
    pub fn is_published(&self) -> bool {
        self.draft == Some(false)
    }

    /// Returns the post description, falling back to the excerpt when the
    /// description is absent or blank.
    pub fn summary(&self) -> &str {
        match &self.description {
            Some(description) if !description.trim().is_empty() => description,
            _ => &self.excerpt,
        }
    }

    /// The post date formatted for display.
    pub fn display_date(&self) -> String {
        self.date.format(DATE_FORMAT).to_string()
    }

    /// Converts the post into the template value for its own page. The
    /// result has every field from [`Post::summarize`] plus `body`.
    pub fn to_value(&self) -> Value {
        let mut m = self.summary_fields();
        m.insert("body".to_owned(), Value::String(self.body.clone()));
        Value::Object(m)
    }

    /// Converts the post into the template value used in listings (the home
    /// page and tag pages): `slug`, `url`, `title`, `date`, `date_iso`,
    /// `description`, `excerpt`, `summary` and `tags`.
    pub fn summarize(&self) -> Value {
        Value::Object(self.summary_fields())
    }

    /// Converts the post into a navigation link: `slug`, `url` and `title`.
    pub fn link(&self) -> Value {
        let mut m: HashMap<String, Value> = HashMap::new();
        m.insert("slug".to_owned(), Value::String(self.slug.clone()));
        m.insert("url".to_owned(), Value::String(self.slug.clone()));
        m.insert("title".to_owned(), Value::String(self.title.clone()));
        Value::Object(m)
    }

    fn summary_fields(&self) -> HashMap<String, Value> {
        let mut m: HashMap<String, Value> = HashMap::new();
        m.insert("slug".to_owned(), Value::String(self.slug.clone()));
        m.insert("url".to_owned(), Value::String(self.slug.clone()));
        m.insert("title".to_owned(), Value::String(self.title.clone()));
        m.insert("date".to_owned(), Value::String(self.display_date()));
        m.insert(
            "date_iso".to_owned(),
            Value::String(self.date.format("%Y-%m-%d").to_string()),
        );
        m.insert(
            "description".to_owned(),
            match &self.description {
                Some(description) => Value::String(description.clone()),
                None => Value::Nil,
            },
        );
        m.insert("excerpt".to_owned(), Value::String(self.excerpt.clone()));
        m.insert("summary".to_owned(), Value::String(self.summary().to_owned()));
        m.insert(
            "tags".to_owned(),
            Value::Array(self.tags.iter().map(|t| tag_value(t)).collect()),
        );
        m
    }
}

/// Converts a tag name into a template value with fields `tag` and `url`.
pub fn tag_value(tag: &str) -> Value {
    let mut m: HashMap<String, Value> = HashMap::new();
    m.insert("tag".to_owned(), Value::String(tag.to_owned()));
    m.insert("url".to_owned(), Value::String(tag_path(tag)));
    Value::Object(m)
}

/// The page path for a tag. The tag is used verbatim as a path segment.
pub fn tag_path(tag: &str) -> String {
    format!("/tags/{}", tag)
}

#[cfg(test)]
impl Post {
    /// Builds a minimal post for tests.
    pub(crate) fn stub(slug: &str, date: &str, tags: &[&str]) -> Post {
        Post {
            slug: slug.to_owned(),
            title: slug.trim_matches('/').to_owned(),
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            tags: tags.iter().map(|t| (*t).to_owned()).collect(),
            draft: Some(false),
            description: None,
            excerpt: String::new(),
            body: String::new(),
            bundle: None,
        }
    }
}
