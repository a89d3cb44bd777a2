//! Standalone pages such as `about` or `projects`. Unlike posts they have no
//! date or tags and never show up in listings; each one is rendered at
//! `/{name}/` with the theme's page template.

use gtmpl::Value;
use serde::Deserialize;
use std::collections::HashMap;

/// A standalone page loaded from `content/pages/{name}.md`.
#[derive(Clone, Debug, PartialEq)]
pub struct Page {
    /// The URL path of the page, e.g. `/about/`.
    pub slug: String,

    pub title: String,

    pub description: Option<String>,

    /// The rendered HTML body.
    pub body: String,
}

/// The YAML header at the top of a page source file.
#[derive(Deserialize, Clone, Debug, PartialEq)]
pub struct PageFrontmatter {
    pub title: String,

    #[serde(default)]
    pub description: Option<String>,
}

impl Page {
    /// Converts the page into its template value: `slug`, `url`, `title`,
    /// `description` and `body`.
    pub fn to_value(&self) -> Value {
        let mut m: HashMap<String, Value> = HashMap::new();
        m.insert("slug".to_owned(), Value::String(self.slug.clone()));
        m.insert("url".to_owned(), Value::String(self.slug.clone()));
        m.insert("title".to_owned(), Value::String(self.title.clone()));
        m.insert(
            "description".to_owned(),
            match &self.description {
                Some(description) => Value::String(description.clone()),
                None => Value::Nil,
            },
        );
        m.insert("body".to_owned(), Value::String(self.body.clone()));
        Value::Object(m)
    }
}
