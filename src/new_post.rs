//! Scaffolds new draft posts.

use crate::post::Frontmatter;
use chrono::NaiveDate;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// Creates `{posts_source_directory}/{slugified title}/index.md` holding
/// draft frontmatter dated `date` and an empty body. Returns the path of the
/// new file. Fails if the post directory already exists.
pub fn new_post(posts_source_directory: &Path, title: &str, date: NaiveDate) -> Result<PathBuf> {
    let name = slug::slugify(title);
    if name.is_empty() {
        return Err(Error::EmptyTitle);
    }

    let directory = posts_source_directory.join(&name);
    if directory.exists() {
        return Err(Error::AlreadyExists(directory));
    }

    let frontmatter = Frontmatter {
        title: title.to_owned(),
        date: date.format("%Y-%m-%d").to_string(),
        draft: Some(true),
        description: Some(String::new()),
        tags: Some(Vec::new()),
    };
    let yaml = serde_yaml::to_string(&frontmatter)?;

    fs::create_dir_all(&directory)?;
    let path = directory.join("index.md");
    fs::write(
        &path,
        format!("---\n{}\n---\n\n", yaml.trim_start_matches("---\n").trim_end()),
    )?;
    Ok(path)
}

type Result<T> = std::result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
    /// Returned when the title has nothing to build a directory name from.
    EmptyTitle,

    /// Returned when the post directory already exists.
    AlreadyExists(PathBuf),

    /// Returned when the frontmatter can't be serialized.
    SerializeYaml(serde_yaml::Error),

    Io(std::io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::EmptyTitle => write!(f, "post title must contain a letter or digit"),
            Error::AlreadyExists(path) => {
                write!(f, "post directory '{}' already exists", path.display())
            }
            Error::SerializeYaml(err) => err.fmt(f),
            Error::Io(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::EmptyTitle => None,
            Error::AlreadyExists(_) => None,
            Error::SerializeYaml(err) => Some(err),
            Error::Io(err) => Some(err),
        }
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Error {
        Error::SerializeYaml(err)
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Error {
        Error::Io(err)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::parser::Parser;
    use crate::query::{ContentSource, Query};
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, 5, 2).unwrap()
    }

    #[test]
    fn test_new_post_is_a_parseable_draft() {
        let dir = TempDir::new().unwrap();
        let path = new_post(dir.path(), "Intro to Regex: Part 1", date()).unwrap();
        assert_eq!(dir.path().join("intro-to-regex-part-1/index.md"), path);

        let posts = Parser::new(dir.path()).parse_posts().unwrap();
        assert_eq!(1, posts.len());
        let post = &posts[0];
        assert_eq!("/intro-to-regex-part-1/", post.slug);
        assert_eq!("Intro to Regex: Part 1", post.title);
        assert_eq!(date(), post.date);
        assert_eq!(Some(true), post.draft);
        assert!(post.tags.is_empty());
        assert_eq!(Some(String::new()), post.description);

        // drafts stay out of the published set
        let published = Parser::new(dir.path()).query(&Query::default()).unwrap();
        assert!(published.is_empty());
    }

    #[test]
    fn test_new_post_refuses_existing_directory() {
        let dir = TempDir::new().unwrap();
        new_post(dir.path(), "Hello", date()).unwrap();
        match new_post(dir.path(), "hello", date()) {
            Err(Error::AlreadyExists(path)) => assert_eq!(dir.path().join("hello"), path),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_new_post_rejects_empty_title() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(new_post(dir.path(), "  !! ", date()), Err(Error::EmptyTitle)));
    }
}
