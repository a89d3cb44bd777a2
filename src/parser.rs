//! Defines the [`Parser`] and its [`Error`] type: the logic for loading posts
//! from the file system into memory. A [`Parser`] is the site's
//! [`ContentSource`].

use std::{
    fmt,
    fs::{read_dir, File},
    path::{Path, PathBuf},
};

use chrono::NaiveDate;
use log::debug;
use walkdir::WalkDir;

use crate::markdown;
use crate::page::{Page, PageFrontmatter};
use crate::post::{Bundle, Frontmatter, Post};
use crate::query::{ContentSource, Query};

const MARKDOWN_EXTENSION: &str = ".md";
const BUNDLE_INDEX: &str = "index.md";

/// Parses [`Post`] objects from source files.
pub struct Parser<'a> {
    /// The directory holding post files and post bundles.
    source_directory: &'a Path,
}

impl<'a> Parser<'a> {
    pub fn new(source_directory: &'a Path) -> Parser<'a> {
        Parser { source_directory }
    }

    /// Searches the source directory for posts and returns them in directory
    /// order. A post is either a `{name}.md` file or a `{name}/index.md`
    /// bundle; both get the slug `/{name}/`. Each post file must be
    /// structured as follows:
    ///
    /// 1. Initial frontmatter fence (`---`)
    /// 2. YAML frontmatter with fields `title`, `date`, and optionally
    ///    `draft`, `description` and `tags`
    /// 3. Terminal frontmatter fence (`---`)
    /// 4. Post body
    ///
    /// For example:
    ///
    /// ```md
    /// ---
    /// title: Hello, world!
    /// date: 2021-04-16
    /// tags: [greet]
    /// ---
    /// # Hello
    ///
    /// World
    /// ```
    pub fn parse_posts(&self) -> Result<Vec<Post>> {
        let mut posts = Vec::new();
        for result in read_dir(self.source_directory)? {
            let entry = result?;
            let os_file_name = entry.file_name();
            let file_name = os_file_name
                .to_str()
                .ok_or_else(|| InvalidFileNameError(entry.path()))?;
            if Self::is_bundle(&entry)? {
                posts.push(self.parse_post_bundle(file_name)?);
            } else if file_name.ends_with(MARKDOWN_EXTENSION) {
                posts.push(self.parse_post(
                    &entry.path(),
                    file_name.trim_end_matches(MARKDOWN_EXTENSION),
                )?);
            }
        }

        debug!(
            "parsed {} posts from `{}`",
            posts.len(),
            self.source_directory.display()
        );
        Ok(posts)
    }

    fn is_bundle(entry: &std::fs::DirEntry) -> std::io::Result<bool> {
        Ok(entry.file_type()?.is_dir() && entry.path().join(BUNDLE_INDEX).is_file())
    }

    fn parse_post_bundle(&self, name: &str) -> Result<Post> {
        let directory = self.source_directory.join(name);
        let mut post = self.parse_post(&directory.join(BUNDLE_INDEX), name)?;

        let mut assets = Vec::new();
        for result in WalkDir::new(&directory).sort_by(|a, b| a.file_name().cmp(b.file_name())) {
            let entry = result?;
            if entry.file_type().is_file() && entry.depth() > 0 {
                // strip_prefix can't fail; WalkDir yields descendants of
                // `directory`
                if let Ok(relative) = entry.path().strip_prefix(&directory) {
                    if relative != Path::new(BUNDLE_INDEX) {
                        assets.push(relative.to_owned());
                    }
                }
            }
        }

        post.bundle = Some(Bundle { directory, assets });
        Ok(post)
    }

    /// Parses a single [`Post`] from the file at `path`. `name` is the file
    /// name (for files) or the directory name (for bundles) and determines
    /// the slug.
    fn parse_post(&self, path: &Path, name: &str) -> Result<Post> {
        match Self::_parse_post(path, name) {
            Ok(p) => Ok(p),
            Err(e) => Err(Error::Annotated(
                format!("parsing post `{}`", path.display()),
                Box::new(e),
            )),
        }
    }

    fn _parse_post(path: &Path, name: &str) -> Result<Post> {
        use std::io::Read;
        let mut contents = String::new();
        File::open(path)?.read_to_string(&mut contents)?;
        let (yaml, body) = split_frontmatter(&contents)?;
        let frontmatter: Frontmatter = serde_yaml::from_str(yaml)?;

        Ok(Post {
            slug: format!("/{}/", name),
            date: parse_date(&frontmatter.date)?,
            title: frontmatter.title,
            tags: frontmatter.tags.unwrap_or_default(),
            draft: frontmatter.draft,
            description: frontmatter.description,
            excerpt: markdown::excerpt(body, markdown::EXCERPT_LENGTH),
            body: markdown::to_html(body),
            bundle: None,
        })
    }
}

/// Loads the standalone pages from the `{name}.md` files in `directory`,
/// sorted by slug. Each page gets the slug `/{name}/`. A missing directory
/// means the site has no pages.
pub fn parse_pages(directory: &Path) -> Result<Vec<Page>> {
    if !directory.is_dir() {
        debug!("no pages directory at `{}`", directory.display());
        return Ok(Vec::new());
    }

    let mut pages = Vec::new();
    for result in read_dir(directory)? {
        let entry = result?;
        let os_file_name = entry.file_name();
        let file_name = os_file_name
            .to_str()
            .ok_or_else(|| InvalidFileNameError(entry.path()))?;
        if !entry.file_type()?.is_file() || !file_name.ends_with(MARKDOWN_EXTENSION) {
            continue;
        }
        let path = entry.path();
        let name = file_name.trim_end_matches(MARKDOWN_EXTENSION);
        match parse_page(&path, name) {
            Ok(page) => pages.push(page),
            Err(e) => {
                return Err(Error::Annotated(
                    format!("parsing page `{}`", path.display()),
                    Box::new(e),
                ))
            }
        }
    }
    pages.sort_by(|a, b| a.slug.cmp(&b.slug));
    Ok(pages)
}

fn parse_page(path: &Path, name: &str) -> Result<Page> {
    use std::io::Read;
    let mut contents = String::new();
    File::open(path)?.read_to_string(&mut contents)?;
    let (yaml, body) = split_frontmatter(&contents)?;
    let frontmatter: PageFrontmatter = serde_yaml::from_str(yaml)?;
    Ok(Page {
        slug: format!("/{}/", name),
        title: frontmatter.title,
        description: frontmatter.description,
        body: markdown::to_html(body),
    })
}

impl ContentSource for Parser<'_> {
    type Error = Error;

    fn query(&self, query: &Query) -> Result<Vec<Post>> {
        Ok(query.apply(self.parse_posts()?))
    }
}

/// Splits a post source into its YAML frontmatter and its markdown body.
fn split_frontmatter(input: &str) -> Result<(&str, &str)> {
    const FENCE: &str = "---";
    if !input.starts_with(FENCE) {
        return Err(Error::FrontmatterMissingStartFence);
    }
    let yaml_start = FENCE.len();
    let yaml_stop = match input[yaml_start..].find("\n---") {
        None => return Err(Error::FrontmatterMissingEndFence),
        Some(offset) => yaml_start + offset + 1,
    };
    // the body starts on the line after the closing fence
    let body_start = match input[yaml_stop..].find('\n') {
        None => input.len(),
        Some(offset) => yaml_stop + offset + 1,
    };
    Ok((&input[yaml_start..yaml_stop], &input[body_start..]))
}

/// Parses a `YYYY-MM-DD` date, ignoring any time component after a `T` or a
/// space.
fn parse_date(date: &str) -> Result<NaiveDate> {
    let day = date
        .trim()
        .split(|c: char| c == 'T' || c == ' ')
        .next()
        .unwrap_or_default();
    NaiveDate::parse_from_str(day, "%Y-%m-%d").map_err(|err| Error::InvalidDate {
        date: date.to_owned(),
        err,
    })
}

#[derive(Debug)]
pub struct InvalidFileNameError(PathBuf);

impl fmt::Display for InvalidFileNameError {
    /// Displays an [`InvalidFileNameError`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "invalid file name: {:?}", &self.0)
    }
}

impl std::error::Error for InvalidFileNameError {}

/// Represents the result of a [`Post`]-parse operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error parsing a [`Post`] object.
#[derive(Debug)]
pub enum Error {
    /// Returned when a post source file is missing its starting frontmatter
    /// fence (`---`).
    FrontmatterMissingStartFence,

    /// Returned when a post source file is missing its terminal frontmatter
    /// fence (`---` i.e., the starting fence was found but the ending one was
    /// missing).
    FrontmatterMissingEndFence,

    /// Returned when there was an error parsing the frontmatter as YAML.
    DeserializeYaml(serde_yaml::Error),

    /// Returned when the frontmatter date isn't `YYYY-MM-DD`.
    InvalidDate {
        date: String,
        err: chrono::ParseError,
    },

    /// Returned for other I/O errors.
    Io(std::io::Error),

    /// Returned for WalkDir I/O errors.
    WalkDir(walkdir::Error),

    /// Returned when a source file name isn't valid UTF-8.
    InvalidFileName(InvalidFileNameError),

    /// An error with an annotation.
    Annotated(String, Box<Error>),
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::FrontmatterMissingStartFence => {
                write!(f, "Post must begin with `---`")
            }
            Error::FrontmatterMissingEndFence => {
                write!(f, "Missing closing `---`")
            }
            Error::DeserializeYaml(err) => err.fmt(f),
            Error::InvalidDate { date, err } => {
                write!(f, "invalid date `{}`: {}", date, err)
            }
            Error::Io(err) => err.fmt(f),
            Error::WalkDir(err) => err.fmt(f),
            Error::InvalidFileName(err) => err.fmt(f),
            Error::Annotated(annotation, err) => {
                write!(f, "{}: {}", &annotation, err)
            }
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::FrontmatterMissingStartFence => None,
            Error::FrontmatterMissingEndFence => None,
            Error::DeserializeYaml(err) => Some(err),
            Error::InvalidDate { err, .. } => Some(err),
            Error::Io(err) => Some(err),
            Error::WalkDir(err) => Some(err),
            Error::InvalidFileName(err) => Some(err),
            Error::Annotated(_, err) => Some(err),
        }
    }
}

impl From<InvalidFileNameError> for Error {
    fn from(err: InvalidFileNameError) -> Error {
        Error::InvalidFileName(err)
    }
}

impl From<serde_yaml::Error> for Error {
    /// Converts a [`serde_yaml::Error`] into an [`Error`]. It allows us to use
    /// the `?` operator for [`serde_yaml`] deserialization functions.
    fn from(err: serde_yaml::Error) -> Error {
        Error::DeserializeYaml(err)
    }
}

impl From<walkdir::Error> for Error {
    /// Converts a [`walkdir::Error`] into an [`Error`]. It allows us to
    /// use the `?` operator for fallible directory walks.
    fn from(err: walkdir::Error) -> Error {
        Error::WalkDir(err)
    }
}

impl From<std::io::Error> for Error {
    /// Converts a [`std::io::Error`] into an [`Error`]. It allows us to
    /// use the `?` operator for fallible I/O functions.
    fn from(err: std::io::Error) -> Error {
        Error::Io(err)
    }
}
