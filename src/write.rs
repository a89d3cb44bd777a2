use crate::config::{Site, Social};
use crate::generate::{Component, Context, PageRequest};
use crate::page::Page;
use crate::post::{tag_value, Post};
use gtmpl::{Template, Value};
use log::debug;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::io;
use std::path::{Component as PathComponent, Path, PathBuf};
use std::rc::Rc;

const INDEX_FILE: &str = "index.html";

/// The parsed templates for every kind of page.
pub struct Templates {
    /// The home page, listing every published post.
    pub index: Template,

    /// Post pages ([`Component::BlogPost`]).
    pub post: Template,

    /// The tag listing ([`Component::AllTags`]).
    pub all_tags: Template,

    /// Per-tag post listings ([`Component::SingleTag`]).
    pub single_tag: Template,

    /// Standalone pages. Only required when the site has any.
    pub page: Option<Template>,
}

impl Templates {
    fn for_component(&self, component: Component) -> &Template {
        match component {
            Component::AllTags => &self.all_tags,
            Component::SingleTag => &self.single_tag,
            Component::BlogPost => &self.post,
        }
    }
}

/// Responsible for templating and writing HTML pages to disk from
/// [`PageRequest`]s. A writer refuses to write the same output file twice,
/// so two pages whose paths map to one file are reported instead of one
/// silently replacing the other.
pub struct Writer<'a> {
    templates: &'a Templates,

    /// Site metadata, available to every template as `site`.
    site: &'a Site,

    /// The directory in which the HTML files will be written. A page with path
    /// `/tags/rust` is written to `{output_directory}/tags/rust/index.html`.
    output_directory: &'a Path,

    written: HashSet<PathBuf>,
}

impl<'a> Writer<'a> {
    pub fn new(templates: &'a Templates, site: &'a Site, output_directory: &'a Path) -> Writer<'a> {
        Writer {
            templates,
            site,
            output_directory,
            written: HashSet::new(),
        }
    }

    /// Renders each page request with the template for its component. `posts`
    /// are the posts the requests were generated from; post pages look their
    /// content up by slug.
    pub fn write_pages(&mut self, pages: &[PageRequest], posts: &[Rc<Post>]) -> Result<()> {
        let templates = self.templates;
        let by_slug: HashMap<&str, &Post> =
            posts.iter().map(|p| (p.slug.as_str(), p.as_ref())).collect();

        for page in pages {
            let mut fields: HashMap<String, Value> = HashMap::new();
            match &page.context {
                Context::Tags { tags } => {
                    fields.insert(
                        "tags".to_owned(),
                        Value::Array(tags.iter().map(|t| tag_value(t)).collect()),
                    );
                }
                Context::Tag { tag, posts } => {
                    fields.insert("tag".to_owned(), Value::String(tag.clone()));
                    fields.insert(
                        "posts".to_owned(),
                        Value::Array(posts.iter().map(|p| p.summarize()).collect()),
                    );
                }
                Context::Post {
                    slug,
                    previous,
                    next,
                } => {
                    let post = by_slug
                        .get(slug.as_str())
                        .ok_or_else(|| Error::MissingPost(slug.clone()))?;
                    let link = |neighbor: Option<&Rc<Post>>| match neighbor {
                        Some(p) => p.link(),
                        None => Value::Nil,
                    };
                    fields.insert("slug".to_owned(), Value::String(slug.clone()));
                    fields.insert("post".to_owned(), post.to_value());
                    fields.insert("previous".to_owned(), link(previous.as_ref()));
                    fields.insert("next".to_owned(), link(next.as_ref()));
                }
            }

            let file_path = self.claim(&page.path)?;
            debug!("writing `{}` to `{}`", page.path, file_path.display());
            self.render(
                templates.for_component(page.component),
                &page.path,
                fields,
                &file_path,
            )?;
        }
        Ok(())
    }

    /// Renders each standalone page at its slug with the page template, which
    /// gets the page as `page`.
    pub fn write_standalone_pages(&mut self, pages: &[Page]) -> Result<()> {
        if pages.is_empty() {
            return Ok(());
        }
        let templates = self.templates;
        let template = templates.page.as_ref().ok_or(Error::MissingPageTemplate)?;

        for page in pages {
            let mut fields: HashMap<String, Value> = HashMap::new();
            fields.insert("page".to_owned(), page.to_value());
            let file_path = self.claim(&page.slug)?;
            debug!("writing `{}` to `{}`", page.slug, file_path.display());
            self.render(template, &page.slug, fields, &file_path)?;
        }
        Ok(())
    }

    /// Renders the home page, which lists every post in `posts`.
    pub fn write_index(&mut self, posts: &[Rc<Post>]) -> Result<()> {
        let templates = self.templates;
        let mut fields: HashMap<String, Value> = HashMap::new();
        fields.insert(
            "posts".to_owned(),
            Value::Array(posts.iter().map(|p| p.summarize()).collect()),
        );
        let file_path = self.claim("/")?;
        self.render(&templates.index, "/", fields, &file_path)
    }

    /// Copies the assets of bundled posts next to the post's page so relative
    /// links keep working. Returns the number of files copied.
    pub fn copy_assets(&self, posts: &[Rc<Post>]) -> Result<usize> {
        let mut copied = 0;
        for post in posts {
            let bundle = match &post.bundle {
                Some(bundle) => bundle,
                None => continue,
            };
            let page_path = output_path(self.output_directory, &post.slug)?;
            let page_dir = page_path.parent().unwrap_or(self.output_directory);
            for asset in &bundle.assets {
                let dst = page_dir.join(asset);
                if let Some(dir) = dst.parent() {
                    std::fs::create_dir_all(dir)?;
                }
                std::fs::copy(bundle.directory.join(asset), &dst)?;
                copied += 1;
            }
        }
        Ok(copied)
    }

    // Reserves the output file for `path` and creates its directory. Fails if
    // another page already claimed the same file.
    fn claim(&mut self, path: &str) -> Result<PathBuf> {
        let file_path = output_path(self.output_directory, path)?;
        if !self.written.insert(file_path.clone()) {
            return Err(Error::DuplicateOutput {
                path: path.to_owned(),
                file: file_path,
            });
        }
        if let Some(dir) = file_path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        Ok(file_path)
    }

    fn render(
        &self,
        template: &Template,
        path: &str,
        mut fields: HashMap<String, Value>,
        file_path: &Path,
    ) -> Result<()> {
        let permalink = self.site.url.join(path.trim_start_matches('/'))?;
        fields.insert("site".to_owned(), site_value(self.site));
        fields.insert("path".to_owned(), Value::String(path.to_owned()));
        fields.insert("permalink".to_owned(), Value::String(permalink.to_string()));

        let context = gtmpl::Context::from(Value::Object(fields))?;
        template.execute(&mut std::fs::File::create(file_path)?, &context)?;
        Ok(())
    }
}

/// Maps a page path to its output file. The root path maps to
/// `{output_directory}/index.html`; any other path `p` maps to
/// `{output_directory}/{p}/index.html`. Paths are used verbatim, but a path
/// with a `.` or `..` segment is rejected: `..` would land outside the output
/// directory and `.` would alias its parent's page.
pub fn output_path(output_directory: &Path, path: &str) -> Result<PathBuf> {
    let relative = Path::new(path.trim_matches('/'));
    // `Path::components` drops interior `.` segments, so look at the raw text
    let dot_segment = path.split('/').any(|segment| segment == "." || segment == "..");
    if dot_segment
        || relative
            .components()
            .any(|c| !matches!(c, PathComponent::Normal(_)))
    {
        return Err(Error::UnsafePath(path.to_owned()));
    }
    Ok(output_directory.join(relative).join(INDEX_FILE))
}

fn site_value(site: &Site) -> Value {
    let string_or_nil = |s: &Option<String>| match s {
        Some(s) => Value::String(s.clone()),
        None => Value::Nil,
    };
    let Social {
        github_url,
        instagram_url,
    } = &site.social;
    let mut social: HashMap<String, Value> = HashMap::new();
    social.insert("github_url".to_owned(), string_or_nil(github_url));
    social.insert("instagram_url".to_owned(), string_or_nil(instagram_url));

    let mut m: HashMap<String, Value> = HashMap::new();
    m.insert("title".to_owned(), Value::String(site.title.clone()));
    m.insert("author".to_owned(), string_or_nil(&site.author));
    m.insert("description".to_owned(), Value::String(site.description.clone()));
    m.insert("summary".to_owned(), Value::String(site.summary.clone()));
    m.insert("url".to_owned(), Value::String(site.url.to_string()));
    m.insert("social".to_owned(), Value::Object(social));
    Value::Object(m)
}

/// The result of a fallible page-writing operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error in a page-writing operation.
#[derive(Debug)]
pub enum Error {
    /// An error during templating.
    Template(String),

    /// A post page was requested for a slug with no matching post.
    MissingPost(String),

    /// A page path that would resolve outside of the output directory, or
    /// onto another page's file.
    UnsafePath(String),

    /// Two pages map to the same output file, e.g. the tag `""` and the tag
    /// listing at `/tags`.
    DuplicateOutput { path: String, file: PathBuf },

    /// The site has standalone pages but the theme has no page template.
    MissingPageTemplate,

    /// An error building a page's permalink.
    UrlParse(url::ParseError),

    /// An error writing the output files.
    Io(io::Error),
}

impl From<io::Error> for Error {
    /// Converts an [`io::Error`] into an [`Error`]. This allows us to use the
    /// `?` operator for fallible I/O operations.
    fn from(err: io::Error) -> Error {
        Error::Io(err)
    }
}

impl From<String> for Error {
    /// Converts a template error message ([`String`]) into an [`Error`]. This
    /// allows us to use the `?` operator for fallible template operations.
    fn from(err: String) -> Error {
        Error::Template(err)
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Error {
        Error::UrlParse(err)
    }
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as presentable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Template(err) => err.fmt(f),
            Error::MissingPost(slug) => write!(f, "no post with slug `{}`", slug),
            Error::UnsafePath(path) => {
                write!(f, "page path `{}` escapes the output directory", path)
            }
            Error::DuplicateOutput { path, file } => write!(
                f,
                "page `{}` would overwrite `{}`, which another page already wrote",
                path,
                file.display()
            ),
            Error::MissingPageTemplate => {
                write!(f, "standalone pages need a `page_template` in theme.yaml")
            }
            Error::UrlParse(err) => err.fmt(f),
            Error::Io(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::UrlParse(err) => Some(err),
            Error::Io(err) => Some(err),
            _ => None,
        }
    }
}
