//! Exports the [`build_site`] function which stitches together the high-level
//! steps of building the output static site: querying the posts
//! ([`crate::parser`]), generating page requests ([`crate::generate`]),
//! rendering them and the standalone pages ([`crate::write`]), and copying the
//! theme's static assets into the output directory.

use crate::config::Config;
use crate::generate::create_pages;
use crate::parser::{parse_pages, Error as ParseError, Parser as PostParser};
use crate::write::{Error as WriteError, Templates, Writer};
use gtmpl::Template;
use log::{debug, info};
use std::fmt;
use std::fs::File;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Marks an output directory as created by this tool. Only marked (or empty)
/// directories are cleaned before a build.
pub const WATERMARK_FILE: &str = ".kvblog";

/// Builds the site from a [`Config`] object. Nothing is written unless every
/// post and page parses and every template loads.
pub fn build_site(config: &Config) -> Result<()> {
    let parser = PostParser::new(&config.posts_source_directory);

    // Parse the template files.
    let templates = Templates {
        index: parse_template(config.index_template.iter())?,
        post: parse_template(config.post_template.iter())?,
        all_tags: parse_template(config.all_tags_template.iter())?,
        single_tag: parse_template(config.single_tag_template.iter())?,
        page: if config.page_template.is_empty() {
            None
        } else {
            Some(parse_template(config.page_template.iter())?)
        },
    };
    let standalone_pages = parse_pages(&config.pages_source_directory)?;

    let mut pages = Vec::new();
    let posts = create_pages(&parser, |page| pages.push(page))?;
    info!(
        "generated {} pages from {} posts, plus {} standalone pages",
        pages.len(),
        posts.len(),
        standalone_pages.len()
    );

    clean(&config.output_directory)?;

    let mut writer = Writer::new(&templates, &config.site, &config.output_directory);
    writer.write_pages(&pages, &posts)?;
    writer.write_standalone_pages(&standalone_pages)?;
    writer.write_index(&posts)?;
    let assets = writer.copy_assets(&posts)?;
    debug!("copied {} post assets", assets);

    // copy static directory
    let static_output_directory = config.output_directory.join("static");
    if config.static_source_directory.is_dir() {
        let copied = copy_dir(&config.static_source_directory, &static_output_directory)?;
        debug!("copied {} static files", copied);
    } else {
        debug!(
            "no static directory at `{}`",
            config.static_source_directory.display()
        );
    }

    info!("site written to `{}`", config.output_directory.display());
    Ok(())
}

// Deletes the output directory so stale pages don't survive a rebuild, but
// only if it's missing, empty, or watermarked. Afterwards the directory
// exists and is watermarked.
fn clean(dir: &Path) -> Result<()> {
    let clean_err = |err| Error::Clean {
        path: dir.to_owned(),
        err,
    };
    if dir.is_dir() {
        let watermarked = dir.join(WATERMARK_FILE).is_file();
        let empty = std::fs::read_dir(dir).map_err(clean_err)?.next().is_none();
        if !watermarked && !empty {
            return Err(Error::UnmanagedOutput(dir.to_owned()));
        }
        std::fs::remove_dir_all(dir).map_err(clean_err)?;
    }
    std::fs::create_dir_all(dir).map_err(clean_err)?;
    File::create(dir.join(WATERMARK_FILE)).map_err(clean_err)?;
    Ok(())
}

fn copy_dir(src: &Path, dst: &Path) -> Result<usize> {
    let mut copied = 0;
    for result in WalkDir::new(src) {
        let entry = result?;
        // strip_prefix can't fail; WalkDir yields descendants of `src`
        let relative = match entry.path().strip_prefix(src) {
            Ok(relative) => relative,
            Err(_) => continue,
        };
        if entry.file_type().is_dir() {
            std::fs::create_dir_all(dst.join(relative))?;
        } else {
            std::fs::copy(entry.path(), dst.join(relative))?;
            copied += 1;
        }
    }
    Ok(copied)
}

// Loads the template file contents, concatenates them, and parses the result
// into a template.
fn parse_template<P: AsRef<Path>>(template_files: impl Iterator<Item = P>) -> Result<Template> {
    let mut contents = String::new();
    for template_file in template_files {
        use std::io::Read;
        let template_file = template_file.as_ref();
        File::open(&template_file)
            .map_err(|e| Error::OpenTemplateFile {
                path: template_file.to_owned(),
                err: e,
            })?
            .read_to_string(&mut contents)?;
        contents.push(' ');
    }

    let mut template = Template::default();
    template.parse(&contents).map_err(Error::ParseTemplate)?;
    Ok(template)
}

type Result<T> = std::result::Result<T, Error>;

/// The error type for building a site. Errors can be during parsing, writing,
/// cleaning output directories, parsing template files, and other I/O.
#[derive(Debug)]
pub enum Error {
    /// Returned for errors during parsing.
    Parse(ParseError),

    /// Returned for errors writing pages to disk as HTML files.
    Write(WriteError),

    /// Returned for I/O problems while cleaning the output directory.
    Clean { path: PathBuf, err: std::io::Error },

    /// Returned when the output directory has content this tool didn't
    /// create.
    UnmanagedOutput(PathBuf),

    /// Returned for I/O problems while opening template files.
    OpenTemplateFile { path: PathBuf, err: std::io::Error },

    /// Returned for errors parsing template files.
    ParseTemplate(String),

    /// Returned for errors walking the static directory.
    WalkDir(walkdir::Error),

    /// Returned for other I/O errors.
    Io(std::io::Error),
}

impl fmt::Display for Error {
    /// Implements [`fmt::Display`] for [`Error`].
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Parse(err) => err.fmt(f),
            Error::Write(err) => err.fmt(f),
            Error::Clean { path, err } => {
                write!(f, "Cleaning directory '{}': {}", path.display(), err)
            }
            Error::UnmanagedOutput(path) => write!(
                f,
                "Refusing to overwrite '{}': it is not empty and has no `{}` file",
                path.display(),
                WATERMARK_FILE
            ),
            Error::OpenTemplateFile { path, err } => {
                write!(f, "Opening template file '{}': {}", path.display(), err)
            }
            Error::ParseTemplate(err) => err.fmt(f),
            Error::WalkDir(err) => err.fmt(f),
            Error::Io(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    /// Implements [`std::error::Error`] for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Parse(err) => Some(err),
            Error::Write(err) => Some(err),
            Error::Clean { path: _, err } => Some(err),
            Error::UnmanagedOutput(_) => None,
            Error::OpenTemplateFile { path: _, err } => Some(err),
            Error::ParseTemplate(_) => None,
            Error::WalkDir(err) => Some(err),
            Error::Io(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for Error {
    /// Converts [`std::io::Error`]s into [`Error`]. This allows us to use the
    /// `?` operator.
    fn from(err: std::io::Error) -> Error {
        Error::Io(err)
    }
}

impl From<ParseError> for Error {
    /// Converts [`ParseError`]s into [`Error`]. This allows us to use the `?`
    /// operator.
    fn from(err: ParseError) -> Error {
        Error::Parse(err)
    }
}

impl From<WriteError> for Error {
    /// Converts [`WriteError`]s into [`Error`]. This allows us to use the `?`
    /// operator.
    fn from(err: WriteError) -> Error {
        Error::Write(err)
    }
}

impl From<walkdir::Error> for Error {
    fn from(err: walkdir::Error) -> Error {
        Error::WalkDir(err)
    }
}
