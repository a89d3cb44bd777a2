//! Loads the project configuration: `kvblog.yaml` at the project root and
//! `theme/theme.yaml` next to it.

use log::debug;
use serde::Deserialize;
use std::fmt;
use std::fs::File;
use std::path::{Path, PathBuf};
use url::Url;

/// The project file name. [`Config::from_directory`] looks for it in the
/// given directory and each of its ancestors.
pub const PROJECT_FILE: &str = "kvblog.yaml";

/// The default output directory, relative to the project root.
pub const DEFAULT_OUTPUT_DIRECTORY: &str = "_site";

#[derive(Deserialize)]
struct Project {
    site_url: Url,
    title: String,

    #[serde(default)]
    author: Option<String>,

    #[serde(default)]
    description: String,

    #[serde(default)]
    summary: String,

    #[serde(default)]
    social: Social,
}

#[derive(Deserialize)]
struct Theme {
    index_template: Vec<PathBuf>,
    post_template: Vec<PathBuf>,
    all_tags_template: Vec<PathBuf>,
    single_tag_template: Vec<PathBuf>,

    // only needed when the project has standalone pages
    #[serde(default)]
    page_template: Vec<PathBuf>,
}

/// Links to the author's profiles elsewhere.
#[derive(Deserialize, Clone, Debug, Default, PartialEq)]
pub struct Social {
    #[serde(default)]
    pub github_url: Option<String>,

    #[serde(default)]
    pub instagram_url: Option<String>,
}

/// Site-wide metadata made available to every template as `site`.
#[derive(Clone, Debug, PartialEq)]
pub struct Site {
    pub title: String,
    pub author: Option<String>,
    pub description: String,
    pub summary: String,

    /// The absolute base URL of the site. Always ends with a `/`.
    pub url: Url,

    pub social: Social,
}

pub struct Config {
    pub site: Site,
    pub project_directory: PathBuf,
    pub posts_source_directory: PathBuf,

    /// Holds the standalone pages, one `{name}.md` file each.
    pub pages_source_directory: PathBuf,

    pub static_source_directory: PathBuf,
    pub output_directory: PathBuf,
    pub index_template: Vec<PathBuf>,
    pub post_template: Vec<PathBuf>,
    pub all_tags_template: Vec<PathBuf>,
    pub single_tag_template: Vec<PathBuf>,

    /// Empty when the theme has no page template.
    pub page_template: Vec<PathBuf>,
}

impl Config {
    /// Finds the project file in `dir` or the nearest ancestor directory and
    /// loads it. Output goes to `output_directory` if given, otherwise to
    /// `{project}/_site`.
    pub fn from_directory(dir: &Path, output_directory: Option<&Path>) -> Result<Config> {
        let mut current = Some(dir);
        while let Some(dir) = current {
            let path = dir.join(PROJECT_FILE);
            if path.is_file() {
                return Config::from_project_file(&path, output_directory);
            }
            current = dir.parent();
        }
        Err(Error::ProjectNotFound(dir.to_owned()))
    }

    pub fn from_project_file(path: &Path, output_directory: Option<&Path>) -> Result<Config> {
        let project: Project = serde_yaml::from_reader(open(path, "project")?)?;
        let project_root = path
            .parent()
            .ok_or_else(|| Error::ProjectNotFound(path.to_owned()))?;
        debug!("loading project `{}`", path.display());

        let theme_dir = project_root.join("theme");
        let theme: Theme =
            serde_yaml::from_reader(open(&theme_dir.join("theme.yaml"), "theme")?)?;
        let resolve = |paths: Vec<PathBuf>| -> Vec<PathBuf> {
            paths.iter().map(|relpath| theme_dir.join(relpath)).collect()
        };

        Ok(Config {
            site: Site {
                title: project.title,
                author: project.author,
                description: project.description,
                summary: project.summary,
                url: with_trailing_slash(project.site_url),
                social: project.social,
            },
            project_directory: project_root.to_owned(),
            posts_source_directory: project_root.join("content").join("blog"),
            pages_source_directory: project_root.join("content").join("pages"),
            static_source_directory: theme_dir.join("static"),
            output_directory: match output_directory {
                Some(dir) => dir.to_owned(),
                None => project_root.join(DEFAULT_OUTPUT_DIRECTORY),
            },
            index_template: resolve(theme.index_template),
            post_template: resolve(theme.post_template),
            all_tags_template: resolve(theme.all_tags_template),
            single_tag_template: resolve(theme.single_tag_template),
            page_template: resolve(theme.page_template),
        })
    }
}

// `Url::join` treats the last path segment as a file name unless the path
// ends in a slash.
fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

fn open(path: &Path, kind: &'static str) -> Result<File> {
    File::open(path).map_err(|err| Error::Open {
        kind,
        path: path.to_owned(),
        err,
    })
}

type Result<T> = std::result::Result<T, Error>;

/// Represents a problem loading the configuration.
#[derive(Debug)]
pub enum Error {
    /// Returned when no project file exists in the directory or its
    /// ancestors.
    ProjectNotFound(PathBuf),

    /// Returned when a project or theme file can't be opened.
    Open {
        kind: &'static str,
        path: PathBuf,
        err: std::io::Error,
    },

    /// Returned when a project or theme file isn't valid.
    DeserializeYaml(serde_yaml::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::ProjectNotFound(dir) => write!(
                f,
                "Could not find `{}` in `{}` or any parent directory",
                PROJECT_FILE,
                dir.display()
            ),
            Error::Open { kind, path, err } => {
                write!(f, "Opening {} file `{}`: {}", kind, path.display(), err)
            }
            Error::DeserializeYaml(err) => write!(f, "Loading configuration: {}", err),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::ProjectNotFound(_) => None,
            Error::Open { err, .. } => Some(err),
            Error::DeserializeYaml(err) => Some(err),
        }
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Error {
        Error::DeserializeYaml(err)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::TempDir;

    const PROJECT: &str = "site_url: https://codewithkv.com/blog\n\
                           title: Code with KV\n\
                           author: Karanveer\n\
                           social:\n  github_url: http://github.com/karanveersp\n";

    const THEME: &str = "index_template: [layout.html, index.html]\n\
                         post_template: [layout.html, post.html]\n\
                         all_tags_template: [layout.html, tags.html]\n\
                         single_tag_template: [layout.html, tag.html]\n\
                         page_template: [layout.html, page.html]\n";

    fn project() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(PROJECT_FILE), PROJECT).unwrap();
        fs::create_dir_all(dir.path().join("theme")).unwrap();
        fs::write(dir.path().join("theme/theme.yaml"), THEME).unwrap();
        dir
    }

    #[test]
    fn test_from_directory_walks_up() -> Result<()> {
        let dir = project();
        let nested = dir.path().join("content/blog");
        fs::create_dir_all(&nested).unwrap();

        let config = Config::from_directory(&nested, None)?;
        assert_eq!(dir.path(), config.project_directory);
        assert_eq!(dir.path().join("content/blog"), config.posts_source_directory);
        assert_eq!(dir.path().join("content/pages"), config.pages_source_directory);
        assert_eq!(dir.path().join("_site"), config.output_directory);
        assert_eq!(
            vec![
                dir.path().join("theme/layout.html"),
                dir.path().join("theme/post.html")
            ],
            config.post_template
        );
        assert_eq!(
            vec![
                dir.path().join("theme/layout.html"),
                dir.path().join("theme/page.html")
            ],
            config.page_template
        );
        assert_eq!("Code with KV", config.site.title);
        assert_eq!(Some(String::from("Karanveer")), config.site.author);
        assert_eq!("https://codewithkv.com/blog/", config.site.url.as_str());
        assert_eq!(
            Some(String::from("http://github.com/karanveersp")),
            config.site.social.github_url
        );
        assert_eq!(None, config.site.social.instagram_url);
        Ok(())
    }

    #[test]
    fn test_explicit_output_directory() -> Result<()> {
        let dir = project();
        let out = dir.path().join("public");
        let config = Config::from_directory(dir.path(), Some(out.as_path()))?;
        assert_eq!(out, config.output_directory);
        Ok(())
    }

    #[test]
    fn test_page_template_is_optional() -> Result<()> {
        let dir = project();
        fs::write(
            dir.path().join("theme/theme.yaml"),
            "index_template: [index.html]\npost_template: [post.html]\n\
             all_tags_template: [tags.html]\nsingle_tag_template: [tag.html]\n",
        )
        .unwrap();
        let config = Config::from_directory(dir.path(), None)?;
        assert!(config.page_template.is_empty());
        Ok(())
    }

    #[test]
    fn test_missing_project() {
        let dir = TempDir::new().unwrap();
        match Config::from_directory(dir.path(), None) {
            Err(Error::ProjectNotFound(_)) => {}
            Err(other) => panic!("unexpected error: {}", other),
            Ok(_) => panic!("expected an error"),
        }
    }

    #[test]
    fn test_missing_theme() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(PROJECT_FILE), PROJECT).unwrap();
        match Config::from_directory(dir.path(), None) {
            Err(Error::Open { kind: "theme", .. }) => {}
            Err(other) => panic!("unexpected error: {}", other),
            Ok(_) => panic!("expected an error"),
        }
    }
}
