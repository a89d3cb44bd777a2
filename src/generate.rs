//! The page generator. Given the published posts (newest first) it groups
//! them by tag into a [`TagIndex`] and emits one [`PageRequest`] for the
//! all-tags page, one per tag and one per post. Requests are handed to a
//! caller-supplied callback; rendering them is [`crate::write`]'s job.

use crate::post::{tag_path, Post};
use crate::query::{ContentSource, Query};
use log::debug;
use std::collections::HashMap;
use std::rc::Rc;

/// The path of the page listing every tag.
pub const TAGS_PATH: &str = "/tags";

/// Identifies the template a [`PageRequest`] is rendered with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Component {
    /// Lists every tag. Context: [`Context::Tags`].
    AllTags,

    /// Lists the posts for one tag. Context: [`Context::Tag`].
    SingleTag,

    /// A single post. Context: [`Context::Post`].
    BlogPost,
}

/// The data a [`Component`] needs to render a page.
#[derive(Clone, Debug, PartialEq)]
pub enum Context {
    /// Distinct tag names, sorted ascending.
    Tags { tags: Vec<String> },

    /// A tag and its posts, newest first.
    Tag { tag: String, posts: Vec<Rc<Post>> },

    /// A post's slug and its chronological neighbors. `previous` is the
    /// next-older post and `next` the next-newer one.
    Post {
        slug: String,
        previous: Option<Rc<Post>>,
        next: Option<Rc<Post>>,
    },
}

/// An instruction to materialize one page.
#[derive(Clone, Debug, PartialEq)]
pub struct PageRequest {
    pub path: String,
    pub component: Component,
    pub context: Context,
}

/// Maps each tag to the posts carrying it, in the order the posts were
/// indexed. Every tag has at least one post.
#[derive(Debug, Default)]
pub struct TagIndex {
    buckets: HashMap<String, Vec<Rc<Post>>>,
}

impl TagIndex {
    /// Indexes `posts` by tag. Tags are compared exactly, so `Rust` and
    /// `rust` get separate buckets.
    pub fn build(posts: &[Rc<Post>]) -> TagIndex {
        let mut buckets: HashMap<String, Vec<Rc<Post>>> = HashMap::new();
        for post in posts {
            for tag in &post.tags {
                buckets.entry(tag.clone()).or_default().push(Rc::clone(post));
            }
        }
        TagIndex { buckets }
    }

    /// The distinct tag names in ascending lexicographic order.
    pub fn sorted_tags(&self) -> Vec<String> {
        let mut tags: Vec<String> = self.buckets.keys().cloned().collect();
        tags.sort();
        tags
    }

    /// The posts for `tag`, if any post carries it.
    pub fn posts(&self, tag: &str) -> Option<&[Rc<Post>]> {
        self.buckets.get(tag).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}

impl IntoIterator for TagIndex {
    type Item = (String, Vec<Rc<Post>>);
    type IntoIter = std::collections::hash_map::IntoIter<String, Vec<Rc<Post>>>;

    fn into_iter(self) -> Self::IntoIter {
        self.buckets.into_iter()
    }
}

/// Queries `source` for published posts and emits every page request for
/// them through `create_page`. If the query fails, its error is returned
/// as-is and `create_page` is never called.
///
/// On success, returns the posts the pages were generated from (newest first)
/// so callers can render listings without querying again.
pub fn create_pages<S, F>(source: &S, mut create_page: F) -> Result<Vec<Rc<Post>>, S::Error>
where
    S: ContentSource + ?Sized,
    F: FnMut(PageRequest),
{
    let posts: Vec<Rc<Post>> = source
        .query(&Query::default())?
        .into_iter()
        .map(Rc::new)
        .collect();
    generate_pages(&posts, &mut create_page);
    Ok(posts)
}

/// Emits the tag pages and the post pages for `posts`, which must already be
/// sorted newest first.
pub fn generate_pages<F: FnMut(PageRequest)>(posts: &[Rc<Post>], mut create_page: F) {
    create_tag_pages(posts, &mut create_page);
    create_post_pages(posts, &mut create_page);
}

fn create_tag_pages<F: FnMut(PageRequest)>(posts: &[Rc<Post>], create_page: &mut F) {
    let index = TagIndex::build(posts);
    debug!("indexed {} posts under {} tags", posts.len(), index.len());

    create_page(PageRequest {
        path: TAGS_PATH.to_owned(),
        component: Component::AllTags,
        context: Context::Tags {
            tags: index.sorted_tags(),
        },
    });

    for (tag, posts) in index {
        create_page(PageRequest {
            path: tag_path(&tag),
            component: Component::SingleTag,
            context: Context::Tag { tag, posts },
        });
    }
}

fn create_post_pages<F: FnMut(PageRequest)>(posts: &[Rc<Post>], create_page: &mut F) {
    for (i, post) in posts.iter().enumerate() {
        create_page(PageRequest {
            path: post.slug.clone(),
            component: Component::BlogPost,
            context: Context::Post {
                slug: post.slug.clone(),
                previous: posts.get(i + 1).cloned(),
                next: match i {
                    0 => None,
                    _ => posts.get(i - 1).cloned(),
                },
            },
        });
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fmt;

    fn collect(posts: Vec<Post>) -> Vec<PageRequest> {
        let mut pages = Vec::new();
        match create_pages(&posts, |page| pages.push(page)) {
            Ok(_) => {}
            Err(never) => match never {},
        }
        pages
    }

    fn find<'a>(pages: &'a [PageRequest], path: &str) -> &'a PageRequest {
        pages
            .iter()
            .find(|p| p.path == path)
            .unwrap_or_else(|| panic!("no page at {}", path))
    }

    fn tag_posts(pages: &[PageRequest], tag: &str) -> Vec<String> {
        match &find(pages, &tag_path(tag)).context {
            Context::Tag { tag: t, posts } => {
                assert_eq!(tag, t);
                posts.iter().map(|p| p.slug.clone()).collect()
            }
            other => panic!("unexpected context {:?}", other),
        }
    }

    fn neighbors(pages: &[PageRequest], slug: &str) -> (Option<String>, Option<String>) {
        match &find(pages, slug).context {
            Context::Post {
                slug: s,
                previous,
                next,
            } => {
                assert_eq!(slug, s);
                (
                    previous.as_ref().map(|p| p.slug.clone()),
                    next.as_ref().map(|p| p.slug.clone()),
                )
            }
            other => panic!("unexpected context {:?}", other),
        }
    }

    fn all_tags(pages: &[PageRequest]) -> Vec<String> {
        match &find(pages, TAGS_PATH).context {
            Context::Tags { tags } => tags.clone(),
            other => panic!("unexpected context {:?}", other),
        }
    }

    fn some(s: &str) -> Option<String> {
        Some(s.to_owned())
    }

    #[test]
    fn test_three_posts_two_tags() {
        let pages = collect(vec![
            Post::stub("/a/", "2020-01-03", &["x"]),
            Post::stub("/b/", "2020-01-02", &["x", "y"]),
            Post::stub("/c/", "2020-01-01", &["y"]),
        ]);

        // /tags, /tags/x, /tags/y and three post pages
        assert_eq!(6, pages.len());
        assert_eq!(vec!["x", "y"], all_tags(&pages));
        assert_eq!(vec!["/a/", "/b/"], tag_posts(&pages, "x"));
        assert_eq!(vec!["/b/", "/c/"], tag_posts(&pages, "y"));
        assert_eq!((some("/b/"), None), neighbors(&pages, "/a/"));
        assert_eq!((some("/c/"), some("/a/")), neighbors(&pages, "/b/"));
        assert_eq!((None, some("/b/")), neighbors(&pages, "/c/"));
    }

    #[test]
    fn test_unsorted_input_is_queried_newest_first() {
        let pages = collect(vec![
            Post::stub("/c/", "2020-01-01", &["y"]),
            Post::stub("/a/", "2020-01-03", &["x"]),
            Post::stub("/b/", "2020-01-02", &["y", "x"]),
        ]);
        assert_eq!(vec!["x", "y"], all_tags(&pages));
        assert_eq!(vec!["/a/", "/b/"], tag_posts(&pages, "x"));
        assert_eq!((some("/c/"), some("/a/")), neighbors(&pages, "/b/"));
    }

    #[test]
    fn test_empty_input() {
        let pages = collect(Vec::new());
        assert_eq!(
            vec![PageRequest {
                path: String::from("/tags"),
                component: Component::AllTags,
                context: Context::Tags { tags: Vec::new() },
            }],
            pages
        );
    }

    #[test]
    fn test_single_post_has_no_neighbors() {
        let pages = collect(vec![Post::stub("/only/", "2020-01-01", &[])]);
        assert_eq!(2, pages.len());
        assert_eq!((None, None), neighbors(&pages, "/only/"));
        assert_eq!(Vec::<String>::new(), all_tags(&pages));
    }

    #[test]
    fn test_untagged_post_still_gets_a_page() {
        let pages = collect(vec![
            Post::stub("/tagged/", "2020-01-02", &["x"]),
            Post::stub("/untagged/", "2020-01-01", &[]),
        ]);
        assert_eq!(vec!["/tagged/"], tag_posts(&pages, "x"));
        assert_eq!((None, some("/tagged/")), neighbors(&pages, "/untagged/"));
    }

    #[test]
    fn test_tags_are_case_sensitive() {
        let pages = collect(vec![
            Post::stub("/a/", "2020-01-02", &["Rust"]),
            Post::stub("/b/", "2020-01-01", &["rust"]),
        ]);
        assert_eq!(vec!["Rust", "rust"], all_tags(&pages));
        assert_eq!(vec!["/a/"], tag_posts(&pages, "Rust"));
        assert_eq!(vec!["/b/"], tag_posts(&pages, "rust"));
    }

    #[test]
    fn test_drafts_get_no_pages() {
        let mut draft = Post::stub("/draft/", "2020-01-03", &["secret"]);
        draft.draft = Some(true);
        let pages = collect(vec![draft, Post::stub("/a/", "2020-01-01", &["x"])]);

        assert_eq!(vec!["x"], all_tags(&pages));
        assert!(pages.iter().all(|p| p.path != "/draft/"));
        assert_eq!((None, None), neighbors(&pages, "/a/"));
    }

    #[test]
    fn test_post_pages_follow_input_order() {
        let pages = collect(vec![
            Post::stub("/a/", "2020-01-03", &[]),
            Post::stub("/b/", "2020-01-02", &[]),
            Post::stub("/c/", "2020-01-01", &[]),
        ]);
        let post_paths: Vec<&str> = pages
            .iter()
            .filter(|p| p.component == Component::BlogPost)
            .map(|p| p.path.as_str())
            .collect();
        assert_eq!(vec!["/a/", "/b/", "/c/"], post_paths);
    }

    #[test]
    fn test_tag_index_membership() {
        let posts: Vec<Rc<Post>> = vec![
            Post::stub("/a/", "2020-01-03", &["x", "z"]),
            Post::stub("/b/", "2020-01-02", &["y"]),
        ]
        .into_iter()
        .map(Rc::new)
        .collect();
        let index = TagIndex::build(&posts);

        assert_eq!(3, index.len());
        assert_eq!(vec!["x", "y", "z"], index.sorted_tags());
        for post in &posts {
            for tag in index.sorted_tags() {
                let bucket = index.posts(&tag).unwrap_or(&[]);
                assert_eq!(
                    post.tags.contains(&tag),
                    bucket.iter().any(|p| p.slug == post.slug)
                );
            }
        }
        assert!(index.posts("missing").is_none());
    }

    #[derive(Debug, PartialEq)]
    struct QueryFailed;

    impl fmt::Display for QueryFailed {
        fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
            write!(f, "query failed")
        }
    }

    struct FailingSource;

    impl ContentSource for FailingSource {
        type Error = QueryFailed;

        fn query(&self, _: &Query) -> Result<Vec<Post>, QueryFailed> {
            Err(QueryFailed)
        }
    }

    #[test]
    fn test_query_error_aborts_generation() {
        let mut pages = Vec::new();
        let result = create_pages(&FailingSource, |page| pages.push(page));
        assert_eq!(Some(QueryFailed), result.err());
        assert!(pages.is_empty());
    }
}
