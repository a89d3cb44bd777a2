//! The content query boundary between post sources and the page generator.

use crate::post::Post;
use std::convert::Infallible;

/// The maximum number of posts a default [`Query`] returns.
pub const DEFAULT_LIMIT: usize = 1000;

/// Selects and orders posts from a [`ContentSource`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Query {
    /// When `false`, only posts with `draft: false` are kept.
    pub include_drafts: bool,

    /// The maximum number of posts returned.
    pub limit: usize,
}

impl Default for Query {
    fn default() -> Self {
        Query {
            include_drafts: false,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl Query {
    /// Filters, sorts (newest first) and truncates `posts`. Posts sharing a
    /// date are ordered by slug so the result doesn't depend on the order in
    /// which the source produced them.
    pub fn apply(&self, mut posts: Vec<Post>) -> Vec<Post> {
        if !self.include_drafts {
            posts.retain(Post::is_published);
        }
        posts.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| a.slug.cmp(&b.slug)));
        posts.truncate(self.limit);
        posts
    }
}

/// Anything that can answer a [`Query`] with a list of posts.
pub trait ContentSource {
    type Error;

    /// Runs `query` to completion. An error means no posts are available at
    /// all; there are no partial results.
    fn query(&self, query: &Query) -> Result<Vec<Post>, Self::Error>;
}

impl ContentSource for [Post] {
    type Error = Infallible;

    fn query(&self, query: &Query) -> Result<Vec<Post>, Infallible> {
        Ok(query.apply(self.to_vec()))
    }
}

impl ContentSource for Vec<Post> {
    type Error = Infallible;

    fn query(&self, query: &Query) -> Result<Vec<Post>, Infallible> {
        self.as_slice().query(query)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    fn slugs(posts: &[Post]) -> Vec<&str> {
        posts.iter().map(|p| p.slug.as_str()).collect()
    }

    #[test]
    fn test_apply_sorts_newest_first() {
        let posts = vec![
            Post::stub("/old/", "2019-01-01", &[]),
            Post::stub("/new/", "2021-01-01", &[]),
            Post::stub("/mid/", "2020-01-01", &[]),
        ];
        assert_eq!(
            vec!["/new/", "/mid/", "/old/"],
            slugs(&Query::default().apply(posts))
        );
    }

    #[test]
    fn test_apply_excludes_drafts() {
        let mut draft = Post::stub("/draft/", "2021-01-01", &[]);
        draft.draft = Some(true);
        let posts = vec![draft, Post::stub("/published/", "2020-01-01", &[])];

        assert_eq!(vec!["/published/"], slugs(&Query::default().apply(posts.clone())));

        let everything = Query {
            include_drafts: true,
            ..Query::default()
        };
        assert_eq!(vec!["/draft/", "/published/"], slugs(&everything.apply(posts)));
    }

    #[test]
    fn test_apply_excludes_posts_without_draft_field() {
        let mut unflagged = Post::stub("/unflagged/", "2021-01-01", &[]);
        unflagged.draft = None;
        let posts = vec![unflagged, Post::stub("/published/", "2020-01-01", &[])];

        assert_eq!(vec!["/published/"], slugs(&Query::default().apply(posts.clone())));

        let everything = Query {
            include_drafts: true,
            ..Query::default()
        };
        assert_eq!(vec!["/unflagged/", "/published/"], slugs(&everything.apply(posts)));
    }

    #[test]
    fn test_apply_respects_limit() {
        let posts = vec![
            Post::stub("/a/", "2021-01-03", &[]),
            Post::stub("/b/", "2021-01-02", &[]),
            Post::stub("/c/", "2021-01-01", &[]),
        ];
        let query = Query {
            limit: 2,
            ..Query::default()
        };
        assert_eq!(vec!["/a/", "/b/"], slugs(&query.apply(posts)));
    }

    #[test]
    fn test_apply_breaks_date_ties_by_slug() {
        let posts = vec![
            Post::stub("/b/", "2021-01-01", &[]),
            Post::stub("/a/", "2021-01-01", &[]),
        ];
        assert_eq!(vec!["/a/", "/b/"], slugs(&Query::default().apply(posts)));
    }

    #[test]
    fn test_default_limit() {
        assert_eq!(1000, Query::default().limit);
    }
}
