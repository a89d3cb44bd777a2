//! The library code for the `kvblog` static site generator. The architecture
//! can be generally broken down into three distinct steps:
//!
//! 1. Querying posts from source files on disk ([`crate::parser`],
//!    [`crate::query`])
//! 2. Generating page requests from the posts ([`crate::generate`])
//! 3. Rendering the page requests to disk ([`crate::write`])
//!
//! The second step is where the site's structure comes from. Posts arrive
//! newest first with drafts already removed. They are grouped by tag into a
//! [`generate::TagIndex`], which yields one page listing every tag and one
//! page per tag. Every post then gets its own page carrying links to the
//! next-older (`previous`) and next-newer (`next`) post.
//!
//! The third step is pretty straight-forward: for each page request, apply
//! the template for its component and write the result to disk. The home
//! page, which lists every published post, is rendered alongside, as are the
//! standalone pages ([`crate::page`]) such as `about`.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]

pub mod build;
pub mod config;
pub mod generate;
pub mod markdown;
pub mod new_post;
pub mod page;
pub mod parser;
pub mod post;
pub mod query;
pub mod write;
