//! The library code for the `hypr` blog server. Requests flow through three
//! layers:
//!
//! 1. The route table ([`crate::server`]) maps a request path to a view.
//! 2. The [`crate::site::Site`] builds the view from articles and archive
//!    listings and renders it through a template ([`crate::template`]).
//! 3. Articles ([`crate::store`]) and archive listings ([`crate::archive`])
//!    are read from the content directory through a time-to-live cache
//!    ([`crate::cache`]).
//!
//! The cache is purely an accelerator: anything it holds can be recomputed
//! from disk, so flushing it (`/admin/flush`) is always safe.
//!
//! A content file is named `YYYY-MM-DD-slug.ext` and holds YAML front-matter,
//! a blank line, then a Markdown body (see [`crate::article`]).

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]

pub mod archive;
pub mod article;
pub mod cache;
pub mod config;
pub mod feed;
pub mod logging;
pub mod markdown;
pub mod server;
pub mod site;
pub mod store;
pub mod tag;
pub mod template;
pub mod url;
pub mod value;
