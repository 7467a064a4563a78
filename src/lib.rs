//! axterm core: a terminal rendering pipeline for remote accessibility
//! trees.
//!
//! The pipeline has three stages, each its own module:
//!
//! 1. [`tree`] keeps a local mirror of the remote tree in sync over a
//!    [`protocol::Transport`], surviving incremental patches, document
//!    reloads and protocol errors.
//! 2. [`ui`] converts a mirror snapshot into a typed presentation tree,
//!    resolving which content flows inline and which breaks into blocks.
//! 3. [`render`] streams the presentation tree out as text lines and wraps
//!    them to the terminal width.

pub mod protocol;
pub mod render;
pub mod tree;
pub mod ui;
