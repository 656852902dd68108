//! CLI command implementations.

mod fmt;
mod parse;
mod render;
mod source;
mod toc;

pub(crate) use fmt::FmtArgs;
pub(crate) use parse::ParseArgs;
pub(crate) use render::RenderArgs;
pub(crate) use toc::TocArgs;
