//! Concrete transformation steps.
//!
//! Each transformation kind lives behind the [`Transform`](super::Transform)
//! seam so the underlying library can be swapped without touching pipeline
//! definitions.

mod annotate;
mod concat;
mod markup;
mod minify;
mod styles;

pub use annotate::Annotate;
pub use concat::{BundleOverrides, Concat};
pub use markup::{InjectCacheScript, RenderHtml, TemplateCache};
pub use minify::{MinifyCss, MinifyJs, ValidateJs, check_js};
pub use styles::CompileCss;
