//! Configuration section definitions.

mod build;
mod paths;
mod serve;
mod vendor;

pub use build::BuildConfig;
pub use paths::PathsConfig;
pub use serve::ServeConfig;
pub use vendor::VendorConfig;
