//! Core data types for packages, versions, and indexed artifacts.
//!
//! - [`SoftwarePackage`] - A named software product
//! - [`SoftwareVersion`] - One release of a package
//! - [`StaticFile`] - A static asset shipped with a release
//! - [`StoreObject`] - Anything that can be handed to a backend
//!
//! # Example
//!
//! ```
//! use webprint::{SoftwarePackage, SoftwareVersion};
//!
//! let wordpress = SoftwarePackage::new("WordPress");
//! let version = SoftwareVersion::new(wordpress.clone(), "5.4.1");
//!
//! assert_eq!(version.package, wordpress);
//! assert_eq!(version.to_string(), "WordPress 5.4.1");
//! ```

mod package;
mod static_file;

pub use package::*;
pub use static_file::*;
