pub mod backend;
pub mod config;
pub mod convergence;
pub mod definition;
pub mod error;
pub mod fingerprint;
pub mod indexer;
pub mod logging;
pub mod model;
pub mod output;
pub mod resource;

pub use backend::Backend;
pub use config::{Config, IndexMarking};
pub use convergence::{ConvergenceLoop, ConvergenceReport};
pub use definition::SoftwareDefinition;
pub use error::{Error, Result};
pub use fingerprint::FingerprintExtractor;
pub use model::{SoftwarePackage, SoftwareVersion, StaticFile, StoreObject};
pub use resource::Resource;
