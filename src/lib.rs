//! Config Tree Library
//!
//! Composes a directory of JSON/YAML fragments into one configuration tree,
//! resolves tagged variants, and addresses the result by key path.
//!
//! ```no_run
//! use config_tree::{Config, TagSet};
//!
//! let mut config = Config::new()
//!     .with_root("/etc/myapp")
//!     .with_tags(TagSet::from_specs([":test"]));
//! config.load("configs")?;
//! let host = config.get("server.host")?;
//! # Ok::<(), config_tree::ConfigError>(())
//! ```

pub mod cli;
pub mod compose;
pub mod config;
pub mod error;
pub mod format;
pub mod keypath;
pub mod loaders;
pub mod merge;
pub mod options;
pub mod select;
pub mod tags;

pub use compose::{Composer, compose};
pub use config::{Config, Entry, Source};
pub use error::{ConfigError, ErrorCode, Result};
pub use keypath::KeyPath;
pub use loaders::{Loader, LoaderRegistry, load_json, load_yaml};
pub use merge::deep_merge;
pub use options::{ConfigOptions, Selection};
pub use select::select_variants;
pub use tags::{Tag, TagSet, resolve_tags};
