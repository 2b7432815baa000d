//! depot - self-hosted file storage
//!
//! Upload, list, download, rename and delete files over HTTP. Bytes live in
//! a flat directory; a JSON index is the source of truth for what exists.

pub mod config;
pub mod error;
pub mod file;
pub mod logging;
pub mod web;

pub use config::Config;
pub use error::{DepotError, Result};
pub use file::{FileService, FileStorage, ObjectIndex, ObjectRecord};
pub use web::WebServer;
