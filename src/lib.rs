//! Mirror a Brightspace (D2L) course onto local disk.
//!
//! The table of contents is fetched through the `le` content API, every
//! module becomes a directory, file topics are downloaded into it and link
//! topics are recorded. The resulting tree is written next to the content as
//! `course_structure.json`.

pub mod auth;
pub mod cms;
pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod naming;

pub use auth::Credentials;
pub use cms::CmsClient;
pub use config::Config;
pub use error::{CmsError, Result};
pub use models::{Directory, File, Link, Node, NodeType};
