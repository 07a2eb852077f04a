use std::path::PathBuf;

use clap::Parser;
use url::Url;

use crate::error::{CmsError, Result};

/// Mirror a Brightspace course to local disk.
///
/// Every option can also come from the environment or a `.env` file.
#[derive(Debug, Clone, Parser)]
#[command(version, about)]
pub struct Config {
    /// Course content URL, e.g. https://lms.example/d2l/le/content/12345/Home
    #[arg(env = "COURSE_URL")]
    pub course_url: String,

    /// Directory the course folder is created in
    #[arg(short, long, env = "DOWNLOAD_DIR", default_value = "./downloads")]
    pub output: PathBuf,

    /// Browser storage-state file written by the login helper
    #[arg(short, long, env = "AUTH_PATH", default_value = "auth.json")]
    pub auth: PathBuf,

    /// Override the server root; defaults to the course URL's origin
    #[arg(long, env = "BASE_URL")]
    pub base_url: Option<String>,

    /// Log per-request detail
    #[arg(short, long)]
    pub verbose: bool,
}

impl Config {
    /// Scheme, host and port of the server, without a trailing slash.
    pub fn base_url(&self) -> Result<String> {
        if let Some(base) = &self.base_url {
            return Ok(base.trim_end_matches('/').to_string());
        }
        let parsed = Url::parse(&self.course_url)
            .map_err(|e| CmsError::Input(format!("invalid course URL {}: {e}", self.course_url)))?;
        let origin = parsed.origin();
        if !origin.is_tuple() {
            return Err(CmsError::Input(format!(
                "course URL {} has no host",
                self.course_url
            )));
        }
        Ok(origin.ascii_serialization())
    }

    pub fn host(&self) -> Option<String> {
        let base = self.base_url().ok()?;
        Url::parse(&base).ok()?.host_str().map(str::to_string)
    }
}
