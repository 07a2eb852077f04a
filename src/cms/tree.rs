//! Mirroring a table of contents onto disk.
//!
//! The walk is depth first and strictly sequential: each module's directory
//! is created before anything inside it, sub-modules come before topics, and
//! every download finishes before the next topic is looked at.

use std::path::Path;

use tracing::{info, warn};
use url::Url;

use super::CmsClient;
use super::download::DownloadOutcome;
use super::toc::{ACTIVITY_FILE, ACTIVITY_LINK, TocModule, TocTopic};
use crate::error::Result;
use crate::models::{Directory, File, Link, Node, SNAPSHOT_FILE};
use crate::naming::{course_id_from_url, file_name_from_url, sanitize};

const UNTITLED_MODULE: &str = "Untitled Module";
const UNTITLED_TOPIC: &str = "Untitled Topic";

fn clean_title(title: Option<&str>, fallback: &str) -> String {
    let name = sanitize(title.unwrap_or(fallback));
    if name.is_empty() { fallback.to_string() } else { name }
}

impl CmsClient {
    /// Mirror a whole course below `output_root` and write its snapshot.
    ///
    /// Content lands in `output_root/Course_{id}` together with
    /// `course_structure.json`.
    pub async fn parse_course(&self, course_url: &str, output_root: &Path) -> Result<Directory> {
        let course_id = course_id_from_url(course_url)?;
        let course_name = format!("Course_{course_id}");
        info!("Parsing course {course_id}");

        let toc = self.fetch_toc(&course_id).await?;

        let course_root = output_root.join(&course_name);
        tokio::fs::create_dir_all(&course_root).await?;

        let mut children = Vec::with_capacity(toc.modules.len());
        for module in &toc.modules {
            children.push(Node::Directory(self.build_module(module, &course_root).await?));
        }

        let root = Directory::new(course_name, None, children);
        Node::Directory(root.clone()).save_json(&course_root.join(SNAPSHOT_FILE))?;
        info!("Done! Exported to {}", course_root.display());
        Ok(root)
    }

    /// Create the module's directory under `parent` and mirror everything in it.
    pub async fn build_module(&self, module: &TocModule, parent: &Path) -> Result<Directory> {
        let name = clean_title(module.title.as_deref(), UNTITLED_MODULE);
        let path = parent.join(&name);
        tokio::fs::create_dir_all(&path).await?;

        let mut children = Vec::new();
        for sub_module in &module.modules {
            let child = Box::pin(self.build_module(sub_module, &path)).await?;
            children.push(Node::Directory(child));
        }
        for topic in &module.topics {
            if let Some(node) = self.build_topic(topic, &path).await? {
                children.push(node);
            }
        }

        Ok(Directory::new(name, module.description_html(), children))
    }

    /// Turn one topic into a node, downloading its file if it has one.
    ///
    /// Returns `None` for activity types that are not files or links.
    pub async fn build_topic(&self, topic: &TocTopic, parent: &Path) -> Result<Option<Node>> {
        let title = clean_title(topic.title.as_deref(), UNTITLED_TOPIC);
        let description = topic.description_html();
        let url = topic.url();

        match topic.activity_type {
            Some(ACTIVITY_FILE) => {
                let file_name = file_name_from_url(url)
                    .map(|n| sanitize(&n))
                    .filter(|n| !n.is_empty())
                    .unwrap_or_else(|| format!("{title}.pdf"));
                let dest = parent.join(file_name);
                let source = self.resolve(url);

                match self.download_file(&source, &dest).await {
                    Ok(DownloadOutcome::Downloaded { .. }) => info!("Downloaded: {title}"),
                    Ok(DownloadOutcome::Skipped) => info!("Skipping (exists): {title}"),
                    // The node is still recorded; its file is simply absent.
                    Err(e) => warn!("Failed to download {title}: {e}"),
                }

                Ok(Some(Node::File(File {
                    name: title,
                    description,
                    file: dest,
                })))
            }
            Some(ACTIVITY_LINK) => {
                let parsed = Url::parse(url)
                    .or_else(|_| Url::parse(&self.root_url).and_then(|root| root.join(url)));
                match parsed {
                    Ok(url) => Ok(Some(Node::Link(Link {
                        name: title,
                        description,
                        url,
                    }))),
                    Err(e) => {
                        warn!("Skipping link {title} with unusable URL {url:?}: {e}");
                        Ok(None)
                    }
                }
            }
            _ => Ok(None),
        }
    }

    /// Absolute download URL for a topic URL; relative ones hang off the root.
    fn resolve(&self, url: &str) -> String {
        if Url::parse(url).is_ok() {
            url.to_string()
        } else {
            format!("{}{}", self.root_url, url)
        }
    }
}
