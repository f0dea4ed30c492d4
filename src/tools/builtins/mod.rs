//! Built-in tools and the registration table that exposes them.

pub mod crypto;
pub mod downloader;
pub mod github;
pub mod organizer;
pub mod password;

use std::time::Duration;

use super::{ToolError, ToolSource};
use crate::kernel::config::FactotumConfig;

/// The registration table, in discovery order.
pub fn sources() -> Vec<ToolSource> {
    vec![
        ToolSource {
            module: "crypto",
            category: Some("Finance"),
            description: None,
            load: crypto::load,
        },
        ToolSource {
            module: "downloader",
            category: Some("File Management"),
            description: Some("Download a webpage and save it locally."),
            load: downloader::load,
        },
        ToolSource {
            module: "github_cloner",
            category: Some("Development"),
            description: None,
            load: github::load,
        },
        ToolSource {
            module: "organizer",
            category: Some("File Management"),
            description: None,
            load: organizer::load,
        },
        ToolSource {
            module: "password",
            category: Some("Security"),
            description: None,
            load: password::load,
        },
    ]
}

/// HTTP client shared by the tools of one source.
pub(crate) fn http_client(config: &FactotumConfig) -> Result<reqwest::Client, ToolError> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.http.timeout_secs))
        .user_agent(config.http.user_agent.clone())
        .build()?;
    Ok(client)
}
