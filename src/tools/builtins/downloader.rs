use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use super::http_client;
use crate::kernel::config::FactotumConfig;
use crate::kernel::task_log::log_task;
use crate::tools::{BoundArguments, ParamSchema, ParamType, Tool, ToolContext, ToolError, ToolOutput};

const HELP: &str = "\
Download a webpage's HTML and save it to a file.

Args:
    url (str): The URL of the webpage to download (required).
    output (str): The filename to save the HTML to. Defaults to 'downloaded_page.html'.

Example:
    factotum --task download-webpage --url https://example.com --output example.html

Fetches the raw HTML with a GET request and writes it to the given file.
Useful for offline reading, scraping or archiving. A non-success HTTP
status is reported as a failure and nothing is written.";

pub struct WebpageDownloader {
    client: reqwest::Client,
}

impl WebpageDownloader {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

pub fn load(config: &FactotumConfig) -> Result<Vec<Arc<dyn Tool>>, ToolError> {
    Ok(vec![Arc::new(WebpageDownloader::new(http_client(config)?))])
}

#[async_trait]
impl Tool for WebpageDownloader {
    fn name(&self) -> &str {
        "download_webpage"
    }

    fn parameters(&self) -> Vec<ParamSchema> {
        vec![
            ParamSchema::required("url", ParamType::String, "Webpage URL"),
            ParamSchema::optional("output", ParamType::String, "downloaded_page.html", "Output filename"),
        ]
    }

    fn help(&self) -> Option<&str> {
        Some(HELP)
    }

    async fn execute(&self, args: BoundArguments, _ctx: &ToolContext) -> Result<ToolOutput, ToolError> {
        let url = args.string("url")?.trim();
        let output = args.string("output")?;
        if url.is_empty() {
            return Err(ToolError::InvalidParams("url must not be empty".to_string()));
        }

        let response = self.client.get(url).send().await?.error_for_status()?;
        let body = response.bytes().await?;
        tokio::fs::write(output, &body).await?;

        log_task(format!("Webpage downloaded: {url} -> {output}"));

        Ok(ToolOutput::new(format!("Webpage saved to {output}")).with_metadata(json!({
            "url": url,
            "output": output,
            "bytes": body.len(),
        })))
    }
}
