use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use serde::Deserialize;
use serde_json::json;
use tokio::process::Command;

use super::http_client;
use crate::kernel::config::FactotumConfig;
use crate::kernel::task_log::log_task;
use crate::tools::{BoundArguments, ParamSchema, ParamType, Tool, ToolContext, ToolError, ToolOutput};

const HELP: &str = "\
Clone multiple GitHub repositories from a user.

Args:
    username (str): GitHub username (required).
    token (str): Optional personal access token. Falls back to the token env variable.
    output_dir (str): Directory to clone repositories into.
    repos (str): Comma-separated repository names to clone. Empty clones all.

Example:
    factotum --task github-repo-cloner --username octocat --repos hello-world,spoon-knife

With a token the authenticated user's repositories are listed (private
ones included), otherwise the user's public repositories. Each selected
repository is cloned with `git clone`. Destinations that already exist
are skipped, and a summary of successes, skips and failures is shown.";

#[derive(Debug, Clone, Deserialize)]
pub struct Repository {
    pub name: String,
    pub clone_url: String,
}

pub struct GithubCloner {
    client: reqwest::Client,
    api_base: String,
    env_token: Option<String>,
    default_output_dir: String,
}

pub fn load(config: &FactotumConfig) -> Result<Vec<Arc<dyn Tool>>, ToolError> {
    let env_token = std::env::var(&config.github.token_env)
        .ok()
        .filter(|t| !t.trim().is_empty());
    Ok(vec![Arc::new(GithubCloner {
        client: http_client(config)?,
        api_base: config.github.api_base.trim_end_matches('/').to_string(),
        env_token,
        default_output_dir: config.github.default_output_dir.clone(),
    })])
}

/// Last path segment of a clone URL with any `.git` suffix removed.
pub fn repo_name_from_url(url: &str) -> &str {
    let last = url.trim_end_matches('/').rsplit('/').next().unwrap_or(url);
    last.strip_suffix(".git").unwrap_or(last)
}

/// Keep the repositories named in the comma-separated `filter`, or all of them when it is blank.
pub fn select_repos(repos: Vec<Repository>, filter: &str) -> Vec<Repository> {
    let wanted: Vec<String> = filter
        .split(',')
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect();
    if wanted.is_empty() {
        return repos;
    }
    repos
        .into_iter()
        .filter(|r| wanted.contains(&r.name.to_lowercase()))
        .collect()
}

#[derive(Debug, Default, PartialEq)]
struct CloneSummary {
    cloned: usize,
    skipped: usize,
    failed: usize,
}

impl GithubCloner {
    async fn list_repos(&self, username: &str, token: Option<&str>) -> Result<Vec<Repository>, ToolError> {
        let url = match token {
            Some(_) => format!("{}/user/repos", self.api_base),
            None => format!("{}/users/{username}/repos", self.api_base),
        };
        let mut request = self
            .client
            .get(url)
            .header(ACCEPT, "application/vnd.github+json")
            .query(&[("per_page", "100"), ("type", "all")]);
        if let Some(token) = token {
            request = request.header(AUTHORIZATION, format!("token {token}"));
        }
        Ok(request.send().await?.error_for_status()?.json().await?)
    }

    async fn clone_repo(url: &str, destination: &Path) -> Result<(), String> {
        let output = Command::new("git")
            .arg("clone")
            .arg("--quiet")
            .arg(url)
            .arg(destination)
            .output()
            .await
            .map_err(|e| e.to_string())?;
        if output.status.success() {
            Ok(())
        } else {
            Err(String::from_utf8_lossy(&output.stderr).trim().to_string())
        }
    }
}

#[async_trait]
impl Tool for GithubCloner {
    fn name(&self) -> &str {
        "github_repo_cloner"
    }

    fn parameters(&self) -> Vec<ParamSchema> {
        vec![
            ParamSchema::required("username", ParamType::String, "GitHub username"),
            ParamSchema::optional("token", ParamType::String, "", "Personal access token (optional)"),
            ParamSchema::optional(
                "output_dir",
                ParamType::String,
                self.default_output_dir.as_str(),
                "Directory to clone into",
            ),
            ParamSchema::optional("repos", ParamType::String, "", "Comma-separated repo names (empty for all)"),
        ]
    }

    fn help(&self) -> Option<&str> {
        Some(HELP)
    }

    fn reports_progress(&self) -> bool {
        true
    }

    async fn execute(&self, args: BoundArguments, ctx: &ToolContext) -> Result<ToolOutput, ToolError> {
        let username = args.string("username")?.trim();
        if username.is_empty() {
            return Err(ToolError::InvalidParams("username must not be empty".to_string()));
        }
        let token = Some(args.string("token")?.trim())
            .filter(|t| !t.is_empty())
            .or(self.env_token.as_deref());
        let output_dir = PathBuf::from(args.string("output_dir")?);

        let repos = self.list_repos(username, token).await?;
        if repos.is_empty() {
            return Err(ToolError::ExecutionError("No repositories found.".to_string()));
        }
        let selected = select_repos(repos, args.string("repos")?);
        if selected.is_empty() {
            return Err(ToolError::ExecutionError("No repositories selected.".to_string()));
        }

        tokio::fs::create_dir_all(&output_dir).await?;
        let started = Instant::now();
        let progress = ctx.progress();
        progress.start("🚀 Cloning repositories...", selected.len() as u64);

        let mut summary = CloneSummary::default();
        for repo in &selected {
            let name = repo_name_from_url(&repo.clone_url);
            let destination = output_dir.join(name);
            if destination.exists() {
                progress.note(&format!("⚠️ Repository '{name}' already exists. Skipping."));
                summary.skipped += 1;
            } else {
                match Self::clone_repo(&repo.clone_url, &destination).await {
                    Ok(()) => {
                        progress.note(&format!("✅ Cloned '{name}' successfully!"));
                        summary.cloned += 1;
                    }
                    Err(reason) => {
                        tracing::warn!(repo = name, %reason, "clone failed");
                        progress.note(&format!("❌ Failed to clone '{name}': {reason}"));
                        summary.failed += 1;
                    }
                }
            }
            progress.advance();
        }
        progress.finish();

        let elapsed = started.elapsed().as_secs_f64();
        let message = format!(
            "📊 Clone Summary: ✅ {} successful, ⚠️ {} skipped, ❌ {} failed, 🕒 {elapsed:.2} seconds.",
            summary.cloned, summary.skipped, summary.failed
        );
        log_task(&message);

        Ok(ToolOutput::new(message).with_metadata(json!({
            "username": username,
            "output_dir": output_dir.display().to_string(),
            "cloned": summary.cloned,
            "skipped": summary.skipped,
            "failed": summary.failed,
        })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::Value;

    fn repo(name: &str) -> Repository {
        Repository {
            name: name.to_string(),
            clone_url: format!("https://github.com/octocat/{name}.git"),
        }
    }

    #[test]
    fn test_repo_name_from_url() {
        assert_eq!(repo_name_from_url("https://github.com/octocat/Hello-World.git"), "Hello-World");
        assert_eq!(repo_name_from_url("https://github.com/octocat/plain"), "plain");
        assert_eq!(repo_name_from_url("https://github.com/octocat/trailing/"), "trailing");
    }

    #[test]
    fn test_select_repos() {
        let all = vec![repo("alpha"), repo("Beta"), repo("gamma")];

        assert_eq!(select_repos(all.clone(), "  ").len(), 3);

        let picked: Vec<_> = select_repos(all.clone(), "beta, gamma,missing")
            .into_iter()
            .map(|r| r.name)
            .collect();
        assert_eq!(picked, vec!["Beta", "gamma"]);

        assert!(select_repos(all, "nothing").is_empty());
    }

    #[test]
    fn test_repository_deserializes_from_api_shape() {
        let body = json!([{ "name": "x", "clone_url": "https://github.com/o/x.git", "private": false }]);
        let repos: Vec<Repository> = serde_json::from_value(body).unwrap();
        assert_eq!(repos[0].name, "x");
    }

    #[test]
    fn test_output_dir_default_comes_from_config() {
        let mut config = FactotumConfig::default();
        config.github.default_output_dir = "mirrors".to_string();
        let tools = load(&config).unwrap();

        let output_dir = tools[0]
            .parameters()
            .into_iter()
            .find(|p| p.name == "output_dir")
            .unwrap();
        assert_eq!(output_dir.default, Some(Value::from("mirrors")));
        assert!(tools[0].reports_progress());
    }
}
