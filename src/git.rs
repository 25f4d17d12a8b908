use std::path::PathBuf;

use lazy_static::lazy_static;
use log::{error, warn};
use regex_lite::Regex;
use serenity::async_trait;
use tokio::process::Command;

use crate::error::BotError;

const FIELD_SEPARATOR: char = '\u{1f}';
const RECORD_SEPARATOR: char = '\u{1e}';
const LOG_FORMAT: &str = "--pretty=format:%H%x1f%h%x1f%s%x1f%an%x1f%at%x1e";

lazy_static! {
    static ref CONVENTIONAL_COMMIT: Regex = Regex::new(r"^(\w+)(\(.+\))?!?: (.+)$").unwrap();
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitCommit {
    pub hash: String,
    pub short_hash: String,
    pub subject: String,
    pub author: String,
    /// Author date as unix seconds.
    pub timestamp: i64,
    pub branch: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryInfo {
    pub remote_url: Option<String>,
    pub branch: String,
    pub is_git_repo: bool,
}

impl RepositoryInfo {
    pub fn unavailable() -> Self {
        RepositoryInfo {
            remote_url: None,
            branch: "unknown".to_string(),
            is_git_repo: false,
        }
    }
}

#[async_trait]
pub trait GitSource: Send + Sync {
    /// Up to `limit` commits, newest first. Empty when history is unavailable.
    async fn history(&self, limit: usize) -> Vec<GitCommit>;
    async fn repository(&self) -> RepositoryInfo;
}

/// Reads metadata by running the `git` binary.
#[derive(Debug, Clone, Default)]
pub struct ShellGit {
    workdir: Option<PathBuf>,
}

impl ShellGit {
    pub fn new(workdir: Option<PathBuf>) -> Self {
        ShellGit { workdir }
    }

    async fn run(&self, args: &[&str]) -> Result<String, BotError> {
        let mut command = Command::new("git");
        command.args(args);
        if let Some(dir) = &self.workdir {
            command.current_dir(dir);
        }

        let output = command.output().await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(BotError::Git(format!("git {} failed: {}", args.join(" "), stderr.trim())));
        }
        Ok(String::from_utf8(output.stdout)?.trim().to_string())
    }

    async fn try_history(&self, limit: usize) -> Result<Vec<GitCommit>, BotError> {
        let count = limit.to_string();
        let log = self.run(&["log", "-n", count.as_str(), LOG_FORMAT]).await?;
        let branch = self.run(&["rev-parse", "--abbrev-ref", "HEAD"]).await?;
        Ok(parse_log(&log, &branch))
    }
}

#[async_trait]
impl GitSource for ShellGit {
    async fn history(&self, limit: usize) -> Vec<GitCommit> {
        if limit == 0 {
            return Vec::new();
        }
        match self.try_history(limit).await {
            Ok(commits) => commits,
            Err(why) => {
                error!("❌ Error getting commit history: {}", why);
                Vec::new()
            }
        }
    }

    async fn repository(&self) -> RepositoryInfo {
        let remote = self.run(&["config", "--get", "remote.origin.url"]).await;
        let branch = self.run(&["rev-parse", "--abbrev-ref", "HEAD"]).await;
        match (remote, branch) {
            (Ok(remote), Ok(branch)) => RepositoryInfo {
                remote_url: Some(normalize_remote(&remote)).filter(|url| !url.is_empty()),
                branch,
                is_git_repo: true,
            },
            (Err(_), Ok(branch)) => RepositoryInfo {
                remote_url: None,
                branch,
                is_git_repo: true,
            },
            _ => {
                warn!("⚠️ Not a git repository or git not available");
                RepositoryInfo::unavailable()
            }
        }
    }
}

/// Parses records written with `LOG_FORMAT`. Malformed records are skipped.
pub fn parse_log(output: &str, branch: &str) -> Vec<GitCommit> {
    output
        .split(RECORD_SEPARATOR)
        .map(str::trim)
        .filter(|record| !record.is_empty())
        .filter_map(|record| {
            let fields: Vec<&str> = record.split(FIELD_SEPARATOR).collect();
            let [hash, short_hash, subject, author, timestamp] = fields.as_slice() else {
                return None;
            };
            Some(GitCommit {
                hash: hash.to_string(),
                short_hash: short_hash.to_string(),
                subject: subject.to_string(),
                author: author.to_string(),
                timestamp: timestamp.parse().ok()?,
                branch: branch.to_string(),
            })
        })
        .collect()
}

/// Turns a remote into a browsable https URL.
pub fn normalize_remote(remote: &str) -> String {
    let remote = remote.trim().trim_end_matches('/');
    let remote = remote.strip_suffix(".git").unwrap_or(remote);
    match remote.strip_prefix("git@") {
        Some(rest) => match rest.split_once(':') {
            Some((host, path)) => format!("https://{}/{}", host, path),
            None => remote.to_string(),
        },
        None => remote.to_string(),
    }
}

pub fn format_commit_message(subject: &str) -> String {
    let Some(captures) = CONVENTIONAL_COMMIT.captures(subject) else {
        return format!("📝 {}", subject);
    };

    let kind = captures.get(1).map(|m| m.as_str()).unwrap_or_default();
    let scope = captures
        .get(2)
        .map(|m| m.as_str())
        .map(|s| format!(" **{}**", &s[1..s.len() - 1]))
        .unwrap_or_default();
    let description = captures.get(3).map(|m| m.as_str()).unwrap_or_default();

    format!("{} **{}**{}: {}", type_emoji(kind), kind.to_uppercase(), scope, description)
}

fn type_emoji(kind: &str) -> &'static str {
    match kind.to_lowercase().as_str() {
        "feat" => "✨",
        "fix" => "🐛",
        "docs" => "📚",
        "style" => "💄",
        "refactor" => "♻️",
        "test" => "🧪",
        "chore" => "🔧",
        "perf" => "⚡",
        "ci" => "👷",
        "build" => "📦",
        "revert" => "⏪",
        _ => "📝",
    }
}
