//! CLI argument parsing using clap derive

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use repo_policy::{FactMap, FactValue, keys};

/// Apply declarative policies to GitHub repositories and their Travis CI setup
#[derive(Parser, Debug)]
#[command(name = "repo-policy")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// The command to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Apply a policy to every repository in a list
    ///
    /// Each repository runs independently. The exit status is non-zero if
    /// any repository failed.
    ///
    /// Examples:
    ///   repo-policy apply -p policies/base.yaml -r repos.json
    ///   repo-policy apply -p base.json -r repos.json --concurrency 4
    Apply {
        /// Policy document (JSON, or YAML with a .yaml/.yml extension)
        #[arg(short, long)]
        policy: PathBuf,

        /// Repository list document (JSON or YAML)
        #[arg(short, long)]
        repositories: PathBuf,

        /// Maximum number of repositories processed at once
        #[arg(long, value_parser = clap::value_parser!(u16).range(1..))]
        concurrency: Option<u16>,

        #[command(flatten)]
        credentials: Credentials,
    },

    /// List every goal name that can appear in a policy
    Goals,

    /// List the policy or repository documents in a directory
    List {
        /// Directory to look in
        dir: PathBuf,

        /// File extension to match
        #[arg(long, default_value = "json")]
        ext: String,
    },
}

/// Service credentials and endpoints, seeded as facts for every repository.
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    /// GitHub access token
    #[arg(long, env = "REPO_POLICY_GITHUB_ACCESS_TOKEN", hide_env_values = true)]
    pub github_token: Option<String>,

    /// GitHub API endpoint
    #[arg(long, env = "REPO_POLICY_GITHUB_API_URL")]
    pub github_api_url: Option<String>,

    /// Travis CI token for the .org endpoint
    #[arg(long, env = "REPO_POLICY_TRAVIS_ORG_TOKEN", hide_env_values = true)]
    pub travis_org_token: Option<String>,

    /// Travis CI token for the .com endpoint
    #[arg(long, env = "REPO_POLICY_TRAVIS_PRO_TOKEN", hide_env_values = true)]
    pub travis_pro_token: Option<String>,

    /// Travis CI .org API endpoint
    #[arg(long, env = "REPO_POLICY_TRAVIS_ORG_URL")]
    pub travis_org_url: Option<String>,

    /// Travis CI .com API endpoint
    #[arg(long, env = "REPO_POLICY_TRAVIS_PRO_URL")]
    pub travis_pro_url: Option<String>,
}

impl Credentials {
    /// Facts for every value that is set and non-empty.
    pub fn facts(&self) -> FactMap {
        [
            (keys::GITHUB_ACCESS_TOKEN, &self.github_token),
            (keys::GITHUB_API_URL, &self.github_api_url),
            (keys::TRAVIS_ORG_TOKEN, &self.travis_org_token),
            (keys::TRAVIS_PRO_TOKEN, &self.travis_pro_token),
            (keys::TRAVIS_ORG_URL, &self.travis_org_url),
            (keys::TRAVIS_PRO_URL, &self.travis_pro_url),
        ]
        .into_iter()
        .filter_map(|(key, value)| {
            value
                .as_deref()
                .filter(|v| !v.is_empty())
                .map(|v| (key.to_string(), FactValue::from(v)))
        })
        .collect()
    }
}
