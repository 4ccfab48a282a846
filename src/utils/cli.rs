use crate::config::Config;
use clap::Parser;
use std::path::PathBuf;

const DEFAULT_MAX_CHUNK_SIZE: usize = 64 * 1024 * 1024;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Shim listening host
    #[arg(long, env = "ACTIONS_CACHE_SHIM_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Shim listening port, 0 picks a free one
    #[arg(short, long, env = "ACTIONS_CACHE_SHIM_PORT", default_value_t = 0)]
    pub port: u16,

    /// Base URL of the results (RPC cache) service
    #[arg(long, env = "ACTIONS_RESULTS_URL")]
    pub results_url: Option<String>,

    /// Bearer token for the results service
    #[arg(long, env = "ACTIONS_RUNTIME_TOKEN", hide_env_values = true)]
    pub runtime_token: Option<String>,

    /// Whether the v2 cache service is enabled for this run
    #[arg(long, env = "ACTIONS_CACHE_SERVICE_V2")]
    pub service_v2: bool,

    /// Largest accepted chunk upload, in bytes
    #[arg(
        long,
        env = "ACTIONS_CACHE_SHIM_MAX_CHUNK_SIZE",
        default_value_t = DEFAULT_MAX_CHUNK_SIZE
    )]
    pub max_chunk_size: usize,

    /// File to append `ACTIONS_CACHE_URL=...` to once listening
    #[arg(long, env = "GITHUB_ENV")]
    pub github_env: Option<PathBuf>,
}

impl Args {
    /// Checks the arguments and builds the server configuration, reporting
    /// every problem at once.
    pub fn validate(&self) -> Result<Config, Vec<String>> {
        let mut validation_errors = Vec::new();

        let results_url = match self.results_url.as_deref().map(str::trim) {
            Some(url) if url.starts_with("http://") || url.starts_with("https://") => {
                url.to_string()
            }
            Some(url) if !url.is_empty() => {
                validation_errors.push(format!("ACTIONS_RESULTS_URL `{url}` is not an http(s) URL"));
                String::new()
            }
            _ => {
                validation_errors.push("ACTIONS_RESULTS_URL is not set".to_string());
                String::new()
            }
        };

        let runtime_token = match self.runtime_token.as_deref() {
            Some(token) if !token.trim().is_empty() => token.trim().to_string(),
            _ => {
                validation_errors.push("ACTIONS_RUNTIME_TOKEN is not set".to_string());
                String::new()
            }
        };

        if self.max_chunk_size == 0 {
            validation_errors.push("the maximum chunk size must be greater than zero".to_string());
        }

        if let Some(parent) = self
            .github_env
            .as_deref()
            .and_then(|path| path.parent())
            .filter(|parent| !parent.as_os_str().is_empty())
            && !parent.exists()
        {
            validation_errors.push(format!(
                "The directory for GITHUB_ENV `{}` does not exist",
                parent.display(),
            ));
        }

        if !validation_errors.is_empty() {
            return Err(validation_errors);
        }

        Ok(Config {
            host: self.host.clone(),
            port: self.port,
            results_url,
            runtime_token,
            max_chunk_size: self.max_chunk_size,
            github_env: self.github_env.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(extra: &[&str]) -> Args {
        let mut argv = vec!["actions-cache-shim"];
        argv.extend_from_slice(extra);
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_validate_accepts_complete_arguments() {
        let config = args(&[
            "--results-url",
            "https://results.example.com/",
            "--runtime-token",
            "secret",
            "--port",
            "8080",
        ])
        .validate()
        .unwrap();

        assert_eq!(config.results_url, "https://results.example.com/");
        assert_eq!(config.runtime_token, "secret");
        assert_eq!(config.port, 8080);
        assert_eq!(config.max_chunk_size, DEFAULT_MAX_CHUNK_SIZE);
    }

    #[test]
    fn test_validate_reports_every_problem() {
        let mut parsed = args(&["--results-url", "ftp://nope", "--max-chunk-size", "0"]);
        parsed.runtime_token = None;

        let errors = parsed.validate().unwrap_err();
        assert_eq!(errors.len(), 3);
        assert!(errors[0].contains("ftp://nope"));
        assert!(errors[1].contains("ACTIONS_RUNTIME_TOKEN"));
    }

    #[test]
    fn test_validate_rejects_missing_env_file_directory() {
        let mut parsed = args(&["--results-url", "http://localhost:1", "--runtime-token", "t"]);
        parsed.github_env = Some(PathBuf::from("/definitely/not/here/env"));

        let errors = parsed.validate().unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("GITHUB_ENV"));
    }
}
