use anyhow::{anyhow, Context, Result};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "http://localhost:8000";
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Settings resolved from flags and environment before anything runs.
#[derive(Debug, Clone)]
pub struct Config {
    pub api_url: String,
    pub timeout: Duration,
    pub log_file: Option<PathBuf>,
    pub verbose: bool,
}

impl Config {
    pub fn new(api_url: &str, timeout_secs: u64, log_file: Option<PathBuf>, verbose: bool) -> Result<Self> {
        let api_url = normalize_api_url(api_url)?;
        if timeout_secs == 0 {
            return Err(anyhow!("--timeout must be at least 1 second"));
        }
        Ok(Self {
            api_url,
            timeout: Duration::from_secs(timeout_secs),
            log_file,
            verbose,
        })
    }

    /// Log destination for the interactive mode. The default location is
    /// only resolved (and its directory created) when this is called.
    pub fn log_path(&self) -> Result<PathBuf> {
        match &self.log_file {
            Some(path) => Ok(path.clone()),
            None => default_log_path(),
        }
    }
}

fn normalize_api_url(raw: &str) -> Result<String> {
    let url = reqwest::Url::parse(raw.trim())
        .with_context(|| format!("Invalid API URL '{}'", raw))?;
    match url.scheme() {
        "http" | "https" => {}
        other => return Err(anyhow!("API URL must be http or https, got '{}'", other)),
    }
    Ok(url.as_str().trim_end_matches('/').to_string())
}

fn default_log_path() -> Result<PathBuf> {
    let dir = if let Some(proj_dirs) = directories::ProjectDirs::from("", "", "resumeview") {
        proj_dirs.data_dir().to_path_buf()
    } else {
        // Fallback to current directory
        PathBuf::from(".")
    };
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create log directory {}", dir.display()))?;
    Ok(dir.join("resumeview.log"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_trims_trailing_slash() {
        assert_eq!(normalize_api_url("http://localhost:8000/").unwrap(), "http://localhost:8000");
        assert_eq!(
            normalize_api_url(" https://resumes.example.com/base/ ").unwrap(),
            "https://resumes.example.com/base"
        );
    }

    #[test]
    fn test_rejects_non_http_urls() {
        assert!(normalize_api_url("ftp://example.com").is_err());
        assert!(normalize_api_url("localhost:8000/api").is_err());
        let err = normalize_api_url("not a url").unwrap_err();
        assert!(err.to_string().contains("Invalid API URL"));
    }

    #[test]
    fn test_explicit_log_file_is_kept() {
        let config = Config::new(DEFAULT_API_URL, 30, Some("/tmp/rv.log".into()), true).unwrap();
        assert_eq!(config.log_path().unwrap(), PathBuf::from("/tmp/rv.log"));
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.api_url, "http://localhost:8000");
    }

    #[test]
    fn test_default_log_path_is_resolved_lazily() {
        let config = Config::new(DEFAULT_API_URL, 30, None, false).unwrap();
        assert_eq!(config.log_file, None);
    }

    #[test]
    fn test_zero_timeout_rejected() {
        assert!(Config::new(DEFAULT_API_URL, 0, Some("x.log".into()), false).is_err());
    }
}
