use anyhow::{bail, Context, Result};
use llm_client::{LlmConfig, RetryPolicy};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct AnnotatorConfig {
    // Inputs
    pub messages_path: PathBuf,
    pub directory_path: PathBuf,
    pub keys_path: PathBuf,
    pub proxy_path: PathBuf,

    // Outputs
    pub output_path: PathBuf,
    pub json_path: Option<PathBuf>,

    // Dispatch
    pub limit: usize,            // first N unique messages
    pub max_in_flight: usize,    // global cap
    pub host_limit: usize,       // per-host cap
    pub timeout_secs: u64,
    pub retries: u32,            // 0 = a failed call is final
}

impl Default for AnnotatorConfig {
    fn default() -> Self {
        Self {
            messages_path: PathBuf::from("../processed/unique_mentions_texts.csv"),
            directory_path: PathBuf::from("../processed/moex.csv"),
            keys_path: PathBuf::from("../env/openai_api_keys.txt"),
            proxy_path: PathBuf::from("../env/proxy_configs.txt"),
            output_path: PathBuf::from("mentions_&_sentiments.csv"),
            json_path: None,
            limit: 1000,
            max_in_flight: 20,
            host_limit: 10,
            timeout_secs: 60,
            retries: 0,
        }
    }
}

impl AnnotatorConfig {
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();
        let path = |key: &str, default: PathBuf| env::var(key).map(PathBuf::from).unwrap_or(default);

        Ok(Self {
            messages_path: path("ANNOTATOR_MESSAGES", defaults.messages_path),
            directory_path: path("ANNOTATOR_DIRECTORY", defaults.directory_path),
            keys_path: path("ANNOTATOR_KEYS", defaults.keys_path),
            proxy_path: path("ANNOTATOR_PROXY", defaults.proxy_path),
            output_path: path("ANNOTATOR_OUTPUT", defaults.output_path),
            json_path: env::var("ANNOTATOR_JSON").ok().map(PathBuf::from),
            limit: env::var("ANNOTATOR_LIMIT")
                .unwrap_or_else(|_| defaults.limit.to_string())
                .parse()
                .context("ANNOTATOR_LIMIT")?,
            max_in_flight: env::var("ANNOTATOR_CONCURRENCY")
                .unwrap_or_else(|_| defaults.max_in_flight.to_string())
                .parse()
                .context("ANNOTATOR_CONCURRENCY")?,
            host_limit: env::var("ANNOTATOR_HOST_LIMIT")
                .unwrap_or_else(|_| defaults.host_limit.to_string())
                .parse()
                .context("ANNOTATOR_HOST_LIMIT")?,
            timeout_secs: env::var("ANNOTATOR_TIMEOUT")
                .unwrap_or_else(|_| defaults.timeout_secs.to_string())
                .parse()
                .context("ANNOTATOR_TIMEOUT")?,
            retries: env::var("ANNOTATOR_RETRIES")
                .unwrap_or_else(|_| defaults.retries.to_string())
                .parse()
                .context("ANNOTATOR_RETRIES")?,
        })
    }

    /// Command-line flags override environment values.
    pub fn apply_args(&mut self, args: &[String]) -> Result<()> {
        let mut iter = args.iter();
        while let Some(flag) = iter.next() {
            let mut value = || {
                iter.next()
                    .cloned()
                    .with_context(|| format!("{} needs a value", flag))
            };
            match flag.as_str() {
                "--messages" => self.messages_path = value()?.into(),
                "--directory" => self.directory_path = value()?.into(),
                "--keys" => self.keys_path = value()?.into(),
                "--proxy" => self.proxy_path = value()?.into(),
                "--output" => self.output_path = value()?.into(),
                "--json" => self.json_path = Some(value()?.into()),
                "--limit" => self.limit = value()?.parse().context("--limit")?,
                "--concurrency" => self.max_in_flight = value()?.parse().context("--concurrency")?,
                "--host-limit" => self.host_limit = value()?.parse().context("--host-limit")?,
                "--timeout" => self.timeout_secs = value()?.parse().context("--timeout")?,
                "--retries" => self.retries = value()?.parse().context("--retries")?,
                other => bail!("unknown argument: {}", other),
            }
        }

        if self.max_in_flight == 0 || self.host_limit == 0 {
            bail!("concurrency limits must be at least 1");
        }
        Ok(())
    }

    pub fn llm_config(&self) -> LlmConfig {
        LlmConfig {
            timeout: Duration::from_secs(self.timeout_secs),
            host_connection_limit: self.host_limit,
            ..LlmConfig::default()
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        if self.retries == 0 {
            RetryPolicy::none()
        } else {
            RetryPolicy::exponential(self.retries, Duration::from_secs(2), Duration::from_secs(30))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_defaults() {
        let config = AnnotatorConfig::default();
        assert_eq!(config.limit, 1000);
        assert_eq!(config.max_in_flight, 20);
        assert_eq!(config.host_limit, 10);
        assert_eq!(config.llm_config().timeout, Duration::from_secs(60));
        assert_eq!(config.retry_policy(), RetryPolicy::none());
    }

    #[test]
    fn test_flags_override() {
        let mut config = AnnotatorConfig::default();
        config
            .apply_args(&args(&[
                "--messages", "in.csv", "--limit", "5", "--concurrency", "3", "--host-limit", "2",
                "--json", "out.json", "--retries", "2",
            ]))
            .unwrap();

        assert_eq!(config.messages_path, PathBuf::from("in.csv"));
        assert_eq!(config.limit, 5);
        assert_eq!(config.max_in_flight, 3);
        assert_eq!(config.llm_config().host_connection_limit, 2);
        assert_eq!(config.json_path, Some(PathBuf::from("out.json")));
        assert_eq!(config.retry_policy().max_retries, 2);
    }

    #[test]
    fn test_bad_flags() {
        let mut config = AnnotatorConfig::default();
        assert!(config.apply_args(&args(&["--limit"])).is_err());
        assert!(config.apply_args(&args(&["--limit", "many"])).is_err());
        assert!(config.apply_args(&args(&["--bogus"])).is_err());
        assert!(config.apply_args(&args(&["--concurrency", "0"])).is_err());
    }
}
