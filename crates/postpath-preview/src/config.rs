//! Application configuration loaded from environment variables.

use std::time::Duration;

use anyhow::{Context, bail};
use postpath_core::{ClassifierConfig, ClassifierPolicy, QueryForm};
use url::Url;

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server bind address (e.g., "0.0.0.0:3000").
    pub bind_addr: String,

    /// GraphQL endpoint of the content backend. When unset, every request
    /// that needs content or a content-site redirect is answered 404.
    pub graphql_endpoint: Option<Url>,

    /// Which classification policy is active.
    pub classifier_policy: ClassifierPolicy,

    /// Where ordinary visitors are sent under the user-agent policy.
    pub redirect_base: Option<Url>,

    /// If set, rendered pages carry a meta refresh to this base plus the
    /// request path.
    pub refresh_base: Option<Url>,

    /// Referrer substrings redirected under the referrer policy.
    pub flagged_referrers: Vec<String>,

    /// Tracking-marker query parameter redirected under the referrer policy.
    pub tracking_param: String,

    /// Which lookup the backend supports.
    pub query_form: QueryForm,

    /// Deadline for the one outbound backend request.
    pub backend_timeout: Duration,

    /// Port for the Prometheus `/metrics` server, if enabled.
    pub metrics_port: Option<u16>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:3000".to_string(),
            graphql_endpoint: None,
            classifier_policy: ClassifierPolicy::Referrer,
            redirect_base: None,
            refresh_base: None,
            flagged_referrers: vec!["facebook.com".to_string()],
            tracking_param: "fbclid".to_string(),
            query_form: QueryForm::NodeByUri,
            backend_timeout: Duration::from_secs(10),
            metrics_port: None,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// All variables are optional:
    /// - `GRAPHQL_ENDPOINT`: content backend GraphQL URL (unset: serve 404s)
    /// - `PREVIEW_BIND_ADDR`: server bind address (default: "0.0.0.0:3000")
    /// - `PREVIEW_CLASSIFIER`: "referrer" or "user-agent" (default: "referrer")
    /// - `PREVIEW_REDIRECT_BASE`: redirect target for non-crawlers under the user-agent policy
    /// - `PREVIEW_REFRESH_BASE`: meta-refresh target for rendered pages
    /// - `PREVIEW_FLAGGED_REFERRERS`: comma-separated referrer substrings (default: "facebook.com")
    /// - `PREVIEW_TRACKING_PARAM`: tracking-marker query parameter (default: "fbclid")
    /// - `PREVIEW_QUERY_FORM`: "node-by-uri" or "post-by-uri" (default: "node-by-uri")
    /// - `PREVIEW_BACKEND_TIMEOUT_SECS`: outbound request deadline (default: 10)
    /// - `PREVIEW_METRICS_PORT`: serve Prometheus metrics on this port
    pub fn from_env() -> anyhow::Result<Self> {
        let defaults = Self::default();

        let bind_addr = env_var("PREVIEW_BIND_ADDR").unwrap_or(defaults.bind_addr);

        let graphql_endpoint = url_var("GRAPHQL_ENDPOINT")?;
        let redirect_base = url_var("PREVIEW_REDIRECT_BASE")?;
        let refresh_base = url_var("PREVIEW_REFRESH_BASE")?;

        let classifier_policy = match env_var("PREVIEW_CLASSIFIER") {
            Some(raw) => raw
                .parse::<ClassifierPolicy>()
                .map_err(anyhow::Error::msg)
                .context("PREVIEW_CLASSIFIER")?,
            None => defaults.classifier_policy,
        };

        let query_form = match env_var("PREVIEW_QUERY_FORM") {
            Some(raw) => raw
                .parse::<QueryForm>()
                .map_err(anyhow::Error::msg)
                .context("PREVIEW_QUERY_FORM")?,
            None => defaults.query_form,
        };

        let flagged_referrers = match env_var("PREVIEW_FLAGGED_REFERRERS") {
            Some(raw) => raw
                .split(',')
                .map(|s| s.trim().to_lowercase())
                .filter(|s| !s.is_empty())
                .collect(),
            None => defaults.flagged_referrers,
        };

        let tracking_param = env_var("PREVIEW_TRACKING_PARAM").unwrap_or(defaults.tracking_param);

        let backend_timeout = match env_var("PREVIEW_BACKEND_TIMEOUT_SECS") {
            Some(raw) => {
                let secs: u64 = raw
                    .parse()
                    .with_context(|| format!("PREVIEW_BACKEND_TIMEOUT_SECS: '{raw}'"))?;
                if secs == 0 {
                    bail!("PREVIEW_BACKEND_TIMEOUT_SECS must be greater than zero");
                }
                Duration::from_secs(secs)
            }
            None => defaults.backend_timeout,
        };

        let metrics_port = env_var("PREVIEW_METRICS_PORT")
            .map(|raw| {
                raw.parse::<u16>()
                    .with_context(|| format!("PREVIEW_METRICS_PORT: '{raw}'"))
            })
            .transpose()?;

        if graphql_endpoint.is_none() {
            tracing::warn!("GRAPHQL_ENDPOINT is not set; content requests will be answered 404");
        }
        if classifier_policy == ClassifierPolicy::UserAgent && redirect_base.is_none() {
            tracing::warn!(
                "PREVIEW_REDIRECT_BASE is not set; non-crawler requests will be answered 404"
            );
        }

        tracing::info!(
            bind_addr = %bind_addr,
            graphql_endpoint = graphql_endpoint.as_ref().map(Url::as_str).unwrap_or("<unset>"),
            classifier = %classifier_policy,
            query_form = %query_form,
            redirect_base = redirect_base.as_ref().map(Url::as_str).unwrap_or("<unset>"),
            refresh_base = refresh_base.as_ref().map(Url::as_str).unwrap_or("<unset>"),
            flagged_referrers = flagged_referrers.len(),
            tracking_param = %tracking_param,
            backend_timeout_secs = backend_timeout.as_secs(),
            "preview configuration loaded"
        );

        Ok(Self {
            bind_addr,
            graphql_endpoint,
            classifier_policy,
            redirect_base,
            refresh_base,
            flagged_referrers,
            tracking_param,
            query_form,
            backend_timeout,
            metrics_port,
        })
    }

    /// The subset of settings the request classifier needs.
    pub fn classifier_config(&self) -> ClassifierConfig {
        ClassifierConfig {
            policy: self.classifier_policy,
            endpoint: self.graphql_endpoint.clone(),
            redirect_base: self.redirect_base.clone(),
            flagged_referrers: self.flagged_referrers.clone(),
            tracking_param: self.tracking_param.clone(),
        }
    }
}

/// Read a variable, treating blank values as unset.
fn env_var(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Read an optional absolute HTTP(S) URL.
fn url_var(key: &str) -> anyhow::Result<Option<Url>> {
    let Some(raw) = env_var(key) else {
        return Ok(None);
    };
    let url = Url::parse(&raw).with_context(|| format!("{key}: '{raw}' is not a valid URL"))?;
    if !matches!(url.scheme(), "http" | "https") {
        bail!("{key}: '{raw}' must be an http or https URL");
    }
    Ok(Some(url))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Mutex to serialize config tests that manipulate env vars.
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    const ENV_KEYS: &[&str] = &[
        "GRAPHQL_ENDPOINT",
        "PREVIEW_BIND_ADDR",
        "PREVIEW_CLASSIFIER",
        "PREVIEW_REDIRECT_BASE",
        "PREVIEW_REFRESH_BASE",
        "PREVIEW_FLAGGED_REFERRERS",
        "PREVIEW_TRACKING_PARAM",
        "PREVIEW_QUERY_FORM",
        "PREVIEW_BACKEND_TIMEOUT_SECS",
        "PREVIEW_METRICS_PORT",
    ];

    /// Helper to run config tests with isolated env vars.
    fn with_env_vars<F: FnOnce()>(vars: &[(&str, &str)], f: F) {
        let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());

        let saved: Vec<_> = ENV_KEYS
            .iter()
            .map(|k| (*k, std::env::var(k).ok()))
            .collect();

        // SAFETY: Serialized by mutex; only test code touches these vars.
        unsafe {
            for k in ENV_KEYS {
                std::env::remove_var(k);
            }
            for (k, v) in vars {
                std::env::set_var(k, v);
            }
        }

        f();

        // SAFETY: Restoring original env state.
        unsafe {
            for (k, v) in &saved {
                match v {
                    Some(val) => std::env::set_var(k, val),
                    None => std::env::remove_var(k),
                }
            }
        }
    }

    #[test]
    fn config_defaults() {
        with_env_vars(&[], || {
            let config = Config::from_env().unwrap();
            assert_eq!(config.bind_addr, "0.0.0.0:3000");
            assert!(config.graphql_endpoint.is_none());
            assert_eq!(config.classifier_policy, ClassifierPolicy::Referrer);
            assert_eq!(config.flagged_referrers, vec!["facebook.com".to_string()]);
            assert_eq!(config.tracking_param, "fbclid");
            assert_eq!(config.query_form, QueryForm::NodeByUri);
            assert_eq!(config.backend_timeout, Duration::from_secs(10));
            assert!(config.metrics_port.is_none());
        });
    }

    #[test]
    fn config_custom_values() {
        with_env_vars(
            &[
                ("GRAPHQL_ENDPOINT", "https://cms.example.com/graphql/"),
                ("PREVIEW_BIND_ADDR", "127.0.0.1:9090"),
                ("PREVIEW_CLASSIFIER", "user-agent"),
                ("PREVIEW_REDIRECT_BASE", "https://life.example.net"),
                ("PREVIEW_REFRESH_BASE", "https://life.example.net/"),
                ("PREVIEW_FLAGGED_REFERRERS", "Facebook.com, t.co ,,"),
                ("PREVIEW_TRACKING_PARAM", "igshid"),
                ("PREVIEW_QUERY_FORM", "post-by-uri"),
                ("PREVIEW_BACKEND_TIMEOUT_SECS", "3"),
                ("PREVIEW_METRICS_PORT", "9091"),
            ],
            || {
                let config = Config::from_env().unwrap();
                assert_eq!(config.bind_addr, "127.0.0.1:9090");
                assert_eq!(
                    config.graphql_endpoint.as_ref().map(Url::as_str),
                    Some("https://cms.example.com/graphql/")
                );
                assert_eq!(config.classifier_policy, ClassifierPolicy::UserAgent);
                assert!(config.redirect_base.is_some());
                assert!(config.refresh_base.is_some());
                assert_eq!(
                    config.flagged_referrers,
                    vec!["facebook.com".to_string(), "t.co".to_string()]
                );
                assert_eq!(config.tracking_param, "igshid");
                assert_eq!(config.query_form, QueryForm::PostByUri);
                assert_eq!(config.backend_timeout, Duration::from_secs(3));
                assert_eq!(config.metrics_port, Some(9091));
            },
        );
    }

    #[test]
    fn config_blank_endpoint_is_unset() {
        with_env_vars(&[("GRAPHQL_ENDPOINT", "   ")], || {
            let config = Config::from_env().unwrap();
            assert!(config.graphql_endpoint.is_none());
        });
    }

    #[test]
    fn config_rejects_non_http_endpoint() {
        with_env_vars(&[("GRAPHQL_ENDPOINT", "ftp://cms.example.com/graphql")], || {
            assert!(Config::from_env().is_err());
        });
    }

    #[test]
    fn config_rejects_unparseable_endpoint() {
        with_env_vars(&[("GRAPHQL_ENDPOINT", "not a url")], || {
            assert!(Config::from_env().is_err());
        });
    }

    #[test]
    fn config_rejects_unknown_policy() {
        with_env_vars(&[("PREVIEW_CLASSIFIER", "both")], || {
            let err = Config::from_env().unwrap_err();
            assert!(format!("{err:#}").contains("PREVIEW_CLASSIFIER"));
        });
    }

    #[test]
    fn config_rejects_zero_timeout() {
        with_env_vars(&[("PREVIEW_BACKEND_TIMEOUT_SECS", "0")], || {
            assert!(Config::from_env().is_err());
        });
    }

    #[test]
    fn config_rejects_bad_metrics_port() {
        with_env_vars(&[("PREVIEW_METRICS_PORT", "70000")], || {
            assert!(Config::from_env().is_err());
        });
    }

    #[test]
    fn classifier_config_carries_settings() {
        let config = Config {
            graphql_endpoint: Some(Url::parse("https://cms.example.com/graphql").unwrap()),
            tracking_param: "gclid".to_string(),
            ..Default::default()
        };
        let classifier = config.classifier_config();
        assert_eq!(classifier.policy, ClassifierPolicy::Referrer);
        assert!(classifier.endpoint.is_some());
        assert_eq!(classifier.tracking_param, "gclid");
    }
}
