//! Latest-release lookup against the GitHub API.

use serde::{Deserialize, Serialize};

use crate::config::UpstreamConfig;
use crate::engine::ReleaseSource;
use crate::errors::GateError;

const USER_AGENT: &str = concat!("compat-gate/", env!("CARGO_PKG_VERSION"));

/// A normalized upstream release identifier.
///
/// A single leading `v` is stripped from the tag; everything else is kept
/// verbatim. Versions are opaque strings compared for exact equality —
/// canary tags, date tags, and other non-semver identifiers flow through
/// untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReleaseVersion(String);

impl ReleaseVersion {
    pub fn new(version: impl Into<String>) -> Self {
        Self(version.into())
    }

    /// Normalize a release tag (`v13.0.0` → `13.0.0`).
    pub fn from_tag(tag: &str) -> Self {
        Self(tag.strip_prefix('v').unwrap_or(tag).to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ReleaseVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Response from GitHub's latest-release endpoint (subset of fields).
#[derive(Debug, Deserialize)]
pub struct LatestRelease {
    pub tag_name: String,
}

/// Release resolver backed by the GitHub releases API.
///
/// The token is optional: without one the call is unauthenticated and
/// subject to lower rate limits, which is fine for a scheduled run.
pub struct GitHubReleases {
    owner: String,
    repo: String,
    token: Option<String>,
    client: reqwest::Client,
}

impl GitHubReleases {
    pub fn new(upstream: &UpstreamConfig, token: Option<String>) -> Self {
        Self {
            owner: upstream.owner.clone(),
            repo: upstream.repo.clone(),
            token,
            client: reqwest::Client::new(),
        }
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }
}

#[async_trait::async_trait]
impl ReleaseSource for GitHubReleases {
    async fn latest_release(&self) -> Result<ReleaseVersion, GateError> {
        let url = format!(
            "https://api.github.com/repos/{}/{}/releases/latest",
            self.owner, self.repo
        );

        let mut request = self
            .client
            .get(&url)
            .header("User-Agent", USER_AGENT)
            .header("Accept", "application/vnd.github+json");
        if let Some(token) = &self.token {
            request = request.header("Authorization", format!("Bearer {}", token));
        }

        let release: LatestRelease = request
            .send()
            .await
            .map_err(|e| GateError::UpstreamUnavailable(anyhow::Error::new(e)))?
            .error_for_status()
            .map_err(|e| GateError::UpstreamUnavailable(anyhow::Error::new(e)))?
            .json()
            .await
            .map_err(|e| GateError::UpstreamUnavailable(anyhow::Error::new(e)))?;

        Ok(ReleaseVersion::from_tag(&release.tag_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── ReleaseVersion normalization ─────────────────────────────────

    #[test]
    fn test_from_tag_strips_leading_v() {
        assert_eq!(ReleaseVersion::from_tag("v13.0.0").as_str(), "13.0.0");
    }

    #[test]
    fn test_from_tag_without_prefix_unchanged() {
        assert_eq!(ReleaseVersion::from_tag("13.0.0").as_str(), "13.0.0");
    }

    #[test]
    fn test_from_tag_strips_only_one_v() {
        assert_eq!(ReleaseVersion::from_tag("vv1.0").as_str(), "v1.0");
    }

    #[test]
    fn test_non_semver_tag_is_opaque() {
        // Versions are never parsed, only compared for equality
        assert_eq!(
            ReleaseVersion::from_tag("v13.0.1-canary.3").as_str(),
            "13.0.1-canary.3"
        );
        assert_eq!(
            ReleaseVersion::from_tag("release-2023-05-01").as_str(),
            "release-2023-05-01"
        );
    }

    #[test]
    fn test_equality_is_exact() {
        assert_eq!(ReleaseVersion::new("13.0.0"), ReleaseVersion::new("13.0.0"));
        assert_ne!(ReleaseVersion::new("13.0.0"), ReleaseVersion::new("13.0"));
    }

    #[test]
    fn test_display_roundtrip() {
        let v = ReleaseVersion::from_tag("v12.9.0");
        assert_eq!(v.to_string(), "12.9.0");
    }

    // ── LatestRelease deserialization ────────────────────────────────

    #[test]
    fn test_latest_release_deserialize() {
        let json = r#"{
            "tag_name": "v13.0.0",
            "name": "13.0.0",
            "draft": false,
            "prerelease": false
        }"#;
        let release: LatestRelease = serde_json::from_str(json).unwrap();
        assert_eq!(release.tag_name, "v13.0.0");
        assert_eq!(
            ReleaseVersion::from_tag(&release.tag_name).as_str(),
            "13.0.0"
        );
    }

    #[test]
    fn test_latest_release_missing_tag_name_errors() {
        let json = r#"{"name": "13.0.0"}"#;
        let result: Result<LatestRelease, _> = serde_json::from_str(json);
        assert!(result.is_err());
    }

    // ── GitHubReleases construction ──────────────────────────────────

    #[test]
    fn test_resolver_reports_token_presence() {
        let upstream = UpstreamConfig::default();
        let with = GitHubReleases::new(&upstream, Some("ghp_abc123".to_string()));
        let without = GitHubReleases::new(&upstream, None);
        assert!(with.has_token());
        assert!(!without.has_token());
    }
}
