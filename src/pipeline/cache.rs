//! Browser-cache negotiation.
//!
//! # Algorithm
//! ```text
//! policy disabled            → Skipped (no headers, handler runs)
//! otherwise                  → emit Etag "<version>" + Cache-Control max-age
//! If-None-Match contains tag → NotModified (304, handler skipped)
//! else                       → Fresh (handler runs, headers kept)
//! ```
//!
//! # Design Decisions
//! - The entity tag is the deployed version, not a digest of the payload;
//!   every cached route is invalidated together on redeploy
//! - `If-None-Match` is matched by substring containment, so a tag list
//!   (or a weak `W/"..."` form) containing the tag also matches

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use axum::http::header::{CACHE_CONTROL, ETAG, IF_NONE_MATCH};
use axum::http::{HeaderMap, HeaderValue};

use crate::config::CacheConfig;

/// Process-wide version tag, fixed at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VersionTag(u64);

impl VersionTag {
    pub fn new(version: u64) -> Self {
        Self(version)
    }

    /// Seconds since the UNIX epoch at the time of the call.
    pub fn from_clock() -> Self {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        Self(now)
    }

    pub fn get(self) -> u64 {
        self.0
    }

    /// Quoted decimal form used as the entity tag.
    pub fn etag(self) -> String {
        format!("\"{}\"", self.0)
    }
}

/// Outcome of negotiating one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Negotiation {
    /// Caching is off for the route.
    Skipped,
    /// Headers emitted; the handler must run.
    Fresh,
    /// The client already holds this version.
    NotModified,
}

/// Browser-cache settings for a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachePolicy {
    pub enabled: bool,
    pub max_age: Duration,
    pub version: VersionTag,
}

impl CachePolicy {
    pub fn new(enabled: bool, max_age: Duration, version: VersionTag) -> Self {
        Self {
            enabled,
            max_age,
            version,
        }
    }

    /// A policy that never emits headers.
    pub fn disabled() -> Self {
        Self::new(false, Duration::ZERO, VersionTag::new(0))
    }

    /// Service-wide policy; resolves the version tag once.
    pub fn from_config(config: &CacheConfig) -> Self {
        let version = config
            .version_tag
            .map(VersionTag::new)
            .unwrap_or_else(VersionTag::from_clock);
        Self::new(
            config.enabled,
            Duration::from_secs(config.max_age_secs),
            version,
        )
    }

    /// Derive a route's policy from the service-wide one.
    ///
    /// The route caches only if both the service and the route opt in; a
    /// positive override replaces the service max-age.
    pub fn for_route(&self, use_cache: bool, max_age_override: Option<Duration>) -> Self {
        let mut policy = *self;
        policy.enabled = self.enabled && use_cache;
        if let Some(max_age) = max_age_override.filter(|max_age| !max_age.is_zero()) {
            policy.max_age = max_age;
        }
        policy
    }

    /// Max-age rounded to the nearest whole second.
    pub fn max_age_secs(&self) -> u64 {
        self.max_age.as_secs_f64().round() as u64
    }

    /// Emit cache headers into `response` and compare with the request.
    pub fn negotiate(&self, request: &HeaderMap, response: &mut HeaderMap) -> Negotiation {
        if !self.enabled {
            return Negotiation::Skipped;
        }

        let etag = self.version.etag();
        if let Ok(value) = HeaderValue::from_str(&etag) {
            response.insert(ETAG, value);
        }
        if let Ok(value) = HeaderValue::from_str(&format!("max-age={}", self.max_age_secs())) {
            response.insert(CACHE_CONTROL, value);
        }

        let matched = request
            .get_all(IF_NONE_MATCH)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .any(|tags| tags.contains(&etag));

        if matched {
            Negotiation::NotModified
        } else {
            Negotiation::Fresh
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> CachePolicy {
        CachePolicy::new(true, Duration::from_secs(60 * 60), VersionTag::new(123))
    }

    fn if_none_match(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(IF_NONE_MATCH, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_fresh_request_gets_headers() {
        let mut out = HeaderMap::new();
        let outcome = policy().negotiate(&HeaderMap::new(), &mut out);

        assert_eq!(outcome, Negotiation::Fresh);
        assert_eq!(out[ETAG], "\"123\"");
        assert_eq!(out[CACHE_CONTROL], "max-age=3600");
    }

    #[test]
    fn test_matching_tag_is_not_modified() {
        let mut out = HeaderMap::new();
        let outcome = policy().negotiate(&if_none_match("\"123\""), &mut out);
        assert_eq!(outcome, Negotiation::NotModified);
        assert_eq!(out[ETAG], "\"123\"");
    }

    #[test]
    fn test_stale_tag_is_fresh() {
        let mut out = HeaderMap::new();
        let outcome = policy().negotiate(&if_none_match("\"122\""), &mut out);
        assert_eq!(outcome, Negotiation::Fresh);
    }

    // Containment, not list parsing: a tag inside a longer list matches, and
    // so does a weak validator wrapping the same value.
    #[test]
    fn test_containment_quirk() {
        for header in ["\"9\", \"123\"", "W/\"123\""] {
            let mut out = HeaderMap::new();
            assert_eq!(
                policy().negotiate(&if_none_match(header), &mut out),
                Negotiation::NotModified,
                "{header}"
            );
        }
        // `"1234"` does not contain `"123"` because the quotes are part of the tag.
        let mut out = HeaderMap::new();
        assert_eq!(
            policy().negotiate(&if_none_match("\"1234\""), &mut out),
            Negotiation::Fresh
        );
    }

    #[test]
    fn test_disabled_policy_is_silent() {
        let disabled = policy().for_route(false, None);
        let mut out = HeaderMap::new();

        let outcome = disabled.negotiate(&if_none_match("\"123\""), &mut out);

        assert_eq!(outcome, Negotiation::Skipped);
        assert!(out.is_empty());
    }

    #[test]
    fn test_route_override() {
        let base = policy();
        assert_eq!(
            base.for_route(true, Some(Duration::from_secs(5))).max_age,
            Duration::from_secs(5)
        );
        assert_eq!(base.for_route(true, Some(Duration::ZERO)).max_age, base.max_age);
        assert_eq!(base.for_route(true, None).version, base.version);
        assert!(!CachePolicy::disabled().for_route(true, None).enabled);
    }

    #[test]
    fn test_max_age_rounds_to_nearest_second() {
        let mut policy = policy();
        policy.max_age = Duration::from_millis(1_499);
        assert_eq!(policy.max_age_secs(), 1);
        policy.max_age = Duration::from_millis(1_500);
        assert_eq!(policy.max_age_secs(), 2);
    }

    #[test]
    fn test_config_version_tag_wins_over_clock() {
        let config = CacheConfig {
            enabled: true,
            max_age_secs: 10,
            version_tag: Some(77),
        };
        let policy = CachePolicy::from_config(&config);
        assert_eq!(policy.version.get(), 77);
        assert_eq!(policy.max_age, Duration::from_secs(10));
    }
}
