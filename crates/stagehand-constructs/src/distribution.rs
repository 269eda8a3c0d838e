//! Content distributions in front of buckets and HTTP APIs.

use serde::{Deserialize, Serialize};
use stagehand_core::resource::{BucketRef, DistributionRef};

/// Headers forwarded to origins so they can answer CORS preflights.
pub const CORS_HEADERS: [&str; 3] = [
    "Access-Control-Request-Headers",
    "Access-Control-Request-Method",
    "Origin",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Origin {
    /// A private bucket read through an origin access identity.
    Bucket { bucket: BucketRef },
    /// An HTTP endpoint, optionally under a path prefix.
    Http {
        domain: String,
        path: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceClass {
    /// North America and Europe edge locations only.
    PriceClass100,
    PriceClass200,
    PriceClassAll,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ViewerProtocolPolicy {
    AllowAll,
    RedirectToHttps,
    HttpsOnly,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachePolicy {
    pub enable_brotli: bool,
    pub enable_gzip: bool,
    pub forward_all_query_strings: bool,
    pub forward_all_cookies: bool,
    pub forwarded_headers: Vec<String>,
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self {
            enable_brotli: true,
            enable_gzip: true,
            forward_all_query_strings: true,
            forward_all_cookies: true,
            forwarded_headers: CORS_HEADERS.iter().map(|h| h.to_string()).collect(),
        }
    }
}

/// How requests matching a path pattern are served.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Behavior {
    pub path_pattern: Option<String>,
    pub origin: Origin,
    pub viewer_protocol_policy: ViewerProtocolPolicy,
    pub allow_all_methods: bool,
    pub cache_policy: CachePolicy,
}

impl Behavior {
    fn new(path_pattern: Option<String>, origin: Origin) -> Self {
        Self {
            path_pattern,
            origin,
            viewer_protocol_policy: ViewerProtocolPolicy::RedirectToHttps,
            allow_all_methods: true,
            cache_policy: CachePolicy::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Distribution {
    pub name: String,
    pub price_class: PriceClass,
    pub domain_names: Vec<String>,
    pub certificate_arn: Option<String>,
    pub default_behavior: Behavior,
    pub additional_behaviors: Vec<Behavior>,
}

impl Distribution {
    pub fn new(name: impl Into<String>, origin: Origin) -> Self {
        Self {
            name: name.into(),
            price_class: PriceClass::PriceClass100,
            domain_names: Vec::new(),
            certificate_arn: None,
            default_behavior: Behavior::new(None, origin),
            additional_behaviors: Vec::new(),
        }
    }

    pub fn with_domain_names(mut self, domain_names: Vec<String>) -> Self {
        self.domain_names = domain_names;
        self
    }

    pub fn with_certificate(mut self, certificate_arn: Option<String>) -> Self {
        self.certificate_arn = certificate_arn;
        self
    }

    /// Serve requests matching `path_pattern` from another origin.
    pub fn add_behavior(&mut self, path_pattern: impl Into<String>, origin: Origin) {
        self.additional_behaviors
            .push(Behavior::new(Some(path_pattern.into()), origin));
    }

    /// Reference by logical name; the platform substitutes the provisioned id.
    pub fn reference(&self) -> DistributionRef {
        DistributionRef::new(self.name.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let distribution = Distribution::new(
            "web",
            Origin::Bucket {
                bucket: BucketRef::new("site"),
            },
        );
        assert_eq!(distribution.price_class, PriceClass::PriceClass100);
        assert_eq!(
            distribution.default_behavior.viewer_protocol_policy,
            ViewerProtocolPolicy::RedirectToHttps
        );
        assert_eq!(distribution.default_behavior.cache_policy.forwarded_headers.len(), 3);
        assert!(distribution.additional_behaviors.is_empty());
    }

    #[test]
    fn test_add_behavior() {
        let mut distribution = Distribution::new(
            "web",
            Origin::Http {
                domain: "api.example.com".to_string(),
                path: Some("/prod".to_string()),
            },
        );
        distribution.add_behavior(
            "assets/*",
            Origin::Bucket {
                bucket: BucketRef::new("assets"),
            },
        );
        let behavior = &distribution.additional_behaviors[0];
        assert_eq!(behavior.path_pattern.as_deref(), Some("assets/*"));
        assert!(matches!(behavior.origin, Origin::Bucket { .. }));
    }
}
