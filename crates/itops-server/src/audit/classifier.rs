//! Request classification
//!
//! Maps `(method, path)` to the `(action, resource, resource_id)` triple an
//! audit row records, or to nothing when the request is not audited.

use axum::http::Method;

use super::context::AuditOverrides;
use super::models::AuditAction;
use super::registry::{normalize_resource_segment, IdExtractor, ResourceRegistry};

/// Path prefixes that are never audited unless configured otherwise.
pub const DEFAULT_SKIP_PATHS: &[&str] = &[
    "/api/v1/auth/login",
    "/swagger",
    "/api/v1/docs",
    "/health",
    "/metrics",
    "/api/v1/health",
    "/api/v1/audit-logs",
];

/// Index of the resource segment in `/api/v1/<resource>/...`.
const RESOURCE_SEGMENT: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub action: AuditAction,
    pub resource: String,
    pub resource_id: i64,
}

impl Classification {
    /// Apply handler overrides; every field set there wins.
    pub fn merge(mut self, overrides: &AuditOverrides) -> Self {
        if let Some(action) = overrides.action {
            self.action = action;
        }
        if let Some(resource) = &overrides.resource {
            self.resource = resource.clone();
        }
        if let Some(resource_id) = overrides.resource_id {
            self.resource_id = resource_id;
        }
        self
    }
}

#[derive(Debug, Clone)]
pub struct AuditClassifier {
    registry: ResourceRegistry,
    skip_paths: Vec<String>,
    strict: bool,
}

impl AuditClassifier {
    pub fn new(registry: ResourceRegistry) -> Self {
        Self {
            registry,
            skip_paths: DEFAULT_SKIP_PATHS.iter().map(|p| p.to_string()).collect(),
            strict: false,
        }
    }

    /// Replace the skip-list.
    pub fn with_skip_paths<I, P>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        self.skip_paths = paths
            .into_iter()
            .map(|p| {
                let p: String = p.into();
                p.trim_end_matches('/').to_string()
            })
            .collect();
        self
    }

    /// In strict mode collections missing from the registry are not audited.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Prefix match on whole segments: `/health` covers `/health/db` but not
    /// `/healthz`.
    pub fn is_skipped(&self, path: &str) -> bool {
        self.skip_paths.iter().any(|prefix| {
            if prefix.is_empty() {
                return true;
            }
            match path.strip_prefix(prefix.as_str()) {
                Some(rest) => rest.is_empty() || rest.starts_with('/'),
                None => false,
            }
        })
    }

    /// Classify from the request line alone.
    pub fn classify_request(&self, method: &Method, path: &str) -> Option<Classification> {
        if self.is_skipped(path) {
            return None;
        }

        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let collection = *segments.get(RESOURCE_SEGMENT)?;
        let action = AuditAction::from_method(method)?;

        let (resource, resource_id) = match self.registry.get(collection) {
            Some(spec) => {
                let id = match spec.id_extractor() {
                    IdExtractor::AfterCollection => self.scan_for_id(&segments, collection),
                    IdExtractor::Segment(index) => {
                        segments.get(index).and_then(|s| parse_id(s)).unwrap_or(0)
                    },
                    IdExtractor::None => 0,
                };
                (spec.resource_token().to_string(), id)
            },
            None if self.strict => {
                tracing::debug!(collection, "Unregistered collection, not audited");
                return None;
            },
            None => (
                normalize_resource_segment(collection),
                self.scan_for_id(&segments, collection),
            ),
        };

        Some(Classification {
            action,
            resource,
            resource_id,
        })
    }

    /// Classify and apply handler overrides.
    pub fn classify(
        &self,
        method: &Method,
        path: &str,
        overrides: &AuditOverrides,
    ) -> Option<Classification> {
        self.classify_request(method, path)
            .map(|classification| classification.merge(overrides))
    }

    fn scan_for_id(&self, segments: &[&str], resource_segment: &str) -> i64 {
        segments
            .windows(2)
            .find_map(|pair| {
                let known = pair[0] == resource_segment || self.registry.contains(pair[0]);
                if known {
                    parse_id(pair[1])
                } else {
                    None
                }
            })
            .unwrap_or(0)
    }
}

fn parse_id(segment: &str) -> Option<i64> {
    segment
        .parse::<u64>()
        .ok()
        .and_then(|id| i64::try_from(id).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::registry::ResourceSpec;

    fn classifier() -> AuditClassifier {
        AuditClassifier::new(
            ResourceRegistry::new()
                .with(ResourceSpec::collection("users"))
                .with(ResourceSpec::collection("roles"))
                .with(ResourceSpec::collection("permissions")),
        )
    }

    fn triple(c: Option<Classification>) -> Option<(AuditAction, String, i64)> {
        c.map(|c| (c.action, c.resource, c.resource_id))
    }

    #[test]
    fn test_default_skip_list() {
        let classifier = classifier();
        for path in [
            "/api/v1/auth/login",
            "/swagger/index.html",
            "/api/v1/docs",
            "/health",
            "/metrics",
            "/api/v1/health",
            "/api/v1/audit-logs",
            "/api/v1/audit-logs/17",
        ] {
            assert!(classifier.is_skipped(path), "{path} should be skipped");
            assert!(classifier.classify_request(&Method::POST, path).is_none());
        }
    }

    #[test]
    fn test_skip_list_matches_whole_segments() {
        let classifier = classifier();
        assert!(!classifier.is_skipped("/healthz"));
        assert!(!classifier.is_skipped("/api/v1/audit-logs-archive"));
    }

    #[test]
    fn test_configured_skip_list_replaces_default() {
        let classifier = classifier().with_skip_paths(["/internal/"]);
        assert!(classifier.is_skipped("/internal/jobs"));
        assert!(!classifier.is_skipped("/health"));
    }

    #[test]
    fn test_short_paths_are_skipped() {
        let classifier = classifier();
        assert!(classifier.classify_request(&Method::POST, "/").is_none());
        assert!(classifier.classify_request(&Method::POST, "/api/v1").is_none());
        assert!(classifier.classify_request(&Method::POST, "/api//v1/").is_none());
    }

    #[test]
    fn test_action_table() {
        let classifier = classifier();
        let path = "/api/v1/users/5";
        assert_eq!(
            triple(classifier.classify_request(&Method::POST, path)),
            Some((AuditAction::Create, "USER".into(), 5))
        );
        assert_eq!(
            triple(classifier.classify_request(&Method::PATCH, path)),
            Some((AuditAction::Update, "USER".into(), 5))
        );
        assert_eq!(
            triple(classifier.classify_request(&Method::DELETE, path)),
            Some((AuditAction::Delete, "USER".into(), 5))
        );
        assert_eq!(
            triple(classifier.classify_request(&Method::GET, path)),
            Some((AuditAction::Read, "USER".into(), 5))
        );
        assert!(classifier.classify_request(&Method::OPTIONS, path).is_none());
        assert!(classifier.classify_request(&Method::HEAD, path).is_none());
    }

    #[test]
    fn test_resource_id_scan() {
        let classifier = classifier();

        let c = classifier.classify_request(&Method::POST, "/api/v1/users").unwrap();
        assert_eq!(c.resource_id, 0);

        let c = classifier
            .classify_request(&Method::POST, "/api/v1/users/12/roles")
            .unwrap();
        assert_eq!(c.resource_id, 12);

        let c = classifier
            .classify_request(&Method::DELETE, "/api/v1/permissions/roles/5")
            .unwrap();
        assert_eq!((c.resource.as_str(), c.resource_id), ("PERMISSION", 5));

        let c = classifier
            .classify_request(&Method::DELETE, "/api/v1/users/-3")
            .unwrap();
        assert_eq!(c.resource_id, 0);
    }

    #[test]
    fn test_unregistered_collection_falls_back_to_heuristic() {
        let classifier = classifier();

        assert_eq!(
            triple(classifier.classify_request(&Method::PUT, "/api/v1/responsibility-groups/3")),
            Some((AuditAction::Update, "RESPONSIBILITY_GROUP".into(), 3))
        );
        assert_eq!(
            triple(classifier.classify_request(&Method::POST, "/api/v1/businesses")),
            Some((AuditAction::Create, "BUSINESS".into(), 0))
        );
    }

    #[test]
    fn test_strict_mode_skips_unregistered_collections() {
        let classifier = classifier().strict(true);
        assert!(classifier
            .classify_request(&Method::POST, "/api/v1/assets")
            .is_none());
        assert!(classifier
            .classify_request(&Method::POST, "/api/v1/users")
            .is_some());
    }

    #[test]
    fn test_registered_extractors() {
        let classifier = AuditClassifier::new(
            ResourceRegistry::new()
                .with(ResourceSpec::collection("envs").token("ENVIRONMENT").id_at(5))
                .with(ResourceSpec::collection("settings").without_id()),
        );

        assert_eq!(
            triple(classifier.classify_request(&Method::PUT, "/api/v1/envs/3/vars/8")),
            Some((AuditAction::Update, "ENVIRONMENT".into(), 8))
        );
        assert_eq!(
            triple(classifier.classify_request(&Method::PUT, "/api/v1/settings/42")),
            Some((AuditAction::Update, "SETTING".into(), 0))
        );
    }

    #[test]
    fn test_overrides_take_precedence() {
        let classifier = classifier();
        let overrides = AuditOverrides::new()
            .resource("ROLE")
            .action(AuditAction::Update)
            .resource_id(77);

        assert_eq!(
            triple(classifier.classify(&Method::POST, "/api/v1/permissions/roles/5", &overrides)),
            Some((AuditAction::Update, "ROLE".into(), 77))
        );

        let partial = AuditOverrides::new().resource_id(31);
        assert_eq!(
            triple(classifier.classify(&Method::POST, "/api/v1/users", &partial)),
            Some((AuditAction::Create, "USER".into(), 31))
        );
    }

    #[test]
    fn test_overrides_do_not_revive_skipped_requests() {
        let classifier = classifier();
        let overrides = AuditOverrides::new().resource("USER");
        assert!(classifier
            .classify(&Method::POST, "/api/v1/auth/login", &overrides)
            .is_none());
    }
}
