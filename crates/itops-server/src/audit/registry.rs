//! Resource registry used by the audit classifier
//!
//! Feature routers register the collection segment they are mounted under
//! (`users`, `responsibility-groups`, ...) together with the resource token
//! audit rows carry and how the resource ID is found in the path. The
//! classifier only falls back to deriving a token from the raw segment when a
//! collection was never registered.

use std::collections::HashMap;

/// Tokens that end in `S` but are already singular.
pub const PLURAL_EXCEPTIONS: &[&str] = &["BUSINESS"];

/// Derive an upper-case resource token from a collection path segment.
///
/// Hyphens become underscores and one plural suffix is stripped:
/// `responsibility-groups` -> `RESPONSIBILITY_GROUP`,
/// `businesses` -> `BUSINESS`, `users` -> `USER`.
pub fn normalize_resource_segment(segment: &str) -> String {
    let token = segment.replace('-', "_").to_ascii_uppercase();

    if PLURAL_EXCEPTIONS.contains(&token.as_str()) || token.ends_with("SS") {
        return token;
    }

    if let Some(stem) = token.strip_suffix("SSES") {
        return format!("{stem}SS");
    }

    match token.strip_suffix('S') {
        Some(stem) if !stem.is_empty() => stem.to_string(),
        _ => token,
    }
}

/// Where the resource ID lives in a request path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdExtractor {
    /// First integer segment that directly follows a known collection segment.
    AfterCollection,
    /// Fixed index into the non-empty path segments (`/api/v1/x/7` has 7 at 3).
    Segment(usize),
    /// The collection never carries an ID.
    None,
}

/// Registration of one collection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceSpec {
    collection: String,
    token: String,
    id: IdExtractor,
}

impl ResourceSpec {
    /// Register `segment` with a derived token and the default ID scan.
    pub fn collection(segment: impl Into<String>) -> Self {
        let collection = segment.into();
        let token = normalize_resource_segment(&collection);
        Self {
            collection,
            token,
            id: IdExtractor::AfterCollection,
        }
    }

    /// Use an explicit resource token instead of the derived one.
    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.token = token.into().to_ascii_uppercase();
        self
    }

    pub fn id_at(mut self, index: usize) -> Self {
        self.id = IdExtractor::Segment(index);
        self
    }

    pub fn without_id(mut self) -> Self {
        self.id = IdExtractor::None;
        self
    }

    pub fn collection_segment(&self) -> &str {
        &self.collection
    }

    pub fn resource_token(&self) -> &str {
        &self.token
    }

    pub fn id_extractor(&self) -> IdExtractor {
        self.id
    }
}

/// Collection segment -> [`ResourceSpec`]
#[derive(Debug, Clone, Default)]
pub struct ResourceRegistry {
    specs: HashMap<String, ResourceSpec>,
}

impl ResourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a collection. A later registration of the same segment wins.
    pub fn register(&mut self, spec: ResourceSpec) {
        if let Some(previous) = self.specs.insert(spec.collection.clone(), spec) {
            tracing::warn!(
                collection = %previous.collection,
                "Audit resource registered twice, keeping the latest"
            );
        }
    }

    pub fn with(mut self, spec: ResourceSpec) -> Self {
        self.register(spec);
        self
    }

    pub fn get(&self, segment: &str) -> Option<&ResourceSpec> {
        self.specs.get(segment)
    }

    pub fn contains(&self, segment: &str) -> bool {
        self.specs.contains_key(segment)
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}
