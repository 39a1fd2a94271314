use std::fmt;
use std::hash::{Hash, Hasher};

/// A file wanted from the network, identified by URL and pinned by digest.
///
/// Two artifacts are equal when their URLs are equal; the digest decides
/// whether a stored copy is acceptable, not which request it belongs to.
#[derive(Clone, Debug)]
pub struct Artifact {
    url:             String,
    expected_digest: String,
}

impl Artifact {
    pub fn new(url: impl Into<String>, expected_digest: impl Into<String>) -> Self {
        Self {
            url:             url.into(),
            expected_digest: expected_digest.into(),
        }
    }

    pub fn url(&self) -> &str { &self.url }

    pub fn expected_digest(&self) -> &str { &self.expected_digest }
}

impl PartialEq for Artifact {
    fn eq(&self, other: &Self) -> bool { self.url == other.url }
}

impl Eq for Artifact {}

impl Hash for Artifact {
    fn hash<H: Hasher>(&self, state: &mut H) { self.url.hash(state); }
}

impl fmt::Display for Artifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.url) }
}
