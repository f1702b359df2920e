//! Service identity and hashing.
//!
//! A [`ServiceKey`] is the (namespace, name) pair under which a logical
//! service is resolved. [`ServiceKeyHash`] is its FNV-1a digest, used as a
//! fixed-size cache key where cloning two strings per lookup would be waste.

use std::fmt;
use std::hash::{Hash, Hasher};

use fnv::FnvHasher;

/// Identity of a logical service: a namespace plus a service name.
///
/// Equality is structural and the type is usable as a map key.
///
/// # Example
///
/// ```rust
/// use naming_core::ServiceKey;
///
/// let a = ServiceKey::new("production", "echo.svc");
/// let b = ServiceKey::new("production", "echo.svc");
/// assert_eq!(a, b);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ServiceKey {
    /// Tenancy/environment partition the name is resolved under.
    pub namespace: String,
    /// Stable logical service name.
    pub name: String,
}

impl ServiceKey {
    /// Create a service key from a namespace and a name.
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// Whether both identity fields are populated.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        !self.namespace.is_empty() && !self.name.is_empty()
    }

    /// FNV-1a digest of this key.
    #[must_use]
    pub fn digest(&self) -> ServiceKeyHash {
        ServiceKeyHash::of(self)
    }
}

impl fmt::Display for ServiceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// Hash-based service identifier for efficient cache lookup.
///
/// Uses FNV-1a over both identity fields. The digest is what the route
/// snapshot cache keys on, so two keys that differ in either field hash to
/// distinct values with overwhelming probability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ServiceKeyHash(u64);

impl ServiceKeyHash {
    /// Compute the digest of a [`ServiceKey`].
    #[must_use]
    pub fn of(key: &ServiceKey) -> Self {
        let mut hasher = FnvHasher::default();
        key.namespace.hash(&mut hasher);
        key.name.hash(&mut hasher);
        Self(hasher.finish())
    }

    /// Raw digest value.
    #[inline]
    #[must_use]
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ServiceKeyHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_deterministic() {
        let key = ServiceKey::new("production", "echo.svc");
        assert_eq!(key.digest(), key.digest());
    }

    #[test]
    fn digest_separates_fields() {
        // "ab" + "c" must not collide with "a" + "bc".
        let left = ServiceKey::new("ab", "c");
        let right = ServiceKey::new("a", "bc");
        assert_ne!(left.digest(), right.digest());
    }

    #[test]
    fn completeness() {
        assert!(ServiceKey::new("production", "echo.svc").is_complete());
        assert!(!ServiceKey::new("", "echo.svc").is_complete());
        assert!(!ServiceKey::new("production", "").is_complete());
    }
}
