//! Content fingerprint of the persisted blob.

use std::collections::hash_map::DefaultHasher;
use std::fmt::{Display, Formatter};
use std::hash::{Hash, Hasher};

/// Opaque token identifying one persisted blob value.
///
/// Two revisions compare equal iff the raw blob text they were taken from
/// is identical (modulo hash collisions), or both were taken while the
/// key was absent. The token lives only in memory; the blob layout is
/// unchanged by it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Revision(Option<u64>);

impl Revision {
    /// Revision of a key with no stored value.
    pub const ABSENT: Self = Self(None);

    /// Fingerprints a raw stored value.
    pub fn of_blob(raw: Option<&str>) -> Self {
        match raw {
            Some(value) => {
                let mut hasher = DefaultHasher::new();
                value.hash(&mut hasher);
                Self(Some(hasher.finish()))
            }
            None => Self::ABSENT,
        }
    }

    pub fn is_absent(self) -> bool {
        self.0.is_none()
    }
}

impl Display for Revision {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.0 {
            Some(hash) => write!(f, "{hash:016x}"),
            None => f.write_str("absent"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Revision;

    #[test]
    fn identical_blobs_share_a_revision() {
        assert_eq!(Revision::of_blob(Some("[]")), Revision::of_blob(Some("[]")));
        assert_ne!(Revision::of_blob(Some("[]")), Revision::of_blob(Some("[ ]")));
    }

    #[test]
    fn absent_differs_from_empty_blob() {
        assert!(Revision::of_blob(None).is_absent());
        assert_ne!(Revision::ABSENT, Revision::of_blob(Some("")));
        assert_eq!(Revision::ABSENT.to_string(), "absent");
    }
}
