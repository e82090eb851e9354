//! Local revocation set: one HRAC per line, read-mostly, guarded by a
//! read-write lock since writes (via `/revoke`) are rare.

use parking_lot::RwLock;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use threshold_core::Hrac;

pub struct RevocationSet {
    path: Option<PathBuf>,
    hracs: RwLock<HashSet<Hrac>>,
}

impl RevocationSet {
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let hracs = fs::read_to_string(&path)
            .ok()
            .map(|contents| contents.lines().filter_map(Hrac::from_hex).collect())
            .unwrap_or_default();
        RevocationSet { path: Some(path), hracs: RwLock::new(hracs) }
    }

    pub fn empty() -> Self {
        RevocationSet { path: None, hracs: RwLock::new(HashSet::new()) }
    }

    pub fn contains(&self, hrac: &Hrac) -> bool {
        self.hracs.read().contains(hrac)
    }

    /// Revoke `hrac`, persisting to disk if this set was loaded from a file.
    pub fn revoke(&self, hrac: Hrac) {
        self.hracs.write().insert(hrac);
        if let Some(path) = &self.path {
            if let Err(e) = fs::write(path, self.render()) {
                tracing::warn!(error = %e, "failed to persist revocation set");
            }
        }
    }

    fn render(&self) -> String {
        self.hracs.read().iter().map(|h| h.to_string()).collect::<Vec<_>>().join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_set_revokes_nothing() {
        let set = RevocationSet::empty();
        assert!(!set.contains(&Hrac([0u8; 32])));
    }

    #[test]
    fn revoke_then_contains() {
        let set = RevocationSet::empty();
        let hrac = Hrac([5u8; 32]);
        set.revoke(hrac);
        assert!(set.contains(&hrac));
    }
}
