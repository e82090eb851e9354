//! Best-effort, append-only audit log of served reencryption requests.
//! Schema: `request_id:uuid, bob_vk:hex, hrac:hex, ts:u64` — one line per
//! request. A write failure here must never fail the response.

use parking_lot::Mutex;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use threshold_core::{Hrac, PublicKey};
use uuid::Uuid;

pub struct AuditLog {
    path: PathBuf,
    file: Mutex<Option<File>>,
}

impl AuditLog {
    pub fn open(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new().create(true).append(true).open(&path).ok();
        if file.is_none() {
            tracing::warn!(path = %path.display(), "could not open audit log, entries will be dropped");
        }
        AuditLog { path, file: Mutex::new(file) }
    }

    /// Record one served request. Logs and swallows any I/O error.
    pub fn record(&self, request_id: Uuid, bob_vk: &PublicKey, hrac: &Hrac, ts: u64) {
        let vk_bytes = bincode::serialize(bob_vk).unwrap_or_default();
        let line = format!("{},{},{},{}\n", request_id, hex::encode(vk_bytes), hrac, ts);
        let mut guard = self.file.lock();
        let result = match guard.as_mut() {
            Some(file) => file.write_all(line.as_bytes()),
            None => {
                *guard = OpenOptions::new().create(true).append(true).open(&self.path).ok();
                match guard.as_mut() {
                    Some(file) => file.write_all(line.as_bytes()),
                    None => return,
                }
            }
        };
        if let Err(e) = result {
            tracing::warn!(error = %e, "audit log write failed, dropping entry");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_a_line_per_request() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.log");
        let log = AuditLog::open(&path);
        let vk = umbral_pre::SecretKey::random().public_key();
        log.record(Uuid::new_v4(), &vk, &Hrac([1u8; 32]), 1_700_000_000);
        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.lines().count(), 1);
    }
}
