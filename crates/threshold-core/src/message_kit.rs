//! `MessageKit`: capsule + ciphertext, with an optional bolt-on condition
//! tree serialized after a `0xBC` delimiter.

use condition_lingo::LingoElement;
use serde::{Deserialize, Serialize};
use threshold_errors::{NodeError, Result};
use umbral_pre::Capsule;

/// Delimiter separating core bytes from an appended conditions payload.
/// The underlying core serialization is assumed never to emit this byte on
/// its own (see design notes); we only assert it in debug builds.
pub const CONDITIONS_DELIMITER: u8 = 0xBC;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageKit {
    pub capsule: Capsule,
    pub ciphertext: Vec<u8>,
    pub conditions: Option<Vec<LingoElement>>,
}

impl MessageKit {
    /// Serialize core bytes (capsule + ciphertext) and, if present, append
    /// `0xBC || conditions_raw_bytes`.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let core = bincode::serialize(&(&self.capsule, &self.ciphertext))
            .map_err(|_| NodeError::InternalError)?;

        debug_assert!(
            !core.contains(&CONDITIONS_DELIMITER),
            "core bytes must never contain the conditions delimiter"
        );

        match &self.conditions {
            None => Ok(core),
            // Conditions are an untagged, self-describing JSON tree; bincode
            // cannot round-trip untagged enums, so the appended payload is
            // JSON rather than bincode even though the core bytes are not.
            Some(conditions) => {
                let payload =
                    serde_json::to_vec(conditions).map_err(|_| NodeError::InternalError)?;
                let mut out = core;
                out.push(CONDITIONS_DELIMITER);
                out.extend(payload);
                Ok(out)
            }
        }
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let (core, conditions_raw) = match bytes.iter().position(|b| *b == CONDITIONS_DELIMITER) {
            Some(pos) => (&bytes[..pos], Some(&bytes[pos + 1..])),
            None => (bytes, None),
        };
        let (capsule, ciphertext): (Capsule, Vec<u8>) = bincode::deserialize(core)
            .map_err(|_| NodeError::InternalError)?;
        let conditions = conditions_raw
            .map(serde_json::from_slice::<Vec<LingoElement>>)
            .transpose()
            .map_err(|_| NodeError::InternalError)?;
        Ok(MessageKit { capsule, ciphertext, conditions })
    }
}
