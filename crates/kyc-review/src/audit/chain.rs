//! Audit chain verification.
//!
//! Verifies the integrity of the full audit log by walking the
//! `previous_hash` links and recomputing every entry hash.

use super::entry::AuditEntry;
use crate::error::{KycError, Result};

/// Verify a complete audit log (ordered from oldest to newest).
///
/// Checks that sequences are contiguous from 1, that each entry's
/// `previous_hash` is the preceding entry's `entry_hash`, and that each
/// `entry_hash` matches the entry's content.
pub fn verify_audit_chain(entries: &[AuditEntry]) -> Result<()> {
    let mut previous: Option<&AuditEntry> = None;

    for entry in entries {
        let expected_sequence = previous.map(|p| p.sequence + 1).unwrap_or(1);
        let expected_link = previous.map(|p| p.entry_hash.as_str());

        if entry.sequence != expected_sequence
            || entry.previous_hash.as_deref() != expected_link
            || entry.recompute_hash() != entry.entry_hash
        {
            return Err(KycError::InvalidAuditChain {
                sequence: entry.sequence,
            });
        }
        previous = Some(entry);
    }

    Ok(())
}
