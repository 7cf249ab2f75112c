//! Ledger of recently accepted content fingerprints.
//! Suppresses re-emitted ASR fragments: identical content seen again within
//! the dedup window is a duplicate. The ledger lives independently of the
//! displayed items, so clearing or evicting items does not forget content.

use log::debug;
use sha2::{Digest, Sha256};
use std::collections::HashMap;

/// SHA-256 of the exact content bytes
pub type Fingerprint = [u8; 32];

pub fn fingerprint(content: &str) -> Fingerprint {
    Sha256::digest(content.as_bytes()).into()
}

pub struct DedupLedger {
    /// Fingerprint -> time of last acceptance (epoch ms)
    seen: HashMap<Fingerprint, u64>,
    window_ms: u64,
    /// When stale entries were last swept
    last_sweep_ms: u64,
}

impl DedupLedger {
    pub fn new(window_ms: u64) -> Self {
        Self {
            seen: HashMap::new(),
            window_ms,
            last_sweep_ms: 0,
        }
    }

    /// Returns true if `fp` was accepted less than one window before `now_ms`.
    /// A clock that went backwards counts as zero elapsed time.
    pub fn is_duplicate(&self, fp: &Fingerprint, now_ms: u64) -> bool {
        match self.seen.get(fp) {
            Some(&last) => now_ms.saturating_sub(last) < self.window_ms,
            None => false,
        }
    }

    /// Record an acceptance and opportunistically drop expired entries.
    pub fn record(&mut self, fp: Fingerprint, now_ms: u64) {
        self.seen.insert(fp, now_ms);

        // Sweep at most once per window
        if now_ms.saturating_sub(self.last_sweep_ms) >= self.window_ms {
            self.cleanup_expired_entries(now_ms);
            self.last_sweep_ms = now_ms;
        }
    }

    fn cleanup_expired_entries(&mut self, now_ms: u64) {
        let window_ms = self.window_ms;
        let before = self.seen.len();
        self.seen.retain(|_, last| now_ms.saturating_sub(*last) < window_ms);
        let removed = before - self.seen.len();
        if removed > 0 {
            debug!("Dedup ledger swept {} expired fingerprints", removed);
        }
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }
}
