//! Validation results and their ERC-4337 packing.

/// Largest timestamp representable in the packed 48-bit fields.
pub const MAX_TIMESTAMP: u64 = (1 << 48) - 1;

/// Pass/fail verdict plus an optional validity window.
///
/// `valid_until == 0` means the result never expires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ValidationData {
    pub sig_failed: bool,
    pub valid_after: u64,
    pub valid_until: u64,
}

impl ValidationData {
    pub const SUCCESS: Self = Self {
        sig_failed: false,
        valid_after: 0,
        valid_until: 0,
    };

    pub const FAILED: Self = Self {
        sig_failed: true,
        valid_after: 0,
        valid_until: 0,
    };

    /// A passing result restricted to `[valid_after, valid_until]`.
    pub fn window(valid_after: u64, valid_until: u64) -> Self {
        Self {
            sig_failed: false,
            valid_after: valid_after.min(MAX_TIMESTAMP),
            valid_until: valid_until.min(MAX_TIMESTAMP),
        }
    }

    pub fn is_failure(&self) -> bool {
        self.sig_failed
    }

    /// Combines two results: any failure fails, the tightest window wins.
    pub fn intersect(self, other: Self) -> Self {
        let valid_until = match (self.valid_until, other.valid_until) {
            (0, until) | (until, 0) => until,
            (a, b) => a.min(b),
        };
        Self {
            sig_failed: self.sig_failed || other.sig_failed,
            valid_after: self.valid_after.max(other.valid_after),
            valid_until,
        }
    }

    /// Whether the result admits execution at `timestamp`.
    pub fn is_valid_at(&self, timestamp: u64) -> bool {
        !self.sig_failed
            && timestamp >= self.valid_after
            && (self.valid_until == 0 || timestamp <= self.valid_until)
    }

    /// Packs into the big-endian `uint256` layout
    /// `validAfter (48) ‖ validUntil (48) ‖ authorizer (160)`.
    pub fn pack(&self) -> [u8; 32] {
        let mut word = [0u8; 32];
        word[0..6].copy_from_slice(&self.valid_after.min(MAX_TIMESTAMP).to_be_bytes()[2..]);
        word[6..12].copy_from_slice(&self.valid_until.min(MAX_TIMESTAMP).to_be_bytes()[2..]);
        if self.sig_failed {
            word[31] = 1;
        }
        word
    }

    /// Inverse of [`pack`](Self::pack). Any non-zero authorizer is a failure;
    /// aggregators are not supported.
    pub fn unpack(word: &[u8; 32]) -> Self {
        let mut after = [0u8; 8];
        after[2..].copy_from_slice(&word[0..6]);
        let mut until = [0u8; 8];
        until[2..].copy_from_slice(&word[6..12]);
        Self {
            sig_failed: word[12..].iter().any(|byte| *byte != 0),
            valid_after: u64::from_be_bytes(after),
            valid_until: u64::from_be_bytes(until),
        }
    }
}
