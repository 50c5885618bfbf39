//! Bounded gold balance persisted after every mutation.

use crate::store::{ProfileStore, GOLD_KEY};

/// Default upper bound on the balance.
pub const DEFAULT_GOLD_CAP: u32 = 99_999;

/// The player's gold balance.
///
/// Always within `[0, cap]`. Every mutation writes the balance back to the
/// store; write failures are logged and otherwise ignored.
pub struct CurrencyLedger {
    balance: u32,
    cap: u32,
    store: ProfileStore,
}

impl CurrencyLedger {
    /// Load the balance from `store`.
    ///
    /// Only the leading integer of the stored text counts, so `"42abc"` reads
    /// as 42. Missing values and text without leading digits read as 0.
    pub fn load(store: ProfileStore, cap: u32) -> Self {
        let balance = match store.get(GOLD_KEY) {
            Ok(Some(raw)) => leading_integer(&raw).unwrap_or_else(|| {
                tracing::warn!("unparseable gold balance '{raw}', starting from 0");
                0
            }),
            Ok(None) => 0,
            Err(e) => {
                tracing::warn!("failed to read gold balance: {e}");
                0
            }
        };
        Self {
            balance: clamp(balance, cap),
            cap,
            store,
        }
    }

    /// Current balance.
    pub fn get(&self) -> u32 {
        self.balance
    }

    pub fn cap(&self) -> u32 {
        self.cap
    }

    /// Add `amount`, saturating at the cap.
    pub fn add(&mut self, amount: u32) {
        self.balance = self.balance.saturating_add(amount).min(self.cap);
        self.persist();
    }

    /// Remove `amount` if the balance covers it. Returns `false` and leaves
    /// the balance untouched otherwise.
    pub fn deduct(&mut self, amount: u32) -> bool {
        if self.balance < amount {
            return false;
        }
        self.balance -= amount;
        self.persist();
        true
    }

    /// Overwrite the balance, clamped to `[0, cap]`.
    pub fn set(&mut self, amount: i64) {
        self.balance = clamp(amount, self.cap);
        self.persist();
    }

    fn persist(&self) {
        if let Err(e) = self.store.set(GOLD_KEY, &self.balance.to_string()) {
            tracing::warn!(profile = self.store.profile(), "failed to persist gold: {e}");
        }
    }
}

fn clamp(amount: i64, cap: u32) -> u32 {
    amount.clamp(0, i64::from(cap)) as u32
}

/// Optional sign then decimal digits after leading whitespace. Trailing text
/// is ignored and oversized values saturate.
fn leading_integer(raw: &str) -> Option<i64> {
    let s = raw.trim_start();
    let (negative, rest) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let digits = rest.bytes().take_while(u8::is_ascii_digit);
    let mut seen = false;
    let magnitude = digits.fold(0i64, |acc, d| {
        seen = true;
        acc.saturating_mul(10).saturating_add(i64::from(d - b'0'))
    });
    seen.then_some(if negative { -magnitude } else { magnitude })
}
