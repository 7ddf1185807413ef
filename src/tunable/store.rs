use std::{
    collections::{BTreeMap, HashMap},
    sync::{
        Arc, OnceLock, PoisonError, RwLock,
        atomic::{AtomicBool, Ordering},
    },
};

use log::{info, warn};
use snafu::ResultExt;

use super::number::{Entry, TunableNumber};
use crate::error::{ChannelSnafu, Result};

#[derive(Debug, Default)]
struct Inner {
    entries: RwLock<HashMap<Arc<str>, Arc<Entry>>>,
    locked:  AtomicBool,
}

/// The registry every [`TunableNumber`] lives in.
///
/// `TunableStore` is a cheap handle; clones share the same entries. Tests and
/// simulations build their own store with [`TunableStore::new`], robot code
/// normally uses [`TunableStore::global`].
#[derive(Debug, Clone, Default)]
pub struct TunableStore {
    inner: Arc<Inner>,
}

impl TunableStore {
    /// Creates an empty store that accepts external edits.
    pub fn new() -> Self { Self::default() }

    /// Creates an empty store that ignores the configuration channel.
    ///
    /// Every number then reads its registered default. This is the match
    /// configuration: nobody should be retuning gains mid-match.
    pub fn locked() -> Self {
        let store = Self::new();
        store.inner.locked.store(true, Ordering::Release);
        store
    }

    /// The process-wide store.
    pub fn global() -> &'static TunableStore {
        static GLOBAL: OnceLock<TunableStore> = OnceLock::new();
        GLOBAL.get_or_init(TunableStore::new)
    }

    /// Whether external edits are being dropped.
    pub fn is_locked(&self) -> bool { self.inner.locked.load(Ordering::Acquire) }

    /// Turns tuning mode off (`true`) or back on (`false`).
    pub fn set_locked(&self, locked: bool) {
        self.inner.locked.store(locked, Ordering::Release);
        info!("Tunable channel {}", if locked { "locked" } else { "unlocked" });
    }

    /// Returns the number published under `key`, creating it if needed.
    ///
    /// The returned handle has no default until the owner calls
    /// [`TunableNumber::init_default`]; until then it reads `0.0` or whatever
    /// the channel wrote.
    pub fn number(&self, key: &str) -> TunableNumber {
        if let Some((key, entry)) = self
            .inner
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get_key_value(key)
        {
            return TunableNumber::new(key.clone(), entry.clone());
        }

        let mut entries = self
            .inner
            .entries
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let (key, entry) = match entries.get_key_value(key) {
            Some((key, entry)) => (key.clone(), entry.clone()),
            None => {
                let key: Arc<str> = Arc::from(key);
                let entry = Arc::new(Entry::default());
                entries.insert(key.clone(), entry.clone());
                (key, entry)
            }
        };
        TunableNumber::new(key, entry)
    }

    /// Writes `value` to `key` from the configuration channel.
    ///
    /// Returns `false` without touching anything if the store is locked or the
    /// value is not finite. Keys nobody registered yet are created, and keep
    /// the value once their owner registers a default.
    pub fn set(&self, key: &str, value: f64) -> bool {
        if self.is_locked() {
            warn!("Tunable {} ignored, channel is locked", key);
            return false;
        }
        if !value.is_finite() {
            warn!("Tunable {} rejected non-finite value {}", key, value);
            return false;
        }

        let existing = self
            .inner
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned();
        match existing {
            Some(entry) => entry.set_external(value),
            None => {
                let mut entries = self
                    .inner
                    .entries
                    .write()
                    .unwrap_or_else(PoisonError::into_inner);
                match entries.get(key) {
                    Some(entry) => entry.set_external(value),
                    None => {
                        entries.insert(Arc::from(key), Arc::new(Entry::overridden(value)));
                    }
                }
            }
        }
        true
    }

    /// Current value of `key`, if anything was ever registered or written.
    pub fn get(&self, key: &str) -> Option<f64> {
        self.inner
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .map(|entry| entry.value())
    }

    /// Applies a flat JSON object of `"key": number` pairs.
    ///
    /// A payload that is not such an object is rejected as a whole. Returns
    /// how many values were accepted.
    pub fn apply_json(&self, payload: &str) -> Result<usize> {
        let values: BTreeMap<String, f64> = serde_json::from_str(payload).context(ChannelSnafu)?;
        let applied = values
            .iter()
            .filter(|(key, value)| self.set(key, **value))
            .count();
        info!("Tunable channel applied {}/{} values", applied, values.len());
        Ok(applied)
    }

    /// Every key and its current value, sorted by key.
    pub fn snapshot(&self) -> BTreeMap<String, f64> {
        self.inner
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(key, entry)| (key.to_string(), entry.value()))
            .collect()
    }

    /// [`snapshot`](Self::snapshot) rendered as a JSON object.
    pub fn to_json(&self) -> String {
        // A map of String to f64 always serializes; non-finite values are
        // never stored.
        serde_json::to_string(&self.snapshot()).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{error::Error, tunable::ConsumerId};

    #[test]
    fn handles_share_an_entry() {
        let store = TunableStore::new();
        let a = store.number("Shooter/ShootRPM").with_default(2000.0);
        let b = store.number("Shooter/ShootRPM");
        store.set("Shooter/ShootRPM", 2500.0);
        assert_eq!(a.get(), 2500.0);
        assert_eq!(b.get(), 2500.0);
    }

    #[test]
    fn separate_stores_are_isolated() {
        let one = TunableStore::new();
        let two = TunableStore::new();
        one.number("Arm/Kp").init_default(1.0);
        two.number("Arm/Kp").init_default(9.0);
        assert_eq!(one.get("Arm/Kp"), Some(1.0));
        assert_eq!(two.get("Arm/Kp"), Some(9.0));
    }

    #[test]
    fn locked_store_reads_defaults() {
        let store = TunableStore::locked();
        let kp = store.number("Arm/Kp").with_default(18.0);
        assert!(!store.set("Arm/Kp", 30.0));
        assert_eq!(kp.get(), 18.0);

        store.set_locked(false);
        assert!(store.set("Arm/Kp", 30.0));
        assert_eq!(kp.get(), 30.0);
    }

    #[test]
    fn non_finite_values_are_rejected() {
        let store = TunableStore::new();
        let kp = store.number("Arm/Kp").with_default(1.0);
        assert!(!store.set("Arm/Kp", f64::NAN));
        assert!(!store.set("Arm/Kp", f64::INFINITY));
        assert_eq!(kp.get(), 1.0);
    }

    #[test]
    fn json_payload_updates_values() {
        let store = TunableStore::new();
        let kp = store.number("Arm/Kp").with_default(1.0);
        let ki = store.number("Arm/Ki").with_default(0.0);
        let id = ConsumerId::next();
        kp.has_changed(id);
        ki.has_changed(id);

        let applied = store
            .apply_json(r#"{ "Arm/Kp": 2.5, "Arm/Ki": 0.1, "Arm/New": 3 }"#)
            .unwrap();
        assert_eq!(applied, 3);
        assert!(kp.has_changed(id));
        assert!(ki.has_changed(id));
        assert_eq!(store.get("Arm/New"), Some(3.0));
    }

    #[test]
    fn malformed_json_is_a_channel_error() {
        let store = TunableStore::new();
        let kp = store.number("Arm/Kp").with_default(1.0);
        let err = store.apply_json(r#"{ "Arm/Kp": "fast" }"#).unwrap_err();
        assert!(matches!(err, Error::Channel { .. }));
        assert_eq!(kp.get(), 1.0);
    }

    #[test]
    fn snapshot_is_sorted_json() {
        let store = TunableStore::new();
        store.number("b").init_default(2.0);
        store.number("a").init_default(1.0);
        assert_eq!(store.to_json(), r#"{"a":1.0,"b":2.0}"#);
    }
}
