use std::{
    collections::HashMap,
    fmt,
    sync::{
        Arc, Mutex, PoisonError,
        atomic::{AtomicBool, AtomicU64, Ordering},
    },
};

/// Identifies one reader of tunable parameters.
///
/// Every controller allocates its own id at construction. Ids are never
/// reused within a process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConsumerId(u64);

impl ConsumerId {
    /// Allocates a fresh, process-unique consumer id.
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for ConsumerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "consumer#{}", self.0) }
}

/// Shared storage behind one key of the store.
///
/// Scalars are kept as `f64` bit patterns in atomics so that readers never
/// block on the configuration channel. Writers of `value` hold `writes`, so
/// checking `overridden` and storing a default happen as one step.
#[derive(Debug, Default)]
pub(crate) struct Entry {
    value:       AtomicU64,
    default:     AtomicU64,
    has_default: AtomicBool,
    overridden:  AtomicBool,
    writes:      Mutex<()>,
    last_seen:   Mutex<HashMap<ConsumerId, u64>>,
}

impl Entry {
    pub(crate) fn overridden(value: f64) -> Self {
        let entry = Self::default();
        entry.value.store(value.to_bits(), Ordering::Release);
        entry.overridden.store(true, Ordering::Release);
        entry
    }

    pub(crate) fn set_external(&self, value: f64) {
        let _guard = self.writes.lock().unwrap_or_else(PoisonError::into_inner);
        self.value.store(value.to_bits(), Ordering::Release);
        self.overridden.store(true, Ordering::Release);
    }

    /// Stores `value` unless an external write already landed.
    fn store_default(&self, value: f64) {
        let _guard = self.writes.lock().unwrap_or_else(PoisonError::into_inner);
        if !self.overridden.load(Ordering::Acquire) {
            self.value.store(value.to_bits(), Ordering::Release);
        }
    }

    pub(crate) fn value(&self) -> f64 { f64::from_bits(self.value.load(Ordering::Acquire)) }
}

/// A named scalar that can be edited while the robot runs.
///
/// Cloning a `TunableNumber` yields another handle to the same value.
#[derive(Clone)]
pub struct TunableNumber {
    key:   Arc<str>,
    entry: Arc<Entry>,
}

impl TunableNumber {
    pub(crate) fn new(key: Arc<str>, entry: Arc<Entry>) -> Self { Self { key, entry } }

    /// The key this number is published under.
    pub fn key(&self) -> &str { &self.key }

    /// Registers the default value.
    ///
    /// Only the first call has any effect, and an external override that
    /// already arrived is left in place.
    pub fn init_default(&self, value: f64) {
        if self
            .entry
            .has_default
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return;
        }
        self.entry.default.store(value.to_bits(), Ordering::Release);
        self.entry.store_default(value);
    }

    /// Builder-style [`init_default`](Self::init_default).
    pub fn with_default(self, value: f64) -> Self {
        self.init_default(value);
        self
    }

    /// The current value.
    pub fn get(&self) -> f64 { self.entry.value() }

    /// The registered default, if one was registered.
    pub fn default_value(&self) -> Option<f64> {
        self.entry
            .has_default
            .load(Ordering::Acquire)
            .then(|| f64::from_bits(self.entry.default.load(Ordering::Acquire)))
    }

    /// Returns `true` if the value differs from what `consumer` saw last time.
    ///
    /// The consumer's baseline is moved to the current value, so the same
    /// change is reported once. A consumer that has never looked at this
    /// number sees a change on its first call.
    pub fn has_changed(&self, consumer: ConsumerId) -> bool {
        let current = self.entry.value.load(Ordering::Acquire);
        let mut last_seen = self
            .entry
            .last_seen
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        last_seen.insert(consumer, current) != Some(current)
    }
}

impl fmt::Debug for TunableNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TunableNumber")
            .field("key", &self.key)
            .field("value", &self.get())
            .field("default", &self.default_value())
            .finish()
    }
}

/// Polls every parameter for `consumer` and reports whether any changed.
///
/// All parameters are polled, so every baseline is brought up to date in the
/// same period.
pub fn changed_any(consumer: ConsumerId, params: &[&TunableNumber]) -> bool {
    params
        .iter()
        .fold(false, |changed, param| param.has_changed(consumer) | changed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tunable::TunableStore;

    #[test]
    fn change_is_reported_once_per_consumer() {
        let store = TunableStore::new();
        let kp = store.number("Test/kP").with_default(1.0);
        let id = ConsumerId::next();

        assert!(kp.has_changed(id));
        assert!(!kp.has_changed(id));
        assert!(!kp.has_changed(id));

        store.set("Test/kP", 2.0);
        assert!(kp.has_changed(id));
        assert!(!kp.has_changed(id));
    }

    #[test]
    fn consumers_are_independent() {
        let store = TunableStore::new();
        let kd = store.number("Test/kD").with_default(0.5);
        let (a, b) = (ConsumerId::next(), ConsumerId::next());
        assert!(kd.has_changed(a));
        assert!(kd.has_changed(b));

        store.set("Test/kD", 0.75);
        assert!(kd.has_changed(a));
        assert!(!kd.has_changed(a));
        // b has not looked yet, so the change is still pending for it
        assert!(kd.has_changed(b));
        assert!(!kd.has_changed(b));
    }

    #[test]
    fn setting_same_value_is_not_a_change() {
        let store = TunableStore::new();
        let rpm = store.number("Test/rpm").with_default(1000.0);
        let id = ConsumerId::next();
        assert!(rpm.has_changed(id));
        store.set("Test/rpm", 1000.0);
        assert!(!rpm.has_changed(id));
    }

    #[test]
    fn first_default_wins() {
        let store = TunableStore::new();
        let tol = store.number("Test/tol");
        tol.init_default(2.0);
        tol.init_default(5.0);
        assert_eq!(tol.get(), 2.0);
        assert_eq!(tol.default_value(), Some(2.0));
    }

    #[test]
    fn default_does_not_clobber_override() {
        let store = TunableStore::new();
        store.set("Test/early", 7.0);
        let early = store.number("Test/early");
        early.init_default(3.0);
        assert_eq!(early.get(), 7.0);
        assert_eq!(early.default_value(), Some(3.0));
    }

    #[test]
    fn changed_any_updates_every_baseline() {
        let store = TunableStore::new();
        let a = store.number("Test/a").with_default(1.0);
        let b = store.number("Test/b").with_default(2.0);
        let id = ConsumerId::next();
        assert!(changed_any(id, &[&a, &b]));
        // a short-circuiting check would leave b pending here
        assert!(!b.has_changed(id));
        assert!(!changed_any(id, &[&a, &b]));
    }

    #[test]
    fn racing_default_never_replaces_override() {
        for _ in 0..200 {
            let store = TunableStore::new();
            let writer = {
                let store = store.clone();
                std::thread::spawn(move || store.set("Test/race", 7.0))
            };
            let registrar = {
                let store = store.clone();
                std::thread::spawn(move || store.number("Test/race").init_default(1.0))
            };
            writer.join().unwrap();
            registrar.join().unwrap();
            assert_eq!(store.get("Test/race"), Some(7.0));
        }
    }
}
