//! Live-tunable control parameters.
//!
//! Gains, limits and setpoints are registered here by the controllers that own
//! them and can be overridden at runtime by an external configuration channel
//! (a dashboard, a tuning laptop, a JSON file pushed over the wire). Nothing is
//! persisted; every value lives for the lifetime of the process and falls back
//! to the default its controller registered.
//!
//! # Change Tracking
//!
//! Controllers poll their parameters once per period. Each controller holds a
//! [`ConsumerId`] and asks [`TunableNumber::has_changed`], which reports a new
//! value exactly once per consumer. Two controllers that share a key notice the
//! same edit independently.
//!
//! # Example
//!
//! ```
//! use talos::tunable::{ConsumerId, TunableStore};
//!
//! let store = TunableStore::new();
//! let kp = store.number("Arm/Kp");
//! kp.init_default(4.0);
//!
//! let me = ConsumerId::next();
//! assert!(kp.has_changed(me)); // first look always reports a value
//! assert!(!kp.has_changed(me));
//!
//! store.set("Arm/Kp", 5.5);
//! assert!(kp.has_changed(me));
//! assert_eq!(kp.get(), 5.5);
//! ```

mod number;
mod store;

pub use number::{ConsumerId, TunableNumber, changed_any};
pub use store::TunableStore;
