//! Deal lifecycle maintenance: the batched expiry sweep and the manual
//! extend/reactivate operations.

pub mod sweep;

pub use sweep::{extend_deal, reactivate_deal, run_expiry_sweep};
