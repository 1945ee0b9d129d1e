//! Panic isolation for user-supplied callables.
//!
//! Excitation, action, dynamics and override callables come from an external
//! expression subsystem and may panic.  One bad expression must not take the
//! whole multi-agent run down, so every invocation goes through [`guarded`],
//! which turns a panic into an `Err` carrying the panic message.

use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};

/// Run `f`, converting a panic into `Err(message)`.
///
/// `AssertUnwindSafe` is sound here: on panic the caller discards every value
/// the closure was computing and keeps the pre-call state (fail-closed).
pub fn guarded<T>(f: impl FnOnce() -> T) -> Result<T, String> {
    catch_unwind(AssertUnwindSafe(f)).map_err(panic_message)
}

/// Best-effort extraction of a human-readable panic payload.
pub fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_owned()
    }
}
