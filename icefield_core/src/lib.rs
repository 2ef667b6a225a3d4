//!
//! Icefield core
//!
//! The pieces every Icefield resource shares: the contract exposed to the
//! declarative host runtime, the cancellation context, provider configuration
//! and logging.
#![deny(missing_docs)]

pub use context::{Cancelled, Context};
pub use resource::{AttributeMap, Diagnostic, Diagnostics, Resource, ResourceData};
pub use schema::{plan, Attribute, AttributeKind, Plan};
pub use upgrade::{upgrade_state, StateUpgrader};

pub mod config;
pub mod context;
pub mod logging;
pub mod resource;
pub mod schema;
pub mod upgrade;

#[macro_export]
/// Time the code inside the macro. Write the elapsed time to debug logs.
/// Derived from https://notes.iveselov.info/programming/time_it-a-case-study-in-rust-macros
macro_rules! log_runtime {
    ($context:expr, $($tt:tt)+) => {
        {
            $crate::logging::debug!("{}: starting", $context);
            let timer = std::time::Instant::now();
            let x =
            $(
                $tt
            )+;
            $crate::logging::debug!("{}: {:?}", $context, timer.elapsed());
            x
        }
    }
}
