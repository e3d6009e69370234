//! Production-friendly observability hooks for transport operations and chat sessions.
//!
//! ```rust
//! use pobserve::{MetricsObservabilityHooks, SafeSessionHooks, TracingObservabilityHooks};
//!
//! let _session_hooks = SafeSessionHooks::new(TracingObservabilityHooks);
//! let _metrics = MetricsObservabilityHooks;
//! ```

mod metrics_hooks;
mod safe_hooks;
mod tracing_hooks;

pub use metrics_hooks::MetricsObservabilityHooks;
pub use safe_hooks::{SafeSessionHooks, SafeTransportHooks};
pub use tracing_hooks::TracingObservabilityHooks;

pub mod prelude {
    pub use crate::{
        MetricsObservabilityHooks, SafeSessionHooks, SafeTransportHooks,
        TracingObservabilityHooks,
    };
}

#[cfg(test)]
mod tests;
