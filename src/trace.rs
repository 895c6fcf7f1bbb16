//! Stage instrumentation for the decode pipeline.
//!
//! Every span and event is emitted under the `yolodecode` target so a single
//! `yolodecode=info` filter selects them. Spans name a stage (`pipeline`,
//! `decode`, `suppress`, `project_masks`); events carry the stage label in a
//! `stage` field next to their counters (`candidates`, `degenerate_boxes`,
//! `kept`, `masks`). Without the `tracing` feature both macros are no-ops.

#[cfg(feature = "tracing")]
macro_rules! trace_span {
    ($stage:literal $(, $($field:tt)*)?) => {
        tracing::info_span!(target: "yolodecode", $stage $(, $($field)*)?)
    };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_span {
    ($stage:literal $(, $($field:tt)*)?) => {
        $crate::trace::NoopSpan
    };
}

#[cfg(feature = "tracing")]
macro_rules! trace_event {
    ($stage:literal, $($key:ident = $value:expr),+ $(,)?) => {
        tracing::info!(target: "yolodecode", stage = $stage, $($key = $value),+)
    };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_event {
    // Counters are still evaluated so call sites stay warning-free.
    ($stage:literal, $($key:ident = $value:expr),+ $(,)?) => {
        let _ = ($($value,)+);
    };
}

pub(crate) use trace_event;
pub(crate) use trace_span;

#[cfg(not(feature = "tracing"))]
pub struct NoopSpan;

#[cfg(not(feature = "tracing"))]
impl NoopSpan {
    #[inline]
    pub fn entered(self) -> Self {
        self
    }
}
