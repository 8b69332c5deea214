//! # Failure capsule: what a supervised unit leaves behind when it panics.
//!
//! [`PanicCapsule`] pairs the opaque panic payload with a condensed stack
//! trace rendered at the interception point. A capsule is created exactly
//! once, is immutable, and ownership moves to whoever receives it from the
//! delivery channel.

use std::any::Any;
use std::fmt;

use crate::panics::trace::render_stack_trace;

/// Fallback message when the panic payload is neither `&str` nor `String`.
const OPAQUE_PAYLOAD: &str = "unknown panic payload";

/// Captured panic payload plus a condensed, human-readable stack trace.
///
/// Delivered on the failure channel supplied to
/// [`spawn_supervised`](crate::spawn_supervised); never constructed by callers.
pub struct PanicCapsule {
    payload: Box<dyn Any + Send + 'static>,
    stack_trace: String,
}

impl PanicCapsule {
    /// Builds a capsule from a caught unwind payload and raw backtrace text.
    ///
    /// Falls back to the raw text when condensing yields nothing (symbols
    /// may be absent in stripped builds), so the trace is never empty.
    pub(crate) fn new(payload: Box<dyn Any + Send + 'static>, raw_trace: &str) -> Self {
        let rendered = render_stack_trace(raw_trace);
        let stack_trace = if !rendered.is_empty() {
            rendered
        } else if !raw_trace.is_empty() {
            raw_trace.to_string()
        } else {
            "<no stack trace captured>".to_string()
        };
        Self {
            payload,
            stack_trace,
        }
    }

    /// Returns the opaque value the unit panicked with.
    pub fn payload(&self) -> &(dyn Any + Send) {
        &*self.payload
    }

    /// Consumes the capsule, returning the panic payload.
    pub fn into_payload(self) -> Box<dyn Any + Send + 'static> {
        self.payload
    }

    /// Returns the condensed stack trace rendered at the failure point.
    pub fn stack_trace(&self) -> &str {
        &self.stack_trace
    }

    /// Best-effort extraction of the panic message.
    ///
    /// `panic!("...")` produces `&'static str`, `panic!("{x}")` produces
    /// `String`; anything else reports a fixed placeholder.
    pub fn payload_message(&self) -> String {
        let any = &*self.payload;
        if let Some(msg) = any.downcast_ref::<&'static str>() {
            (*msg).to_string()
        } else if let Some(msg) = any.downcast_ref::<String>() {
            msg.clone()
        } else {
            OPAQUE_PAYLOAD.to_string()
        }
    }
}

impl fmt::Debug for PanicCapsule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PanicCapsule")
            .field("payload", &self.payload_message())
            .field("frames", &self.stack_trace.lines().count())
            .finish()
    }
}

impl fmt::Display for PanicCapsule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "panic: {}", self.payload_message())?;
        f.write_str(&self.stack_trace)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_str_payload() {
        let capsule = PanicCapsule::new(Box::new("boom"), "");
        assert_eq!(capsule.payload_message(), "boom");
    }

    #[test]
    fn test_string_payload() {
        let capsule = PanicCapsule::new(Box::new(String::from("kaboom")), "");
        assert_eq!(capsule.payload_message(), "kaboom");
    }

    #[test]
    fn test_opaque_payload() {
        let capsule = PanicCapsule::new(Box::new(42_u32), "");
        assert_eq!(capsule.payload_message(), OPAQUE_PAYLOAD);
        assert_eq!(
            *capsule.into_payload().downcast::<u32>().expect("u32"),
            42_u32
        );
    }

    #[test]
    fn test_trace_is_never_empty() {
        let capsule = PanicCapsule::new(Box::new("x"), "");
        assert!(!capsule.stack_trace().is_empty());

        // Raw text that condenses to nothing falls back to the raw text.
        let capsule = PanicCapsule::new(Box::new("x"), "opaque raw trace");
        assert_eq!(capsule.stack_trace(), "opaque raw trace");
    }

    #[test]
    fn test_display_leads_with_message() {
        let capsule = PanicCapsule::new(Box::new("boom"), "raw");
        let text = capsule.to_string();
        assert!(text.starts_with("panic: boom"));
        assert!(text.contains("raw"));
    }
}
