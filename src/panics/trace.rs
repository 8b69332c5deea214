//! # Stack-trace capture and condensed rendering.
//!
//! Two concerns live here:
//! - capturing a backtrace **at the failure point** (a process-global panic
//!   hook records it into a thread-local; [`spawn_supervised`](crate::spawn_supervised)
//!   reads it back after `catch_unwind`);
//! - condensing the raw multi-line backtrace text into one aligned line per
//!   frame for diagnostics.
//!
//! ## Raw format
//! `std::backtrace::Backtrace` renders alternating lines:
//! ```text
//!    1: my_app::agent::run_loop
//!              at /home/me/app/src/agent.rs:42:9
//! ```
//! The condensed form keeps a method-like identifier (last two `::` segments)
//! and a file-and-line identifier (last two path components, column stripped):
//! ```text
//!                               agent::run_loop src/agent.rs:42
//! ```
//!
//! ## Rules
//! - Rendering is purely diagnostic and never fails: a frame whose boundary
//!   markers are absent degrades to the `—` placeholder.
//! - The first frame (the capture mechanism itself) is skipped.
//! - Lines that are neither frame nor location lines are ignored.

use std::backtrace::Backtrace;
use std::cell::RefCell;
use std::sync::Once;

/// Placeholder for a frame field whose boundary markers are absent.
const PLACEHOLDER: &str = "—";

thread_local! {
    /// Backtrace recorded by the panic hook, awaiting pickup by the
    /// supervised unit that caught the unwind on this thread.
    static CAPTURED: RefCell<Option<String>> = const { RefCell::new(None) };
}

static HOOK: Once = Once::new();

/// Installs the backtrace-recording panic hook (idempotent).
///
/// The previous hook is chained, so default panic reporting is unaffected.
pub(crate) fn install_capture_hook() {
    HOOK.call_once(|| {
        let prev = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            CAPTURED.with(|slot| {
                *slot.borrow_mut() = Some(Backtrace::force_capture().to_string());
            });
            prev(info);
        }));
    });
}

/// Takes the backtrace recorded by the hook on this thread, if any.
///
/// The hook runs on the panicking thread and `catch_unwind` resumes on the
/// same thread within the same poll, so the thread-local hand-off is sound.
pub(crate) fn take_captured_trace() -> Option<String> {
    CAPTURED.with(|slot| slot.borrow_mut().take())
}

/// Condenses raw backtrace text into one fixed-width line per frame.
///
/// Frame pairs are extracted with string-boundary heuristics; a missing
/// marker degrades the field to `—` rather than erroring. The first frame
/// identifies the capture mechanism itself and is skipped.
///
/// # Example
/// ```
/// let raw = "\
///    0: std::backtrace::Backtrace::force_capture
///    1: my_app::agent::run_loop
///              at /home/me/app/src/agent.rs:42:9";
///
/// let rendered = procvisor::render_stack_trace(raw);
/// assert!(rendered.contains("agent::run_loop"));
/// assert!(rendered.contains("src/agent.rs:42"));
/// assert!(!rendered.contains("force_capture"));
/// ```
pub fn render_stack_trace(raw: &str) -> String {
    let lines: Vec<&str> = raw.lines().collect();
    let mut out = String::new();
    let mut skipped_first = false;

    let mut i = 0;
    while i < lines.len() {
        let Some(symbol) = parse_frame_line(lines[i]) else {
            i += 1;
            continue;
        };
        let location = lines.get(i + 1).copied().and_then(parse_location_line);
        i += if location.is_some() { 2 } else { 1 };

        if !skipped_first {
            skipped_first = true;
            continue;
        }

        let method = method_ident(symbol);
        let file = location
            .map(file_ident)
            .unwrap_or_else(|| PLACEHOLDER.to_string());
        out.push_str(&format!("{method:>45} {file}\n"));
    }
    out
}

/// Parses `"   4: tokio::runtime::task::raw::poll"` into the symbol text.
fn parse_frame_line(line: &str) -> Option<&str> {
    let (num, rest) = line.trim_start().split_once(':')?;
    if num.is_empty() || !num.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let symbol = rest.trim();
    if symbol.is_empty() {
        return None;
    }
    Some(symbol)
}

/// Parses `"             at /path/to/file.rs:42:9"` into the location text.
fn parse_location_line(line: &str) -> Option<&str> {
    let loc = line.trim_start().strip_prefix("at ")?.trim();
    if loc.is_empty() {
        return None;
    }
    Some(loc)
}

/// Keeps the last two `::` segments of a symbol, e.g.
/// `my_app::agent::run_loop` → `agent::run_loop`.
fn method_ident(symbol: &str) -> String {
    match symbol.rmatch_indices("::").nth(1) {
        Some((idx, _)) => symbol[idx + 2..].to_string(),
        None => symbol.to_string(),
    }
}

/// Keeps the last two path components and strips the trailing column, e.g.
/// `/home/me/app/src/agent.rs:42:9` → `src/agent.rs:42`.
fn file_ident(location: &str) -> String {
    let trimmed = strip_column(location);
    if trimmed.is_empty() {
        return PLACEHOLDER.to_string();
    }
    match trimmed.rmatch_indices('/').nth(1) {
        Some((idx, _)) => trimmed[idx + 1..].to_string(),
        None => trimmed.to_string(),
    }
}

/// Strips a `:col` suffix from `path:line:col`, keeping `path:line`.
fn strip_column(location: &str) -> &str {
    let mut colons = location.rmatch_indices(':');
    let last = colons.next();
    let second = colons.next();
    match (last, second) {
        (Some((idx, _)), Some(_)) if location[idx + 1..].bytes().all(|b| b.is_ascii_digit()) => {
            &location[..idx]
        }
        _ => location,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RAW: &str = "\
   0: std::backtrace::Backtrace::force_capture
   1: procvisor::panics::trace::hook
             at ./src/panics/trace.rs:21:13
   2: my_app::agent::run_loop
             at /home/me/app/src/agent.rs:42:9
   3: frame_without_location
   4: tokio::runtime::task::raw::poll
             at /home/me/.cargo/registry/src/tokio-1.0.0/src/runtime/task/raw.rs:77:18";

    #[test]
    fn test_first_frame_is_skipped() {
        let rendered = render_stack_trace(RAW);
        assert!(!rendered.contains("force_capture"));
    }

    #[test]
    fn test_method_and_file_columns() {
        let rendered = render_stack_trace(RAW);
        assert!(rendered.contains("trace::hook"));
        assert!(rendered.contains("panics/trace.rs:21"));
        assert!(rendered.contains("agent::run_loop"));
        assert!(rendered.contains("src/agent.rs:42"));
        assert!(rendered.contains("raw::poll"));
        assert!(rendered.contains("task/raw.rs:77"));
    }

    #[test]
    fn test_missing_location_degrades_to_placeholder() {
        let rendered = render_stack_trace(RAW);
        let line = rendered
            .lines()
            .find(|l| l.contains("frame_without_location"))
            .expect("frame should be rendered");
        assert!(line.ends_with(PLACEHOLDER));
    }

    #[test]
    fn test_one_line_per_frame() {
        // Five frames, first skipped.
        assert_eq!(render_stack_trace(RAW).lines().count(), 4);
    }

    #[test]
    fn test_garbage_input_never_panics() {
        assert_eq!(render_stack_trace(""), "");
        assert_eq!(render_stack_trace("not a backtrace at all"), "");
        assert_eq!(render_stack_trace("at nowhere\n:::\n12"), "");
    }

    #[test]
    fn test_column_stripping_is_conservative() {
        // No second colon: nothing to strip.
        assert_eq!(strip_column("agent.rs:42"), "agent.rs:42");
        // Non-numeric tail: not a column.
        assert_eq!(strip_column("C:/x/y.rs"), "C:/x/y.rs");
        assert_eq!(strip_column("/a/b.rs:42:9"), "/a/b.rs:42");
    }

    #[test]
    fn test_short_symbols_kept_whole() {
        assert_eq!(method_ident("main"), "main");
        assert_eq!(method_ident("a::b"), "a::b");
        assert_eq!(method_ident("x::y::z"), "y::z");
    }
}
