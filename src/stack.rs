//! Stack growth for deep recursion.
//!
//! Every Lox call recurses through several evaluator frames.  The call-depth
//! limit is what ends runaway recursion, so the host stack has to be able to
//! reach it on any thread, including small spawned ones.

/// Runs `f`, first moving onto a fresh stack segment if less than the red
/// zone remains.
#[inline]
#[cfg(not(target_arch = "wasm32"))]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    /// Minimum stack space to keep available (128KB red zone).
    const RED_ZONE: usize = 128 * 1024;

    /// Stack space to allocate when growing (2MB).
    const STACK_PER_RECURSION: usize = 2 * 1024 * 1024;

    stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, f)
}

#[inline]
#[cfg(target_arch = "wasm32")]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    f()
}
