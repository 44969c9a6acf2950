/// Runtime knobs for a [`Session`](crate::session::Session).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Report `var` declarations that are never read as static errors.
    pub report_unused: bool,

    /// Deepest allowed nesting of calls before the run aborts with
    /// "Stack overflow.".
    pub max_call_depth: usize,
}

impl Config {
    pub const DEFAULT_MAX_CALL_DEPTH: usize = 255;

    /// Settings for interactive use, where each line is resolved on its own
    /// and a variable is rarely read on the line that declares it.
    pub fn repl() -> Self {
        Self {
            report_unused: false,
            ..Self::default()
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            report_unused: true,
            max_call_depth: Self::DEFAULT_MAX_CALL_DEPTH,
        }
    }
}
