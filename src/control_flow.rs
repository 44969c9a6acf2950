use crate::value::Value;

/// Outcome of executing a statement.
///
/// `Return` is consumed by the nearest function call and `Break` by the
/// nearest loop.  Neither ever reaches the user.
#[derive(Debug, Clone, PartialEq)]
pub enum Flow {
    Normal,
    Return(Value),
    Break,
}
