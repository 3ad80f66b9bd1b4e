use thiserror::Error;

/// Hard failures surfaced to callers.
///
/// Recoverable conditions (degenerate layout metrics, malformed keyboard
/// payloads, unresolvable focus targets) are handled where they occur and never
/// show up here.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum EditError {
    /// A listener tried to mutate state while it was being notified about a
    /// change to that same state.
    #[error("state mutated from inside the `{observer}` notification")]
    Reentrancy { observer: &'static str },
}

pub type EditResult<T> = Result<T, EditError>;
