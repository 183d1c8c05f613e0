//! Reference-count protocol for handle-typed arguments and returns
//!
//! One table, keyed by position and the auto-handle (`@+`) modifier, that
//! the frame consults when it is built and when the call finishes. Native
//! functions see the same ownership outcome whichever calling convention
//! invoked them.
//!
//! | Position | `@+` | entry            | success exit        | exception exit    |
//! |----------|------|------------------|---------------------|-------------------|
//! | argument | no   | adopt caller ref | release if unclaimed| release if unclaimed |
//! | argument | yes  | add-ref          | release if unclaimed| release if unclaimed |
//! | return   | no   | slot is null     | transfer to caller  | leave untouched   |
//! | return   | yes  | slot is null     | add-ref, transfer   | leave untouched   |

/// Where a handle appears in the signature
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    Argument,
    Return,
}

/// Action taken when the frame is built
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryAction {
    /// The caller's reference moves into the frame unchanged
    Adopt,
    /// The frame takes an extra reference; the caller keeps its own
    AddRef,
    /// The return slot starts as a null handle
    InitNull,
}

/// Action taken once the callee has returned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitAction {
    /// Release the slot's reference unless the callee claimed it
    ReleaseUnclaimed,
    /// Hand the callee's reference to the caller as is
    Transfer,
    /// Add one reference, then hand both to the caller
    AddRefThenTransfer,
    /// Do not read or release the slot
    LeaveUntouched,
}

/// Protocol rule for one (position, modifier) pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefRule {
    pub entry: EntryAction,
    pub on_success: ExitAction,
    pub on_exception: ExitAction,
}

/// Look up the rule for a handle at `position`
pub const fn rule(position: Position, auto_handle: bool) -> RefRule {
    match (position, auto_handle) {
        (Position::Argument, false) => RefRule {
            entry: EntryAction::Adopt,
            on_success: ExitAction::ReleaseUnclaimed,
            on_exception: ExitAction::ReleaseUnclaimed,
        },
        (Position::Argument, true) => RefRule {
            entry: EntryAction::AddRef,
            on_success: ExitAction::ReleaseUnclaimed,
            on_exception: ExitAction::ReleaseUnclaimed,
        },
        (Position::Return, false) => RefRule {
            entry: EntryAction::InitNull,
            on_success: ExitAction::Transfer,
            on_exception: ExitAction::LeaveUntouched,
        },
        (Position::Return, true) => RefRule {
            entry: EntryAction::InitNull,
            on_success: ExitAction::AddRefThenTransfer,
            on_exception: ExitAction::LeaveUntouched,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_argument_rules() {
        let plain = rule(Position::Argument, false);
        assert_eq!(plain.entry, EntryAction::Adopt);
        assert_eq!(plain.on_success, ExitAction::ReleaseUnclaimed);

        let auto = rule(Position::Argument, true);
        assert_eq!(auto.entry, EntryAction::AddRef);
        assert_eq!(auto.on_exception, ExitAction::ReleaseUnclaimed);
    }

    #[test]
    fn test_return_rules() {
        assert_eq!(rule(Position::Return, false).on_success, ExitAction::Transfer);
        assert_eq!(
            rule(Position::Return, true).on_success,
            ExitAction::AddRefThenTransfer
        );
        for auto in [false, true] {
            let r = rule(Position::Return, auto);
            assert_eq!(r.entry, EntryAction::InitNull);
            assert_eq!(r.on_exception, ExitAction::LeaveUntouched);
        }
    }
}
