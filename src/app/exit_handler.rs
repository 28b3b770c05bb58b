//! Exit code logic for the transfer process.
//!
//! Single responsibility: map session outcome to the process exit outcome.

use crate::ProcessExit;

/// Determines the process exit outcome from the abandoned count and stop state.
pub(crate) fn determine_exit_outcome(abandoned: usize, stopped_by_user: bool) -> ProcessExit {
    if stopped_by_user {
        ProcessExit::Interrupted
    } else if abandoned == 0 {
        ProcessExit::Success
    } else {
        ProcessExit::Partial
    }
}

#[cfg(test)]
mod tests {
    use super::determine_exit_outcome;
    use crate::ProcessExit;

    #[test]
    fn test_exit_outcome_success_when_nothing_abandoned() {
        assert_eq!(determine_exit_outcome(0, false), ProcessExit::Success);
    }

    #[test]
    fn test_exit_outcome_partial_when_some_abandoned() {
        assert_eq!(determine_exit_outcome(2, false), ProcessExit::Partial);
    }

    #[test]
    fn test_exit_outcome_interrupted_wins() {
        assert_eq!(determine_exit_outcome(0, true), ProcessExit::Interrupted);
        assert_eq!(determine_exit_outcome(3, true), ProcessExit::Interrupted);
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(ProcessExit::Success.code(), 0);
        assert_eq!(ProcessExit::Failure.code(), 1);
        assert_eq!(ProcessExit::Partial.code(), 2);
        assert_eq!(ProcessExit::Interrupted.code(), 130);
    }
}
