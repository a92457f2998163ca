use crate::models::{AppointmentStatus, BookingError};

/// Allowed status transitions for staff updates.
///
/// pending    -> confirmed | cancelled
/// confirmed  -> in_progress | cancelled | no_show
/// in_progress -> completed
/// completed / cancelled / no_show are terminal.
pub fn validate_transition(
    from: AppointmentStatus,
    to: AppointmentStatus,
) -> Result<(), BookingError> {
    use AppointmentStatus::*;

    let allowed = match from {
        Pending => matches!(to, Confirmed | Cancelled),
        Confirmed => matches!(to, InProgress | Cancelled | NoShow),
        InProgress => matches!(to, Completed),
        Completed | Cancelled | NoShow => false,
    };

    if allowed {
        Ok(())
    } else {
        Err(BookingError::InvalidTransition { from, to })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use AppointmentStatus::*;

    #[test]
    fn pending_can_be_confirmed_or_cancelled() {
        assert!(validate_transition(Pending, Confirmed).is_ok());
        assert!(validate_transition(Pending, Cancelled).is_ok());
        assert!(validate_transition(Pending, InProgress).is_err());
        assert!(validate_transition(Pending, Completed).is_err());
    }

    #[test]
    fn confirmed_can_start_cancel_or_no_show() {
        assert!(validate_transition(Confirmed, InProgress).is_ok());
        assert!(validate_transition(Confirmed, Cancelled).is_ok());
        assert!(validate_transition(Confirmed, NoShow).is_ok());
        assert!(validate_transition(Confirmed, Completed).is_err());
        assert!(validate_transition(Confirmed, Pending).is_err());
    }

    #[test]
    fn in_progress_only_completes() {
        assert!(validate_transition(InProgress, Completed).is_ok());
        assert!(validate_transition(InProgress, Cancelled).is_err());
        assert!(validate_transition(InProgress, NoShow).is_err());
    }

    #[test]
    fn terminal_statuses_reject_everything() {
        for from in [Completed, Cancelled, NoShow] {
            for to in [Pending, Confirmed, InProgress, Completed, Cancelled, NoShow] {
                let err = validate_transition(from, to).unwrap_err();
                assert_matches!(err, BookingError::InvalidTransition { .. });
            }
        }
    }
}
