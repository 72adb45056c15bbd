//! Conceptual session for presentation code. Nothing here is persisted; a
//! screen that needs identity asks the gateway again.

use crate::{AuthOutcome, SignOutOutcome, UserHandle};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Anonymous,
    Authenticated(UserHandle),
}

impl SessionState {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionState::Authenticated(_))
    }

    /// A successful sign-in or sign-up moves to `Authenticated`; anything else
    /// leaves the state as it was.
    pub fn after_sign_in(self, outcome: &AuthOutcome) -> Self {
        match outcome {
            AuthOutcome::Authenticated(user) => SessionState::Authenticated(user.clone()),
            AuthOutcome::PendingConfirmation | AuthOutcome::Failed(_) => self,
        }
    }

    pub fn after_sign_out(self, outcome: &SignOutOutcome) -> Self {
        match outcome {
            SignOutOutcome::SignedOut => SessionState::Anonymous,
            SignOutOutcome::Failed(_) => self,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reader() -> UserHandle {
        UserHandle {
            id: "user-1".to_string(),
            email: Some("reader@email.com".to_string()),
        }
    }

    #[test]
    fn sign_in_then_sign_out() {
        let state = SessionState::default()
            .after_sign_in(&AuthOutcome::Authenticated(reader()));
        assert_eq!(state, SessionState::Authenticated(reader()));

        let state = state.after_sign_out(&SignOutOutcome::SignedOut);
        assert_eq!(state, SessionState::Anonymous);
    }

    #[test]
    fn failures_leave_state_unchanged() {
        let anonymous = SessionState::Anonymous
            .after_sign_in(&AuthOutcome::Failed("Invalid login credentials".into()));
        assert_eq!(anonymous, SessionState::Anonymous);

        let signed_in = SessionState::Authenticated(reader())
            .after_sign_out(&SignOutOutcome::Failed("network error".into()));
        assert!(signed_in.is_authenticated());
    }

    #[test]
    fn pending_confirmation_stays_anonymous() {
        let state = SessionState::Anonymous.after_sign_in(&AuthOutcome::PendingConfirmation);
        assert!(!state.is_authenticated());
    }
}
