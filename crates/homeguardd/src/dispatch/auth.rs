//! Login and signup handling.

use std::sync::Arc;

use thiserror::Error;

use crate::accounts::{Account, AccountError, UserStore};
use crate::activity::{ActionType, ActivityEntry, ActivitySink};

/// Reasons a signup is refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignupError {
    /// A required field was blank.
    #[error("{field} must not be empty")]
    MissingField {
        /// Name of the blank field.
        field: &'static str,
    },
    /// The store refused the account.
    #[error(transparent)]
    Account(#[from] AccountError),
}

/// New-account details supplied by a client.
#[derive(Debug, Clone, Copy)]
pub struct Signup<'a> {
    /// Display name.
    pub name: &'a str,
    /// Contact address.
    pub email: &'a str,
    /// Requested account name.
    pub username: &'a str,
    /// Clear-text password.
    pub password: &'a str,
}

impl Signup<'_> {
    fn validate(&self) -> Result<(), SignupError> {
        let fields = [
            ("name", self.name),
            ("email", self.email),
            ("username", self.username),
            ("password", self.password),
        ];
        match fields.iter().find(|(_, value)| value.trim().is_empty()) {
            Some((field, _)) => Err(SignupError::MissingField { field: *field }),
            None => Ok(()),
        }
    }
}

/// Authenticates users against a [`UserStore`] and records every attempt.
#[derive(Clone)]
pub struct AuthGateway {
    users: Arc<dyn UserStore>,
    activity: Arc<dyn ActivitySink>,
}

impl std::fmt::Debug for AuthGateway {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.debug_struct("AuthGateway").finish_non_exhaustive()
    }
}

impl AuthGateway {
    /// Builds a gateway over `users`, logging to `activity`.
    pub fn new(users: Arc<dyn UserStore>, activity: Arc<dyn ActivitySink>) -> Self {
        Self { users, activity }
    }

    /// Returns the account when `username` exists and `password` matches.
    pub fn login(&self, username: &str, password: &str) -> Option<Account> {
        let (account, message) = match self.users.find(username) {
            Some(account) if account.password == password => {
                let message = format!("User '{username}' logged in as {}", account.role);
                (Some(account), message)
            }
            Some(_) => (
                None,
                format!("Failed login for user '{username}': wrong password"),
            ),
            None => (
                None,
                format!("Failed login for unknown username '{username}'"),
            ),
        };
        self.activity
            .record(ActivityEntry::new(ActionType::Auth, message).with_user(username));
        account
    }

    /// Registers a guest account.
    ///
    /// # Errors
    ///
    /// Returns [`SignupError::MissingField`] for blank fields and
    /// [`SignupError::Account`] when the username is taken.
    pub fn signup(&self, request: Signup<'_>) -> Result<Account, SignupError> {
        let outcome = request.validate().and_then(|()| {
            let account = Account::guest(
                request.name,
                request.email,
                request.username,
                request.password,
            );
            self.users.insert(account.clone())?;
            Ok(account)
        });
        let message = match &outcome {
            Ok(account) => format!("Guest account '{}' registered", account.username),
            Err(error) => format!("Signup for '{}' rejected: {error}", request.username),
        };
        self.activity.record(
            ActivityEntry::new(ActionType::Auth, message).with_user(request.username),
        );
        outcome
    }
}

#[cfg(test)]
mod tests {
    use rstest::{fixture, rstest};

    use super::*;
    use crate::accounts::AccountStore;
    use crate::activity::ActivityLog;

    struct Harness {
        gateway: AuthGateway,
        log: Arc<ActivityLog>,
    }

    impl Harness {
        fn last_message(&self) -> String {
            self.log
                .records()
                .last()
                .map(|record| record.message.clone())
                .expect("activity recorded")
        }
    }

    #[fixture]
    fn harness() -> Harness {
        let store = Arc::new(AccountStore::new());
        store
            .insert(Account::admin("Admin", "admin@example.com", "admin1", "hash123", true))
            .expect("seed admin");
        let log = Arc::new(ActivityLog::new());
        Harness {
            gateway: AuthGateway::new(store, Arc::clone(&log) as Arc<dyn ActivitySink>),
            log,
        }
    }

    fn signup<'a>(username: &'a str, password: &'a str) -> Signup<'a> {
        Signup {
            name: "Guest",
            email: "guest@example.com",
            username,
            password,
        }
    }

    #[rstest]
    fn login_outcomes_are_logged_distinctly(harness: Harness) {
        assert!(harness.gateway.login("admin1", "hash123").is_some());
        assert_eq!(harness.last_message(), "User 'admin1' logged in as primary admin");

        assert!(harness.gateway.login("admin1", "nope").is_none());
        assert_eq!(
            harness.last_message(),
            "Failed login for user 'admin1': wrong password"
        );

        assert!(harness.gateway.login("ghost", "hash123").is_none());
        assert_eq!(
            harness.last_message(),
            "Failed login for unknown username 'ghost'"
        );
        assert!(
            harness
                .log
                .records()
                .iter()
                .all(|record| record.action_type == "Auth")
        );
    }

    #[rstest]
    fn login_is_case_sensitive(harness: Harness) {
        assert!(harness.gateway.login("ADMIN1", "hash123").is_none());
    }

    #[rstest]
    fn signup_registers_guests(harness: Harness) {
        let account = harness
            .gateway
            .signup(signup("newbie", "pw"))
            .expect("signup");
        assert_eq!(account.role, crate::accounts::Role::Guest);
        assert!(harness.gateway.login("newbie", "pw").is_some());
    }

    #[rstest]
    fn signup_rejects_taken_usernames(harness: Harness) {
        let error = harness
            .gateway
            .signup(signup("admin1", "pw"))
            .expect_err("taken");
        assert_eq!(error.to_string(), "username 'admin1' is already taken");
        assert!(harness.gateway.login("admin1", "hash123").is_some());
    }

    #[rstest]
    #[case(Signup { name: "", email: "e", username: "u", password: "p" }, "name")]
    #[case(Signup { name: "n", email: " ", username: "u", password: "p" }, "email")]
    #[case(Signup { name: "n", email: "e", username: "", password: "p" }, "username")]
    #[case(Signup { name: "n", email: "e", username: "u", password: "" }, "password")]
    fn signup_requires_every_field(
        harness: Harness,
        #[case] request: Signup<'static>,
        #[case] field: &str,
    ) {
        let error = harness.gateway.signup(request).expect_err("blank field");
        assert_eq!(error.to_string(), format!("{field} must not be empty"));
    }
}
