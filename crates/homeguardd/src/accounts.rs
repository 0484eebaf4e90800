//! User accounts and the in-memory account store.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Mutex, PoisonError};

use thiserror::Error;

/// Access level of an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Household administrator. The primary admin owns the installation.
    Admin {
        /// Whether this is the installation owner.
        primary: bool,
    },
    /// Account created through self-service signup.
    Guest,
}

impl fmt::Display for Role {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Admin { primary: true } => formatter.write_str("primary admin"),
            Self::Admin { primary: false } => formatter.write_str("admin"),
            Self::Guest => formatter.write_str("guest"),
        }
    }
}

/// A registered user.
///
/// Passwords are kept as presented by the client and compared verbatim.
#[derive(Clone, PartialEq, Eq)]
pub struct Account {
    /// Display name.
    pub name: String,
    /// Contact address.
    pub email: String,
    /// Unique login name. Matching is case-sensitive.
    pub username: String,
    /// Secret compared on login.
    pub password: String,
    /// Access level.
    pub role: Role,
}

impl Account {
    /// Builds a guest account.
    pub fn guest(name: &str, email: &str, username: &str, password: &str) -> Self {
        Self {
            name: name.to_owned(),
            email: email.to_owned(),
            username: username.to_owned(),
            password: password.to_owned(),
            role: Role::Guest,
        }
    }

    /// Builds an admin account.
    pub fn admin(name: &str, email: &str, username: &str, password: &str, primary: bool) -> Self {
        Self {
            role: Role::Admin { primary },
            ..Self::guest(name, email, username, password)
        }
    }
}

impl fmt::Debug for Account {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Account")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("username", &self.username)
            .field("role", &self.role)
            .finish_non_exhaustive()
    }
}

/// Errors reported by a [`UserStore`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccountError {
    /// Another account already uses the username.
    #[error("username '{username}' is already taken")]
    UsernameTaken {
        /// The contested username.
        username: String,
    },
}

/// Storage for registered accounts.
pub trait UserStore: Send + Sync {
    /// Looks up an account by exact username.
    fn find(&self, username: &str) -> Option<Account>;

    /// Inserts `account` unless its username is already registered.
    ///
    /// The check and the insert happen atomically, so of several concurrent
    /// registrations for one username exactly one succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`AccountError::UsernameTaken`] if the username exists.
    fn insert(&self, account: Account) -> Result<(), AccountError>;
}

/// In-memory [`UserStore`] keyed by username.
#[derive(Debug, Default)]
pub struct AccountStore {
    accounts: Mutex<HashMap<String, Account>>,
}

impl AccountStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registered accounts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Returns `true` when no account is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Account>> {
        self.accounts.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl UserStore for AccountStore {
    fn find(&self, username: &str) -> Option<Account> {
        self.lock().get(username).cloned()
    }

    fn insert(&self, account: Account) -> Result<(), AccountError> {
        let mut accounts = self.lock();
        if accounts.contains_key(&account.username) {
            return Err(AccountError::UsernameTaken {
                username: account.username,
            });
        }
        accounts.insert(account.username.clone(), account);
        Ok(())
    }
}

/// Registers the demo administrator and guest. Returns how many were added.
pub fn seed_demo_accounts(store: &dyn UserStore) -> usize {
    let demo = [
        Account::admin("Admin User", "admin@homeguard.local", "admin1", "hash123", true),
        Account::guest("Guest User", "guest@homeguard.local", "guest1", "hash456"),
    ];
    demo.into_iter()
        .filter(|account| store.insert(account.clone()).is_ok())
        .count()
}
