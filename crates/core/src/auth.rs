use serde::{Deserialize, Serialize};

use crate::AccountId;

/// Account returned by the hosted auth provider for a valid session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticatedAccount {
    account_id: AccountId,
    email: Option<String>,
    display_name: Option<String>,
    avatar_url: Option<String>,
}

impl AuthenticatedAccount {
    /// Creates an account from provider data.
    #[must_use]
    pub fn new(
        account_id: AccountId,
        email: Option<String>,
        display_name: Option<String>,
        avatar_url: Option<String>,
    ) -> Self {
        Self {
            account_id,
            email,
            display_name,
            avatar_url,
        }
    }

    /// Returns the stable account id.
    #[must_use]
    pub fn account_id(&self) -> AccountId {
        self.account_id
    }

    /// Returns the email, if the provider returned one.
    #[must_use]
    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    /// Returns the provider-side display name, if any.
    #[must_use]
    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    /// Returns the provider-side avatar URL, if any.
    #[must_use]
    pub fn avatar_url(&self) -> Option<&str> {
        self.avatar_url.as_deref()
    }
}
