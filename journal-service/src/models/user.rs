use crate::authz::{Account, FamilyId, Identity};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Account row. Accounts are provisioned outside this service.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub user_id: i64,
    pub email: String,
    pub provider: String,
    pub nickname: String,
    pub family_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

impl From<User> for Account {
    fn from(user: User) -> Self {
        Account {
            account_id: user.user_id,
            identity: Identity {
                email: user.email,
                provider: user.provider,
            },
            family_id: user.family_id.map(FamilyId),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_without_family_maps_to_account_without_family() {
        let user = User {
            user_id: 4,
            email: "dad@example.com".to_string(),
            provider: "google".to_string(),
            nickname: "dad".to_string(),
            family_id: None,
            created_at: Utc::now(),
        };
        let account = Account::from(user);
        assert_eq!(account.account_id, 4);
        assert_eq!(account.family_id, None);
        assert_eq!(account.identity.provider, "google");
    }
}
