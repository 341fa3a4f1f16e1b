//! Headline counts shown above the user table.

use crate::models::{UserRecord, UserStatus};
use crate::utils::format_count;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UserSummary {
    pub total: usize,
    pub active: usize,
    pub with_loans: usize,
    pub with_savings: usize,
}

impl UserSummary {
    pub fn from_users(users: &[UserRecord]) -> Self {
        users.iter().fold(Self::default(), |mut acc, u| {
            acc.total += 1;
            if u.status() == UserStatus::Active {
                acc.active += 1;
            }
            if u.has_loan {
                acc.with_loans += 1;
            }
            if u.has_savings {
                acc.with_savings += 1;
            }
            acc
        })
    }

    /// Card label and formatted count, in display order.
    pub fn cards(&self) -> [(&'static str, String); 4] {
        [
            ("USERS", format_count(self.total)),
            ("ACTIVE USERS", format_count(self.active)),
            ("USERS WITH LOANS", format_count(self.with_loans)),
            ("USERS WITH SAVINGS", format_count(self.with_savings)),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(status: &str, has_loan: bool, has_savings: bool) -> UserRecord {
        UserRecord {
            id: status.to_string(),
            status: status.to_string(),
            has_loan,
            has_savings,
            ..Default::default()
        }
    }

    #[test]
    fn test_counts() {
        let users = vec![
            user("Active", true, false),
            user("active", false, true),
            user("Inactive", true, true),
            user("Pending", false, false),
        ];
        let summary = UserSummary::from_users(&users);
        assert_eq!(
            summary,
            UserSummary {
                total: 4,
                active: 2,
                with_loans: 2,
                with_savings: 2,
            }
        );
    }

    #[test]
    fn test_empty_collection() {
        assert_eq!(UserSummary::from_users(&[]), UserSummary::default());
    }

    #[test]
    fn test_cards_use_separators() {
        let summary = UserSummary {
            total: 2453,
            ..Default::default()
        };
        assert_eq!(summary.cards()[0], ("USERS", "2,453".to_string()));
        assert_eq!(summary.cards()[3].1, "0");
    }
}
