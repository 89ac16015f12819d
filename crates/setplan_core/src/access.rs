//! Caller scope checks.
//!
//! Authentication happens outside the core. By the time a request reaches
//! the store, the caller is a user ID plus the set of clubs it belongs to.

use crate::change_feed::Audience;
use crate::error::{CoreError, CoreResult};
use crate::model::Practice;
use crate::types::{ClubId, UserId};
use std::collections::BTreeSet;

/// An authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    /// The user.
    pub user_id: UserId,
    /// Clubs the user is a member of.
    pub clubs: BTreeSet<ClubId>,
}

impl Caller {
    /// Creates a caller.
    pub fn new(user_id: UserId, clubs: impl IntoIterator<Item = ClubId>) -> Self {
        Self {
            user_id,
            clubs: clubs.into_iter().collect(),
        }
    }

    /// Returns true if the caller belongs to the club.
    pub fn is_member(&self, club_id: ClubId) -> bool {
        self.clubs.contains(&club_id)
    }

    /// Returns true if the caller may see changes addressed to `audience`.
    ///
    /// The caller must be a club member, and private practices are only
    /// visible to their planner.
    pub fn can_view(&self, audience: &Audience) -> bool {
        if !self.is_member(audience.club_id) {
            return false;
        }
        match audience.private_to {
            Some(planner) => planner == self.user_id,
            None => true,
        }
    }

    /// Checks that the caller may modify the practice.
    pub fn authorize(&self, practice: &Practice) -> CoreResult<()> {
        if !self.is_member(practice.club_id) {
            return Err(CoreError::not_authorized(format!(
                "practice {} belongs to a club the caller is not a member of",
                practice.id
            )));
        }
        if practice.is_private && practice.planner_id != self.user_id {
            return Err(CoreError::not_authorized(format!(
                "practice {} is private to its planner",
                practice.id
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn members_can_edit_public_practices() {
        let club = ClubId::new();
        let practice = Practice::new(club, UserId::new(), Utc::now());
        let member = Caller::new(UserId::new(), [club]);
        let outsider = Caller::new(UserId::new(), [ClubId::new()]);

        assert!(member.authorize(&practice).is_ok());
        assert!(outsider.authorize(&practice).is_err());
    }

    #[test]
    fn private_practices_belong_to_the_planner() {
        let club = ClubId::new();
        let planner = UserId::new();
        let practice = Practice::new(club, planner, Utc::now()).private();

        assert!(Caller::new(planner, [club]).authorize(&practice).is_ok());
        assert!(Caller::new(UserId::new(), [club])
            .authorize(&practice)
            .is_err());

        let audience = Audience::for_practice(&practice);
        assert!(Caller::new(planner, [club]).can_view(&audience));
        assert!(!Caller::new(UserId::new(), [club]).can_view(&audience));
        assert!(!Caller::new(planner, []).can_view(&audience));
    }
}
