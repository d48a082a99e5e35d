use std::collections::HashMap;

use sea_orm::{DatabaseTransaction, QueryFilter, prelude::*};
use serde::{Deserialize, Serialize};

use crate::{EngineError, ResultEngine, community_members, users};

use super::Engine;

/// Role of an active member inside a community.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberRole {
    Leader,
    CoLeader,
    Elder,
    Member,
}

impl MemberRole {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Leader => "leader",
            Self::CoLeader => "co_leader",
            Self::Elder => "elder",
            Self::Member => "member",
        }
    }

    /// Leaders and co-leaders manage fund settings and see every member's
    /// loans and investments.
    #[must_use]
    pub fn can_manage_fund(self) -> bool {
        matches!(self, Self::Leader | Self::CoLeader)
    }
}

impl TryFrom<&str> for MemberRole {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "leader" => Ok(Self::Leader),
            "co_leader" => Ok(Self::CoLeader),
            "elder" => Ok(Self::Elder),
            "member" => Ok(Self::Member),
            other => Err(EngineError::InvalidId(format!("invalid member role: {other}"))),
        }
    }
}

/// Display name used when the user directory has no entry.
const UNKNOWN_USER: &str = "Unknown";

impl Engine {
    /// Role of `user_id` in the community, `None` unless an active member.
    pub(super) async fn member_role(
        &self,
        db: &DatabaseTransaction,
        community_id: i64,
        user_id: i64,
    ) -> ResultEngine<Option<MemberRole>> {
        let row = community_members::Entity::find()
            .filter(community_members::Column::CommunityId.eq(community_id))
            .filter(community_members::Column::UserId.eq(user_id))
            .filter(community_members::Column::IsActive.eq(true))
            .one(db)
            .await?;
        row.as_ref()
            .map(|m| MemberRole::try_from(m.role.as_str()))
            .transpose()
    }

    pub(super) async fn require_member(
        &self,
        db: &DatabaseTransaction,
        community_id: i64,
        user_id: i64,
    ) -> ResultEngine<MemberRole> {
        self.member_role(db, community_id, user_id)
            .await?
            .ok_or_else(|| {
                EngineError::NotAMember("you are not a member of this community".to_string())
            })
    }

    pub(super) async fn require_fund_manager(
        &self,
        db: &DatabaseTransaction,
        community_id: i64,
        user_id: i64,
    ) -> ResultEngine<MemberRole> {
        let role = self.require_member(db, community_id, user_id).await?;
        if !role.can_manage_fund() {
            return Err(EngineError::NotAuthorized(
                "only leaders and co-leaders can manage funds".to_string(),
            ));
        }
        Ok(role)
    }

    pub(super) async fn display_name(
        &self,
        db: &DatabaseTransaction,
        user_id: i64,
    ) -> ResultEngine<String> {
        Ok(users::Entity::find_by_id(user_id)
            .one(db)
            .await?
            .map_or_else(|| UNKNOWN_USER.to_string(), |u| u.full_name))
    }

    /// Resolves display names for a batch of users; missing users map to
    /// "Unknown".
    pub(super) async fn display_names(
        &self,
        db: &DatabaseTransaction,
        user_ids: impl IntoIterator<Item = i64>,
    ) -> ResultEngine<HashMap<i64, String>> {
        let mut ids: Vec<i64> = user_ids.into_iter().collect();
        ids.sort_unstable();
        ids.dedup();
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let found: HashMap<i64, String> = users::Entity::find()
            .filter(users::Column::Id.is_in(ids.clone()))
            .all(db)
            .await?
            .into_iter()
            .map(|u| (u.id, u.full_name))
            .collect();

        Ok(ids
            .into_iter()
            .map(|id| {
                let name = found
                    .get(&id)
                    .cloned()
                    .unwrap_or_else(|| UNKNOWN_USER.to_string());
                (id, name)
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_leaders_manage_the_fund() {
        assert!(MemberRole::Leader.can_manage_fund());
        assert!(MemberRole::CoLeader.can_manage_fund());
        assert!(!MemberRole::Elder.can_manage_fund());
        assert!(!MemberRole::Member.can_manage_fund());
    }

    #[test]
    fn roles_parse_from_storage() {
        for role in [
            MemberRole::Leader,
            MemberRole::CoLeader,
            MemberRole::Elder,
            MemberRole::Member,
        ] {
            assert_eq!(MemberRole::try_from(role.as_str()).unwrap(), role);
        }
        assert!(MemberRole::try_from("owner").is_err());
    }
}
