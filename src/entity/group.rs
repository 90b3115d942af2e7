//! Group entity - access group within a data room
//!
//! Table: vdr_group
//!
//! Capability flags are only meaningful for USER/CUSTOM groups; an
//! ADMINISTRATOR group implicitly grants everything regardless of flags.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Group type
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GroupType {
    /// Full control over the room
    Administrator = 0,
    /// Regular invited users
    User = 1,
    /// Custom role with per-flag capabilities
    Custom = 2,
}

impl From<i32> for GroupType {
    fn from(value: i32) -> Self {
        match value {
            0 => GroupType::Administrator,
            2 => GroupType::Custom,
            _ => GroupType::User,
        }
    }
}

impl From<GroupType> for i32 {
    fn from(group_type: GroupType) -> Self {
        group_type as i32
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "vdr_group")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    /// Owning data room
    pub data_room_id: i64,

    /// Group name
    #[sea_orm(column_type = "String(Some(64))")]
    pub name: String,

    /// Group type: 0=administrator, 1=user, 2=custom
    pub group_type: i32,

    /// May view the due diligence checklist (USER and CUSTOM groups)
    pub can_view_due_diligence_checklist: bool,

    /// May manage document permissions (CUSTOM groups only)
    pub can_manage_document_permissions: bool,

    /// May view users of their own groups (USER groups; CUSTOM always grants)
    pub can_view_group_users: bool,

    /// May manage users within their own groups (CUSTOM groups only)
    pub can_manage_users: bool,

    /// May view activity of their own groups
    pub can_view_group_activity: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

// Membership is resolved through manual queries against vdr_group_member

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Typed view of the raw group_type column
    pub fn group_type(&self) -> GroupType {
        GroupType::from(self.group_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_type_round_trip() {
        assert_eq!(GroupType::from(0), GroupType::Administrator);
        assert_eq!(GroupType::from(1), GroupType::User);
        assert_eq!(GroupType::from(2), GroupType::Custom);
        assert_eq!(i32::from(GroupType::Custom), 2);
    }

    #[test]
    fn test_unknown_group_type_defaults_to_user() {
        assert_eq!(GroupType::from(42), GroupType::User);
    }
}
