//! Room role model
//!
//! Answers room-scoped capability questions from group membership. Every
//! predicate fetches the user's full group set for the room and OR-folds
//! across it: a user may belong to several groups and each membership can
//! contribute a grant independently. An empty membership set reduces to
//! `false` for everything, so missing users degrade safely.

use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use std::sync::Arc;

use crate::entity::group::{self, GroupType};
use crate::entity::group_member;
use crate::error::AppResult;

/// Room permission tags returned by [`RoomRoleModel::get_user_room_permissions`]
pub mod perm {
    pub const MANAGE_PROJECT_SETTINGS: &str = "manage_project_settings";
    pub const ACCESS_RECYCLE_BIN: &str = "access_recycle_bin";
    pub const MANAGE_QA: &str = "manage_qa";
    pub const VIEW_ALL_DOCUMENTS: &str = "view_all_documents";
    pub const USE_AI_SEARCH: &str = "use_ai_search";
    pub const CREATE_GROUPS_INVITE_USERS: &str = "create_groups_invite_users";
    pub const MANAGE_ALL_GROUPS_USERS: &str = "manage_all_groups_users";
    pub const VIEW_DUE_DILIGENCE_CHECKLIST: &str = "view_due_diligence_checklist";
    pub const MANAGE_DOCUMENT_PERMISSIONS: &str = "manage_document_permissions";
    pub const VIEW_GROUP_USERS: &str = "view_group_users";
    pub const MANAGE_ALL_USERS: &str = "manage_all_users";
    pub const MANAGE_GROUP_USERS: &str = "manage_group_users";
    pub const VIEW_ALL_ACTIVITY: &str = "view_all_activity";
    pub const VIEW_GROUP_ACTIVITY: &str = "view_group_activity";
    pub const VIEW_OWN_ACTIVITY: &str = "view_own_activity";
}

/// Scope for user-management checks
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ManageUsersScope {
    /// Every user in the room
    All,
    /// Only users within the caller's own groups
    Group,
}

/// Scope for activity-visibility checks
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ActivityScope {
    /// The caller's own activity
    Own,
    /// Activity of the caller's groups
    Group,
    /// Activity of everyone in the room
    All,
}

/// Room role model service
#[derive(Clone)]
pub struct RoomRoleModel {
    db: Arc<DatabaseConnection>,
}

impl RoomRoleModel {
    pub fn new(db: impl Into<Arc<DatabaseConnection>>) -> Self {
        Self { db: db.into() }
    }

    /// All groups the user belongs to within the room.
    ///
    /// Every predicate starts from this set; a user without any membership
    /// row in the room gets an empty set and every check folds to false.
    pub async fn member_groups(
        &self,
        user_id: i64,
        data_room_id: i64,
    ) -> AppResult<Vec<group::Model>> {
        let memberships = group_member::Entity::find()
            .filter(group_member::Column::UserId.eq(user_id))
            .all(self.db.as_ref())
            .await?;

        if memberships.is_empty() {
            return Ok(Vec::new());
        }

        let group_ids: Vec<i64> = memberships.iter().map(|m| m.group_id).collect();

        let groups = group::Entity::find()
            .filter(group::Column::Id.is_in(group_ids))
            .filter(group::Column::DataRoomId.eq(data_room_id))
            .all(self.db.as_ref())
            .await?;

        Ok(groups)
    }

    /// True iff the user is a member of any ADMINISTRATOR group in the room
    pub async fn is_administrator(&self, user_id: i64, data_room_id: i64) -> AppResult<bool> {
        let groups = self.member_groups(user_id, data_room_id).await?;
        Ok(check::is_administrator(&groups))
    }

    // The next seven predicates are single-role gates: currently pure
    // aliases for administrator membership. The data model has no field
    // for per-room configuration of these yet.

    pub async fn can_manage_project_settings(&self, user_id: i64, data_room_id: i64) -> AppResult<bool> {
        self.is_administrator(user_id, data_room_id).await
    }

    pub async fn can_access_recycle_bin(&self, user_id: i64, data_room_id: i64) -> AppResult<bool> {
        self.is_administrator(user_id, data_room_id).await
    }

    pub async fn can_manage_qa(&self, user_id: i64, data_room_id: i64) -> AppResult<bool> {
        self.is_administrator(user_id, data_room_id).await
    }

    pub async fn can_view_all_documents(&self, user_id: i64, data_room_id: i64) -> AppResult<bool> {
        self.is_administrator(user_id, data_room_id).await
    }

    pub async fn can_use_ai_search(&self, user_id: i64, data_room_id: i64) -> AppResult<bool> {
        self.is_administrator(user_id, data_room_id).await
    }

    pub async fn can_create_groups_invite_users(&self, user_id: i64, data_room_id: i64) -> AppResult<bool> {
        self.is_administrator(user_id, data_room_id).await
    }

    pub async fn can_manage_all_groups_users(&self, user_id: i64, data_room_id: i64) -> AppResult<bool> {
        self.is_administrator(user_id, data_room_id).await
    }

    /// Administrator, or any group with the checklist flag set
    pub async fn can_view_due_diligence_checklist(
        &self,
        user_id: i64,
        data_room_id: i64,
    ) -> AppResult<bool> {
        let groups = self.member_groups(user_id, data_room_id).await?;
        Ok(check::can_view_due_diligence_checklist(&groups))
    }

    /// Administrator, or a CUSTOM group with the flag set. USER groups
    /// never grant this, whatever their flag says.
    pub async fn can_manage_document_permissions(
        &self,
        user_id: i64,
        data_room_id: i64,
    ) -> AppResult<bool> {
        let groups = self.member_groups(user_id, data_room_id).await?;
        Ok(check::can_manage_document_permissions(&groups))
    }

    /// Administrator, or any CUSTOM group (unconditional), or a USER group
    /// with the flag set
    pub async fn can_view_group_users(&self, user_id: i64, data_room_id: i64) -> AppResult<bool> {
        let groups = self.member_groups(user_id, data_room_id).await?;
        Ok(check::can_view_group_users(&groups))
    }

    /// User-management authority for the given scope
    pub async fn can_manage_users(
        &self,
        user_id: i64,
        data_room_id: i64,
        scope: ManageUsersScope,
    ) -> AppResult<bool> {
        let groups = self.member_groups(user_id, data_room_id).await?;
        Ok(check::can_manage_users(&groups, scope))
    }

    /// Activity visibility for the given scope
    pub async fn can_view_activity(
        &self,
        user_id: i64,
        data_room_id: i64,
        scope: ActivityScope,
    ) -> AppResult<bool> {
        let groups = self.member_groups(user_id, data_room_id).await?;
        Ok(check::can_view_activity(&groups, scope))
    }

    /// Evaluate every room-level predicate and return the granted tags.
    /// Own-activity visibility is always included.
    pub async fn get_user_room_permissions(
        &self,
        user_id: i64,
        data_room_id: i64,
    ) -> AppResult<Vec<String>> {
        let groups = self.member_groups(user_id, data_room_id).await?;

        let mut granted = Vec::new();
        let mut grant = |tag: &str, ok: bool| {
            if ok {
                granted.push(tag.to_string());
            }
        };

        let admin = check::is_administrator(&groups);
        grant(perm::MANAGE_PROJECT_SETTINGS, admin);
        grant(perm::ACCESS_RECYCLE_BIN, admin);
        grant(perm::MANAGE_QA, admin);
        grant(perm::VIEW_ALL_DOCUMENTS, admin);
        grant(perm::USE_AI_SEARCH, admin);
        grant(perm::CREATE_GROUPS_INVITE_USERS, admin);
        grant(perm::MANAGE_ALL_GROUPS_USERS, admin);
        grant(
            perm::VIEW_DUE_DILIGENCE_CHECKLIST,
            check::can_view_due_diligence_checklist(&groups),
        );
        grant(
            perm::MANAGE_DOCUMENT_PERMISSIONS,
            check::can_manage_document_permissions(&groups),
        );
        grant(perm::VIEW_GROUP_USERS, check::can_view_group_users(&groups));
        grant(
            perm::MANAGE_ALL_USERS,
            check::can_manage_users(&groups, ManageUsersScope::All),
        );
        grant(
            perm::MANAGE_GROUP_USERS,
            check::can_manage_users(&groups, ManageUsersScope::Group),
        );
        grant(
            perm::VIEW_ALL_ACTIVITY,
            check::can_view_activity(&groups, ActivityScope::All),
        );
        grant(
            perm::VIEW_GROUP_ACTIVITY,
            check::can_view_activity(&groups, ActivityScope::Group),
        );
        grant(perm::VIEW_OWN_ACTIVITY, true);

        Ok(granted)
    }
}

/// Pure fold logic over a fetched membership set.
///
/// Kept free of I/O so the rules can be unit tested against constructed
/// group models.
pub mod check {
    use super::*;

    pub fn is_administrator(groups: &[group::Model]) -> bool {
        groups
            .iter()
            .any(|g| g.group_type() == GroupType::Administrator)
    }

    pub fn can_view_due_diligence_checklist(groups: &[group::Model]) -> bool {
        is_administrator(groups)
            || groups.iter().any(|g| g.can_view_due_diligence_checklist)
    }

    pub fn can_manage_document_permissions(groups: &[group::Model]) -> bool {
        is_administrator(groups)
            || groups.iter().any(|g| {
                g.group_type() == GroupType::Custom && g.can_manage_document_permissions
            })
    }

    pub fn can_view_group_users(groups: &[group::Model]) -> bool {
        is_administrator(groups)
            || groups.iter().any(|g| match g.group_type() {
                GroupType::Custom => true,
                GroupType::User => g.can_view_group_users,
                GroupType::Administrator => true,
            })
    }

    pub fn can_manage_users(groups: &[group::Model], scope: ManageUsersScope) -> bool {
        match scope {
            ManageUsersScope::All => is_administrator(groups),
            ManageUsersScope::Group => {
                is_administrator(groups)
                    || groups
                        .iter()
                        .any(|g| g.group_type() == GroupType::Custom && g.can_manage_users)
            }
        }
    }

    pub fn can_view_activity(groups: &[group::Model], scope: ActivityScope) -> bool {
        match scope {
            ActivityScope::Own => true,
            ActivityScope::All => is_administrator(groups),
            ActivityScope::Group => {
                is_administrator(groups) || groups.iter().any(|g| g.can_view_group_activity)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn make_group(group_type: GroupType) -> group::Model {
        group::Model {
            id: 1,
            data_room_id: 1,
            name: "g".to_string(),
            group_type: group_type.into(),
            can_view_due_diligence_checklist: false,
            can_manage_document_permissions: false,
            can_view_group_users: false,
            can_manage_users: false,
            can_view_group_activity: false,
        }
    }

    #[test]
    fn test_empty_membership_denies_everything() {
        let groups: Vec<group::Model> = Vec::new();
        assert!(!check::is_administrator(&groups));
        assert!(!check::can_view_due_diligence_checklist(&groups));
        assert!(!check::can_manage_document_permissions(&groups));
        assert!(!check::can_view_group_users(&groups));
        assert!(!check::can_manage_users(&groups, ManageUsersScope::Group));
        assert!(!check::can_view_activity(&groups, ActivityScope::All));
        // Own activity is visible even with no memberships
        assert!(check::can_view_activity(&groups, ActivityScope::Own));
    }

    #[test]
    fn test_administrator_grants_everything() {
        let groups = vec![make_group(GroupType::Administrator)];
        assert!(check::is_administrator(&groups));
        assert!(check::can_view_due_diligence_checklist(&groups));
        assert!(check::can_manage_document_permissions(&groups));
        assert!(check::can_view_group_users(&groups));
        assert!(check::can_manage_users(&groups, ManageUsersScope::All));
        assert!(check::can_manage_users(&groups, ManageUsersScope::Group));
        assert!(check::can_view_activity(&groups, ActivityScope::All));
    }

    #[test]
    fn test_checklist_flag_applies_to_user_and_custom_groups() {
        let mut user_group = make_group(GroupType::User);
        assert!(!check::can_view_due_diligence_checklist(&[user_group.clone()]));

        user_group.can_view_due_diligence_checklist = true;
        assert!(check::can_view_due_diligence_checklist(&[user_group]));

        let mut custom_group = make_group(GroupType::Custom);
        custom_group.can_view_due_diligence_checklist = true;
        assert!(check::can_view_due_diligence_checklist(&[custom_group]));
    }

    #[test]
    fn test_user_group_never_grants_document_permission_management() {
        let mut user_group = make_group(GroupType::User);
        user_group.can_manage_document_permissions = true;
        assert!(!check::can_manage_document_permissions(&[user_group]));

        let mut custom_group = make_group(GroupType::Custom);
        custom_group.can_manage_document_permissions = true;
        assert!(check::can_manage_document_permissions(&[custom_group]));
    }

    #[test]
    fn test_custom_group_always_sees_group_users() {
        // CUSTOM grants unconditionally, even with all flags false
        let custom_group = make_group(GroupType::Custom);
        assert!(check::can_view_group_users(&[custom_group]));

        // An otherwise identical USER group with all flags false does not
        let user_group = make_group(GroupType::User);
        assert!(!check::can_view_group_users(&[user_group.clone()]));

        let mut flagged = user_group;
        flagged.can_view_group_users = true;
        assert!(check::can_view_group_users(&[flagged]));
    }

    #[test]
    fn test_manage_users_scopes() {
        let mut custom_group = make_group(GroupType::Custom);
        custom_group.can_manage_users = true;

        // Group scope: flagged CUSTOM group suffices
        assert!(check::can_manage_users(
            &[custom_group.clone()],
            ManageUsersScope::Group
        ));
        // All scope: administrators only
        assert!(!check::can_manage_users(&[custom_group], ManageUsersScope::All));
    }

    #[test]
    fn test_group_activity_flag_on_any_group_type() {
        let mut user_group = make_group(GroupType::User);
        user_group.can_view_group_activity = true;
        assert!(check::can_view_activity(&[user_group], ActivityScope::Group));

        let plain = make_group(GroupType::User);
        assert!(!check::can_view_activity(&[plain], ActivityScope::Group));
    }

    #[test]
    fn test_is_administrator_over_fetched_membership() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![group_member::Model {
                id: 1,
                user_id: 9,
                group_id: 1,
            }]])
            .append_query_results([vec![make_group(GroupType::Administrator)]])
            .into_connection();
        let roles = RoomRoleModel::new(db);

        assert!(tokio_test::block_on(roles.is_administrator(9, 1)).unwrap());
    }

    #[test]
    fn test_no_memberships_skips_group_query() {
        // Only the membership query is mocked; an empty set returns
        // without ever querying groups
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<group_member::Model>::new()])
            .into_connection();
        let roles = RoomRoleModel::new(db);

        assert!(!tokio_test::block_on(roles.is_administrator(9, 1)).unwrap());
    }

    #[test]
    fn test_multiple_memberships_each_contribute() {
        // Neither group alone grants both capabilities; together they do
        let mut checklist_group = make_group(GroupType::User);
        checklist_group.can_view_due_diligence_checklist = true;

        let mut activity_group = make_group(GroupType::User);
        activity_group.id = 2;
        activity_group.can_view_group_activity = true;

        let groups = vec![checklist_group, activity_group];
        assert!(check::can_view_due_diligence_checklist(&groups));
        assert!(check::can_view_activity(&groups, ActivityScope::Group));
    }
}
