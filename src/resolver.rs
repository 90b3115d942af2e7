//! Resource permission resolver
//!
//! Computes the effective capability set for one user on one document or
//! folder, and provides the upsert/remove mutators used by the
//! permissions-management UI.
//!
//! Resolution is two explicit passes: OR-fold the group rows into an
//! accumulator, then overwrite the whole set if a per-user override row
//! exists. The override replaces the aggregate outright, so it can revoke
//! as well as grant. A final gate forces `can_manage` off unless the user
//! holds room-level document-permission authority.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, QueryFilter,
    Set,
};
use std::sync::Arc;

use crate::entity::{
    document, document_group_permission, document_user_permission, folder,
    folder_group_permission, folder_user_permission,
};
use crate::error::AppResult;
use crate::roles::{check, RoomRoleModel};

/// Effective capability set for one user on one resource.
///
/// A fixed-field struct rather than a map, so every code path that touches
/// a capability is checked exhaustively by the compiler.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PermissionSet {
    pub can_fence: bool,
    pub can_view: bool,
    pub can_download_encrypted: bool,
    pub can_download_pdf: bool,
    pub can_download_original: bool,
    pub can_upload: bool,
    pub can_manage: bool,
}

impl PermissionSet {
    /// Everything denied
    pub fn none() -> Self {
        Self::default()
    }

    /// Everything granted (administrators)
    pub fn all() -> Self {
        Self {
            can_fence: true,
            can_view: true,
            can_download_encrypted: true,
            can_download_pdf: true,
            can_download_original: true,
            can_upload: true,
            can_manage: true,
        }
    }

    /// OR every field of `other` into this set
    pub fn union_with(&mut self, other: &PermissionSet) {
        self.can_fence |= other.can_fence;
        self.can_view |= other.can_view;
        self.can_download_encrypted |= other.can_download_encrypted;
        self.can_download_pdf |= other.can_download_pdf;
        self.can_download_original |= other.can_download_original;
        self.can_upload |= other.can_upload;
        self.can_manage |= other.can_manage;
    }
}

impl From<&document_group_permission::Model> for PermissionSet {
    fn from(row: &document_group_permission::Model) -> Self {
        Self {
            can_fence: row.can_fence,
            can_view: row.can_view,
            can_download_encrypted: row.can_download_encrypted,
            can_download_pdf: row.can_download_pdf,
            can_download_original: row.can_download_original,
            can_upload: row.can_upload,
            can_manage: row.can_manage,
        }
    }
}

impl From<&document_user_permission::Model> for PermissionSet {
    fn from(row: &document_user_permission::Model) -> Self {
        Self {
            can_fence: row.can_fence,
            can_view: row.can_view,
            can_download_encrypted: row.can_download_encrypted,
            can_download_pdf: row.can_download_pdf,
            can_download_original: row.can_download_original,
            can_upload: row.can_upload,
            can_manage: row.can_manage,
        }
    }
}

impl From<&folder_group_permission::Model> for PermissionSet {
    fn from(row: &folder_group_permission::Model) -> Self {
        Self {
            can_fence: row.can_fence,
            can_view: row.can_view,
            can_download_encrypted: row.can_download_encrypted,
            can_download_pdf: row.can_download_pdf,
            can_download_original: row.can_download_original,
            can_upload: row.can_upload,
            can_manage: row.can_manage,
        }
    }
}

impl From<&folder_user_permission::Model> for PermissionSet {
    fn from(row: &folder_user_permission::Model) -> Self {
        Self {
            can_fence: row.can_fence,
            can_view: row.can_view,
            can_download_encrypted: row.can_download_encrypted,
            can_download_pdf: row.can_download_pdf,
            can_download_original: row.can_download_original,
            can_upload: row.can_upload,
            can_manage: row.can_manage,
        }
    }
}

/// Partial update applied by the permission mutators; `None` leaves a
/// field untouched
#[derive(Clone, Copy, Debug, Default)]
pub struct PermissionUpdate {
    pub can_fence: Option<bool>,
    pub can_view: Option<bool>,
    pub can_download_encrypted: Option<bool>,
    pub can_download_pdf: Option<bool>,
    pub can_download_original: Option<bool>,
    pub can_upload: Option<bool>,
    pub can_manage: Option<bool>,
}

/// Download rendition requested by a caller
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DownloadFormat {
    Encrypted,
    Pdf,
    Original,
}

impl DownloadFormat {
    /// Parse a caller-supplied format string; unknown formats resolve to
    /// `None` (and therefore to a denial), never to an error
    pub fn parse(format: &str) -> Option<Self> {
        match format {
            "encrypted" => Some(DownloadFormat::Encrypted),
            "pdf" => Some(DownloadFormat::Pdf),
            "original" => Some(DownloadFormat::Original),
            _ => None,
        }
    }
}

/// Aggregate group rows, apply the user override, then gate `can_manage`
/// on room-level authority.
///
/// Pure so the precedence rules are unit-testable without a database.
pub fn aggregate(
    group_sets: &[PermissionSet],
    user_override: Option<PermissionSet>,
    has_manage_authority: bool,
) -> PermissionSet {
    let mut result = PermissionSet::none();
    for set in group_sets {
        result.union_with(set);
    }

    // Override replaces the aggregate, field by field, grants and
    // revocations alike
    if let Some(override_set) = user_override {
        result = override_set;
    }

    // A row may claim can_manage, but only room-level authority makes it
    // effective
    if result.can_manage && !has_manage_authority {
        result.can_manage = false;
    }

    result
}

/// Resource permission resolver service
#[derive(Clone)]
pub struct PermissionResolver {
    db: Arc<DatabaseConnection>,
    roles: RoomRoleModel,
}

impl PermissionResolver {
    pub fn new(db: impl Into<Arc<DatabaseConnection>>) -> Self {
        let db = db.into();
        let roles = RoomRoleModel::new(db.clone());
        Self { db, roles }
    }

    pub fn roles(&self) -> &RoomRoleModel {
        &self.roles
    }

    /// Effective capability set for a user on a document.
    ///
    /// A missing document or a document without a room resolves to the
    /// all-false set; administrators of the owning room short-circuit to
    /// the all-true set without reading any permission rows.
    pub async fn get_document_permissions(
        &self,
        user_id: i64,
        document_id: i64,
    ) -> AppResult<PermissionSet> {
        let Some(doc) = document::Entity::find_by_id(document_id).one(self.db.as_ref()).await? else {
            tracing::debug!(document_id, "document not found, resolving to no permissions");
            return Ok(PermissionSet::none());
        };
        let Some(data_room_id) = doc.data_room_id else {
            tracing::debug!(document_id, "document has no data room, resolving to no permissions");
            return Ok(PermissionSet::none());
        };

        let groups = self.roles.member_groups(user_id, data_room_id).await?;
        if check::is_administrator(&groups) {
            return Ok(PermissionSet::all());
        }

        let group_ids: Vec<i64> = groups.iter().map(|g| g.id).collect();
        let group_rows = if group_ids.is_empty() {
            Vec::new()
        } else {
            document_group_permission::Entity::find()
                .filter(document_group_permission::Column::DocumentId.eq(document_id))
                .filter(document_group_permission::Column::GroupId.is_in(group_ids))
                .all(self.db.as_ref())
                .await?
        };
        let group_sets: Vec<PermissionSet> = group_rows.iter().map(PermissionSet::from).collect();

        let user_override = document_user_permission::Entity::find()
            .filter(document_user_permission::Column::DocumentId.eq(document_id))
            .filter(document_user_permission::Column::UserId.eq(user_id))
            .one(self.db.as_ref())
            .await?
            .map(|row| PermissionSet::from(&row));

        // Non-administrators need room-level authority for can_manage to
        // stick; the groups are already in hand, so fold locally
        let has_manage_authority = check::can_manage_document_permissions(&groups);

        Ok(aggregate(&group_sets, user_override, has_manage_authority))
    }

    /// Effective capability set for a user on a folder. Identical
    /// algorithm, folder-scoped tables.
    pub async fn get_folder_permissions(
        &self,
        user_id: i64,
        folder_id: i64,
    ) -> AppResult<PermissionSet> {
        let Some(fld) = folder::Entity::find_by_id(folder_id).one(self.db.as_ref()).await? else {
            tracing::debug!(folder_id, "folder not found, resolving to no permissions");
            return Ok(PermissionSet::none());
        };
        let Some(data_room_id) = fld.data_room_id else {
            tracing::debug!(folder_id, "folder has no data room, resolving to no permissions");
            return Ok(PermissionSet::none());
        };

        let groups = self.roles.member_groups(user_id, data_room_id).await?;
        if check::is_administrator(&groups) {
            return Ok(PermissionSet::all());
        }

        let group_ids: Vec<i64> = groups.iter().map(|g| g.id).collect();
        let group_rows = if group_ids.is_empty() {
            Vec::new()
        } else {
            folder_group_permission::Entity::find()
                .filter(folder_group_permission::Column::FolderId.eq(folder_id))
                .filter(folder_group_permission::Column::GroupId.is_in(group_ids))
                .all(self.db.as_ref())
                .await?
        };
        let group_sets: Vec<PermissionSet> = group_rows.iter().map(PermissionSet::from).collect();

        let user_override = folder_user_permission::Entity::find()
            .filter(folder_user_permission::Column::FolderId.eq(folder_id))
            .filter(folder_user_permission::Column::UserId.eq(user_id))
            .one(self.db.as_ref())
            .await?
            .map(|row| PermissionSet::from(&row));

        let has_manage_authority = check::can_manage_document_permissions(&groups);

        Ok(aggregate(&group_sets, user_override, has_manage_authority))
    }

    /// Fencing implies at least constrained visibility
    pub async fn can_view_document(&self, user_id: i64, document_id: i64) -> AppResult<bool> {
        let perms = self.get_document_permissions(user_id, document_id).await?;
        Ok(perms.can_view || perms.can_fence)
    }

    /// Download check for a caller-supplied format string; unknown formats
    /// are simply not allowed
    pub async fn can_download_document(
        &self,
        user_id: i64,
        document_id: i64,
        format: &str,
    ) -> AppResult<bool> {
        let Some(format) = DownloadFormat::parse(format) else {
            return Ok(false);
        };
        let perms = self.get_document_permissions(user_id, document_id).await?;
        Ok(match format {
            DownloadFormat::Encrypted => perms.can_download_encrypted,
            DownloadFormat::Pdf => perms.can_download_pdf,
            DownloadFormat::Original => perms.can_download_original,
        })
    }

    /// Post-gate management capability
    pub async fn can_manage_document(&self, user_id: i64, document_id: i64) -> AppResult<bool> {
        let perms = self.get_document_permissions(user_id, document_id).await?;
        Ok(perms.can_manage)
    }

    /// Fencing implies at least constrained visibility, folders included
    pub async fn can_view_folder(&self, user_id: i64, folder_id: i64) -> AppResult<bool> {
        let perms = self.get_folder_permissions(user_id, folder_id).await?;
        Ok(perms.can_view || perms.can_fence)
    }

    // ==================== Mutators ====================
    //
    // Upserts keyed by the composite unique key: create an all-false row
    // and apply the partial update, or merge the update into the existing
    // row and refresh updated_at.

    pub async fn set_document_group_permissions(
        &self,
        document_id: i64,
        group_id: i64,
        update: PermissionUpdate,
    ) -> AppResult<()> {
        let existing = document_group_permission::Entity::find()
            .filter(document_group_permission::Column::DocumentId.eq(document_id))
            .filter(document_group_permission::Column::GroupId.eq(group_id))
            .one(self.db.as_ref())
            .await?;

        let now = Utc::now();
        match existing {
            Some(row) => {
                let mut active = row.into_active_model();
                if let Some(v) = update.can_fence {
                    active.can_fence = Set(v);
                }
                if let Some(v) = update.can_view {
                    active.can_view = Set(v);
                }
                if let Some(v) = update.can_download_encrypted {
                    active.can_download_encrypted = Set(v);
                }
                if let Some(v) = update.can_download_pdf {
                    active.can_download_pdf = Set(v);
                }
                if let Some(v) = update.can_download_original {
                    active.can_download_original = Set(v);
                }
                if let Some(v) = update.can_upload {
                    active.can_upload = Set(v);
                }
                if let Some(v) = update.can_manage {
                    active.can_manage = Set(v);
                }
                active.updated_at = Set(now);
                active.update(self.db.as_ref()).await?;
            }
            None => {
                let row = document_group_permission::ActiveModel {
                    document_id: Set(document_id),
                    group_id: Set(group_id),
                    can_fence: Set(update.can_fence.unwrap_or(false)),
                    can_view: Set(update.can_view.unwrap_or(false)),
                    can_download_encrypted: Set(update.can_download_encrypted.unwrap_or(false)),
                    can_download_pdf: Set(update.can_download_pdf.unwrap_or(false)),
                    can_download_original: Set(update.can_download_original.unwrap_or(false)),
                    can_upload: Set(update.can_upload.unwrap_or(false)),
                    can_manage: Set(update.can_manage.unwrap_or(false)),
                    created_at: Set(now),
                    updated_at: Set(now),
                    ..Default::default()
                };
                row.insert(self.db.as_ref()).await?;
            }
        }

        Ok(())
    }

    pub async fn set_document_user_permissions(
        &self,
        document_id: i64,
        user_id: i64,
        update: PermissionUpdate,
    ) -> AppResult<()> {
        let existing = document_user_permission::Entity::find()
            .filter(document_user_permission::Column::DocumentId.eq(document_id))
            .filter(document_user_permission::Column::UserId.eq(user_id))
            .one(self.db.as_ref())
            .await?;

        let now = Utc::now();
        match existing {
            Some(row) => {
                let mut active = row.into_active_model();
                if let Some(v) = update.can_fence {
                    active.can_fence = Set(v);
                }
                if let Some(v) = update.can_view {
                    active.can_view = Set(v);
                }
                if let Some(v) = update.can_download_encrypted {
                    active.can_download_encrypted = Set(v);
                }
                if let Some(v) = update.can_download_pdf {
                    active.can_download_pdf = Set(v);
                }
                if let Some(v) = update.can_download_original {
                    active.can_download_original = Set(v);
                }
                if let Some(v) = update.can_upload {
                    active.can_upload = Set(v);
                }
                if let Some(v) = update.can_manage {
                    active.can_manage = Set(v);
                }
                active.updated_at = Set(now);
                active.update(self.db.as_ref()).await?;
            }
            None => {
                let row = document_user_permission::ActiveModel {
                    document_id: Set(document_id),
                    user_id: Set(user_id),
                    can_fence: Set(update.can_fence.unwrap_or(false)),
                    can_view: Set(update.can_view.unwrap_or(false)),
                    can_download_encrypted: Set(update.can_download_encrypted.unwrap_or(false)),
                    can_download_pdf: Set(update.can_download_pdf.unwrap_or(false)),
                    can_download_original: Set(update.can_download_original.unwrap_or(false)),
                    can_upload: Set(update.can_upload.unwrap_or(false)),
                    can_manage: Set(update.can_manage.unwrap_or(false)),
                    created_at: Set(now),
                    updated_at: Set(now),
                    ..Default::default()
                };
                row.insert(self.db.as_ref()).await?;
            }
        }

        Ok(())
    }

    pub async fn set_folder_group_permissions(
        &self,
        folder_id: i64,
        group_id: i64,
        update: PermissionUpdate,
    ) -> AppResult<()> {
        let existing = folder_group_permission::Entity::find()
            .filter(folder_group_permission::Column::FolderId.eq(folder_id))
            .filter(folder_group_permission::Column::GroupId.eq(group_id))
            .one(self.db.as_ref())
            .await?;

        let now = Utc::now();
        match existing {
            Some(row) => {
                let mut active = row.into_active_model();
                if let Some(v) = update.can_fence {
                    active.can_fence = Set(v);
                }
                if let Some(v) = update.can_view {
                    active.can_view = Set(v);
                }
                if let Some(v) = update.can_download_encrypted {
                    active.can_download_encrypted = Set(v);
                }
                if let Some(v) = update.can_download_pdf {
                    active.can_download_pdf = Set(v);
                }
                if let Some(v) = update.can_download_original {
                    active.can_download_original = Set(v);
                }
                if let Some(v) = update.can_upload {
                    active.can_upload = Set(v);
                }
                if let Some(v) = update.can_manage {
                    active.can_manage = Set(v);
                }
                active.updated_at = Set(now);
                active.update(self.db.as_ref()).await?;
            }
            None => {
                let row = folder_group_permission::ActiveModel {
                    folder_id: Set(folder_id),
                    group_id: Set(group_id),
                    can_fence: Set(update.can_fence.unwrap_or(false)),
                    can_view: Set(update.can_view.unwrap_or(false)),
                    can_download_encrypted: Set(update.can_download_encrypted.unwrap_or(false)),
                    can_download_pdf: Set(update.can_download_pdf.unwrap_or(false)),
                    can_download_original: Set(update.can_download_original.unwrap_or(false)),
                    can_upload: Set(update.can_upload.unwrap_or(false)),
                    can_manage: Set(update.can_manage.unwrap_or(false)),
                    created_at: Set(now),
                    updated_at: Set(now),
                    ..Default::default()
                };
                row.insert(self.db.as_ref()).await?;
            }
        }

        Ok(())
    }

    pub async fn set_folder_user_permissions(
        &self,
        folder_id: i64,
        user_id: i64,
        update: PermissionUpdate,
    ) -> AppResult<()> {
        let existing = folder_user_permission::Entity::find()
            .filter(folder_user_permission::Column::FolderId.eq(folder_id))
            .filter(folder_user_permission::Column::UserId.eq(user_id))
            .one(self.db.as_ref())
            .await?;

        let now = Utc::now();
        match existing {
            Some(row) => {
                let mut active = row.into_active_model();
                if let Some(v) = update.can_fence {
                    active.can_fence = Set(v);
                }
                if let Some(v) = update.can_view {
                    active.can_view = Set(v);
                }
                if let Some(v) = update.can_download_encrypted {
                    active.can_download_encrypted = Set(v);
                }
                if let Some(v) = update.can_download_pdf {
                    active.can_download_pdf = Set(v);
                }
                if let Some(v) = update.can_download_original {
                    active.can_download_original = Set(v);
                }
                if let Some(v) = update.can_upload {
                    active.can_upload = Set(v);
                }
                if let Some(v) = update.can_manage {
                    active.can_manage = Set(v);
                }
                active.updated_at = Set(now);
                active.update(self.db.as_ref()).await?;
            }
            None => {
                let row = folder_user_permission::ActiveModel {
                    folder_id: Set(folder_id),
                    user_id: Set(user_id),
                    can_fence: Set(update.can_fence.unwrap_or(false)),
                    can_view: Set(update.can_view.unwrap_or(false)),
                    can_download_encrypted: Set(update.can_download_encrypted.unwrap_or(false)),
                    can_download_pdf: Set(update.can_download_pdf.unwrap_or(false)),
                    can_download_original: Set(update.can_download_original.unwrap_or(false)),
                    can_upload: Set(update.can_upload.unwrap_or(false)),
                    can_manage: Set(update.can_manage.unwrap_or(false)),
                    created_at: Set(now),
                    updated_at: Set(now),
                    ..Default::default()
                };
                row.insert(self.db.as_ref()).await?;
            }
        }

        Ok(())
    }

    /// Delete the (document, group) row; later resolutions lose that
    /// group's contribution
    pub async fn remove_document_group_permissions(
        &self,
        document_id: i64,
        group_id: i64,
    ) -> AppResult<()> {
        document_group_permission::Entity::delete_many()
            .filter(document_group_permission::Column::DocumentId.eq(document_id))
            .filter(document_group_permission::Column::GroupId.eq(group_id))
            .exec(self.db.as_ref())
            .await?;
        Ok(())
    }

    /// Delete the per-user override; later resolutions fall back to the
    /// group-aggregated baseline
    pub async fn remove_document_user_permissions(
        &self,
        document_id: i64,
        user_id: i64,
    ) -> AppResult<()> {
        document_user_permission::Entity::delete_many()
            .filter(document_user_permission::Column::DocumentId.eq(document_id))
            .filter(document_user_permission::Column::UserId.eq(user_id))
            .exec(self.db.as_ref())
            .await?;
        Ok(())
    }

    pub async fn remove_folder_group_permissions(
        &self,
        folder_id: i64,
        group_id: i64,
    ) -> AppResult<()> {
        folder_group_permission::Entity::delete_many()
            .filter(folder_group_permission::Column::FolderId.eq(folder_id))
            .filter(folder_group_permission::Column::GroupId.eq(group_id))
            .exec(self.db.as_ref())
            .await?;
        Ok(())
    }

    pub async fn remove_folder_user_permissions(
        &self,
        folder_id: i64,
        user_id: i64,
    ) -> AppResult<()> {
        folder_user_permission::Entity::delete_many()
            .filter(folder_user_permission::Column::FolderId.eq(folder_id))
            .filter(folder_user_permission::Column::UserId.eq(user_id))
            .exec(self.db.as_ref())
            .await?;
        Ok(())
    }
}
