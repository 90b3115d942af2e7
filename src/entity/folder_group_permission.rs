//! FolderGroupPermission entity - per (folder, group) ACL row
//!
//! Table: vdr_folder_group_permission, unique on (folder_id, group_id).
//! Structurally identical to the document variant.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "vdr_folder_group_permission")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    /// Folder ID
    pub folder_id: i64,

    /// Group ID
    pub group_id: i64,

    pub can_fence: bool,
    pub can_view: bool,
    pub can_download_encrypted: bool,
    pub can_download_pdf: bool,
    pub can_download_original: bool,
    pub can_upload: bool,
    pub can_manage: bool,

    /// Creation time
    pub created_at: ChronoDateTimeUtc,

    /// Last update time (refreshed by permission upserts)
    pub updated_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
