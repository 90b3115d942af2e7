//! DocumentGroupPermission entity - per (document, group) ACL row
//!
//! Table: vdr_document_group_permission, unique on (document_id, group_id)

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "vdr_document_group_permission")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    /// Document ID
    pub document_id: i64,

    /// Group ID
    pub group_id: i64,

    /// View with redaction/fencing applied
    pub can_fence: bool,

    /// Plain view
    pub can_view: bool,

    /// Download the encrypted rendition
    pub can_download_encrypted: bool,

    /// Download the PDF rendition
    pub can_download_pdf: bool,

    /// Download the original file
    pub can_download_original: bool,

    /// Upload new versions / files
    pub can_upload: bool,

    /// Manage permissions on this document (further gated by room role)
    pub can_manage: bool,

    /// Creation time
    pub created_at: ChronoDateTimeUtc,

    /// Last update time (refreshed by permission upserts)
    pub updated_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
