//! DocumentUserPermission entity - per-user override for one document
//!
//! Table: vdr_document_user_permission, unique on (document_id, user_id)
//!
//! When a row exists it replaces the group-aggregated result outright;
//! it is never OR'd with it.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "vdr_document_user_permission")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    /// Document ID
    pub document_id: i64,

    /// User ID
    pub user_id: i64,

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
