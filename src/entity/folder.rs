//! Folder entity - directory owned by a data room
//!
//! Table: vdr_folder

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "vdr_folder")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    /// Owning data room
    pub data_room_id: Option<i64>,

    /// Parent folder (null for room root)
    pub parent_id: Option<i64>,

    /// Folder name
    #[sea_orm(column_type = "String(Some(256))")]
    pub name: String,

    /// Creation time
    pub created_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
