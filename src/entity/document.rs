//! Document entity - file owned by a data room
//!
//! Table: vdr_document

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "vdr_document")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    /// Owning data room; a document without a room is unreachable and
    /// resolves to no permissions
    pub data_room_id: Option<i64>,

    /// Containing folder (null for room root)
    pub folder_id: Option<i64>,

    /// Document name
    #[sea_orm(column_type = "String(Some(256))")]
    pub name: String,

    /// Creation time
    pub created_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
