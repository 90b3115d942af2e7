//! DataRoom entity - top-level container for documents, folders and groups
//!
//! Table: vdr_data_room

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "vdr_data_room")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    /// Room name
    #[sea_orm(column_type = "String(Some(128))")]
    pub name: String,

    /// Creation time
    pub created_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
