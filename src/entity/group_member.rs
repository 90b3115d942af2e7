//! GroupMember entity - user-to-group membership
//!
//! Table: vdr_group_member
//!
//! Rows are created by the invitation flow; this engine only reads them.
//! A user may belong to several groups in the same room, including groups
//! of different types.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "vdr_group_member")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    /// Member user ID
    pub user_id: i64,

    /// Group ID
    pub group_id: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
