//! Entity module - SeaORM entity definitions
//!
//! One module per database table. Cross-entity relations are resolved
//! with manual queries instead of declared relations.

pub mod data_room;
pub mod document;
pub mod document_group_permission;
pub mod document_user_permission;
pub mod folder;
pub mod folder_group_permission;
pub mod folder_user_permission;
pub mod group;
pub mod group_member;
pub mod user;
