//! User entity - room-independent account record
//!
//! Table: vdr_user

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Account status
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum UserStatus {
    /// Invited but not yet activated
    PendingInvite = 0,
    /// Normal account
    Active = 1,
    /// Deactivated by an administrator
    Deactivated = 2,
    /// Access period has expired
    Expired = 3,
}

impl From<i32> for UserStatus {
    fn from(value: i32) -> Self {
        match value {
            1 => UserStatus::Active,
            2 => UserStatus::Deactivated,
            3 => UserStatus::Expired,
            _ => UserStatus::PendingInvite,
        }
    }
}

impl From<UserStatus> for i32 {
    fn from(status: UserStatus) -> Self {
        status as i32
    }
}

/// Access duration type
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccessType {
    /// No time restriction
    Unlimited = 0,
    /// Restricted to [access_start_at, access_end_at]
    Limited = 1,
}

impl From<i32> for AccessType {
    fn from(value: i32) -> Self {
        match value {
            1 => AccessType::Limited,
            _ => AccessType::Unlimited,
        }
    }
}

impl From<AccessType> for i32 {
    fn from(access_type: AccessType) -> Self {
        access_type as i32
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "vdr_user")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    /// Email (unique)
    #[sea_orm(column_type = "String(Some(128))", unique)]
    pub email: String,

    /// Full name
    #[sea_orm(column_type = "String(Some(64))")]
    pub full_name: String,

    /// Account enabled at all
    pub is_active: bool,

    /// Account status: 0=pending invite, 1=active, 2=deactivated, 3=expired
    pub status: i32,

    /// Access duration type: 0=unlimited, 1=limited
    pub access_type: i32,

    /// Start of the access window (meaningful only when access_type=limited)
    pub access_start_at: Option<ChronoDateTimeUtc>,

    /// End of the access window (meaningful only when access_type=limited)
    pub access_end_at: Option<ChronoDateTimeUtc>,

    /// Comma-separated IP literals / CIDR blocks; null or empty means
    /// no restriction
    #[sea_orm(column_type = "String(Some(512))", nullable)]
    pub allowed_ips: Option<String>,

    /// Two-factor authentication required for this account
    pub two_factor_enabled: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Typed view of the raw status column
    pub fn status(&self) -> UserStatus {
        UserStatus::from(self.status)
    }

    /// Typed view of the raw access_type column
    pub fn access_type(&self) -> AccessType {
        AccessType::from(self.access_type)
    }

    /// Allow-list entries as an ordered list; empty when no restriction
    /// is configured
    pub fn allowed_ip_list(&self) -> Vec<String> {
        self.allowed_ips
            .as_deref()
            .unwrap_or("")
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Serialize an allow-list back into the column representation;
    /// an empty list maps to NULL (no restriction)
    pub fn join_ip_list(ips: &[String]) -> Option<String> {
        if ips.is_empty() {
            None
        } else {
            Some(ips.join(","))
        }
    }
}
