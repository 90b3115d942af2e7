use sea_orm::DatabaseConnection;
use std::sync::Arc;

use crate::config::Config;
use crate::resolver::PermissionResolver;
use crate::roles::RoomRoleModel;
use crate::session::SessionValidator;

/// Application state shared by the embedding service.
///
/// Bundles the three access-control services over one connection pool;
/// handlers clone it freely.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: Arc<DatabaseConnection>,
    /// Room role model
    pub roles: RoomRoleModel,
    /// Resource permission resolver
    pub resolver: PermissionResolver,
    /// Session access validator
    pub session: SessionValidator,
    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Create new application state over an initialized connection
    pub fn new(db: impl Into<Arc<DatabaseConnection>>, config: Config) -> Self {
        let db = db.into();
        Self {
            roles: RoomRoleModel::new(db.clone()),
            resolver: PermissionResolver::new(db.clone()),
            session: SessionValidator::new(db.clone()),
            db,
            config: Arc::new(config),
        }
    }
}
