use driveconnect_auth::JwtService;
use driveconnect_database::DbPool;

use crate::config::AppConfig;

#[derive(Clone)]
pub struct AppState {
    pub db_pool: DbPool,
    pub jwt_service: JwtService,
    pub config: AppConfig,
}
