use lms_config::AppConfig;
use lms_core::file_storage::LocalFileStorage;
use sqlx::PgPool;

#[derive(Clone, Debug)]
pub struct AppState {
    pub db: PgPool,
    pub config: AppConfig,
    pub storage: LocalFileStorage,
}

impl AppState {
    pub fn new(db: PgPool, config: AppConfig) -> Self {
        let storage = LocalFileStorage::new(config.storage.temp_dir.clone());
        Self {
            db,
            config,
            storage,
        }
    }
}

pub async fn init_app_state(config: AppConfig) -> Result<AppState, sqlx::Error> {
    let db = lms_db::init_db_pool(&config.database).await?;
    Ok(AppState::new(db, config))
}
