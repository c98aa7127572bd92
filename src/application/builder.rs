use std::sync::Arc;
use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

use crate::application::{
    cache::CacheInvalidator,
    expiration::ExpirationSweeper,
    ports::{BlobStore, CacheStore, Clock, FileRepository},
    use_cases::{
        DownloadFileUseCase, FileLookupService, RenameFileUseCase, UploadFileUseCase,
    },
};
use crate::config::{BlobBackend, Config};
use crate::infrastructure::{
    cache::InMemoryCache,
    clock::SystemClock,
    notifications::BroadcastUploadNotifier,
    persistence::PostgresFileRepository,
    storage::{LocalFilesystemStore, S3BlobStore},
};

pub type BuildError = Box<dyn std::error::Error + Send + Sync>;

/// Everything a host process needs to serve the file lifecycle
#[derive(Clone)]
pub struct FileLifecycle {
    pub upload: Arc<UploadFileUseCase>,
    pub lookup: Arc<FileLookupService>,
    pub download: Arc<DownloadFileUseCase>,
    pub rename: Arc<RenameFileUseCase>,
    pub sweeper: Arc<ExpirationSweeper>,
    /// `NotifyUploadComplete` stream; call `subscribe()` for a receiver
    pub notifier: Arc<BroadcastUploadNotifier>,
}

/// Application builder for clean dependency injection and setup.
///
/// Adapters not set explicitly fall back to: Postgres metadata (after
/// `with_database`), the blob backend named in the config, an in-process
/// cache and the system clock.
pub struct ApplicationBuilder {
    config: Config,
    pool: Option<PgPool>,
    file_repo: Option<Arc<dyn FileRepository>>,
    blob_store: Option<Arc<dyn BlobStore>>,
    cache: Option<Arc<dyn CacheStore>>,
    clock: Option<Arc<dyn Clock>>,
    notifier: Option<Arc<BroadcastUploadNotifier>>,
}

impl ApplicationBuilder {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            pool: None,
            file_repo: None,
            blob_store: None,
            cache: None,
            clock: None,
            notifier: None,
        }
    }

    /// Initialize database connection pool with retry logic, then migrate
    pub async fn with_database(mut self) -> Result<Self, BuildError> {
        info!("Connecting to database");

        // Retry connection with exponential backoff
        let mut retries = 3;
        let mut delay = Duration::from_secs(1);
        let pool = loop {
            match PgPoolOptions::new()
                .max_connections(self.config.db_max_connections)
                .min_connections(self.config.db_min_connections)
                .acquire_timeout(Duration::from_secs(self.config.db_acquire_timeout_secs))
                .connect(&self.config.database_url)
                .await
            {
                Ok(pool) => break pool,
                Err(e) if retries > 0 => {
                    retries -= 1;
                    tracing::warn!(
                        error = %e,
                        retry_in_ms = delay.as_millis() as u64,
                        retries_left = retries,
                        "Database connection failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    delay *= 2;
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to connect to database after retries");
                    return Err(Box::new(e));
                }
            }
        };

        info!(
            max_connections = self.config.db_max_connections,
            min_connections = self.config.db_min_connections,
            acquire_timeout_secs = self.config.db_acquire_timeout_secs,
            "Database pool configured"
        );

        info!("Running database migrations");
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to run migrations");
                e
            })?;

        self.pool = Some(pool);
        Ok(self)
    }

    /// Initialize the metadata repository and blob store from config
    pub async fn with_infrastructure(mut self) -> Result<Self, BuildError> {
        let pool = self.pool.as_ref().ok_or("Database pool not initialized")?;
        self.file_repo = Some(Arc::new(PostgresFileRepository::new(pool.clone())));

        let blob_store: Arc<dyn BlobStore> = match self.config.blob_backend {
            BlobBackend::Local => {
                let store = LocalFilesystemStore::new(self.config.storage_root.clone());
                store.init().await?;
                info!(root = ?self.config.storage_root, "Local blob store initialized");
                Arc::new(store)
            }
            BlobBackend::S3 => {
                let bucket = self
                    .config
                    .s3_bucket
                    .clone()
                    .ok_or("S3_BUCKET is required for the s3 backend")?;
                let store = S3BlobStore::new(
                    bucket.clone(),
                    self.config.s3_region.clone(),
                    self.config.s3_endpoint.clone(),
                )?;
                info!(bucket = %bucket, region = %self.config.s3_region, "S3 blob store initialized");
                Arc::new(store)
            }
        };
        self.blob_store = Some(blob_store);

        info!("Infrastructure layer initialized");
        Ok(self)
    }

    pub fn with_file_repository(mut self, file_repo: Arc<dyn FileRepository>) -> Self {
        self.file_repo = Some(file_repo);
        self
    }

    pub fn with_blob_store(mut self, blob_store: Arc<dyn BlobStore>) -> Self {
        self.blob_store = Some(blob_store);
        self
    }

    pub fn with_cache(mut self, cache: Arc<dyn CacheStore>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<BroadcastUploadNotifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Build use cases and the sweeper
    pub fn build(self) -> Result<FileLifecycle, BuildError> {
        let file_repo = self.file_repo.ok_or("File repository not initialized")?;
        let blob_store = self.blob_store.ok_or("Blob store not initialized")?;
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let cache = self
            .cache
            .unwrap_or_else(|| Arc::new(InMemoryCache::with_clock(Arc::clone(&clock))));
        let notifier = self
            .notifier
            .unwrap_or_else(|| Arc::new(BroadcastUploadNotifier::default()));

        let timeouts = self.config.store_timeouts();
        let invalidator = CacheInvalidator::new(Arc::clone(&cache), timeouts.cache);

        let upload = Arc::new(UploadFileUseCase::new(
            Arc::clone(&file_repo),
            Arc::clone(&blob_store),
            invalidator.clone(),
            notifier.clone(),
            Arc::clone(&clock),
            self.config.upload_settings(),
        ));

        let lookup = Arc::new(FileLookupService::new(
            Arc::clone(&file_repo),
            cache,
            self.config.cache_policy(),
            timeouts,
        ));

        let download = Arc::new(DownloadFileUseCase::new(
            Arc::clone(&file_repo),
            Arc::clone(&blob_store),
            timeouts,
        ));

        let rename = Arc::new(RenameFileUseCase::new(
            Arc::clone(&file_repo),
            invalidator.clone(),
            timeouts,
        ));

        let sweeper = Arc::new(ExpirationSweeper::new(
            file_repo,
            blob_store,
            invalidator,
            clock,
            self.config.sweeper_config(),
            timeouts,
        ));

        info!("Application layer initialized");

        Ok(FileLifecycle {
            upload,
            lookup,
            download,
            rename,
            sweeper,
            notifier,
        })
    }

    pub fn pool(&self) -> Option<&PgPool> {
        self.pool.as_ref()
    }

    /// Get configuration
    pub fn config(&self) -> &Config {
        &self.config
    }
}
