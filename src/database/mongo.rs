//! MongoDB database wrapper and record store.

use async_trait::async_trait;
use chrono::NaiveDate;
use futures::TryStreamExt;
use mongodb::bson::doc;
use mongodb::options::{ClientOptions, IndexOptions, ReturnDocument};
use mongodb::{Client, Collection, IndexModel};
use tracing::{debug, info};

use super::error::StoreResult;
use super::models::{HistoryRecord, UserRecord};
use super::store::RecordStore;

/// Database wrapper for MongoDB operations.
#[derive(Debug, Clone)]
pub struct Database {
    db: mongodb::Database,
}

impl Database {
    /// Connect to MongoDB with the given URI and database name.
    ///
    /// # Errors
    /// Returns error if connection fails.
    pub async fn connect(uri: &str, db_name: &str) -> anyhow::Result<Self> {
        let options = ClientOptions::parse(uri).await?;
        let client = Client::with_options(options)?;

        // Ping the database to verify connection
        client
            .database("admin")
            .run_command(doc! { "ping": 1 })
            .await?;

        info!("Successfully connected to MongoDB");

        Ok(Self {
            db: client.database(db_name),
        })
    }

    /// Get a typed collection from the database.
    pub fn collection<T: Send + Sync>(&self, name: &str) -> Collection<T> {
        self.db.collection(name)
    }
}

/// Record store backed by `users` and `history` collections.
///
/// Lookups go through a unique index on `user_id`, and quota decrements are
/// a single conditional update so concurrent requests cannot overdraw.
pub struct MongoStore {
    users: Collection<UserRecord>,
    history: Collection<HistoryRecord>,
}

impl MongoStore {
    /// Create the store and make sure indexes exist.
    pub async fn new(db: &Database) -> anyhow::Result<Self> {
        let users: Collection<UserRecord> = db.collection("users");
        let history: Collection<HistoryRecord> = db.collection("history");

        users
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "user_id": 1 })
                    .options(IndexOptions::builder().unique(true).build())
                    .build(),
            )
            .await?;
        history
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "user_id": 1, "timestamp": -1 })
                    .build(),
            )
            .await?;

        Ok(Self { users, history })
    }
}

#[async_trait]
impl RecordStore for MongoStore {
    fn name(&self) -> &'static str {
        "mongo"
    }

    async fn get(&self, user_id: u64) -> StoreResult<Option<UserRecord>> {
        let filter = doc! { "user_id": user_id as i64 };
        Ok(self.users.find_one(filter).await?)
    }

    async fn save(&self, record: &UserRecord) -> StoreResult<()> {
        let filter = doc! { "user_id": record.user_id as i64 };
        let options = mongodb::options::ReplaceOptions::builder()
            .upsert(true)
            .build();

        self.users
            .replace_one(filter, record)
            .with_options(options)
            .await?;

        debug!("Saved user {}", record.user_id);
        Ok(())
    }

    async fn set_quota(&self, user_id: u64, quota: u32, today: NaiveDate) -> StoreResult<bool> {
        let filter = doc! { "user_id": user_id as i64 };
        let update = doc! {
            "$set": {
                "daily_quota_remaining": quota as i64,
                "quota_date": today.to_string(),
            }
        };

        let result = self.users.update_one(filter, update).await?;
        Ok(result.matched_count > 0)
    }

    async fn decrement_quota(&self, user_id: u64) -> StoreResult<Option<u32>> {
        let filter = doc! {
            "user_id": user_id as i64,
            "daily_quota_remaining": { "$gt": 0 },
        };
        let update = doc! { "$inc": { "daily_quota_remaining": -1 } };

        let updated = self
            .users
            .find_one_and_update(filter, update)
            .return_document(ReturnDocument::After)
            .await?;

        Ok(updated.map(|r| r.daily_quota_remaining))
    }

    async fn list_users(&self) -> StoreResult<Vec<UserRecord>> {
        let cursor = self.users.find(doc! {}).await?;
        Ok(cursor.try_collect().await?)
    }

    async fn append_history(&self, entry: &HistoryRecord) -> StoreResult<()> {
        self.history.insert_one(entry).await?;
        Ok(())
    }

    async fn recent_history(&self, user_id: u64, limit: usize) -> StoreResult<Vec<HistoryRecord>> {
        let cursor = self
            .history
            .find(doc! { "user_id": user_id as i64 })
            .sort(doc! { "timestamp": -1 })
            .limit(limit as i64)
            .await?;
        Ok(cursor.try_collect().await?)
    }
}
