use mongodb::{Client, ClientSession, Collection, bson::{doc, Document}, bson::oid::ObjectId};
use futures::TryStreamExt;

use crate::dbs::mongo::models::MongoThread;
use crate::error::Result;
use crate::filter::ThreadFilter;

#[derive(Clone)]
pub struct MongoThreadRepository {
    collection: Collection<MongoThread>,
}

impl MongoThreadRepository {
    pub fn new(client: &Client, db_name: &str) -> Self {
        let collection = client.database(db_name).collection("threads");
        Self { collection }
    }

    /// Insert a thread, inside `session` when one is given
    pub async fn insert_thread(
        &self,
        thread: &MongoThread,
        session: Option<&mut ClientSession>,
    ) -> Result<()> {
        let insert = self.collection.insert_one(thread);
        match session {
            Some(session) => insert.session(session).await?,
            None => insert.await?,
        };
        Ok(())
    }

    /// Make a thread inserted hidden show up in listings
    pub async fn publish_thread(&self, thread_id: ObjectId) -> Result<()> {
        self.collection
            .update_one(doc! { "_id": thread_id }, publish_update())
            .await?;
        Ok(())
    }

    /// Remove a thread that lost its opening message
    pub async fn delete_thread(&self, thread_id: ObjectId) -> Result<()> {
        self.collection.delete_one(doc! { "_id": thread_id }).await?;
        Ok(())
    }

    /// Get a thread by ID if it is visible
    pub async fn get_visible_thread(&self, thread_id: ObjectId) -> Result<Option<MongoThread>> {
        let filter = doc! { "_id": thread_id, "visible": true };
        Ok(self.collection.find_one(filter).await?)
    }

    pub async fn count_visible_threads(&self, filter: &ThreadFilter) -> Result<u64> {
        Ok(self.collection.count_documents(visible_threads_query(filter)).await?)
    }

    /// List visible threads, newest first (ObjectIds grow with creation time)
    pub async fn list_visible_threads(
        &self,
        filter: &ThreadFilter,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<MongoThread>> {
        let threads = self.collection
            .find(visible_threads_query(filter))
            .sort(doc! { "_id": -1 })
            .skip(offset)
            .limit(i64::try_from(limit).unwrap_or(i64::MAX))
            .await?
            .try_collect()
            .await?;
        Ok(threads)
    }
}

fn publish_update() -> Document {
    doc! { "$set": { "visible": true } }
}

fn visible_threads_query(filter: &ThreadFilter) -> Document {
    if filter.is_empty() {
        return doc! { "visible": true };
    }
    let mut clauses = vec![doc! { "visible": true }];
    if !filter.all_tags.is_empty() {
        clauses.push(doc! { "tags": { "$all": filter.all_tags.clone() } });
    }
    if !filter.any_tags.is_empty() {
        clauses.push(doc! { "tags": { "$in": filter.any_tags.clone() } });
    }
    doc! { "$and": clauses }
}
