use mongodb::{Client, Collection, IndexModel, bson::doc, bson::oid::ObjectId, options::IndexOptions};
use futures::TryStreamExt;

use crate::dbs::mongo::models::MongoTag;
use crate::error::Result;

#[derive(Clone)]
pub struct MongoTagRepository {
    collection: Collection<MongoTag>,
}

impl MongoTagRepository {
    pub fn new(client: &Client, db_name: &str) -> Self {
        let collection = client.database(db_name).collection("tags");
        Self { collection }
    }

    /// Unique index on the tag name
    pub async fn ensure_indexes(&self) -> Result<()> {
        let index = IndexModel::builder()
            .keys(doc! { "name": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();
        self.collection.create_index(index).await?;
        Ok(())
    }

    /// Insert any missing names and return the tags for all of them
    pub async fn upsert_names(&self, names: &[String]) -> Result<Vec<MongoTag>> {
        for name in names {
            self.collection
                .update_one(
                    doc! { "name": name },
                    doc! { "$setOnInsert": { "name": name } },
                )
                .upsert(true)
                .await?;
        }

        let filter = doc! { "name": { "$in": names.to_vec() } };
        self.find_sorted(filter).await
    }

    pub async fn list_tags(&self) -> Result<Vec<MongoTag>> {
        self.find_sorted(doc! {}).await
    }

    pub async fn get_tags(&self, ids: &[ObjectId]) -> Result<Vec<MongoTag>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let filter = doc! { "_id": { "$in": ids.to_vec() } };
        self.find_sorted(filter).await
    }

    async fn find_sorted(&self, filter: mongodb::bson::Document) -> Result<Vec<MongoTag>> {
        let tags = self.collection
            .find(filter)
            .sort(doc! { "name": 1 })
            .await?
            .try_collect()
            .await?;
        Ok(tags)
    }
}
