use mongodb::{Client, ClientSession, Collection, bson::doc, bson::oid::ObjectId};
use futures::TryStreamExt;

use crate::dbs::mongo::models::MongoMessage;
use crate::error::Result;

#[derive(Clone)]
pub struct MongoMessageRepository {
    collection: Collection<MongoMessage>,
}

impl MongoMessageRepository {
    pub fn new(client: &Client, db_name: &str) -> Self {
        let collection = client.database(db_name).collection("messages");
        Self { collection }
    }

    /// Save a single message, inside `session` when one is given
    pub async fn save_message(
        &self,
        message: &MongoMessage,
        session: Option<&mut ClientSession>,
    ) -> Result<ObjectId> {
        let insert = self.collection.insert_one(message);
        match session {
            Some(session) => insert.session(session).await?,
            None => insert.await?,
        };
        Ok(message.id)
    }

    /// Remove the opening message of a thread that could not be published
    pub async fn delete_message(&self, message_id: ObjectId) -> Result<()> {
        self.collection.delete_one(doc! { "_id": message_id }).await?;
        Ok(())
    }

    /// Visible messages of a thread in creation order
    pub async fn get_visible_messages(&self, thread_id: ObjectId) -> Result<Vec<MongoMessage>> {
        let filter = doc! { "thread_id": thread_id, "visible": true };
        let messages = self.collection
            .find(filter)
            .sort(doc! { "_id": 1 })
            .await?
            .try_collect()
            .await?;
        Ok(messages)
    }
}
