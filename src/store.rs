use async_trait::async_trait;
use bson::{doc, Bson, Document};
use futures::stream::TryStreamExt;
use mongodb::{Client, Collection};
use serde_json::Value;
use thiserror::Error;

use crate::config::AppConfig;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Mongo(#[from] mongodb::error::Error),
}

/// Read-only access to the inspection collection. The handler injects a
/// recording double for tests; production uses [`MongoInspectionStore`].
#[async_trait]
pub trait InspectionStore: Send + Sync {
    /// Run an aggregation pipeline and materialize every result document,
    /// preserving server order.
    async fn run_pipeline(&self, pipeline: Vec<Document>) -> Result<Vec<Document>, StoreError>;
}

pub struct MongoInspectionStore {
    collection: Collection<Document>,
    max_result_docs: i64,
}

impl MongoInspectionStore {
    pub async fn connect(config: &AppConfig) -> Result<Self, StoreError> {
        let client = Client::with_uri_str(&config.mongodb_uri).await?;
        let collection = client
            .database(&config.mongodb_db)
            .collection::<Document>(&config.mongodb_collection);
        Ok(Self {
            collection,
            max_result_docs: config.max_result_docs,
        })
    }
}

#[async_trait]
impl InspectionStore for MongoInspectionStore {
    async fn run_pipeline(&self, pipeline: Vec<Document>) -> Result<Vec<Document>, StoreError> {
        let pipeline = cap_pipeline(pipeline, self.max_result_docs);
        let mut cursor = self.collection.aggregate(pipeline, None).await?;
        let mut docs = Vec::new();
        while let Some(doc) = cursor.try_next().await? {
            docs.push(doc);
        }
        Ok(docs)
    }
}

/// Append a `$limit` when the generated pipeline bounds nothing itself.
/// `$count` already collapses the result to a single document.
fn cap_pipeline(mut pipeline: Vec<Document>, cap: i64) -> Vec<Document> {
    let bounded = pipeline
        .iter()
        .any(|stage| stage.contains_key("$limit") || stage.contains_key("$count"));
    if !bounded {
        pipeline.push(doc! {"$limit": cap});
    }
    pipeline
}

/// Serialize result documents for the answer prompt. Database-internal
/// values are flattened to plain strings so the model sees readable text.
pub fn context_json(docs: &[Document]) -> String {
    let values: Vec<Value> = docs.iter().map(plain_document).collect();
    Value::Array(values).to_string()
}

fn plain_document(doc: &Document) -> Value {
    Value::Object(
        doc.iter()
            .map(|(key, value)| (key.clone(), plain_value(value)))
            .collect(),
    )
}

fn plain_value(value: &Bson) -> Value {
    match value {
        Bson::Document(doc) => plain_document(doc),
        Bson::Array(items) => Value::Array(items.iter().map(plain_value).collect()),
        Bson::ObjectId(oid) => Value::String(oid.to_hex()),
        Bson::DateTime(dt) => Value::String(
            dt.try_to_rfc3339_string()
                .unwrap_or_else(|_| dt.timestamp_millis().to_string()),
        ),
        Bson::String(s) => Value::String(s.clone()),
        Bson::Boolean(b) => Value::Bool(*b),
        Bson::Int32(n) => Value::Number((*n).into()),
        Bson::Int64(n) => Value::Number((*n).into()),
        Bson::Double(f) => serde_json::Number::from_f64(*f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        Bson::Decimal128(d) => Value::String(d.to_string()),
        Bson::Null => Value::Null,
        other => Value::String(other.to_string()),
    }
}
