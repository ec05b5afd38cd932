use std::cell::RefCell;

use bson::{doc, oid::ObjectId};
use mongodb::sync::{Client, Collection};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument};

use crate::config::MongoSettings;
use crate::error::PersistenceError;
use crate::model::{Quotation, QuotationRecord};

pub type StoreResult<T> = Result<T, PersistenceError>;

/// Durable home of saved quotations. Records are insert-only.
pub trait QuotationStore {
    fn save(&self, quotation: &Quotation) -> StoreResult<String>;
    fn find_by_email(&self, email: &str) -> StoreResult<Vec<QuotationRecord>>;
}

/// Document shape in the `quotations` collection.
#[derive(Debug, Serialize, Deserialize)]
struct QuotationDocument {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    id: Option<ObjectId>,
    #[serde(flatten)]
    quotation: Quotation,
}

pub struct MongoQuotationStore {
    collection: Collection<QuotationDocument>,
}

impl MongoQuotationStore {
    /// Creates the client. The driver connects lazily, so an unreachable
    /// server is only reported by the first save or fetch.
    #[instrument(skip(settings), fields(database = %settings.database, collection = %settings.collection))]
    pub fn connect(settings: &MongoSettings) -> StoreResult<Self> {
        let client = Client::with_uri_str(&settings.uri).map_err(|e| {
            error!("Failed to create MongoDB client: {}", e);
            PersistenceError::Connection(e.to_string())
        })?;
        let collection = client
            .database(&settings.database)
            .collection::<QuotationDocument>(&settings.collection);
        info!("MongoDB client ready");
        Ok(Self { collection })
    }
}

impl QuotationStore for MongoQuotationStore {
    #[instrument(skip(self, quotation), fields(email = %quotation.email))]
    fn save(&self, quotation: &Quotation) -> StoreResult<String> {
        let document = QuotationDocument {
            id: None,
            quotation: quotation.clone(),
        };
        let result = self.collection.insert_one(document, None).map_err(|e| {
            error!("Failed to insert quotation: {}", e);
            PersistenceError::from(e)
        })?;

        let id = match result.inserted_id.as_object_id() {
            Some(oid) => oid.to_hex(),
            None => result.inserted_id.to_string(),
        };
        info!(id = %id, "Quotation stored");
        Ok(id)
    }

    #[instrument(skip(self))]
    fn find_by_email(&self, email: &str) -> StoreResult<Vec<QuotationRecord>> {
        let filter = doc! { "email": email.trim().to_lowercase() };
        let cursor = self.collection.find(filter, None).map_err(|e| {
            error!("Failed to query quotations: {}", e);
            PersistenceError::from(e)
        })?;

        let mut records = Vec::new();
        for document in cursor {
            let document = document.map_err(|e| {
                error!("Failed to read quotation: {}", e);
                PersistenceError::from(e)
            })?;
            records.push(QuotationRecord {
                id: document.id.map(|oid| oid.to_hex()).unwrap_or_else(|| "N/A".to_string()),
                quotation: document.quotation,
            });
        }
        info!(count = records.len(), "Fetched quotations");
        Ok(records)
    }
}

/// Stands in for the database when the client could not be created at
/// start-up. Every call fails with the original connection error.
pub struct UnavailableQuotationStore {
    reason: String,
}

impl UnavailableQuotationStore {
    pub fn new(reason: impl Into<String>) -> Self {
        Self { reason: reason.into() }
    }
}

impl QuotationStore for UnavailableQuotationStore {
    fn save(&self, _quotation: &Quotation) -> StoreResult<String> {
        error!(reason = %self.reason, "Cannot save quotation, database unavailable");
        Err(PersistenceError::Connection(self.reason.clone()))
    }

    fn find_by_email(&self, _email: &str) -> StoreResult<Vec<QuotationRecord>> {
        error!(reason = %self.reason, "Cannot fetch quotations, database unavailable");
        Err(PersistenceError::Connection(self.reason.clone()))
    }
}

/// Keeps quotations in process memory.
#[derive(Default)]
pub struct InMemoryQuotationStore {
    records: RefCell<Vec<QuotationRecord>>,
}

impl InMemoryQuotationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.borrow().is_empty()
    }
}

impl QuotationStore for InMemoryQuotationStore {
    fn save(&self, quotation: &Quotation) -> StoreResult<String> {
        let id = ObjectId::new().to_hex();
        self.records.borrow_mut().push(QuotationRecord {
            id: id.clone(),
            quotation: quotation.clone(),
        });
        Ok(id)
    }

    fn find_by_email(&self, email: &str) -> StoreResult<Vec<QuotationRecord>> {
        let email = email.trim().to_lowercase();
        Ok(self
            .records
            .borrow()
            .iter()
            .filter(|r| r.quotation.email == email)
            .cloned()
            .collect())
    }
}

impl<T: QuotationStore + ?Sized> QuotationStore for std::rc::Rc<T> {
    fn save(&self, quotation: &Quotation) -> StoreResult<String> {
        (**self).save(quotation)
    }

    fn find_by_email(&self, email: &str) -> StoreResult<Vec<QuotationRecord>> {
        (**self).find_by_email(email)
    }
}
