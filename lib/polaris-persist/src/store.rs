//! The collection-style persistence contract and namespaced buckets.

use async_trait::async_trait;

use crate::{ModelSchema, PersistError, namespaced, validate_identifier};

/// Trait for stores that hand out schema-evolving collections.
///
/// `collection()` is additive only: it creates the backing table with an `id`
/// primary key if needed and adds any missing columns for the model's tagged
/// fields. Existing columns are never dropped or retyped. The sequence of
/// alterations is not atomic, so a concurrent reader may see a table that is
/// only partly evolved.
#[async_trait]
pub trait Store: Send + Sync {
    /// Handle to a collection, used for CRUD through the underlying driver.
    type Collection: Send;

    /// Open the session. The only transition into the connected state.
    async fn connect(&mut self) -> Result<(), PersistError>;

    /// List the collections that currently exist.
    async fn collections(&self) -> Result<Vec<Self::Collection>, PersistError>;

    /// Ensure the collection `name` exists with columns for every field of `model`.
    async fn collection(
        &self,
        name: &str,
        model: &ModelSchema,
    ) -> Result<Self::Collection, PersistError>;

    /// A view over this store that prefixes collection names with `name_`.
    fn new_bucket(&self, name: &str) -> Result<Bucket<'_, Self>, PersistError>
    where
        Self: Sized,
    {
        validate_identifier(name)?;
        Ok(Bucket::new(self, name))
    }
}

/// Namespaced view over a store. Borrows the store; owns no connection.
#[derive(Debug)]
pub struct Bucket<'a, S> {
    store: &'a S,
    namespace: String,
}

impl<'a, S: Store> Bucket<'a, S> {
    pub fn new(store: &'a S, namespace: impl Into<String>) -> Self {
        Self {
            store,
            namespace: namespace.into(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn store(&self) -> &'a S {
        self.store
    }

    /// Same as `Store::collection` with the name prefixed by this bucket's namespace.
    pub async fn collection(
        &self,
        name: &str,
        model: &ModelSchema,
    ) -> Result<S::Collection, PersistError> {
        self.store
            .collection(&namespaced(&self.namespace, name), model)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FieldKind, FieldSchema};
    use std::collections::{BTreeMap, BTreeSet};
    use std::sync::Mutex;

    /// Keeps table shapes in memory, applying the same additive rules as a real backend.
    #[derive(Debug, Default)]
    struct MemoryStore {
        tables: Mutex<BTreeMap<String, BTreeSet<String>>>,
    }

    #[async_trait]
    impl Store for MemoryStore {
        type Collection = String;

        async fn connect(&mut self) -> Result<(), PersistError> {
            Ok(())
        }

        async fn collections(&self) -> Result<Vec<String>, PersistError> {
            Ok(self.tables.lock().unwrap().keys().cloned().collect())
        }

        async fn collection(
            &self,
            name: &str,
            model: &ModelSchema,
        ) -> Result<String, PersistError> {
            validate_identifier(name)?;
            let mut tables = self.tables.lock().unwrap();
            let columns = tables
                .entry(name.to_string())
                .or_insert_with(|| BTreeSet::from(["id".to_string()]));
            for column in model.column_definitions()? {
                columns.insert(column.name.to_string());
            }
            Ok(name.to_string())
        }
    }

    static NOTE_FIELDS: &[FieldSchema] = &[FieldSchema {
        name: "body",
        column: "body",
        kind: FieldKind::Text,
        primary_key: false,
    }];

    static NOTE: ModelSchema = ModelSchema {
        type_name: "Note",
        fields: NOTE_FIELDS,
    };

    #[tokio::test]
    async fn test_bucket_prefixes_collection_names() {
        let store = MemoryStore::default();
        let bucket = store.new_bucket("tenant").unwrap();
        assert_eq!(bucket.namespace(), "tenant");

        let name = bucket.collection("notes", &NOTE).await.unwrap();
        assert_eq!(name, "tenant_notes");
        assert_eq!(store.collections().await.unwrap(), vec!["tenant_notes"]);
    }

    #[tokio::test]
    async fn test_buckets_share_the_parent_store() {
        let store = MemoryStore::default();
        let a = store.new_bucket("a").unwrap();
        let b = store.new_bucket("b").unwrap();
        a.collection("notes", &NOTE).await.unwrap();
        b.collection("notes", &NOTE).await.unwrap();
        assert!(std::ptr::eq(a.store(), b.store()));
        assert_eq!(store.collections().await.unwrap(), vec!["a_notes", "b_notes"]);
    }

    #[test]
    fn test_bucket_name_must_be_an_identifier() {
        let store = MemoryStore::default();
        assert!(matches!(
            store.new_bucket(""),
            Err(PersistError::InvalidIdentifier(_))
        ));
        assert!(matches!(
            store.new_bucket("bad-name"),
            Err(PersistError::InvalidIdentifier(_))
        ));
    }
}
