#![allow(dead_code)]

use async_trait::async_trait;
use mdl_index_common::{CollectionKind, Result};
use mdl_index_indexing::embedder::{DocumentEmbedder, Embedder};
use mdl_index_indexing::pipeline::{IndexingOptions, IndexingPipeline};
use mdl_index_storage::{DocumentStore, InMemoryDocumentStore};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use strum::IntoEnumIterator;

pub const DIMENSION: usize = 4;

/// Two models joined by a relationship, a metric, and two views of which one was
/// saved from a question.
pub const SAMPLE_MDL: &str = r#"{
    "catalog": "shop",
    "schema": "public",
    "dataSource": "postgres",
    "models": [
        {
            "name": "orders",
            "tableReference": {"schema": "public", "table": "orders"},
            "primaryKey": "id",
            "columns": [
                {"name": "id", "type": "integer", "notNull": true},
                {"name": "customer_id", "type": "integer"},
                {"name": "total", "type": "double", "isCalculated": true, "expression": "sum(price)"},
                {"name": "customer", "type": "customers", "relationship": "orders_customer"}
            ],
            "properties": {"displayName": "Orders", "description": "Placed orders", "boilerplate": "Ecommerce"}
        },
        {
            "name": "customers",
            "primaryKey": "id",
            "columns": [
                {"name": "id", "type": "integer", "notNull": true},
                {"name": "name", "type": "varchar"}
            ]
        }
    ],
    "relationships": [
        {
            "name": "orders_customer",
            "models": ["orders", "customers"],
            "joinType": "MANY_TO_ONE",
            "condition": "orders.customer_id = customers.id"
        }
    ],
    "metrics": [
        {
            "name": "revenue",
            "baseObject": "orders",
            "dimension": [{"name": "day", "type": "date"}],
            "measure": [{"name": "amount", "type": "double"}]
        }
    ],
    "views": [
        {
            "name": "orders_per_customer",
            "statement": "SELECT customer_id, count(*) FROM orders GROUP BY 1",
            "properties": {"question": "How many orders per customer?", "summary": "Order counts", "viewId": "42"}
        },
        {"name": "all_orders", "statement": "SELECT * FROM orders"}
    ]
}"#;

/// Deterministic embedder that counts texts it was asked to embed
#[derive(Default)]
pub struct FakeEmbedder {
    pub texts: AtomicUsize,
}

impl FakeEmbedder {
    pub fn embedded(&self) -> usize {
        self.texts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Embedder for FakeEmbedder {
    fn name(&self) -> &str {
        "fake"
    }

    fn dimension(&self) -> usize {
        DIMENSION
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        self.texts.fetch_add(texts.len(), Ordering::SeqCst);
        Ok(texts
            .iter()
            .map(|t| {
                let len = t.len() as f32;
                vec![len, len / 2.0, 1.0, 0.0]
            })
            .collect())
    }
}

pub struct TestPipeline {
    pub pipeline: IndexingPipeline,
    pub embedder: Arc<FakeEmbedder>,
    pub stores: BTreeMap<CollectionKind, Arc<InMemoryDocumentStore>>,
}

impl TestPipeline {
    pub fn store(&self, kind: CollectionKind) -> &Arc<InMemoryDocumentStore> {
        &self.stores[&kind]
    }
}

/// Pipeline over in-memory stores and [`FakeEmbedder`]
pub fn test_pipeline(options: IndexingOptions) -> TestPipeline {
    let stores: BTreeMap<CollectionKind, Arc<InMemoryDocumentStore>> = CollectionKind::iter()
        .map(|kind| (kind, Arc::new(InMemoryDocumentStore::new(kind.to_string()))))
        .collect();
    let dyn_stores = stores
        .iter()
        .map(|(kind, store)| (*kind, Arc::clone(store) as Arc<dyn DocumentStore>))
        .collect();

    let embedder = Arc::new(FakeEmbedder::default());
    let pipeline = IndexingPipeline::new(
        dyn_stores,
        DocumentEmbedder::new(embedder.clone(), 3, 2),
        options,
    )
    .unwrap();

    TestPipeline {
        pipeline,
        embedder,
        stores,
    }
}
