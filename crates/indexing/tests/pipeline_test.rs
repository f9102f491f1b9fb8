mod common;

use common::{test_pipeline, SAMPLE_MDL};
use mdl_index_common::{CollectionKind, IndexError};
use mdl_index_indexing::chunker::{Instruction, SqlPair};
use mdl_index_indexing::pipeline::{IndexingOptions, IndexingOptionsBuilder};
use mdl_index_storage::{DocumentStore, MetadataFilter};
use serde_json::json;
use std::fs;
use tempfile::TempDir;

#[tokio::test]
async fn test_index_mdl_counts_per_collection() {
    let test = test_pipeline(IndexingOptions::default());

    let report = test.pipeline.index_mdl(SAMPLE_MDL, Some("p1")).await.unwrap();

    assert_eq!(report.count(CollectionKind::DbSchema), 7);
    assert_eq!(report.count(CollectionKind::TableDescription), 5);
    assert_eq!(report.count(CollectionKind::HistoricalQuestion), 1);
    assert_eq!(report.count(CollectionKind::ProjectMeta), 1);
    assert_eq!(report.count(CollectionKind::SqlPairs), 0);
    assert_eq!(report.total(), 14);

    let p1 = MetadataFilter::for_project(Some("p1"));
    let schema = test.store(CollectionKind::DbSchema);
    assert_eq!(schema.count_documents(Some(&p1)).await.unwrap(), 7);
}

#[tokio::test]
async fn test_column_batch_size_splits_column_chunks() {
    let options = IndexingOptionsBuilder::default()
        .column_batch_size(2)
        .build()
        .unwrap();
    let test = test_pipeline(options);

    let report = test.pipeline.index_mdl(SAMPLE_MDL, None).await.unwrap();

    // orders has three plain columns plus one foreign key
    assert_eq!(report.count(CollectionKind::DbSchema), 8);
}

#[tokio::test]
async fn test_project_meta_is_not_embedded() {
    let test = test_pipeline(IndexingOptions::default());
    test.pipeline.index_mdl(SAMPLE_MDL, Some("p1")).await.unwrap();

    assert_eq!(test.embedder.embedded(), 13);

    let meta = test.store(CollectionKind::ProjectMeta).documents(None).await;
    assert_eq!(meta.len(), 1);
    assert!(meta[0].embedding.is_none());
    assert_eq!(meta[0].meta["data_source"], json!("postgres"));

    let schema = test.store(CollectionKind::DbSchema).documents(None).await;
    assert!(schema.iter().all(|doc| doc.embedding.is_some()));
}

#[tokio::test]
async fn test_reindexing_replaces_only_the_same_project() {
    let test = test_pipeline(IndexingOptions::default());
    test.pipeline.index_mdl(SAMPLE_MDL, Some("p1")).await.unwrap();
    test.pipeline.index_mdl(SAMPLE_MDL, Some("p2")).await.unwrap();

    let smaller = r#"{"dataSource": "mysql", "models": [{"name": "events", "columns": [{"name": "id", "type": "integer"}]}]}"#;
    test.pipeline.index_mdl(smaller, Some("p1")).await.unwrap();

    let schema = test.store(CollectionKind::DbSchema);
    let p1 = MetadataFilter::for_project(Some("p1"));
    let p2 = MetadataFilter::for_project(Some("p2"));
    assert_eq!(schema.count_documents(Some(&p1)).await.unwrap(), 2);
    assert_eq!(schema.count_documents(Some(&p2)).await.unwrap(), 7);

    let questions = test.store(CollectionKind::HistoricalQuestion);
    assert_eq!(questions.count_documents(Some(&p1)).await.unwrap(), 0);
    assert_eq!(questions.count_documents(Some(&p2)).await.unwrap(), 1);
}

#[tokio::test]
async fn test_invalid_mdl_writes_nothing() {
    let test = test_pipeline(IndexingOptions::default());

    let result = test.pipeline.index_mdl("{not json", Some("p1")).await;

    assert!(matches!(result, Err(IndexError::InvalidMdl(_))));
    assert_eq!(test.embedder.embedded(), 0);
    for store in test.stores.values() {
        assert_eq!(store.count_documents(None).await.unwrap(), 0);
    }
}

#[tokio::test]
async fn test_sql_pairs_index_and_delete() {
    let temp = TempDir::new().unwrap();
    let pairs_path = temp.path().join("sql_pairs.json");
    fs::write(
        &pairs_path,
        r#"{
            "ecommerce": [
                {"question": "Top customers?", "sql": "SELECT name FROM customers LIMIT 10"},
                {"question": "Orders today?", "sql": "SELECT count(*) FROM orders"}
            ],
            "hr": [{"question": "Headcount?", "sql": "SELECT count(*) FROM employees"}]
        }"#,
    )
    .unwrap();

    let options = IndexingOptionsBuilder::default()
        .sql_pairs_path(pairs_path)
        .build()
        .unwrap();
    let test = test_pipeline(options);
    let external = vec![SqlPair::new("ext-1", "Revenue by day?", "SELECT day, sum(amount) FROM revenue")];

    let written = test
        .pipeline
        .index_sql_pairs(SAMPLE_MDL, external.clone(), Some("p1"))
        .await
        .unwrap();
    assert_eq!(written, 3);

    // boilerplate pairs keep their ids, so re-indexing does not duplicate them
    test.pipeline
        .index_sql_pairs(SAMPLE_MDL, external, Some("p1"))
        .await
        .unwrap();
    let store = test.store(CollectionKind::SqlPairs);
    assert_eq!(store.count_documents(None).await.unwrap(), 3);
    assert!(store.get("ext-1").await.is_some());

    test.pipeline
        .delete_sql_pairs(&["ext-1".to_string()], Some("p1"))
        .await
        .unwrap();
    assert_eq!(store.count_documents(None).await.unwrap(), 2);
    assert!(store.get("ext-1").await.is_none());
}

#[tokio::test]
async fn test_sql_pairs_are_isolated_per_project() {
    let temp = TempDir::new().unwrap();
    let pairs_path = temp.path().join("sql_pairs.json");
    fs::write(
        &pairs_path,
        r#"{
            "ecommerce": [
                {"question": "Top customers?", "sql": "SELECT name FROM customers LIMIT 10"},
                {"question": "Orders today?", "sql": "SELECT count(*) FROM orders"}
            ]
        }"#,
    )
    .unwrap();

    let options = IndexingOptionsBuilder::default()
        .sql_pairs_path(pairs_path)
        .build()
        .unwrap();
    let test = test_pipeline(options);

    for project in ["p1", "p2"] {
        let written = test
            .pipeline
            .index_sql_pairs(SAMPLE_MDL, Vec::new(), Some(project))
            .await
            .unwrap();
        assert_eq!(written, 2);
    }

    let store = test.store(CollectionKind::SqlPairs);
    assert_eq!(store.count_documents(None).await.unwrap(), 4);
    for project in ["p1", "p2"] {
        let filter = MetadataFilter::for_project(Some(project));
        assert_eq!(store.count_documents(Some(&filter)).await.unwrap(), 2);
    }

    // re-indexing one project leaves the other untouched
    test.pipeline
        .index_sql_pairs(SAMPLE_MDL, Vec::new(), Some("p1"))
        .await
        .unwrap();
    let p2 = MetadataFilter::for_project(Some("p2"));
    assert_eq!(store.count_documents(Some(&p2)).await.unwrap(), 2);
    assert_eq!(store.count_documents(None).await.unwrap(), 4);
}

#[tokio::test]
async fn test_sql_pairs_without_file_index_external_only() {
    let test = test_pipeline(IndexingOptions::default());
    let external = vec![SqlPair::new("ext-1", "q", "SELECT 1")];

    let written = test.pipeline.index_sql_pairs(SAMPLE_MDL, external, None).await.unwrap();

    assert_eq!(written, 1);
}

#[tokio::test]
async fn test_instructions_index_and_delete() {
    let test = test_pipeline(IndexingOptions::default());
    let store = test.store(CollectionKind::Instructions);
    let mut instructions = vec![
        Instruction {
            id: "i1".into(),
            instruction: "Exclude test accounts".into(),
            questions: vec![],
            is_default: true,
        },
        Instruction {
            id: "i2".into(),
            instruction: "Report money in USD".into(),
            questions: vec!["What is revenue?".into(), "Average order value?".into()],
            is_default: false,
        },
    ];

    let written = test
        .pipeline
        .index_instructions(&instructions, Some("p1"))
        .await
        .unwrap();
    assert_eq!(written, 3);

    instructions[1].questions.pop();
    test.pipeline
        .index_instructions(&instructions[1..], Some("p1"))
        .await
        .unwrap();
    assert_eq!(store.count_documents(None).await.unwrap(), 2);

    test.pipeline
        .delete_instructions(&["i1".to_string()], Some("p1"))
        .await
        .unwrap();
    let remaining = store.documents(None).await;
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].meta["instruction_id"], json!("i2"));
}

#[tokio::test]
async fn test_clean_by_project_and_everything() {
    let test = test_pipeline(IndexingOptions::default());
    test.pipeline.index_mdl(SAMPLE_MDL, Some("p1")).await.unwrap();
    test.pipeline.index_mdl(SAMPLE_MDL, Some("p2")).await.unwrap();

    test.pipeline.clean(Some("p1")).await.unwrap();
    let schema = test.store(CollectionKind::DbSchema);
    assert_eq!(schema.count_documents(None).await.unwrap(), 7);

    test.pipeline.clean(None).await.unwrap();
    for store in test.stores.values() {
        assert_eq!(store.count_documents(None).await.unwrap(), 0);
    }
}

#[tokio::test]
async fn test_memory_stores_are_healthy() {
    let test = test_pipeline(IndexingOptions::default());
    for (_, store) in test.pipeline.stores() {
        store.health_check().await.unwrap();
    }
}
