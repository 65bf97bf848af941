//! Ingestion through the service: reset and append semantics, validation order

mod common;

use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

use bytes::Bytes;
use common::{service, test_config, write_file, StubFactory, SKY};
use docqa::retrieval::{Retriever, SqliteVectorIndex, VectorIndex};
use docqa::{Error, UploadedFile};

async fn index_len(location: &Path) -> usize {
    VectorIndex::open(Arc::new(SqliteVectorIndex::new()), location)
        .await
        .unwrap()
        .len()
        .await
        .unwrap()
}

async fn top_k(location: &Path, factory: &StubFactory, question: &str, k: usize) -> Vec<String> {
    let index = VectorIndex::open(Arc::new(SqliteVectorIndex::new()), location)
        .await
        .unwrap();
    Retriever::new(index, Arc::new(factory.bag_of_words()), k)
        .retrieve(question)
        .await
        .unwrap()
        .into_iter()
        .map(|hit| hit.text)
        .collect()
}

fn upload(name: &str, content: &str) -> UploadedFile {
    UploadedFile {
        name: name.to_string(),
        data: Bytes::from(content.to_string()),
    }
}

#[tokio::test]
async fn test_initialize_builds_index() {
    let dir = TempDir::new().unwrap();
    write_file(dir.path(), "data/sky.txt", SKY);
    let config = test_config(dir.path(), 20, 5);
    let qa = service(config.clone(), Arc::new(StubFactory::new()));

    let report = qa.initialize_index().await.unwrap();

    assert!(report.fragment_count >= 2);
    assert_eq!(report.document_count, 1);
    assert_eq!(report.sources.len(), 1);
    assert!(report.sources[0].ends_with("sky.txt"));
    assert_eq!(index_len(&config.vector_db.persist_path).await, report.fragment_count);
}

#[tokio::test]
async fn test_reset_is_idempotent() {
    let dir = TempDir::new().unwrap();
    write_file(dir.path(), "data/sky.txt", SKY);
    write_file(dir.path(), "data/notes/trees.md", "# Trees\n\nLeaves are green in summer.");
    let config = test_config(dir.path(), 20, 5);
    let factory = Arc::new(StubFactory::new());
    let qa = service(config.clone(), factory.clone());
    let location = &config.vector_db.persist_path;
    let question = "Are leaves green in summer?";

    let first = qa.reindex(None).await.unwrap();
    let first_hits = top_k(location, &factory, question, 3).await;
    let second = qa.reindex(None).await.unwrap();
    let second_hits = top_k(location, &factory, question, 3).await;

    assert_eq!(first, second);
    assert_eq!(first.document_count, 2);
    assert_eq!(index_len(location).await, second.fragment_count);
    assert_eq!(first_hits.len(), 3);
    assert_eq!(first_hits, second_hits);
}

#[tokio::test]
async fn test_sources_only_list_fragment_producers() {
    let dir = TempDir::new().unwrap();
    write_file(dir.path(), "data/sky.txt", SKY);
    write_file(dir.path(), "data/empty.txt", "   \n");
    let qa = service(test_config(dir.path(), 20, 5), Arc::new(StubFactory::new()));

    let report = qa.reindex(None).await.unwrap();

    assert_eq!(report.document_count, 2);
    assert_eq!(report.sources.len(), 1);
    assert!(report.sources[0].ends_with("sky.txt"));
}

#[tokio::test]
async fn test_embedding_failure_leaves_index_untouched() {
    let dir = TempDir::new().unwrap();
    write_file(dir.path(), "data/sky.txt", SKY);
    let mut config = test_config(dir.path(), 20, 5);
    config.providers.embed_batch_size = 1;
    let location = config.vector_db.persist_path.clone();

    // Nothing is created when the first build fails partway
    let failing = service(config.clone(), Arc::new(StubFactory::new().failing_on_embed(1)));
    let err = failing.initialize_index().await.unwrap_err();
    assert!(matches!(err, Error::Provider { .. }));
    assert!(!location.exists());

    let factory = Arc::new(StubFactory::new());
    let initial = service(config.clone(), factory.clone())
        .initialize_index()
        .await
        .unwrap();
    let before = top_k(&location, &factory, "What color is the sky?", 2).await;

    // Reset keeps the previous index
    write_file(dir.path(), "data/trees.md", "Leaves are green in summer.");
    let err = failing.reindex(None).await.unwrap_err();
    assert!(matches!(err, Error::Provider { .. }));
    assert_eq!(index_len(&location).await, initial.fragment_count);

    // Append writes none of its fragments
    let err = failing
        .upload(vec![upload("notes.txt", "Snow is white. Coal is black.")])
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Provider { .. }));
    assert_eq!(index_len(&location).await, initial.fragment_count);

    assert_eq!(top_k(&location, &factory, "What color is the sky?", 2).await, before);
}

#[tokio::test]
async fn test_append_accumulates() {
    let dir = TempDir::new().unwrap();
    write_file(dir.path(), "data/sky.txt", SKY);
    let config = test_config(dir.path(), 20, 5);
    let qa = service(config.clone(), Arc::new(StubFactory::new()));

    let initial = qa.initialize_index().await.unwrap();
    let appended = qa
        .upload(vec![upload("notes.txt", "Snow is white. Coal is black.")])
        .await
        .unwrap();

    assert_eq!(appended.sources, vec!["upload://notes.txt".to_string()]);
    assert_eq!(
        index_len(&config.vector_db.persist_path).await,
        initial.fragment_count + appended.fragment_count
    );
}

#[tokio::test]
async fn test_upload_creates_missing_index() {
    let dir = TempDir::new().unwrap();
    let config = test_config(dir.path(), 20, 5);
    let qa = service(config.clone(), Arc::new(StubFactory::new()));

    let report = qa
        .upload(vec![
            upload("a.txt", "First uploaded file."),
            upload("../b.txt", "Second uploaded file."),
        ])
        .await
        .unwrap();

    assert_eq!(report.document_count, 2);
    assert_eq!(
        report.sources,
        vec!["upload://a.txt".to_string(), "upload://b.txt".to_string()]
    );
    assert_eq!(index_len(&config.vector_db.persist_path).await, report.fragment_count);
}

#[tokio::test]
async fn test_unsupported_files_skipped() {
    let dir = TempDir::new().unwrap();
    write_file(dir.path(), "data/sky.txt", SKY);
    write_file(dir.path(), "data/photo.png", "not really a picture");
    write_file(dir.path(), "data/table.csv", "a,b\n1,2");
    let qa = service(test_config(dir.path(), 20, 5), Arc::new(StubFactory::new()));

    let report = qa.reindex(None).await.unwrap();

    assert_eq!(report.document_count, 1);
    assert!(report.sources[0].ends_with("sky.txt"));
}

#[tokio::test]
async fn test_no_supported_documents() {
    let dir = TempDir::new().unwrap();
    write_file(dir.path(), "data/photo.png", "not really a picture");
    let config = test_config(dir.path(), 20, 5);
    let qa = service(config.clone(), Arc::new(StubFactory::new()));

    let err = qa.reindex(None).await.unwrap_err();

    assert!(matches!(err, Error::NoDocuments));
    assert!(!config.vector_db.persist_path.exists());
}

#[tokio::test]
async fn test_whitespace_documents_give_no_fragments() {
    let dir = TempDir::new().unwrap();
    write_file(dir.path(), "data/blank.txt", "   \n\n  ");
    let qa = service(test_config(dir.path(), 20, 5), Arc::new(StubFactory::new()));

    let err = qa.reindex(None).await.unwrap_err();
    assert!(matches!(err, Error::NoFragments));
}

#[tokio::test]
async fn test_invalid_chunking_rejected_before_io() {
    let dir = TempDir::new().unwrap();
    write_file(dir.path(), "data/sky.txt", SKY);
    let config = test_config(dir.path(), 100, 100);
    let factory = Arc::new(StubFactory::new());
    let qa = service(config.clone(), factory.clone());

    assert!(matches!(qa.initialize_index().await, Err(Error::Config(_))));
    // Also ahead of the path check
    assert!(matches!(
        qa.reindex(Some("/definitely/not/here")).await,
        Err(Error::Config(_))
    ));
    assert!(matches!(
        qa.upload(vec![upload("a.txt", "text")]).await,
        Err(Error::Config(_))
    ));

    assert_eq!(factory.embed_calls(), 0);
    assert!(!config.vector_db.persist_path.exists());
}

#[tokio::test]
async fn test_missing_credentials_rejected_before_io() {
    let dir = TempDir::new().unwrap();
    write_file(dir.path(), "data/sky.txt", SKY);
    let mut config = test_config(dir.path(), 20, 5);
    config.providers.api_key = None;
    let factory = Arc::new(StubFactory::new());
    let qa = service(config.clone(), factory.clone());

    let err = qa.initialize_index().await.unwrap_err();
    assert!(err.to_string().contains("OPENAI_API_KEY"));
    assert!(matches!(
        qa.upload(vec![upload("a.txt", "text")]).await,
        Err(Error::Config(_))
    ));

    assert_eq!(factory.embed_calls(), 0);
    assert!(!config.vector_db.persist_path.exists());
}

#[tokio::test]
async fn test_runtime_key_and_keyless_provider() {
    let dir = TempDir::new().unwrap();
    write_file(dir.path(), "data/sky.txt", SKY);
    let mut config = test_config(dir.path(), 20, 5);
    config.providers.api_key = None;
    let qa = service(config, Arc::new(StubFactory::new()));

    qa.select_provider("ollama").unwrap();
    assert!(qa.initialize_index().await.is_ok());

    qa.select_provider("openai").unwrap();
    assert!(qa.initialize_index().await.is_err());
    qa.set_provider_key("openai", "sk-runtime").unwrap();
    assert!(qa.initialize_index().await.is_ok());
}

#[tokio::test]
async fn test_append_with_other_dimensions_rejected() {
    let dir = TempDir::new().unwrap();
    write_file(dir.path(), "data/sky.txt", SKY);
    let config = test_config(dir.path(), 20, 5);

    let initial = service(config.clone(), Arc::new(StubFactory::new()))
        .initialize_index()
        .await
        .unwrap();

    let narrow = service(config.clone(), Arc::new(StubFactory::with_dims(8)));
    let err = narrow
        .upload(vec![upload("notes.txt", "Snow is white.")])
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Config(_)));
    assert_eq!(index_len(&config.vector_db.persist_path).await, initial.fragment_count);
}

#[tokio::test]
async fn test_reindex_missing_path() {
    let dir = TempDir::new().unwrap();
    let qa = service(test_config(dir.path(), 20, 5), Arc::new(StubFactory::new()));

    let missing = dir.path().join("nowhere");
    let err = qa.reindex(Some(missing.to_str().unwrap())).await.unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));

    // Default directory is absent too
    assert!(matches!(qa.reindex(None).await, Err(Error::NotFound(_))));
}

#[tokio::test]
async fn test_empty_upload_rejected() {
    let dir = TempDir::new().unwrap();
    let qa = service(test_config(dir.path(), 20, 5), Arc::new(StubFactory::new()));

    assert!(matches!(qa.upload(Vec::new()).await, Err(Error::InvalidRequest(_))));
}

#[tokio::test]
async fn test_concurrent_appends_all_land() {
    let dir = TempDir::new().unwrap();
    let config = test_config(dir.path(), 20, 5);
    let qa = Arc::new(service(config.clone(), Arc::new(StubFactory::new())));

    let tasks: Vec<_> = (0..4)
        .map(|i| {
            let qa = qa.clone();
            tokio::spawn(async move {
                qa.upload(vec![upload(&format!("f{}.txt", i), "Rivers flow to the sea.")])
                    .await
            })
        })
        .collect();

    let mut total = 0;
    for task in tasks {
        total += task.await.unwrap().unwrap().fragment_count;
    }

    assert_eq!(index_len(&config.vector_db.persist_path).await, total);
}
