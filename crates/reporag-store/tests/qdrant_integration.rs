#![cfg(feature = "qdrant")]

use reporag_store::{ChunkStore, NewTextChunk, QdrantChunkStore, Scope};
use testcontainers::ContainerAsync;
use testcontainers::GenericImage;
use testcontainers::core::{ContainerPort, WaitFor};
use testcontainers::runners::AsyncRunner;

const QDRANT_GRPC_PORT: ContainerPort = ContainerPort::Tcp(6334);

fn qdrant_image() -> GenericImage {
    GenericImage::new("qdrant/qdrant", "v1.16.0")
        .with_wait_for(WaitFor::message_on_stdout("gRPC listening"))
        .with_exposed_port(QDRANT_GRPC_PORT)
}

async fn setup() -> (QdrantChunkStore, ContainerAsync<GenericImage>) {
    let container = qdrant_image().start().await.unwrap();
    let grpc_port = container.get_host_port_ipv4(6334).await.unwrap();
    let url = format!("http://127.0.0.1:{grpc_port}");

    let store = QdrantChunkStore::new(&url, "reporag_chunks_test", 2).unwrap();
    store.ensure_collection().await.unwrap();
    (store, container)
}

fn chunk(repo: &str, branch: &str, text: &str, embedding: Vec<f32>) -> NewTextChunk {
    NewTextChunk {
        scope: Scope::new(repo, branch),
        file_name: "main.go".into(),
        path: "cmd/main.go".into(),
        context: "starts the server".into(),
        text: text.into(),
        embedding,
    }
}

#[tokio::test]
#[ignore = "requires docker"]
async fn ensure_collection_is_idempotent() {
    let (store, _container) = setup().await;
    store.ensure_collection().await.unwrap();
    assert_eq!(store.count_all().await.unwrap(), 0);
}

#[tokio::test]
#[ignore = "requires docker"]
async fn put_then_scoped_query_round_trips_vectors() {
    let (store, _container) = setup().await;

    store.put(chunk("repoA", "main", "a", vec![1.0, 0.0])).await.unwrap();
    store.put(chunk("repoA", "dev", "b", vec![0.0, 1.0])).await.unwrap();
    store.put(chunk("repoB", "main", "c", vec![10.0, 10.0])).await.unwrap();

    assert_eq!(store.count_all().await.unwrap(), 3);

    let hits = store.query(&Scope::new("repoA", "main")).await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].text, "a");
    assert_eq!(hits[0].embedding, vec![1.0, 0.0]);
    assert_eq!(hits[0].path, "cmd/main.go");

    assert!(store.query(&Scope::new("repoB", "dev")).await.unwrap().is_empty());
}
