use mockito::{Mock, Server};
use sitechat::coordinator::{CrawlOverrides, IndexOutcome};
use sitechat::engine::{EngineOptions, RagEngine};
use sitechat::index::Database;
use sitechat::model::{Client, MockCompletionModel, MockEmbeddingModel};
use sitechat::search::{ImageQuery, ImageSort, QueryKind};
use tempfile::TempDir;

const SERVICES: &str = "We offer sailing lessons for beginners, boat rentals by the hour, \
                        and full winter storage with hull cleaning for members.";

fn html(title: &str, body: &str) -> String {
    format!("<html><head><title>{title}</title></head><body>{body}</body></html>")
}

async fn page(server: &mut Server, path: &str, body: String) -> Mock {
    server
        .mock("GET", path)
        .with_status(200)
        .with_header("content-type", "text/html")
        .with_body(body)
        .create_async()
        .await
}

async fn sailing_site(server: &mut Server) -> Vec<Mock> {
    let cross_origin = server.url().replace("127.0.0.1", "localhost");
    let home = html(
        "Sailing Club",
        &format!(
            r#"<nav><a href="/">Home</a></nav>
            <h1>Welcome aboard</h1>
            <p>{SERVICES}</p>
            <img src="/img/logo.png" alt="Club logo" width="120" height="40">
            <a href="/lessons">Lessons</a>
            <a href="/rentals#prices">Rentals</a>
            <a href="/storage/">Storage</a>
            <a href="{cross_origin}/elsewhere">Partner</a>"#
        ),
    );
    let sub = |title: &str, img: &str| {
        html(
            title,
            &format!(
                r#"<h1>{title}</h1><p>{SERVICES}</p><img src="{img}" alt="{title} photo"><a href="/deeper">More</a>"#
            ),
        )
    };

    let mut mocks = vec![
        page(server, "/", home).await,
        page(server, "/lessons", sub("Lessons", "/img/lessons.jpg")).await,
        page(server, "/rentals", sub("Rentals", "/img/rentals.jpg")).await,
        page(server, "/storage", sub("Storage", "/img/storage.jpg")).await,
    ];
    mocks.push(
        server
            .mock("GET", "/deeper")
            .with_status(200)
            .with_header("content-type", "text/html")
            .with_body(html("Deeper", "<p>too deep</p>"))
            .expect(0)
            .create_async()
            .await,
    );
    mocks
}

async fn engine(model: &MockCompletionModel) -> (RagEngine, TempDir) {
    let temp_dir = tempfile::tempdir().unwrap();
    let path = temp_dir.path().join("sitechat.db");
    let db = Database::new_from_path(&path.to_string_lossy())
        .await
        .unwrap();
    let client = Client::new(model.clone(), MockEmbeddingModel::default());
    let engine = RagEngine::new(db, client, EngineOptions::default())
        .await
        .unwrap();
    (engine, temp_dir)
}

async fn index_site(engine: &RagEngine, url: &str) -> String {
    let overrides = CrawlOverrides {
        max_depth: Some(1),
        max_pages: Some(5),
        ..Default::default()
    };
    match engine.index_with(url, &overrides).await.unwrap() {
        IndexOutcome::Indexed {
            collection_name,
            document_count,
            ..
        } => {
            assert_eq!(document_count, 4);
            collection_name
        }
        other => panic!("expected pages to be indexed, got {:?}", other),
    }
}

#[tokio::test]
async fn test_index_query_and_delete() {
    let mut server = Server::new_async().await;
    let mocks = sailing_site(&mut server).await;
    let model = MockCompletionModel::new();
    let (engine, _temp_dir) = engine(&model).await;

    let name = index_site(&engine, &server.url()).await;
    for mock in &mocks {
        mock.assert_async().await;
    }

    let record = engine.get_collection(&name).await.unwrap();
    assert_eq!(record.document_count, 4);
    assert_eq!(record.image_count, 4);
    assert_eq!(record.domain, "127.0.0.1");
    assert_eq!(engine.list_collections().await.unwrap(), vec![name.clone()]);

    model
        .set_text_response("We offer sailing lessons, rentals and storage.")
        .await;
    let answer = engine
        .query("What services do you offer", &name, 5)
        .await
        .unwrap();
    assert_eq!(answer.kind, QueryKind::Text);
    assert_eq!(
        answer.response,
        "We offer sailing lessons, rentals and storage."
    );
    assert!(!answer.sources.is_empty());
    assert!(
        answer
            .sources
            .iter()
            .all(|url| url.starts_with(&server.url()))
    );
    assert_eq!(model.call_count(), 1);

    let answer = engine.query("Show me the logo", &name, 5).await.unwrap();
    assert_eq!(answer.kind, QueryKind::Image);
    assert!(answer.response.starts_with("I found 4 images in the collection"));
    assert!(answer.response.contains("1 logos"));
    assert_eq!(model.call_count(), 1);

    engine.delete_collection(&name).await.unwrap();
    assert!(engine.list_collections().await.unwrap().is_empty());
    let err = engine.query("anything", &name, 5).await.unwrap_err();
    assert!(err.is_input());
}

#[tokio::test]
async fn test_image_listing() {
    let mut server = Server::new_async().await;
    let _mocks = sailing_site(&mut server).await;
    let model = MockCompletionModel::new();
    let (engine, _temp_dir) = engine(&model).await;
    let name = index_site(&engine, &server.url()).await;

    let query = ImageQuery {
        limit: 2,
        sort: ImageSort::Alpha,
        ..Default::default()
    };
    let page = engine.list_images(&name, &query).await.unwrap();
    assert_eq!(page.count, 4);
    let alts: Vec<&str> = page.images.iter().map(|i| i.alt.as_str()).collect();
    assert_eq!(alts, vec!["Club logo", "Lessons photo"]);
    assert_eq!(page.images[0].dimensions, "120x40");

    let query = ImageQuery {
        category: Some("photo".to_string()),
        ..Default::default()
    };
    assert_eq!(engine.list_images(&name, &query).await.unwrap().count, 3);

    assert_eq!(
        engine.image_categories(&name).await.unwrap(),
        vec!["logo", "photo"]
    );

    let stats = engine.collection_stats(&name).await.unwrap();
    assert_eq!(stats.pages_count, 4);
    assert_eq!(stats.images_count, 4);

    let bad = ImageQuery {
        limit: 500,
        ..Default::default()
    };
    assert!(engine.list_images(&name, &bad).await.unwrap_err().is_input());
}

#[tokio::test]
async fn test_unknown_collection_is_input_error() {
    let model = MockCompletionModel::new();
    let (engine, _temp_dir) = engine(&model).await;

    for err in [
        engine.query("hi", "missing_1", 5).await.unwrap_err(),
        engine.get_collection("missing_1").await.map(|_| ()).unwrap_err(),
        engine.delete_collection("missing_1").await.unwrap_err(),
        engine.image_categories("missing_1").await.map(|_| ()).unwrap_err(),
    ] {
        assert!(err.is_input(), "{err}");
    }
    assert_eq!(model.call_count(), 0);
}

#[tokio::test]
async fn test_collections_survive_reopen() {
    let mut server = Server::new_async().await;
    let _mocks = sailing_site(&mut server).await;
    let model = MockCompletionModel::new();
    let temp_dir = tempfile::tempdir().unwrap();
    let path = temp_dir.path().join("sitechat.db");
    let path = path.to_string_lossy().to_string();

    let name = {
        let db = Database::new_from_path(&path).await.unwrap();
        let client = Client::new(model.clone(), MockEmbeddingModel::default());
        let engine = RagEngine::new(db, client, EngineOptions::default())
            .await
            .unwrap();
        index_site(&engine, &server.url()).await
    };

    let db = Database::new_from_path(&path).await.unwrap();
    let client = Client::new(model, MockEmbeddingModel::default());
    let engine = RagEngine::new(db, client, EngineOptions::default())
        .await
        .unwrap();
    let sites = engine.indexed_sites().await;
    assert_eq!(sites.len(), 1);
    assert_eq!(sites[0].name, name);
    assert_eq!(sites[0].url, server.url());
}
