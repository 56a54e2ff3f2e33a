use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument, warn};

use crate::index::{DbError, MetadataStore, TextStore};
use crate::search::classifier::{KeywordClassifier, QueryClassifier, QueryKind};
use crate::search::context::build_context;
use crate::search::error::SearchError;
use crate::search::generation::TextGenerator;
use crate::search::images::image_answer;

/// Answer when retrieval found nothing
pub const NO_RESULTS_MESSAGE: &str = "I couldn't find any relevant information to answer your question. Please try asking something related to the website content.";

/// Answer when generation produced no text
pub const EMPTY_ANSWER_APOLOGY: &str = "I apologize, but I couldn't generate a proper response. Please try rephrasing your question.";

/// Answer when generation failed
pub const GENERATION_FAILED_APOLOGY: &str =
    "I encountered an error while generating your response. Please try again later.";

/// The routed answer to one question
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryAnswer {
    /// Which path produced the answer
    pub kind: QueryKind,

    /// Answer text; markdown, or markdown with an HTML block on the image path
    pub response: String,

    /// Distinct source URLs of the chunks used, in rank order
    pub sources: Vec<String>,
}

impl QueryAnswer {
    fn text(response: impl Into<String>, sources: Vec<String>) -> Self {
        Self {
            kind: QueryKind::Text,
            response: response.into(),
            sources,
        }
    }
}

/// Sends each question down the image path or the text path
pub struct QueryRouter {
    text_store: Arc<dyn TextStore>,
    metadata_store: Arc<dyn MetadataStore>,
    generator: Arc<dyn TextGenerator>,
    classifier: Box<dyn QueryClassifier>,
    base_url: String,
}

impl QueryRouter {
    pub fn new(
        text_store: Arc<dyn TextStore>,
        metadata_store: Arc<dyn MetadataStore>,
        generator: Arc<dyn TextGenerator>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            text_store,
            metadata_store,
            generator,
            classifier: Box::new(KeywordClassifier::new()),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Replace the keyword classifier
    pub fn with_classifier(mut self, classifier: impl QueryClassifier + 'static) -> Self {
        self.classifier = Box::new(classifier);
        self
    }

    pub fn classify(&self, question: &str) -> QueryKind {
        self.classifier.classify(question)
    }

    /// Answer `question` from `collection`
    ///
    /// Generation failures never surface as errors; store failures do.
    #[instrument(skip(self, question), fields(question_len = question.len()))]
    pub async fn route(
        &self,
        question: &str,
        collection: &str,
        top_k: usize,
    ) -> Result<QueryAnswer, SearchError> {
        match self.classify(question) {
            QueryKind::Image => self.answer_images(collection).await,
            QueryKind::Text => self.answer_text(question, collection, top_k).await,
        }
    }

    async fn answer_images(&self, collection: &str) -> Result<QueryAnswer, SearchError> {
        let images = self.metadata_store.get_images(collection, None).await?;
        info!("Answering image query with {} images", images.len());

        let mut sources: Vec<String> = Vec::new();
        for image in &images {
            if !sources.contains(&image.page_url) {
                sources.push(image.page_url.clone());
            }
        }

        Ok(QueryAnswer {
            kind: QueryKind::Image,
            response: image_answer(collection, &images, &self.base_url),
            sources,
        })
    }

    async fn answer_text(
        &self,
        question: &str,
        collection: &str,
        top_k: usize,
    ) -> Result<QueryAnswer, SearchError> {
        let hits = match self.text_store.search(collection, question, top_k).await {
            Ok(hits) => hits,
            // Present only in the metadata store after a partial write
            Err(DbError::CollectionNotFound(_)) => {
                warn!("Collection {} has no text store entry", collection);
                Vec::new()
            }
            Err(e) => return Err(e.into()),
        };

        if hits.is_empty() {
            return Ok(QueryAnswer::text(NO_RESULTS_MESSAGE, Vec::new()));
        }

        let mut sources: Vec<String> = Vec::new();
        for hit in &hits {
            if !sources.contains(&hit.metadata.source_url) {
                sources.push(hit.metadata.source_url.clone());
            }
        }

        let context = build_context(&hits);
        let response = match self.generator.generate(question, &context).await {
            Ok(text) if text.trim().is_empty() => {
                warn!("Generation returned an empty answer");
                EMPTY_ANSWER_APOLOGY.to_string()
            }
            Ok(text) => text,
            Err(e) => {
                error!(error = %e, "Generation failed");
                GENERATION_FAILED_APOLOGY.to_string()
            }
        };

        Ok(QueryAnswer::text(response, sources))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::{ImageRef, PageDocument, PageMetadata};
    use crate::index::database::tests::setup_test_db;
    use crate::index::{LibsqlMetadataStore, LibsqlTextStore};
    use crate::model::{MockCompletionModel, MockEmbeddingModel};
    use crate::processor::{ChunkOptions, chunk_document};
    use crate::search::generation::RigGenerator;

    struct Fixture {
        router: QueryRouter,
        model: MockCompletionModel,
        text_store: Arc<dyn TextStore>,
        metadata_store: Arc<dyn MetadataStore>,
        _temp_dir: tempfile::TempDir,
    }

    async fn fixture() -> Fixture {
        let (db, temp_dir) = setup_test_db().await.unwrap();
        let text_store: Arc<dyn TextStore> =
            Arc::new(LibsqlTextStore::new(db.clone(), MockEmbeddingModel::default()));
        let metadata_store: Arc<dyn MetadataStore> = Arc::new(LibsqlMetadataStore::new(db));
        let model = MockCompletionModel::new();
        let router = QueryRouter::new(
            text_store.clone(),
            metadata_store.clone(),
            Arc::new(RigGenerator::new(model.clone())),
            "http://localhost:8000/",
        );
        Fixture {
            router,
            model,
            text_store,
            metadata_store,
            _temp_dir: temp_dir,
        }
    }

    fn page(url: &str, content: &str, images: Vec<ImageRef>) -> PageDocument {
        PageDocument {
            url: url.to_string(),
            content: content.to_string(),
            metadata: PageMetadata {
                title: Some("Services".to_string()),
                image_count: images.len(),
                ..Default::default()
            },
            images,
        }
    }

    async fn index(fixture: &Fixture, collection: &str, document: PageDocument) {
        let chunks = chunk_document(&document, &ChunkOptions::default()).unwrap();
        fixture.text_store.add(collection, &chunks).await.unwrap();
        fixture
            .metadata_store
            .add(collection, &[document])
            .await
            .unwrap();
    }

    fn services_text() -> String {
        "We offer boat repair, hull painting and engine servicing for all vessels. ".repeat(4)
    }

    #[tokio::test]
    async fn test_empty_collection_skips_generation() {
        let fixture = fixture().await;
        fixture.text_store.create_collection("empty_1").await.unwrap();

        let answer = fixture
            .router
            .route("What services do you offer", "empty_1", 5)
            .await
            .unwrap();
        assert_eq!(answer.kind, QueryKind::Text);
        assert_eq!(answer.response, NO_RESULTS_MESSAGE);
        assert_eq!(fixture.model.call_count(), 0);
    }

    #[tokio::test]
    async fn test_text_query_uses_generation() {
        let fixture = fixture().await;
        index(
            &fixture,
            "boats_1",
            page("https://boats.test/services", &services_text(), vec![]),
        )
        .await;
        fixture.model.set_text_response("We repair boats.").await;

        let answer = fixture
            .router
            .route("What services do you offer", "boats_1", 5)
            .await
            .unwrap();
        assert_eq!(answer.response, "We repair boats.");
        assert_eq!(answer.sources, vec!["https://boats.test/services"]);
        assert_eq!(fixture.model.call_count(), 1);
    }

    #[tokio::test]
    async fn test_generation_failures_become_apologies() {
        let fixture = fixture().await;
        index(
            &fixture,
            "boats_1",
            page("https://boats.test/services", &services_text(), vec![]),
        )
        .await;

        let answer = fixture
            .router
            .route("What services do you offer", "boats_1", 5)
            .await
            .unwrap();
        assert_eq!(answer.response, EMPTY_ANSWER_APOLOGY);

        fixture.model.set_text_response(" \n\t").await;
        let answer = fixture
            .router
            .route("What services do you offer", "boats_1", 5)
            .await
            .unwrap();
        assert_eq!(answer.response, EMPTY_ANSWER_APOLOGY);

        fixture.model.set_text_response("\nWe repair hulls.\n").await;
        let answer = fixture
            .router
            .route("What services do you offer", "boats_1", 5)
            .await
            .unwrap();
        assert_eq!(answer.response, "\nWe repair hulls.\n");

        fixture.model.set_error("boom").await;
        let answer = fixture
            .router
            .route("What services do you offer", "boats_1", 5)
            .await
            .unwrap();
        assert_eq!(answer.response, GENERATION_FAILED_APOLOGY);
    }

    #[tokio::test]
    async fn test_image_query_lists_images() {
        let fixture = fixture().await;
        let images = vec![ImageRef {
            src: "https://boats.test/logo.png".to_string(),
            alt: "Boats logo".to_string(),
            ..Default::default()
        }];
        index(
            &fixture,
            "boats_1",
            page("https://boats.test", &services_text(), images),
        )
        .await;

        let answer = fixture
            .router
            .route("Show me the logo", "boats_1", 5)
            .await
            .unwrap();
        assert_eq!(answer.kind, QueryKind::Image);
        assert!(answer.response.starts_with(
            "I found 1 images in the collection 'boats_1'. These include 1 logos."
        ));
        assert!(
            answer
                .response
                .contains("http://localhost:8000/images/boats_1")
        );
        assert_eq!(answer.sources, vec!["https://boats.test"]);
        assert_eq!(fixture.model.call_count(), 0);
    }

    #[tokio::test]
    async fn test_image_query_without_images() {
        let fixture = fixture().await;
        index(
            &fixture,
            "boats_1",
            page("https://boats.test", &services_text(), vec![]),
        )
        .await;

        let answer = fixture
            .router
            .route("any pictures?", "boats_1", 5)
            .await
            .unwrap();
        assert_eq!(
            answer.response,
            "I couldn't find any images in the collection 'boats_1'."
        );
    }

    #[tokio::test]
    async fn test_metadata_only_collection_has_no_results() {
        let fixture = fixture().await;
        fixture
            .metadata_store
            .add("partial_1", &[page("https://p.test", "short", vec![])])
            .await
            .unwrap();

        let answer = fixture
            .router
            .route("What is this?", "partial_1", 5)
            .await
            .unwrap();
        assert_eq!(answer.response, NO_RESULTS_MESSAGE);
    }
}
