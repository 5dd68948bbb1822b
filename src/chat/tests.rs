use super::*;
use crate::config::{Config, OpenAiConfig};
use crate::database::lancedb::SnippetVector;
use crate::database::sqlite::models::{Language, NewSnippet};
use futures::StreamExt;
use serde_json::{Value, json};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TEST_DIMENSION: usize = 8;

fn message(content: &str) -> ChatMessage {
    ChatMessage::user(content)
}

#[test]
fn history_query_takes_the_last_six_messages_in_order() {
    let transcript: Vec<ChatMessage> = (1..=10).map(|i| message(&format!("m{}", i))).collect();

    assert_eq!(history_query(&transcript), "m5\nm6\nm7\nm8\nm9\nm10");
}

#[test]
fn history_query_with_short_transcript_uses_everything() {
    let transcript = vec![message("hello"), message("world")];
    assert_eq!(history_query(&transcript), "hello\nworld");
}

#[test]
fn system_prompt_renders_snippets() {
    let snippet = Snippet {
        id: "s1".to_string(),
        title: "add".to_string(),
        content: "function add(a,b){return a+b}".to_string(),
        language: Language::Javascript,
        owner_id: "user_1".to_string(),
        created_date: chrono::Utc::now().naive_utc(),
        updated_date: chrono::Utc::now().naive_utc(),
    };

    let prompt = build_system_prompt(std::slice::from_ref(&snippet));
    assert_eq!(
        prompt,
        "You are a helpful programming assistant that explains code.\
         The relevant code snippets are:\n\
         Title: add\nContent:\nfunction add(a,b){return a+b}\nProgramming Language:\njavascript"
    );

    let second = Snippet {
        id: "s2".to_string(),
        title: "noop".to_string(),
        content: "pass".to_string(),
        language: Language::Python,
        ..snippet.clone()
    };
    let prompt = build_system_prompt(&[snippet, second]);
    assert!(prompt.contains("javascript\n\nTitle: noop"));
}

#[test]
fn system_prompt_without_snippets_is_just_the_preamble() {
    assert_eq!(build_system_prompt(&[]), SYSTEM_PROMPT_PREAMBLE);
}

struct TestHarness {
    service: ChatService,
    database: Database,
    vectors: Arc<VectorStore>,
    _temp_dir: TempDir,
}

async fn harness(server: &MockServer) -> TestHarness {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let config = Config {
        base_dir: temp_dir.path().to_path_buf(),
        openai: OpenAiConfig {
            base_url: server.uri(),
            api_key: Some("sk-test".to_string()),
            embedding_dimension: TEST_DIMENSION,
            ..OpenAiConfig::default()
        },
        ..Config::default()
    };

    let database = Database::from_config(&config)
        .await
        .expect("database should initialize");
    let vectors = Arc::new(
        VectorStore::new(&config)
            .await
            .expect("vector store should initialize"),
    );
    let openai = OpenAiClient::new(&config.openai).expect("client should build");

    TestHarness {
        service: ChatService::new(database.clone(), Arc::clone(&vectors), openai),
        database,
        vectors,
        _temp_dir: temp_dir,
    }
}

async fn seed_snippet(harness: &TestHarness, owner_id: &str, title: &str) -> String {
    let snippet = harness
        .database
        .insert_snippet(
            owner_id,
            &NewSnippet {
                title: title.to_string(),
                content: "function add(a,b){return a+b}".to_string(),
                language: Language::Javascript,
            },
        )
        .await
        .expect("insert should succeed");

    harness
        .vectors
        .upsert(SnippetVector {
            id: snippet.id.clone(),
            vector: vec![1.0; TEST_DIMENSION],
            owner_id: owner_id.to_string(),
        })
        .await
        .expect("upsert should succeed");

    snippet.id
}

async fn mount_provider(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/v1/embeddings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{ "embedding": vec![1.0; TEST_DIMENSION] }],
        })))
        .mount(server)
        .await;

    let sse_body = concat!(
        "data: {\"choices\":[{\"delta\":{\"content\":\"It adds\"}}]}\n\n",
        "data: {\"choices\":[{\"delta\":{\"content\":\" two numbers\"}}]}\n\n",
        "data: [DONE]\n\n",
    );
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(sse_body, "text/event-stream"))
        .mount(server)
        .await;
}

/// The messages array of the last completion request the mock server saw.
async fn last_completion_messages(server: &MockServer) -> Vec<Value> {
    let requests = server
        .received_requests()
        .await
        .expect("requests should be recorded");
    let request = requests
        .iter()
        .rev()
        .find(|r| r.url.path() == "/v1/chat/completions")
        .expect("completion request should exist");
    let body: Value = serde_json::from_slice(&request.body).expect("body should be json");
    body["messages"]
        .as_array()
        .expect("messages should be an array")
        .clone()
}

#[tokio::test]
async fn respond_streams_reply_grounded_in_nearest_snippet() {
    let server = MockServer::start().await;
    mount_provider(&server).await;
    let harness = harness(&server).await;
    seed_snippet(&harness, "user_1", "add").await;

    let stream = harness
        .service
        .respond(
            "user_1",
            vec![message("what does this add function do")],
        )
        .await
        .expect("respond should succeed");

    let reply: String = stream
        .map(|chunk| chunk.expect("chunk should be ok"))
        .collect()
        .await;
    assert_eq!(reply, "It adds two numbers");

    let messages = last_completion_messages(&server).await;
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0]["role"], "system");
    let system = messages[0]["content"].as_str().expect("should be a string");
    assert!(system.contains("Title: add"));
    assert!(system.contains("Programming Language:\njavascript"));
    assert_eq!(messages[1]["content"], "what does this add function do");
}

#[tokio::test]
async fn respond_sends_the_full_transcript_after_the_system_message() {
    let server = MockServer::start().await;
    mount_provider(&server).await;
    let harness = harness(&server).await;
    seed_snippet(&harness, "user_1", "add").await;

    let transcript = vec![
        message("what does this add function do"),
        ChatMessage::assistant("It adds two numbers"),
        message("can you show an example call"),
    ];

    let stream = harness
        .service
        .respond("user_1", transcript.clone())
        .await
        .expect("respond should succeed");
    let _reply: Vec<_> = stream.collect().await;

    let messages = last_completion_messages(&server).await;
    assert_eq!(messages.len(), 4);
    for (sent, original) in messages[1..].iter().zip(&transcript) {
        assert_eq!(sent["content"], original.content.as_str());
    }
}

#[tokio::test]
async fn respond_without_matches_uses_bare_preamble() {
    let server = MockServer::start().await;
    mount_provider(&server).await;
    let harness = harness(&server).await;

    let stream = harness
        .service
        .respond("user_1", vec![message("anything stored?")])
        .await
        .expect("respond should succeed");
    let _reply: Vec<_> = stream.collect().await;

    let messages = last_completion_messages(&server).await;
    assert_eq!(
        messages[0]["content"].as_str().expect("should be a string"),
        SYSTEM_PROMPT_PREAMBLE
    );
}

#[tokio::test]
async fn respond_never_retrieves_other_owners_snippets() {
    let server = MockServer::start().await;
    mount_provider(&server).await;
    let harness = harness(&server).await;
    seed_snippet(&harness, "user_1", "add").await;

    let stream = harness
        .service
        .respond("user_2", vec![message("what does the add function do")])
        .await
        .expect("respond should succeed");
    let _reply: Vec<_> = stream.collect().await;

    let messages = last_completion_messages(&server).await;
    assert_eq!(
        messages[0]["content"].as_str().expect("should be a string"),
        SYSTEM_PROMPT_PREAMBLE
    );
}

#[tokio::test]
async fn respond_rejects_empty_transcript() {
    let server = MockServer::start().await;
    let harness = harness(&server).await;

    let result = harness.service.respond("user_1", Vec::new()).await;
    assert!(matches!(result, Err(StashError::Validation(_))));
}
