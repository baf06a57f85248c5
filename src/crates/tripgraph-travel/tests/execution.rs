//! Persistence, deadline and concurrency behavior of the travel service

mod common;

use async_trait::async_trait;
use common::*;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tripgraph_checkpoint::{FileStateStore, InMemoryStateStore, StateRecord, StateStore, StoreError};
use tripgraph_core::{ExecutionConfig, GraphError, MessageRole, PersistMode, START};
use tripgraph_llm::ScriptedChatModel;
use tripgraph_travel::{ServiceError, TravelRequest, TravelState};

fn chatty_model() -> ScriptedChatModel {
    ScriptedChatModel::new()
        .with_reply("intent_classifier", GENERAL)
        .with_reply("general_chat", "네, 말씀하세요!")
}

#[tokio::test]
async fn history_is_append_only() {
    let svc = service(Arc::new(recommending_model().with_replies(
        "intent_classifier",
        [GENERAL, RECOMMEND, IRRELEVANT],
    )));
    let mut previous: Vec<_> = Vec::new();

    for message in ["안녕", "100만원 2박 3일 바다 맛집", "정치 얘기 해줘"] {
        svc.chat(TravelRequest::new("append", message)).await.unwrap();
        let state = svc.state("append").await.unwrap();

        assert!(state.messages.len() > previous.len());
        assert_eq!(&state.messages[..previous.len()], previous.as_slice());
        previous = state.messages;
    }

    let roles: Vec<_> = previous.iter().map(|m| m.role).collect();
    assert_eq!(
        roles,
        [MessageRole::Human, MessageRole::Assistant].repeat(3),
        "each turn adds exactly one user and one assistant message"
    );
}

#[tokio::test(start_paused = true)]
async fn deadline_covers_waiting_for_a_busy_thread() {
    let model = Arc::new(chatty_model().with_delay("general_chat", Duration::from_secs(60)));
    let svc = service(model);

    let first = {
        let svc = svc.clone();
        tokio::spawn(async move { svc.chat(TravelRequest::new("busy", "첫 번째")).await })
    };
    // let the first turn take the thread
    tokio::time::sleep(Duration::from_millis(1)).await;

    let started = tokio::time::Instant::now();
    let err = svc
        .chat_with_deadline(TravelRequest::new("busy", "두 번째"), Some(Duration::from_secs(1)))
        .await
        .unwrap_err();

    assert!(started.elapsed() < Duration::from_secs(2));
    match err {
        ServiceError::Graph(GraphError::DeadlineExceeded { node, deadline_ms, .. }) => {
            assert_eq!(node, START);
            assert_eq!(deadline_ms, 1000);
        }
        other => panic!("unexpected error: {other}"),
    }

    first.await.unwrap().unwrap();
    let state = svc.state("busy").await.unwrap();
    assert_eq!(state.messages.len(), 2);
    assert_eq!(state.messages[0].text(), "첫 번째");
}

#[tokio::test(start_paused = true)]
async fn aborted_first_turn_leaves_no_thread_behind() {
    let model = Arc::new(chatty_model().with_delay("general_chat", Duration::from_secs(60)));
    let svc = service(model);

    let err = svc
        .chat_with_deadline(TravelRequest::new("fresh", "안녕"), Some(Duration::from_secs(1)))
        .await
        .unwrap_err();

    assert!(err.is_timeout());
    assert!(svc.threads().await.unwrap().is_empty());
    assert_eq!(svc.state("fresh").await.unwrap(), TravelState::default());
}

#[tokio::test(start_paused = true)]
async fn deadline_restores_the_pre_turn_state() {
    let model = Arc::new(
        recommending_model()
            .with_replies("intent_classifier", [GENERAL, RECOMMEND])
            .with_reply("general_chat", "안녕하세요!")
            .with_delay("enrich_information", Duration::from_secs(30)),
    );
    let store = Arc::new(InMemoryStateStore::new());
    let svc = service_with(model.clone(), store.clone());

    svc.chat(TravelRequest::new("slow", "안녕")).await.unwrap();
    let before = svc.state("slow").await.unwrap();

    let err = svc
        .chat_with_deadline(
            TravelRequest::new("slow", "100만원 2박 3일 바다 맛집"),
            Some(Duration::from_secs(5)),
        )
        .await
        .unwrap_err();

    assert!(err.is_timeout());
    match err {
        ServiceError::Graph(GraphError::DeadlineExceeded { node, .. }) => {
            assert_eq!(node, "enrich_information")
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(model.calls("enrich_information"), 1);

    let after = svc.state("slow").await.unwrap();
    assert_eq!(after, before);
    assert!(after.candidates.is_empty());
}

#[tokio::test(start_paused = true)]
async fn configured_deadline_applies_to_chat() {
    let model = Arc::new(chatty_model().with_delay("general_chat", Duration::from_secs(60)));
    let svc = service_with_config(
        model,
        Arc::new(InMemoryStateStore::new()),
        ExecutionConfig::default().with_deadline(Duration::from_secs(10)),
    );

    let err = svc.chat(TravelRequest::new("d", "안녕")).await.unwrap_err();
    assert!(err.is_timeout());

    // an unseen thread is restored to an empty conversation
    let state = svc.state("d").await.unwrap();
    assert_eq!(state, TravelState::default());
}

#[tokio::test]
async fn step_limit_aborts_and_rolls_back() {
    let svc = service_with_config(
        Arc::new(recommending_model()),
        Arc::new(InMemoryStateStore::new()),
        ExecutionConfig::default().with_max_steps(4),
    );

    let err = svc
        .chat(TravelRequest::new("limited", "100만원 2박 3일 바다 맛집"))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Graph(GraphError::StepLimitExceeded { limit: 4, .. })
    ));
    assert!(svc.state("limited").await.unwrap().messages.is_empty());
}

#[tokio::test]
async fn persist_modes_differ_only_in_write_count() {
    let every_store = Arc::new(InMemoryStateStore::new());
    let end_store = Arc::new(InMemoryStateStore::new());

    let every = service_with(Arc::new(recommending_model()), every_store.clone());
    let end = service_with_config(
        Arc::new(recommending_model()),
        end_store.clone(),
        ExecutionConfig::default().with_persist_mode(PersistMode::EndOfTurn),
    );

    let request = TravelRequest::new("p", "100만원 2박 3일 바다 맛집");
    let a = every.chat(request.clone()).await.unwrap();
    let b = end.chat(request).await.unwrap();
    assert_eq!(a, b);

    let every_record = every_store.load("p").await.unwrap().unwrap();
    let end_record = end_store.load("p").await.unwrap().unwrap();
    assert_eq!(every_record.values, end_record.values);
    // input merge plus one save per node
    assert_eq!(every_record.version, a.path.len() as u64 + 1);
    assert_eq!(end_record.version, 1);
}

struct BrokenStore;

#[async_trait]
impl StateStore for BrokenStore {
    async fn load(&self, _thread_id: &str) -> tripgraph_checkpoint::Result<Option<StateRecord>> {
        Ok(None)
    }

    async fn save(&self, _thread_id: &str, _values: Value) -> tripgraph_checkpoint::Result<StateRecord> {
        Err(StoreError::Storage("disk full".to_string()))
    }

    async fn list_threads(&self) -> tripgraph_checkpoint::Result<Vec<String>> {
        Ok(Vec::new())
    }

    async fn delete_thread(&self, _thread_id: &str) -> tripgraph_checkpoint::Result<()> {
        Err(StoreError::Storage("disk full".to_string()))
    }
}

#[tokio::test]
async fn store_faults_are_hard_failures() {
    let model = Arc::new(chatty_model());
    let svc = service_with(model.clone(), Arc::new(BrokenStore));

    let err = svc.chat(TravelRequest::new("broken", "안녕")).await.unwrap_err();
    assert!(err.is_store_fault());
    assert!(!err.is_timeout());
    // the input merge could not be saved, so no node ran
    assert_eq!(model.total_calls(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn threads_are_isolated() {
    let svc = service(Arc::new(chatty_model()));

    let handles: Vec<_> = (0..16)
        .map(|i| {
            let svc = svc.clone();
            tokio::spawn(async move {
                svc.chat(TravelRequest::new(format!("iso-{i}"), format!("안녕 {i}")))
                    .await
                    .unwrap()
            })
        })
        .collect();
    futures::future::try_join_all(handles).await.unwrap();

    let threads = svc.threads().await.unwrap();
    assert_eq!(threads.len(), 16);
    for i in 0..16 {
        let state = svc.state(&format!("iso-{i}")).await.unwrap();
        assert_eq!(state.messages.len(), 2);
        assert_eq!(state.messages[0].text(), format!("안녕 {i}"));
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn same_thread_turns_are_serialized() {
    let model = Arc::new(chatty_model().with_delay("general_chat", Duration::from_millis(5)));
    let svc = service(model);

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let svc = svc.clone();
            tokio::spawn(async move {
                svc.chat(TravelRequest::new("shared", format!("메시지 {i}")))
                    .await
                    .unwrap()
            })
        })
        .collect();
    futures::future::try_join_all(handles).await.unwrap();

    let state = svc.state("shared").await.unwrap();
    assert_eq!(state.messages.len(), 16);
    for pair in state.messages.chunks(2) {
        assert!(pair[0].is_human());
        assert!(pair[1].is_assistant());
    }
}

#[tokio::test]
async fn file_store_survives_a_restart() {
    let dir = TempDir::new().unwrap();

    {
        let store = Arc::new(FileStateStore::open(dir.path()).await.unwrap());
        let svc = service_with(Arc::new(recommending_model()), store);
        let reply = svc
            .chat(TravelRequest::new("trip-1", "100만원 2박 3일 바다 맛집"))
            .await
            .unwrap();
        assert!(reply.info_complete);
    }

    let raw: Value = serde_json::from_slice(
        &std::fs::read(dir.path().join("trip-1.json")).unwrap(),
    )
    .unwrap();
    let values = &raw["values"];
    assert_eq!(values["user_preferences"]["budget"], 1_000_000);
    assert_eq!(values["intent"], "recommend_travel");
    assert_eq!(values["current_step"], "present_recommendations");
    assert_eq!(values["final_recommendations"].as_array().unwrap().len(), 3);

    let store = Arc::new(FileStateStore::open(dir.path()).await.unwrap());
    let svc = service_with(Arc::new(chatty_model()), store);
    let state = svc.state("trip-1").await.unwrap();
    assert_eq!(state.final_recommendations.len(), 3);

    let reply = svc.chat(TravelRequest::new("trip-1", "고마워요")).await.unwrap();
    assert!(reply.info_complete, "completion is sticky for the conversation");
}

#[tokio::test]
async fn file_store_rejects_unsafe_thread_ids() {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(FileStateStore::open(dir.path()).await.unwrap());
    let svc = service_with(Arc::new(chatty_model()), store);

    let err = svc
        .chat(TravelRequest::new("../escape", "안녕"))
        .await
        .unwrap_err();
    assert!(err.is_store_fault());
}
