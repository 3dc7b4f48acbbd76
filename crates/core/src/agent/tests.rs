//! Unit tests for agent module

use super::*;
use crate::model::{Role, ScriptedModel};
use crate::storage::{InMemoryStorage, RunStatus};

fn agent_with(model: ScriptedModel, storage: InMemoryStorage) -> Agent {
    Agent::new(
        AgentConfig::new("assistant").with_instructions("Be brief."),
        Arc::new(model),
        Arc::new(storage),
    )
}

#[tokio::test]
async fn test_run_returns_content_and_persists_session() {
    let storage = InMemoryStorage::new();
    let agent = agent_with(ScriptedModel::reply(["Hello", " there"]), storage.clone());

    let output = agent
        .run(RunInput::new("hi").with_user_id("alice"))
        .await
        .unwrap();
    assert_eq!(output.content, "Hello there");

    let session = storage
        .get_session(&output.session_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(session.agent_id, "assistant");
    assert_eq!(session.user_id.as_deref(), Some("alice"));
    assert_eq!(session.runs.len(), 1);
    assert_eq!(session.runs[0].run_id, output.run_id);
    assert_eq!(session.runs[0].status, RunStatus::Completed);
    assert_eq!(session.runs[0].output.as_deref(), Some("Hello there"));
}

#[tokio::test]
async fn test_history_is_replayed_into_prompt() {
    let model = ScriptedModel::reply(["ok"]);
    let agent = agent_with(model.clone(), InMemoryStorage::new());

    let first = agent.run(RunInput::new("first")).await.unwrap();
    agent
        .run(RunInput::new("second").with_session_id(first.session_id.clone()))
        .await
        .unwrap();

    let prompts = model.prompts();
    assert_eq!(prompts.len(), 2);

    let second = &prompts[1];
    let roles: Vec<Role> = second.iter().map(|m| m.role).collect();
    assert_eq!(
        roles,
        vec![Role::System, Role::User, Role::Assistant, Role::User]
    );
    assert_eq!(second[1].content, "first");
    assert_eq!(second[2].content, "ok");
    assert_eq!(second[3].content, "second");
}

#[tokio::test]
async fn test_history_runs_zero_sends_only_new_message() {
    let model = ScriptedModel::reply(["ok"]);
    let agent = Agent::new(
        AgentConfig::new("assistant").with_history_runs(0),
        Arc::new(model.clone()),
        Arc::new(InMemoryStorage::new()),
    );

    let first = agent.run(RunInput::new("first")).await.unwrap();
    agent
        .run(RunInput::new("second").with_session_id(first.session_id))
        .await
        .unwrap();

    assert_eq!(model.prompts()[1], vec![ChatMessage::user("second")]);
}

#[tokio::test]
async fn test_run_stream_event_order() {
    let agent = agent_with(ScriptedModel::reply(["a", "b"]), InMemoryStorage::new());

    let events: Vec<RunEvent> = agent
        .run_stream(RunInput::new("hi").with_run_id("run-1").with_session_id("s-1"))
        .collect()
        .await;

    assert_eq!(events.len(), 4);
    assert!(matches!(&events[0], RunEvent::RunStarted { model, .. } if model == "scripted"));
    assert!(matches!(&events[1], RunEvent::RunContent { content, .. } if content == "a"));
    assert!(matches!(&events[2], RunEvent::RunContent { content, .. } if content == "b"));
    assert!(matches!(&events[3], RunEvent::RunCompleted { content, .. } if content == "ab"));
    assert!(events.iter().all(|e| e.run_id() == "run-1" && e.session_id() == "s-1"));
}

#[tokio::test]
async fn test_model_failure_is_recorded() {
    let storage = InMemoryStorage::new();
    let agent = agent_with(ScriptedModel::failing("upstream down"), storage.clone());

    let err = agent
        .run(RunInput::new("hi").with_session_id("s-1"))
        .await
        .unwrap_err();
    assert!(matches!(&err, AgentError::Model(e) if e.to_string().contains("upstream down")));

    let session = storage.get_session("s-1").await.unwrap().unwrap();
    assert_eq!(session.runs[0].status, RunStatus::Failed);
    assert!(session.history(10).is_empty());
}

#[tokio::test]
async fn test_empty_input_rejected() {
    let storage = InMemoryStorage::new();
    let agent = agent_with(ScriptedModel::reply(["ok"]), storage.clone());

    let err = agent.run(RunInput::new("   ")).await.unwrap_err();
    assert!(matches!(err, AgentError::EmptyInput));

    let events: Vec<RunEvent> = agent.run_stream(RunInput::new("")).collect().await;
    assert_eq!(events.len(), 1);
    assert!(matches!(events[0], RunEvent::RunError { .. }));
    assert!(storage.is_empty().await);
}

#[tokio::test]
async fn test_session_of_other_agent_rejected() {
    let storage = InMemoryStorage::new();
    storage
        .upsert_session(Session::new("shared", "someone-else", None))
        .await
        .unwrap();
    let agent = agent_with(ScriptedModel::reply(["ok"]), storage);

    let err = agent
        .run(RunInput::new("hi").with_session_id("shared"))
        .await
        .unwrap_err();
    assert!(matches!(&err, AgentError::SessionMismatch { owner, .. } if owner == "someone-else"));
}

#[tokio::test]
async fn test_stream_reports_model_failure_after_start() {
    let agent = agent_with(ScriptedModel::failing("upstream down"), InMemoryStorage::new());

    let events: Vec<RunEvent> = agent.run_stream(RunInput::new("hi")).collect().await;
    assert_eq!(events.len(), 2);
    assert!(matches!(events[0], RunEvent::RunStarted { .. }));
    assert!(matches!(&events[1], RunEvent::RunError { error, .. } if error.contains("upstream down")));
}

/// Model that waits before answering, so concurrent runs overlap
struct SlowModel;

#[async_trait::async_trait]
impl ChatModel for SlowModel {
    fn id(&self) -> &str {
        "slow"
    }

    async fn stream(&self, _messages: &[ChatMessage]) -> crate::model::ModelResult<crate::model::DeltaStream> {
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        Ok(futures_util::stream::iter([Ok("ok".to_string())]).boxed())
    }
}

#[tokio::test]
async fn test_concurrent_runs_on_one_session_are_all_recorded() {
    let storage = InMemoryStorage::new();
    let agent = Agent::new(
        AgentConfig::new("assistant"),
        Arc::new(SlowModel),
        Arc::new(storage.clone()),
    );

    let runs = (0..10).map(|i| {
        let agent = agent.clone();
        async move {
            agent
                .run(RunInput::new(format!("q{i}")).with_session_id("s"))
                .await
        }
    });
    let outputs = futures_util::future::join_all(runs).await;
    assert!(outputs.iter().all(Result::is_ok));

    let session = storage.get_session("s").await.unwrap().unwrap();
    assert_eq!(session.runs.len(), 10);
    assert!(session.runs.iter().all(|r| r.status == RunStatus::Completed));
}

#[test]
fn test_agent_config_defaults() {
    let a = AgentConfig::default();
    let b = AgentConfig::default();
    assert_ne!(a.id, b.id);
    assert_eq!(a.history_runs, config::DEFAULT_HISTORY_RUNS);
    assert!(a.instructions.is_none());
}

#[test]
fn test_run_event_serialization() {
    let event = RunEvent::RunContent {
        run_id: "r".to_string(),
        session_id: "s".to_string(),
        content: "hi".to_string(),
    };
    let json = serde_json::to_value(&event).unwrap();
    assert_eq!(json["event"], "run_content");
    assert_eq!(json["content"], "hi");
}

#[test]
fn test_agent_error_display() {
    let err = AgentError::SessionMismatch {
        session_id: "s".to_string(),
        owner: "other".to_string(),
    };
    assert_eq!(err.to_string(), "Session s belongs to agent other");
}
