// Session lifecycle integration tests against an in-process session service

mod common;

use ascp::{ConfigError, SessionConfig};
use ascp_client::AscpClientError;
use common::*;

fn config_with_agent(name: &str) -> SessionConfig {
    serde_json::from_value(serde_json::json!({
        "custom_agents": [{
            "name": name,
            "display_name": name,
            "description": "",
            "prompt": format!("You are {}.", name),
        }]
    }))
    .unwrap()
}

#[tokio::test]
async fn test_create_issues_fresh_session_ids() {
    init_tracing();
    let (client, _service) = test_stack();

    let a = client.create_session(None).await.unwrap();
    let b = client.create_session(None).await.unwrap();

    assert!(!a.session_id().is_empty());
    assert_ne!(a.session_id(), b.session_id());
}

#[tokio::test]
async fn test_resume_returns_equal_session_id() {
    init_tracing();
    let (client, _service) = test_stack();

    let session = client.create_session(None).await.unwrap();
    let session_id = session.session_id().to_string();

    let resumed = client.resume_session(&session_id, None).await.unwrap();
    assert_eq!(resumed.session_id(), session_id);
}

#[tokio::test]
async fn test_resume_unknown_id_is_session_not_found() {
    init_tracing();
    let (client, _service) = test_stack();

    let err = client.resume_session("missing", None).await.unwrap_err();
    assert!(matches!(err, AscpClientError::SessionNotFound(_)));
}

#[tokio::test]
async fn test_invalid_config_fails_locally_before_io() {
    init_tracing();
    let (client, service) = test_stack();

    let mut config = SessionConfig::default();
    config.custom_agents.push(ascp::CustomAgentConfig {
        name: String::new(),
        display_name: "Nameless".to_string(),
        description: String::new(),
        prompt: "p".to_string(),
        infer: false,
    });

    let err = client.create_session(Some(config)).await.unwrap_err();
    match err {
        AscpClientError::Configuration(msg) => {
            assert_eq!(msg, ConfigError::EmptyAgentName.to_string());
        }
        other => panic!("expected configuration error, got {:?}", other),
    }

    // The backend never saw the call: no partially-initialized session exists
    assert_eq!(service.store().stats().total, 0);
}

#[tokio::test]
async fn test_destroyed_handle_rejects_all_operations() {
    init_tracing();
    let (client, _service) = test_stack();

    let session = client.create_session(None).await.unwrap();
    session.destroy().await.unwrap();
    assert!(session.is_destroyed());

    let err = session
        .send(ascp::PromptMessage::new("hello"))
        .await
        .unwrap_err();
    assert!(matches!(err, AscpClientError::SessionDestroyed(_)));

    let err = session
        .send_and_wait(ascp::PromptMessage::new("hello"))
        .await
        .unwrap_err();
    assert!(matches!(err, AscpClientError::SessionDestroyed(_)));

    let err = session.destroy().await.unwrap_err();
    assert!(matches!(err, AscpClientError::SessionDestroyed(_)));
}

#[tokio::test]
async fn test_resume_after_destroy_is_session_not_found() {
    init_tracing();
    let (client, _service) = test_stack();

    let session = client.create_session(None).await.unwrap();
    let session_id = session.session_id().to_string();
    session.destroy().await.unwrap();

    let err = client.resume_session(&session_id, None).await.unwrap_err();
    assert!(matches!(err, AscpClientError::SessionNotFound(_)));
}

#[tokio::test]
async fn test_duplicate_agent_across_create_and_resume() {
    init_tracing();
    let (client, _service) = test_stack();

    let session = client
        .create_session(Some(config_with_agent("dup")))
        .await
        .unwrap();

    let err = client
        .resume_session(session.session_id(), Some(config_with_agent("dup")))
        .await
        .unwrap_err();
    assert!(matches!(err, AscpClientError::Configuration(_)));

    // The session itself stays usable after the rejected resume
    let resumed = client
        .resume_session(session.session_id(), Some(config_with_agent("other")))
        .await
        .unwrap();
    assert_eq!(resumed.session_id(), session.session_id());
}

#[tokio::test]
async fn test_disjoint_resumes_accumulate_agents() {
    init_tracing();
    let (client, service) = test_stack();

    let session = client
        .create_session(Some(config_with_agent("first")))
        .await
        .unwrap();
    client
        .resume_session(session.session_id(), Some(config_with_agent("second")))
        .await
        .unwrap();
    client
        .resume_session(session.session_id(), Some(config_with_agent("third")))
        .await
        .unwrap();

    let record = service.store().get(session.session_id()).unwrap();
    for name in ["first", "second", "third"] {
        assert!(record.find_agent(name).is_some(), "agent {} lost", name);
    }
}
