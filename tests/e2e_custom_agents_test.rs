// E2E tests for custom agent configuration on session create and resume

mod e2e;

use ascp::{PromptMessage, SessionConfig};
use ascp_client::AscpClientError;
use e2e::*;

fn custom_agent_config(name: &str, infer: bool) -> SessionConfig {
    serde_json::from_value(serde_json::json!({
        "custom_agents": [{
            "name": name,
            "display_name": "Test Agent",
            "description": "A test agent for SDK testing",
            "prompt": "You are a helpful test agent.",
            "infer": infer,
        }]
    }))
    .unwrap()
}

/// Custom agent configuration is accepted on session create
#[tokio::test]
async fn test_custom_agent_configuration_on_session_create() {
    init_test_tracing();
    let stack = TestStack::start();

    let session = stack
        .client
        .create_session(Some(custom_agent_config("test-agent", true)))
        .await
        .expect("Failed to create session");

    assert!(!session.session_id().is_empty());

    // Simple interaction to verify session works
    let message = session
        .send_and_wait(PromptMessage::new("What is 5+5?"))
        .await
        .unwrap();
    assert!(message.data.content.contains("10"));

    session.destroy().await.unwrap();
}

/// Custom agent configuration is accepted on session resume
#[tokio::test]
async fn test_custom_agent_configuration_on_session_resume() {
    init_test_tracing();
    let stack = TestStack::start();

    // Create a session first
    let session1 = stack.client.create_session(None).await.unwrap();
    let session_id = session1.session_id().to_string();
    session1
        .send_and_wait(PromptMessage::new("What is 1+1?"))
        .await
        .unwrap();

    // Resume with custom agents
    let session2 = stack
        .client
        .resume_session(&session_id, Some(custom_agent_config("resume-agent", false)))
        .await
        .expect("Failed to resume session");

    assert_eq!(session2.session_id(), session_id);

    let message = session2
        .send_and_wait(PromptMessage::new("What is 6+6?"))
        .await
        .unwrap();
    assert!(message.data.content.contains("12"));

    session2.destroy().await.unwrap();
}

/// A duplicate agent name across create and resume is a configuration error
#[tokio::test]
async fn test_duplicate_agent_name_across_create_and_resume() {
    init_test_tracing();
    let stack = TestStack::start();

    let session = stack
        .client
        .create_session(Some(custom_agent_config("test-agent", false)))
        .await
        .unwrap();

    let err = stack
        .client
        .resume_session(session.session_id(), Some(custom_agent_config("test-agent", false)))
        .await
        .unwrap_err();
    assert!(matches!(err, AscpClientError::Configuration(_)));

    session.destroy().await.unwrap();
}

/// Resuming twice with disjoint agent names keeps every agent addressable
#[tokio::test]
async fn test_disjoint_resumes_keep_agents_addressable() {
    init_test_tracing();
    let stack = TestStack::start();

    let session = stack.client.create_session(None).await.unwrap();
    let session_id = session.session_id().to_string();

    stack
        .client
        .resume_session(&session_id, Some(custom_agent_config("agent-one", false)))
        .await
        .unwrap();
    let session = stack
        .client
        .resume_session(&session_id, Some(custom_agent_config("agent-two", true)))
        .await
        .unwrap();

    assert_eq!(session.session_id(), session_id);

    let record = stack.service.store().get(&session_id).unwrap();
    assert!(record.find_agent("agent-one").is_some());
    assert!(record.find_agent("agent-two").is_some());

    // The session still services prompts after both merges
    let message = session
        .send_and_wait(PromptMessage::new("What is 4+4?"))
        .await
        .unwrap();
    assert!(message.data.content.contains('8'));

    session.destroy().await.unwrap();
}
