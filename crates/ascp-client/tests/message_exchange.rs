// Message exchange integration tests: send, send_and_wait, event draining,
// per-session reply ordering

mod common;

use ascp::PromptMessage;
use common::*;

#[tokio::test]
async fn test_send_and_wait_returns_terminal_reply() {
    init_tracing();
    let (client, _service) = test_stack();

    let session = client.create_session(None).await.unwrap();
    // 默认回显处理器原样返回提示
    let message = session
        .send_and_wait(PromptMessage::new("What is 2+2?"))
        .await
        .unwrap();
    assert_eq!(message.data.content, "What is 2+2?");
}

#[tokio::test]
async fn test_send_then_drain_matches_send_and_wait() {
    init_tracing();
    let (client, _service) = test_stack();

    let session = client.create_session(None).await.unwrap();

    // Async mode: enqueue, then drain the event stream to the final message
    let mut events = session.subscribe();
    let turn_id = session
        .send(PromptMessage::new("What is 7+7?"))
        .await
        .unwrap();
    let drained = events.final_message_for(&turn_id, 10).await.unwrap();

    // Sync mode on the same session yields the same content for the same prompt
    let waited = session
        .send_and_wait(PromptMessage::new("What is 7+7?"))
        .await
        .unwrap();
    assert_eq!(drained.data.content, waited.data.content);
}

#[tokio::test]
async fn test_replies_arrive_in_prompt_order() {
    init_tracing();
    let (client, _service) = test_stack();

    let session = client.create_session(None).await.unwrap();
    let mut events = session.subscribe();

    let mut turn_ids = Vec::new();
    for i in 0..5 {
        turn_ids.push(
            session
                .send(PromptMessage::new(format!("prompt {}", i)))
                .await
                .unwrap(),
        );
    }

    for expected in &turn_ids {
        let message = events.final_message(10).await.unwrap();
        assert_eq!(&message.turn_id, expected);
    }
}

#[tokio::test]
async fn test_abandoned_exchange_does_not_corrupt_session() {
    init_tracing();
    let (client, _service) = test_stack();

    let session = client.create_session(None).await.unwrap();

    // Enqueue a prompt whose reply nobody ever drains
    session
        .send(PromptMessage::new("nobody is listening"))
        .await
        .unwrap();

    // A later synchronous exchange on the same session still works
    let message = session
        .send_and_wait(PromptMessage::new("still alive?"))
        .await
        .unwrap();
    assert_eq!(message.data.content, "still alive?");
}

#[tokio::test]
async fn test_independent_sessions_do_not_cross_talk() {
    init_tracing();
    let (client, _service) = test_stack();

    let a = client.create_session(None).await.unwrap();
    let b = client.create_session(None).await.unwrap();

    let mut a_events = a.subscribe();
    b.send(PromptMessage::new("for b only")).await.unwrap();
    let a_turn = a.send(PromptMessage::new("for a only")).await.unwrap();

    // a 的事件流只看得到 a 的回复
    let message = a_events.final_message(10).await.unwrap();
    assert_eq!(message.turn_id, a_turn);
    assert_eq!(message.data.content, "for a only");
}
