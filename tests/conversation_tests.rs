// Integration tests for the conversation store
//
// These tests verify the history cap invariant, system-prompt injection,
// and the retract-from-message deletion semantics.

use voice_agent::conversation::{ConversationStore, Role};
use voice_agent::error::AgentError;

const CLIENT: &str = "client-a";

#[tokio::test]
async fn test_history_cap_invariant() {
    let max_pairs = 3;
    let store = ConversationStore::new("prompt", max_pairs);

    for i in 0..20 {
        store.append_user(CLIENT, format!("question {i}")).await;
        store.append_assistant(CLIENT, format!("answer {i}")).await;

        let history = store.history(CLIENT).await;
        assert!(
            history.len() <= max_pairs * 2,
            "history length {} exceeds cap",
            history.len()
        );
    }

    // The retained messages are the most recent ones, in original order.
    let history = store.history(CLIENT).await;
    assert_eq!(history.len(), max_pairs * 2);
    assert_eq!(history[0].text, "question 17");
    assert_eq!(history[1].text, "answer 17");
    assert_eq!(history[4].text, "question 19");
    assert_eq!(history[5].text, "answer 19");
}

#[tokio::test]
async fn test_tool_messages_are_evicted_with_their_turn() {
    let store = ConversationStore::new("prompt", 2);

    // Turn 0 includes two tool results between user and assistant.
    store.append_user(CLIENT, "question 0").await;
    store.append_tool(CLIENT, "tool result a").await;
    store.append_tool(CLIENT, "tool result b").await;
    store.append_assistant(CLIENT, "answer 0").await;

    store.append_user(CLIENT, "question 1").await;
    store.append_assistant(CLIENT, "answer 1").await;

    // This append pushes past the cap; turn 0 goes away whole.
    store.append_user(CLIENT, "question 2").await;
    store.append_assistant(CLIENT, "answer 2").await;

    let history = store.history(CLIENT).await;
    assert_eq!(history.len(), 4);
    assert_eq!(history[0].text, "question 1");
    assert!(history.iter().all(|m| m.role != Role::Tool));
}

#[tokio::test]
async fn test_tool_append_does_not_trim_mid_turn() {
    let store = ConversationStore::new("prompt", 1);

    store.append_user(CLIENT, "question 0").await;
    store.append_assistant(CLIENT, "answer 0").await;
    store.append_user(CLIENT, "question 1").await;

    // Mid-turn tool results may exceed the cap without eviction.
    for i in 0..4 {
        store.append_tool(CLIENT, format!("tool result {i}")).await;
    }
    assert!(store.history(CLIENT).await.len() > 2);

    // The turn completes with its tool results intact; only user and
    // assistant messages count toward the cap.
    store.append_assistant(CLIENT, "answer 1").await;
    let history = store.history(CLIENT).await;
    let counted = history.iter().filter(|m| m.role != Role::Tool).count();
    assert!(counted <= 2);
    assert_eq!(history[0].text, "question 1");
    assert_eq!(history.last().expect("non-empty").text, "answer 1");
}

#[tokio::test]
async fn test_build_context_prepends_system_prompt() {
    let store = ConversationStore::new("you are a helpful assistant", 5);
    store.append_user(CLIENT, "hello").await;

    let context = store.build_context(CLIENT).await;
    assert_eq!(context.len(), 2);
    assert_eq!(context[0].role, Role::System);
    assert_eq!(context[0].text, "you are a helpful assistant");
    assert_eq!(context[1].role, Role::User);

    // The system prompt is synthetic: it never lands in stored history.
    let history = store.history(CLIENT).await;
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].role, Role::User);
}

#[tokio::test]
async fn test_build_context_does_not_mutate_history() {
    let store = ConversationStore::new("prompt", 5);
    store.append_user(CLIENT, "hello").await;

    let before = store.history(CLIENT).await;
    let _ = store.build_context(CLIENT).await;
    let _ = store.build_context(CLIENT).await;
    let after = store.history(CLIENT).await;

    assert_eq!(before.len(), after.len());
    assert_eq!(before[0].id, after[0].id);
}

#[tokio::test]
async fn test_delete_from_removes_message_and_everything_after() {
    let store = ConversationStore::new("prompt", 10);
    store.append_user(CLIENT, "first").await;
    let target = store.append_assistant(CLIENT, "second").await;
    store.append_user(CLIENT, "third").await;
    store.append_assistant(CLIENT, "fourth").await;

    store
        .delete_from(CLIENT, &target.id)
        .await
        .expect("message exists");

    let history = store.history(CLIENT).await;
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].text, "first");
}

#[tokio::test]
async fn test_delete_from_unknown_id_errors() {
    let store = ConversationStore::new("prompt", 10);
    store.append_user(CLIENT, "hello").await;

    let result = store.delete_from(CLIENT, "no-such-id").await;
    assert!(matches!(result, Err(AgentError::HistoryNotFound(_))));

    // And for a client that has no history at all.
    let result = store.delete_from("stranger", "no-such-id").await;
    assert!(matches!(result, Err(AgentError::HistoryNotFound(_))));
}

#[tokio::test]
async fn test_clear_removes_all_history() {
    let store = ConversationStore::new("prompt", 10);
    store.append_user(CLIENT, "hello").await;
    store.append_assistant(CLIENT, "hi").await;

    store.clear(CLIENT).await;
    assert!(store.history(CLIENT).await.is_empty());
}

#[tokio::test]
async fn test_messages_get_fresh_ids_and_timestamps() {
    let store = ConversationStore::new("prompt", 10);
    let a = store.append_user(CLIENT, "one").await;
    let b = store.append_user(CLIENT, "one").await;

    assert_ne!(a.id, b.id);
    assert!(a.timestamp <= b.timestamp);
}

#[tokio::test]
async fn test_histories_are_per_client() {
    let store = ConversationStore::new("prompt", 10);
    store.append_user("client-a", "from a").await;
    store.append_user("client-b", "from b").await;

    assert_eq!(store.history("client-a").await.len(), 1);
    assert_eq!(store.history("client-b").await.len(), 1);
    store.clear("client-a").await;
    assert_eq!(store.history("client-b").await.len(), 1);
}
