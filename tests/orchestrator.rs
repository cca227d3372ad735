//! End-to-end agent loop behavior with scripted gateways.

mod common;

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;

use docent::agent::Orchestrator;
use docent::config::AgentConfig;
use docent::gateways::ChatTurn;
use docent::message::Message;
use docent::retrieval::{RankedDocument, ScoredChunk};
use docent::store::{ChatStore, StoredMessage};
use docent::tools::ToolRegistry;

use common::{
    EchoTool, FailingTool, RetrievalTool, ScriptedLlm, TurnScript, tool_request,
};

fn orchestrator(
    llm: Arc<ScriptedLlm>,
    registry: ToolRegistry,
    config: AgentConfig,
) -> Orchestrator {
    Orchestrator::new(llm, Arc::new(registry), ChatStore::new(), config)
}

/// Give the chat an earlier exchange so the run under test is not the
/// first one and no background title task competes for scripted turns.
async fn seed_chat(orch: &Orchestrator, chat_id: &str) {
    let store = orch.store();
    store.ensure_chat(chat_id, "seeded system prompt").await;
    store
        .append(chat_id, StoredMessage::new(Message::user("earlier question")))
        .await;
    store
        .append(
            chat_id,
            StoredMessage::new(Message::assistant("earlier answer")),
        )
        .await;
}

fn chunk(index: u32, similarity: f32, content: &str) -> ScoredChunk {
    ScoredChunk {
        content: content.to_string(),
        similarity,
        chunk_index: index,
        text_relevance: 1.0,
    }
}

fn ranked_doc(filename: &str, chunks: Vec<ScoredChunk>) -> RankedDocument {
    RankedDocument {
        document_id: "d1".to_string(),
        filename: filename.to_string(),
        document_type: None,
        max_similarity: chunks
            .iter()
            .map(|c| c.similarity)
            .fold(0.0, f32::max),
        chunk_count: chunks.len(),
        chunks: chunks.clone(),
        best_chunks: chunks,
        preview: "preview".to_string(),
    }
}

#[tokio::test]
async fn direct_answer_without_tools() {
    let llm = Arc::new(ScriptedLlm::new());
    llm.push_reply(ChatTurn::text("Paris is the capital of France."));
    let orch = orchestrator(Arc::clone(&llm), ToolRegistry::new(), AgentConfig::default());
    seed_chat(&orch, "c1").await;

    let answer = orch.generate("c1", "What is the capital of France?").await;

    assert_eq!(answer.content, "Paris is the capital of France.");
    assert_eq!(answer.role, Message::ASSISTANT);
    assert!(answer.tool_calls.is_empty());
    assert!(answer.sources.is_empty());
    assert_eq!(llm.chat_call_count(), 1);

    // system + seeded exchange + user + assistant
    let history = orch.store().history("c1").await;
    assert_eq!(history.len(), 5);
    assert!(history[0].has_role(Message::SYSTEM));
    assert_eq!(history.last().unwrap().content, answer.content);
}

#[tokio::test]
async fn tool_round_then_final_answer() {
    let llm = Arc::new(ScriptedLlm::new());
    llm.push_reply(tool_request("echo", json!({})));
    llm.push_reply(ChatTurn::text("Grounded answer."));
    let registry = ToolRegistry::new().with(Arc::new(EchoTool::new("tool says hi")));
    let orch = orchestrator(Arc::clone(&llm), registry, AgentConfig::default());
    seed_chat(&orch, "c1").await;

    let answer = orch.generate("c1", "question").await;

    assert_eq!(answer.content, "Grounded answer.");
    assert_eq!(answer.tool_calls.len(), 1);
    assert!(answer.tool_calls[0].success);
    assert_eq!(answer.tool_calls[0].output.as_deref(), Some("tool says hi"));
    assert_eq!(
        answer.reasoning.as_deref(),
        Some("Used 1 tool(s) to gather information: echo")
    );
    assert_eq!(llm.chat_call_count(), 2);

    // The tool result enters the history framed with the grounding
    // preamble.
    let history = orch.store().history("c1").await;
    let tool_message = history
        .iter()
        .find(|m| m.has_role(Message::TOOL))
        .expect("tool message in history");
    assert!(tool_message
        .content
        .starts_with("TOOL OUTPUT - USE ONLY THIS INFORMATION:"));
    assert!(tool_message.content.contains("tool says hi"));
}

#[tokio::test]
async fn all_failed_round_falls_back_to_tool_free_call() {
    let llm = Arc::new(ScriptedLlm::new());
    llm.push_reply(tool_request("failing", json!({})));
    llm.push_reply(ChatTurn::text("Answer without tools."));
    let registry = ToolRegistry::new().with(Arc::new(FailingTool));
    let orch = orchestrator(Arc::clone(&llm), registry, AgentConfig::default());
    seed_chat(&orch, "c1").await;

    let answer = orch.generate("c1", "question").await;

    assert_eq!(answer.content, "Answer without tools.");
    assert_eq!(answer.tool_calls.len(), 1);
    assert!(!answer.tool_calls[0].success);
    assert!(
        answer.tool_calls[0]
            .error
            .as_deref()
            .unwrap()
            .contains("scripted failure")
    );
    assert_eq!(llm.chat_call_count(), 2);
}

#[tokio::test]
async fn unknown_tool_is_recorded_and_loop_stops() {
    let llm = Arc::new(ScriptedLlm::new());
    llm.push_reply(tool_request("nope", json!({})));
    llm.push_reply(ChatTurn::text("Recovered."));
    let orch = orchestrator(Arc::clone(&llm), ToolRegistry::new(), AgentConfig::default());
    seed_chat(&orch, "c1").await;

    let answer = orch.generate("c1", "question").await;

    assert_eq!(answer.content, "Recovered.");
    assert_eq!(
        answer.tool_calls[0].error.as_deref(),
        Some("Function nope not found")
    );
    assert_eq!(llm.chat_call_count(), 2);
}

#[tokio::test]
async fn iteration_cap_triggers_finalization_call() {
    let llm = Arc::new(ScriptedLlm::new());
    llm.push_reply(tool_request("echo", json!({})));
    llm.push_reply(tool_request("echo", json!({})));
    llm.push_reply(ChatTurn::text("Capped answer."));
    let registry = ToolRegistry::new().with(Arc::new(EchoTool::new("ok")));
    let config = AgentConfig::default().with_max_iterations(2);
    let orch = orchestrator(Arc::clone(&llm), registry, config);
    seed_chat(&orch, "c1").await;

    let answer = orch.generate("c1", "question").await;

    // Two tool rounds plus exactly one tool-free finalization call.
    assert_eq!(llm.chat_call_count(), 3);
    assert_eq!(answer.content, "Capped answer.");
    assert_eq!(answer.tool_calls.len(), 2);
    assert!(!answer.content.is_empty());
}

#[tokio::test]
async fn model_timeout_becomes_fallback_content() {
    let llm = Arc::new(ScriptedLlm::new());
    llm.push_turn(TurnScript::Hang);
    let config = AgentConfig::default().with_llm_timeout(Duration::from_millis(50));
    let orch = orchestrator(Arc::clone(&llm), ToolRegistry::new(), config);
    seed_chat(&orch, "c1").await;

    let answer = orch.generate("c1", "question").await;

    assert!(answer.content.contains("took too long"));
    assert_eq!(llm.chat_call_count(), 1);
    // The fallback is still persisted as the assistant turn.
    let history = orch.store().history("c1").await;
    assert_eq!(history.last().unwrap().content, answer.content);
}

#[tokio::test]
async fn transport_error_is_folded_into_content() {
    let llm = Arc::new(ScriptedLlm::new());
    llm.push_turn(TurnScript::Fail("connection refused".to_string()));
    let orch = orchestrator(Arc::clone(&llm), ToolRegistry::new(), AgentConfig::default());

    let answer = orch.generate("c1", "question").await;

    assert!(answer.content.contains("An error occurred"));
    assert!(answer.content.contains("connection refused"));
    assert!(answer.reasoning.as_deref().unwrap().contains("Error occurred"));
}

#[tokio::test]
async fn transport_error_keeps_earlier_tool_usage_summary() {
    let llm = Arc::new(ScriptedLlm::new());
    llm.push_reply(tool_request("echo", json!({})));
    llm.push_turn(TurnScript::Fail("connection refused".to_string()));
    let registry = ToolRegistry::new().with(Arc::new(EchoTool::new("tool says hi")));
    let orch = orchestrator(Arc::clone(&llm), registry, AgentConfig::default());
    seed_chat(&orch, "c1").await;

    let answer = orch.generate("c1", "question").await;

    // The error note adds to the summary of the successful round
    // instead of replacing it.
    let reasoning = answer.reasoning.as_deref().unwrap();
    assert!(reasoning.contains("Used 1 tool(s) to gather information: echo"));
    assert!(reasoning.contains("Error occurred: connection refused"));
    assert!(answer.content.contains("connection refused"));
}

#[tokio::test]
async fn empty_final_content_gets_apology() {
    let llm = Arc::new(ScriptedLlm::new());
    llm.push_reply(ChatTurn::text(""));
    let orch = orchestrator(Arc::clone(&llm), ToolRegistry::new(), AgentConfig::default());

    let answer = orch.generate("c1", "question").await;
    assert!(answer.content.contains("could not generate an answer"));
}

#[tokio::test]
async fn oversized_tool_output_is_truncated_in_history_only() {
    let long_output = "z".repeat(100);
    let llm = Arc::new(ScriptedLlm::new());
    llm.push_reply(tool_request("echo", json!({})));
    llm.push_reply(ChatTurn::text("done"));
    let registry = ToolRegistry::new().with(Arc::new(EchoTool::new(long_output.clone())));
    let config = AgentConfig::default().with_max_tool_output_chars(20);
    let orch = orchestrator(Arc::clone(&llm), registry, config);

    let answer = orch.generate("c1", "question").await;

    // The record keeps the full output.
    assert_eq!(answer.tool_calls[0].output.as_deref(), Some(long_output.as_str()));

    // The history copy is clipped at the threshold plus the marker.
    let history = orch.store().history("c1").await;
    let tool_message = history.iter().find(|m| m.has_role(Message::TOOL)).unwrap();
    assert!(tool_message
        .content
        .contains("[... response truncated due to length ...]"));
    assert!(tool_message.content.contains(&"z".repeat(20)));
    assert!(!tool_message.content.contains(&"z".repeat(21)));
}

#[tokio::test]
async fn retrieval_outputs_surface_as_sources() {
    let documents = vec![ranked_doc(
        "registry.pdf",
        vec![chunk(4, 0.91, "vessel Aurora"), chunk(7, 0.82, "owner records")],
    )];
    let llm = Arc::new(ScriptedLlm::new());
    llm.push_reply(tool_request("search_documents", json!({"query": "vessel"})));
    llm.push_reply(ChatTurn::text("The vessel is Aurora."));
    let registry = ToolRegistry::new().with(Arc::new(RetrievalTool {
        documents,
        rendered: "Found 1 documents matching 'vessel'".to_string(),
    }));
    let orch = orchestrator(Arc::clone(&llm), registry, AgentConfig::default());

    let answer = orch.generate("c1", "what vessel?").await;

    assert_eq!(answer.sources.len(), 2);
    assert!(answer.sources.iter().all(|s| s.filename == "registry.pdf"));
    assert_eq!(answer.sources[0].chunk_index, 4);
    assert_eq!(answer.sources[1].content, "owner records");
}

#[tokio::test]
async fn first_exchange_spawns_title_generation() {
    let llm = Arc::new(ScriptedLlm::new());
    llm.push_reply(ChatTurn::text("The answer."));
    llm.push_reply(ChatTurn::text("\"Vessel Ownership\""));
    let orch = orchestrator(Arc::clone(&llm), ToolRegistry::new(), AgentConfig::default());

    orch.generate("c1", "who owns the vessel?").await;

    // The title task runs in the background.
    for _ in 0..50 {
        if llm.chat_call_count() >= 2 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    tokio::time::sleep(Duration::from_millis(20)).await;

    let session = orch.store().get_chat("c1").await.unwrap();
    assert_eq!(session.title.as_deref(), Some("Vessel Ownership"));
}

#[tokio::test]
async fn second_exchange_does_not_touch_the_title() {
    let llm = Arc::new(ScriptedLlm::new());
    llm.push_reply(ChatTurn::text("first"));
    llm.push_reply(ChatTurn::text("generated title"));
    llm.push_reply(ChatTurn::text("second"));
    let orch = orchestrator(Arc::clone(&llm), ToolRegistry::new(), AgentConfig::default());

    orch.generate("c1", "one").await;
    for _ in 0..50 {
        if llm.chat_call_count() >= 2 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    tokio::time::sleep(Duration::from_millis(20)).await;
    orch.generate("c1", "two").await;
    tokio::time::sleep(Duration::from_millis(50)).await;

    // Only three chat calls: two answers and one title.
    assert_eq!(llm.chat_call_count(), 3);
}
