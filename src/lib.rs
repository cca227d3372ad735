//! # Docent: Grounded Document-Chat Engine
//!
//! Docent is an engine for conversational question answering over a
//! private document collection. An agent loop alternates language-model
//! turns with tool execution, and a hybrid retrieval pipeline combines
//! semantic vector search with a lexical relevance pass so answers stay
//! grounded in what the documents actually say.
//!
//! ## Core Concepts
//!
//! - **Messages**: Communication primitives with role-based typing
//! - **Gateways**: Trait seams for the embedding model, vector store,
//!   language model, and document catalog
//! - **Retrieval**: Hybrid ranking of chunk hits into per-document results
//!   with previews and excerpts
//! - **Tools**: Model-invocable operations over documents and rules
//! - **Orchestrator**: The iteration-capped agent loop, blocking or
//!   streamed as typed events
//!
//! ## Quick Start
//!
//! ### Working with Messages
//!
//! ```
//! use docent::message::Message;
//!
//! let user_msg = Message::user("Who owns the vessel Aurora?");
//! let assistant_msg = Message::assistant("According to the registry...");
//! let system_msg = Message::system("You are a grounded assistant.");
//!
//! assert!(user_msg.has_role(Message::USER));
//! assert!(!user_msg.has_role(Message::ASSISTANT));
//! ```
//!
//! ### Driving a Conversation
//!
//! The orchestrator is built from injected gateways, a tool registry, and
//! a chat store:
//!
//! ```ignore
//! use std::sync::Arc;
//! use docent::agent::Orchestrator;
//! use docent::config::AgentConfig;
//! use docent::store::ChatStore;
//! use docent::tools::{SearchDocumentsTool, ToolRegistry};
//!
//! let registry = Arc::new(ToolRegistry::new().with(Arc::new(
//!     SearchDocumentsTool::new(engine),
//! )));
//! let orchestrator = Orchestrator::new(llm, registry, ChatStore::new(), AgentConfig::default());
//!
//! let answer = orchestrator.generate("chat-1", "Who owns the vessel Aurora?").await;
//! println!("{}", answer.content);
//! ```
//!
//! ### Streaming
//!
//! The same loop can surface progress as typed events:
//!
//! ```ignore
//! let events = orchestrator.generate_stream("chat-1", "Who owns the vessel Aurora?");
//! while let Ok(event) = events.recv_async().await {
//!     print!("{}", event.to_sse_frame()?);
//!     if event.is_terminal() {
//!         break;
//!     }
//! }
//! ```

pub mod agent;
pub mod config;
pub mod events;
pub mod gateways;
pub mod message;
pub mod retrieval;
pub mod store;
pub mod telemetry;
pub mod tools;
pub mod types;
