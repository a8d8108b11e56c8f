// Startup configuration
pub mod config;

// LLM abstraction layer and conversation orchestration
pub mod llm;

// Interactive front end
pub mod repl;

// Weather data client and tools
pub mod weather;
