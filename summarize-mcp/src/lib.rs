// summarize-mcp - speak text summaries aloud from an MCP client

pub mod config;
pub mod mcp;
pub mod player;
pub mod scratch;
pub mod state;
pub mod tools;
pub mod tts;
pub mod voice;
