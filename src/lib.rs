//! Weather agent library
//!
//! Hourly weather fetching and typed readings, the tools and agent loop that
//! build forecasts from them, and the MCP server exposing the weather tool.

pub mod agent;
pub mod aws;
pub mod cli;
pub mod config;
pub mod data;
pub mod mcp;
pub mod prompts;
pub mod tools;
