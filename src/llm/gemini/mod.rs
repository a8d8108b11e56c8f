//! Gemini provider implementation
//!
//! A client for Google's Gemini models over the public `generateContent`
//! REST API, implementing the `LlmProvider` trait.

pub mod client;
pub mod mapper;
pub mod types;

pub use client::{GeminiClient, GeminiModel};
