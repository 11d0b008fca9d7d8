//! Firasah: classical physiognomy face reading
//!
//! This library provides the core functionality for the firasah system:
//! a two-stage AI inference pipeline that turns a face photo into a
//! Kitab Firasat character narrative. Stage one sends the image to a
//! vision model (Replicate LLaVA) for a facial feature description;
//! stage two runs that description through a fallback chain of LLM
//! providers (Gemini, OpenAI, Anthropic) and persists the structured
//! interpretation for polling.

pub mod app_state;
pub mod client;
pub mod config;
pub mod db;
pub mod models;
pub mod routes;
pub mod services;
