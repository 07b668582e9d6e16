//! paperlens: upload research papers, summarize them with a hosted language
//! model, and compare them side by side.
//!
//! The crate is layered leaf-first:
//!
//! - [`media`]: PDF text extraction
//! - [`llm`]: the inference provider seam, the hosted client and its cache
//! - [`analysis`]: prompt building, single-paper analysis and comparison
//! - [`session`]: per-user state, typed actions and the pure reducer
//! - [`web`]: the axum gateway that renders views and accepts form actions

pub mod analysis;
pub mod cli;
pub mod config;
pub mod error;
pub mod llm;
pub mod media;
pub mod session;
pub mod util;
pub mod web;
