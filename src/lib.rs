//! # doc-search
//!
//! A Rust web service answering natural-language questions over vendor
//! technical documentation with a hybrid retrieval pipeline combining BM25
//! keyword search and vector semantic search.
//!
//! ## Architecture
//!
//! ```text
//!                      ┌─────────────┐
//!                      │   Question   │
//!                      └──────┬───────┘
//!                             │
//!                      ┌──────▼───────┐
//!                      │   Embedder   │  encode once
//!                      └──────┬───────┘
//!               ┌─────────────┴─────────────┐
//!               ▼                           ▼
//!      ┌─────────────────┐        ┌──────────────────┐
//!      │  Vector Index    │        │  Lexical Index   │
//!      │  cosine distance │        │  BM25, rebuilt   │
//!      │  over the store  │        │  on invalidation │
//!      └────────┬────────┘        └────────┬─────────┘
//!               │  2k candidates each       │
//!               └─────────────┬────────────┘
//!                             ▼
//!                  ┌──────────────────────┐
//!                  │  RRF Fusion          │
//!                  │  1/(k₀ + rank + 1)   │
//!                  │  tie-break: chunk id │
//!                  └──────────┬───────────┘
//!                             ▼
//!                  ┌──────────────────────┐
//!                  │  Top-k (chunks,      │
//!                  │  metadata) result    │
//!                  └──────────────────────┘
//! ```
//!
//! The chunk store is the single source of truth; both indices are derived
//! caches. The vector index reads the store live, the lexical index is a
//! versioned snapshot rebuilt whole after every ingestion or deletion.
//!
//! ## Module Overview
//!
//! - [`config`] - Environment-based configuration for server, chunking, and embedding settings
//! - [`models`] - Shared data types: `Chunk`, `FusedHit`, request/response types
//! - [`error`] - Typed error taxonomy for the retrieval core
//! - [`store`] - Durable chunk store with vendor/document filtering
//! - [`embedding`] - Embedder capability trait with Ollama and OpenAI backends
//! - [`search::bm25`] - In-memory BM25 index rebuilt from store snapshots
//! - [`search::vector`] - Cosine-distance nearest-neighbor search over the store
//! - [`search::fusion`] - Reciprocal Rank Fusion of the two rankings
//! - [`search::engine`] - Retrieval engine facade with the staleness contract
//! - [`ingest`] - Windowed chunking and the ingestion pipeline
//! - [`session`] - Bounded session history and query analytics
//! - [`api`] - Axum HTTP handlers for query, ingestion, and admin
//! - [`state`] - Shared application state

pub mod api;
pub mod config;
pub mod embedding;
pub mod error;
pub mod ingest;
pub mod models;
pub mod search;
pub mod session;
pub mod state;
pub mod store;
