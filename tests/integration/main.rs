//! Integration suite: fixture snapshots through adapters, supervisor,
//! merge, arbitrage, and rendering.

mod memory_feed;
mod pipeline;
mod supervisor;
