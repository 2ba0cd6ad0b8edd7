//! # Integration Tests
//!
//! Group manager and group RPC wired together the way a node wires them:
//! one registry, one controller, one dispatcher.
//!
//! ## Flows Tested
//!
//! 1. **Lifecycle**: generate, start, stop, remove, recover with their status codes
//! 2. **Dispatch**: group-scoped queries against groups in every state
//! 3. **Proofs**: transaction and receipt proofs recompute to the block roots
//! 4. **Boot**: a fresh registry rebuilt from persisted group files

#[cfg(test)]
mod fixtures;

#[cfg(test)]
mod concurrency;
#[cfg(test)]
mod http_flow;
#[cfg(test)]
mod recovery;
#[cfg(test)]
mod scenarios;
