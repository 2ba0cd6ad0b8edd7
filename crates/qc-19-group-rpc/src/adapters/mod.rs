//! # Adapters Layer
//!
//! Conversions from group-manager failures into JSON-RPC errors.

pub mod error_conversions;

pub use error_conversions::unservable_error;
