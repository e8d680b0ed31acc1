//! Terminal presentation of conversation state.
//!
//! Ownership boundary: this layer only reads messages and widgets produced by
//! [`crate::core`]; it never changes routing, protocol, or conversation state.

pub mod render;
