//! Core use-case services.
//!
//! # Responsibility
//! - Wrap the generic record store with entity-specific rules.
//! - Keep transport layers decoupled from storage details.

pub mod chat_service;
pub mod decision_service;
pub mod message_service;
