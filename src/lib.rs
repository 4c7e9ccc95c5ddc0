//! Billing Engine - Subscription Payment Lifecycle Service
//!
//! Reconciles asynchronous payment-provider webhook events against a durable
//! subscription state machine, and drives the same state machine from direct
//! user commands and a periodic expiration sweep.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
