//! # Ordertrack Testing
//!
//! In-memory fakes and harnesses for exercising the service without a broker:
//!
//! - [`ScriptedEventSource`]: an [`EventSource`](ordertrack_core::source::EventSource)
//!   whose connect/bind outcomes are scripted and whose session and consumer
//!   signals are emitted by the test
//! - [`RecordingSink`]: a projection sink that records every change
//!   notification
//! - [`ProjectionScenario`]: a harness running the decode → apply pipeline
//!   directly, for end-to-end assertions that need no supervision loops
//!
//! ## Example
//!
//! ```
//! use ordertrack_core::order::OrderState;
//! use ordertrack_testing::ProjectionScenario;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let scenario = ProjectionScenario::new();
//! scenario.create_order("42").await;
//! scenario.deliver("orders/order.validated", br#"{"id":"42"}"#).await.unwrap();
//! scenario.assert_state("42", OrderState::Validated).await;
//! # }
//! ```

#![allow(clippy::unwrap_used)] // Test infrastructure uses unwrap for simplicity
#![allow(clippy::missing_panics_doc)] // Test utilities panic on misuse by design

mod scenario;
mod sink;
mod source;

pub use scenario::ProjectionScenario;
pub use sink::RecordingSink;
pub use source::ScriptedEventSource;
