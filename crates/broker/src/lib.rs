//! Publish/subscribe channels for the saga services.
//!
//! The [`Broker`] trait is the seam between the services and the message
//! transport. [`NatsBroker`] is the production transport; [`InMemoryBroker`]
//! backs tests and single-process runs. [`ChannelReader`] turns a
//! subscription into a bounded, never-failing queue for a processing loop.

pub mod broker;
pub mod error;
pub mod memory;
pub mod message;
pub mod nats;
pub mod reader;

pub use broker::{Broker, MessageStream};
pub use common::Channel;
pub use error::{BrokerError, Result};
pub use memory::InMemoryBroker;
pub use message::{EXECUTION_ID_ATTRIBUTE, ExecutionScoped, Message, resolve_execution_id};
pub use nats::{NatsBroker, NatsConfig};
pub use reader::{ChannelReader, ReaderConfig, drain_errors};
