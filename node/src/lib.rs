//! The peershare node: all runtime behavior behind the wire protocol.
//!
//! The crate wires the pure pieces (election, consensus, ledger) to the
//! network: a TCP listener dispatches inbound messages, a periodic driver
//! runs election and rotation cycles, and the transfer module implements
//! the user-facing upload and share flows. All mutable state lives in one
//! [`state::NodeState`] behind one mutex.

pub mod clock;
pub mod config;
pub mod context;
pub mod dispatcher;
pub mod driver;
pub mod error;
pub mod logging;
pub mod node;
pub mod server;
pub mod shutdown;
pub mod state;
pub mod transfer;

pub use clock::{Clock, SystemClock};
pub use config::NodeConfig;
pub use context::{Collaborators, NodeContext};
pub use error::NodeError;
pub use logging::{init_logging, LogFormat};
pub use node::PeerNode;
pub use shutdown::ShutdownController;
pub use state::NodeState;
