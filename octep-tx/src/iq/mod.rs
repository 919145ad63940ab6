//! Instruction queue: the transmit ring and everything that feeds it.

pub mod stats;
pub mod packet;
pub mod pending;
pub mod ring;
pub mod queue;

pub use stats::IqStats;
pub use packet::{FragmentedBuffer, TxBuffer, TxOffload, TxPacket};
pub use pending::{PendingTable, Released, TxBufType};
pub use ring::{InstrRing, IqState, Posted, RingIndices};
pub use queue::{ReclaimResult, TxAccepted, TxQueue};
