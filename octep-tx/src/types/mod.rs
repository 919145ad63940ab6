//! Hardware record codec.
//!
//! Pure, stateless encode/decode of the fixed binary layouts the device
//! parses: instruction header, transmit metadata, gather list record and
//! the 64-byte instruction. All layouts are little-endian.

pub mod repr_c;
pub mod instr_hdr;
pub mod tx_mdata;
pub mod sglist;
pub mod tx_desc;
pub mod result;

// Re-exports
pub use repr_c::{TxDescHw, SgListHw, TX_DESC_SIZE, SG_DESC_SIZE, TX_MDATA_SIZE};
pub use instr_hdr::{InstrHdr, TLEN_MAX, PKIND_MAX, FSZ_MAX, GSZ_MAX};
pub use tx_mdata::{OffloadFlags, TxMdata};
pub use sglist::{SgListDesc, SG_ENTRIES_PER_DESC, sg_descs_for, sg_descs_per_pkt};
pub use tx_desc::{TxDesc, TX_DESC_WORDS};
pub use result::IqSendStatus;
