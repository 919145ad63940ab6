//! 64-byte transmit instruction.
//!
//! Only the first 16 bytes (`dptr` and the instruction header) are
//! mandatory; the transmit metadata and extra headers together form the
//! front data whose size the header's `fsz` field describes.

use super::instr_hdr::InstrHdr;
use super::repr_c::{DPTR_OFFSET, EXHDR_OFFSET, IH_OFFSET, TXM_OFFSET, TX_DESC_SIZE};
use super::tx_mdata::TxMdata;

/// Words per instruction.
pub const TX_DESC_WORDS: usize = TX_DESC_SIZE / 8;

/// Decoded transmit instruction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TxDesc {
    pub dptr: u64,
    pub ih: InstrHdr,
    pub txm: TxMdata,
    pub exhdr: [u64; 4],
}

impl TxDesc {
    /// Pack into the eight little-endian words the ring stores.
    pub const fn to_words(&self) -> [u64; TX_DESC_WORDS] {
        let txm = self.txm.to_words();
        [
            self.dptr,
            self.ih.to_u64(),
            txm[0],
            txm[1],
            self.exhdr[0],
            self.exhdr[1],
            self.exhdr[2],
            self.exhdr[3],
        ]
    }

    pub const fn from_words(words: &[u64; TX_DESC_WORDS]) -> Self {
        Self {
            dptr: words[DPTR_OFFSET / 8],
            ih: InstrHdr::from_u64(words[IH_OFFSET / 8]),
            txm: TxMdata::from_words([words[TXM_OFFSET / 8], words[TXM_OFFSET / 8 + 1]]),
            exhdr: [
                words[EXHDR_OFFSET / 8],
                words[EXHDR_OFFSET / 8 + 1],
                words[EXHDR_OFFSET / 8 + 2],
                words[EXHDR_OFFSET / 8 + 3],
            ],
        }
    }

    pub fn to_bytes(&self) -> [u8; TX_DESC_SIZE] {
        let mut out = [0u8; TX_DESC_SIZE];
        for (i, word) in self.to_words().iter().enumerate() {
            out[i * 8..i * 8 + 8].copy_from_slice(&word.to_le_bytes());
        }
        out
    }

    pub fn from_bytes(bytes: &[u8; TX_DESC_SIZE]) -> Self {
        let mut words = [0u64; TX_DESC_WORDS];
        for (i, word) in words.iter_mut().enumerate() {
            let mut raw = [0u8; 8];
            raw.copy_from_slice(&bytes[i * 8..i * 8 + 8]);
            *word = u64::from_le_bytes(raw);
        }
        Self::from_words(&words)
    }
}
