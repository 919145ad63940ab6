//! Instruction header (64 bits, bit-packed).
//!
//! ```text
//!  63  62  61        48 47    42 41    36 35        16 15          0
//! +---+---+------------+--------+--------+------------+-------------+
//! | r | g |    gsz     |  fsz   | pkind  |  reserved  |    tlen     |
//! +---+---+------------+--------+--------+------------+-------------+
//! ```
//!
//! Field widths are a caller precondition: `to_u64` masks every field to
//! its width and never reports an error, as the device assumes software
//! hands it well-formed headers.

const TLEN_SHIFT: u32 = 0;
const TLEN_BITS: u32 = 16;
const PKIND_SHIFT: u32 = 36;
const PKIND_BITS: u32 = 6;
const FSZ_SHIFT: u32 = 42;
const FSZ_BITS: u32 = 6;
const GSZ_SHIFT: u32 = 48;
const GSZ_BITS: u32 = 14;
const GATHER_SHIFT: u32 = 62;

/// Largest encodable data length.
pub const TLEN_MAX: u32 = (1 << TLEN_BITS) - 1;
/// Largest encodable device kind tag.
pub const PKIND_MAX: u8 = (1 << PKIND_BITS) - 1;
/// Largest encodable front-data size, in 8-byte units.
pub const FSZ_MAX: u8 = (1 << FSZ_BITS) - 1;
/// Largest encodable gather list entry count.
pub const GSZ_MAX: u16 = (1 << GSZ_BITS) - 1;

#[inline]
const fn field(value: u64, shift: u32, bits: u32) -> u64 {
    (value & ((1u64 << bits) - 1)) << shift
}

#[inline]
const fn extract(word: u64, shift: u32, bits: u32) -> u64 {
    (word >> shift) & ((1u64 << bits) - 1)
}

/// Decoded instruction header.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InstrHdr {
    /// Bytes the device reads: the packet length plus `fsz * 8` bytes of
    /// front data.
    pub tlen: u16,
    /// Device kind tag.
    pub pkind: u8,
    /// Front data size in 8-byte units.
    pub fsz: u8,
    /// Number of gather list entries.
    pub gsz: u16,
    /// `dptr` addresses a gather list rather than the packet.
    pub gather: bool,
}

impl InstrHdr {
    /// Header for a packet handed to the device as one linear buffer.
    pub const fn direct(tlen: u16, pkind: u8, fsz: u8) -> Self {
        Self { tlen, pkind, fsz, gsz: 0, gather: false }
    }

    /// Header for a packet described by a gather list of `gsz` entries.
    pub const fn gathered(tlen: u16, pkind: u8, fsz: u8, gsz: u16) -> Self {
        Self { tlen, pkind, fsz, gsz, gather: true }
    }

    /// Pack into the wire word.
    pub const fn to_u64(&self) -> u64 {
        debug_assert!(self.pkind <= PKIND_MAX);
        debug_assert!(self.fsz <= FSZ_MAX);
        debug_assert!(self.gsz <= GSZ_MAX);

        field(self.tlen as u64, TLEN_SHIFT, TLEN_BITS)
            | field(self.pkind as u64, PKIND_SHIFT, PKIND_BITS)
            | field(self.fsz as u64, FSZ_SHIFT, FSZ_BITS)
            | field(self.gsz as u64, GSZ_SHIFT, GSZ_BITS)
            | field(self.gather as u64, GATHER_SHIFT, 1)
    }

    /// Unpack from the wire word. Reserved bits are ignored.
    pub const fn from_u64(word: u64) -> Self {
        Self {
            tlen: extract(word, TLEN_SHIFT, TLEN_BITS) as u16,
            pkind: extract(word, PKIND_SHIFT, PKIND_BITS) as u8,
            fsz: extract(word, FSZ_SHIFT, FSZ_BITS) as u8,
            gsz: extract(word, GSZ_SHIFT, GSZ_BITS) as u16,
            gather: extract(word, GATHER_SHIFT, 1) != 0,
        }
    }
}

impl From<InstrHdr> for u64 {
    fn from(hdr: InstrHdr) -> u64 {
        hdr.to_u64()
    }
}

impl From<u64> for InstrHdr {
    fn from(word: u64) -> Self {
        Self::from_u64(word)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_header() {
        assert_eq!(InstrHdr::default().to_u64(), 0);
        assert_eq!(InstrHdr::from_u64(0), InstrHdr::default());
    }

    #[test]
    fn test_field_positions() {
        assert_eq!(InstrHdr::direct(0xFFFF, 0, 0).to_u64(), 0xFFFF);
        assert_eq!(InstrHdr::direct(0, PKIND_MAX, 0).to_u64(), 0x3F << 36);
        assert_eq!(InstrHdr::direct(0, 0, FSZ_MAX).to_u64(), 0x3F << 42);
        assert_eq!(InstrHdr::gathered(0, 0, 0, GSZ_MAX).to_u64(), (0x3FFF << 48) | (1 << 62));
    }

    #[test]
    fn test_reserved_bits_stay_clear() {
        let word = InstrHdr::gathered(u16::MAX, PKIND_MAX, FSZ_MAX, GSZ_MAX).to_u64();
        // bits 16..36 and bit 63
        assert_eq!(word & 0x0000_000F_FFFF_0000, 0);
        assert_eq!(word >> 63, 0);
    }

    #[test]
    fn test_reserved_bits_ignored_on_decode() {
        let word = InstrHdr::direct(60, 3, 2).to_u64() | (1 << 63) | (0xABCDE << 16);
        assert_eq!(InstrHdr::from_u64(word), InstrHdr::direct(60, 3, 2));
    }

    #[test]
    fn test_gather_header_roundtrip() {
        let hdr = InstrHdr::gathered(1514, 5, 2, 5);
        assert_eq!(InstrHdr::from(u64::from(hdr)), hdr);
    }
}
