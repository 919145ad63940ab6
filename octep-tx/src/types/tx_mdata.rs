//! Transmit metadata (16 bytes of front data).
//!
//! ```text
//! byte  0..2   ol_flags   (little-endian)
//! byte  2..4   gso_size
//! byte  4..6   gso_segs
//! byte  6..16  reserved, always zero
//! ```

use bitflags::bitflags;

use super::repr_c::TX_MDATA_SIZE;

bitflags! {
    /// Offloads requested from the device for one packet.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct OffloadFlags: u16 {
        const VLAN_INSERT = 1 << 0;
        const IPV4_CKSUM = 1 << 1;
        const UDP_CKSUM = 1 << 2;
        const TCP_CKSUM = 1 << 3;
        const SCTP_CKSUM = 1 << 4;
        const TCP_TSO = 1 << 5;
        const UDP_TSO = 1 << 6;

        /// IPv4, UDP and TCP checksum insertion.
        const CKSUM = Self::IPV4_CKSUM.bits() | Self::UDP_CKSUM.bits() | Self::TCP_CKSUM.bits();
        /// TCP and UDP segmentation.
        const TSO = Self::TCP_TSO.bits() | Self::UDP_TSO.bits();
    }
}

impl OffloadFlags {
    /// Any segmentation offload requested.
    #[inline]
    pub const fn is_tso(&self) -> bool {
        self.intersects(Self::TSO)
    }

    /// Any L4 checksum the device can insert while segmenting.
    #[inline]
    pub const fn has_l4_cksum(&self) -> bool {
        self.intersects(Self::TCP_CKSUM.union(Self::UDP_CKSUM))
    }
}

/// Decoded transmit metadata.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TxMdata {
    pub ol_flags: OffloadFlags,
    pub gso_size: u16,
    pub gso_segs: u16,
}

impl TxMdata {
    /// Metadata requesting no offloads.
    pub const fn none() -> Self {
        Self { ol_flags: OffloadFlags::empty(), gso_size: 0, gso_segs: 0 }
    }

    /// Pack into the two little-endian words stored in the instruction.
    pub const fn to_words(&self) -> [u64; 2] {
        let w0 = self.ol_flags.bits() as u64
            | (self.gso_size as u64) << 16
            | (self.gso_segs as u64) << 32;
        [w0, 0]
    }

    /// Unpack from the instruction words. Unknown flag bits and reserved
    /// fields are dropped.
    pub const fn from_words(words: [u64; 2]) -> Self {
        let w0 = words[0];
        Self {
            ol_flags: OffloadFlags::from_bits_truncate(w0 as u16),
            gso_size: (w0 >> 16) as u16,
            gso_segs: (w0 >> 32) as u16,
        }
    }

    pub fn to_bytes(&self) -> [u8; TX_MDATA_SIZE] {
        let [w0, w1] = self.to_words();
        let mut out = [0u8; TX_MDATA_SIZE];
        out[..8].copy_from_slice(&w0.to_le_bytes());
        out[8..].copy_from_slice(&w1.to_le_bytes());
        out
    }

    pub fn from_bytes(bytes: &[u8; TX_MDATA_SIZE]) -> Self {
        let mut w0 = [0u8; 8];
        let mut w1 = [0u8; 8];
        w0.copy_from_slice(&bytes[..8]);
        w1.copy_from_slice(&bytes[8..]);
        Self::from_words([u64::from_le_bytes(w0), u64::from_le_bytes(w1)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_bits() {
        assert_eq!(OffloadFlags::VLAN_INSERT.bits(), 0x01);
        assert_eq!(OffloadFlags::SCTP_CKSUM.bits(), 0x10);
        assert_eq!(OffloadFlags::UDP_TSO.bits(), 0x40);
        assert_eq!(OffloadFlags::CKSUM.bits(), 0x0E);
        assert_eq!(OffloadFlags::TSO.bits(), 0x60);
    }

    #[test]
    fn test_byte_layout() {
        let md = TxMdata {
            ol_flags: OffloadFlags::CKSUM | OffloadFlags::TSO,
            gso_size: 1448,
            gso_segs: 3,
        };
        let bytes = md.to_bytes();
        assert_eq!(&bytes[0..2], &0x006Eu16.to_le_bytes());
        assert_eq!(&bytes[2..4], &1448u16.to_le_bytes());
        assert_eq!(&bytes[4..6], &3u16.to_le_bytes());
        assert!(bytes[6..].iter().all(|&b| b == 0));
        assert_eq!(TxMdata::from_bytes(&bytes), md);
    }

    #[test]
    fn test_none_is_all_zero() {
        assert_eq!(TxMdata::none().to_bytes(), [0u8; TX_MDATA_SIZE]);
    }

    #[test]
    fn test_tso_helpers() {
        assert!(OffloadFlags::TCP_TSO.is_tso());
        assert!(!OffloadFlags::CKSUM.is_tso());
        assert!(OffloadFlags::CKSUM.has_l4_cksum());
        assert!(!OffloadFlags::IPV4_CKSUM.has_l4_cksum());
    }
}
