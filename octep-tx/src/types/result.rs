//! Transmit status codes.

/// Status of one send attempt, numerically compatible with the device
/// driver's `IQ_SEND_*` codes.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IqSendStatus {
    /// Instruction posted, queue still open.
    Ok = 0,
    /// Instruction posted, queue must stop admitting packets.
    Stop = 1,
    /// Nothing was posted.
    Failed = -1,
}

impl IqSendStatus {
    /// Check if an instruction was posted.
    pub fn is_posted(&self) -> bool {
        !matches!(self, IqSendStatus::Failed)
    }

    /// Check if the caller must stop admitting packets.
    pub fn must_stop(&self) -> bool {
        matches!(self, IqSendStatus::Stop)
    }

    /// Convert from raw i32.
    pub fn from_i32(val: i32) -> Self {
        match val {
            0 => IqSendStatus::Ok,
            1 => IqSendStatus::Stop,
            _ => IqSendStatus::Failed,
        }
    }
}

impl From<i32> for IqSendStatus {
    fn from(val: i32) -> Self {
        Self::from_i32(val)
    }
}

impl From<IqSendStatus> for i32 {
    fn from(status: IqSendStatus) -> i32 {
        status as i32
    }
}

impl Default for IqSendStatus {
    fn default() -> Self {
        IqSendStatus::Ok
    }
}
