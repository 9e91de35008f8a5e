//! AC073TC1 command definitions
//!
//! This module defines the command bytes of the AC073TC1 controller and the
//! two fixed command sequences the driver issues: the power/timing
//! initialization sequence and the paint sequence.
//!
//! ## Command Structure
//!
//! All commands follow the pattern:
//! 1. Send the command byte with DC low (command mode)
//! 2. If the command carries data, set DC high (data mode)
//! 3. Send the data bytes
//! 4. Set DC low again
//!
//! Many initialization registers are undocumented. Their payloads are the
//! vendor values and must be sent byte-for-byte.
//!
//! ## Example
//!
//! ```
//! use ac073tc1::command::{self, Payload, INIT_SEQUENCE, PAINT_SEQUENCE};
//!
//! assert_eq!(INIT_SEQUENCE.len(), 19);
//! assert_eq!(INIT_SEQUENCE[0].command, command::CMDH);
//!
//! assert_eq!(PAINT_SEQUENCE[0].command, command::DATA_START_TRANSMISSION);
//! assert_eq!(PAINT_SEQUENCE[0].payload, Payload::Frame);
//! ```

/// Panel setting (0x00)
pub const PANEL_SETTING: u8 = 0x00;
/// Power setting (0x01)
pub const POWER_SETTING: u8 = 0x01;
/// Power off (0x02)
///
/// Requires 1 byte of data.
pub const POWER_OFF: u8 = 0x02;
/// Power off sequence setting (0x03)
pub const POWER_OFF_SEQUENCE: u8 = 0x03;
/// Power on (0x04)
///
/// Takes no data.
pub const POWER_ON: u8 = 0x04;
/// Booster soft start 1 (0x05)
pub const BOOSTER_SOFT_START_1: u8 = 0x05;
/// Booster soft start 2 (0x06)
pub const BOOSTER_SOFT_START_2: u8 = 0x06;
/// Deep sleep (0x07)
pub const DEEP_SLEEP: u8 = 0x07;
/// Booster soft start 3 (0x08)
pub const BOOSTER_SOFT_START_3: u8 = 0x08;
/// Data start transmission (0x10)
///
/// Followed by the packed frame, width * height / 2 bytes.
pub const DATA_START_TRANSMISSION: u8 = 0x10;
/// Data stop (0x11)
pub const DATA_STOP: u8 = 0x11;
/// Display refresh (0x12)
///
/// Requires 1 byte of data. The panel takes tens of seconds to settle.
pub const DISPLAY_REFRESH: u8 = 0x12;
/// Image process command (0x13)
pub const IMAGE_PROCESS: u8 = 0x13;
/// PLL control (0x30)
pub const PLL_CONTROL: u8 = 0x30;
/// Temperature sensor calibration (0x40)
pub const TEMP_SENSOR_CALIBRATION: u8 = 0x40;
/// Temperature sensor enable (0x41)
pub const TEMP_SENSOR_ENABLE: u8 = 0x41;
/// Temperature sensor write (0x42)
pub const TEMP_SENSOR_WRITE: u8 = 0x42;
/// Temperature sensor read (0x43)
pub const TEMP_SENSOR_READ: u8 = 0x43;
/// VCOM and data interval setting (0x50)
pub const VCOM_DATA_INTERVAL: u8 = 0x50;
/// Low power detection (0x51)
pub const LOW_POWER_DETECTION: u8 = 0x51;
/// TCON setting (0x60)
pub const TCON_SETTING: u8 = 0x60;
/// Resolution setting (0x61)
pub const RESOLUTION_SETTING: u8 = 0x61;
/// Gate/source start setting (0x65)
pub const GATE_SOURCE_START: u8 = 0x65;
/// Revision (0x70)
pub const REVISION: u8 = 0x70;
/// Get status (0x71)
pub const GET_STATUS: u8 = 0x71;
/// Auto measure VCOM (0x80)
pub const AUTO_MEASURE_VCOM: u8 = 0x80;
/// Read VCOM value (0x81)
pub const VCOM_VALUE: u8 = 0x81;
/// VCOM DC setting (0x82)
pub const VCOM_DC_SETTING: u8 = 0x82;
/// Undocumented, vendor init sequence (0x84)
pub const T_VDCS: u8 = 0x84;
/// Undocumented, vendor init sequence (0x86)
pub const AGID: u8 = 0x86;
/// Command header unlock (0xAA)
pub const CMDH: u8 = 0xAA;
/// Cascade setting (0xE0)
pub const CASCADE_SETTING: u8 = 0xE0;
/// Power saving (0xE3)
pub const POWER_SAVING: u8 = 0xE3;
/// Force temperature (0xE6)
pub const FORCE_TEMPERATURE: u8 = 0xE6;

/// Data carried by a command step
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Payload {
    /// Command byte only, DC never goes high
    None,
    /// Fixed register bytes
    Bytes(&'static [u8]),
    /// The packed frame supplied to the paint operation
    Frame,
}

/// One command of a fixed sequence
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CommandStep {
    /// Command byte
    pub command: u8,
    /// Data sent in data mode after the command byte
    pub payload: Payload,
    /// Unconditional wait after the step, in milliseconds
    pub settle_ms: u32,
}

impl CommandStep {
    const fn new(command: u8, data: &'static [u8]) -> Self {
        Self {
            command,
            payload: Payload::Bytes(data),
            settle_ms: 0,
        }
    }

    const fn settled(command: u8, payload: Payload, settle_ms: u32) -> Self {
        Self {
            command,
            payload,
            settle_ms,
        }
    }
}

/// Reset line high time before the reset pulse, in milliseconds
pub const RESET_SETUP_MS: u32 = 100;
/// Reset pulse width, in milliseconds
pub const RESET_PULSE_MS: u32 = 100;
/// Wait after releasing reset, in milliseconds
pub const RESET_RECOVERY_MS: u32 = 1_000;

/// Power, voltage and timing configuration, in order
///
/// No delays are required between these steps.
pub const INIT_SEQUENCE: [CommandStep; 19] = [
    CommandStep::new(CMDH, &[0x49, 0x55, 0x20, 0x08, 0x09, 0x18]),
    CommandStep::new(POWER_SETTING, &[0x3F, 0x00, 0x32, 0x2A, 0x0E, 0x2A]),
    CommandStep::new(PANEL_SETTING, &[0x5F, 0x69]),
    CommandStep::new(POWER_OFF_SEQUENCE, &[0x00, 0x54, 0x00, 0x44]),
    CommandStep::new(BOOSTER_SOFT_START_1, &[0x40, 0x1F, 0x1F, 0x2C]),
    CommandStep::new(BOOSTER_SOFT_START_2, &[0x6F, 0x1F, 0x16, 0x25]),
    CommandStep::new(BOOSTER_SOFT_START_3, &[0x6F, 0x1F, 0x1F, 0x22]),
    CommandStep::new(IMAGE_PROCESS, &[0x00, 0x04]),
    CommandStep::new(PLL_CONTROL, &[0x02]),
    CommandStep::new(TEMP_SENSOR_ENABLE, &[0x00]),
    CommandStep::new(VCOM_DATA_INTERVAL, &[0x3F]),
    CommandStep::new(TCON_SETTING, &[0x02, 0x00]),
    // 800 x 480, big-endian
    CommandStep::new(RESOLUTION_SETTING, &[0x03, 0x20, 0x01, 0xE0]),
    CommandStep::new(VCOM_DC_SETTING, &[0x1E]),
    CommandStep::new(T_VDCS, &[0x00]),
    CommandStep::new(AGID, &[0x00]),
    CommandStep::new(POWER_SAVING, &[0x2F]),
    CommandStep::new(CASCADE_SETTING, &[0x00]),
    CommandStep::new(FORCE_TEMPERATURE, &[0x00]),
];

/// Settle time after the frame upload, in milliseconds
pub const FRAME_SETTLE_MS: u32 = 1_000;
/// Settle time after power on, in milliseconds
pub const POWER_ON_SETTLE_MS: u32 = 1_000;
/// Settle time after starting a refresh, in milliseconds
///
/// This is the physical image-settling time and dominates a paint.
pub const REFRESH_SETTLE_MS: u32 = 35_000;
/// Settle time after power off, in milliseconds
pub const POWER_OFF_SETTLE_MS: u32 = 1_000;

/// Frame upload, power on, refresh and power off, in order
///
/// Each step is followed by its own unconditional settle delay. The panel
/// has a BUSY output, but it does not track refresh completion reliably, so
/// it is not polled.
pub const PAINT_SEQUENCE: [CommandStep; 4] = [
    CommandStep::settled(DATA_START_TRANSMISSION, Payload::Frame, FRAME_SETTLE_MS),
    CommandStep::settled(POWER_ON, Payload::None, POWER_ON_SETTLE_MS),
    CommandStep::settled(DISPLAY_REFRESH, Payload::Bytes(&[0x00]), REFRESH_SETTLE_MS),
    CommandStep::settled(POWER_OFF, Payload::Bytes(&[0x00]), POWER_OFF_SETTLE_MS),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_sequence_has_no_delays() {
        assert!(INIT_SEQUENCE.iter().all(|step| step.settle_ms == 0));
    }

    #[test]
    fn test_init_sequence_always_carries_data() {
        for step in &INIT_SEQUENCE {
            match step.payload {
                Payload::Bytes(data) => assert!(!data.is_empty()),
                other => panic!("unexpected payload {other:?} for {:#04x}", step.command),
            }
        }
    }

    #[test]
    fn test_resolution_matches_panel() {
        let step = INIT_SEQUENCE
            .iter()
            .find(|step| step.command == RESOLUTION_SETTING)
            .unwrap();
        let Payload::Bytes(data) = step.payload else {
            panic!("resolution setting has no data");
        };
        let width = u16::from_be_bytes([data[0], data[1]]);
        let height = u16::from_be_bytes([data[2], data[3]]);
        assert_eq!(u32::from(width), crate::config::PANEL_WIDTH);
        assert_eq!(u32::from(height), crate::config::PANEL_HEIGHT);
    }

    #[test]
    fn test_paint_sequence_order_and_delays() {
        let commands: [u8; 4] = PAINT_SEQUENCE.map(|step| step.command);
        assert_eq!(
            commands,
            [DATA_START_TRANSMISSION, POWER_ON, DISPLAY_REFRESH, POWER_OFF]
        );
        let delays: [u32; 4] = PAINT_SEQUENCE.map(|step| step.settle_ms);
        assert_eq!(delays, [1_000, 1_000, 35_000, 1_000]);
        assert_eq!(PAINT_SEQUENCE[1].payload, Payload::None);
    }
}
