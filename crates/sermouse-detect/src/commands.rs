//! Prompt-mode command set
//!
//! Devices that do not identify themselves answer single-character
//! commands. The engine uses these to find the device's baud rate and to put
//! it back into a known configuration.

use serde::{Deserialize, Serialize};

use crate::{DetectError, DetectResult};

/// Stop streaming; report only when polled.
pub const PROMPT_MODE: u8 = b'D';

/// Status query.
pub const STATUS_QUERY: u8 = b's';

/// Status byte a healthy device answers [`STATUS_QUERY`] with.
pub const STATUS_OK: u8 = 0x4F;

/// Button-count query. The low nibble of the reply is the count.
pub const BUTTON_QUERY: u8 = b'k';

/// Prefix of the two-byte baud-change command.
pub const BAUD_PREFIX: u8 = b'*';

/// Rates the device can be switched to, with the second command byte.
pub const BAUD_COMMANDS: [(u32, u8); 4] = [(1200, b'n'), (2400, b'o'), (4800, b'p'), (9600, b'q')];

/// Baud-change command for `baud`.
///
/// # Errors
///
/// Returns [`DetectError::UnsupportedBaud`] for a rate the device cannot
/// be switched to.
pub fn baud_command(baud: u32) -> DetectResult<[u8; 2]> {
    BAUD_COMMANDS
        .iter()
        .find(|(rate, _)| *rate == baud)
        .map(|&(_, code)| [BAUD_PREFIX, code])
        .ok_or(DetectError::UnsupportedBaud(baud))
}

/// Baud rate a baud-change code selects.
pub fn baud_for_code(code: u8) -> Option<u32> {
    BAUD_COMMANDS
        .iter()
        .find(|(_, c)| *c == code)
        .map(|&(rate, _)| rate)
}

/// Report rate selected after detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportRate {
    Hz10,
    Hz20,
    Hz50,
    Hz100,
    Hz150,
    /// Report on every movement.
    #[default]
    Continuous,
}

impl ReportRate {
    pub fn command(self) -> u8 {
        match self {
            ReportRate::Hz10 => b'J',
            ReportRate::Hz20 => b'K',
            ReportRate::Hz50 => b'L',
            ReportRate::Hz100 => b'M',
            ReportRate::Hz150 => b'N',
            ReportRate::Continuous => b'O',
        }
    }

    pub fn from_command(code: u8) -> Option<Self> {
        match code {
            b'J' => Some(ReportRate::Hz10),
            b'K' => Some(ReportRate::Hz20),
            b'L' => Some(ReportRate::Hz50),
            b'M' => Some(ReportRate::Hz100),
            b'N' => Some(ReportRate::Hz150),
            b'O' => Some(ReportRate::Continuous),
            _ => None,
        }
    }
}
