//! Command implementations for sermousectl

pub mod config;
pub mod decode;
pub mod simulate;

use clap::ValueEnum;
use sermouse_detect::sim::SimulatedDevice;
use sermouse_pipeline::MouseConfig;
use sermouse_protocol::ProtocolKind;
use sermouse_transport::Verbosity;
use std::path::Path;

use crate::error::CliError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ProtocolArg {
    /// Mouse Systems MM series (3 bytes, 8O1)
    Mm,
    /// Microsoft two/three button (3 bytes plus optional middle byte)
    Mp,
    /// Ballpoint (4 bytes)
    Bp,
    /// Microsoft wheel (4 or 5 bytes)
    Z,
}

impl From<ProtocolArg> for ProtocolKind {
    fn from(arg: ProtocolArg) -> Self {
        match arg {
            ProtocolArg::Mm => ProtocolKind::Mm,
            ProtocolArg::Mp => ProtocolKind::Mp,
            ProtocolArg::Bp => ProtocolKind::Bp,
            ProtocolArg::Z => ProtocolKind::Z,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DeviceArg {
    /// Answers the handshake with "M"
    Microsoft,
    /// Answers the handshake with "M3"
    ThreeButton,
    /// Answers the handshake with "MZ"
    Wheel,
    /// Answers the handshake with "B"
    Ballpoint,
    /// Silent on power-up, found by the prompt-mode baud sweep
    MmSeries,
}

impl From<DeviceArg> for SimulatedDevice {
    fn from(arg: DeviceArg) -> Self {
        match arg {
            DeviceArg::Microsoft => SimulatedDevice::Microsoft,
            DeviceArg::ThreeButton => SimulatedDevice::ThreeButton,
            DeviceArg::Wheel => SimulatedDevice::Wheel,
            DeviceArg::Ballpoint => SimulatedDevice::Ballpoint,
            DeviceArg::MmSeries => SimulatedDevice::MmSeries,
        }
    }
}

/// Loads `path`, or the defaults when none is given.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is invalid.
pub fn load_config(path: Option<&Path>) -> Result<MouseConfig, CliError> {
    match path {
        Some(path) => Ok(MouseConfig::from_file(path)?),
        None => Ok(MouseConfig::default()),
    }
}

/// Component verbosity implied by the `-v` count, never lower than
/// what the configuration asks for.
pub fn verbosity_for(verbose: u8, configured: Verbosity) -> Verbosity {
    let requested = match verbose {
        0 => Verbosity::Quiet,
        1 => Verbosity::Normal,
        2 => Verbosity::Packets,
        _ => Verbosity::Bytes,
    };
    requested.max(configured)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity_only_raises() {
        assert_eq!(verbosity_for(0, Verbosity::Quiet), Verbosity::Quiet);
        assert_eq!(verbosity_for(0, Verbosity::Normal), Verbosity::Normal);
        assert_eq!(verbosity_for(1, Verbosity::Quiet), Verbosity::Normal);
        assert_eq!(verbosity_for(2, Verbosity::Normal), Verbosity::Packets);
        assert_eq!(verbosity_for(5, Verbosity::Normal), Verbosity::Bytes);
        assert_eq!(verbosity_for(0, Verbosity::Bytes), Verbosity::Bytes);
    }

    #[test]
    fn test_device_args_cover_every_simulated_device() {
        let mapped: Vec<SimulatedDevice> = DeviceArg::value_variants()
            .iter()
            .map(|arg| SimulatedDevice::from(*arg))
            .collect();
        assert_eq!(mapped, SimulatedDevice::ALL.to_vec());
    }
}
