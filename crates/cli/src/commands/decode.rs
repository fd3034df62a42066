//! Replay a captured byte stream through a decoder

use anyhow::Result;
use sermouse_protocol::{Decoder, ProtocolKind};
use std::io::Read;
use std::path::Path;
use tracing::debug;

use crate::error::CliError;
use crate::output::{self, DecodeSummary};

/// `-` reads standard input.
pub fn execute(protocol: ProtocolKind, input: &Path, hex: bool, json: bool) -> Result<()> {
    let raw = read_input(input)?;
    let bytes = if hex { parse_hex(&raw)? } else { raw };
    debug!(protocol = %protocol, bytes = bytes.len(), "Decoding capture");

    let summary = decode(protocol, &bytes);
    output::print_decode_summary(&summary, json);
    Ok(())
}

fn read_input(input: &Path) -> Result<Vec<u8>, CliError> {
    if input == Path::new("-") {
        let mut buffer = Vec::new();
        std::io::stdin().read_to_end(&mut buffer)?;
        return Ok(buffer);
    }
    Ok(std::fs::read(input)?)
}

fn decode(protocol: ProtocolKind, bytes: &[u8]) -> DecodeSummary {
    let mut decoder = Decoder::new(protocol);
    let mut events = 0usize;
    decoder.feed_all(bytes, |event| {
        output::print_event(events, &event);
        events += 1;
    });

    DecodeSummary {
        protocol: protocol.to_string(),
        bytes: bytes.len(),
        events,
        sync_errors: decoder.error_count(),
    }
}

/// Parses whitespace- or comma-separated hex bytes, with or without `0x`.
fn parse_hex(text: &[u8]) -> Result<Vec<u8>, CliError> {
    let text = std::str::from_utf8(text)
        .map_err(|e| CliError::InvalidInput(format!("hex input is not UTF-8: {e}")))?;
    text.split(|c: char| c.is_whitespace() || c == ',')
        .filter(|token| !token.is_empty())
        .map(|token| {
            let digits = token
                .strip_prefix("0x")
                .or_else(|| token.strip_prefix("0X"))
                .unwrap_or(token);
            u8::from_str_radix(digits, 16)
                .map_err(|e| CliError::InvalidInput(format!("bad hex byte {token:?}: {e}")))
        })
        .collect()
}
