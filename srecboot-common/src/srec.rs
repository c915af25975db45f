// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Motorola S-record parsing and encoding.
//!
//! A record line is ASCII: `S`, a type digit, a two-digit byte count, then
//! `count` hex-byte pairs covering address (2/3/4 bytes by type), payload
//! and a final checksum byte. A record checks out iff the byte count, the
//! address bytes, the payload bytes and the checksum sum to 0xFF mod 256.
//!
//! Unlike the usual lenient decoders, anything that is not two hex digits
//! where two hex digits belong is a hard [`ParseError`] — a corrupted
//! character must fail the line, not decode as zero and ride through on a
//! luckily-matching checksum.

use heapless::{String, Vec};

use crate::{LINE_MAX_LEN, MAX_RECORD_DATA};

/// Record classification with the address width the type implies.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecordKind {
    /// S1 — data, 16-bit address.
    Data16,
    /// S2 — data, 24-bit address.
    Data24,
    /// S3 — data, 32-bit address.
    Data32,
    /// S7 — end of transfer, 32-bit entry address.
    End32,
    /// S8 — end of transfer, 24-bit entry address.
    End24,
    /// S9 — end of transfer, 16-bit entry address.
    End16,
    /// S0 header / S5 count — parsed but not programmed.
    Other,
}

impl RecordKind {
    fn from_type_digit(digit: u8) -> Option<(Self, usize)> {
        match digit {
            b'0' | b'5' => Some((RecordKind::Other, 2)),
            b'1' => Some((RecordKind::Data16, 2)),
            b'2' => Some((RecordKind::Data24, 3)),
            b'3' => Some((RecordKind::Data32, 4)),
            b'7' => Some((RecordKind::End32, 4)),
            b'8' => Some((RecordKind::End24, 3)),
            b'9' => Some((RecordKind::End16, 2)),
            _ => None,
        }
    }

    pub fn is_data(self) -> bool {
        matches!(self, RecordKind::Data16 | RecordKind::Data24 | RecordKind::Data32)
    }

    pub fn is_end(self) -> bool {
        matches!(self, RecordKind::End16 | RecordKind::End24 | RecordKind::End32)
    }
}

/// Why a line failed to decode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParseError {
    /// Line does not start with the `S` marker.
    NotARecord,
    /// Type digit outside the supported set (S4/S6 or garbage).
    UnsupportedType,
    /// A character that should be a hex digit is not one.
    BadHex,
    /// Byte count cannot cover address plus checksum, or payload would
    /// exceed the record data bound.
    BadCount,
    /// Line shorter than its byte count claims.
    Truncated,
}

/// One decoded record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Record {
    pub kind: RecordKind,
    pub address: u32,
    pub data: Vec<u8, MAX_RECORD_DATA>,
    pub checksum: u8,
    /// Checksum held: (count + address bytes + data bytes + checksum) % 256 == 0xFF.
    pub valid: bool,
}

fn hex_nibble(c: u8) -> Result<u8, ParseError> {
    match c {
        b'0'..=b'9' => Ok(c - b'0'),
        b'A'..=b'F' => Ok(c - b'A' + 10),
        b'a'..=b'f' => Ok(c - b'a' + 10),
        _ => Err(ParseError::BadHex),
    }
}

fn hex_byte(pair: &[u8]) -> Result<u8, ParseError> {
    Ok((hex_nibble(pair[0])? << 4) | hex_nibble(pair[1])?)
}

impl Record {
    /// Decode one line (terminator already stripped).
    pub fn parse(line: &[u8]) -> Result<Record, ParseError> {
        if line.first() != Some(&b'S') {
            return Err(ParseError::NotARecord);
        }
        if line.len() < 4 {
            return Err(ParseError::Truncated);
        }

        let (kind, addr_len) =
            RecordKind::from_type_digit(line[1]).ok_or(ParseError::UnsupportedType)?;

        let count = hex_byte(&line[2..4])? as usize;
        // count covers address bytes, payload and the checksum byte
        if count < addr_len + 1 {
            return Err(ParseError::BadCount);
        }
        let data_len = count - addr_len - 1;
        if data_len > MAX_RECORD_DATA {
            return Err(ParseError::BadCount);
        }
        if line.len() < 4 + 2 * count {
            return Err(ParseError::Truncated);
        }

        let mut sum = count as u8;

        let mut address: u32 = 0;
        for i in 0..addr_len {
            let byte = hex_byte(&line[4 + 2 * i..6 + 2 * i])?;
            address = (address << 8) | byte as u32;
            sum = sum.wrapping_add(byte);
        }

        let mut data = Vec::new();
        let payload_at = 4 + 2 * addr_len;
        for i in 0..data_len {
            let byte = hex_byte(&line[payload_at + 2 * i..payload_at + 2 * i + 2])?;
            // capacity checked against MAX_RECORD_DATA above
            let _ = data.push(byte);
            sum = sum.wrapping_add(byte);
        }

        let checksum = hex_byte(&line[payload_at + 2 * data_len..payload_at + 2 * data_len + 2])?;
        sum = sum.wrapping_add(checksum);

        Ok(Record {
            kind,
            address,
            data,
            checksum,
            valid: sum == 0xFF,
        })
    }
}

// --- Encoding ---

/// How wide encoded addresses are; picks the S-record type.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AddressWidth {
    /// S1/S9
    Two,
    /// S2/S8
    Three,
    /// S3/S7
    Four,
}

impl AddressWidth {
    /// Narrowest width that can hold `addr`.
    pub fn for_address(addr: u32) -> Self {
        if addr <= 0xFFFF {
            AddressWidth::Two
        } else if addr <= 0xFF_FFFF {
            AddressWidth::Three
        } else {
            AddressWidth::Four
        }
    }

    fn bytes(self) -> usize {
        match self {
            AddressWidth::Two => 2,
            AddressWidth::Three => 3,
            AddressWidth::Four => 4,
        }
    }

    fn data_digit(self) -> char {
        match self {
            AddressWidth::Two => '1',
            AddressWidth::Three => '2',
            AddressWidth::Four => '3',
        }
    }

    fn end_digit(self) -> char {
        match self {
            AddressWidth::Two => '9',
            AddressWidth::Three => '8',
            AddressWidth::Four => '7',
        }
    }
}

/// Encoding failed: payload too long or address too wide for the line buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EncodeError;

pub type EncodedLine = String<LINE_MAX_LEN>;

fn push_hex_byte(out: &mut EncodedLine, byte: u8) -> Result<(), EncodeError> {
    const DIGITS: &[u8; 16] = b"0123456789ABCDEF";
    out.push(DIGITS[(byte >> 4) as usize] as char).map_err(|_| EncodeError)?;
    out.push(DIGITS[(byte & 0xF) as usize] as char).map_err(|_| EncodeError)
}

fn encode(digit: char, width: AddressWidth, addr: u32, data: &[u8]) -> Result<EncodedLine, EncodeError> {
    let addr_len = width.bytes();
    let count = addr_len + data.len() + 1;
    if count > 0xFF || 4 + 2 * count > LINE_MAX_LEN {
        return Err(EncodeError);
    }

    let mut out = EncodedLine::new();
    out.push('S').map_err(|_| EncodeError)?;
    out.push(digit).map_err(|_| EncodeError)?;

    let mut sum = count as u8;
    push_hex_byte(&mut out, count as u8)?;
    for i in (0..addr_len).rev() {
        let byte = (addr >> (8 * i)) as u8;
        push_hex_byte(&mut out, byte)?;
        sum = sum.wrapping_add(byte);
    }
    for &byte in data {
        push_hex_byte(&mut out, byte)?;
        sum = sum.wrapping_add(byte);
    }
    push_hex_byte(&mut out, 0xFF - sum)?;
    Ok(out)
}

/// Encode a data record (S1/S2/S3 by address width), no terminator.
pub fn encode_data(width: AddressWidth, addr: u32, data: &[u8]) -> Result<EncodedLine, EncodeError> {
    encode(width.data_digit(), width, addr, data)
}

/// Encode the matching end-of-transfer record (S9/S8/S7).
pub fn encode_end(width: AddressWidth, entry: u32) -> Result<EncodedLine, EncodeError> {
    encode(width.end_digit(), width, entry, &[])
}
