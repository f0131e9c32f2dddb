//! Binary framing for tracer subprocess output (§4.1, §9).
//!
//! Rather than treat a malformed or truncated tracer response as an
//! exception, the wire format is explicit: a fixed-size header naming how
//! many branch records follow and how much raw program output trails
//! them, then the records, then the output bytes. A short read at any
//! point aborts the current exchange with [`ExecutionError::ShortRead`]
//! rather than panicking.
//!
//! `try_value` and `distance` are carried as `i128` on the wire. That is
//! wide enough to hold any signed difference of two zero-extended 64-bit
//! operands (which can require 65 bits) without truncation, while staying
//! a fixed-size field the header's record count can index into.

use std::io::Read;

use concolic_core::{BranchInfo, CompareType};
use num_bigint::BigInt;

use crate::error::{ExecutionError, Result};

const RECORD_SIZE: usize = 8 + 1 + 16 + 1 + 8 + 8 + 16;
const HEADER_SIZE: usize = 4 + 4 + 4;

/// One header + branch-record-list + output-bytes exchange with a tracer
/// child, already parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceFrame {
    /// Raw exit status as reported by the tracer (a POSIX signal number,
    /// or `0` for a normal exit).
    pub status: i32,
    pub records: Vec<BranchInfo>,
    pub output: Vec<u8>,
}

fn read_exact_or(reader: &mut impl Read, buf: &mut [u8]) -> Result<()> {
    reader.read_exact(buf).map_err(|_| {
        let mut probe = Vec::new();
        let _ = reader.read_to_end(&mut probe);
        ExecutionError::ShortRead { read: probe.len(), expected: buf.len() }
    })
}

fn compare_kind_from_byte(b: u8) -> Result<CompareType> {
    match b {
        0 => Ok(CompareType::Equality),
        1 => Ok(CompareType::SignedSize),
        2 => Ok(CompareType::UnsignedSize),
        other => Err(ExecutionError::UnknownCompareKind(other)),
    }
}

fn compare_kind_to_byte(kind: CompareType) -> u8 {
    match kind {
        CompareType::Equality => 0,
        CompareType::SignedSize => 1,
        CompareType::UnsignedSize => 2,
    }
}

/// Parse one [`TraceFrame`] from a reader positioned at the start of a
/// tracer response. Short reads at any boundary (header, a record,
/// trailing output) abort with [`ExecutionError::ShortRead`].
pub fn read_frame(reader: &mut impl Read) -> Result<TraceFrame> {
    let mut header = [0u8; HEADER_SIZE];
    read_exact_or(reader, &mut header)?;
    let record_count = u32::from_le_bytes(header[0..4].try_into().unwrap()) as usize;
    let output_len = u32::from_le_bytes(header[4..8].try_into().unwrap()) as usize;
    let status = i32::from_le_bytes(header[8..12].try_into().unwrap());

    let mut records = Vec::with_capacity(record_count);
    let mut record_buf = [0u8; RECORD_SIZE];
    for _ in 0..record_count {
        read_exact_or(reader, &mut record_buf)?;
        records.push(decode_record(&record_buf)?);
    }

    let mut output = vec![0u8; output_len];
    read_exact_or(reader, &mut output)?;

    Ok(TraceFrame { status, records, output })
}

fn decode_record(buf: &[u8; RECORD_SIZE]) -> Result<BranchInfo> {
    let inst_addr = u64::from_le_bytes(buf[0..8].try_into().unwrap());
    let branch_type = compare_kind_from_byte(buf[8])?;
    let try_value = BigInt::from(i128::from_le_bytes(buf[9..25].try_into().unwrap()));
    let operand_size = buf[25] as usize;
    let operand1 = u64::from_le_bytes(buf[26..34].try_into().unwrap());
    let operand2 = u64::from_le_bytes(buf[34..42].try_into().unwrap());
    let distance = BigInt::from(i128::from_le_bytes(buf[42..58].try_into().unwrap()));
    Ok(BranchInfo { inst_addr, branch_type, try_value, operand_size, operand1, operand2, distance })
}

fn encode_record(info: &BranchInfo) -> [u8; RECORD_SIZE] {
    let mut buf = [0u8; RECORD_SIZE];
    buf[0..8].copy_from_slice(&info.inst_addr.to_le_bytes());
    buf[8] = compare_kind_to_byte(info.branch_type);
    let try_value: i128 = info.try_value.clone().try_into().unwrap_or(0);
    buf[9..25].copy_from_slice(&try_value.to_le_bytes());
    buf[25] = info.operand_size as u8;
    buf[26..34].copy_from_slice(&info.operand1.to_le_bytes());
    buf[34..42].copy_from_slice(&info.operand2.to_le_bytes());
    let distance: i128 = info.distance.clone().try_into().unwrap_or(0);
    buf[42..58].copy_from_slice(&distance.to_le_bytes());
    buf
}

/// Serialize a frame, the inverse of [`read_frame`]. Used by the
/// fork-server session to build test fixtures and to round-trip the
/// protocol in unit tests; the real tracer child writes this format
/// directly.
pub fn write_frame(frame: &TraceFrame) -> Vec<u8> {
    let mut out = Vec::with_capacity(HEADER_SIZE + frame.records.len() * RECORD_SIZE + frame.output.len());
    out.extend_from_slice(&(frame.records.len() as u32).to_le_bytes());
    out.extend_from_slice(&(frame.output.len() as u32).to_le_bytes());
    out.extend_from_slice(&frame.status.to_le_bytes());
    for record in &frame.records {
        out.extend_from_slice(&encode_record(record));
    }
    out.extend_from_slice(&frame.output);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use concolic_core::CompareType;

    fn sample_info() -> BranchInfo {
        BranchInfo {
            inst_addr: 0xdead_beef,
            branch_type: CompareType::SignedSize,
            try_value: BigInt::from(0x5e),
            operand_size: 4,
            operand1: 10,
            operand2: 20,
            distance: BigInt::from(-10),
        }
    }

    #[test]
    fn round_trips_a_frame_with_records_and_output() {
        let frame =
            TraceFrame { status: 11, records: vec![sample_info(), sample_info()], output: vec![1, 2, 3, 4] };
        let bytes = write_frame(&frame);
        let mut cursor = std::io::Cursor::new(bytes);
        let decoded = read_frame(&mut cursor).unwrap();
        assert_eq!(decoded, frame);
    }

    #[test]
    fn empty_frame_round_trips() {
        let frame = TraceFrame { status: 0, records: vec![], output: vec![] };
        let bytes = write_frame(&frame);
        let mut cursor = std::io::Cursor::new(bytes);
        assert_eq!(read_frame(&mut cursor).unwrap(), frame);
    }

    #[test]
    fn short_read_in_header_is_reported() {
        let mut cursor = std::io::Cursor::new(vec![0u8; 4]);
        let err = read_frame(&mut cursor).unwrap_err();
        assert!(matches!(err, ExecutionError::ShortRead { .. }));
    }

    #[test]
    fn short_read_mid_records_is_reported() {
        let frame = TraceFrame { status: 0, records: vec![sample_info()], output: vec![] };
        let mut bytes = write_frame(&frame);
        bytes.truncate(bytes.len() - 5);
        let mut cursor = std::io::Cursor::new(bytes);
        let err = read_frame(&mut cursor).unwrap_err();
        assert!(matches!(err, ExecutionError::ShortRead { .. }));
    }

    #[test]
    fn unknown_compare_kind_byte_is_rejected() {
        let mut buf = [0u8; RECORD_SIZE];
        buf[8] = 0xff;
        assert!(matches!(decode_record(&buf), Err(ExecutionError::UnknownCompareKind(0xff))));
    }
}
