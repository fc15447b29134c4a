//! On-disk layout: a little-endian `u32` record count followed by that many
//! 13-byte records of `i32 x, i32 y, i32 z, u8 block tag`.

use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use loam_blocks::BlockKind;

use crate::SaveError;

pub const HEADER_LEN: usize = 4;
pub const RECORD_LEN: usize = 13;

pub type Record = ((i32, i32, i32), BlockKind);

/// Reads every record from `path`. A missing file is an empty world.
pub fn read_records(path: &Path) -> Result<Vec<Record>, SaveError> {
    let bytes = match fs::read(path) {
        Ok(b) => b,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };
    decode(&bytes)
}

pub fn decode(bytes: &[u8]) -> Result<Vec<Record>, SaveError> {
    if bytes.len() < HEADER_LEN {
        return Err(SaveError::Corrupt {
            reason: format!("{} bytes is shorter than the header", bytes.len()),
        });
    }
    let count = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as usize;
    let body = &bytes[HEADER_LEN..];
    if body.len() != count.saturating_mul(RECORD_LEN) {
        return Err(SaveError::Corrupt {
            reason: format!(
                "header declares {count} records but body holds {} bytes",
                body.len()
            ),
        });
    }
    let mut out = Vec::with_capacity(count);
    for (i, rec) in body.chunks_exact(RECORD_LEN).enumerate() {
        let x = i32::from_le_bytes([rec[0], rec[1], rec[2], rec[3]]);
        let y = i32::from_le_bytes([rec[4], rec[5], rec[6], rec[7]]);
        let z = i32::from_le_bytes([rec[8], rec[9], rec[10], rec[11]]);
        let kind = BlockKind::from_tag(rec[12]).ok_or_else(|| SaveError::Corrupt {
            reason: format!("record {i} has unknown block tag {}", rec[12]),
        })?;
        out.push(((x, y, z), kind));
    }
    Ok(out)
}

pub fn encode(records: &[Record]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(HEADER_LEN + records.len() * RECORD_LEN);
    buf.extend_from_slice(&(records.len() as u32).to_le_bytes());
    for &((x, y, z), kind) in records {
        buf.extend_from_slice(&x.to_le_bytes());
        buf.extend_from_slice(&y.to_le_bytes());
        buf.extend_from_slice(&z.to_le_bytes());
        buf.push(kind.tag());
    }
    buf
}

/// Replaces `path` with the given records. Writes a sibling temp file first
/// and renames it over the target so a crash never leaves a half file.
pub fn write_records(path: &Path, records: &[Record]) -> Result<(), SaveError> {
    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() {
            fs::create_dir_all(dir)?;
        }
    }
    let tmp = path.with_extension("tmp");
    {
        let file = fs::File::create(&tmp)?;
        let mut w = BufWriter::new(file);
        w.write_all(&encode(records))?;
        let file = w.into_inner().map_err(|e| e.into_error())?;
        file.sync_all()?;
    }
    fs::rename(&tmp, path)?;
    Ok(())
}
