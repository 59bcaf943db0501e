//! Binary vector-file parsers for the three external formats (§6):
//! `.fvecs` for unfiltered bases, and the fixed-D=100 filtered base/query
//! formats used by the filtered and stitched builders.

use crate::error::{Result, VamanaError};
use crate::point::{Point, PointStore, Query};
use std::io::Read;
use std::path::Path;

/// Fixed coordinate dimension of the filtered base/query binary formats.
pub const FILTERED_DIM: usize = 100;

/// Parses a `.fvecs` stream: each record is a little-endian `i32` dimension
/// followed by that many `f32` coordinates.
///
/// # Errors
///
/// Returns [`VamanaError::CorruptIndex`] on a truncated record, and
/// [`VamanaError::EmptyInput`] if the file has zero records.
pub fn load_fvecs(path: impl AsRef<Path>) -> Result<PointStore> {
    let buf = read_all(path)?;
    let mut cursor = 0usize;
    let mut points = Vec::new();

    while cursor < buf.len() {
        let dim = read_i32(&buf, &mut cursor)? as usize;
        let vector = read_f32_vec(&buf, &mut cursor, dim)?;
        points.push(Point::new(points.len(), vector));
    }

    if points.is_empty() {
        return Err(VamanaError::EmptyInput("fvecs file contains no records".into()));
    }
    PointStore::new(points)
}

/// Parses the filtered base-vector binary format: a little-endian `u32`
/// count `N`, then `N` records of `(label: f32, timestamp: f32, 100 ×
/// f32 coordinates)`.
///
/// # Errors
///
/// Returns [`VamanaError::CorruptIndex`] on a truncated record, and
/// [`VamanaError::EmptyInput`] if `N == 0`.
pub fn load_filtered_base(path: impl AsRef<Path>) -> Result<PointStore> {
    let buf = read_all(path)?;
    let mut cursor = 0usize;
    let n = read_u32(&buf, &mut cursor)? as usize;
    if n == 0 {
        return Err(VamanaError::EmptyInput("filtered base file has zero points".into()));
    }

    let mut points = Vec::with_capacity(n);
    for i in 0..n {
        let label = read_f32(&buf, &mut cursor)? as u32;
        let timestamp = f64::from(read_f32(&buf, &mut cursor)?);
        let vector = read_f32_vec(&buf, &mut cursor, FILTERED_DIM)?;
        points.push(Point::with_label(i, vector, label, timestamp));
    }
    PointStore::new(points)
}

/// Parses the filtered query-vector binary format: a little-endian `u32`
/// count `Q`, then `Q` records of `(query_kind: f32, v: f32, l: f32, r: f32,
/// 100 × f32 coordinates)`. Only `query_kind ∈ {0.0, 1.0}` is recognized
/// (unfiltered and single-label respectively); any other kind is skipped
/// (§6, "silently skipped by the test scorer").
///
/// # Errors
///
/// Returns [`VamanaError::CorruptIndex`] on a truncated record.
pub fn load_filtered_queries(path: impl AsRef<Path>) -> Result<Vec<Query>> {
    let buf = read_all(path)?;
    let mut cursor = 0usize;
    let q = read_u32(&buf, &mut cursor)? as usize;

    let mut queries = Vec::new();
    let mut skipped = 0usize;
    for _ in 0..q {
        let kind = read_f32(&buf, &mut cursor)?;
        let v = read_f32(&buf, &mut cursor)? as u32;
        let _l = read_f32(&buf, &mut cursor)?;
        let _r = read_f32(&buf, &mut cursor)?;
        let vector = read_f32_vec(&buf, &mut cursor, FILTERED_DIM)?;

        if kind == 0.0 {
            queries.push(Query::unfiltered(vector));
        } else if kind == 1.0 {
            queries.push(Query::single_label(vector, v));
        } else {
            skipped += 1;
        }
    }
    if skipped > 0 {
        tracing::warn!(skipped, "query file: skipped records with an unrecognized query_kind");
    }
    Ok(queries)
}

fn read_all(path: impl AsRef<Path>) -> Result<Vec<u8>> {
    let mut file = std::fs::File::open(path)?;
    let mut buf = Vec::new();
    file.read_to_end(&mut buf)?;
    Ok(buf)
}

fn read_u32(buf: &[u8], cursor: &mut usize) -> Result<u32> {
    Ok(u32::from_le_bytes(take(buf, cursor, 4)?.try_into().expect("exactly 4 bytes")))
}

fn read_i32(buf: &[u8], cursor: &mut usize) -> Result<i32> {
    Ok(i32::from_le_bytes(take(buf, cursor, 4)?.try_into().expect("exactly 4 bytes")))
}

fn read_f32(buf: &[u8], cursor: &mut usize) -> Result<f32> {
    Ok(f32::from_le_bytes(take(buf, cursor, 4)?.try_into().expect("exactly 4 bytes")))
}

fn read_f32_vec(buf: &[u8], cursor: &mut usize, count: usize) -> Result<Vec<f32>> {
    (0..count).map(|_| read_f32(buf, cursor)).collect()
}

fn take<'a>(buf: &'a [u8], cursor: &mut usize, n: usize) -> Result<&'a [u8]> {
    let end = *cursor + n;
    let slice = buf.get(*cursor..end).ok_or_else(|| VamanaError::CorruptIndex("truncated binary record".into()))?;
    *cursor = end;
    Ok(slice)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_bytes(bytes: &[u8]) -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.bin");
        std::fs::write(&path, bytes).unwrap();
        (dir, path)
    }

    #[test]
    fn fvecs_parses_two_records() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&2i32.to_le_bytes());
        bytes.extend_from_slice(&1.0f32.to_le_bytes());
        bytes.extend_from_slice(&2.0f32.to_le_bytes());
        bytes.extend_from_slice(&2i32.to_le_bytes());
        bytes.extend_from_slice(&3.0f32.to_le_bytes());
        bytes.extend_from_slice(&4.0f32.to_le_bytes());
        let (_dir, path) = write_bytes(&bytes);

        let store = load_fvecs(&path).unwrap();
        assert_eq!(store.len(), 2);
        assert_eq!(store.get(0).unwrap().vector, vec![1.0, 2.0]);
        assert_eq!(store.get(1).unwrap().vector, vec![3.0, 4.0]);
    }

    #[test]
    fn filtered_queries_skip_unrecognized_kind() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&2u32.to_le_bytes());
        // record 0: unfiltered
        bytes.extend_from_slice(&0.0f32.to_le_bytes());
        bytes.extend_from_slice(&0.0f32.to_le_bytes());
        bytes.extend_from_slice(&0.0f32.to_le_bytes());
        bytes.extend_from_slice(&0.0f32.to_le_bytes());
        bytes.extend(std::iter::repeat(0.0f32.to_le_bytes()).take(FILTERED_DIM).flatten());
        // record 1: unrecognized kind 2.0 (range query), skipped
        bytes.extend_from_slice(&2.0f32.to_le_bytes());
        bytes.extend_from_slice(&0.0f32.to_le_bytes());
        bytes.extend_from_slice(&0.0f32.to_le_bytes());
        bytes.extend_from_slice(&0.0f32.to_le_bytes());
        bytes.extend(std::iter::repeat(0.0f32.to_le_bytes()).take(FILTERED_DIM).flatten());
        let (_dir, path) = write_bytes(&bytes);

        let queries = load_filtered_queries(&path).unwrap();
        assert_eq!(queries.len(), 1);
    }

    #[test]
    fn truncated_record_is_reported() {
        let (_dir, path) = write_bytes(&1u32.to_le_bytes());
        let err = load_filtered_base(&path).unwrap_err();
        assert!(matches!(err, VamanaError::CorruptIndex(_)));
    }
}
