//! Centroid store persistence.
//!
//! One binary file, three records in street order (flop, turn, river),
//! written once by training and read verbatim at runtime:
//!
//! ```text
//! i32  K              centroid count
//! i32  D              feature dimension
//! f32  mean[D]
//! f32  std_dev[D]
//! f32  centroids[K][D]   row-major
//! ```
//!
//! Everything is little-endian. There is no magic, version or checksum;
//! the loader's only integrity check is that the three records span the
//! file exactly.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use crate::abstraction::normalize::FeatureStats;
use crate::abstraction::{AbstractionError, FeatureMatrix, Street};

/// One street's persisted abstraction: normalisation statistics plus the
/// cluster centroids (already in normalised space).
#[derive(Debug, Clone, PartialEq)]
pub struct StreetRecord {
    pub stats: FeatureStats,
    pub centroids: FeatureMatrix,
}

impl StreetRecord {
    /// Number of centroids (the street's bucket count).
    #[must_use]
    pub fn centroid_count(&self) -> usize {
        self.centroids.len()
    }

    /// Feature dimension.
    #[must_use]
    pub fn dim(&self) -> usize {
        self.centroids.dim()
    }
}

/// The persisted abstraction for all three postflop streets.
#[derive(Debug, Clone, PartialEq)]
pub struct CentroidStore {
    pub flop: StreetRecord,
    pub turn: StreetRecord,
    pub river: StreetRecord,
}

impl CentroidStore {
    /// The record for a street.
    #[must_use]
    pub fn record(&self, street: Street) -> &StreetRecord {
        match street {
            Street::Flop => &self.flop,
            Street::Turn => &self.turn,
            Street::River => &self.river,
        }
    }

    /// Write the store to `path`.
    ///
    /// # Errors
    ///
    /// Any I/O failure surfaces as [`AbstractionError::IoWriteFailed`].
    pub fn save(&self, path: &Path) -> Result<(), AbstractionError> {
        let file = File::create(path).map_err(AbstractionError::IoWriteFailed)?;
        let mut writer = BufWriter::new(file);
        for street in Street::ALL {
            write_record(&mut writer, self.record(street))?;
        }
        writer.flush().map_err(AbstractionError::IoWriteFailed)
    }

    /// Read a store from `path`.
    ///
    /// # Errors
    ///
    /// [`AbstractionError::CentroidStoreMissing`] when the file does not
    /// exist, [`AbstractionError::CentroidStoreTruncated`] when it does not
    /// contain exactly three street records.
    pub fn load(path: &Path) -> Result<Self, AbstractionError> {
        let file = File::open(path).map_err(|source| match source.kind() {
            std::io::ErrorKind::NotFound => AbstractionError::CentroidStoreMissing {
                path: path.to_path_buf(),
                source,
            },
            _ => AbstractionError::Io(source),
        })?;
        let mut reader = BufReader::new(file);

        let flop = read_record(&mut reader, Street::Flop)?;
        let turn = read_record(&mut reader, Street::Turn)?;
        let river = read_record(&mut reader, Street::River)?;

        let mut probe = [0u8; 1];
        match reader.read(&mut probe) {
            Ok(0) => {}
            Ok(_) => {
                return Err(AbstractionError::CentroidStoreTruncated(
                    "file continues past the river record".to_string(),
                ))
            }
            Err(source) => return Err(AbstractionError::Io(source)),
        }

        Ok(Self { flop, turn, river })
    }
}

fn write_record<W: Write>(writer: &mut W, record: &StreetRecord) -> Result<(), AbstractionError> {
    let overflow = |what: &str| {
        AbstractionError::IoWriteFailed(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("{what} overflows i32"),
        ))
    };
    let k = i32::try_from(record.centroid_count()).map_err(|_| overflow("centroid count"))?;
    let d = i32::try_from(record.dim()).map_err(|_| overflow("dimension"))?;

    let mut put = |bytes: [u8; 4]| {
        writer.write_all(&bytes).map_err(AbstractionError::IoWriteFailed)
    };

    put(k.to_le_bytes())?;
    put(d.to_le_bytes())?;
    for &mean in &record.stats.mean {
        put(mean.to_le_bytes())?;
    }
    for &std_dev in &record.stats.std_dev {
        put(std_dev.to_le_bytes())?;
    }
    for &value in record.centroids.flat() {
        put(value.to_le_bytes())?;
    }
    Ok(())
}

fn read_record<R: Read>(reader: &mut R, street: Street) -> Result<StreetRecord, AbstractionError> {
    let k = read_i32(reader, street, "centroid count")?;
    let d = read_i32(reader, street, "dimension")?;
    if k < 0 || d <= 0 {
        return Err(AbstractionError::CentroidStoreTruncated(format!(
            "{} record header is implausible (K = {k}, D = {d})",
            street.name()
        )));
    }
    let k = k as usize;
    let d = d as usize;

    let mut mean = vec![0.0f32; d];
    for slot in &mut mean {
        *slot = read_f32(reader, street, "mean")?;
    }
    let mut std_dev = vec![0.0f32; d];
    for slot in &mut std_dev {
        *slot = read_f32(reader, street, "std dev")?;
    }
    let mut flat = vec![0.0f32; k * d];
    for slot in &mut flat {
        *slot = read_f32(reader, street, "centroid")?;
    }

    Ok(StreetRecord {
        stats: FeatureStats { mean, std_dev },
        centroids: FeatureMatrix::from_flat(d, flat),
    })
}

fn read_exact_4<R: Read>(
    reader: &mut R,
    street: Street,
    what: &str,
) -> Result<[u8; 4], AbstractionError> {
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf).map_err(|source| {
        if source.kind() == std::io::ErrorKind::UnexpectedEof {
            AbstractionError::CentroidStoreTruncated(format!(
                "unexpected end of file reading {what} in the {} record",
                street.name()
            ))
        } else {
            AbstractionError::Io(source)
        }
    })?;
    Ok(buf)
}

fn read_i32<R: Read>(reader: &mut R, street: Street, what: &str) -> Result<i32, AbstractionError> {
    Ok(i32::from_le_bytes(read_exact_4(reader, street, what)?))
}

fn read_f32<R: Read>(reader: &mut R, street: Street, what: &str) -> Result<f32, AbstractionError> {
    Ok(f32::from_le_bytes(read_exact_4(reader, street, what)?))
}
