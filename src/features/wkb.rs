//! GeoPackage geometry blob decoding
//!
//! A GeoPackage geometry is a small binary header (magic `GP`, version,
//! flags, SRS id, optional envelope) followed by standard WKB. Both ISO
//! (`+1000`/`+2000`/`+3000`) and EWKB (high-bit) dimension flags are read.
//! Z is kept as the third coordinate, M is dropped.

use std::io::{self, Cursor, Read, Seek, SeekFrom};

use byteorder::{BigEndian, LittleEndian, ReadBytesExt};
use thiserror::Error;

use super::model::{Geometry, Position};

/// Nesting limit for geometry collections
const MAX_DEPTH: usize = 32;

/// Upper bound on pre-allocation from untrusted element counts
const MAX_PREALLOC: usize = 1024;

#[derive(Error, Debug)]
pub enum WkbError {
    #[error("truncated geometry: {0}")]
    Truncated(#[from] io::Error),
    #[error("invalid GeoPackage magic bytes")]
    BadMagic,
    #[error("unsupported GeoPackage binary version {0}")]
    UnsupportedVersion(u8),
    #[error("extended GeoPackage geometries are not supported")]
    Extended,
    #[error("invalid envelope indicator {0}")]
    BadEnvelope(u8),
    #[error("invalid WKB byte order marker {0}")]
    BadByteOrder(u8),
    #[error("unsupported WKB geometry type {0}")]
    UnsupportedType(u32),
    #[error("expected {expected} inside {parent}, found {found}")]
    UnexpectedMember {
        parent: &'static str,
        expected: &'static str,
        found: &'static str,
    },
    #[error("geometry nesting exceeds {} levels", MAX_DEPTH)]
    TooDeep,
}

/// Decodes a GeoPackage geometry blob into a [`Geometry`].
pub fn decode_gpkg_geometry(blob: &[u8]) -> Result<Geometry, WkbError> {
    let mut cursor = Cursor::new(blob);

    let mut magic = [0u8; 2];
    cursor.read_exact(&mut magic)?;
    if &magic != b"GP" {
        return Err(WkbError::BadMagic);
    }

    let version = cursor.read_u8()?;
    if version != 0 {
        return Err(WkbError::UnsupportedVersion(version));
    }

    let flags = cursor.read_u8()?;
    if flags & 0b0010_0000 != 0 {
        return Err(WkbError::Extended);
    }
    let envelope_len: i64 = match (flags >> 1) & 0b111 {
        0 => 0,
        1 => 32,
        2 | 3 => 48,
        4 => 64,
        other => return Err(WkbError::BadEnvelope(other)),
    };

    // SRS id (4 bytes) and envelope are not needed for output.
    cursor.seek(SeekFrom::Current(4 + envelope_len))?;

    WkbReader { cursor }.read_geometry(0)
}

#[derive(Clone, Copy)]
enum Endian {
    Big,
    Little,
}

#[derive(Clone, Copy)]
struct Dims {
    z: bool,
    m: bool,
}

impl Dims {
    fn count(self) -> usize {
        2 + usize::from(self.z) + usize::from(self.m)
    }
}

struct WkbReader<'a> {
    cursor: Cursor<&'a [u8]>,
}

impl WkbReader<'_> {
    fn read_geometry(&mut self, depth: usize) -> Result<Geometry, WkbError> {
        if depth > MAX_DEPTH {
            return Err(WkbError::TooDeep);
        }

        let order = match self.cursor.read_u8()? {
            0 => Endian::Big,
            1 => Endian::Little,
            other => return Err(WkbError::BadByteOrder(other)),
        };
        let raw_type = self.read_u32(order)?;
        let (base, dims) = split_type(raw_type)?;

        let geometry = match base {
            1 => Geometry::Point {
                coordinates: self.read_point_position(order, dims)?,
            },
            2 => Geometry::LineString {
                coordinates: self.read_positions(order, dims)?,
            },
            3 => Geometry::Polygon {
                coordinates: self.read_rings(order, dims)?,
            },
            4 => Geometry::MultiPoint {
                coordinates: self.read_members(order, depth, |g| match g {
                    Geometry::Point { coordinates } => Ok(coordinates),
                    other => Err(unexpected("MultiPoint", "Point", &other)),
                })?,
            },
            5 => Geometry::MultiLineString {
                coordinates: self.read_members(order, depth, |g| match g {
                    Geometry::LineString { coordinates } => Ok(coordinates),
                    other => Err(unexpected("MultiLineString", "LineString", &other)),
                })?,
            },
            6 => Geometry::MultiPolygon {
                coordinates: self.read_members(order, depth, |g| match g {
                    Geometry::Polygon { coordinates } => Ok(coordinates),
                    other => Err(unexpected("MultiPolygon", "Polygon", &other)),
                })?,
            },
            7 => Geometry::GeometryCollection {
                geometries: self.read_members(order, depth, Ok)?,
            },
            _ => return Err(WkbError::UnsupportedType(raw_type)),
        };
        Ok(geometry)
    }

    /// Reads a member count in the parent's byte order, then that many
    /// complete WKB geometries, each with its own header.
    fn read_members<T>(
        &mut self,
        order: Endian,
        depth: usize,
        mut convert: impl FnMut(Geometry) -> Result<T, WkbError>,
    ) -> Result<Vec<T>, WkbError> {
        let count = self.read_u32(order)? as usize;
        let mut members = Vec::with_capacity(count.min(MAX_PREALLOC));
        for _ in 0..count {
            members.push(convert(self.read_geometry(depth + 1)?)?);
        }
        Ok(members)
    }

    /// A WKB point with all-NaN coordinates is the empty point.
    fn read_point_position(&mut self, order: Endian, dims: Dims) -> Result<Position, WkbError> {
        let position = self.read_position(order, dims)?;
        if position.iter().all(|c| c.is_nan()) {
            Ok(Vec::new())
        } else {
            Ok(position)
        }
    }

    fn read_rings(&mut self, order: Endian, dims: Dims) -> Result<Vec<Vec<Position>>, WkbError> {
        let count = self.read_u32(order)? as usize;
        let mut rings = Vec::with_capacity(count.min(MAX_PREALLOC));
        for _ in 0..count {
            rings.push(self.read_positions(order, dims)?);
        }
        Ok(rings)
    }

    fn read_positions(&mut self, order: Endian, dims: Dims) -> Result<Vec<Position>, WkbError> {
        let count = self.read_u32(order)? as usize;
        let mut positions = Vec::with_capacity(count.min(MAX_PREALLOC));
        for _ in 0..count {
            positions.push(self.read_position(order, dims)?);
        }
        Ok(positions)
    }

    fn read_position(&mut self, order: Endian, dims: Dims) -> Result<Position, WkbError> {
        let mut values = Vec::with_capacity(dims.count());
        for _ in 0..dims.count() {
            values.push(self.read_f64(order)?);
        }
        if dims.m {
            values.pop();
        }
        Ok(values)
    }

    fn read_u32(&mut self, order: Endian) -> Result<u32, WkbError> {
        Ok(match order {
            Endian::Big => self.cursor.read_u32::<BigEndian>()?,
            Endian::Little => self.cursor.read_u32::<LittleEndian>()?,
        })
    }

    fn read_f64(&mut self, order: Endian) -> Result<f64, WkbError> {
        Ok(match order {
            Endian::Big => self.cursor.read_f64::<BigEndian>()?,
            Endian::Little => self.cursor.read_f64::<LittleEndian>()?,
        })
    }
}

fn split_type(raw: u32) -> Result<(u32, Dims), WkbError> {
    let ewkb_z = raw & 0x8000_0000 != 0;
    let ewkb_m = raw & 0x4000_0000 != 0;
    let code = raw & 0x0FFF_FFFF;
    let (base, iso) = (code % 1000, code / 1000);
    if iso > 3 {
        return Err(WkbError::UnsupportedType(raw));
    }
    Ok((
        base,
        Dims {
            z: ewkb_z || iso == 1 || iso == 3,
            m: ewkb_m || iso == 2 || iso == 3,
        },
    ))
}

fn unexpected(parent: &'static str, expected: &'static str, found: &Geometry) -> WkbError {
    WkbError::UnexpectedMember {
        parent,
        expected,
        found: found.type_name(),
    }
}
