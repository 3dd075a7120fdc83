//! Minimal MATLAB level-5 MAT-file reader
//!
//! Reads the numeric and character matrices that song annotation files
//! (`.not.mat`) are made of, including zlib-compressed variables as
//! written by MATLAB's default v7 format. Cell arrays, structs, objects
//! and sparse matrices are skipped.

use crate::error::{PsdError, Result};
use flate2::read::ZlibDecoder;
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

const HEADER_LEN: usize = 128;

// Data element types
const MI_INT8: u32 = 1;
const MI_UINT8: u32 = 2;
const MI_INT16: u32 = 3;
const MI_UINT16: u32 = 4;
const MI_INT32: u32 = 5;
const MI_UINT32: u32 = 6;
const MI_SINGLE: u32 = 7;
const MI_DOUBLE: u32 = 9;
const MI_INT64: u32 = 12;
const MI_UINT64: u32 = 13;
const MI_MATRIX: u32 = 14;
const MI_COMPRESSED: u32 = 15;
const MI_UTF8: u32 = 16;

// Array classes
const MX_CHAR: u8 = 4;
const MX_DOUBLE: u8 = 6;
const MX_UINT64: u8 = 15;

/// Payload of one MAT variable
#[derive(Debug, Clone, PartialEq)]
pub enum MatData {
    /// Real part, column-major
    Numeric(Vec<f64>),
    /// Character matrix flattened column-major
    Char(String),
}

/// One named MAT variable
#[derive(Debug, Clone, PartialEq)]
pub struct MatArray {
    pub dims: Vec<usize>,
    pub data: MatData,
}

impl MatArray {
    pub fn as_numeric(&self) -> Option<&[f64]> {
        match &self.data {
            MatData::Numeric(values) => Some(values),
            MatData::Char(_) => None,
        }
    }

    pub fn as_char(&self) -> Option<&str> {
        match &self.data {
            MatData::Char(text) => Some(text),
            MatData::Numeric(_) => None,
        }
    }
}

/// Parsed MAT file: supported variables by name
#[derive(Debug, Clone, Default)]
pub struct MatFile {
    variables: HashMap<String, MatArray>,
}

impl MatFile {
    /// Read and parse a MAT file from disk
    pub fn open(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        Self::parse(&bytes).map_err(|e| match e {
            PsdError::DataFormat(msg) => {
                PsdError::DataFormat(format!("{}: {}", path.display(), msg))
            }
            other => other,
        })
    }

    /// Parse an in-memory MAT file
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_LEN {
            return Err(malformed("file shorter than MAT header"));
        }

        let big_endian = match &bytes[126..128] {
            b"IM" => false,
            b"MI" => true,
            _ => return Err(malformed("missing MAT endian indicator")),
        };

        let mut cursor = Cursor {
            bytes,
            pos: HEADER_LEN,
            big_endian,
        };
        let mut variables = HashMap::new();
        read_variables(&mut cursor, &mut variables)?;

        Ok(Self { variables })
    }

    pub fn get(&self, name: &str) -> Option<&MatArray> {
        self.variables.get(name)
    }
}

/// Collect every top-level matrix, inflating compressed elements in place
fn read_variables(cursor: &mut Cursor<'_>, variables: &mut HashMap<String, MatArray>) -> Result<()> {
    while cursor.remaining() >= 8 {
        let element = cursor.read_element()?;
        match element.data_type {
            MI_MATRIX => {
                if let Some((name, array)) = parse_matrix(element.payload, cursor.big_endian)? {
                    variables.insert(name, array);
                }
            }
            MI_COMPRESSED => {
                let inflated = inflate(element.payload)?;
                let mut inner = Cursor {
                    bytes: &inflated,
                    pos: 0,
                    big_endian: cursor.big_endian,
                };
                read_variables(&mut inner, variables)?;
            }
            other => log::debug!("Skipping top-level MAT element of type {}", other),
        }
    }
    Ok(())
}

fn inflate(payload: &[u8]) -> Result<Vec<u8>> {
    let mut inflated = Vec::new();
    ZlibDecoder::new(payload)
        .read_to_end(&mut inflated)
        .map_err(|e| malformed(&format!("corrupt compressed element: {}", e)))?;
    Ok(inflated)
}

fn malformed(msg: &str) -> PsdError {
    PsdError::DataFormat(format!("malformed MAT file: {}", msg))
}

struct Element<'a> {
    data_type: u32,
    payload: &'a [u8],
}

struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
    big_endian: bool,
}

impl<'a> Cursor<'a> {
    fn remaining(&self) -> usize {
        self.bytes.len().saturating_sub(self.pos)
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        if self.remaining() < len {
            return Err(malformed("unexpected end of data"));
        }
        let slice = &self.bytes[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    fn read_u32(&mut self) -> Result<u32> {
        let raw = self.take(4)?;
        let buf = [raw[0], raw[1], raw[2], raw[3]];
        Ok(if self.big_endian {
            u32::from_be_bytes(buf)
        } else {
            u32::from_le_bytes(buf)
        })
    }

    /// Read one tagged data element, consuming its padding
    fn read_element(&mut self) -> Result<Element<'a>> {
        let first = self.read_u32()?;

        // Small data element: size in the upper half-word, data in 4 bytes
        if first >> 16 != 0 {
            let data_type = first & 0xFFFF;
            let len = (first >> 16) as usize;
            if len > 4 {
                return Err(malformed("small data element larger than 4 bytes"));
            }
            let packed = self.take(4)?;
            return Ok(Element {
                data_type,
                payload: &packed[..len],
            });
        }

        let data_type = first;
        let len = self.read_u32()? as usize;
        let payload = self.take(len)?;

        // Compressed elements are not padded; everything else is to 8 bytes
        if data_type != MI_COMPRESSED {
            let padding = (8 - len % 8) % 8;
            let padding = padding.min(self.remaining());
            self.take(padding)?;
        }

        Ok(Element { data_type, payload })
    }
}

fn parse_matrix(payload: &[u8], big_endian: bool) -> Result<Option<(String, MatArray)>> {
    if payload.is_empty() {
        return Ok(None);
    }

    let mut cursor = Cursor {
        bytes: payload,
        pos: 0,
        big_endian,
    };

    let flags = cursor.read_element()?;
    if flags.data_type != MI_UINT32 || flags.payload.len() < 4 {
        return Err(malformed("array flags subelement missing"));
    }
    let flags_word = decode_u32s(flags.payload, big_endian)[0];
    let class = (flags_word & 0xFF) as u8;

    let dims_element = cursor.read_element()?;
    let dims: Vec<usize> = decode_numeric(dims_element.data_type, dims_element.payload, big_endian)?
        .into_iter()
        .map(|d| d.max(0.0) as usize)
        .collect();

    let name_element = cursor.read_element()?;
    let name = String::from_utf8_lossy(name_element.payload).to_string();

    let supported = class == MX_CHAR || (MX_DOUBLE..=MX_UINT64).contains(&class);
    if !supported {
        log::debug!("Skipping MAT variable '{}' of class {}", name, class);
        return Ok(None);
    }

    let real = if cursor.remaining() >= 8 {
        cursor.read_element()?
    } else {
        Element {
            data_type: MI_DOUBLE,
            payload: &[],
        }
    };

    let data = if class == MX_CHAR {
        MatData::Char(decode_chars(real.data_type, real.payload, big_endian)?)
    } else {
        MatData::Numeric(decode_numeric(real.data_type, real.payload, big_endian)?)
    };

    Ok(Some((name, MatArray { dims, data })))
}

fn decode_u32s(payload: &[u8], big_endian: bool) -> Vec<u32> {
    payload
        .chunks_exact(4)
        .map(|c| {
            let buf = [c[0], c[1], c[2], c[3]];
            if big_endian {
                u32::from_be_bytes(buf)
            } else {
                u32::from_le_bytes(buf)
            }
        })
        .collect()
}

macro_rules! decode_as {
    ($payload:expr, $big:expr, $ty:ty, $n:expr) => {
        $payload
            .chunks_exact($n)
            .map(|c| {
                let mut buf = [0u8; $n];
                buf.copy_from_slice(c);
                let v = if $big {
                    <$ty>::from_be_bytes(buf)
                } else {
                    <$ty>::from_le_bytes(buf)
                };
                v as f64
            })
            .collect::<Vec<f64>>()
    };
}

fn decode_numeric(data_type: u32, payload: &[u8], big_endian: bool) -> Result<Vec<f64>> {
    let values: Vec<f64> = match data_type {
        MI_INT8 => payload.iter().map(|&b| b as i8 as f64).collect(),
        MI_UINT8 => payload.iter().map(|&b| b as f64).collect(),
        MI_INT16 => decode_as!(payload, big_endian, i16, 2),
        MI_UINT16 => decode_as!(payload, big_endian, u16, 2),
        MI_INT32 => decode_as!(payload, big_endian, i32, 4),
        MI_UINT32 => decode_as!(payload, big_endian, u32, 4),
        MI_SINGLE => decode_as!(payload, big_endian, f32, 4),
        MI_DOUBLE => decode_as!(payload, big_endian, f64, 8),
        MI_INT64 => decode_as!(payload, big_endian, i64, 8),
        MI_UINT64 => decode_as!(payload, big_endian, u64, 8),
        other => {
            return Err(malformed(&format!(
                "unsupported numeric data type {}",
                other
            )))
        }
    };
    Ok(values)
}

fn decode_chars(data_type: u32, payload: &[u8], big_endian: bool) -> Result<String> {
    match data_type {
        MI_UTF8 | MI_UINT8 | MI_INT8 => Ok(String::from_utf8_lossy(payload).to_string()),
        MI_UINT16 => {
            let units: Vec<u16> = decode_as!(payload, big_endian, u16, 2)
                .into_iter()
                .map(|v| v as u16)
                .collect();
            Ok(String::from_utf16_lossy(&units))
        }
        other => Err(malformed(&format!("unsupported char data type {}", other))),
    }
}

/// Builders for synthetic level-5 MAT files, shared by the test suites
#[cfg(test)]
pub(crate) mod fixture {
    fn element(data_type: u32, payload: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&data_type.to_le_bytes());
        out.extend_from_slice(&(payload.len() as u32).to_le_bytes());
        out.extend_from_slice(payload);
        while out.len() % 8 != 0 {
            out.push(0);
        }
        out
    }

    fn matrix(name: &str, class: u8, dims: [i32; 2], real: Vec<u8>) -> Vec<u8> {
        let mut body = Vec::new();
        let mut flags = Vec::new();
        flags.extend_from_slice(&(class as u32).to_le_bytes());
        flags.extend_from_slice(&0u32.to_le_bytes());
        body.extend(element(6, &flags));

        let mut dim_bytes = Vec::new();
        dim_bytes.extend_from_slice(&dims[0].to_le_bytes());
        dim_bytes.extend_from_slice(&dims[1].to_le_bytes());
        body.extend(element(5, &dim_bytes));

        body.extend(element(1, name.as_bytes()));
        body.extend(real);
        element(14, &body)
    }

    pub fn header() -> Vec<u8> {
        let mut out = vec![b' '; 116];
        let text = b"MATLAB 5.0 MAT-file, test fixture";
        out[..text.len()].copy_from_slice(text);
        out.extend_from_slice(&[0u8; 8]);
        out.extend_from_slice(&0x0100u16.to_le_bytes());
        out.extend_from_slice(b"IM");
        out
    }

    pub fn column(name: &str, values: &[f64]) -> Vec<u8> {
        let bytes: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
        matrix(name, 6, [values.len() as i32, 1], element(9, &bytes))
    }

    pub fn chars(name: &str, text: &str) -> Vec<u8> {
        let bytes: Vec<u8> = text.encode_utf16().flat_map(|u| u.to_le_bytes()).collect();
        matrix(
            name,
            4,
            [1, text.encode_utf16().count() as i32],
            element(4, &bytes),
        )
    }

    /// Wrap one element in a zlib-compressed element, as MATLAB v7 saves
    pub fn compressed(inner: &[u8]) -> Vec<u8> {
        use std::io::Write;

        let mut encoder =
            flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::default());
        encoder.write_all(inner).unwrap();
        let payload = encoder.finish().unwrap();

        let mut out = Vec::new();
        out.extend_from_slice(&15u32.to_le_bytes());
        out.extend_from_slice(&(payload.len() as u32).to_le_bytes());
        out.extend(payload);
        out
    }

    /// Annotation-shaped MAT file
    pub fn annotation(onsets: &[f64], offsets: &[f64], syllables: &str) -> Vec<u8> {
        let mut out = header();
        out.extend(column("onsets", onsets));
        out.extend(column("offsets", offsets));
        out.extend(chars("syllables", syllables));
        out
    }

    /// Annotation-shaped MAT file with every variable compressed
    pub fn compressed_annotation(onsets: &[f64], offsets: &[f64], syllables: &str) -> Vec<u8> {
        let mut out = header();
        out.extend(compressed(&column("onsets", onsets)));
        out.extend(compressed(&column("offsets", offsets)));
        out.extend(compressed(&chars("syllables", syllables)));
        out
    }
}
