//! Sequential cursors over a page.
//!
//! [`PushCursor`] writes values one after another starting at some offset;
//! [`PullCursor`] reads them back in the same order. Key codecs and
//! variable-length values (strings, matrices) are encoded through them.
//!
//! Strings are an int32 byte length followed by UTF-8 bytes. A length of 0
//! stands for both `None` and the empty string, and always decodes to `None`.

use super::matrix::{ElementKind, Matrix, MatrixData};
use super::Page;
use crate::error::{Result, StorageError};
use crate::types::*;
use uuid::Uuid;

/// Writes values sequentially into a page
pub struct PushCursor<'a> {
    page: &'a mut Page,
    position: usize,
}

impl<'a> PushCursor<'a> {
    pub fn new(page: &'a mut Page, position: usize) -> Self {
        Self { page, position }
    }

    /// Offset of the next write
    pub fn position(&self) -> usize {
        self.position
    }

    pub fn skip(&mut self, len: usize) {
        self.position += len;
    }

    pub fn push_bool(&mut self, value: bool) {
        self.page.write_bool(self.position, value);
        self.position += SIZE_OF_BOOLEAN;
    }

    pub fn push_byte(&mut self, value: i8) {
        self.page.write_byte(self.position, value);
        self.position += SIZE_OF_BYTE;
    }

    pub fn push_char(&mut self, value: u16) {
        self.page.write_char(self.position, value);
        self.position += SIZE_OF_CHAR;
    }

    pub fn push_short(&mut self, value: i16) {
        self.page.write_short(self.position, value);
        self.position += SIZE_OF_SHORT;
    }

    pub fn push_int(&mut self, value: i32) {
        self.page.write_int(self.position, value);
        self.position += SIZE_OF_INT;
    }

    pub fn push_long(&mut self, value: i64) {
        self.page.write_long(self.position, value);
        self.position += SIZE_OF_LONG;
    }

    pub fn push_float(&mut self, value: f32) {
        self.page.write_float(self.position, value);
        self.position += SIZE_OF_FLOAT;
    }

    pub fn push_double(&mut self, value: f64) {
        self.page.write_double(self.position, value);
        self.position += SIZE_OF_DOUBLE;
    }

    pub fn push_uuid(&mut self, value: Uuid) {
        self.page.write_uuid(self.position, value);
        self.position += SIZE_OF_UUID;
    }

    pub fn push_string(&mut self, value: Option<&str>) {
        let value = value.unwrap_or("");
        self.push_int(value.len() as i32);
        self.page.write_string(self.position, value);
        self.position += value.len();
    }

    /// Push a matrix. `None` is written as tag 0 with rank 0.
    pub fn push_matrix(&mut self, matrix: Option<&Matrix>) {
        match matrix {
            Some(m) => {
                self.push_byte(m.kind().tag() as i8);
                self.push_int(m.rank() as i32);
                self.push_matrix_body(m);
            }
            None => {
                self.push_byte(0);
                self.push_int(0);
            }
        }
    }

    fn push_matrix_body(&mut self, matrix: &Matrix) {
        match matrix {
            Matrix::Nested { rows, .. } => {
                self.push_int(rows.len() as i32);
                for row in rows {
                    self.push_matrix_body(row);
                }
            }
            Matrix::Vector(data) => {
                self.push_int(data.len() as i32);
                match data {
                    MatrixData::Bool(v) => v.iter().for_each(|&x| self.push_bool(x)),
                    MatrixData::Byte(v) => v.iter().for_each(|&x| self.push_byte(x)),
                    MatrixData::Char(v) => v.iter().for_each(|&x| self.push_char(x)),
                    MatrixData::Double(v) => v.iter().for_each(|&x| self.push_double(x)),
                    MatrixData::Float(v) => v.iter().for_each(|&x| self.push_float(x)),
                    MatrixData::Int(v) => v.iter().for_each(|&x| self.push_int(x)),
                    MatrixData::Long(v) => v.iter().for_each(|&x| self.push_long(x)),
                    MatrixData::Short(v) => v.iter().for_each(|&x| self.push_short(x)),
                    MatrixData::Uuid(v) => v.iter().for_each(|&x| self.push_uuid(x)),
                }
            }
        }
    }
}

/// Reads values sequentially from a page
pub struct PullCursor<'a> {
    page: &'a Page,
    position: usize,
}

impl<'a> PullCursor<'a> {
    pub fn new(page: &'a Page, position: usize) -> Self {
        Self { page, position }
    }

    /// Offset of the next read
    pub fn position(&self) -> usize {
        self.position
    }

    pub fn skip(&mut self, len: usize) {
        self.position += len;
    }

    pub fn pull_bool(&mut self) -> bool {
        let v = self.page.read_bool(self.position);
        self.position += SIZE_OF_BOOLEAN;
        v
    }

    pub fn pull_byte(&mut self) -> i8 {
        let v = self.page.read_byte(self.position);
        self.position += SIZE_OF_BYTE;
        v
    }

    pub fn pull_char(&mut self) -> u16 {
        let v = self.page.read_char(self.position);
        self.position += SIZE_OF_CHAR;
        v
    }

    pub fn pull_short(&mut self) -> i16 {
        let v = self.page.read_short(self.position);
        self.position += SIZE_OF_SHORT;
        v
    }

    pub fn pull_int(&mut self) -> i32 {
        let v = self.page.read_int(self.position);
        self.position += SIZE_OF_INT;
        v
    }

    pub fn pull_long(&mut self) -> i64 {
        let v = self.page.read_long(self.position);
        self.position += SIZE_OF_LONG;
        v
    }

    pub fn pull_float(&mut self) -> f32 {
        let v = self.page.read_float(self.position);
        self.position += SIZE_OF_FLOAT;
        v
    }

    pub fn pull_double(&mut self) -> f64 {
        let v = self.page.read_double(self.position);
        self.position += SIZE_OF_DOUBLE;
        v
    }

    pub fn pull_uuid(&mut self) -> Uuid {
        let v = self.page.read_uuid(self.position);
        self.position += SIZE_OF_UUID;
        v
    }

    pub fn pull_string(&mut self) -> Result<Option<String>> {
        let len = self.pull_length()?;
        if len == 0 {
            return Ok(None);
        }
        let s = self.page.read_string(self.position, len);
        self.position += len;
        Ok(Some(s))
    }

    /// Pull a matrix. A rank of 0 or an empty outer dimension yields `None`.
    pub fn pull_matrix(&mut self) -> Result<Option<Matrix>> {
        let tag = self.pull_byte() as u8;
        let rank = self.pull_length()?;
        if rank == 0 {
            return Ok(None);
        }
        let kind = ElementKind::from_tag(tag).ok_or_else(|| {
            StorageError::corruption(format!("unknown matrix element tag {:#04x}", tag))
        })?;
        let matrix = self.pull_matrix_body(kind, rank)?;
        Ok((!matrix.is_empty()).then_some(matrix))
    }

    fn pull_matrix_body(&mut self, kind: ElementKind, rank: usize) -> Result<Matrix> {
        let len = self.pull_length()?;
        if rank > 1 {
            let rows = (0..len)
                .map(|_| self.pull_matrix_body(kind, rank - 1))
                .collect::<Result<Vec<_>>>()?;
            return Ok(Matrix::Nested { kind, rank, rows });
        }

        let end = self.position + len * kind.size();
        if end > self.page.size() {
            return Err(StorageError::corruption(format!(
                "matrix of {} elements overruns page {}",
                len,
                self.page.id()
            )));
        }
        let data = match kind {
            ElementKind::Bool => MatrixData::Bool((0..len).map(|_| self.pull_bool()).collect()),
            ElementKind::Byte => MatrixData::Byte((0..len).map(|_| self.pull_byte()).collect()),
            ElementKind::Char => MatrixData::Char((0..len).map(|_| self.pull_char()).collect()),
            ElementKind::Double => {
                MatrixData::Double((0..len).map(|_| self.pull_double()).collect())
            }
            ElementKind::Float => MatrixData::Float((0..len).map(|_| self.pull_float()).collect()),
            ElementKind::Int => MatrixData::Int((0..len).map(|_| self.pull_int()).collect()),
            ElementKind::Long => MatrixData::Long((0..len).map(|_| self.pull_long()).collect()),
            ElementKind::Short => MatrixData::Short((0..len).map(|_| self.pull_short()).collect()),
            ElementKind::Uuid => MatrixData::Uuid((0..len).map(|_| self.pull_uuid()).collect()),
        };
        Ok(Matrix::Vector(data))
    }

    fn pull_length(&mut self) -> Result<usize> {
        let len = self.pull_int();
        let remaining = self.page.size().saturating_sub(self.position);
        if len < 0 || len as usize > remaining {
            return Err(StorageError::corruption(format!(
                "bad length {} at offset {} of page {}",
                len,
                self.position - SIZE_OF_INT,
                self.page.id()
            )));
        }
        Ok(len as usize)
    }
}

/// Encoded size of a string value
pub fn size_of_string(value: Option<&str>) -> usize {
    SIZE_OF_INT + value.map_or(0, str::len)
}
