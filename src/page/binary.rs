//! Binary page with typed accessors.
//!
//! All multi-byte values are big-endian. Floating-point values go through
//! their raw bit patterns so `NaN` payloads and `-0.0` survive unchanged.
//! UUIDs are two big-endian 64-bit halves, most significant first, which is
//! exactly the RFC 4122 byte order.
//!
//! Every `write_*` sets the modified flag at byte 0. The flag itself is only
//! touched through [`Page::reset_modified`] and `set_modified`.

use super::PageBuf;
use crate::types::*;
use uuid::Uuid;

/// Offset of the modified flag
pub const MODIFIED_OFFSET: usize = 0;

/// A page buffer bound to its page id
#[derive(Debug, Clone)]
pub struct Page {
    id: PageId,
    buf: PageBuf,
}

impl Page {
    /// Create a zeroed page
    pub fn new(id: PageId, size: usize) -> Self {
        Self {
            id,
            buf: PageBuf::new(size),
        }
    }

    /// Wrap an existing buffer
    pub fn from_buf(id: PageId, buf: PageBuf) -> Self {
        Self { id, buf }
    }

    pub fn id(&self) -> PageId {
        self.id
    }

    /// Page size in bytes
    pub fn size(&self) -> usize {
        self.buf.len()
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.buf.as_bytes()
    }

    /// Whether any write happened since the last flush
    pub fn is_modified(&self) -> bool {
        self.buf[MODIFIED_OFFSET] != 0
    }

    /// Clear the modified flag without touching anything else
    pub fn reset_modified(&mut self) {
        self.buf[MODIFIED_OFFSET] = 0;
    }

    pub(crate) fn set_modified(&mut self) {
        self.buf[MODIFIED_OFFSET] = 1;
    }

    fn array<const N: usize>(&self, pos: usize) -> [u8; N] {
        let mut out = [0u8; N];
        out.copy_from_slice(&self.buf[pos..pos + N]);
        out
    }

    fn put(&mut self, pos: usize, bytes: &[u8]) {
        self.set_modified();
        self.buf[pos..pos + bytes.len()].copy_from_slice(bytes);
    }

    // ---- reads ----

    pub fn read_bool(&self, pos: usize) -> bool {
        self.buf[pos] != 0
    }

    pub fn read_byte(&self, pos: usize) -> i8 {
        self.buf[pos] as i8
    }

    pub fn read_char(&self, pos: usize) -> u16 {
        u16::from_be_bytes(self.array(pos))
    }

    pub fn read_short(&self, pos: usize) -> i16 {
        i16::from_be_bytes(self.array(pos))
    }

    pub fn read_int(&self, pos: usize) -> i32 {
        i32::from_be_bytes(self.array(pos))
    }

    pub fn read_long(&self, pos: usize) -> i64 {
        i64::from_be_bytes(self.array(pos))
    }

    pub fn read_float(&self, pos: usize) -> f32 {
        f32::from_bits(u32::from_be_bytes(self.array(pos)))
    }

    pub fn read_double(&self, pos: usize) -> f64 {
        f64::from_bits(u64::from_be_bytes(self.array(pos)))
    }

    pub fn read_uuid(&self, pos: usize) -> Uuid {
        Uuid::from_bytes(self.array(pos))
    }

    pub fn read_page_id(&self, pos: usize) -> PageId {
        PageId::from_disk(self.read_long(pos))
    }

    /// Borrow `len` raw bytes starting at `pos`
    pub fn read_bytes(&self, pos: usize, len: usize) -> &[u8] {
        &self.buf[pos..pos + len]
    }

    /// Decode `len` bytes at `pos` as UTF-8, replacing invalid sequences
    pub fn read_string(&self, pos: usize, len: usize) -> String {
        String::from_utf8_lossy(self.read_bytes(pos, len)).into_owned()
    }

    // ---- writes ----

    pub fn write_bool(&mut self, pos: usize, value: bool) {
        self.put(pos, &[value as u8]);
    }

    pub fn write_byte(&mut self, pos: usize, value: i8) {
        self.put(pos, &value.to_be_bytes());
    }

    pub fn write_char(&mut self, pos: usize, value: u16) {
        self.put(pos, &value.to_be_bytes());
    }

    pub fn write_short(&mut self, pos: usize, value: i16) {
        self.put(pos, &value.to_be_bytes());
    }

    pub fn write_int(&mut self, pos: usize, value: i32) {
        self.put(pos, &value.to_be_bytes());
    }

    pub fn write_long(&mut self, pos: usize, value: i64) {
        self.put(pos, &value.to_be_bytes());
    }

    pub fn write_float(&mut self, pos: usize, value: f32) {
        self.put(pos, &value.to_bits().to_be_bytes());
    }

    pub fn write_double(&mut self, pos: usize, value: f64) {
        self.put(pos, &value.to_bits().to_be_bytes());
    }

    pub fn write_uuid(&mut self, pos: usize, value: Uuid) {
        self.put(pos, value.as_bytes());
    }

    pub fn write_page_id(&mut self, pos: usize, value: PageId) {
        self.write_long(pos, value.to_disk());
    }

    pub fn write_bytes(&mut self, pos: usize, bytes: &[u8]) {
        self.put(pos, bytes);
    }

    pub fn write_string(&mut self, pos: usize, value: &str) {
        self.put(pos, value.as_bytes());
    }

    /// Zero a byte range
    pub fn fill_zero(&mut self, pos: usize, len: usize) {
        self.set_modified();
        self.buf[pos..pos + len].fill(0);
    }

    // ---- in-place shifts ----

    /// Shift `len` bytes from `source` down to `dest` (`dest <= source`),
    /// copying front to back.
    pub fn move_left(&mut self, dest: usize, source: usize, len: usize) {
        debug_assert!(dest <= source);
        self.set_modified();
        for i in 0..len {
            self.buf[dest + i] = self.buf[source + i];
        }
    }

    /// Shift `len` bytes from `source` up to `dest` (`dest >= source`),
    /// copying back to front so the overlapping tail is read before it is
    /// overwritten.
    pub fn move_right(&mut self, dest: usize, source: usize, len: usize) {
        debug_assert!(dest >= source);
        self.set_modified();
        for i in (0..len).rev() {
            self.buf[dest + i] = self.buf[source + i];
        }
    }

    /// Shift a byte range in whichever direction is safe for the overlap
    pub fn move_bytes(&mut self, dest: usize, source: usize, len: usize) {
        if dest > source {
            self.move_right(dest, source, len);
        } else {
            self.move_left(dest, source, len);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page() -> Page {
        Page::new(PageId::new(1), 256)
    }

    #[test]
    fn test_primitive_round_trip() {
        let mut p = page();
        p.write_int(1, -123_456);
        p.write_long(5, i64::MIN + 7);
        p.write_short(13, -2);
        p.write_char(15, 0x00e9);
        p.write_byte(17, -128);
        p.write_bool(18, true);
        p.write_float(19, -1.5);
        p.write_double(23, std::f64::consts::PI);

        assert_eq!(p.read_int(1), -123_456);
        assert_eq!(p.read_long(5), i64::MIN + 7);
        assert_eq!(p.read_short(13), -2);
        assert_eq!(p.read_char(15), 0x00e9);
        assert_eq!(p.read_byte(17), -128);
        assert!(p.read_bool(18));
        assert_eq!(p.read_float(19), -1.5);
        assert_eq!(p.read_double(23), std::f64::consts::PI);
    }

    #[test]
    fn test_float_bit_patterns_preserved() {
        let mut p = page();
        let nan = f64::from_bits(0x7ff8_0000_dead_beef);
        p.write_double(1, nan);
        p.write_double(9, -0.0);
        p.write_float(17, f32::from_bits(0x7fc0_0001));

        assert_eq!(p.read_double(1).to_bits(), nan.to_bits());
        assert_eq!(p.read_double(9).to_bits(), (-0.0f64).to_bits());
        assert_eq!(p.read_float(17).to_bits(), 0x7fc0_0001);
    }

    #[test]
    fn test_big_endian_layout() {
        let mut p = page();
        p.write_int(1, 0x0102_0304);
        assert_eq!(p.read_bytes(1, 4), &[1, 2, 3, 4]);

        let uuid = Uuid::from_u64_pair(0x1122_3344_5566_7788, 0x99aa_bbcc_ddee_ff00);
        p.write_uuid(10, uuid);
        assert_eq!(p.read_long(10), 0x1122_3344_5566_7788);
        assert_eq!(p.read_long(18) as u64, 0x99aa_bbcc_ddee_ff00);
        assert_eq!(p.read_uuid(10), uuid);
    }

    #[test]
    fn test_string_round_trip() {
        let mut p = page();
        p.write_string(40, "héllo");
        assert_eq!(p.read_string(40, "héllo".len()), "héllo");
    }

    #[test]
    fn test_modified_flag() {
        let mut p = page();
        assert!(!p.is_modified());

        p.write_int(10, 5);
        assert!(p.is_modified());

        p.reset_modified();
        assert!(!p.is_modified());
        assert_eq!(p.read_int(10), 5);

        let loaded = Page::from_buf(PageId::new(2), PageBuf::from_bytes(&[1], 16));
        assert!(loaded.is_modified());
    }

    #[test]
    fn test_move_right_overlapping() {
        let mut p = page();
        p.write_bytes(10, &[1, 2, 3, 4, 5]);
        p.move_bytes(12, 10, 5);
        assert_eq!(p.read_bytes(12, 5), &[1, 2, 3, 4, 5]);
        assert_eq!(p.read_bytes(10, 2), &[1, 2]);
    }

    #[test]
    fn test_move_left_overlapping() {
        let mut p = page();
        p.write_bytes(12, &[1, 2, 3, 4, 5]);
        p.reset_modified();
        p.move_bytes(10, 12, 5);
        assert!(p.is_modified());
        assert_eq!(p.read_bytes(10, 5), &[1, 2, 3, 4, 5]);
    }
}
