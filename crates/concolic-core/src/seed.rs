//! A byte vector with a cursor, used both as the driver's working value
//! and as the unit of work the fuzz queue persists (§3, §4.2).

use crate::byte_val::ByteVal;
use crate::error::{CoreError, Result};
use crate::typedef::{Direction, InputSource};

/// An input template: a sequence of tagged byte values plus a cursor that
/// marks the byte currently under concolic exploration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Seed {
    pub byte_vals: Vec<ByteVal>,
    pub cursor_pos: usize,
    pub cursor_dir: Direction,
    pub source: InputSource,
}

impl Seed {
    pub fn new(source: InputSource) -> Seed {
        Seed { byte_vals: Vec::new(), cursor_pos: 0, cursor_dir: Direction::Right, source }
    }

    /// Build a seed from raw bytes, tagging every byte `Untouched` and
    /// leaving the cursor at position 0.
    pub fn from_bytes(source: InputSource, bytes: &[u8]) -> Seed {
        Seed {
            byte_vals: bytes.iter().map(|b| ByteVal::Untouched(*b)).collect(),
            cursor_pos: 0,
            cursor_dir: Direction::Right,
            source,
        }
    }

    pub fn len(&self) -> usize {
        self.byte_vals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.byte_vals.is_empty()
    }

    /// Concretize every byte to its current value. `Fixed(v)` bytes always
    /// concretize to `v`, and the result length always equals `len()`.
    pub fn concretize(&self) -> Vec<u8> {
        self.byte_vals.iter().map(|b| b.concrete()).collect()
    }

    pub fn cur_byte_val(&self) -> ByteVal {
        self.byte_vals[self.cursor_pos]
    }

    pub fn concrete_byte_at(&self, pos: usize) -> Result<u8> {
        self.byte_vals
            .get(pos)
            .map(|b| b.concrete())
            .ok_or(CoreError::OffsetOutOfRange { offset: pos, len: self.len() })
    }

    pub fn has_unfixed_byte(&self) -> bool {
        self.byte_vals.iter().any(|b| b.is_unfixed())
    }

    fn index_toward(&self, dir: Direction, offset: usize) -> Option<usize> {
        match dir {
            Direction::Right | Direction::Stay => self.cursor_pos.checked_add(offset),
            Direction::Left => self.cursor_pos.checked_sub(offset),
        }
    }

    /// Number of contiguous unfixed bytes reachable from the cursor in
    /// `dir`, including the cursor byte itself, stopping at the first
    /// `Fixed` byte or the end of the buffer.
    pub fn query_update_bound(&self, dir: Direction) -> usize {
        let mut count = 0usize;
        let mut offset = 0usize;
        loop {
            let Some(idx) = self.index_toward(dir, offset) else { break };
            let Some(bv) = self.byte_vals.get(idx) else { break };
            if bv.is_fixed() {
                break;
            }
            count += 1;
            offset += 1;
        }
        count
    }

    /// Concrete values of the bytes counted by [`Self::query_update_bound`],
    /// in traversal order (cursor byte first).
    pub fn query_neighbor_bytes(&self, dir: Direction) -> Vec<u8> {
        let bound = self.query_update_bound(dir);
        (0..bound)
            .map(|offset| {
                let idx = self.index_toward(dir, offset).expect("bounded by query_update_bound");
                self.byte_vals[idx].concrete()
            })
            .collect()
    }

    /// Constrain the byte `offset` steps from the cursor toward `dir` to
    /// `Interval(lo, hi)`. `Stay` is treated as `Right` (§9 open question).
    pub fn constrain_byte_at_inplace(&mut self, dir: Direction, offset: usize, lo: u8, hi: u8) -> Result<()> {
        let idx = self
            .index_toward(dir, offset)
            .ok_or(CoreError::OffsetOutOfRange { offset, len: self.len() })?;
        if idx >= self.len() {
            return Err(CoreError::OffsetOutOfRange { offset: idx, len: self.len() });
        }
        if lo > hi {
            return Err(CoreError::EmptyRange { low: lo as u16, high: hi as u16 });
        }
        self.byte_vals[idx] = ByteVal::Interval(lo, hi);
        Ok(())
    }

    pub fn constrain_byte_at(&self, dir: Direction, offset: usize, lo: u8, hi: u8) -> Result<Seed> {
        let mut copy = self.clone();
        copy.constrain_byte_at_inplace(dir, offset, lo, hi)?;
        Ok(copy)
    }

    /// Overwrite a contiguous run starting at the cursor toward `dir` with
    /// `Fixed` bytes, one per entry of `bytes`, extending the seed if the
    /// run runs past its current length.
    pub fn fix_cur_bytes_inplace(&mut self, dir: Direction, bytes: &[u8]) {
        for (offset, b) in bytes.iter().enumerate() {
            let Some(idx) = self.index_toward(dir, offset) else { break };
            if idx >= self.byte_vals.len() {
                self.byte_vals.resize(idx + 1, ByteVal::Untouched(0));
            }
            self.byte_vals[idx] = ByteVal::Fixed(*b);
        }
    }

    pub fn fix_cur_bytes(&self, dir: Direction, bytes: &[u8]) -> Seed {
        let mut copy = self.clone();
        copy.fix_cur_bytes_inplace(dir, bytes);
        copy
    }

    pub fn update_cur_byte_inplace(&mut self, byte_val: ByteVal) {
        self.byte_vals[self.cursor_pos] = byte_val;
    }

    pub fn update_cur_byte(&self, byte_val: ByteVal) -> Seed {
        let mut copy = self.clone();
        copy.update_cur_byte_inplace(byte_val);
        copy
    }

    pub fn set_cursor_pos_inplace(&mut self, pos: usize) {
        self.cursor_pos = pos;
    }

    pub fn set_cursor_pos(&self, pos: usize) -> Seed {
        let mut copy = self.clone();
        copy.set_cursor_pos_inplace(pos);
        copy
    }

    pub fn set_cursor_dir_inplace(&mut self, dir: Direction) {
        self.cursor_dir = dir;
    }

    pub fn set_cursor_dir(&self, dir: Direction) -> Seed {
        let mut copy = self.clone();
        copy.set_cursor_dir_inplace(dir);
        copy
    }

    fn find_unfixed_forward(&self, from: usize, to_inclusive: usize) -> Option<usize> {
        (from..=to_inclusive).find(|&i| self.byte_vals.get(i).is_some_and(|b| b.is_unfixed()))
    }

    fn find_unfixed_backward(&self, from: usize, down_to_inclusive: usize) -> Option<usize> {
        (down_to_inclusive..=from).rev().find(|&i| self.byte_vals[i].is_unfixed())
    }

    /// Advance the cursor to the next unfixed byte, wrapping once if the
    /// scan runs off the relevant end. Returns `None` on no progress
    /// (every byte is `Fixed`, or the buffer is empty) rather than landing
    /// on a `Fixed` byte — a cursor on a `Fixed` byte is never a valid
    /// post-condition of this function.
    pub fn proceed_cursor(&self) -> Option<Seed> {
        if self.is_empty() {
            return None;
        }
        let len = self.len();
        let (found, dir) = match self.cursor_dir {
            Direction::Right | Direction::Stay => {
                if self.cursor_pos + 1 < len {
                    if let Some(i) = self.find_unfixed_forward(self.cursor_pos + 1, len - 1) {
                        (Some(i), Direction::Right)
                    } else {
                        (self.find_unfixed_forward(0, self.cursor_pos), Direction::Right)
                    }
                } else {
                    (self.find_unfixed_forward(0, self.cursor_pos), Direction::Right)
                }
            }
            Direction::Left => {
                if self.cursor_pos > 0 {
                    if let Some(i) = self.find_unfixed_backward(self.cursor_pos - 1, 0) {
                        (Some(i), Direction::Left)
                    } else {
                        (self.find_unfixed_backward(len - 1, self.cursor_pos), Direction::Left)
                    }
                } else {
                    (self.find_unfixed_backward(len - 1, self.cursor_pos), Direction::Left)
                }
            }
        };
        found.map(|pos| {
            let mut copy = self.clone();
            copy.cursor_pos = pos;
            copy.cursor_dir = dir;
            copy
        })
    }

    pub fn proceed_cursor_inplace(&mut self) -> bool {
        match self.proceed_cursor() {
            Some(next) => {
                *self = next;
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seed(bytes: &[u8]) -> Seed {
        Seed::from_bytes(InputSource::StdInput, bytes)
    }

    #[test]
    fn concretize_round_trips_length_and_fixed_values() {
        let mut s = seed(&[1, 2, 3]);
        s.byte_vals[1] = ByteVal::Fixed(0x99);
        let bytes = s.concretize();
        assert_eq!(bytes.len(), s.byte_vals.len());
        assert_eq!(bytes[1], 0x99);
    }

    #[test]
    fn query_update_bound_stops_at_fixed() {
        let mut s = seed(&[1, 2, 3, 4]);
        s.byte_vals[2] = ByteVal::Fixed(9);
        assert_eq!(s.query_update_bound(Direction::Right), 2); // positions 0,1
    }

    #[test]
    fn query_neighbor_bytes_includes_cursor_byte() {
        let s = seed(&[0x10, 0x20, 0x30]);
        assert_eq!(s.query_neighbor_bytes(Direction::Right), vec![0x10, 0x20, 0x30]);
    }

    #[test]
    fn proceed_cursor_wraps_once() {
        let mut s = seed(&[1, 2, 3]);
        s.byte_vals[1] = ByteVal::Fixed(2);
        s.byte_vals[2] = ByteVal::Fixed(3);
        s.cursor_pos = 0;
        s.cursor_dir = Direction::Right;
        // only byte 0 is unfixed; stepping from byte 0 wraps back to byte 0.
        let next = s.proceed_cursor();
        assert_eq!(next.unwrap().cursor_pos, 0);
    }

    #[test]
    fn proceed_cursor_no_progress_when_all_fixed() {
        let mut s = seed(&[1, 2]);
        s.byte_vals[0] = ByteVal::Fixed(1);
        s.byte_vals[1] = ByteVal::Fixed(2);
        assert!(s.proceed_cursor().is_none());
    }

    #[test]
    fn proceed_cursor_never_lands_on_fixed() {
        let mut s = seed(&[1, 2, 3, 4, 5]);
        s.byte_vals[0] = ByteVal::Fixed(1);
        s.byte_vals[2] = ByteVal::Fixed(3);
        s.cursor_pos = 1;
        for _ in 0..10 {
            if let Some(next) = s.proceed_cursor() {
                assert!(next.cur_byte_val().is_unfixed());
                s = next;
            } else {
                break;
            }
        }
    }

    #[test]
    fn constrain_byte_at_sets_interval() {
        let s = seed(&[1, 2, 3]);
        let constrained = s.constrain_byte_at(Direction::Right, 1, 10, 20).unwrap();
        assert_eq!(constrained.byte_vals[1], ByteVal::Interval(10, 20));
    }

    #[test]
    fn fix_cur_bytes_extends_run_left() {
        let s = seed(&[0, 0, 0, 0]).set_cursor_pos(3);
        let fixed = s.fix_cur_bytes(Direction::Left, &[0x41, 0x42]);
        assert_eq!(fixed.byte_vals[3], ByteVal::Fixed(0x41));
        assert_eq!(fixed.byte_vals[2], ByteVal::Fixed(0x42));
    }
}
