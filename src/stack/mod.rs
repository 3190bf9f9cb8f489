//! Scratch memory for staging native call arguments
//!
//! Foreign calls frequently need short-lived C data: a NUL-terminated
//! copy of a string, or a contiguous array of pointers to pass as
//! `char **`. [`MemoryStack`] is a caller-owned scratch region for that
//! data; a [`StackFrame`] marks the fill level on creation and restores
//! it when dropped, so everything staged inside a frame is released at
//! once with no per-allocation bookkeeping.
//!
//! Addresses handed out by a frame are valid until that frame drops.
//! A live frame holds the stack's exclusive borrow, which also keeps a
//! region from being shared across concurrent calls.

use std::mem;
use std::os::raw::{c_char, c_void};

/// A fixed-capacity scratch region with frame-based reset
pub struct MemoryStack {
    buf: Box<[u8]>,
    pointer: usize,
}

impl MemoryStack {
    /// Default capacity, enough for typical argument staging
    pub const DEFAULT_CAPACITY: usize = 64 * 1024;

    pub fn new() -> Self {
        MemoryStack::with_capacity(Self::DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        MemoryStack {
            buf: vec![0u8; capacity].into_boxed_slice(),
            pointer: 0,
        }
    }

    /// Open a frame; allocations made through it are released on drop
    pub fn push(&mut self) -> StackFrame<'_> {
        let saved = self.pointer;
        StackFrame { stack: self, saved }
    }

    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// Bytes currently staged
    pub fn used(&self) -> usize {
        self.pointer
    }
}

impl Default for MemoryStack {
    fn default() -> Self {
        MemoryStack::new()
    }
}

/// A scope on a [`MemoryStack`]; dropped, it releases its allocations
pub struct StackFrame<'a> {
    stack: &'a mut MemoryStack,
    saved: usize,
}

impl Drop for StackFrame<'_> {
    fn drop(&mut self) {
        self.stack.pointer = self.saved;
    }
}

impl StackFrame<'_> {
    /// Bump-allocate `size` bytes at the given alignment.
    ///
    /// Panics when the region is exhausted; staging more argument data
    /// than the scratch capacity is a programmer error.
    fn alloc(&mut self, size: usize, align: usize) -> *mut u8 {
        debug_assert!(align.is_power_of_two());
        let start = (self.stack.pointer + align - 1) & !(align - 1);
        assert!(
            start + size <= self.stack.buf.len(),
            "scratch region overflow: {} + {} bytes exceeds capacity {}",
            start,
            size,
            self.stack.buf.len()
        );
        self.stack.pointer = start + size;
        unsafe { self.stack.buf.as_mut_ptr().add(start) }
    }

    /// Stage a byte sequence, optionally NUL-terminated, and return its address.
    pub fn bytes(&mut self, data: &[u8], null_terminated: bool) -> *const u8 {
        let extra = usize::from(null_terminated);
        let dst = self.alloc(data.len() + extra, 1);
        unsafe {
            std::ptr::copy_nonoverlapping(data.as_ptr(), dst, data.len());
            if null_terminated {
                *dst.add(data.len()) = 0;
            }
        }
        dst
    }

    /// Stage a string as NUL-terminated C data.
    pub fn c_string(&mut self, s: &str) -> *const c_char {
        self.bytes(s.as_bytes(), true) as *const c_char
    }

    /// Stage an array of pointer addresses, contiguously and in input order.
    pub fn pointer_array(&mut self, addresses: &[*const c_void]) -> *const *const c_void {
        let base = self.alloc(
            addresses.len() * mem::size_of::<*const c_void>(),
            mem::align_of::<*const c_void>(),
        ) as *mut *const c_void;
        for (i, &address) in addresses.iter().enumerate() {
            unsafe {
                base.add(i).write(address);
            }
        }
        base
    }

    /// Stage each string NUL-terminated and return a pointer array over them.
    ///
    /// The result is suitable as a `char *const *` argument of known length.
    pub fn c_str_array(&mut self, strings: &[&str]) -> *const *const c_char {
        let pointers = self.alloc(
            strings.len() * mem::size_of::<*const c_char>(),
            mem::align_of::<*const c_char>(),
        ) as *mut *const c_char;
        for (i, s) in strings.iter().enumerate() {
            let encoded = self.bytes(s.as_bytes(), true) as *const c_char;
            unsafe {
                pointers.add(i).write(encoded);
            }
        }
        pointers
    }

    /// Stage strings without NUL and pack a pointer array followed
    /// immediately by an array of 32-bit lengths.
    ///
    /// The length array starts at `result + N * size_of::<*const c_char>()`.
    pub fn str_array_len32(&mut self, strings: &[&str]) -> *const *const c_char {
        let pointers = self.alloc(
            strings.len() * mem::size_of::<*const c_char>(),
            mem::align_of::<*const c_char>(),
        ) as *mut *const c_char;
        // The current offset is pointer-aligned, so this lands contiguously.
        let lengths = self.alloc(strings.len() * mem::size_of::<u32>(), mem::align_of::<u32>())
            as *mut u32;
        for (i, s) in strings.iter().enumerate() {
            let encoded = self.bytes(s.as_bytes(), false) as *const c_char;
            unsafe {
                pointers.add(i).write(encoded);
                lengths.add(i).write(s.len() as u32);
            }
        }
        pointers
    }

    /// Stage strings without NUL and pack a pointer array followed
    /// immediately by an array of pointer-sized lengths.
    pub fn str_array_lenp(&mut self, strings: &[&str]) -> *const *const c_char {
        let pointers = self.alloc(
            strings.len() * mem::size_of::<*const c_char>(),
            mem::align_of::<*const c_char>(),
        ) as *mut *const c_char;
        let lengths = self.alloc(
            strings.len() * mem::size_of::<usize>(),
            mem::align_of::<usize>(),
        ) as *mut usize;
        for (i, s) in strings.iter().enumerate() {
            let encoded = self.bytes(s.as_bytes(), false) as *const c_char;
            unsafe {
                pointers.add(i).write(encoded);
                lengths.add(i).write(s.len());
            }
        }
        pointers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::slice;

    #[test]
    fn test_null_terminated_round_trip() {
        let mut stack = MemoryStack::new();
        let mut frame = stack.push();

        let addr = frame.bytes(b"display:0", true);
        let staged = unsafe { slice::from_raw_parts(addr, 10) };
        assert_eq!(staged, b"display:0\0");
    }

    #[test]
    fn test_bytes_without_terminator() {
        let mut stack = MemoryStack::new();
        let mut frame = stack.push();

        let addr = frame.bytes(b"abc", false);
        let staged = unsafe { slice::from_raw_parts(addr, 3) };
        assert_eq!(staged, b"abc");
    }

    #[test]
    fn test_pointer_array_preserves_order() {
        let a = [1u8];
        let b = [2u8];
        let c = [3u8];
        let inputs = [
            a.as_ptr() as *const c_void,
            b.as_ptr() as *const c_void,
            c.as_ptr() as *const c_void,
        ];

        let mut stack = MemoryStack::new();
        let mut frame = stack.push();
        let packed = frame.pointer_array(&inputs);

        let staged = unsafe { slice::from_raw_parts(packed, 3) };
        assert_eq!(staged, &inputs);
    }

    #[test]
    fn test_c_str_array() {
        let mut stack = MemoryStack::new();
        let mut frame = stack.push();

        let packed = frame.c_str_array(&["one", "two"]);
        let pointers = unsafe { slice::from_raw_parts(packed, 2) };

        let first = unsafe { slice::from_raw_parts(pointers[0] as *const u8, 4) };
        let second = unsafe { slice::from_raw_parts(pointers[1] as *const u8, 4) };
        assert_eq!(first, b"one\0");
        assert_eq!(second, b"two\0");
    }

    #[test]
    fn test_str_array_len32_layout() {
        let strings = ["alpha", "be", "gamma!"];
        let mut stack = MemoryStack::new();
        let mut frame = stack.push();

        let packed = frame.str_array_len32(&strings);

        // Exactly N addresses in input order, lengths immediately after
        let lengths =
            unsafe { (packed as *const u8).add(strings.len() * mem::size_of::<*const c_char>()) }
                as *const u32;
        let lengths = unsafe { slice::from_raw_parts(lengths, strings.len()) };
        assert_eq!(lengths, &[5, 2, 6]);

        let pointers = unsafe { slice::from_raw_parts(packed, strings.len()) };
        for (i, s) in strings.iter().enumerate() {
            let staged = unsafe { slice::from_raw_parts(pointers[i] as *const u8, s.len()) };
            assert_eq!(staged, s.as_bytes());
        }
    }

    #[test]
    fn test_str_array_lenp_layout() {
        let strings = ["x", "yz"];
        let mut stack = MemoryStack::new();
        let mut frame = stack.push();

        let packed = frame.str_array_lenp(&strings);

        let lengths =
            unsafe { (packed as *const u8).add(strings.len() * mem::size_of::<*const c_char>()) }
                as *const usize;
        let lengths = unsafe { slice::from_raw_parts(lengths, strings.len()) };
        assert_eq!(lengths, &[1, 2]);
    }

    #[test]
    fn test_frame_drop_releases_space() {
        let mut stack = MemoryStack::with_capacity(64);
        {
            let mut frame = stack.push();
            frame.bytes(b"0123456789", true);
            assert_eq!(frame.stack.used(), 11);
        }
        assert_eq!(stack.used(), 0);

        // The space is reusable afterwards
        let mut frame = stack.push();
        frame.bytes(&[0u8; 60], false);
    }

    #[test]
    fn test_nested_frames() {
        let mut stack = MemoryStack::with_capacity(64);
        let mut outer = stack.push();
        outer.bytes(b"keep", false);

        {
            let mut inner = outer.stack.push();
            inner.bytes(b"scratch", false);
            assert_eq!(inner.stack.pointer, 11);
        }
        assert_eq!(outer.stack.pointer, 4);
    }

    #[test]
    #[should_panic(expected = "scratch region overflow")]
    fn test_overflow_panics() {
        let mut stack = MemoryStack::with_capacity(8);
        let mut frame = stack.push();
        frame.bytes(&[0u8; 16], false);
    }
}
