//! Weak checksum the patch generator slides over the target.
//!
//! Two 16-bit halves: `a` is the byte sum of the window and `b` the sum of
//! its running prefix sums. Moving the window one byte to the right only
//! needs the byte leaving and the byte entering.

/// Adler-style checksum of a fixed-length window.
///
/// ```
/// use checksums::RollingChecksum;
///
/// let data = b"ABCDE";
/// let mut window = RollingChecksum::of(&data[0..3]);
/// window.roll(data[0], data[3]);
/// assert_eq!(window, RollingChecksum::of(&data[1..4]));
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct RollingChecksum {
    a: u16,
    b: u16,
    window: u32,
}

impl RollingChecksum {
    /// Checksum of `window`. Its length is the width later
    /// [`roll`](Self::roll) calls keep.
    #[must_use]
    pub fn of(window: &[u8]) -> Self {
        let (a, b) = window.iter().fold((0u16, 0u16), |(a, b), &byte| {
            let a = a.wrapping_add(u16::from(byte));
            (a, b.wrapping_add(a))
        });
        Self {
            a,
            b,
            window: window.len() as u32,
        }
    }

    /// Width of the window in bytes.
    #[must_use]
    pub const fn window_len(&self) -> u32 {
        self.window
    }

    /// Slides the window: `outgoing` leaves on the left, `incoming` enters
    /// on the right.
    pub fn roll(&mut self, outgoing: u8, incoming: u8) {
        let out = u16::from(outgoing);
        self.a = self.a.wrapping_sub(out).wrapping_add(u16::from(incoming));
        // Only the low 16 bits of the width matter modulo 2^16.
        let width = self.window as u16;
        self.b = self.b.wrapping_sub(width.wrapping_mul(out)).wrapping_add(self.a);
    }

    /// Packed `(b << 16) | a`, the key blocks are indexed under.
    #[must_use]
    pub const fn value(&self) -> u32 {
        ((self.b as u32) << 16) | self.a as u32
    }
}
