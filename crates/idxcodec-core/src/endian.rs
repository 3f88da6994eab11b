//! Byte-order conversion between the host and the on-disk big-endian layout.
//!
//! Every multi-byte integer in an IDX3 file is stored big-endian. Whether a
//! conversion is needed is a property of the build target, so it is a
//! compile-time constant rather than a runtime check.

/// `true` when the host's native order differs from the format's big-endian order.
pub const SWAP_NEEDED: bool = cfg!(target_endian = "little");

/// Reports whether values read from or written to disk must be byte-swapped.
#[inline]
pub const fn is_swap_needed() -> bool {
    SWAP_NEEDED
}

/// Fixed-width unsigned integers whose byte order can be reversed.
pub trait SwapBytes: Copy {
    fn swap(self) -> Self;
}

macro_rules! impl_swap_bytes {
    ($($t:ty),* $(,)?) => {
        $(
            impl SwapBytes for $t {
                #[inline]
                fn swap(self) -> Self {
                    self.swap_bytes()
                }
            }
        )*
    };
}

impl_swap_bytes!(u8, u16, u32, u64, u128, usize);

/// Reverses the byte order of `value`. Total over all bit patterns.
#[inline]
pub fn swap_bytes<T: SwapBytes>(value: T) -> T {
    value.swap()
}

/// Converts a value as laid out on disk to host order.
#[inline]
pub fn from_disk<T: SwapBytes>(value: T) -> T {
    if SWAP_NEEDED {
        swap_bytes(value)
    } else {
        value
    }
}

/// Converts a host-order value to the on-disk layout.
#[inline]
pub fn to_disk<T: SwapBytes>(value: T) -> T {
    // The swap is its own inverse.
    from_disk(value)
}
