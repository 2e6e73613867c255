//! Alignment and padding arithmetic shared by the arena and stack allocators.
//!
//! Every function here works on plain addresses (`usize`). Alignments must be
//! powers of two; passing anything else is a programming error and panics.

/// Alignment used when the caller does not ask for one: two machine words.
pub const DEFAULT_ALIGNMENT: usize = 2 * core::mem::size_of::<usize>();

/// Returns `true` if `x` is a non-zero power of two.
///
/// # Examples
/// ```
/// use linear_alloc::align::is_power_of_two;
///
/// assert!(is_power_of_two(1));
/// assert!(is_power_of_two(64));
/// assert!(!is_power_of_two(0));
/// assert!(!is_power_of_two(24));
/// ```
#[inline]
pub const fn is_power_of_two(x: usize) -> bool {
    x != 0 && x & (x - 1) == 0
}

/// Rounds `addr` up to the next multiple of `alignment`.
///
/// # Panics
/// If `alignment` is not a power of two.
///
/// # Examples
/// ```
/// use linear_alloc::align::align_forward;
///
/// assert_eq!(align_forward(13, 8), 16);
/// assert_eq!(align_forward(16, 8), 16);
/// assert_eq!(align_forward(0, 4096), 0);
/// ```
#[inline]
pub const fn align_forward(addr: usize, alignment: usize) -> usize {
    assert!(
        is_power_of_two(alignment),
        "align_forward expected a power of two alignment"
    );

    // Same as `addr % alignment`, the mask is valid because alignment is 2^k.
    let modulo = addr & (alignment - 1);
    if modulo == 0 {
        addr
    } else {
        addr + (alignment - modulo)
    }
}

/// Number of bytes to skip from `addr` so that the landing address is aligned
/// to `alignment` and the `header_size` bytes right before it form a header
/// aligned to `header_alignment`.
///
/// The result is the smallest such padding, so it is always at least
/// `header_size`.
///
/// # Panics
/// If either alignment is not a power of two, or if `header_size` is not a
/// multiple of `header_alignment`.
///
/// # Examples
/// ```
/// use linear_alloc::align::padding_with_header;
///
/// // Aligned start: the padding is exactly the header.
/// assert_eq!(padding_with_header(64, 8, 16, 8), 16);
/// // Unaligned start: skip to the header boundary first.
/// assert_eq!(padding_with_header(65, 8, 16, 8), 23);
/// // Payload alignment larger than the header.
/// assert_eq!(padding_with_header(64, 32, 16, 8), 32);
/// ```
#[inline]
pub const fn padding_with_header(
    addr: usize,
    alignment: usize,
    header_size: usize,
    header_alignment: usize,
) -> usize {
    assert!(
        is_power_of_two(alignment),
        "padding_with_header expected the memory alignment to be a power of two"
    );
    assert!(
        is_power_of_two(header_alignment),
        "padding_with_header expected the header alignment to be a power of two"
    );
    assert!(
        header_size & (header_alignment - 1) == 0,
        "padding_with_header expected the header size to be a multiple of its alignment"
    );

    // Both alignments are powers of two, so the larger one is a multiple of
    // the smaller. A payload on that boundary keeps `payload - header_size`
    // on a header boundary as well.
    let strictest = if alignment > header_alignment {
        alignment
    } else {
        header_alignment
    };
    align_forward(addr + header_size, strictest) - addr
}
