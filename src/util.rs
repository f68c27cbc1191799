// MIT/Apache2 License

/// Allocate `len` zeroed bytes, reporting allocation failure instead of aborting.
#[inline]
pub(crate) fn zeroed_bytes(len: usize) -> crate::Result<Vec<u8>> {
    let mut bytes = Vec::new();
    bytes.try_reserve_exact(len)?;
    bytes.resize(len, 0);
    Ok(bytes)
}

/// Copy `slice` into a fresh allocation, reporting allocation failure instead of aborting.
#[inline]
pub(crate) fn try_to_vec<T: Clone>(slice: &[T]) -> crate::Result<Vec<T>> {
    let mut copy = Vec::new();
    copy.try_reserve_exact(slice.len())?;
    copy.extend_from_slice(slice);
    Ok(copy)
}
