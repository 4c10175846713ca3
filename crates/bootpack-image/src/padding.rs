//! Zero-padding of plaintext images to whole pages.

/// Length of `len` bytes once rounded up to a multiple of `page_size`.
///
/// # Panics
/// If `page_size` is zero.
pub fn padded_len(len: usize, page_size: usize) -> usize {
    match len % page_size {
        0 => len,
        rem => len + (page_size - rem),
    }
}

/// Append zero bytes until the length is a multiple of `page_size`.
///
/// Aligned input (including empty input) is returned unchanged.
///
/// # Panics
/// If `page_size` is zero.
pub fn pad_to_page_boundary(mut buf: Vec<u8>, page_size: usize) -> Vec<u8> {
    let target = padded_len(buf.len(), page_size);
    buf.resize(target, 0);
    buf
}

#[cfg(test)]
mod tests {
    use super::*;
    use bootpack_core::PAGE_SIZE;
    use proptest::prelude::*;

    #[test]
    fn test_unaligned_is_padded_with_zeros() {
        let padded = pad_to_page_boundary(vec![0xFF; 1500], PAGE_SIZE);
        assert_eq!(padded.len(), 2048);
        assert!(padded[..1500].iter().all(|&b| b == 0xFF));
        assert!(padded[1500..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_aligned_is_unchanged() {
        let data: Vec<u8> = (0..2048).map(|i| i as u8).collect();
        assert_eq!(pad_to_page_boundary(data.clone(), PAGE_SIZE), data);
    }

    #[test]
    fn test_empty_stays_empty() {
        assert!(pad_to_page_boundary(Vec::new(), PAGE_SIZE).is_empty());
        assert_eq!(padded_len(0, PAGE_SIZE), 0);
    }

    #[test]
    fn test_one_byte_is_one_page() {
        assert_eq!(padded_len(1, PAGE_SIZE), PAGE_SIZE);
        assert_eq!(padded_len(PAGE_SIZE + 1, PAGE_SIZE), 2 * PAGE_SIZE);
    }

    proptest! {
        #[test]
        fn padding_is_aligned_and_idempotent(
            data in proptest::collection::vec(any::<u8>(), 0..=5000),
            page_size in 1usize..=2048,
        ) {
            let once = pad_to_page_boundary(data.clone(), page_size);
            prop_assert_eq!(once.len() % page_size, 0);
            prop_assert!(once.len() >= data.len());
            prop_assert!(once.len() - data.len() < page_size);
            prop_assert_eq!(&once[..data.len()], &data[..]);

            let twice = pad_to_page_boundary(once.clone(), page_size);
            prop_assert_eq!(twice, once);
        }
    }
}
