/// Bounds `[start, end)` of each of `slices` contiguous chunks over `len` rows.
/// Chunk sizes differ by at most one, and every chunk exists even if empty.
pub fn slice_positions(len: usize, slices: usize) -> Vec<(usize, usize)> {
    (0..slices)
        .map(|i| {
            let start = (i as u128 * len as u128 / slices as u128) as usize;
            let end = ((i as u128 + 1) * len as u128 / slices as u128) as usize;
            (start, end)
        })
        .collect()
}

pub fn slice_rows<T>(rows: Vec<T>, slices: usize) -> Vec<Vec<T>> {
    let mut remaining = rows.into_iter();
    slice_positions(remaining.len(), slices)
        .into_iter()
        .map(|(start, end)| remaining.by_ref().take(end - start).collect())
        .collect()
}
