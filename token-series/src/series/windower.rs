use token_core::OhlcRecord;

/// The trailing `budget` records of an ascending series
pub fn window_slice(series: &[OhlcRecord], budget: usize) -> &[OhlcRecord] {
    let start = series.len().saturating_sub(budget);
    &series[start..]
}

/// Owned form of [`window_slice`]: keeps the most recent `budget` records
pub fn window(mut series: Vec<OhlcRecord>, budget: usize) -> Vec<OhlcRecord> {
    let start = series.len().saturating_sub(budget);
    series.drain(..start);
    series
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(n: usize) -> Vec<OhlcRecord> {
        (0..n)
            .map(|i| OhlcRecord::flat(i as i64 * 900_000, i as f64))
            .collect()
    }

    #[test]
    fn test_window_keeps_suffix() {
        let input = series(10);
        let windowed = window(input.clone(), 3);
        assert_eq!(windowed, input[7..].to_vec());
        assert_eq!(window_slice(&input, 3), &input[7..]);
    }

    #[test]
    fn test_window_length_is_min_of_len_and_budget() {
        for len in [0, 1, 5, 72, 120, 121] {
            for budget in [0, 1, 72, 120] {
                let windowed = window(series(len), budget);
                assert_eq!(windowed.len(), len.min(budget));
                if let (Some(last), Some(expected)) = (windowed.last(), series(len).last()) {
                    assert_eq!(last, expected);
                }
            }
        }
    }

    #[test]
    fn test_window_larger_than_series_is_identity() {
        let input = series(4);
        assert_eq!(window(input.clone(), 120), input);
    }
}
