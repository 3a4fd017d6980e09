//! Download progress arithmetic.

/// Calculate download progress as a percentage (0.0–100.0).
///
/// Returns `None` if the total size is unknown or zero.
pub fn download_progress_percent(downloaded: u64, total: Option<u64>) -> Option<f64> {
    match total {
        Some(t) if t > 0 => {
            let pct = (downloaded as f64 / t as f64) * 100.0;
            Some(pct.min(100.0))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_known_total() {
        let pct = download_progress_percent(50, Some(100));
        assert!((pct.unwrap() - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn progress_unknown_total() {
        assert!(download_progress_percent(50, None).is_none());
    }

    #[test]
    fn progress_zero_total() {
        assert!(download_progress_percent(50, Some(0)).is_none());
    }

    #[test]
    fn progress_capped_at_100() {
        let pct = download_progress_percent(200, Some(100));
        assert!((pct.unwrap() - 100.0).abs() < f64::EPSILON);
    }
}
