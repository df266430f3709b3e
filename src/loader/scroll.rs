//! Autoload trigger for infinite scroll

/// Whether the viewport is close enough to the end of the list to fetch more.
///
/// `last_visible` is the index of the last rendered row; `threshold` is how
/// many rows before the end the next page should be requested.
pub fn should_autoload(len: usize, last_visible: usize, threshold: usize) -> bool {
    len > 0 && last_visible.saturating_add(threshold).saturating_add(1) >= len
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_near_end_triggers() {
        assert!(should_autoload(10, 9, 0));
        assert!(should_autoload(10, 7, 2));
        assert!(!should_autoload(10, 6, 2));
    }

    #[test]
    fn test_empty_list_never_triggers() {
        assert!(!should_autoload(0, 0, 5));
    }

    #[test]
    fn test_index_past_end_triggers() {
        assert!(should_autoload(4, 10, 0));
        assert!(should_autoload(4, usize::MAX, 3));
    }
}
