use travelmap_shared::TOTAL_COUNTRIES;

pub const ROLL_DURATION_MS: u32 = 380;
pub const ROLL_STAGGER_MS: u32 = 18;
const ROLL_STEP_MS: u32 = 36;
const ROLL_MAX_MS: u32 = 640;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExploreStats {
    pub visited: usize,
    pub total: usize,
    pub percent: u32,
}

pub fn explore_stats(visited: usize) -> ExploreStats {
    explore_stats_of(visited, TOTAL_COUNTRIES)
}

fn explore_stats_of(visited: usize, total: usize) -> ExploreStats {
    let percent = if total == 0 {
        0
    } else {
        ((visited as f64 / total as f64) * 100.0).round() as u32
    };
    ExploreStats {
        visited,
        total,
        percent,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RollDirection {
    Up,
    Down,
}

/// Digits a rolling counter column passes through from `from` to `to`,
/// wrapping around 9/0 in the given direction. Excludes `from`, ends at `to`.
pub fn digit_sequence(from: u8, to: u8, direction: RollDirection) -> Vec<u8> {
    let (from, to) = (from % 10, to % 10);
    let steps = match direction {
        RollDirection::Up => (to + 10 - from) % 10,
        RollDirection::Down => (from + 10 - to) % 10,
    };
    (1..=steps)
        .map(|step| match direction {
            RollDirection::Up => (from + step) % 10,
            RollDirection::Down => (from + 10 - step) % 10,
        })
        .collect()
}

/// One animated digit of the counter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DigitColumn {
    pub from: u8,
    pub digit: u8,
    pub sequence: Vec<u8>,
    pub delay_ms: u32,
    pub duration_ms: u32,
}

/// Columns for rolling from `previous` to `current`, most significant first.
/// Digits pair up by position from the right; a missing digit counts as 0.
pub fn digit_columns(previous: usize, current: usize) -> Vec<DigitColumn> {
    let direction = if current >= previous {
        RollDirection::Up
    } else {
        RollDirection::Down
    };
    let prev_digits = digits(previous);
    let digits = digits(current);
    let len = digits.len();

    digits
        .iter()
        .enumerate()
        .map(|(i, &digit)| {
            let from_right = len - 1 - i;
            let from = prev_digits
                .len()
                .checked_sub(from_right + 1)
                .map_or(0, |j| prev_digits[j]);
            let sequence = digit_sequence(from, digit, direction);
            let steps = sequence.len() as u32;
            DigitColumn {
                from,
                digit,
                delay_ms: from_right as u32 * ROLL_STAGGER_MS,
                duration_ms: (ROLL_DURATION_MS + steps * ROLL_STEP_MS).min(ROLL_MAX_MS),
                sequence,
            }
        })
        .collect()
}

fn digits(value: usize) -> Vec<u8> {
    value.to_string().bytes().map(|b| b - b'0').collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_is_rounded() {
        assert_eq!(explore_stats_of(0, 174).percent, 0);
        assert_eq!(explore_stats_of(1, 174).percent, 1);
        assert_eq!(explore_stats_of(87, 174).percent, 50);
        assert_eq!(explore_stats_of(174, 174).percent, 100);
        assert_eq!(explore_stats_of(3, 0).percent, 0);
    }

    #[test]
    fn stats_use_country_table() {
        let stats = explore_stats(10);
        assert_eq!(stats.total, TOTAL_COUNTRIES);
        assert_eq!(stats.visited, 10);
    }

    #[test]
    fn sequence_wraps_upward() {
        assert_eq!(digit_sequence(8, 1, RollDirection::Up), vec![9, 0, 1]);
        assert_eq!(digit_sequence(2, 4, RollDirection::Up), vec![3, 4]);
    }

    #[test]
    fn sequence_wraps_downward() {
        assert_eq!(digit_sequence(1, 8, RollDirection::Down), vec![0, 9, 8]);
        assert!(digit_sequence(5, 5, RollDirection::Down).is_empty());
    }

    #[test]
    fn columns_pair_from_the_right() {
        let columns = digit_columns(9, 10);
        assert_eq!(columns.len(), 2);
        assert_eq!(columns[0].from, 0);
        assert_eq!(columns[0].digit, 1);
        assert_eq!(columns[0].sequence, vec![1]);
        assert_eq!(columns[0].delay_ms, ROLL_STAGGER_MS);
        assert_eq!(columns[1].from, 9);
        assert_eq!(columns[1].digit, 0);
        assert_eq!(columns[1].sequence, vec![0]);
        assert_eq!(columns[1].delay_ms, 0);
        assert_eq!(columns[1].duration_ms, ROLL_DURATION_MS + 36);
    }

    #[test]
    fn duration_is_capped() {
        let columns = digit_columns(0, 9);
        assert_eq!(columns[0].sequence.len(), 9);
        assert_eq!(columns[0].duration_ms, 640);
    }

    #[test]
    fn decreasing_rolls_down() {
        let columns = digit_columns(10, 9);
        assert_eq!(columns.len(), 1);
        assert_eq!(columns[0].sequence, vec![9]);
    }
}
