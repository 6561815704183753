use {
    serde::{Deserialize, Serialize},
    strum_macros::Display,
};

#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize, Display)]
pub enum Direction {
    #[strum(to_string = "up")]
    Up,
    #[strum(to_string = "down")]
    Down,
}

impl Direction {
    /// +1 for up, -1 for down. None for a zero move.
    pub fn from_sign(sign: i8) -> Option<Self> {
        match sign {
            s if s > 0 => Some(Direction::Up),
            s if s < 0 => Some(Direction::Down),
            _ => None,
        }
    }

    pub fn as_sign(self) -> i8 {
        match self {
            Direction::Up => 1,
            Direction::Down => -1,
        }
    }

    pub fn as_f64(self) -> f64 {
        self.as_sign() as f64
    }
}

/// A detected trend. Indices are inclusive and refer to the bar series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrendSegment {
    pub start_index: usize,
    pub end_index: usize,
    pub direction: Direction,
}

impl TrendSegment {
    /// Number of bars covered (inclusive range).
    pub fn bar_count(&self) -> usize {
        self.end_index - self.start_index + 1
    }

    pub fn overlaps(&self, other: &TrendSegment) -> bool {
        self.start_index <= other.end_index && other.start_index <= self.end_index
    }
}

/// The thresholds a detection run actually applied.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrendThresholds {
    /// (max(price) - min(price)) / min(price)
    pub volatility_base: f64,
    pub dynamic_slope: f64,
    pub dynamic_move: f64,
    pub slope_threshold: f64,
    pub move_threshold: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendDetection {
    pub segments: Vec<TrendSegment>,
    pub thresholds: TrendThresholds,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlap_is_inclusive() {
        let a = TrendSegment { start_index: 0, end_index: 6, direction: Direction::Up };
        let b = TrendSegment { start_index: 6, end_index: 12, direction: Direction::Down };
        let c = TrendSegment { start_index: 7, end_index: 12, direction: Direction::Down };
        assert!(a.overlaps(&b));
        assert!(!a.overlaps(&c));
        assert_eq!(a.bar_count(), 7);
    }

    #[test]
    fn direction_sign_round_trip() {
        assert_eq!(Direction::from_sign(1), Some(Direction::Up));
        assert_eq!(Direction::from_sign(-3), Some(Direction::Down));
        assert_eq!(Direction::from_sign(0), None);
        assert_eq!(Direction::Down.as_sign(), -1);
    }
}
