//! Differential-drive mixing for two-track (tank) robots.
//!
//! Turns symbolic motion intents (drive, rotate, curve) into a signed
//! left/right speed pair. Nothing in here touches hardware; the driver in
//! `controllers::motion` feeds these pairs to its channels.
//!
//! Sign convention: positive is forward travel of a track. A left rotation
//! is counter-clockwise seen from above, so the left track runs backwards.
//!
//! # Example
//! ```rust
//! use tank_core::utils::math::differential::{self, Direction, Turn, Wheels};
//! let w = differential::curve(Direction::Forward, Turn::Left, 60, 200, 80);
//! assert_eq!(w, Wheels::new(60, 200));
//! ```

use core::fmt;

use serde::{Deserialize, Serialize};

/// Largest speed magnitude accepted on a channel (8-bit PWM duty).
pub const MAX_SPEED: u8 = 255;

/// Boundary classifying the two curve speeds as low or high.
pub const DEFAULT_SPEED_THRESHOLD: u8 = 80;

/// A character that does not name a direction or turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidSymbol(pub char);

impl fmt::Display for InvalidSymbol {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "invalid motion symbol {:?}", self.0)
    }
}

/// Travel direction of the whole vehicle.
///
/// Serialized as `'F'` / `'B'`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "char", into = "char")]
pub enum Direction {
    Forward,
    Backward,
}

impl Direction {
    /// `1` for forward, `-1` for backward.
    pub fn sign(self) -> i16 {
        match self {
            Direction::Forward => 1,
            Direction::Backward => -1,
        }
    }
}

impl TryFrom<char> for Direction {
    type Error = InvalidSymbol;

    fn try_from(c: char) -> Result<Self, Self::Error> {
        match c.to_ascii_uppercase() {
            'F' => Ok(Direction::Forward),
            'B' => Ok(Direction::Backward),
            _ => Err(InvalidSymbol(c)),
        }
    }
}

impl From<Direction> for char {
    fn from(d: Direction) -> char {
        match d {
            Direction::Forward => 'F',
            Direction::Backward => 'B',
        }
    }
}

/// Side the vehicle turns towards.
///
/// Serialized as `'L'` / `'R'`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "char", into = "char")]
pub enum Turn {
    Left,
    Right,
}

impl TryFrom<char> for Turn {
    type Error = InvalidSymbol;

    fn try_from(c: char) -> Result<Self, Self::Error> {
        match c.to_ascii_uppercase() {
            'L' => Ok(Turn::Left),
            'R' => Ok(Turn::Right),
            _ => Err(InvalidSymbol(c)),
        }
    }
}

impl From<Turn> for char {
    fn from(t: Turn) -> char {
        match t {
            Turn::Left => 'L',
            Turn::Right => 'R',
        }
    }
}

/// Signed speed pair for the left and right tracks, each in `[-255, 255]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Wheels {
    pub left: i16,
    pub right: i16,
}

impl Wheels {
    pub const STOP: Wheels = Wheels { left: 0, right: 0 };

    pub const fn new(
        left: i16,
        right: i16,
    ) -> Self {
        Self { left, right }
    }

    /// First value outside `[-255, 255]`, if any.
    pub fn out_of_range(self) -> Option<i16> {
        let limit = MAX_SPEED as i16;
        [self.left, self.right]
            .into_iter()
            .find(|v| !(-limit..=limit).contains(v))
    }
}

/// Wiring polarity of the two motors.
///
/// A reversed motor spins backwards for a positive command; correction
/// negates its value before it reaches the outputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Polarity {
    pub left_reversed: bool,
    pub right_reversed: bool,
}

impl Polarity {
    pub const NORMAL: Polarity = Polarity {
        left_reversed: false,
        right_reversed: false,
    };

    pub const fn new(
        left_reversed: bool,
        right_reversed: bool,
    ) -> Self {
        Self {
            left_reversed,
            right_reversed,
        }
    }

    /// Apply the polarity correction to a logical speed pair.
    pub fn apply(
        self,
        wheels: Wheels,
    ) -> Wheels {
        let flip = |v: i16, reversed: bool| if reversed { v.saturating_neg() } else { v };
        Wheels::new(
            flip(wheels.left, self.left_reversed),
            flip(wheels.right, self.right_reversed),
        )
    }
}

/// Both tracks at the same speed.
pub fn drive(
    direction: Direction,
    speed: u8,
) -> Wheels {
    let v = direction.sign() * speed as i16;
    Wheels::new(v, v)
}

/// Pivot in place: tracks at equal speed, opposite sign.
pub fn rotate(
    turn: Turn,
    speed: u8,
) -> Wheels {
    let s = speed as i16;
    match turn {
        Turn::Left => Wheels::new(-s, s),
        Turn::Right => Wheels::new(s, -s),
    }
}

/// Arc towards `toward` while travelling in `direction`.
///
/// The low speed goes on the inner track (the `toward` side), the high
/// speed on the outer one. The labels are trusted unless `threshold`
/// contradicts them: a `low_speed` at or above it paired with a
/// `high_speed` below it is read as swapped. Magnitudes are never altered.
pub fn curve(
    direction: Direction,
    toward: Turn,
    low_speed: u8,
    high_speed: u8,
    threshold: u8,
) -> Wheels {
    let (inner, outer) = if low_speed >= threshold && high_speed < threshold {
        (high_speed, low_speed)
    } else {
        (low_speed, high_speed)
    };

    let sign = direction.sign();
    let (inner, outer) = (sign * inner as i16, sign * outer as i16);
    match toward {
        Turn::Left => Wheels::new(inner, outer),
        Turn::Right => Wheels::new(outer, inner),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbols_parse_case_insensitive() {
        assert_eq!(Direction::try_from('f'), Ok(Direction::Forward));
        assert_eq!(Direction::try_from('B'), Ok(Direction::Backward));
        assert_eq!(Turn::try_from('l'), Ok(Turn::Left));
        assert_eq!(Turn::try_from('R'), Ok(Turn::Right));
        assert_eq!(Direction::try_from('L'), Err(InvalidSymbol('L')));
        assert_eq!(Turn::try_from('x'), Err(InvalidSymbol('x')));
    }

    #[test]
    fn test_polarity_all_combinations() {
        let w = Wheels::new(120, -45);
        for left_reversed in [false, true] {
            for right_reversed in [false, true] {
                let out = Polarity::new(left_reversed, right_reversed).apply(w);
                let exp_l = if left_reversed { -120 } else { 120 };
                let exp_r = if right_reversed { 45 } else { -45 };
                assert_eq!(out, Wheels::new(exp_l, exp_r));
            }
        }
    }

    #[test]
    fn test_polarity_keeps_zero() {
        assert_eq!(Polarity::new(true, true).apply(Wheels::STOP), Wheels::STOP);
    }

    #[test]
    fn test_drive_directions_are_sign_inverse() {
        for s in [0u8, 1, 80, 255] {
            let fwd = drive(Direction::Forward, s);
            let back = drive(Direction::Backward, s);
            assert_eq!(fwd, Wheels::new(-back.left, -back.right));
            assert_eq!(fwd.left, fwd.right);
        }
        assert_eq!(drive(Direction::Forward, 200), Wheels::new(200, 200));
    }

    #[test]
    fn test_rotate_left_right_are_swapped() {
        let left = rotate(Turn::Left, 150);
        let right = rotate(Turn::Right, 150);
        assert_eq!(left, Wheels::new(-150, 150));
        assert_eq!(left, Wheels::new(right.right, right.left));
    }

    #[test]
    fn test_curve_puts_high_speed_outside() {
        assert_eq!(
            curve(Direction::Forward, Turn::Left, 100, 200, 80),
            Wheels::new(100, 200)
        );
        assert_eq!(
            curve(Direction::Forward, Turn::Right, 100, 200, 80),
            Wheels::new(200, 100)
        );
        assert_eq!(
            curve(Direction::Backward, Turn::Left, 100, 200, 80),
            Wheels::new(-100, -200)
        );
    }

    #[test]
    fn test_curve_threshold_classifies_swapped_arguments() {
        // 200 sits above the threshold and 60 below, so 60 is the low speed.
        assert_eq!(
            curve(Direction::Forward, Turn::Left, 200, 60, 80),
            Wheels::new(60, 200)
        );
        assert_eq!(
            curve(Direction::Forward, Turn::Right, 200, 60, 80),
            Wheels::new(200, 60)
        );
    }

    #[test]
    fn test_curve_trusts_labels_on_one_side_of_threshold() {
        assert_eq!(
            curve(Direction::Forward, Turn::Left, 200, 100, 80),
            Wheels::new(200, 100)
        );
        assert_eq!(
            curve(Direction::Forward, Turn::Left, 100, 150, 200),
            Wheels::new(100, 150)
        );
    }

    #[test]
    fn test_curve_never_invents_speed() {
        assert_eq!(
            curve(Direction::Forward, Turn::Left, 0, 0, 80),
            Wheels::STOP
        );
        for threshold in [0u8, 80, 255] {
            let w = curve(Direction::Backward, Turn::Right, 30, 250, threshold);
            let mut got = [w.left.unsigned_abs(), w.right.unsigned_abs()];
            got.sort_unstable();
            assert_eq!(got, [30, 250]);
        }
    }

    #[test]
    fn test_out_of_range() {
        assert_eq!(Wheels::new(255, -255).out_of_range(), None);
        assert_eq!(Wheels::new(10, -256).out_of_range(), Some(-256));
        assert_eq!(Wheels::new(300, 0).out_of_range(), Some(300));
    }
}
