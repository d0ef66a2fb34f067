//! Exact frame-count time values.
//!
//! All trim math runs on [`RationalTime`] so that repeated deltas never drift
//! off the frame grid. Unconstrained limits are expressed with [`TimeBound`].

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::{Add, Neg, Sub};

use crate::TimelineError;

/// Frame rate as an exact rational number of frames per second (`num / den`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawFps")]
pub struct Fps {
    num: i64,
    den: i64,
}

#[derive(Deserialize)]
struct RawFps {
    num: i64,
    den: i64,
}

impl TryFrom<RawFps> for Fps {
    type Error = TimelineError;

    fn try_from(raw: RawFps) -> Result<Self, Self::Error> {
        Fps::new(raw.num, raw.den)
    }
}

/// Relative fps difference under which two rates are treated as the same grid.
const CLOSE_RATE_TOLERANCE: f64 = 0.002;

impl Fps {
    pub const FPS_23_976: Fps = Fps { num: 24000, den: 1001 };
    pub const FPS_24: Fps = Fps { num: 24, den: 1 };
    pub const FPS_25: Fps = Fps { num: 25, den: 1 };
    pub const FPS_29_97: Fps = Fps { num: 30000, den: 1001 };
    pub const FPS_30: Fps = Fps { num: 30, den: 1 };
    pub const FPS_50: Fps = Fps { num: 50, den: 1 };
    pub const FPS_59_94: Fps = Fps { num: 60000, den: 1001 };
    pub const FPS_60: Fps = Fps { num: 60, den: 1 };

    pub const CANONICAL: [Fps; 8] = [
        Self::FPS_23_976,
        Self::FPS_24,
        Self::FPS_25,
        Self::FPS_29_97,
        Self::FPS_30,
        Self::FPS_50,
        Self::FPS_59_94,
        Self::FPS_60,
    ];

    pub fn new(num: i64, den: i64) -> Result<Self, TimelineError> {
        if num <= 0 || den <= 0 {
            return Err(TimelineError::InvalidRate { num, den });
        }
        // Reduced, so equal rates compare equal field by field.
        let g = gcd(num as i128, den as i128) as i64;
        Ok(Self {
            num: num / g,
            den: den / g,
        })
    }

    pub const fn num(&self) -> i64 {
        self.num
    }

    pub const fn den(&self) -> i64 {
        self.den
    }

    /// Frames per second as a float. Display and tolerance checks only.
    pub fn as_f64(&self) -> f64 {
        self.num as f64 / self.den as f64
    }

    fn relative_difference(&self, other: &Fps) -> f64 {
        let theirs = other.as_f64();
        (self.as_f64() - theirs).abs() / theirs
    }

    /// True when the two rates differ by at most 0.2%, so 23.976 and 24 are close.
    pub fn is_close(&self, other: &Fps) -> bool {
        self.relative_difference(other) <= CLOSE_RATE_TOLERANCE
    }

    /// Nearest canonical rate close to `self`, or `self` when none is.
    pub fn snap_to_canonical(self) -> Fps {
        Self::CANONICAL
            .iter()
            .copied()
            .filter(|canonical| self.is_close(canonical))
            .min_by(|a, b| {
                self.relative_difference(a)
                    .total_cmp(&self.relative_difference(b))
            })
            .unwrap_or(self)
    }

    /// Grid rate for showing a clip inside a sequence: the sequence rate when the
    /// clip's snapped nominal rate is close to it, otherwise the snapped nominal rate.
    pub fn select_grid_rate(nominal: Fps, sequence: Fps) -> Fps {
        let snapped = nominal.snap_to_canonical();
        if snapped.is_close(&sequence) {
            sequence
        } else {
            snapped
        }
    }

    /// Drop-frame timecode applies to the NTSC rates only.
    pub fn is_drop_frame_rate(&self) -> bool {
        *self == Self::FPS_29_97 || *self == Self::FPS_59_94
    }
}

impl fmt::Display for Fps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.den == 1 {
            write!(f, "{}fps", self.num)
        } else {
            write!(f, "{}/{}fps", self.num, self.den)
        }
    }
}

/// `floor(n / d + 1/2)` for `d > 0`.
fn round_half_up(n: i128, d: i128) -> i64 {
    saturate((2 * n + d).div_euclid(2 * d))
}

fn saturate(frames: i128) -> i64 {
    i64::try_from(frames).unwrap_or(if frames < 0 { i64::MIN } else { i64::MAX })
}

/// Direction a rescaled frame count is rounded in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rounding {
    HalfUp,
    Floor,
    Ceil,
}

fn gcd(mut a: i128, mut b: i128) -> i128 {
    a = a.abs();
    b = b.abs();
    while b != 0 {
        let t = a % b;
        a = b;
        b = t;
    }
    a
}

/// A time value of `frames / fps` seconds.
///
/// Equality, ordering and hashing compare the real-valued time, so
/// `1 @ 24fps == 2 @ 48fps`. Arithmetic between different rates rescales the
/// right operand onto the left operand's rate. Frame counts saturate at the
/// `i64` range instead of wrapping.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RationalTime {
    pub frames: i64,
    pub fps: Fps,
}

impl RationalTime {
    pub const fn new(frames: i64, fps: Fps) -> Self {
        Self { frames, fps }
    }

    pub fn from_parts(frames: i64, fps_num: i64, fps_den: i64) -> Result<Self, TimelineError> {
        Ok(Self::new(frames, Fps::new(fps_num, fps_den)?))
    }

    pub const fn zero(fps: Fps) -> Self {
        Self { frames: 0, fps }
    }

    pub fn is_zero(&self) -> bool {
        self.frames == 0
    }

    /// Nearest frame at `fps` for a time given in seconds, rounding half up.
    pub fn from_seconds_f64(seconds: f64, fps: Fps) -> Self {
        let frames = (seconds * fps.num as f64 / fps.den as f64 + 0.5).floor() as i64;
        Self { frames, fps }
    }

    pub fn to_seconds_f64(&self) -> f64 {
        self.frames as f64 * self.fps.den as f64 / self.fps.num as f64
    }

    /// Microseconds, rounded half up to match the decoder's PTS convention.
    pub fn to_micros(&self) -> i64 {
        let n = self.frames as i128 * 1_000_000 * self.fps.den as i128;
        round_half_up(n, self.fps.num as i128)
    }

    /// Re-express this time at `num / den` fps, rounding half up to the nearest frame.
    pub fn rescale(self, num: i64, den: i64) -> Result<Self, TimelineError> {
        Ok(self.rescale_to(Fps::new(num, den)?))
    }

    pub fn rescale_to(self, fps: Fps) -> Self {
        self.rescale_rounding(fps, Rounding::HalfUp)
    }

    /// Last frame at `fps` that is not later than this time.
    pub fn rescale_floor(self, fps: Fps) -> Self {
        self.rescale_rounding(fps, Rounding::Floor)
    }

    /// First frame at `fps` that is not earlier than this time.
    pub fn rescale_ceil(self, fps: Fps) -> Self {
        self.rescale_rounding(fps, Rounding::Ceil)
    }

    fn rescale_rounding(self, fps: Fps, rounding: Rounding) -> Self {
        if fps == self.fps {
            return self;
        }
        let n = self.frames as i128 * self.fps.den as i128 * fps.num as i128;
        let d = self.fps.num as i128 * fps.den as i128;
        let frames = match rounding {
            Rounding::HalfUp => round_half_up(n, d),
            Rounding::Floor => saturate(n.div_euclid(d)),
            Rounding::Ceil => saturate(-(-n).div_euclid(d)),
        };
        Self { frames, fps }
    }

    /// Clamp into `[lo, hi]` at this value's rate.
    ///
    /// A bound that is hit is rounded toward the inside of the range, so the
    /// result never lies past it. When no frame at this rate fits between `lo`
    /// and `hi` the result falls outside the range, so callers check it against
    /// the range. An inverted range resolves to `lo`.
    pub fn clamp_to(self, lo: TimeBound, hi: TimeBound) -> Self {
        let value = TimeBound::At(self);
        if value < lo {
            lo.finite().map_or(self, |t| t.rescale_ceil(self.fps))
        } else if value > hi {
            hi.finite().map_or(self, |t| t.rescale_floor(self.fps))
        } else {
            self
        }
    }

    fn cross(&self, other: &Self) -> (i128, i128) {
        let lhs = self.frames as i128 * self.fps.den as i128 * other.fps.num as i128;
        let rhs = other.frames as i128 * other.fps.den as i128 * self.fps.num as i128;
        (lhs, rhs)
    }
}

impl PartialEq for RationalTime {
    fn eq(&self, other: &Self) -> bool {
        let (lhs, rhs) = self.cross(other);
        lhs == rhs
    }
}

impl Eq for RationalTime {}

impl PartialOrd for RationalTime {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for RationalTime {
    fn cmp(&self, other: &Self) -> Ordering {
        let (lhs, rhs) = self.cross(other);
        lhs.cmp(&rhs)
    }
}

impl Hash for RationalTime {
    fn hash<H: Hasher>(&self, state: &mut H) {
        // Reduced seconds fraction, consistent with the cross-multiplied Eq.
        let numer = self.frames as i128 * self.fps.den as i128;
        let denom = self.fps.num as i128;
        let g = gcd(numer, denom).max(1);
        (numer / g).hash(state);
        (denom / g).hash(state);
    }
}

impl Add for RationalTime {
    type Output = RationalTime;

    fn add(self, rhs: RationalTime) -> RationalTime {
        let rhs = rhs.rescale_to(self.fps);
        RationalTime::new(self.frames.saturating_add(rhs.frames), self.fps)
    }
}

impl Sub for RationalTime {
    type Output = RationalTime;

    fn sub(self, rhs: RationalTime) -> RationalTime {
        let rhs = rhs.rescale_to(self.fps);
        RationalTime::new(self.frames.saturating_sub(rhs.frames), self.fps)
    }
}

impl Neg for RationalTime {
    type Output = RationalTime;

    fn neg(self) -> RationalTime {
        RationalTime::new(self.frames.saturating_neg(), self.fps)
    }
}

impl fmt::Display for RationalTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}f@{}", self.frames, self.fps)
    }
}

/// A trim limit: either a finite time or an unbounded side.
///
/// Ordered `NegInfinity < At(_) < PosInfinity`, so `min`/`max` against an
/// infinity return the finite operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeBound {
    NegInfinity,
    At(RationalTime),
    PosInfinity,
}

impl TimeBound {
    pub fn finite(&self) -> Option<RationalTime> {
        match self {
            TimeBound::At(t) => Some(*t),
            TimeBound::NegInfinity | TimeBound::PosInfinity => None,
        }
    }

    pub fn is_finite(&self) -> bool {
        matches!(self, TimeBound::At(_))
    }
}

impl From<RationalTime> for TimeBound {
    fn from(t: RationalTime) -> Self {
        TimeBound::At(t)
    }
}

impl PartialOrd for TimeBound {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TimeBound {
    fn cmp(&self, other: &Self) -> Ordering {
        use TimeBound::*;
        match (self, other) {
            (At(a), At(b)) => a.cmp(b),
            (NegInfinity, NegInfinity) | (PosInfinity, PosInfinity) => Ordering::Equal,
            (NegInfinity, _) | (_, PosInfinity) => Ordering::Less,
            (PosInfinity, _) | (_, NegInfinity) => Ordering::Greater,
        }
    }
}

impl Neg for TimeBound {
    type Output = TimeBound;

    fn neg(self) -> TimeBound {
        match self {
            TimeBound::NegInfinity => TimeBound::PosInfinity,
            TimeBound::At(t) => TimeBound::At(-t),
            TimeBound::PosInfinity => TimeBound::NegInfinity,
        }
    }
}

impl Add<RationalTime> for TimeBound {
    type Output = TimeBound;

    fn add(self, rhs: RationalTime) -> TimeBound {
        match self {
            TimeBound::At(t) => TimeBound::At(t + rhs),
            infinite => infinite,
        }
    }
}

impl fmt::Display for TimeBound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeBound::NegInfinity => f.write_str("-inf"),
            TimeBound::At(t) => write!(f, "{t}"),
            TimeBound::PosInfinity => f.write_str("+inf"),
        }
    }
}
