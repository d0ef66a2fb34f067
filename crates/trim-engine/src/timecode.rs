//! Timecode display for edit points and trim deltas, with drop-frame support.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{Fps, RationalTime, TimelineError};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimecodeFormat {
    /// `HH:MM:SS:FF`
    #[default]
    NonDropFrame,
    /// `HH:MM:SS;FF`, only meaningful at 29.97 and 59.94 fps
    DropFrame,
    /// `S.mmm`
    Seconds,
    /// Raw frame count
    Frames,
}

impl TimecodeFormat {
    pub fn recommended_for(fps: Fps) -> Self {
        if fps.is_drop_frame_rate() {
            Self::DropFrame
        } else {
            Self::NonDropFrame
        }
    }
}

/// A frame-accurate time broken into clock fields at a given rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timecode {
    pub negative: bool,
    pub hours: u32,
    pub minutes: u32,
    pub seconds: u32,
    pub frames: u32,
    pub format: TimecodeFormat,
    fps: Fps,
}

/// Whole frames per wall-clock second, as counted by the clock fields.
fn nominal_rate(fps: Fps) -> u64 {
    (fps.as_f64().round() as u64).max(1)
}

/// Frame labels skipped at the top of each minute not divisible by ten.
fn dropped_per_minute(fps: Fps) -> u64 {
    nominal_rate(fps) / 15
}

impl Timecode {
    pub fn from_time(time: &RationalTime, format: TimecodeFormat) -> Self {
        Self::from_frame_count(time.frames.unsigned_abs(), time.frames < 0, time.fps, format)
    }

    fn from_frame_count(count: u64, negative: bool, fps: Fps, format: TimecodeFormat) -> Self {
        let rate = nominal_rate(fps);
        let format = match format {
            TimecodeFormat::DropFrame if !fps.is_drop_frame_rate() => TimecodeFormat::NonDropFrame,
            other => other,
        };

        let (total_minutes, seconds, frames) = if format == TimecodeFormat::DropFrame {
            let drop = dropped_per_minute(fps);
            let per_minute = rate * 60;
            let per_ten_minutes = per_minute * 10 - drop * 9;
            let blocks = count / per_ten_minutes;
            let remainder = count % per_ten_minutes;
            let (minute_in_block, label) = if remainder < per_minute {
                (0, remainder)
            } else {
                let rest = remainder - per_minute;
                let per_dropped_minute = per_minute - drop;
                (1 + rest / per_dropped_minute, rest % per_dropped_minute + drop)
            };
            (blocks * 10 + minute_in_block, label / rate, label % rate)
        } else {
            let total_seconds = count / rate;
            (total_seconds / 60, total_seconds % 60, count % rate)
        };

        Self {
            negative: negative && count != 0,
            hours: (total_minutes / 60) as u32,
            minutes: (total_minutes % 60) as u32,
            seconds: seconds as u32,
            frames: frames as u32,
            format,
            fps,
        }
    }

    pub fn fps(&self) -> Fps {
        self.fps
    }

    fn frame_count(&self) -> u64 {
        let rate = nominal_rate(self.fps);
        let total_minutes = self.hours as u64 * 60 + self.minutes as u64;
        let labelled = (total_minutes * 60 + self.seconds as u64) * rate + self.frames as u64;
        if self.format != TimecodeFormat::DropFrame {
            return labelled;
        }
        let drop = dropped_per_minute(self.fps);
        let skipped_minutes = total_minutes - total_minutes / 10;
        labelled.saturating_sub(drop * skipped_minutes)
    }

    pub fn to_time(&self) -> RationalTime {
        let frames = self.frame_count() as i64;
        RationalTime::new(if self.negative { -frames } else { frames }, self.fps)
    }

    /// Parses `HH:MM:SS:FF`, `HH:MM:SS;FF`, `S.mmm` or a plain frame count, with an
    /// optional leading `-`.
    pub fn parse(s: &str, fps: Fps) -> Result<Self, TimelineError> {
        let text = s.trim();
        let (negative, body) = match text.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, text),
        };
        let invalid = |why: &str| TimelineError::InvalidTimecode(format!("'{s}': {why}"));

        if !body.contains([':', ';']) {
            if body.contains('.') {
                let seconds: f64 = body.parse().map_err(|_| invalid("not a number of seconds"))?;
                if !seconds.is_finite() {
                    return Err(invalid("not a number of seconds"));
                }
                let time = RationalTime::from_seconds_f64(seconds, fps);
                return Ok(Self::from_frame_count(
                    time.frames.unsigned_abs(),
                    negative,
                    fps,
                    TimecodeFormat::Seconds,
                ));
            }
            let count: u64 = body.parse().map_err(|_| invalid("not a frame count"))?;
            return Ok(Self::from_frame_count(count, negative, fps, TimecodeFormat::Frames));
        }

        let format = if body.contains(';') {
            TimecodeFormat::DropFrame
        } else {
            TimecodeFormat::NonDropFrame
        };
        if format == TimecodeFormat::DropFrame && !fps.is_drop_frame_rate() {
            return Err(invalid("drop-frame timecode needs a 29.97 or 59.94 fps rate"));
        }

        let fields = body
            .split([':', ';'])
            .map(|part| part.parse::<u32>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| invalid("fields must be unsigned integers"))?;
        let &[hours, minutes, seconds, frames] = fields.as_slice() else {
            return Err(invalid("expected HH:MM:SS:FF"));
        };
        if minutes >= 60 || seconds >= 60 {
            return Err(invalid("minutes and seconds must be below 60"));
        }
        let rate = nominal_rate(fps);
        if frames as u64 >= rate {
            return Err(invalid(&format!("frames must be below {rate}")));
        }
        if format == TimecodeFormat::DropFrame
            && seconds == 0
            && minutes % 10 != 0
            && (frames as u64) < dropped_per_minute(fps)
        {
            return Err(invalid("frame label is dropped at this minute"));
        }

        Ok(Self {
            negative: negative && (hours, minutes, seconds, frames) != (0, 0, 0, 0),
            hours,
            minutes,
            seconds,
            frames,
            format,
            fps,
        })
    }
}

impl fmt::Display for Timecode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.negative {
            f.write_str("-")?;
        }
        match self.format {
            TimecodeFormat::NonDropFrame => write!(
                f,
                "{:02}:{:02}:{:02}:{:02}",
                self.hours, self.minutes, self.seconds, self.frames
            ),
            TimecodeFormat::DropFrame => write!(
                f,
                "{:02}:{:02}:{:02};{:02}",
                self.hours, self.minutes, self.seconds, self.frames
            ),
            TimecodeFormat::Seconds => {
                let count = RationalTime::new(self.frame_count() as i64, self.fps);
                write!(f, "{:.3}", count.to_seconds_f64())
            }
            TimecodeFormat::Frames => write!(f, "{:05}", self.frame_count()),
        }
    }
}
