// SPDX-License-Identifier: MPL-2.0

//! Declarative animation descriptors handed to the render surface.
//!
//! Descriptors print in the `key=value` form media-center skins use, e.g.
//! `effect=fade start=0 end=100 time=200`.

use std::fmt;

/// When the host starts an animation. Every descriptor here runs as soon as
/// it is attached.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Trigger {
    #[default]
    Conditional,
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Conditional => f.write_str("conditional"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectKind {
    Fade,
    Slide,
    Zoom,
    Rotate,
    RotateX,
}

impl fmt::Display for EffectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Fade => "fade",
            Self::Slide => "slide",
            Self::Zoom => "zoom",
            Self::Rotate => "rotate",
            Self::RotateX => "rotatex",
        })
    }
}

/// Start or end value of an animation. Slides use pairs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    Scalar(f64),
    Pair(f64, f64),
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Scalar(value)
    }
}

impl From<(f64, f64)> for Value {
    fn from((x, y): (f64, f64)) -> Self {
        Self::Pair(x, y)
    }
}

fn number(f: &mut fmt::Formatter<'_>, value: f64) -> fmt::Result {
    if value.fract() == 0.0 {
        write!(f, "{value:.0}")
    } else {
        write!(f, "{value:.2}")
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::Scalar(value) => number(f, value),
            Self::Pair(x, y) => {
                number(f, x)?;
                f.write_str(",")?;
                number(f, y)
            }
        }
    }
}

/// Rotation and zoom origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Center {
    /// Center of the slot.
    Auto,
    Point(f64, f64),
}

impl fmt::Display for Center {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::Auto => f.write_str("auto"),
            Self::Point(x, y) => fmt::Display::fmt(&Value::Pair(x, y), f),
        }
    }
}

/// Interpolation curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Easing {
    Linear,
    Quadratic,
    Cubic,
    Sine,
    Circle,
}

impl fmt::Display for Easing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Linear => "linear",
            Self::Quadratic => "quadratic",
            Self::Cubic => "cubic",
            Self::Sine => "sine",
            Self::Circle => "circle",
        })
    }
}

/// What an animation does. Durations are in milliseconds.
#[derive(Debug, Clone, PartialEq)]
pub struct Descriptor {
    pub kind: EffectKind,
    pub start: Value,
    pub end: Value,
    pub duration_ms: u64,
    pub delay_ms: u64,
    pub easing: Option<Easing>,
    pub center: Option<Center>,
}

impl Descriptor {
    pub fn new(
        kind: EffectKind,
        start: impl Into<Value>,
        end: impl Into<Value>,
        duration_ms: u64,
    ) -> Self {
        Self {
            kind,
            start: start.into(),
            end: end.into(),
            duration_ms,
            delay_ms: 0,
            easing: None,
            center: None,
        }
    }

    pub fn fade(start: f64, end: f64, duration_ms: u64) -> Self {
        Self::new(EffectKind::Fade, start, end, duration_ms)
    }

    pub fn slide(start: (f64, f64), end: (f64, f64), duration_ms: u64) -> Self {
        Self::new(EffectKind::Slide, start, end, duration_ms)
    }

    pub fn zoom(start: f64, end: f64, duration_ms: u64) -> Self {
        Self::new(EffectKind::Zoom, start, end, duration_ms)
    }

    pub fn rotate(start: f64, end: f64, duration_ms: u64) -> Self {
        Self::new(EffectKind::Rotate, start, end, duration_ms)
    }

    pub fn rotate_x(start: f64, end: f64, duration_ms: u64) -> Self {
        Self::new(EffectKind::RotateX, start, end, duration_ms)
    }

    #[must_use]
    pub fn delay(mut self, delay_ms: u64) -> Self {
        self.delay_ms = delay_ms;
        self
    }

    #[must_use]
    pub fn easing(mut self, easing: Easing) -> Self {
        self.easing = Some(easing);
        self
    }

    #[must_use]
    pub fn center(mut self, center: Center) -> Self {
        self.center = Some(center);
        self
    }

    /// Run as soon as it is attached.
    pub fn now(self) -> Animation {
        Animation {
            trigger: Trigger::Conditional,
            effect: self,
        }
    }
}

impl fmt::Display for Descriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "effect={} start={} end={} time={}",
            self.kind, self.start, self.end, self.duration_ms
        )?;
        if self.delay_ms > 0 {
            write!(f, " delay={}", self.delay_ms)?;
        }
        if let Some(easing) = self.easing {
            write!(f, " tween={easing}")?;
        }
        if let Some(center) = self.center {
            write!(f, " center={center}")?;
        }
        Ok(())
    }
}

/// An effect together with the trigger that starts it.
#[derive(Debug, Clone, PartialEq)]
pub struct Animation {
    pub trigger: Trigger,
    pub effect: Descriptor,
}

impl fmt::Display for Animation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.trigger {
            Trigger::Conditional => write!(f, "{}: {} condition=true", self.trigger, self.effect),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_host_text() {
        let fade = Descriptor::fade(0.0, 100.0, 500).delay(500).now();
        assert_eq!(
            fade.to_string(),
            "conditional: effect=fade start=0 end=100 time=500 delay=500 condition=true"
        );

        let slide = Descriptor::slide((0.0, 1100.0), (0.0, -1100.0), 10400)
            .easing(Easing::Linear)
            .center(Center::Auto);
        assert_eq!(
            slide.to_string(),
            "effect=slide start=0,1100 end=0,-1100 time=10400 tween=linear center=auto"
        );

        let rotate = Descriptor::rotate(0.0, -12.5, 900).center(Center::Point(640.0, 360.0));
        assert_eq!(
            rotate.to_string(),
            "effect=rotate start=0 end=-12.50 time=900 center=640,360"
        );
    }
}
