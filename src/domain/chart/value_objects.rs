use serde::{Deserialize, Deserializer, Serialize, Serializer};
use strum::{AsRefStr, Display as StrumDisplay, EnumIter, EnumString};

/// Value Object - RGBA colour with components in `0.0..=1.0`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self::new(r, g, b, 1.0)
    }

    pub fn from_hex(hex: u32) -> Self {
        let r = ((hex >> 16) & 0xFF) as f32 / 255.0;
        let g = ((hex >> 8) & 0xFF) as f32 / 255.0;
        let b = (hex & 0xFF) as f32 / 255.0;
        Self::rgb(r, g, b)
    }

    pub fn to_hex(&self) -> u32 {
        let channel = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u32;
        (channel(self.r) << 16) | (channel(self.g) << 8) | channel(self.b)
    }

    /// Parse `#rrggbb` or `#rrggbbaa` (the leading `#` is optional)
    pub fn parse(raw: &str) -> Option<Self> {
        let digits = raw.trim().trim_start_matches('#');
        if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        let value = u32::from_str_radix(digits, 16).ok()?;
        match digits.len() {
            6 => Some(Self::from_hex(value)),
            8 => Some(Self::from_hex(value >> 8).with_alpha((value & 0xFF) as f32 / 255.0)),
            _ => None,
        }
    }

    /// `#rrggbb` when opaque, `#rrggbbaa` otherwise
    pub fn to_hex_string(&self) -> String {
        let alpha = (self.a.clamp(0.0, 1.0) * 255.0).round() as u32;
        if alpha >= 0xFF {
            format!("#{:06x}", self.to_hex())
        } else {
            format!("#{:06x}{:02x}", self.to_hex(), alpha)
        }
    }

    pub fn to_css(&self) -> String {
        if self.a >= 1.0 {
            format!("#{:06x}", self.to_hex())
        } else {
            let channel = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u32;
            format!("rgba({},{},{},{:.3})", channel(self.r), channel(self.g), channel(self.b), self.a)
        }
    }

    pub fn with_alpha(&self, alpha: f32) -> Self {
        Self { a: alpha, ..*self }
    }

    pub fn to_array(&self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }

    pub const BULLISH: Color = Color::rgb(0.0, 0.8, 0.53);
    pub const BEARISH: Color = Color::rgb(1.0, 0.27, 0.27);
    pub const GRID: Color = Color::new(1.0, 1.0, 1.0, 0.08);
    pub const AXIS_TEXT: Color = Color::rgb(0.67, 0.67, 0.67);
    pub const CROSSHAIR: Color = Color::new(1.0, 1.0, 1.0, 0.5);
    pub const TOOLTIP_BG: Color = Color::new(0.1, 0.1, 0.1, 0.9);
    pub const WHITE: Color = Color::rgb(1.0, 1.0, 1.0);
}

impl From<u32> for Color {
    fn from(hex: u32) -> Self {
        Self::from_hex(hex)
    }
}

impl Serialize for Color {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex_string())
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Color::parse(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid colour '{}'", raw)))
    }
}

/// Value Object - quick-range buttons offered by the chart
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, StrumDisplay, EnumIter, EnumString, AsRefStr, Serialize, Deserialize,
)]
pub enum Timeframe {
    #[strum(serialize = "1D")]
    #[serde(rename = "1D")]
    OneDay,
    #[strum(serialize = "1W")]
    #[serde(rename = "1W")]
    OneWeek,
    #[strum(serialize = "1M")]
    #[serde(rename = "1M")]
    OneMonth,
    #[strum(serialize = "3M")]
    #[serde(rename = "3M")]
    ThreeMonths,
    #[strum(serialize = "6M")]
    #[serde(rename = "6M")]
    SixMonths,
    #[strum(serialize = "1Y")]
    #[serde(rename = "1Y")]
    OneYear,
    #[strum(serialize = "ALL")]
    #[serde(rename = "ALL")]
    All,
}

impl Timeframe {
    const DAY_MS: u64 = 24 * 60 * 60 * 1000;

    /// Time span covered by the range; `None` means the whole series
    pub fn span_ms(&self) -> Option<u64> {
        match self {
            Self::OneDay => Some(Self::DAY_MS),
            Self::OneWeek => Some(7 * Self::DAY_MS),
            Self::OneMonth => Some(30 * Self::DAY_MS),
            Self::ThreeMonths => Some(90 * Self::DAY_MS),
            Self::SixMonths => Some(180 * Self::DAY_MS),
            Self::OneYear => Some(365 * Self::DAY_MS),
            Self::All => None,
        }
    }
}

/// Value Object - drawing surface size in CSS pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SurfaceSize {
    pub width: u32,
    pub height: u32,
}

impl SurfaceSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// A zero-sized container cannot be drawn into
    pub fn is_drawable(&self) -> bool {
        self.width > 0 && self.height > 0
    }
}

/// Value Object - point in surface pixels
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}
