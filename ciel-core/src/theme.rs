use crate::config::ThemeConfig;

/// Alpha of the lower gradient stop.
const BOTTOM_ALPHA: f32 = 0.7;

/// 8-bit RGB color with a separate alpha channel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
    pub alpha: f32,
}

impl Rgba {
    pub const BLACK: Rgba = Rgba::opaque(0, 0, 0);

    pub const fn opaque(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue, alpha: 1.0 }
    }

    /// Parse a `#RRGGBB` string. The leading `#` is optional, surrounding
    /// whitespace and letter case are tolerated. Anything else is rejected.
    pub fn from_hex(input: &str) -> Option<Self> {
        let trimmed = input.trim();
        let digits = trimmed.strip_prefix('#').unwrap_or(trimmed);

        if digits.len() != 6 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }

        let value = u32::from_str_radix(digits, 16).ok()?;

        Some(Self::opaque(
            ((value & 0xFF_00_00) >> 16) as u8,
            ((value & 0x00_FF_00) >> 8) as u8,
            (value & 0x00_00_FF) as u8,
        ))
    }

    pub fn with_alpha(self, alpha: f32) -> Self {
        Self { alpha, ..self }
    }

    /// Source-over composite onto an opaque base, for surfaces without a
    /// real alpha channel.
    pub fn over(self, base: Rgba) -> Rgba {
        let blend = |top: u8, under: u8| -> u8 {
            (f32::from(top) * self.alpha + f32::from(under) * (1.0 - self.alpha)).round() as u8
        };

        Rgba::opaque(
            blend(self.red, base.red),
            blend(self.green, base.green),
            blend(self.blue, base.blue),
        )
    }
}

/// Four-way partition of the day, keyed by local hour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayPhase {
    Morning,
    Afternoon,
    Evening,
    Night,
}

impl DayPhase {
    /// Half-open buckets: [6,12) morning, [12,18) afternoon, [18,21)
    /// evening, everything else night.
    pub fn from_hour(hour: u32) -> Self {
        match hour {
            6..=11 => Self::Morning,
            12..=17 => Self::Afternoon,
            18..=20 => Self::Evening,
            _ => Self::Night,
        }
    }
}

/// Base gradient color per day phase.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Palette {
    pub morning: Rgba,
    pub afternoon: Rgba,
    pub evening: Rgba,
    pub night: Rgba,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            morning: Rgba::opaque(0xFF, 0x9E, 0x3D),
            afternoon: Rgba::opaque(0x00, 0x7B, 0xFF),
            evening: Rgba::opaque(0xBA, 0x4C, 0xE4),
            night: Rgba::opaque(0x1B, 0x2A, 0x4A),
        }
    }
}

impl Palette {
    /// Apply hex overrides from configuration. Entries that do not parse
    /// are logged and left at their defaults.
    pub fn with_overrides(theme: &ThemeConfig) -> Self {
        let mut palette = Self::default();

        for (slot, entry) in [
            (&mut palette.morning, &theme.morning),
            (&mut palette.afternoon, &theme.afternoon),
            (&mut palette.evening, &theme.evening),
            (&mut palette.night, &theme.night),
        ] {
            if let Some(hex) = entry {
                match Rgba::from_hex(hex) {
                    Some(color) => *slot = color,
                    None => tracing::warn!("Ignoring theme color that is not #RRGGBB: {hex}"),
                }
            }
        }

        palette
    }

    pub fn base(&self, phase: DayPhase) -> Rgba {
        match phase {
            DayPhase::Morning => self.morning,
            DayPhase::Afternoon => self.afternoon,
            DayPhase::Evening => self.evening,
            DayPhase::Night => self.night,
        }
    }
}

/// Two-stop vertical gradient: opaque at the top, the same color at 70%
/// alpha at the bottom.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gradient {
    pub top: Rgba,
    pub bottom: Rgba,
}

impl Gradient {
    pub fn for_phase(phase: DayPhase, palette: &Palette) -> Self {
        let base = palette.base(phase);

        Self {
            top: base,
            bottom: base.with_alpha(BOTTOM_ALPHA),
        }
    }

    pub fn for_hour(hour: u32, palette: &Palette) -> Self {
        Self::for_phase(DayPhase::from_hour(hour), palette)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_hex() {
        let color = Rgba::from_hex("#007BFF").expect("hex must parse");

        assert_eq!((color.red, color.green, color.blue), (0, 123, 255));
        assert_eq!(color.alpha, 1.0);
    }

    #[test]
    fn tolerates_whitespace_case_and_missing_hash() {
        assert_eq!(Rgba::from_hex("  #ba4ce4 "), Some(Rgba::opaque(0xBA, 0x4C, 0xE4)));
        assert_eq!(Rgba::from_hex("BA4CE4"), Some(Rgba::opaque(0xBA, 0x4C, 0xE4)));
    }

    #[test]
    fn rejects_wrong_lengths_and_non_hex() {
        for input in ["", "#", "#12345", "#1234567", "xyzxyz", "#00 BFF", "rgb(0,0,0)"] {
            assert_eq!(Rgba::from_hex(input), None, "{input:?} must not parse");
        }
    }

    #[test]
    fn over_blends_towards_the_base() {
        let translucent = Rgba::opaque(200, 100, 0).with_alpha(0.5);

        assert_eq!(translucent.over(Rgba::BLACK), Rgba::opaque(100, 50, 0));
        assert_eq!(
            translucent.over(Rgba::opaque(255, 255, 255)),
            Rgba::opaque(228, 178, 128)
        );
    }

    #[test]
    fn fully_opaque_over_is_identity() {
        let color = Rgba::opaque(12, 34, 56);
        assert_eq!(color.over(Rgba::opaque(255, 255, 255)), color);
    }

    #[test]
    fn hour_boundaries_land_in_the_stated_buckets() {
        assert_eq!(DayPhase::from_hour(0), DayPhase::Night);
        assert_eq!(DayPhase::from_hour(5), DayPhase::Night);
        assert_eq!(DayPhase::from_hour(6), DayPhase::Morning);
        assert_eq!(DayPhase::from_hour(11), DayPhase::Morning);
        assert_eq!(DayPhase::from_hour(12), DayPhase::Afternoon);
        assert_eq!(DayPhase::from_hour(17), DayPhase::Afternoon);
        assert_eq!(DayPhase::from_hour(18), DayPhase::Evening);
        assert_eq!(DayPhase::from_hour(20), DayPhase::Evening);
        assert_eq!(DayPhase::from_hour(21), DayPhase::Night);
        assert_eq!(DayPhase::from_hour(23), DayPhase::Night);
    }

    #[test]
    fn hour_partition_covers_the_day_without_overlap() {
        let mut counts = [0usize; 4];

        for hour in 0..24 {
            let index = match DayPhase::from_hour(hour) {
                DayPhase::Morning => 0,
                DayPhase::Afternoon => 1,
                DayPhase::Evening => 2,
                DayPhase::Night => 3,
            };
            counts[index] += 1;
        }

        assert_eq!(counts, [6, 6, 3, 9]);
    }

    #[test]
    fn gradient_keeps_the_top_opaque_and_dims_the_bottom() {
        let palette = Palette::default();
        let gradient = Gradient::for_hour(15, &palette);

        assert_eq!(gradient.top, palette.afternoon);
        assert_eq!(gradient.bottom.alpha, 0.7);
        assert_eq!(
            (gradient.bottom.red, gradient.bottom.green, gradient.bottom.blue),
            (palette.afternoon.red, palette.afternoon.green, palette.afternoon.blue)
        );
    }

    #[test]
    fn overrides_replace_only_valid_entries() {
        let theme = ThemeConfig {
            evening: Some("#112233".to_string()),
            night: Some("not-a-color".to_string()),
            ..ThemeConfig::default()
        };

        let palette = Palette::with_overrides(&theme);

        assert_eq!(palette.evening, Rgba::opaque(0x11, 0x22, 0x33));
        assert_eq!(palette.night, Palette::default().night);
        assert_eq!(palette.morning, Palette::default().morning);
    }
}
