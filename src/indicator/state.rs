/// Color shown by a group's lamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum IndicatorColor {
    #[default]
    None,
    Red,
    Green,
    Blue,
    Yellow,
    Cyan,
    Magenta,
    White,
}

impl IndicatorColor {
    /// Red, green and blue line levels that produce this color.
    pub fn levels(&self) -> ChannelLevels {
        let (red, green, blue) = match self {
            IndicatorColor::None => (false, false, false),
            IndicatorColor::Red => (true, false, false),
            IndicatorColor::Green => (false, true, false),
            IndicatorColor::Blue => (false, false, true),
            IndicatorColor::Yellow => (true, true, false),
            IndicatorColor::Cyan => (false, true, true),
            IndicatorColor::Magenta => (true, false, true),
            IndicatorColor::White => (true, true, true),
        };
        ChannelLevels { red, green, blue }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            IndicatorColor::None => "noColor",
            IndicatorColor::Red => "red",
            IndicatorColor::Green => "green",
            IndicatorColor::Blue => "blue",
            IndicatorColor::Yellow => "yellow",
            IndicatorColor::Cyan => "cyan",
            IndicatorColor::Magenta => "magenta",
            IndicatorColor::White => "white",
        }
    }
}

/// Target lamp state: the one value shared between a group's evaluator and
/// its driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct IndicatorState {
    pub color: IndicatorColor,
    pub animated: bool,
}

impl IndicatorState {
    pub const OFF: IndicatorState = IndicatorState::steady(IndicatorColor::None);

    pub const fn steady(color: IndicatorColor) -> Self {
        Self {
            color,
            animated: false,
        }
    }

    pub const fn blinking(color: IndicatorColor) -> Self {
        Self {
            color,
            animated: true,
        }
    }
}

impl std::fmt::Display for IndicatorState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.color.as_str())?;
        if self.animated {
            f.write_str("_anime")?;
        }
        Ok(())
    }
}

/// Levels of the three output lines, written together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ChannelLevels {
    pub red: bool,
    pub green: bool,
    pub blue: bool,
}

impl ChannelLevels {
    pub const OFF: ChannelLevels = ChannelLevels {
        red: false,
        green: false,
        blue: false,
    };

    pub fn is_off(&self) -> bool {
        *self == Self::OFF
    }
}

impl std::fmt::Display for ChannelLevels {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}-{}-{}",
            u8::from(self.red),
            u8::from(self.green),
            u8::from(self.blue)
        )
    }
}
