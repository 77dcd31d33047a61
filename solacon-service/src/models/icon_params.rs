//! Query parameters of the icon endpoint and the generator flags built from
//! them.
//!
//! Each parameter is checked on its own. A value that fails its check is
//! dropped rather than reported, so a request with a bad `color` still
//! produces an icon with the generator's default color.

use once_cell::sync::Lazy;
use regex::Regex;

// `$` matches only at the very end, so a value ending in `\n` fails.
static RX_3D_HEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^#?[a-f0-9]{3}$").expect("valid 3-digit hex pattern"));

static RX_6D_8D_HEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^#?[a-f0-9]{6}([a-f0-9]{2})?$").expect("valid 6/8-digit hex pattern")
});

static RX_RGB: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"(?i)^(rgba?\()?",
        r"[[:space:]]*[0-9]{1,3}[[:space:]]*,",
        r"[[:space:]]*[0-9]{1,3}[[:space:]]*,",
        r"[[:space:]]*[0-9]{1,3}",
        r"([[:space:]]*,[[:space:]]*[0-9]{1,3})?",
        r"\)?$",
    ))
    .expect("valid rgb(a) pattern")
});

static RX_SIZE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[1-9][0-9]*$").expect("valid size pattern"));

pub const PARAM_BACKGROUND: &str = "background";
pub const PARAM_COLOR: &str = "color";
pub const PARAM_DOWNLOAD: &str = "download";
pub const PARAM_SIZE: &str = "size";
pub const PARAM_STRING: &str = "string";

/// Raw, untrusted values straight from the query string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IconParams {
    pub background: Option<String>,
    pub color: Option<String>,
    pub download: Option<String>,
    pub size: Option<String>,
    pub string: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Background {
    Colored,
    White,
}

impl Background {
    pub fn as_str(&self) -> &'static str {
        match self {
            Background::Colored => "colored",
            Background::White => "white",
        }
    }

    fn parse(value: &str) -> Option<Self> {
        match value {
            "colored" => Some(Background::Colored),
            "white" => Some(Background::White),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Png,
    Svg,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Png => "png",
            OutputFormat::Svg => "svg",
        }
    }

    fn parse(value: &str) -> Option<Self> {
        match value {
            "png" => Some(OutputFormat::Png),
            "svg" => Some(OutputFormat::Svg),
            _ => None,
        }
    }
}

/// Parameters that passed their checks, plus the names of those that did not.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidatedParams {
    pub background: Option<Background>,
    pub color: Option<String>,
    pub format: Option<OutputFormat>,
    pub size: Option<String>,
    pub text: Option<String>,
    pub rejected: Vec<&'static str>,
}

/// Flags passed to the generator, program path excluded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorArgs(Vec<String>);

impl GeneratorArgs {
    /// Output mode asking the generator for `name\nbase64\n`.
    pub const OUTPUT_MODE: [&'static str; 2] = ["-r", "name+b64"];

    fn new() -> Self {
        Self(Self::OUTPUT_MODE.iter().map(|s| s.to_string()).collect())
    }

    fn push(&mut self, flag: &str, value: &str) {
        self.0.push(flag.to_string());
        self.0.push(value.to_string());
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

pub fn is_valid_color(value: &str) -> bool {
    RX_3D_HEX.is_match(value) || RX_6D_8D_HEX.is_match(value) || RX_RGB.is_match(value)
}

pub fn is_valid_size(value: &str) -> bool {
    RX_SIZE.is_match(value)
}

impl IconParams {
    /// Parse a raw query string. Repeated keys keep their last value and
    /// unknown keys are ignored.
    pub fn from_query(query: Option<&str>) -> Self {
        let Some(query) = query else {
            return Self::default();
        };

        match serde_urlencoded::from_str::<Vec<(String, String)>>(query) {
            Ok(pairs) => Self::from_pairs(pairs),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to decode query string");
                Self::default()
            }
        }
    }

    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut params = Self::default();
        for (key, value) in pairs {
            let slot = match key.as_str() {
                PARAM_BACKGROUND => &mut params.background,
                PARAM_COLOR => &mut params.color,
                PARAM_DOWNLOAD => &mut params.download,
                PARAM_SIZE => &mut params.size,
                PARAM_STRING => &mut params.string,
                _ => continue,
            };
            *slot = Some(value);
        }
        params
    }

    pub fn validate(&self) -> ValidatedParams {
        let mut validated = ValidatedParams::default();

        if let Some(value) = &self.background {
            validated.background = Background::parse(value);
            if validated.background.is_none() {
                validated.rejected.push(PARAM_BACKGROUND);
            }
        }

        if let Some(value) = &self.color {
            if is_valid_color(value) {
                validated.color = Some(value.clone());
            } else {
                validated.rejected.push(PARAM_COLOR);
            }
        }

        if let Some(value) = &self.download {
            validated.format = OutputFormat::parse(value);
            if validated.format.is_none() {
                validated.rejected.push(PARAM_DOWNLOAD);
            }
        }

        if let Some(value) = &self.size {
            if is_valid_size(value) {
                validated.size = Some(value.clone());
            } else {
                validated.rejected.push(PARAM_SIZE);
            }
        }

        validated.text = self.string.clone();

        validated
    }
}

impl ValidatedParams {
    /// Flags in the fixed order `-b -c -f -s -t`.
    pub fn to_args(&self) -> GeneratorArgs {
        let mut args = GeneratorArgs::new();

        if let Some(background) = self.background {
            args.push("-b", background.as_str());
        }
        if let Some(color) = &self.color {
            args.push("-c", color);
        }
        if let Some(format) = self.format {
            args.push("-f", format.as_str());
        }
        if let Some(size) = &self.size {
            args.push("-s", size);
        }
        if let Some(text) = &self.text {
            args.push("-t", text);
        }

        args
    }
}
