use std::{fmt, sync::LazyLock};

use regex::Regex;
use serde::{Deserialize, Serialize};

static FRONT_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)LINE\s*(0[1-9]|[12][0-9]|3[0-6])\b").expect("front line pattern compiles")
});

/// Bucket a production line belongs to. `LINE 01` through `LINE 36` are front
/// lines; everything else, including unlabeled rows, is back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LineCategory {
    Front,
    Back,
}

impl LineCategory {
    pub fn label(&self) -> &'static str {
        match self {
            LineCategory::Front => "Front",
            LineCategory::Back => "Back",
        }
    }
}

impl fmt::Display for LineCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

pub fn categorize(line: Option<&str>) -> LineCategory {
    match line {
        Some(label) if FRONT_LINE.is_match(label) => LineCategory::Front,
        _ => LineCategory::Back,
    }
}
