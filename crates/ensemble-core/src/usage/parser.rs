//! Token counts recognized in raw worker terminal output.

use once_cell::sync::Lazy;
use regex::Regex;

/// Share of an aggregate token count attributed to input, in percent.
///
/// Approximate: terminal output only reports a combined figure, and this
/// split is a rule of thumb rather than a measurement.
pub const AGGREGATE_INPUT_PERCENT: u64 = 75;

/// `Token usage: 1000/200000; 199000 remaining`
static AGGREGATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)token usage:\s*([\d,]+)\s*/\s*([\d,]+)\s*;\s*([\d,]+)\s*remaining")
        .expect("aggregate pattern is valid")
});

/// `1,200 input tokens ... 340 output tokens`
static EXPLICIT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)([\d,]+)\s+input\b.*?([\d,]+)\s+output\b")
        .expect("explicit pattern is valid")
});

/// Token counts extracted from raw output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedTokens {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

fn parse_count(raw: &str) -> Option<u64> {
    raw.replace(',', "").parse().ok()
}

/// Recognizes token counts in `text`.
///
/// The aggregate "used/limit; remaining" form takes priority and is split
/// [`AGGREGATE_INPUT_PERCENT`] / remainder. Otherwise an explicit
/// "<N> input ... <M> output" form is used. Returns `None` when neither
/// matches completely.
pub fn parse_tokens_from_raw_output(text: &str) -> Option<ParsedTokens> {
    if let Some(caps) = AGGREGATE_RE.captures(text)
        && let Some(used) = parse_count(&caps[1])
    {
        // Widened so huge counts cannot overflow; the result is at most `used`.
        let input_tokens = (u128::from(used) * u128::from(AGGREGATE_INPUT_PERCENT) / 100) as u64;
        return Some(ParsedTokens {
            input_tokens,
            output_tokens: used - input_tokens,
        });
    }

    let caps = EXPLICIT_RE.captures(text)?;
    Some(ParsedTokens {
        input_tokens: parse_count(&caps[1])?,
        output_tokens: parse_count(&caps[2])?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aggregate_pattern_uses_approximate_split() {
        // 75/25 is a heuristic policy, not measured ground truth.
        let parsed = parse_tokens_from_raw_output("Token usage: 1000/200000; 199000 remaining");
        assert_eq!(
            parsed,
            Some(ParsedTokens {
                input_tokens: 750,
                output_tokens: 250
            })
        );
    }

    #[test]
    fn test_aggregate_pattern_with_separators() {
        let parsed =
            parse_tokens_from_raw_output("... token usage: 12,345 / 200,000; 187,655 remaining ...")
                .unwrap();
        assert_eq!(parsed.input_tokens + parsed.output_tokens, 12_345);
        assert_eq!(parsed.input_tokens, 9_258);
    }

    #[test]
    fn test_explicit_pattern() {
        let parsed = parse_tokens_from_raw_output("Used 1,200 input tokens and 340 output tokens").unwrap();
        assert_eq!(parsed.input_tokens, 1_200);
        assert_eq!(parsed.output_tokens, 340);
    }

    #[test]
    fn test_aggregate_wins_over_explicit() {
        let text = "50 input / 10 output\nToken usage: 400/200000; 199600 remaining";
        let parsed = parse_tokens_from_raw_output(text).unwrap();
        assert_eq!(parsed.input_tokens, 300);
        assert_eq!(parsed.output_tokens, 100);
    }

    #[test]
    fn test_aggregate_split_near_u64_max() {
        let parsed =
            parse_tokens_from_raw_output("Token usage: 300000000000000000/1; 0 remaining").unwrap();
        assert_eq!(parsed.input_tokens, 225_000_000_000_000_000);
        assert_eq!(parsed.output_tokens, 75_000_000_000_000_000);

        let text = format!("Token usage: {}/1; 0 remaining", u64::MAX);
        let parsed = parse_tokens_from_raw_output(&text).unwrap();
        assert_eq!(parsed.input_tokens + parsed.output_tokens, u64::MAX);
    }

    #[test]
    fn test_explicit_pattern_across_lines() {
        let parsed = parse_tokens_from_raw_output("1200 input\n340 output").unwrap();
        assert_eq!(parsed.input_tokens, 1_200);
        assert_eq!(parsed.output_tokens, 340);
    }

    #[test]
    fn test_no_match() {
        assert_eq!(parse_tokens_from_raw_output("compiling crate..."), None);
        assert_eq!(parse_tokens_from_raw_output("1200 input tokens so far"), None);
    }
}
