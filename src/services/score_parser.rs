//! Strict reader for the single line the scoring model is told to answer with:
//! `努力程度：X，能力：Y`.
//!
//! Anything that does not match is rejected; the caller decides what to do
//! with a rejection. The parser must stay this strict because a lenient
//! scrape would quietly accept garbage as a score.

use thiserror::Error;

use crate::models::score::ScorePair;

pub const EFFORT_MARKER: &str = "努力程度：";
pub const ABILITY_MARKER: &str = "能力：";

const FULL_WIDTH_COMMA: char = '，';

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScoreParseError {
    #[error("结果格式不对（缺少'努力程度：'或'能力：'）")]
    MissingMarkers,

    #[error("分数不是数字（{effort}/{ability}）")]
    NonNumeric { effort: String, ability: String },
}

impl ScoreParseError {
    pub fn reason(&self) -> &'static str {
        match self {
            ScoreParseError::MissingMarkers => "missing_markers",
            ScoreParseError::NonNumeric { .. } => "non_numeric",
        }
    }
}

pub fn parse_scores(raw: &str) -> Result<ScorePair, ScoreParseError> {
    let normalized = raw.replace(FULL_WIDTH_COMMA, ",");
    let text = normalized.trim();

    if !text.contains(EFFORT_MARKER) || !text.contains(ABILITY_MARKER) {
        return Err(ScoreParseError::MissingMarkers);
    }

    // The figure runs up to the next comma, or the next repeat of its marker.
    let effort = segment_after(text, EFFORT_MARKER)
        .split(',')
        .next()
        .unwrap_or_default();
    let ability = segment_after(text, ABILITY_MARKER);

    match (parse_figure(effort), parse_figure(ability)) {
        (Some(effort_score), Some(ability_score)) => {
            Ok(ScorePair::clamped(effort_score, ability_score))
        }
        _ => Err(ScoreParseError::NonNumeric {
            effort: effort.to_string(),
            ability: ability.to_string(),
        }),
    }
}

fn segment_after<'a>(text: &'a str, marker: &str) -> &'a str {
    text.split(marker).nth(1).unwrap_or_default()
}

/// ASCII digits only. Digit strings past `u32::MAX` saturate, which the
/// clamp then turns into the maximum score.
fn parse_figure(figure: &str) -> Option<u32> {
    if figure.is_empty() || !figure.bytes().all(|byte| byte.is_ascii_digit()) {
        return None;
    }
    Some(figure.parse::<u32>().unwrap_or(u32::MAX))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(effort: u8, ability: u8) -> ScorePair {
        ScorePair::clamped(u32::from(effort), u32::from(ability))
    }

    #[test]
    fn parses_well_formed_line() {
        assert_eq!(parse_scores("努力程度：7，能力：6"), Ok(pair(7, 6)));
        assert_eq!(parse_scores("  努力程度：10,能力：1\n"), Ok(pair(10, 1)));
    }

    #[test]
    fn clamps_out_of_range_figures() {
        assert_eq!(parse_scores("努力程度：12，能力：3"), Ok(pair(10, 3)));
        assert_eq!(parse_scores("努力程度：0，能力：0"), Ok(pair(1, 1)));
        assert_eq!(
            parse_scores("努力程度：99999999999999999999，能力：4"),
            Ok(pair(10, 4))
        );
    }

    #[test]
    fn rejects_wrong_effort_marker() {
        assert_eq!(
            parse_scores("努力：5,能力：4"),
            Err(ScoreParseError::MissingMarkers)
        );
    }

    #[test]
    fn rejects_missing_ability_marker() {
        let err = parse_scores("努力程度：5，技能：4").unwrap_err();
        assert_eq!(err, ScoreParseError::MissingMarkers);
        assert_eq!(err.reason(), "missing_markers");
    }

    #[test]
    fn rejects_non_digit_figures() {
        for raw in [
            "努力程度：五，能力：4",
            "努力程度：5，能力：4分",
            "努力程度： 5，能力：4",
            "努力程度：-3，能力：4",
            "努力程度：5.5，能力：4",
            "努力程度：，能力：4",
            "努力程度：5，能力：",
            "努力程度：５，能力：4",
        ] {
            let err = parse_scores(raw).unwrap_err();
            assert_eq!(err.reason(), "non_numeric", "input: {raw}");
        }
    }

    #[test]
    fn rejects_trailing_commentary() {
        let err = parse_scores("努力程度：8，能力：7，理由：认真").unwrap_err();
        assert_eq!(
            err,
            ScoreParseError::NonNumeric {
                effort: "8".to_string(),
                ability: "7,理由：认真".to_string(),
            }
        );
    }

    #[test]
    fn markers_in_reverse_order_do_not_parse() {
        assert!(parse_scores("能力：4，努力程度：5").is_err());
    }

    #[test]
    fn same_input_always_gives_same_result() {
        let raw = "努力程度：3，能力：9";
        assert_eq!(parse_scores(raw), parse_scores(raw));
    }
}
