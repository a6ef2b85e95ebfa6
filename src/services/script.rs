use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

static SPEAKER_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*\[SPEAKER:\s*([^\]]+)\]:\s*(.*)").expect("valid speaker regex"));

static STAGE_DIRECTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*[^*\n]*\*").expect("valid stage direction regex"));

const QUOTES: &[char] = &['"', '\'', '“', '”', '‘', '’'];

/// One speaker turn, in conversational order.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ScriptSegment {
    pub speaker: String,
    pub text: String,
    pub is_first_personality: bool,
}

pub const SCRIPT_SYSTEM_PROMPT: &str = "You write short spoken dialogues. \
Output only dialogue lines, one per line, in the exact form [SPEAKER: <name>]: <utterance>. \
Do not add narration, headings or stage directions.";

pub fn build_script_prompt(personality1: &str, personality2: &str, topic: &str) -> String {
    format!(
        "Write a natural conversation between {p1} and {p2} about \"{topic}\".\n\
        Each of them should speak in their own characteristic voice and keep every turn to one or two sentences.\n\
        Alternate turns, starting with {p1}, for about 8 to 12 turns in total.\n\
        Format every line exactly like this:\n\
        [SPEAKER: {p1}]: <what {p1} says>\n\
        [SPEAKER: {p2}]: <what {p2} says>",
        p1 = personality1,
        p2 = personality2,
        topic = topic,
    )
}

/// Removes `*...*` stage-direction spans the model sometimes adds. A span
/// never crosses a line break.
pub fn strip_stage_directions(script: &str) -> String {
    STAGE_DIRECTION.replace_all(script, "").into_owned()
}

pub fn strip_code_blocks(s: &str) -> String {
    let s = s.trim();
    if s.starts_with("```") {
        let body = s.trim_start_matches("```");
        let body = body.split_once('\n').map(|(_, rest)| rest).unwrap_or(body);
        body.trim_end_matches("```").trim().to_string()
    } else {
        s.to_string()
    }
}

/// Splits a raw script into speaker segments.
///
/// Lines that don't carry a `[SPEAKER: name]:` tag, or whose utterance is empty
/// once quotes are trimmed, are skipped. When nothing usable is found, one
/// placeholder line per personality is returned so that every speaker is
/// always represented downstream.
pub fn parse_script(script: &str, personality1: &str, personality2: &str) -> Vec<ScriptSegment> {
    let mut segments: Vec<ScriptSegment> = script
        .lines()
        .filter_map(|line| {
            let caps = SPEAKER_LINE.captures(line)?;
            let speaker = caps[1].trim().to_string();
            let text = trim_quotes(&caps[2]);
            if text.is_empty() {
                return None;
            }
            Some(ScriptSegment {
                is_first_personality: speaker == personality1,
                speaker,
                text,
            })
        })
        .collect();

    if segments.is_empty() {
        segments = placeholder_segments(personality1, personality2);
    }
    segments
}

fn placeholder_segments(personality1: &str, personality2: &str) -> Vec<ScriptSegment> {
    vec![
        ScriptSegment {
            speaker: personality1.to_string(),
            text: format!("Hello, I'm {}.", personality1),
            is_first_personality: true,
        },
        ScriptSegment {
            speaker: personality2.to_string(),
            text: format!("And I'm {}. Nice to meet you.", personality2),
            is_first_personality: false,
        },
    ]
}

fn trim_quotes(raw: &str) -> String {
    raw.trim().trim_matches(QUOTES).trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_speakers() {
        let segments = parse_script("[SPEAKER: Ada]: Hi!\n[SPEAKER: Grace]: Hello!", "Ada", "Grace");
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].speaker, "Ada");
        assert_eq!(segments[0].text, "Hi!");
        assert_eq!(
            segments.iter().map(|s| s.is_first_personality).collect::<Vec<_>>(),
            vec![true, false]
        );
    }

    #[test]
    fn test_skips_untagged_and_empty_lines() {
        let script = "Here is your dialogue:\n\
            [SPEAKER: Ada]: \"Shall we compute?\"\n\
            \n\
            [SPEAKER: Grace]: \"\"\n\
            [SPEAKER: Grace]: 'Always.'\n\
            That's all.";
        let segments = parse_script(script, "Ada", "Grace");
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].text, "Shall we compute?");
        assert_eq!(segments[1].speaker, "Grace");
        assert_eq!(segments[1].text, "Always.");
    }

    #[test]
    fn test_preserves_line_order() {
        let script = "[SPEAKER: B]: one\n[SPEAKER: A]: two\n[SPEAKER: B]: three";
        let texts: Vec<_> = parse_script(script, "A", "B").into_iter().map(|s| s.text).collect();
        assert_eq!(texts, vec!["one", "two", "three"]);
    }

    #[test]
    fn test_first_personality_is_exact_match() {
        let segments = parse_script("[SPEAKER: ada]: lower case", "Ada", "Grace");
        assert_eq!(segments.len(), 1);
        assert!(!segments[0].is_first_personality);
    }

    #[test]
    fn test_placeholders_when_nothing_matches() {
        for script in ["", "no tags here\nat all", "[SPEAKER: Ada]:   \"\"  "] {
            let segments = parse_script(script, "Ada", "Grace");
            assert_eq!(segments.len(), 2, "script: {:?}", script);
            assert_eq!(segments[0].speaker, "Ada");
            assert!(segments[0].is_first_personality);
            assert_eq!(segments[1].speaker, "Grace");
            assert!(!segments[1].is_first_personality);
            assert!(segments.iter().all(|s| !s.text.is_empty()));
        }
    }

    #[test]
    fn test_strip_stage_directions() {
        let raw = "[SPEAKER: Ada]: *laughs* That is clever. *pauses*";
        let stripped = strip_stage_directions(raw);
        let segments = parse_script(&stripped, "Ada", "Grace");
        assert_eq!(segments[0].text, "That is clever.");
    }

    #[test]
    fn test_stage_directions_stay_on_one_line() {
        let raw = "[SPEAKER: Ada]: Is 2*3 six?\n[SPEAKER: Grace]: Yes.\n[SPEAKER: Ada]: And 4*5 is twenty.";
        let stripped = strip_stage_directions(raw);
        assert_eq!(stripped, raw);

        let segments = parse_script(&stripped, "Ada", "Grace");
        assert_eq!(segments.len(), 3);
        assert_eq!(segments[1].text, "Yes.");
        assert_eq!(segments[2].text, "And 4*5 is twenty.");
    }

    #[test]
    fn test_tag_must_start_the_line() {
        let script = "Note: see [SPEAKER: Ada]: hi\n  [SPEAKER: Grace]: Indented is fine.";
        let segments = parse_script(script, "Ada", "Grace");
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].speaker, "Grace");
        assert_eq!(segments[0].text, "Indented is fine.");
    }

    #[test]
    fn test_strip_code_blocks() {
        assert_eq!(strip_code_blocks("plain"), "plain");
        assert_eq!(strip_code_blocks("```\n[SPEAKER: A]: x\n```"), "[SPEAKER: A]: x");
        assert_eq!(strip_code_blocks("  ```text\nbody\n```  "), "body");
    }

    #[test]
    fn test_prompt_names_both_speakers() {
        let prompt = build_script_prompt("Ada", "Grace", "compilers");
        assert!(prompt.contains("[SPEAKER: Ada]:"));
        assert!(prompt.contains("[SPEAKER: Grace]:"));
        assert!(prompt.contains("\"compilers\""));
    }
}
