//! Repair transforms for almost-JSON model output.
//!
//! Each step is a pure `&str -> String` function. They run in the order of
//! [`REPAIR_STEPS`], and on valid JSON every step is a no-op up to
//! insignificant whitespace. Running the whole pipeline twice gives the same
//! result as running it once.

/// A named repair transform.
pub type RepairStep = (&'static str, fn(&str) -> String);

/// The repair pipeline, in application order.
pub const REPAIR_STEPS: [RepairStep; 4] = [
    ("drop_redundant_escapes", drop_redundant_escapes),
    ("collapse_control_chars", collapse_control_chars),
    ("escape_stray_quotes", escape_stray_quotes),
    ("strip_trailing_commas", strip_trailing_commas),
];

/// Apply every step of [`REPAIR_STEPS`] in order.
pub fn repair_candidate(candidate: &str) -> String {
    REPAIR_STEPS
        .iter()
        .fold(candidate.to_string(), |text, (_, step)| step(&text))
}

/// Remove backslashes that do not start a valid JSON escape.
///
/// Valid escapes are `\" \\ \/ \b \f \n \r \t` and `\u` followed by four hex
/// digits. A lone trailing backslash is dropped.
pub fn drop_redundant_escapes(input: &str) -> String {
    let chars: Vec<char> = input.chars().collect();
    let mut out = String::with_capacity(input.len());
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if c != '\\' {
            out.push(c);
            i += 1;
            continue;
        }

        match chars.get(i + 1) {
            Some('"' | '\\' | '/' | 'b' | 'f' | 'n' | 'r' | 't') => {
                out.push('\\');
                out.push(chars[i + 1]);
                i += 2;
            }
            Some('u') if is_unicode_escape(&chars[i + 2..]) => {
                out.extend(&chars[i..i + 6]);
                i += 6;
            }
            // Redundant: keep whatever follows, drop the backslash.
            _ => i += 1,
        }
    }
    out
}

fn is_unicode_escape(rest: &[char]) -> bool {
    rest.len() >= 4 && rest[..4].iter().all(|c| c.is_ascii_hexdigit())
}

/// Replace each run of control characters (U+0000..=U+001F) with one space.
pub fn collapse_control_chars(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut in_run = false;

    for c in input.chars() {
        if c <= '\u{1f}' {
            if !in_run {
                out.push(' ');
                in_run = true;
            }
        } else {
            out.push(c);
            in_run = false;
        }
    }
    out
}

/// Escape double quotes inside a string value that cannot be its terminator.
///
/// Inside a string, a `"` closes it only when the next non-whitespace
/// character is `,` `:` `}` `]` or the input ends. Any other `"` is
/// rewritten as `\"`.
pub fn escape_stray_quotes(input: &str) -> String {
    let chars: Vec<char> = input.chars().collect();
    let mut out = String::with_capacity(input.len() + 8);
    let mut in_string = false;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        if !in_string {
            if c == '"' {
                in_string = true;
            }
            out.push(c);
            i += 1;
            continue;
        }

        match c {
            '\\' => {
                out.push(c);
                if let Some(&next) = chars.get(i + 1) {
                    out.push(next);
                    i += 1;
                }
            }
            '"' if closes_string(&chars[i + 1..]) => {
                out.push(c);
                in_string = false;
            }
            '"' => out.push_str("\\\""),
            _ => out.push(c),
        }
        i += 1;
    }
    out
}

fn closes_string(rest: &[char]) -> bool {
    match rest.iter().find(|c| !c.is_whitespace()) {
        None => true,
        Some(c) => matches!(c, ',' | ':' | '}' | ']'),
    }
}

/// Remove commas that directly precede (modulo whitespace) a `]` or `}`.
///
/// Only commas outside string values are touched. A run such as `,,]` loses
/// every comma so the result needs no second pass.
pub fn strip_trailing_commas(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut in_string = false;
    let mut escaped = false;

    for c in input.chars() {
        if in_string {
            out.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }

        match c {
            '"' => {
                in_string = true;
                out.push(c);
            }
            ']' | '}' => {
                let tail_start = out
                    .char_indices()
                    .rev()
                    .take_while(|(_, ch)| ch.is_whitespace() || *ch == ',')
                    .last()
                    .map(|(idx, _)| idx);
                if let Some(start) = tail_start {
                    let tail: String = out[start..].chars().filter(|ch| *ch != ',').collect();
                    out.truncate(start);
                    out.push_str(&tail);
                }
                out.push(c);
            }
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = r#"[
  {"question": "What is \"ATP\"?", "answer": "Energy\\currency é \/ done"},
  {"question": "Tab\there", "answer": "Line\nbreak"}
]"#;

    fn parse(text: &str) -> serde_json::Value {
        serde_json::from_str(text).unwrap()
    }

    #[test]
    fn test_valid_json_keeps_meaning() {
        let repaired = repair_candidate(VALID);
        assert_eq!(parse(&repaired), parse(VALID));
    }

    #[test]
    fn test_each_step_is_noop_on_compact_valid_json() {
        let compact = serde_json::to_string(&parse(VALID)).unwrap();
        for (name, step) in REPAIR_STEPS {
            assert_eq!(step(&compact), compact, "step {name} altered valid JSON");
        }
    }

    #[test]
    fn test_drop_redundant_escapes() {
        assert_eq!(drop_redundant_escapes(r#"a\'b"#), "a'b");
        assert_eq!(drop_redundant_escapes(r#"\d\w"#), "dw");
        assert_eq!(drop_redundant_escapes(r#"\u12"#), "u12");
        assert_eq!(drop_redundant_escapes(r#"\u00e9"#), r#"\u00e9"#);
        assert_eq!(drop_redundant_escapes(r#"\\x"#), r#"\\x"#);
        assert_eq!(drop_redundant_escapes("end\\"), "end");
    }

    #[test]
    fn test_collapse_control_chars() {
        assert_eq!(collapse_control_chars("a\n\r\tb"), "a b");
        assert_eq!(collapse_control_chars("a\u{0}b\u{1f}c"), "a b c");
        assert_eq!(collapse_control_chars("no controls"), "no controls");
    }

    #[test]
    fn test_escape_stray_quotes() {
        let input = r#"{"question": "What does "ATP" stand for?", "answer": "x"}"#;
        let expected = r#"{"question": "What does \"ATP\" stand for?", "answer": "x"}"#;
        assert_eq!(escape_stray_quotes(input), expected);
    }

    #[test]
    fn test_escape_stray_quotes_respects_existing_escapes() {
        let input = r#"{"q": "say \"hi\""}"#;
        assert_eq!(escape_stray_quotes(input), input);
    }

    #[test]
    fn test_strip_trailing_commas() {
        assert_eq!(strip_trailing_commas(r#"[{"a": 1,}, ]"#), r#"[{"a": 1} ]"#);
        assert_eq!(strip_trailing_commas("[1,,\n]"), "[1\n]");
        assert_eq!(strip_trailing_commas(r#"["a,]"]"#), r#"["a,]"]"#);
    }

    #[test]
    fn test_repair_recovers_common_breakage() {
        let broken = "[\n {\"question\": \"What is \\'mitosis\\'?\", \"answer\": \"Cell\ndivision\",},\n]";
        let repaired = repair_candidate(broken);
        let value = parse(&repaired);
        assert_eq!(value[0]["question"], "What is 'mitosis'?");
        assert_eq!(value[0]["answer"], "Cell division");
    }

    #[test]
    fn test_pipeline_is_idempotent() {
        let samples = [
            VALID,
            r#"[{"question": "a "quoted" word", "answer": "b\q",},,]"#,
            "[{\"question\": \"x\u{1}\u{2}y\", \"answer\": \"z\\\"}]",
            r#"[{"question": "\u12 \\\x", "answer": "ok"}]"#,
            "[{\"question\": \"unterminated",
            "",
        ];
        for sample in samples {
            let once = repair_candidate(sample);
            let twice = repair_candidate(&once);
            assert_eq!(once, twice, "not idempotent for {sample:?}");
        }
    }
}
