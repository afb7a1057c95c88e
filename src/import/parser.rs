use regex::Regex;
use std::sync::LazyLock;

static CHECKBOX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^-\s*\[[ xX]?\]\s+(?P<task>.+)$").unwrap());

static PREFIX_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:todo|to-do|할일|목표|구현|수정|task):\s*(?P<task>.+)$").unwrap()
});

static HEADING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#{1,6}\s+(?P<task>.+)$").unwrap());

static BOLD_BULLET_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[-*]\s+\*\*(?P<task>.+?)\*\*").unwrap());

static BULLET_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[-*]\s+(?P<task>.+)$").unwrap());

static NUMBERED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+\.\s+(?P<task>.+)$").unwrap());

/// Line rules in priority order. The first match wins.
static RULES: [&LazyLock<Regex>; 6] = [
    &CHECKBOX_RE,
    &PREFIX_RE,
    &HEADING_RE,
    &BOLD_BULLET_RE,
    &BULLET_RE,
    &NUMBERED_RE,
];

/// Extract task candidates from pasted text, one per recognised line.
///
/// Recognised: markdown checklists (`- [ ] x`), `todo:`-style prefixes,
/// markdown headings, bullets (a bold lead-in wins over the rest of the line)
/// and numbered items. Other lines are ignored.
pub fn parse_tasks(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(classify)
        .collect()
}

fn classify(line: &str) -> Option<String> {
    RULES.iter().find_map(|rule| {
        rule.captures(line)
            .map(|caps| caps["task"].trim().to_string())
            .filter(|task| !task.is_empty())
    })
}
