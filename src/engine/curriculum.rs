// src/engine/curriculum.rs

/// Ordinal grade sequence used for grade-bound checks.
pub const GRADE_SEQUENCE: [&str; 13] = [
    "K", "1", "2", "3", "4", "5", "6", "7", "8", "9", "10", "11", "12",
];

pub const MATH_STRANDS: [&str; 5] = [
    "Number & Operations",
    "Algebra",
    "Geometry",
    "Measurement",
    "Data Analysis & Probability",
];

pub const READING_STRANDS: [&str; 3] = ["Literature", "Informational Text", "Vocabulary"];

/// Lowercase labels that name the same subject. The first entry is the canonical one.
const SUBJECT_ALIASES: [&[&str]; 2] = [
    &["mathematics", "math"],
    &["reading", "ela", "english language arts"],
];

/// Position of a grade label in [`GRADE_SEQUENCE`].
///
/// Accepts "K"/"KG"/"Kindergarten", plain numbers and a leading "Grade ".
/// Course labels such as "Algebra I" yield `None`.
pub fn grade_index(label: &str) -> Option<usize> {
    let trimmed = label.trim();
    let lowered = trimmed.to_ascii_lowercase();
    let normalized = lowered
        .strip_prefix("grade")
        .map(str::trim)
        .unwrap_or(lowered.as_str());

    match normalized {
        "k" | "kg" | "kindergarten" | "0" => Some(0),
        other => {
            let n: usize = other.parse().ok()?;
            (1..GRADE_SEQUENCE.len()).contains(&n).then_some(n)
        }
    }
}

/// Absolute distance between two grade labels, or `None` if either is not on the sequence.
pub fn grade_deviation(a: &str, b: &str) -> Option<usize> {
    Some(grade_index(a)?.abs_diff(grade_index(b)?))
}

/// Every lowercase label that names the same subject as `subject`.
///
/// Unknown subjects only match themselves, trimmed and lowercased.
pub fn subject_aliases(subject: &str) -> Vec<String> {
    let key = subject.trim().to_ascii_lowercase();
    SUBJECT_ALIASES
        .iter()
        .find(|aliases| aliases.contains(&key.as_str()))
        .map(|aliases| aliases.iter().map(|a| a.to_string()).collect())
        .unwrap_or_else(|| vec![key])
}

/// Canonical lowercase label for a subject ("Math" and "Mathematics" both give "mathematics").
pub fn normalize_subject(subject: &str) -> String {
    let key = subject.trim().to_ascii_lowercase();
    SUBJECT_ALIASES
        .iter()
        .find(|aliases| aliases.contains(&key.as_str()))
        .map(|aliases| aliases[0].to_string())
        .unwrap_or(key)
}

pub fn same_subject(a: &str, b: &str) -> bool {
    normalize_subject(a) == normalize_subject(b)
}

/// Strands a subject must cover before a session may end on precision.
/// Unknown subjects have no requirements.
pub fn required_strands(subject: &str) -> &'static [&'static str] {
    match normalize_subject(subject).as_str() {
        "mathematics" => &MATH_STRANDS,
        "reading" => &READING_STRANDS,
        _ => &[],
    }
}
