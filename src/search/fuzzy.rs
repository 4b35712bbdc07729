//! Forward-only subsequence scoring.

/// Added when the target contains the term verbatim.
const SUBSTRING_BONUS: f64 = 15.0;

/// Score `term` as a subsequence of `target`, 0 to 100. Both must already be lower-cased.
///
/// Each term character is looked up at or after the position following the previous
/// match. A hit contributes `100 / n` scaled by how little of the target it skipped and
/// by how long the current contiguous run is. Misses contribute nothing and break the run.
///
/// The position factor counts only the characters skipped since the previous match,
/// not the absolute index, and the run factor is `0.5 + 0.5 * run / n` rather than a
/// flat bonus, so short scattered abbreviations still clear the fuzzy threshold.
pub fn fuzzy_score(term: &str, target: &str) -> u8 {
    let term: Vec<char> = term.chars().collect();
    let target: Vec<char> = target.chars().collect();
    if term.is_empty() || target.is_empty() {
        return 0;
    }

    let n = term.len() as f64;
    let len = target.len() as f64;

    let mut score = 0.0;
    let mut cursor = 0usize;
    let mut previous: Option<usize> = None;
    let mut run = 0usize;

    for ch in &term {
        let Some(offset) = target[cursor..].iter().position(|c| c == ch) else {
            run = 0;
            continue;
        };
        let index = cursor + offset;

        run = match previous {
            Some(prev) if index == prev + 1 => run + 1,
            _ => 1,
        };

        let position_bonus = 1.0 - offset as f64 / len;
        let consecutive_bonus = 0.5 + 0.5 * (run as f64 / n).min(1.0);
        score += 100.0 * position_bonus * consecutive_bonus / n;

        previous = Some(index);
        cursor = index + 1;
    }

    if contains(&target, &term) {
        score += SUBSTRING_BONUS;
    }

    score.clamp(0.0, 100.0).round() as u8
}

fn contains(haystack: &[char], needle: &[char]) -> bool {
    needle.len() <= haystack.len() && haystack.windows(needle.len()).any(|w| w == needle)
}
