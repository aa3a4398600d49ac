use regex::Regex;
use crate::core::error::Result;

/// Compiled wildcard pattern: `?` is one character, `*` any run, everything else literal
pub struct WildcardPattern {
    regex: Regex,
    literal_prefix: String,
}

impl WildcardPattern {
    pub fn compile(pattern: &str) -> Result<Self> {
        let mut regex_pattern = String::with_capacity(pattern.len() + 8);
        regex_pattern.push_str("^(?s:");
        for ch in pattern.chars() {
            match ch {
                '*' => regex_pattern.push_str(".*"),
                '?' => regex_pattern.push('.'),
                other => regex_pattern.push_str(&regex::escape(other.encode_utf8(&mut [0u8; 4]))),
            }
        }
        regex_pattern.push_str(")$");

        let literal_prefix: String = pattern.chars()
            .take_while(|c| *c != '*' && *c != '?')
            .collect();

        Ok(WildcardPattern {
            regex: Regex::new(&regex_pattern)?,
            literal_prefix,
        })
    }

    /// Leading characters every match starts with; bounds the dictionary scan
    pub fn literal_prefix(&self) -> &str {
        &self.literal_prefix
    }

    pub fn matches(&self, term: &str) -> bool {
        self.regex.is_match(term)
    }
}

/// Sloppy phrase frequency of one document.
///
/// `positions[i]` holds the positions of the i-th phrase term. Each occurrence of
/// the first term anchors a candidate; a candidate matches when distinct positions
/// `p_i` exist with `max(p_i - i) - min(p_i - i) <= slop`, and contributes
/// `1 / (1 + spread)` for the tightest such choice. Slop 0 counts exact phrases.
pub fn phrase_freq(positions: &[&[u32]], slop: u32) -> f32 {
    if positions.is_empty() || positions.iter().any(|p| p.is_empty()) {
        return 0.0;
    }

    let slop = slop as i64;
    let mut freq = 0.0;
    for &anchor in positions[0] {
        let offset = anchor as i64;
        let mut chosen = vec![anchor];
        let mut best: Option<i64> = None;
        tightest(positions, 1, slop, (offset, offset), &mut chosen, &mut best);
        if let Some(spread) = best {
            freq += 1.0 / (1.0 + spread as f32);
        }
    }
    freq
}

/// Depth-first search over the remaining terms, keeping the window of
/// `p_i - i` offsets within `slop`
fn tightest(
    positions: &[&[u32]],
    term: usize,
    slop: i64,
    window: (i64, i64),
    chosen: &mut Vec<u32>,
    best: &mut Option<i64>,
) {
    if term == positions.len() {
        let spread = window.1 - window.0;
        if best.is_none_or(|b| spread < b) {
            *best = Some(spread);
        }
        return;
    }
    if *best == Some(0) {
        return;
    }

    // Offsets outside [window.1 - slop, window.0 + slop] cannot fit
    let lowest = window.1 - slop + term as i64;
    let highest = window.0 + slop + term as i64;
    let start = positions[term].partition_point(|&p| (p as i64) < lowest);

    for &pos in &positions[term][start..] {
        if pos as i64 > highest {
            break;
        }
        if chosen.contains(&pos) {
            continue;
        }
        let offset = pos as i64 - term as i64;
        let next = (window.0.min(offset), window.1.max(offset));
        if best.is_some_and(|b| next.1 - next.0 >= b) {
            continue;
        }

        chosen.push(pos);
        tightest(positions, term + 1, slop, next, chosen, best);
        chosen.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wildcard_escapes_literals() {
        let pattern = WildcardPattern::compile("*solr*").unwrap();
        assert!(pattern.matches("solr"));
        assert!(pattern.matches("apachesolrcloud"));
        assert!(!pattern.matches("sol"));
        assert_eq!(pattern.literal_prefix(), "");

        let dotted = WildcardPattern::compile("a.c?").unwrap();
        assert!(dotted.matches("a.cd"));
        assert!(!dotted.matches("abcd"));
        assert_eq!(dotted.literal_prefix(), "a.c");

        let one = WildcardPattern::compile("s?lr").unwrap();
        assert!(one.matches("solr"));
        assert!(!one.matches("slr"));
    }

    #[test]
    fn test_exact_phrase_counts_occurrences() {
        // "search engine ... search engine"
        let search: &[u32] = &[0, 5];
        let engine: &[u32] = &[1, 6];
        assert_eq!(phrase_freq(&[search, engine], 0), 2.0);
        assert_eq!(phrase_freq(&[engine, search], 0), 0.0);
    }

    #[test]
    fn test_slop_window() {
        // elasticsearch at 0, lucene at 7: needs six moves
        let first: &[u32] = &[0];
        let second: &[u32] = &[7];
        assert_eq!(phrase_freq(&[first, second], 5), 0.0);
        assert!((phrase_freq(&[first, second], 6) - 1.0 / 7.0).abs() < 1e-6);
    }

    #[test]
    fn test_repeated_term_needs_distinct_positions() {
        let to: &[u32] = &[0];
        assert_eq!(phrase_freq(&[to, to], 3), 0.0);

        // "to be to be"
        let twice: &[u32] = &[0, 2];
        let be: &[u32] = &[1, 3];
        assert_eq!(phrase_freq(&[twice, be, twice, be], 0), 1.0);
    }

    #[test]
    fn test_reordered_terms_within_slop() {
        // "engine search" queried as "search engine"
        let search: &[u32] = &[1];
        let engine: &[u32] = &[0];
        assert_eq!(phrase_freq(&[search, engine], 1), 0.0);
        assert!(phrase_freq(&[search, engine], 2) > 0.0);
    }
}
