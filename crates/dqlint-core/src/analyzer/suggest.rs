//! "Did you mean" suggestions

/// Closest candidate to `input` by case-insensitive edit distance.
///
/// Ties go to the earliest candidate. Nothing is suggested when the best
/// distance exceeds half the input length (rounded down).
pub fn suggest<I, S>(input: &str, candidates: I) -> Option<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let input_lower = input.to_lowercase();
    let threshold = input.chars().count() / 2;
    let mut best_match: Option<(usize, S)> = None;

    for candidate in candidates {
        let distance = levenshtein_distance(&input_lower, &candidate.as_ref().to_lowercase());
        if best_match
            .as_ref()
            .map_or(true, |(best, _)| distance < *best)
        {
            best_match = Some((distance, candidate));
        }
    }

    best_match
        .filter(|(distance, _)| *distance <= threshold)
        .map(|(_, candidate)| candidate.as_ref().to_string())
}

/// Levenshtein distance over chars
pub fn levenshtein_distance(a: &str, b: &str) -> usize {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    let n = b_chars.len();

    if a_chars.is_empty() {
        return n;
    }
    if n == 0 {
        return a_chars.len();
    }

    let mut prev: Vec<usize> = (0..=n).collect();
    let mut curr = vec![0; n + 1];

    for (i, a_char) in a_chars.iter().enumerate() {
        curr[0] = i + 1;
        for j in 1..=n {
            let cost = if *a_char == b_chars[j - 1] { 0 } else { 1 };
            curr[j] = (prev[j] + 1).min(curr[j - 1] + 1).min(prev[j - 1] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[n]
}
