use nucleo::{
    Matcher, Utf32Str,
    pattern::{CaseMatching, Normalization, Pattern},
};

/// Filters and ranks note titles against a picker query.
///
/// A blank query keeps every title in input order. Otherwise titles
/// that do not fuzzy-match are dropped and the rest are ordered by
/// descending score; equal scores keep their input order.
pub fn rank_titles<'a, S: AsRef<str>>(query: &str, titles: &'a [S]) -> Vec<&'a str> {
    let q = query.trim();
    if q.is_empty() {
        return titles.iter().map(|t| t.as_ref()).collect();
    }

    let pattern = Pattern::parse(q, CaseMatching::Ignore, Normalization::Smart);
    let mut matcher = Matcher::new(nucleo::Config::DEFAULT);
    let mut utf32_buf = Vec::new();
    let mut hits: Vec<(u32, &str)> = Vec::new();

    for title in titles {
        let title = title.as_ref();
        if let Some(score) = pattern.score(Utf32Str::new(title, &mut utf32_buf), &mut matcher) {
            hits.push((score, title));
        }
    }

    hits.sort_by(|a, b| b.0.cmp(&a.0));
    hits.into_iter().map(|(_, title)| title).collect()
}
