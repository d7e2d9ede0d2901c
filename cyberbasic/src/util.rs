//! Shared utility functions
//!
//! "Did you mean" scoring for unresolved member names.

/// Maximum number of suggestions reported for one miss
pub const MAX_SUGGESTIONS: usize = 5;

/// True when `candidate` looks like a plausible spelling of `name`.
///
/// Both names are compared uppercased. A candidate is similar when either
/// name contains the other (prefixes included), or when at least half of the
/// positions over the shorter length hold the same character.
pub fn is_similar_name(name: &str, candidate: &str) -> bool {
    let name: Vec<char> = name.to_uppercase().chars().collect();
    let candidate: Vec<char> = candidate.to_uppercase().chars().collect();
    if name.is_empty() || candidate.is_empty() {
        return false;
    }

    let (shorter, longer) = if name.len() <= candidate.len() {
        (&name, &candidate)
    } else {
        (&candidate, &name)
    };
    if longer.windows(shorter.len()).any(|w| w == shorter.as_slice()) {
        return true;
    }

    let matches = name
        .iter()
        .zip(candidate.iter())
        .filter(|(a, b)| a == b)
        .count();
    matches * 2 >= shorter.len()
}

/// Candidates similar to `name`, in candidate order, capped at
/// [`MAX_SUGGESTIONS`]
pub fn suggest_names<'a>(name: &str, candidates: impl IntoIterator<Item = &'a str>) -> Vec<&'a str> {
    candidates
        .into_iter()
        .filter(|candidate| is_similar_name(name, candidate))
        .take(MAX_SUGGESTIONS)
        .collect()
}

/// Format the property-miss warning with its "Did you mean" tail
pub fn format_member_warning(member: &str, type_name: &str, suggestions: &[&str]) -> String {
    let mut message = format!("Warning: Property '{member}' not found on {type_name}");
    if !suggestions.is_empty() {
        message.push_str("\n  Did you mean: ");
        message.push_str(&suggestions.join(", "));
    }
    message
}
