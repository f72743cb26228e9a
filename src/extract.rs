use crate::status::ChallengeProgressEntry;

type IdAccessor = fn(&ChallengeProgressEntry) -> Option<&str>;
type ValueAccessor = fn(&ChallengeProgressEntry) -> Option<f64>;

/// Identifier field candidates, most specific first.
const ID_ACCESSORS: [IdAccessor; 3] = [read_challenge, read_challenge_id, read_id];

/// Percentage field candidates, in the order the platform endpoints prefer.
const VALUE_ACCESSORS: [ValueAccessor; 3] = [read_percentage, read_percent_completed, read_progress];

fn read_challenge(e: &ChallengeProgressEntry) -> Option<&str> {
    e.challenge.as_deref()
}

fn read_challenge_id(e: &ChallengeProgressEntry) -> Option<&str> {
    e.challenge_id.as_deref()
}

fn read_id(e: &ChallengeProgressEntry) -> Option<&str> {
    e.id.as_deref()
}

fn read_percentage(e: &ChallengeProgressEntry) -> Option<f64> {
    e.percentage
}

fn read_percent_completed(e: &ChallengeProgressEntry) -> Option<f64> {
    e.percent_completed
}

fn read_progress(e: &ChallengeProgressEntry) -> Option<f64> {
    e.progress
}

/// Normalized identifier of an entry: first non-blank candidate, trimmed.
pub fn entry_identifier(entry: &ChallengeProgressEntry) -> Option<&str> {
    ID_ACCESSORS
        .iter()
        .filter_map(|read| read(entry))
        .map(str::trim)
        .find(|id| !id.is_empty())
}

/// First finite candidate value of an entry. Negative values are returned as
/// found; rejecting them is the caller's sanitization step.
pub fn entry_value(entry: &ChallengeProgressEntry) -> Option<f64> {
    VALUE_ACCESSORS
        .iter()
        .filter_map(|read| read(entry))
        .find(|value| value.is_finite())
}

/// Percentage of the first entry whose identifier is accepted. Later matches
/// are never consulted, whatever the first one holds.
///
/// `None` means the first accepted entry has no finite value (or nothing
/// matched), which callers must keep apart from a found `0.0` so the next
/// source tier can apply.
pub fn extract_challenge_percentage<S: AsRef<str>>(
    entries: &[ChallengeProgressEntry],
    accepted_ids: &[S],
) -> Option<f64> {
    entries
        .iter()
        .find(|entry| {
            entry_identifier(entry)
                .is_some_and(|id| accepted_ids.iter().any(|accepted| accepted.as_ref() == id))
        })
        .and_then(entry_value)
}

/// A usable percentage is finite and non-negative. Over-achievement above 100
/// passes through untouched.
pub fn sanitize_percentage(value: f64) -> Option<f64> {
    (value.is_finite() && value >= 0.0).then_some(value)
}
