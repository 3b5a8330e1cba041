use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use super::responses::{AnswerOption, AssessmentResponse, Category};

/// Which part of a response supplied the effective score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resolution {
    Override,
    Selection,
}

/// The single authoritative answer for a question after merging rounds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciledResponse {
    pub question_id: String,
    pub category: Category,
    pub weight: f64,
    pub score_value: f64,
    pub option_id: String,
    pub resolution: Resolution,
    /// Index of the priority list the answer came from (0 = most authoritative).
    pub list_index: usize,
    pub source_round: String,
    pub updated_at: DateTime<Utc>,
}

/// Latest override and latest selection for one question within one list.
#[derive(Default)]
struct ListCandidates<'a> {
    override_entry: Option<&'a AssessmentResponse>,
    selection_entry: Option<&'a AssessmentResponse>,
}

/// Merge responses from several assessment rounds into one answer per question.
///
/// `response_lists` must be in priority order, most authoritative first; the
/// order is taken as given and never re-derived from timestamps.
///
/// Per question:
/// - an override wins over every selection, in any list; between overrides
///   the highest-priority list wins;
/// - otherwise the first list holding a selection wins;
/// - questions nobody answered are dropped.
///
/// Within a single list, duplicate entries resolve to the latest `updated_at`
/// (later position on ties).
pub fn reconcile(response_lists: &[Vec<AssessmentResponse>]) -> BTreeMap<String, ReconciledResponse> {
    let per_list: Vec<BTreeMap<&str, ListCandidates>> =
        response_lists.iter().map(|list| index_list(list)).collect();

    let question_ids: BTreeSet<&str> = per_list
        .iter()
        .flat_map(|candidates| candidates.keys().copied())
        .collect();

    let mut reconciled = BTreeMap::new();
    for question_id in question_ids {
        let winner = find_first(&per_list, question_id, |c| c.override_entry)
            .and_then(|(idx, r)| resolve(r, idx, Resolution::Override))
            .or_else(|| {
                find_first(&per_list, question_id, |c| c.selection_entry)
                    .and_then(|(idx, r)| resolve(r, idx, Resolution::Selection))
            });

        match winner {
            Some(answer) => {
                reconciled.insert(question_id.to_string(), answer);
            }
            None => {
                tracing::debug!(question_id, "dropping question with no resolvable answer");
            }
        }
    }

    tracing::debug!(
        lists = response_lists.len(),
        questions = reconciled.len(),
        "reconciled assessment responses"
    );
    reconciled
}

fn index_list(list: &[AssessmentResponse]) -> BTreeMap<&str, ListCandidates<'_>> {
    let mut candidates: BTreeMap<&str, ListCandidates> = BTreeMap::new();
    for response in list {
        let entry = candidates.entry(response.question_id.as_str()).or_default();
        if is_usable(response, response.override_option.as_ref())
            && is_newer(response, entry.override_entry)
        {
            entry.override_entry = Some(response);
        }
        if is_usable(response, response.selected.as_ref())
            && is_newer(response, entry.selection_entry)
        {
            entry.selection_entry = Some(response);
        }
    }
    candidates
}

/// An option only competes when it carries a finite score and weight.
fn is_usable(response: &AssessmentResponse, option: Option<&AnswerOption>) -> bool {
    let Some(option) = option else {
        return false;
    };
    if option.score_value.is_finite() && response.weight.is_finite() {
        true
    } else {
        tracing::warn!(
            question_id = %response.question_id,
            option_id = %option.id,
            "ignoring answer with a non-finite score or weight"
        );
        false
    }
}

// Later position wins ties, hence `>=`.
fn is_newer(candidate: &AssessmentResponse, current: Option<&AssessmentResponse>) -> bool {
    current.is_none_or(|c| candidate.updated_at >= c.updated_at)
}

fn find_first<'a, F>(
    per_list: &[BTreeMap<&str, ListCandidates<'a>>],
    question_id: &str,
    pick: F,
) -> Option<(usize, &'a AssessmentResponse)>
where
    F: Fn(&ListCandidates<'a>) -> Option<&'a AssessmentResponse>,
{
    per_list
        .iter()
        .enumerate()
        .find_map(|(idx, list)| list.get(question_id).and_then(&pick).map(|r| (idx, r)))
}

fn resolve(
    response: &AssessmentResponse,
    list_index: usize,
    resolution: Resolution,
) -> Option<ReconciledResponse> {
    let option: &AnswerOption = match resolution {
        Resolution::Override => response.override_option.as_ref()?,
        Resolution::Selection => response.selected.as_ref()?,
    };

    let score_value = option.score_value.clamp(0.0, 1.0);
    if score_value != option.score_value {
        tracing::warn!(
            question_id = %response.question_id,
            score_value = option.score_value,
            "score value outside [0, 1], clamped"
        );
    }
    let weight = response.weight.max(0.0);
    if weight != response.weight {
        tracing::warn!(
            question_id = %response.question_id,
            weight = response.weight,
            "negative question weight treated as 0"
        );
    }

    Some(ReconciledResponse {
        question_id: response.question_id.clone(),
        category: response.category,
        weight,
        score_value,
        option_id: option.id.clone(),
        resolution,
        list_index,
        source_round: response.source_round.clone(),
        updated_at: response.updated_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, day, 12, 0, 0).unwrap()
    }

    fn answer(question: &str, option: &str, score: f64, day: u32) -> AssessmentResponse {
        AssessmentResponse {
            question_id: question.to_string(),
            category: Category::Financial,
            weight: 2.0,
            selected: Some(AnswerOption {
                id: option.to_string(),
                score_value: score,
            }),
            source_round: format!("round-{}", day),
            updated_at: at(day),
            override_option: None,
        }
    }

    fn with_override(mut response: AssessmentResponse, option: &str, score: f64) -> AssessmentResponse {
        response.override_option = Some(AnswerOption {
            id: option.to_string(),
            score_value: score,
        });
        response
    }

    #[test]
    fn test_highest_priority_selection_wins() {
        let current = vec![answer("q1", "optA", 0.5, 1)];
        let older = vec![answer("q1", "optB", 1.0, 20)];
        let merged = reconcile(&[current, older]);
        let q1 = &merged["q1"];
        assert_eq!(q1.option_id, "optA");
        assert_eq!(q1.list_index, 0);
        assert_eq!(q1.resolution, Resolution::Selection);
    }

    #[test]
    fn test_override_wins_over_more_recent_answer() {
        // List 2 is the higher-priority list even though list 1 is more recent.
        let list_one = vec![answer("q1", "optA", 0.25, 20)];
        let list_two = vec![with_override(answer("q1", "optB", 0.5, 1), "optC", 1.0)];
        let merged = reconcile(&[list_two, list_one]);
        assert_eq!(merged["q1"].option_id, "optC");
        assert_eq!(merged["q1"].score_value, 1.0);
        assert_eq!(merged["q1"].resolution, Resolution::Override);
    }

    #[test]
    fn test_lower_priority_override_beats_higher_priority_selection() {
        let current = vec![answer("q1", "optA", 0.25, 20)];
        let older = vec![with_override(answer("q1", "optB", 0.5, 1), "optC", 0.75)];
        let merged = reconcile(&[current, older]);
        assert_eq!(merged["q1"].option_id, "optC");
        assert_eq!(merged["q1"].list_index, 1);
    }

    #[test]
    fn test_lower_priority_override_never_replaces_higher_priority_override() {
        let current = vec![with_override(answer("q1", "optA", 0.25, 1), "optX", 0.5)];
        let older = vec![with_override(answer("q1", "optB", 0.5, 20), "optY", 1.0)];
        let merged = reconcile(&[current, older]);
        assert_eq!(merged["q1"].option_id, "optX");
    }

    #[test]
    fn test_unanswered_questions_dropped() {
        let mut skipped = answer("q2", "unused", 0.0, 1);
        skipped.selected = None;
        let merged = reconcile(&[vec![answer("q1", "optA", 1.0, 1), skipped]]);
        assert_eq!(merged.len(), 1);
        assert!(!merged.contains_key("q2"));
    }

    #[test]
    fn test_skipped_in_current_round_falls_back_to_older_round() {
        let mut skipped = answer("q1", "unused", 0.0, 20);
        skipped.selected = None;
        let merged = reconcile(&[vec![skipped], vec![answer("q1", "optOld", 0.75, 1)]]);
        assert_eq!(merged["q1"].option_id, "optOld");
        assert_eq!(merged["q1"].list_index, 1);
    }

    #[test]
    fn test_duplicates_within_list_use_latest() {
        let list = vec![
            answer("q1", "late", 1.0, 10),
            answer("q1", "early", 0.0, 2),
        ];
        let merged = reconcile(&[list]);
        assert_eq!(merged["q1"].option_id, "late");
    }

    #[test]
    fn test_duplicate_tie_goes_to_later_position() {
        let list = vec![answer("q1", "first", 0.0, 5), answer("q1", "second", 1.0, 5)];
        let merged = reconcile(&[list]);
        assert_eq!(merged["q1"].option_id, "second");
    }

    #[test]
    fn test_out_of_range_values_clamped() {
        let mut response = answer("q1", "optA", 1.7, 1);
        response.weight = -3.0;
        let merged = reconcile(&[vec![response]]);
        assert_eq!(merged["q1"].score_value, 1.0);
        assert_eq!(merged["q1"].weight, 0.0);
    }

    #[test]
    fn test_non_finite_score_dropped() {
        let merged = reconcile(&[vec![answer("q1", "optA", f64::NAN, 1)]]);
        assert!(merged.is_empty());
    }

    #[test]
    fn test_unusable_override_falls_through_to_next_list() {
        let current = vec![
            answer("q1", "selA", 0.25, 1),
            with_override(answer("q1", "selA", 0.25, 2), "broken", f64::NAN),
        ];
        let older = vec![
            answer("q1", "selB", 0.5, 1),
            with_override(answer("q1", "selB", 0.5, 2), "upgrade", 0.9),
        ];
        let merged = reconcile(&[current, older]);
        assert_eq!(merged["q1"].option_id, "upgrade");
        assert_eq!(merged["q1"].resolution, Resolution::Override);
        assert_eq!(merged["q1"].list_index, 1);
    }

    #[test]
    fn test_unusable_latest_override_keeps_earlier_one_in_list() {
        let list = vec![
            with_override(answer("q1", "a", 0.0, 1), "valid", 0.8),
            with_override(answer("q1", "a", 0.0, 5), "broken", f64::INFINITY),
        ];
        let merged = reconcile(&[list]);
        assert_eq!(merged["q1"].option_id, "valid");
        assert_eq!(merged["q1"].resolution, Resolution::Override);
    }

    #[test]
    fn test_reconcile_is_idempotent() {
        let lists = vec![
            vec![answer("q1", "a", 0.5, 3), answer("q2", "b", 0.25, 3)],
            vec![
                with_override(answer("q2", "c", 0.0, 1), "d", 1.0),
                answer("q3", "e", 0.75, 1),
            ],
        ];
        assert_eq!(reconcile(&lists), reconcile(&lists));
    }

    #[test]
    fn test_empty_input() {
        assert!(reconcile(&[]).is_empty());
        assert!(reconcile(&[vec![], vec![]]).is_empty());
    }

    #[test]
    fn test_override_timestamp_irrelevant_across_lists() {
        let recent = at(1) + Duration::days(100);
        let mut newer_override = with_override(answer("q1", "b", 0.0, 1), "late-upgrade", 0.9);
        newer_override.updated_at = recent;
        let current = vec![with_override(answer("q1", "a", 0.0, 1), "early-upgrade", 0.6)];
        let merged = reconcile(&[current, vec![newer_override]]);
        assert_eq!(merged["q1"].option_id, "early-upgrade");
    }
}
