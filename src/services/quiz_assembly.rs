use rand::seq::SliceRandom;
use rand::Rng;
use thiserror::Error;

use crate::models::domain::{McqCandidate, OptionLetter, Provenance, Quiz};

pub const OPTION_COUNT: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssemblyRejection {
    #[error("expected 4 options, got {0}")]
    WrongOptionCount(usize),
}

/// Shuffles `[key] + distractors` and labels the correct option from the
/// key's position after the shuffle.
///
/// The key is tracked by its original slot rather than by value, so a
/// distractor that repeats the key text cannot steal the label.
pub fn assign_options<R: Rng + ?Sized>(
    key: &str,
    distractors: &[String],
    rng: &mut R,
) -> Result<([String; OPTION_COUNT], OptionLetter), AssemblyRejection> {
    let total = 1 + distractors.len();
    if total != OPTION_COUNT {
        return Err(AssemblyRejection::WrongOptionCount(total));
    }

    let mut order: [usize; OPTION_COUNT] = [0, 1, 2, 3];
    order.shuffle(rng);

    let option_text = |slot: usize| -> String {
        if slot == 0 {
            key.to_string()
        } else {
            distractors[slot - 1].clone()
        }
    };
    let options = order.map(option_text);

    let key_position = order
        .iter()
        .position(|slot| *slot == 0)
        .ok_or(AssemblyRejection::WrongOptionCount(total))?;
    let letter =
        OptionLetter::from_index(key_position).ok_or(AssemblyRejection::WrongOptionCount(total))?;

    Ok((options, letter))
}

/// Turns a validated candidate into a persistable quiz. Rejections are logged
/// and returned, never raised further.
pub fn assemble_quiz<R: Rng + ?Sized>(
    material_id: &str,
    candidate: &McqCandidate,
    source: Provenance,
    rng: &mut R,
) -> Result<Quiz, AssemblyRejection> {
    match assign_options(&candidate.key, &candidate.distractors, rng) {
        Ok((options, letter)) => Ok(Quiz::new(
            material_id,
            &candidate.stem,
            options,
            letter,
            source,
        )),
        Err(rejection) => {
            log::warn!(
                "Rejected question for material {} ({}): {}",
                material_id,
                source,
                rejection
            );
            Err(rejection)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn distractors(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn label_indexes_the_shuffled_key() {
        for seed in 0..64 {
            let mut rng = StdRng::seed_from_u64(seed);
            let (options, letter) =
                assign_options("A", &distractors(&["B", "C", "D"]), &mut rng).expect("valid");

            assert_eq!(options[letter.index()], "A");
            let mut sorted = options.to_vec();
            sorted.sort();
            assert_eq!(sorted, vec!["A", "B", "C", "D"]);
        }
    }

    #[test]
    fn key_lands_in_every_position_over_many_shuffles() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut seen = [false; OPTION_COUNT];
        for _ in 0..200 {
            let (_, letter) =
                assign_options("A", &distractors(&["B", "C", "D"]), &mut rng).expect("valid");
            seen[letter.index()] = true;
        }
        assert!(seen.iter().all(|s| *s));
    }

    #[test]
    fn duplicate_text_does_not_move_the_label() {
        let mut rng = StdRng::seed_from_u64(3);
        let (options, letter) =
            assign_options("same", &distractors(&["same", "x", "y"]), &mut rng).expect("valid");
        assert_eq!(options[letter.index()], "same");
    }

    #[test]
    fn two_distractors_are_rejected_not_padded() {
        let mut rng = StdRng::seed_from_u64(1);
        let result = assign_options("A", &distractors(&["B", "C"]), &mut rng);

        assert_eq!(result, Err(AssemblyRejection::WrongOptionCount(3)));
    }

    #[test]
    fn four_distractors_are_rejected_not_truncated() {
        let mut rng = StdRng::seed_from_u64(1);
        let result = assign_options("A", &distractors(&["B", "C", "D", "E"]), &mut rng);

        assert_eq!(result, Err(AssemblyRejection::WrongOptionCount(5)));
    }

    #[test]
    fn assembled_quiz_keeps_stem_and_provenance() {
        let mut rng = StdRng::seed_from_u64(9);
        let candidate = McqCandidate::new("Q", "A", &["B", "C", "D"]);
        let quiz = assemble_quiz("mat-1", &candidate, Provenance::Retriever, &mut rng)
            .expect("quiz should assemble");

        assert_eq!(quiz.question, "Q");
        assert_eq!(quiz.material_id, "mat-1");
        assert_eq!(quiz.source, Provenance::Retriever);
        assert_eq!(quiz.correct_answer(), "A");
    }

    #[test]
    fn short_candidate_produces_no_quiz() {
        let mut rng = StdRng::seed_from_u64(9);
        let candidate = McqCandidate::new("Q", "A", &["B", "C"]);

        assert!(assemble_quiz("mat-1", &candidate, Provenance::Cluster, &mut rng).is_err());
    }
}
