use super::{
    ids::IdGenerator,
    model::{Block, Presentation, SectionKind},
};

/// Questions shown per page when a block shuffles its questions.
pub const SHUFFLED_QUESTIONS_PER_PAGE: u32 = 1;

/// Builds a block over already-built questions.
///
/// Fixed sections are never randomized, whatever the caller asks for. An empty block is
/// still returned but logged, so the caller can leave it out of the document.
pub fn build_block(
    ids: &mut IdGenerator,
    section: SectionKind,
    question_ids: Vec<String>,
    randomize: bool,
) -> Block {
    if randomize && section.is_fixed() {
        log::debug!("Ignoring randomization request for fixed section {:?}", section);
    }

    let presentation = if randomize && !section.is_fixed() {
        Presentation::ShuffledPerRespondent {
            per_page: SHUFFLED_QUESTIONS_PER_PAGE,
        }
    } else {
        Presentation::InOrder
    };

    let block = Block {
        id: ids.new_id("BL"),
        section,
        key: section.key().to_string(),
        description: section.title().to_string(),
        question_ids,
        presentation,
    };

    if block.is_empty() {
        log::warn!("Block {} ({}) has no questions", block.id, block.key);
    }

    block
}

#[cfg(test)]
mod tests {
    use super::*;

    fn qids(n: usize) -> Vec<String> {
        (1..=n).map(|i| format!("QID{}", i)).collect()
    }

    #[test]
    fn test_dv_block_encodes_shuffle_policy() {
        let mut ids = IdGenerator::seeded(3);
        let block = build_block(&mut ids, SectionKind::DvMeasure, qids(2), true);

        assert!(block.id.starts_with("BL_"));
        assert_eq!(
            block.presentation,
            Presentation::ShuffledPerRespondent { per_page: 1 }
        );
    }

    #[test]
    fn test_fixed_sections_ignore_randomize_flag() {
        let mut ids = IdGenerator::seeded(3);
        for section in [
            SectionKind::Consent,
            SectionKind::Demographics,
            SectionKind::ManipulationCheck,
            SectionKind::Debrief,
        ] {
            let block = build_block(&mut ids, section, qids(1), true);
            assert!(!block.is_randomized(), "{:?} should not shuffle", section);
        }
    }

    #[test]
    fn test_empty_block_is_returned_and_flagged() {
        let mut ids = IdGenerator::seeded(3);
        let block = build_block(&mut ids, SectionKind::Demographics, Vec::new(), false);
        assert!(block.is_empty());
        assert_eq!(block.key, "demographics");
    }

    #[test]
    fn test_named_block_overrides_key_and_description() {
        let mut ids = IdGenerator::seeded(3);
        let block = build_block(&mut ids, SectionKind::DvMeasure, qids(1), false)
            .named("dv_1", "Anxiety Measures");
        assert_eq!(block.key, "dv_1");
        assert_eq!(block.description, "Anxiety Measures");
        assert_eq!(block.question_ids, vec!["QID1"]);
    }

    #[test]
    fn test_same_seed_gives_structurally_identical_blocks() {
        let a = build_block(&mut IdGenerator::seeded(9), SectionKind::DvMeasure, qids(3), true);
        let b = build_block(&mut IdGenerator::seeded(9), SectionKind::DvMeasure, qids(3), true);
        assert_eq!(a, b);
    }
}
