use std::collections::HashMap;

use crate::models::domain::study::{ExperimentalDesign, RandomizationPolicy};

use super::{
    ids::IdGenerator,
    model::{
        Block, BlockNode, BlockOrderRandomizer, ConditionBranch, ConditionRandomizer,
        EmbeddedDataSet, EmbeddedField, FieldSource, FlowNode, FlowRoot, SectionKind, Termination,
    },
    templates,
};

pub const ROOT_FLOW_ID: &str = "FL_1";
pub const CONDITION_FIELD: &str = "condition";
pub const RANDOM_ID_FIELD: &str = "randomID";

/// Orders the blocks into the survey flow.
///
/// Consent comes first and carries the only terminating branch, then the condition
/// randomizer, demographics, the measurement blocks (optionally shuffled as a group), the
/// manipulation check and finally the debrief. Empty blocks never reach the flow.
pub fn compose_flow(
    ids: &mut IdGenerator,
    blocks: &[Block],
    design: Option<&ExperimentalDesign>,
    policy: &RandomizationPolicy,
) -> FlowRoot {
    let blocks: Vec<&Block> = blocks.iter().filter(|b| !b.is_empty()).collect();
    let find = |section: SectionKind| blocks.iter().copied().find(|b| b.section == section);

    let conditions: &[String] = match design {
        Some(design) if design.is_experimental() => &design.conditions,
        _ => &[],
    };

    let mut nodes = Vec::new();

    if !conditions.is_empty() {
        nodes.push(FlowNode::EmbeddedDataSet(EmbeddedDataSet {
            flow_id: ids.new_id("FL"),
            fields: vec![
                EmbeddedField::new(CONDITION_FIELD, CONDITION_FIELD, FieldSource::Recipient),
                EmbeddedField::new(RANDOM_ID_FIELD, RANDOM_ID_FIELD, FieldSource::Random),
            ],
        }));
    }

    if let Some(consent) = find(SectionKind::Consent) {
        let termination = consent.question_ids.first().map(|question_id| Termination {
            skip_logic_id: ids.new_id("SL"),
            question_id: question_id.clone(),
            choice_id: templates::DECLINE_CHOICE_ID.to_string(),
            end_flow_id: ids.new_id("FL"),
        });
        nodes.push(FlowNode::Block(BlockNode {
            flow_id: ids.new_id("FL"),
            block_id: consent.id.clone(),
            termination,
        }));
    }

    if conditions.len() > 1 {
        let flow_id = ids.new_id("FL");
        let branches = conditions
            .iter()
            .map(|label| ConditionBranch {
                flow_id: ids.new_id("FL"),
                label: label.clone(),
                assignment: EmbeddedDataSet {
                    flow_id: ids.new_id("FL"),
                    fields: vec![EmbeddedField::new(
                        CONDITION_FIELD,
                        CONDITION_FIELD,
                        FieldSource::Custom,
                    )
                    .with_value(label)],
                },
            })
            .collect();
        nodes.push(FlowNode::ConditionRandomizer(ConditionRandomizer { flow_id, branches }));
    }

    if let Some(demographics) = find(SectionKind::Demographics) {
        nodes.push(block_node(ids, demographics));
    }

    let measures: Vec<&Block> = blocks
        .iter()
        .copied()
        .filter(|b| b.section == SectionKind::DvMeasure)
        .collect();
    if policy.shuffles_block_order() && measures.len() > 1 {
        let flow_id = ids.new_id("FL");
        let wrapped = measures.into_iter().map(|b| plain_block(ids, b)).collect();
        nodes.push(FlowNode::BlockOrderRandomizer(BlockOrderRandomizer {
            flow_id,
            blocks: wrapped,
        }));
    } else {
        for block in measures {
            nodes.push(block_node(ids, block));
        }
    }

    if design.is_some_and(ExperimentalDesign::is_experimental) {
        if let Some(check) = find(SectionKind::ManipulationCheck) {
            nodes.push(block_node(ids, check));
        }
    }

    if let Some(debrief) = find(SectionKind::Debrief) {
        nodes.push(block_node(ids, debrief));
    }

    FlowRoot {
        flow_id: ROOT_FLOW_ID.to_string(),
        nodes,
    }
}

fn plain_block(ids: &mut IdGenerator, block: &Block) -> BlockNode {
    BlockNode {
        flow_id: ids.new_id("FL"),
        block_id: block.id.clone(),
        termination: None,
    }
}

fn block_node(ids: &mut IdGenerator, block: &Block) -> FlowNode {
    FlowNode::Block(plain_block(ids, block))
}

impl FlowRoot {
    /// Rewrites block and question references to the ids a remote platform assigned.
    /// Blocks without a mapping are dropped, as is a termination whose question is unmapped.
    pub fn retarget(
        &self,
        blocks: &HashMap<String, String>,
        questions: &HashMap<String, String>,
    ) -> FlowRoot {
        let retarget_block = |node: &BlockNode| -> Option<BlockNode> {
            let block_id = blocks.get(&node.block_id)?.clone();
            let termination = node.termination.as_ref().and_then(|t| {
                questions.get(&t.question_id).map(|question_id| Termination {
                    question_id: question_id.clone(),
                    ..t.clone()
                })
            });
            Some(BlockNode {
                flow_id: node.flow_id.clone(),
                block_id,
                termination,
            })
        };

        let nodes = self
            .nodes
            .iter()
            .filter_map(|node| match node {
                FlowNode::Block(block) => retarget_block(block).map(FlowNode::Block),
                FlowNode::BlockOrderRandomizer(randomizer) => {
                    let wrapped: Vec<BlockNode> =
                        randomizer.blocks.iter().filter_map(retarget_block).collect();
                    match wrapped.len() {
                        0 => None,
                        1 => wrapped.into_iter().next().map(FlowNode::Block),
                        _ => Some(FlowNode::BlockOrderRandomizer(BlockOrderRandomizer {
                            flow_id: randomizer.flow_id.clone(),
                            blocks: wrapped,
                        })),
                    }
                }
                other => Some(other.clone()),
            })
            .collect();

        FlowRoot {
            flow_id: self.flow_id.clone(),
            nodes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::domain::study::DesignType;
    use crate::qsf::blocks::build_block;

    fn blocks(ids: &mut IdGenerator, sections: &[SectionKind]) -> Vec<Block> {
        sections
            .iter()
            .enumerate()
            .map(|(i, s)| build_block(ids, *s, vec![format!("QID{}", i + 1)], false))
            .collect()
    }

    fn shuffle_blocks() -> RandomizationPolicy {
        let mut policy = RandomizationPolicy::default();
        policy.between_blocks.enabled = true;
        policy
    }

    fn kinds(flow: &FlowRoot, blocks: &[Block]) -> Vec<String> {
        flow.nodes
            .iter()
            .map(|node| match node {
                FlowNode::Block(b) => {
                    let block = blocks.iter().find(|x| x.id == b.block_id).unwrap();
                    block.section.key().to_string()
                }
                FlowNode::ConditionRandomizer(_) => "condition_randomizer".to_string(),
                FlowNode::BlockOrderRandomizer(_) => "block_randomizer".to_string(),
                FlowNode::EmbeddedDataSet(_) => "embedded_data".to_string(),
            })
            .collect()
    }

    #[test]
    fn test_consent_first_with_termination_and_debrief_last() {
        let mut ids = IdGenerator::seeded(5);
        let built = blocks(&mut ids, &[SectionKind::Consent, SectionKind::Debrief]);
        let flow = compose_flow(&mut ids, &built, None, &RandomizationPolicy::default());

        assert_eq!(kinds(&flow, &built), vec!["consent", "debrief"]);
        match &flow.nodes[0] {
            FlowNode::Block(node) => {
                let termination = node.termination.as_ref().expect("consent terminates");
                assert_eq!(termination.question_id, "QID1");
                assert_eq!(termination.choice_id, "2");
            }
            other => panic!("unexpected node {:?}", other),
        }
        assert_eq!(flow.terminations().count(), 1);
    }

    #[test]
    fn test_experimental_design_adds_embedded_data_and_condition_randomizer() {
        let mut ids = IdGenerator::seeded(5);
        let built = blocks(
            &mut ids,
            &[
                SectionKind::Consent,
                SectionKind::Demographics,
                SectionKind::ManipulationCheck,
                SectionKind::Debrief,
            ],
        );
        let design = ExperimentalDesign::experimental(&["A", "B"]);
        let flow = compose_flow(&mut ids, &built, Some(&design), &RandomizationPolicy::default());

        assert_eq!(
            kinds(&flow, &built),
            vec![
                "embedded_data",
                "consent",
                "condition_randomizer",
                "demographics",
                "manipulation_check",
                "debrief"
            ]
        );
        let FlowNode::ConditionRandomizer(randomizer) = &flow.nodes[2] else {
            panic!("expected condition randomizer");
        };
        let labels: Vec<&str> = randomizer
            .branches
            .iter()
            .map(|b| b.assignment.fields[0].value.as_deref().unwrap())
            .collect();
        assert_eq!(labels, vec!["A", "B"]);
    }

    #[test]
    fn test_single_condition_skips_randomizer_but_keeps_embedded_data() {
        let mut ids = IdGenerator::seeded(5);
        let built = blocks(&mut ids, &[SectionKind::Consent]);
        let design = ExperimentalDesign::experimental(&["only"]);
        let flow = compose_flow(&mut ids, &built, Some(&design), &RandomizationPolicy::default());
        assert_eq!(kinds(&flow, &built), vec!["embedded_data", "consent"]);
    }

    #[test]
    fn test_experimental_design_without_conditions_is_a_no_op() {
        let mut ids = IdGenerator::seeded(5);
        let built = blocks(&mut ids, &[SectionKind::Consent, SectionKind::ManipulationCheck]);
        let design = ExperimentalDesign::experimental(&[]);
        let flow = compose_flow(&mut ids, &built, Some(&design), &RandomizationPolicy::default());
        assert_eq!(kinds(&flow, &built), vec!["consent", "manipulation_check"]);
    }

    #[test]
    fn test_conditions_of_non_experimental_design_are_ignored() {
        let mut ids = IdGenerator::seeded(5);
        let built = blocks(&mut ids, &[SectionKind::Consent, SectionKind::ManipulationCheck]);
        let design = ExperimentalDesign {
            kind: DesignType::Correlational,
            conditions: vec!["A".into(), "B".into()],
            manipulation_check: None,
        };
        let flow = compose_flow(&mut ids, &built, Some(&design), &RandomizationPolicy::default());
        assert_eq!(kinds(&flow, &built), vec!["consent"]);
    }

    #[test]
    fn test_measures_are_wrapped_when_block_order_is_shuffled() {
        let mut ids = IdGenerator::seeded(5);
        let built = blocks(
            &mut ids,
            &[SectionKind::DvMeasure, SectionKind::DvMeasure, SectionKind::Debrief],
        );
        let flow = compose_flow(&mut ids, &built, None, &shuffle_blocks());

        assert_eq!(kinds(&flow, &built), vec!["block_randomizer", "debrief"]);
        let FlowNode::BlockOrderRandomizer(randomizer) = &flow.nodes[0] else {
            panic!("expected block randomizer");
        };
        assert_eq!(randomizer.blocks.len(), 2);
        assert_eq!(randomizer.blocks[0].block_id, built[0].id);
        assert_eq!(randomizer.blocks[1].block_id, built[1].id);
    }

    #[test]
    fn test_single_measure_is_never_wrapped() {
        let mut ids = IdGenerator::seeded(5);
        let built = blocks(&mut ids, &[SectionKind::DvMeasure]);
        let flow = compose_flow(&mut ids, &built, None, &shuffle_blocks());
        assert_eq!(kinds(&flow, &built), vec!["dv"]);
    }

    #[test]
    fn test_measures_keep_declaration_order_without_shuffle() {
        let mut ids = IdGenerator::seeded(5);
        let built = blocks(&mut ids, &[SectionKind::DvMeasure, SectionKind::DvMeasure]);
        let flow = compose_flow(&mut ids, &built, None, &RandomizationPolicy::default());
        let refs = flow.block_refs();
        assert_eq!(refs, vec![built[0].id.as_str(), built[1].id.as_str()]);
    }

    #[test]
    fn test_empty_blocks_are_skipped() {
        let mut ids = IdGenerator::seeded(5);
        let mut built = blocks(&mut ids, &[SectionKind::Consent, SectionKind::Demographics]);
        built[1].question_ids.clear();
        let flow = compose_flow(&mut ids, &built, None, &RandomizationPolicy::default());
        assert_eq!(flow.block_refs(), vec![built[0].id.as_str()]);
    }

    #[test]
    fn test_retarget_maps_ids_and_drops_unmapped_blocks() {
        let mut ids = IdGenerator::seeded(5);
        let built = blocks(
            &mut ids,
            &[SectionKind::Consent, SectionKind::DvMeasure, SectionKind::DvMeasure],
        );
        let flow = compose_flow(&mut ids, &built, None, &shuffle_blocks());

        let block_map = HashMap::from([
            (built[0].id.clone(), "BL_remote1".to_string()),
            (built[1].id.clone(), "BL_remote2".to_string()),
        ]);
        let question_map = HashMap::from([("QID1".to_string(), "QID7".to_string())]);
        let remote = flow.retarget(&block_map, &question_map);

        assert_eq!(remote.block_refs(), vec!["BL_remote1", "BL_remote2"]);
        // a randomizer left with one block collapses into a plain node
        assert!(matches!(remote.nodes[1], FlowNode::Block(_)));
        let (_, termination) = remote.terminations().next().unwrap();
        assert_eq!(termination.question_id, "QID7");
    }
}
