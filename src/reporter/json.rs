use crate::error::Result;
use crate::store::EntityStore;
use crate::types::{Block, Class, CurriculumSummary, SolveOutcome, TeachingSet, YearId};
use serde::Serialize;

/// Full solve outcome (report + placements) as pretty JSON
pub fn generate_json_report(outcome: &SolveOutcome) -> Result<String> {
    Ok(serde_json::to_string_pretty(outcome)?)
}

/// The curriculum structure materialized for one year
#[derive(Debug, Serialize)]
pub struct CurriculumExport {
    pub summary: CurriculumSummary,
    pub blocks: Vec<Block>,
    pub sets: Vec<TeachingSet>,
    pub classes: Vec<Class>,
}

/// Export a year's block/set/class records alongside the build summary
pub fn generate_curriculum_json(
    store: &EntityStore,
    year: YearId,
    summary: &CurriculumSummary,
) -> Result<String> {
    let blocks: Vec<Block> = store.blocks_in(year).into_iter().cloned().collect();
    let sets: Vec<TeachingSet> = blocks
        .iter()
        .flat_map(|b| store.sets_in_block(b.id))
        .cloned()
        .collect();
    let classes: Vec<Class> = store.classes_in(year).into_iter().cloned().collect();
    let export = CurriculumExport {
        summary: summary.clone(),
        blocks,
        sets,
        classes,
    };
    Ok(serde_json::to_string_pretty(&export)?)
}
