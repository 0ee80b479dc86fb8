//! Migration engine: layer ordering and the per-layer stage machine.

pub mod graph;
pub mod orchestrator;

pub use graph::LayerGraph;
pub use orchestrator::{
    LayerOutcome, LayerStatus, MigrateOptions, MigratedLayer, MigrationPlan, MigrationReport,
    Migrator, Stage,
};
