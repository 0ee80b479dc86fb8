//! Drives a migration over a layer set.
//!
//! Every requested layer moves through
//! `Pending -> AncestryResolved -> LinksAllocated -> LowerBuilt -> Translated -> Done`.
//! A failure records the last stage reached. Layers are dispatched root-first,
//! one at a time; the shutdown flag is only consulted between layers.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, info_span, warn};

use super::graph::LayerGraph;
use crate::aufs::ancestry::{read_ancestry, AncestryChain};
use crate::config::FailurePolicy;
use crate::errors::MigrateError;
use crate::overlay::link::allocate_link;
use crate::overlay::lower::{build_lower, write_lower};
use crate::overlay::{diff_dir, OPAQUE_XATTR};
use crate::shutdown;
use crate::store::{LayerId, LinkRef};
use crate::translate::{TranslationReport, WhiteoutTranslator};

/// Knobs for a migration run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrateOptions {
    pub failure_policy: FailurePolicy,
    /// Persist `<id>/lower` and create `<id>/work` for layers with ancestors.
    pub write_lower: bool,
    /// xattr key used to mark directories opaque.
    pub opaque_xattr: String,
}

impl Default for MigrateOptions {
    fn default() -> Self {
        Self {
            failure_policy: FailurePolicy::Abort,
            write_lower: true,
            opaque_xattr: OPAQUE_XATTR.to_string(),
        }
    }
}

/// Per-layer progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Pending,
    AncestryResolved,
    LinksAllocated,
    LowerBuilt,
    Translated,
    Done,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Pending => "pending",
            Stage::AncestryResolved => "ancestry_resolved",
            Stage::LinksAllocated => "links_allocated",
            Stage::LowerBuilt => "lower_built",
            Stage::Translated => "translated",
            Stage::Done => "done",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a fully migrated layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigratedLayer {
    pub link: LinkRef,
    /// Links of the ancestors, in ancestry-record order.
    pub parent_links: Vec<LinkRef>,
    /// Lower chain; empty for root layers.
    pub lower: String,
    /// Whether `<id>/lower` was written in this run.
    pub lower_written: bool,
    pub translation: TranslationReport,
}

/// Terminal state of one layer.
#[derive(Debug)]
pub enum LayerStatus {
    Done(MigratedLayer),
    /// Failed after the layer's own link record reached the disk. Nothing is
    /// rolled back.
    PartiallyMigrated { reached: Stage, error: MigrateError },
    /// Failed before anything of this layer was written.
    Failed { reached: Stage, error: MigrateError },
    /// Not attempted because an ancestor did not migrate.
    Skipped { error: MigrateError },
}

impl LayerStatus {
    pub fn is_done(&self) -> bool {
        matches!(self, LayerStatus::Done(_))
    }

    pub fn error(&self) -> Option<&MigrateError> {
        match self {
            LayerStatus::Done(_) => None,
            LayerStatus::PartiallyMigrated { error, .. }
            | LayerStatus::Failed { error, .. }
            | LayerStatus::Skipped { error } => Some(error),
        }
    }

    /// Last stage the layer reached.
    pub fn reached(&self) -> Stage {
        match self {
            LayerStatus::Done(_) => Stage::Done,
            LayerStatus::PartiallyMigrated { reached, .. } | LayerStatus::Failed { reached, .. } => {
                *reached
            }
            LayerStatus::Skipped { .. } => Stage::Pending,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            LayerStatus::Done(_) => "done",
            LayerStatus::PartiallyMigrated { .. } => "partial",
            LayerStatus::Failed { .. } => "failed",
            LayerStatus::Skipped { .. } => "skipped",
        }
    }
}

#[derive(Debug)]
pub struct LayerOutcome {
    pub layer: LayerId,
    pub status: LayerStatus,
}

/// Aggregated result of a run.
#[derive(Debug, Default)]
pub struct MigrationReport {
    /// Outcomes in the order they were decided.
    pub outcomes: Vec<LayerOutcome>,
    /// Layers never dispatched (abort or shutdown).
    pub not_attempted: Vec<LayerId>,
    /// The shutdown flag stopped the run.
    pub interrupted: bool,
}

impl MigrationReport {
    /// True when every requested layer finished.
    pub fn is_success(&self) -> bool {
        !self.interrupted
            && self.not_attempted.is_empty()
            && self.outcomes.iter().all(|o| o.status.is_done())
    }

    pub fn outcome(&self, layer: &LayerId) -> Option<&LayerOutcome> {
        self.outcomes.iter().find(|o| &o.layer == layer)
    }

    /// Migrated layers with their results.
    pub fn migrated(&self) -> impl Iterator<Item = (&LayerId, &MigratedLayer)> {
        self.outcomes.iter().filter_map(|o| match &o.status {
            LayerStatus::Done(m) => Some((&o.layer, m)),
            _ => None,
        })
    }

    pub fn done_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.status.is_done()).count()
    }

    /// Failed plus partially migrated layers.
    pub fn failed_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| {
                matches!(
                    o.status,
                    LayerStatus::Failed { .. } | LayerStatus::PartiallyMigrated { .. }
                )
            })
            .count()
    }

    pub fn skipped_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, LayerStatus::Skipped { .. }))
            .count()
    }

    /// First failed or partial layer's error (skips are consequences, not causes).
    pub fn first_failure(&self) -> Option<&MigrateError> {
        self.outcomes
            .iter()
            .filter(|o| !matches!(o.status, LayerStatus::Skipped { .. }))
            .find_map(|o| o.status.error())
    }

    /// Process exit code for this report.
    pub fn exit_code(&self) -> i32 {
        if self.is_success() {
            0
        } else if self.interrupted {
            MigrateError::Interrupted.code()
        } else {
            self.first_failure().map(MigrateError::code).unwrap_or(1)
        }
    }
}

/// Dispatch order plus everything that cannot be ordered.
#[derive(Debug, Default)]
pub struct MigrationPlan {
    /// Root-first dispatch order.
    pub order: Vec<LayerId>,
    pub chains: BTreeMap<LayerId, AncestryChain>,
    /// Layers on or below an ancestry cycle.
    pub cyclic: Vec<LayerId>,
    /// Layers whose ancestry record could not be read.
    pub unreadable: Vec<(LayerId, io::Error)>,
}

impl MigrationPlan {
    /// No cyclic and no unreadable layers.
    pub fn is_clean(&self) -> bool {
        self.cyclic.is_empty() && self.unreadable.is_empty()
    }

    /// Number of distinct requested layers.
    pub fn len(&self) -> usize {
        self.order.len() + self.cyclic.len() + self.unreadable.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Migrates layers from an aufs root into an overlay2 root.
#[derive(Debug, Clone)]
pub struct Migrator {
    aufs_root: PathBuf,
    overlay_root: PathBuf,
    options: MigrateOptions,
    translator: WhiteoutTranslator,
}

impl Migrator {
    pub fn new(
        aufs_root: impl Into<PathBuf>,
        overlay_root: impl Into<PathBuf>,
        options: MigrateOptions,
    ) -> Self {
        let translator = WhiteoutTranslator::new(options.opaque_xattr.clone());
        Self {
            aufs_root: aufs_root.into(),
            overlay_root: overlay_root.into(),
            options,
            translator,
        }
    }

    pub fn aufs_root(&self) -> &Path {
        &self.aufs_root
    }

    pub fn overlay_root(&self) -> &Path {
        &self.overlay_root
    }

    pub fn options(&self) -> &MigrateOptions {
        &self.options
    }

    /// Read every requested layer's ancestry and order the set. Read-only.
    /// Duplicate ids in `layers` are planned once.
    pub fn plan(&self, layers: &[LayerId]) -> MigrationPlan {
        let mut plan = MigrationPlan::default();
        let mut seen = BTreeSet::new();
        for layer in layers {
            if !seen.insert(layer) {
                continue;
            }
            match read_ancestry(&self.aufs_root, layer) {
                Ok(chain) => {
                    debug!(layer = %layer, parents = chain.len(), "resolved ancestry");
                    plan.chains.insert(layer.clone(), chain);
                }
                Err(e) => {
                    warn!(layer = %layer, error = %e, "ancestry unreadable");
                    plan.unreadable.push((layer.clone(), e));
                }
            }
        }

        let graph = LayerGraph::from_chains(plan.chains.iter());
        let (order, cyclic) = graph.topological_order();
        for layer in &cyclic {
            warn!(layer = %layer, "layer is on or below an ancestry cycle");
        }
        plan.order = order;
        plan.cyclic = cyclic;
        plan
    }

    /// Plan and execute.
    pub fn run(&self, layers: &[LayerId]) -> MigrationReport {
        let plan = self.plan(layers);
        self.execute(plan)
    }

    /// Execute a plan produced by [`Migrator::plan`].
    pub fn execute(&self, plan: MigrationPlan) -> MigrationReport {
        let MigrationPlan {
            order,
            chains,
            cyclic,
            unreadable,
        } = plan;
        let abort = self.options.failure_policy == FailurePolicy::Abort;
        let blocked = !cyclic.is_empty() || !unreadable.is_empty();

        let requested: BTreeSet<LayerId> = order
            .iter()
            .chain(&cyclic)
            .chain(unreadable.iter().map(|(layer, _)| layer))
            .cloned()
            .collect();

        let mut report = MigrationReport::default();
        for (layer, source) in unreadable {
            report.outcomes.push(LayerOutcome {
                layer: layer.clone(),
                status: LayerStatus::Failed {
                    reached: Stage::Pending,
                    error: MigrateError::AncestryUnreadable { layer, source },
                },
            });
        }
        for layer in cyclic {
            report.outcomes.push(LayerOutcome {
                layer: layer.clone(),
                status: LayerStatus::Failed {
                    reached: Stage::Pending,
                    error: MigrateError::AncestryCycle { layer },
                },
            });
        }

        if abort && blocked {
            error!(
                failed = report.outcomes.len(),
                not_attempted = order.len(),
                "ancestry is unreadable or cyclic; nothing was migrated"
            );
            report.not_attempted = order;
            return report;
        }

        let root = AncestryChain::default();
        let mut done: BTreeSet<LayerId> = BTreeSet::new();
        for (idx, layer) in order.iter().enumerate() {
            if shutdown::is_requested() {
                warn!(remaining = order.len() - idx, "shutdown requested; stopping before next layer");
                report.interrupted = true;
                report.not_attempted.extend(order[idx..].iter().cloned());
                break;
            }

            let chain = chains.get(layer).unwrap_or(&root);
            if let Some(ancestor) = chain
                .iter()
                .find(|p| requested.contains(*p) && !done.contains(*p))
            {
                warn!(layer = %layer, ancestor = %ancestor, "skipping layer; ancestor did not migrate");
                report.outcomes.push(LayerOutcome {
                    layer: layer.clone(),
                    status: LayerStatus::Skipped {
                        error: MigrateError::AncestorNotMigrated {
                            layer: layer.clone(),
                            ancestor: ancestor.clone(),
                        },
                    },
                });
                continue;
            }

            let status = self.migrate_layer(layer, chain);
            let finished = status.is_done();
            if finished {
                done.insert(layer.clone());
            }
            report.outcomes.push(LayerOutcome {
                layer: layer.clone(),
                status,
            });
            if !finished && abort {
                report.not_attempted.extend(order[idx + 1..].iter().cloned());
                break;
            }
        }

        info!(
            done = report.done_count(),
            failed = report.failed_count(),
            skipped = report.skipped_count(),
            not_attempted = report.not_attempted.len(),
            interrupted = report.interrupted,
            "migration finished"
        );
        report
    }

    fn migrate_layer(&self, layer: &LayerId, chain: &AncestryChain) -> LayerStatus {
        let span = info_span!("layer", layer = %layer);
        let _enter = span.enter();
        info!(parents = chain.len(), "migrating layer");

        let link = match allocate_link(&self.overlay_root, layer) {
            Ok(link) => link,
            Err(error) => {
                let partial = matches!(
                    error,
                    MigrateError::LinkAllocationFailed { record_written: true, .. }
                );
                return layer_failed(Stage::AncestryResolved, error, partial);
            }
        };

        let mut parent_links = Vec::with_capacity(chain.len());
        for parent in chain {
            match allocate_link(&self.overlay_root, parent) {
                Ok(parent_link) => parent_links.push(parent_link),
                Err(error) => return layer_failed(Stage::AncestryResolved, error, true),
            }
        }

        let lower = build_lower(&parent_links);

        let diff = diff_dir(&self.overlay_root, layer);
        let translation = match self.translator.translate(&diff) {
            Ok(t) => t,
            Err(source) => {
                let error = MigrateError::TranslationFailed {
                    layer: layer.clone(),
                    source,
                };
                return layer_failed(Stage::LowerBuilt, error, true);
            }
        };

        let lower_written = self.options.write_lower && !lower.is_empty();
        if lower_written {
            if let Err(source) = write_lower(&self.overlay_root, layer, &lower) {
                let error = MigrateError::LowerPersistFailed {
                    layer: layer.clone(),
                    source,
                };
                return layer_failed(Stage::Translated, error, true);
            }
        }

        info!(
            link = %link,
            lower = %lower,
            whiteouts = translation.whiteouts,
            opaque_dirs = translation.opaque_dirs,
            "layer migrated"
        );
        LayerStatus::Done(MigratedLayer {
            link,
            parent_links,
            lower,
            lower_written,
            translation,
        })
    }
}

fn layer_failed(reached: Stage, error: MigrateError, partial: bool) -> LayerStatus {
    error!(
        stage = %reached,
        kind = error.kind(),
        code = error.code(),
        partial,
        error = %error,
        "layer failed"
    );
    if partial {
        LayerStatus::PartiallyMigrated { reached, error }
    } else {
        LayerStatus::Failed { reached, error }
    }
}
