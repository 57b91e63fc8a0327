use std::collections::BTreeMap;

use log::{debug, info};
use rayon::prelude::*;
use uuid::Uuid;

use layerlint_core::spatial::{ShapeEntry, SpatialIndex};
use layerlint_core::{BBox, BoundaryArena, LayerId, Point, Rect, WireSegment};

use crate::checker_jog::JogChecker;
use crate::checker_step::MinStepChecker;
use crate::condition::LayerConditions;
use crate::error::DrcError;
use crate::rules::RuleTable;
use crate::violation::{ViolationMap, ViolationStore};

/// Net identity attributed to environment geometry owned by no net.
pub const ENV_NET_ID: i32 = -1;

/// How a pass was triggered, selecting which rule families run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrcCheckKind {
    /// Full-layout check over everything the manager has ingested.
    Def,
    /// Routing-triggered check restricted to the supplied geometry and its
    /// neighborhood.
    Incremental,
}

/// Stages of one check pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassStage {
    Idle,
    DataInit,
    BuildConditions,
    RunCheckers,
    Collected,
}

/// A layer-tagged polygon boundary with net attribution, as delivered by
/// the external geometry engine (already merged; no booleans happen here).
#[derive(Debug, Clone)]
pub struct LayoutPolygon {
    pub layer_id: LayerId,
    pub net_id: i32,
    pub vertices: Vec<Point>,
}

/// Drives the check pipeline: data-init, build-conditions, run-checkers,
/// collect. Holds the read-only rule repository and the full-layout
/// geometry; per-pass state (boundary model, violation store) is rebuilt
/// from scratch every pass.
pub struct DrcManager {
    rules: RuleTable,
    layout: Vec<LayoutPolygon>,
    stage: PassStage,
}

impl DrcManager {
    /// Fails when the rule repository could not be populated; that is the
    /// one initialization error that aborts instead of degrading.
    pub fn new(rules: RuleTable) -> Result<Self, DrcError> {
        if rules.is_empty() {
            return Err(DrcError::EmptyRuleRepository);
        }
        Ok(Self {
            rules,
            layout: Vec::new(),
            stage: PassStage::Idle,
        })
    }

    pub fn stage(&self) -> PassStage {
        self.stage
    }

    pub fn rules(&self) -> &RuleTable {
        &self.rules
    }

    /// Register full-layout geometry from the layout collaborator.
    pub fn ingest_polygon(&mut self, layer_id: LayerId, net_id: i32, vertices: Vec<Point>) {
        self.layout.push(LayoutPolygon {
            layer_id,
            net_id,
            vertices,
        });
    }

    pub fn ingest_rect(&mut self, net_id: i32, rect: &Rect) {
        self.ingest_polygon(rect.layer_id, net_id, rect.outline().to_vec());
    }

    /// Full-layout check: no incremental inputs supplied.
    pub fn check_def(&mut self) -> Result<ViolationMap, DrcError> {
        self.check(&[], &BTreeMap::new(), &BTreeMap::new())
    }

    /// Run one check pass. All three inputs empty means a full-DEF pass
    /// over the ingested layout; any non-empty input means an incremental
    /// pass restricted to the supplied geometry plus the ingested shapes
    /// it touches.
    pub fn check(
        &mut self,
        env_shapes: &[Rect],
        pin_shapes: &BTreeMap<i32, Vec<Rect>>,
        routing_wires: &BTreeMap<i32, Vec<WireSegment>>,
    ) -> Result<ViolationMap, DrcError> {
        let pass_id = Uuid::new_v4();

        self.stage = PassStage::DataInit;
        let kind = if env_shapes.is_empty() && pin_shapes.is_empty() && routing_wires.is_empty() {
            DrcCheckKind::Def
        } else {
            DrcCheckKind::Incremental
        };
        info!("drc pass {pass_id}: data init, kind {kind:?}");
        let polygons = self.collect_geometry(kind, env_shapes, pin_shapes, routing_wires);

        self.stage = PassStage::BuildConditions;
        let mut conditions = self.build_conditions(&polygons);
        debug!(
            "drc pass {pass_id}: built conditions for {} layers",
            conditions.len()
        );

        self.stage = PassStage::RunCheckers;
        let rules = &self.rules;
        let mut results: Vec<(LayerId, ViolationStore)> = conditions
            .par_iter_mut()
            .map(|cond| {
                let mut store = ViolationStore::new();
                let step_checker = MinStepChecker::new(rules);
                match kind {
                    DrcCheckKind::Def => {
                        step_checker.check_complete_mode(cond, &mut store);
                        JogChecker::new(rules).check(cond, &mut store);
                    }
                    DrcCheckKind::Incremental => {
                        step_checker.check_fast_mode(cond, &mut store);
                    }
                }
                (cond.layer_id, store)
            })
            .collect();

        // Merge in ascending layer order so output is reproducible.
        results.sort_by_key(|(layer_id, _)| *layer_id);
        let mut merged = ViolationStore::new();
        for (_, store) in results {
            merged.merge(store);
        }

        self.stage = PassStage::Collected;
        info!("drc pass {pass_id}: {} violations", merged.total());
        let map = merged.into_violation_map();
        self.stage = PassStage::Idle;
        Ok(map)
    }

    fn collect_geometry(
        &self,
        kind: DrcCheckKind,
        env_shapes: &[Rect],
        pin_shapes: &BTreeMap<i32, Vec<Rect>>,
        routing_wires: &BTreeMap<i32, Vec<WireSegment>>,
    ) -> Vec<LayoutPolygon> {
        if kind == DrcCheckKind::Def {
            return self.layout.clone();
        }

        let mut polygons = Vec::new();
        let mut entries = Vec::new();
        for rect in env_shapes {
            polygons.push(LayoutPolygon {
                layer_id: rect.layer_id,
                net_id: ENV_NET_ID,
                vertices: rect.outline().to_vec(),
            });
            entries.push(ShapeEntry::from_rect(ENV_NET_ID, rect));
        }
        for (&net_id, rects) in pin_shapes {
            for rect in rects {
                polygons.push(LayoutPolygon {
                    layer_id: rect.layer_id,
                    net_id,
                    vertices: rect.outline().to_vec(),
                });
                entries.push(ShapeEntry::from_rect(net_id, rect));
            }
        }
        for (&net_id, wires) in routing_wires {
            for wire in wires {
                let rect = wire.to_rect();
                polygons.push(LayoutPolygon {
                    layer_id: rect.layer_id,
                    net_id,
                    vertices: rect.outline().to_vec(),
                });
                entries.push(ShapeEntry::from_rect(net_id, &rect));
            }
        }

        // Pull in ingested layout shapes the supplied geometry touches, so
        // the incremental pass sees its immediate context.
        let index = SpatialIndex::build(entries);
        for polygon in &self.layout {
            let Some(bbox) = BBox::from_points(&polygon.vertices) else {
                continue;
            };
            if !index.query_layer_region(polygon.layer_id, &bbox).is_empty() {
                polygons.push(polygon.clone());
            }
        }

        polygons
    }

    fn build_conditions(&self, polygons: &[LayoutPolygon]) -> Vec<LayerConditions> {
        let mut by_layer: BTreeMap<LayerId, BoundaryArena> = BTreeMap::new();
        for polygon in polygons {
            by_layer
                .entry(polygon.layer_id)
                .or_default()
                .add_polygon_lossy(polygon.net_id, &polygon.vertices);
        }

        by_layer
            .into_iter()
            .map(|(layer_id, arena)| {
                let mut cond = LayerConditions::new(layer_id, arena);
                cond.build_candidates(&self.rules);
                cond
            })
            .collect()
    }
}
