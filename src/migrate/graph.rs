//! Parent relation over the requested layer set.
//!
//! Only edges between requested layers are kept; ancestors outside the set
//! do not constrain the order (their links are allocated on demand).

use std::collections::{BTreeMap, BTreeSet};

use crate::aufs::ancestry::AncestryChain;
use crate::store::LayerId;

/// Directed graph of the parent relation, parent -> child.
#[derive(Debug, Clone, Default)]
pub struct LayerGraph {
    /// Distinct in-set parents of each layer.
    parents: BTreeMap<LayerId, BTreeSet<LayerId>>,
    children: BTreeMap<LayerId, BTreeSet<LayerId>>,
}

impl LayerGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the graph from every requested layer and its ancestry.
    pub fn from_chains<'a>(chains: impl IntoIterator<Item = (&'a LayerId, &'a AncestryChain)>) -> Self {
        let chains: Vec<_> = chains.into_iter().collect();
        let mut graph = Self::new();
        for (layer, _) in &chains {
            graph.add_layer((*layer).clone());
        }
        for (layer, chain) in &chains {
            for parent in chain.iter() {
                if graph.contains(parent) {
                    graph.add_edge(parent.clone(), (*layer).clone());
                }
            }
        }
        graph
    }

    pub fn add_layer(&mut self, layer: LayerId) {
        self.parents.entry(layer.clone()).or_default();
        self.children.entry(layer).or_default();
    }

    /// Record `parent -> child`. Both ends are added if missing; repeated edges collapse.
    pub fn add_edge(&mut self, parent: LayerId, child: LayerId) {
        self.add_layer(parent.clone());
        self.add_layer(child.clone());
        self.children.entry(parent.clone()).or_default().insert(child.clone());
        self.parents.entry(child).or_default().insert(parent);
    }

    pub fn contains(&self, layer: &LayerId) -> bool {
        self.parents.contains_key(layer)
    }

    pub fn len(&self) -> usize {
        self.parents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parents.is_empty()
    }

    pub fn parents_of(&self, layer: &LayerId) -> impl Iterator<Item = &LayerId> {
        self.parents.get(layer).into_iter().flatten()
    }

    pub fn children_of(&self, layer: &LayerId) -> impl Iterator<Item = &LayerId> {
        self.children.get(layer).into_iter().flatten()
    }

    /// Root-first order via Kahn's algorithm. Among layers that are ready at the
    /// same time the smallest id goes first.
    ///
    /// Returns `(ordered, unordered)`: the second list holds every layer on a
    /// cycle or downstream of one, sorted by id.
    pub fn topological_order(&self) -> (Vec<LayerId>, Vec<LayerId>) {
        let mut in_degree: BTreeMap<&LayerId, usize> = self
            .parents
            .iter()
            .map(|(layer, parents)| (layer, parents.len()))
            .collect();

        let mut ready: BTreeSet<&LayerId> = in_degree
            .iter()
            .filter(|(_, deg)| **deg == 0)
            .map(|(layer, _)| *layer)
            .collect();

        let mut order = Vec::with_capacity(self.len());
        while let Some(current) = ready.pop_first() {
            order.push(current.clone());
            for child in self.children_of(current) {
                if let Some(deg) = in_degree.get_mut(child) {
                    *deg -= 1;
                    if *deg == 0 {
                        ready.insert(child);
                    }
                }
            }
        }

        let unordered = if order.len() == self.len() {
            Vec::new()
        } else {
            in_degree
                .into_iter()
                .filter(|(_, deg)| *deg > 0)
                .map(|(layer, _)| layer.clone())
                .collect()
        };
        (order, unordered)
    }
}
