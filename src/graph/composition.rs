use crate::core::asset::AssetKey;
use crate::error::{EngineError, EngineResult};
use petgraph::algo::{has_path_connecting, toposort};
use petgraph::graph::{DiGraph, EdgeIndex, NodeIndex};
use petgraph::Direction;
use std::collections::HashMap;

/// Maximum number of edges along any underlying chain.
///
/// The exposure-propagation recursion is bounded here, at
/// registration, so the processing path never has to defend against
/// unbounded composition.
pub const MAX_COMPOSITION_DEPTH: usize = 5;

/// Directed graph of asset composition: an edge `asset -> underlying`
/// means the asset derives its value from the underlying.
///
/// Nodes are asset keys; the graph carries no weights. Links are
/// validated before commit: a link set that would close a cycle or
/// stretch any chain past [`MAX_COMPOSITION_DEPTH`] is rejected and
/// leaves the graph untouched.
#[derive(Debug, Clone, Default)]
pub struct CompositionGraph {
    graph: DiGraph<AssetKey, ()>,
    nodes: HashMap<AssetKey, NodeIndex>,
}

impl CompositionGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an asset node. Idempotent.
    pub fn add_asset(&mut self, asset: &AssetKey) -> NodeIndex {
        if let Some(&ix) = self.nodes.get(asset) {
            return ix;
        }
        let ix = self.graph.add_node(asset.clone());
        self.nodes.insert(asset.clone(), ix);
        ix
    }

    /// Link an asset to its underlying assets, validating acyclicity
    /// and the depth bound. Commits all edges or none.
    pub fn link(&mut self, asset: &AssetKey, underlying: &[AssetKey]) -> EngineResult<()> {
        let asset_ix = self.add_asset(asset);

        // reject self-reference and edges that would close a cycle
        for u in underlying {
            if u == asset {
                return Err(EngineError::CycleDetected {
                    asset: asset.clone(),
                    underlying: u.clone(),
                });
            }
            let u_ix = self.add_asset(u);
            if has_path_connecting(&self.graph, u_ix, asset_ix, None) {
                return Err(EngineError::CycleDetected {
                    asset: asset.clone(),
                    underlying: u.clone(),
                });
            }
        }

        // tentatively add, then verify the depth bound globally
        let mut added: Vec<EdgeIndex> = Vec::with_capacity(underlying.len());
        for u in underlying {
            let u_ix = self.nodes[u];
            added.push(self.graph.add_edge(asset_ix, u_ix, ()));
        }

        if self.longest_chain() > MAX_COMPOSITION_DEPTH {
            // edge removal invalidates later indices, remove in reverse
            for edge in added.into_iter().rev() {
                self.graph.remove_edge(edge);
            }
            return Err(EngineError::MaxDepthExceeded {
                asset: asset.clone(),
                max: MAX_COMPOSITION_DEPTH,
            });
        }
        Ok(())
    }

    /// Length in edges of the longest underlying chain below an asset.
    pub fn depth_of(&self, asset: &AssetKey) -> usize {
        match self.nodes.get(asset) {
            Some(&ix) => self.depths().get(&ix).copied().unwrap_or(0),
            None => 0,
        }
    }

    /// Longest chain anywhere in the graph, in edges.
    pub fn longest_chain(&self) -> usize {
        self.depths().values().copied().max().unwrap_or(0)
    }

    /// Longest downward path from each node, by DP over a topological
    /// order. The graph is a DAG by construction ([`Self::link`]
    /// refuses cycles), so toposort cannot fail here.
    fn depths(&self) -> HashMap<NodeIndex, usize> {
        let order = toposort(&self.graph, None).unwrap_or_default();
        let mut depth: HashMap<NodeIndex, usize> = HashMap::new();
        for &node in order.iter().rev() {
            let below = self
                .graph
                .neighbors_directed(node, Direction::Outgoing)
                .map(|n| depth.get(&n).copied().unwrap_or(0) + 1)
                .max()
                .unwrap_or(0);
            depth.insert(node, below);
        }
        depth
    }
}
