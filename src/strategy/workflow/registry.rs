// SPDX-License-Identifier: MIT

//! Node executor registry
//!
//! Resolves a node's `(category, type)` pair to its behavior. The builtin
//! table is built once on first use.

use once_cell::sync::Lazy;
use std::collections::HashMap;

use crate::runtime::error::EngineError;
use crate::strategy::workflow::graph::{Category, Node};
use crate::strategy::workflow::nodes::NodeKind;

type KindTable = HashMap<Category, HashMap<&'static str, NodeKind>>;

static BUILTIN_KINDS: Lazy<KindTable> = Lazy::new(|| build_table(NodeKind::ALL));

fn build_table(kinds: impl IntoIterator<Item = NodeKind>) -> KindTable {
    let mut table = KindTable::new();
    for kind in kinds {
        table
            .entry(kind.category())
            .or_default()
            .insert(kind.type_name(), kind);
    }
    table
}

#[derive(Debug, Clone)]
pub struct NodeRegistry {
    kinds: KindTable,
}

impl NodeRegistry {
    /// Registry with every builtin behavior
    pub fn builtin() -> Self {
        Self {
            kinds: BUILTIN_KINDS.clone(),
        }
    }

    /// Registry restricted to the given behaviors
    pub fn with_kinds(kinds: impl IntoIterator<Item = NodeKind>) -> Self {
        Self {
            kinds: build_table(kinds),
        }
    }

    pub fn get(&self, category: &Category, node_type: &str) -> Option<NodeKind> {
        self.kinds.get(category)?.get(node_type).copied()
    }

    /// Resolve the behavior for a node
    pub fn resolve(&self, node: &Node) -> Result<NodeKind, EngineError> {
        self.get(&node.category, &node.node_type)
            .ok_or_else(|| EngineError::unknown_node_type(node.category.as_str(), &node.node_type))
    }

    pub fn len(&self) -> usize {
        self.kinds.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for NodeRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_resolves_every_kind() {
        let registry = NodeRegistry::builtin();
        assert_eq!(registry.len(), NodeKind::ALL.len());

        for kind in NodeKind::ALL {
            assert_eq!(registry.get(&kind.category(), kind.type_name()), Some(kind));
        }
    }

    #[test]
    fn test_resolve_node() {
        let registry = NodeRegistry::default();
        let node = Node::new("s", Category::Risk, "stop_loss");
        assert_eq!(registry.resolve(&node).unwrap(), NodeKind::StopLoss);
    }

    #[test]
    fn test_type_in_wrong_category_is_unknown() {
        let registry = NodeRegistry::builtin();
        let node = Node::new("b", Category::Triggers, "buy");
        match registry.resolve(&node) {
            Err(EngineError::UnknownNodeType {
                category,
                node_type,
            }) => {
                assert_eq!(category, "triggers");
                assert_eq!(node_type, "buy");
            }
            other => panic!("Expected UnknownNodeType, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_category() {
        let registry = NodeRegistry::builtin();
        let node = Node::new("x", Category::Other("oracles".to_string()), "price_cross");
        assert!(matches!(
            registry.resolve(&node),
            Err(EngineError::UnknownNodeType { .. })
        ));
    }

    #[test]
    fn test_restricted_registry() {
        let registry = NodeRegistry::with_kinds([NodeKind::ManualTrigger, NodeKind::Notify]);
        assert_eq!(registry.len(), 2);
        assert!(registry
            .resolve(&Node::new("b", Category::Actions, "buy"))
            .is_err());
        assert!(!registry.is_empty());
    }
}
