//! Route table
//!
//! A tree of matcher nodes kept in an arena: each node owns its compiled
//! pattern and normalized record, points back at its parent by id, and
//! owns the id lists of its children and alias nodes. Two indexes sit on
//! top: the ordered matcher list (descending specificity, consulted by
//! path resolution) and the name index.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;
use wayfare_path::{parse_path_pattern, PathParams, PathPattern, TemplateError};

use crate::location::{strip_base, LocationSpec, MatchedRecord, RouteLocation};
use crate::record::{RouteDefinition, RouteMeta, RouteRecord};

/// Stable handle of a matcher node within its table
pub type MatcherId = usize;

pub(crate) struct MatcherNode {
    pattern: PathPattern,
    record: Arc<RouteRecord>,
    parent: Option<MatcherId>,
    children: Vec<MatcherId>,
    aliases: Vec<MatcherId>,
}

/// Resolution failure below the navigation pipeline
#[derive(Debug, Error)]
pub enum MatchError {
    #[error("no route named {0:?} is registered")]
    NameNotFound(String),

    #[error("the current location {0:?} does not match any registered route")]
    CurrentUnmatched(String),

    #[error(transparent)]
    Template(#[from] TemplateError),
}

/// Matcher-level resolution result; the router layers query/hash/href on
/// top of this
#[derive(Debug)]
pub struct MatchedLocation {
    pub name: Option<String>,
    pub path: String,
    pub params: PathParams,
    /// Matched records root-to-leaf; empty when no pattern accepted a path
    pub matched: Vec<MatchedRecord>,
    /// Ancestor metadata merged root-to-leaf
    pub meta: RouteMeta,
}

/// Matcher-level request: the target spec plus already-encoded params
pub struct ResolveRequest {
    pub spec: LocationSpec,
    pub params: PathParams,
}

pub struct RouteTable {
    base: String,
    nodes: Vec<Option<MatcherNode>>,
    /// Matcher ids ordered by descending specificity
    order: Vec<MatcherId>,
    names: HashMap<String, MatcherId>,
}

impl RouteTable {
    pub fn new(base: impl Into<String>) -> Self {
        RouteTable {
            base: base.into(),
            nodes: Vec::new(),
            order: Vec::new(),
            names: HashMap::new(),
        }
    }

    pub fn with_routes(
        base: impl Into<String>,
        routes: &[RouteDefinition],
    ) -> Result<Self, TemplateError> {
        let mut table = RouteTable::new(base);
        for route in routes {
            table.add(route, None)?;
        }
        Ok(table)
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    fn node(&self, id: MatcherId) -> Option<&MatcherNode> {
        self.nodes.get(id).and_then(Option::as_ref)
    }

    /// Registers a definition (and its aliases and children); returns the
    /// primary node's id
    pub fn add(
        &mut self,
        definition: &RouteDefinition,
        parent: Option<MatcherId>,
    ) -> Result<MatcherId, TemplateError> {
        self.add_record(definition, parent, None)
    }

    fn add_record(
        &mut self,
        definition: &RouteDefinition,
        parent: Option<MatcherId>,
        original: Option<MatcherId>,
    ) -> Result<MatcherId, TemplateError> {
        let is_root_add = original.is_none();

        // the slot map is shared by the primary node, its aliases, and,
        // on re-adds, the structurally corresponding original node
        let components = match original.and_then(|id| self.node(id)) {
            Some(node) => Arc::clone(&node.record.components),
            None => definition.build_slots(),
        };

        let mut variants: Vec<&str> = Vec::with_capacity(1 + definition.alias.len());
        variants.push(&definition.path);
        variants.extend(definition.alias.iter().map(String::as_str));

        let mut original_record = original;
        let mut primary: Option<MatcherId> = None;

        for (variant_index, variant_path) in variants.into_iter().enumerate() {
            let is_alias = variant_index > 0;
            let full_path = self.join_parent_path(parent, variant_path);

            if full_path == "*" {
                return Err(TemplateError::BareWildcard);
            }

            let pattern = parse_path_pattern(&full_path)?;

            // re-adding a taken name hot-swaps the previous subtree; this
            // runs only after the new path compiled, so a bad definition
            // leaves the old routes intact
            if !is_alias && is_root_add {
                if let Some(name) = &definition.name {
                    if self.names.contains_key(name) {
                        self.remove_by_name(name);
                    }
                }
            }

            let record = Arc::new(RouteRecord::normalize(
                definition,
                full_path,
                Arc::clone(&components),
            ));

            let id = self.nodes.len();
            self.nodes.push(Some(MatcherNode {
                pattern,
                record,
                parent,
                children: Vec::new(),
                aliases: Vec::new(),
            }));

            if let Some(primary_id) = primary {
                if let Some(Some(primary_node)) = self.nodes.get_mut(primary_id) {
                    primary_node.aliases.push(id);
                }
            } else {
                primary = Some(id);
                if let Some(parent_id) = parent {
                    if let Some(Some(parent_node)) = self.nodes.get_mut(parent_id) {
                        parent_node.children.push(id);
                    }
                }
            }

            for (child_index, child) in definition.children.iter().enumerate() {
                let child_original = original_record
                    .and_then(|record_id| self.node(record_id))
                    .and_then(|node| node.children.get(child_index).copied());
                self.add_record(child, Some(id), child_original)?;
            }

            original_record.get_or_insert(id);

            let node_record = match self.node(id) {
                Some(node) => Arc::clone(&node.record),
                None => continue,
            };

            // structural parents without a name, redirect, or components
            // stay out of path and name resolution
            if node_record.name.is_some()
                || node_record.redirect.is_some()
                || node_record.has_components()
            {
                self.append_to_order(id);
                if let Some(name) = &node_record.name {
                    self.names.insert(name.clone(), id);
                }
            }
        }

        // at least one variant always exists (the primary path)
        primary.ok_or_else(|| TemplateError::Malformed {
            path: definition.path.clone(),
        })
    }

    fn join_parent_path(&self, parent: Option<MatcherId>, path: &str) -> String {
        match parent.and_then(|id| self.node(id)) {
            Some(parent_node) if !path.starts_with('/') => {
                let parent_path = &parent_node.record.path;
                if path.is_empty() {
                    parent_path.clone()
                } else if parent_path.ends_with('/') {
                    format!("{parent_path}{path}")
                } else {
                    format!("{parent_path}/{path}")
                }
            }
            _ => path.to_string(),
        }
    }

    /// Inserts a node into the ordered list at its specificity rank. A
    /// node with the same path as an ancestor slots in before it, so
    /// child records shadow their structural parents.
    fn append_to_order(&mut self, id: MatcherId) {
        let Some(node) = self.node(id) else { return };
        let pattern = node.pattern.clone();
        let path = node.record.path.clone();

        let mut index = 0;
        while index < self.order.len() {
            let Some(existing) = self.node(self.order[index]) else {
                index += 1;
                continue;
            };

            let ranks_after =
                PathPattern::compare(&pattern, &existing.pattern) != Ordering::Less;
            let shadows_ancestor =
                path == existing.record.path && self.is_descendant(id, self.order[index]);

            if ranks_after && !shadows_ancestor {
                index += 1;
            } else {
                break;
            }
        }

        self.order.insert(index, id);
    }

    fn is_descendant(&self, id: MatcherId, ancestor: MatcherId) -> bool {
        let mut cursor = self.node(id).and_then(|node| node.parent);
        while let Some(current) = cursor {
            if current == ancestor {
                return true;
            }
            cursor = self.node(current).and_then(|node| node.parent);
        }
        false
    }

    /// Removes a named node and its whole subtree; returns whether the
    /// name was registered
    pub fn remove_by_name(&mut self, name: &str) -> bool {
        match self.names.get(name).copied() {
            Some(id) => {
                self.remove_node(id);
                true
            }
            None => false,
        }
    }

    /// Removes a node, cascading through children and aliases
    pub fn remove_node(&mut self, id: MatcherId) {
        let Some(node) = self.nodes.get_mut(id).and_then(Option::take) else {
            return;
        };

        self.order.retain(|&entry| entry != id);

        if let Some(name) = &node.record.name {
            if self.names.get(name) == Some(&id) {
                self.names.remove(name);
            }
        }

        if let Some(parent_id) = node.parent {
            if let Some(Some(parent_node)) = self.nodes.get_mut(parent_id) {
                parent_node.children.retain(|&child| child != id);
                parent_node.aliases.retain(|&alias| alias != id);
            }
        }

        for child in node.children {
            self.remove_node(child);
        }
        for alias in node.aliases {
            self.remove_node(alias);
        }
    }

    pub fn name_to_id(&self, name: &str) -> Option<MatcherId> {
        self.names.get(name).copied()
    }

    pub fn has_name(&self, name: &str) -> bool {
        self.names.contains_key(name)
    }

    /// Records of the ordered matcher list, most specific first
    pub fn records(&self) -> Vec<Arc<RouteRecord>> {
        self.order
            .iter()
            .filter_map(|&id| self.node(id))
            .map(|node| Arc::clone(&node.record))
            .collect()
    }

    fn find_by_path(&self, path: &str) -> Option<MatcherId> {
        self.order
            .iter()
            .copied()
            .find(|&id| {
                self.node(id)
                    .is_some_and(|node| node.pattern.matches(path))
            })
    }

    /// Resolves a request against the table
    ///
    /// - by name: unknown names fail; params are inherited from the
    ///   current location for the matcher's required keys, overridden by
    ///   explicitly supplied values for its own keys
    /// - by path: the first accepting pattern in specificity order wins;
    ///   no acceptor yields an empty matched chain
    /// - relative: the current location re-resolves with param overrides
    pub fn resolve(
        &self,
        request: &ResolveRequest,
        current: &RouteLocation,
    ) -> Result<MatchedLocation, MatchError> {
        let (found, params, path, name) = match &request.spec {
            LocationSpec::Name(name) => {
                let id = self
                    .name_to_id(name)
                    .ok_or_else(|| MatchError::NameNotFound(name.clone()))?;
                let Some(node) = self.node(id) else {
                    return Err(MatchError::NameNotFound(name.clone()));
                };

                let mut params = PathParams::new();
                for key in node.pattern.keys().iter().filter(|key| !key.optional) {
                    if let Some(value) = current.params.get(&key.name) {
                        params.insert(key.name.clone(), value.clone());
                    }
                }
                for key in node.pattern.keys() {
                    if let Some(value) = request.params.get(&key.name) {
                        params.insert(key.name.clone(), value.clone());
                    }
                }

                let path = node.pattern.stringify(&params)?;
                (Some(id), params, path, node.record.name.clone())
            }
            LocationSpec::Path(path) => {
                let stripped = strip_base(path, &self.base);

                match self.find_by_path(&stripped) {
                    Some(id) => {
                        let Some(node) = self.node(id) else {
                            return Ok(MatchedLocation {
                                name: None,
                                path: stripped,
                                params: PathParams::new(),
                                matched: Vec::new(),
                                meta: RouteMeta::new(),
                            });
                        };
                        let params = node.pattern.parse(&stripped).unwrap_or_default();
                        (Some(id), params, stripped, node.record.name.clone())
                    }
                    None => (None, PathParams::new(), stripped, None),
                }
            }
            LocationSpec::Relative => {
                let id = match &current.name {
                    Some(name) => self.name_to_id(name),
                    None => self.find_by_path(&current.path),
                };
                let Some(id) = id else {
                    return Err(MatchError::CurrentUnmatched(
                        current
                            .name
                            .clone()
                            .unwrap_or_else(|| current.path.clone()),
                    ));
                };
                let Some(node) = self.node(id) else {
                    return Err(MatchError::CurrentUnmatched(current.path.clone()));
                };

                let mut params = current.params.clone();
                for (key, value) in &request.params {
                    params.insert(key.clone(), value.clone());
                }

                let path = node.pattern.stringify(&params)?;
                (Some(id), params, path, node.record.name.clone())
            }
        };

        let mut matched: Vec<MatchedRecord> = Vec::new();
        let mut cursor = found;
        while let Some(id) = cursor {
            let Some(node) = self.node(id) else { break };
            matched.insert(
                0,
                MatchedRecord {
                    record: Arc::clone(&node.record),
                    resolved_path: node.pattern.stringify(&params)?,
                },
            );
            cursor = node.parent;
        }

        let mut meta = RouteMeta::new();
        for entry in &matched {
            meta.extend(entry.record.meta.clone());
        }

        Ok(MatchedLocation {
            name,
            path,
            params,
            matched,
            meta,
        })
    }
}
