//! # Domain Taxonomy
//!
//! The catalogue of named domain kinds layered on top of the kernel.
//!
//! A kind is a data record: a name, an optional parent kind, an optional
//! payload shape (for value holder kinds) and zero or more construction-time
//! wiring rules. Instantiating a kind runs the wiring of its whole lineage,
//! root first, the way a chain of constructors would.
//!
//! | Rule | Effect |
//! |------|--------|
//! | `LinkParts` | link the new entity to the blueprint's parts, in order |
//! | `AttachHolder` | create a text holder from the blueprint's text and link it |
//!
//! The kernel itself never sees any of these names.

use crate::engine::incident;
use crate::graph::GraphStore;
use crate::{EntityId, GraphError, Kind, Payload, PayloadShape};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

// =============================================================================
// RELATION KINDS
// =============================================================================

/// Part-whole relation: a quantity has its unit and magnitude as parts.
pub const HAS_PART: &str = "hasPart";

/// Property relation: a model has its expression as a property.
pub const HAS_PROPERTY: &str = "hasProperty";

// =============================================================================
// KIND RECORDS
// =============================================================================

/// A construction-time wiring rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum WiringRule {
    /// Link to exactly `arity` caller-supplied entities with `relation`.
    LinkParts { relation: Kind, arity: usize },

    /// Create a `holder` entity from the caller-supplied text and link it with `relation`.
    AttachHolder { relation: Kind, holder: Kind },
}

/// The declaration of one domain kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KindSpec {
    pub name: Kind,
    #[serde(default)]
    pub parent: Option<Kind>,
    /// Payload shape, for value holder kinds. Inherited by descendants.
    #[serde(default)]
    pub holds: Option<PayloadShape>,
    #[serde(default)]
    pub wiring: Vec<WiringRule>,
}

impl KindSpec {
    /// Declare a kind with a parent and no behavior.
    #[must_use]
    pub fn new(name: impl Into<Kind>, parent: Option<Kind>) -> Self {
        Self {
            name: name.into(),
            parent,
            holds: None,
            wiring: Vec::new(),
        }
    }

    /// Mark the kind as a value holder of the given shape.
    #[must_use]
    pub fn holding(mut self, shape: PayloadShape) -> Self {
        self.holds = Some(shape);
        self
    }

    /// Append a wiring rule.
    #[must_use]
    pub fn wired(mut self, rule: WiringRule) -> Self {
        self.wiring.push(rule);
        self
    }
}

// =============================================================================
// BLUEPRINT
// =============================================================================

/// Constructor arguments for `Taxonomy::instantiate`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Blueprint {
    payload: Option<Payload>,
    parts: Vec<EntityId>,
    text: Option<String>,
}

impl Blueprint {
    /// An empty blueprint (plain kinds).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A value holder blueprint.
    #[must_use]
    pub fn holder(payload: Payload) -> Self {
        Self {
            payload: Some(payload),
            ..Self::default()
        }
    }

    /// A quantity blueprint: parts are linked unit first, then value.
    #[must_use]
    pub fn quantity(value: EntityId, unit: EntityId) -> Self {
        Self::new().parts(vec![unit, value])
    }

    /// A model blueprint carrying its expression text.
    #[must_use]
    pub fn expression(text: impl Into<String>) -> Self {
        Self::new().text(text)
    }

    #[must_use]
    pub fn payload(mut self, payload: Payload) -> Self {
        self.payload = Some(payload);
        self
    }

    #[must_use]
    pub fn parts(mut self, parts: Vec<EntityId>) -> Self {
        self.parts = parts;
        self
    }

    #[must_use]
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }
}

// =============================================================================
// STANDARD CATALOGUE
// =============================================================================

#[derive(Clone, Copy)]
enum Wire {
    Plain,
    UnitAndValue,
    LatexProperty,
}

/// (name, parent, payload shape, wiring). Parents precede children.
const STANDARD_KINDS: &[(&str, Option<&str>, Option<PayloadShape>, Wire)] = &[
    ("Thing", None, None, Wire::Plain),
    ("Item", Some("Thing"), None, Wire::Plain),
    ("Collection", Some("Thing"), None, Wire::Plain),
    ("Physical", Some("Item"), None, Wire::Plain),
    ("Quantum", Some("Item"), None, Wire::Plain),
    ("Void", Some("Item"), None, Wire::Plain),
    ("Elementary", Some("Physical"), None, Wire::Plain),
    ("Perspective", Some("Physical"), None, Wire::Plain),
    ("Symbolic", Some("Perspective"), None, Wire::Plain),
    ("String", Some("Symbolic"), Some(PayloadShape::Text), Wire::Plain),
    ("Vector", Some("Symbolic"), Some(PayloadShape::Reals), Wire::Plain),
    ("IUPAC Name", Some("String"), None, Wire::Plain),
    ("LatexExpression", Some("String"), None, Wire::Plain),
    ("Unit", Some("String"), None, Wire::Plain),
    ("Quantity", Some("Symbolic"), None, Wire::Plain),
    ("Scalar", Some("Symbolic"), Some(PayloadShape::Real), Wire::Plain),
    ("ScalarQuantity", Some("Quantity"), None, Wire::UnitAndValue),
    ("Pressure", Some("ScalarQuantity"), None, Wire::Plain),
    ("PressureTimeDerivative", Some("ScalarQuantity"), None, Wire::Plain),
    ("Temperature", Some("ScalarQuantity"), None, Wire::Plain),
    ("TemperatureTimeDerivative", Some("ScalarQuantity"), None, Wire::Plain),
    ("MolarFraction", Some("ScalarQuantity"), None, Wire::Plain),
    ("Mass", Some("ScalarQuantity"), None, Wire::Plain),
    ("BulkDensityLiquid", Some("ScalarQuantity"), None, Wire::Plain),
    ("BulkDensitySolid", Some("ScalarQuantity"), None, Wire::Plain),
    ("MeltingPoint", Some("ScalarQuantity"), None, Wire::Plain),
    ("Viscosity", Some("ScalarQuantity"), None, Wire::Plain),
    ("SurfaceTension", Some("ScalarQuantity"), None, Wire::Plain),
    ("SaturationPressure", Some("ScalarQuantity"), None, Wire::Plain),
    ("Time", Some("ScalarQuantity"), None, Wire::Plain),
    ("VectorQuantity", Some("Quantity"), None, Wire::UnitAndValue),
    ("KnowledgeGenerator", Some("Perspective"), None, Wire::Plain),
    ("Model", Some("Perspective"), None, Wire::Plain),
    // Also a KnowledgeGenerator; only the primary parent is kept.
    ("SoftwareModel", Some("Model"), None, Wire::Plain),
    ("MathematicalModel", Some("Model"), None, Wire::LatexProperty),
    ("PhysicsBasedModel", Some("MathematicalModel"), None, Wire::LatexProperty),
    ("ContinuumModel", Some("PhysicsBasedModel"), None, Wire::LatexProperty),
    ("MesoscopicModel", Some("PhysicsBasedModel"), None, Wire::LatexProperty),
    ("Reductionistic", Some("Perspective"), None, Wire::Plain),
    ("Existent", Some("Reductionistic"), None, Wire::Plain),
    ("State", Some("Existent"), None, Wire::Plain),
    ("Matter", Some("Perspective"), None, Wire::Plain),
    ("Continuum", Some("Matter"), None, Wire::Plain),
    ("Fluid", Some("Continuum"), None, Wire::Plain),
    ("Gas", Some("Fluid"), None, Wire::Plain),
    ("GasMixture", Some("Gas"), None, Wire::Plain),
    ("MolecularEntity", Some("Matter"), None, Wire::Plain),
    ("Atom", Some("MolecularEntity"), None, Wire::Plain),
    ("PolyatomicEntity", Some("MolecularEntity"), None, Wire::Plain),
    ("HeteronuclearMolecule", Some("PolyatomicEntity"), None, Wire::Plain),
    ("HomonuclearMolecule", Some("PolyatomicEntity"), None, Wire::Plain),
];

impl Wire {
    fn rules(self) -> Vec<WiringRule> {
        match self {
            Wire::Plain => Vec::new(),
            Wire::UnitAndValue => vec![WiringRule::LinkParts {
                relation: Kind::new(HAS_PART),
                arity: 2,
            }],
            Wire::LatexProperty => vec![WiringRule::AttachHolder {
                relation: Kind::new(HAS_PROPERTY),
                holder: Kind::new("LatexExpression"),
            }],
        }
    }
}

// =============================================================================
// TAXONOMY REGISTRY
// =============================================================================

/// Registry of domain kinds keyed by name.
///
/// Parents must be registered before their children, so the parent chain is
/// always finite and acyclic.
#[derive(Debug, Clone, Default)]
pub struct Taxonomy {
    kinds: BTreeMap<Kind, KindSpec>,
}

impl Taxonomy {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in physical/chemical catalogue.
    pub fn standard() -> Result<Self, GraphError> {
        Self::from_specs(STANDARD_KINDS.iter().map(|&(name, parent, holds, wire)| {
            KindSpec {
                name: Kind::new(name),
                parent: parent.map(Kind::new),
                holds,
                wiring: wire.rules(),
            }
        }))
    }

    /// Build a registry from specs, in order.
    pub fn from_specs(specs: impl IntoIterator<Item = KindSpec>) -> Result<Self, GraphError> {
        let mut taxonomy = Self::new();
        taxonomy.extend(specs)?;
        Ok(taxonomy)
    }

    /// Register more specs, in order. Stops at the first rejected spec.
    pub fn extend(&mut self, specs: impl IntoIterator<Item = KindSpec>) -> Result<(), GraphError> {
        for spec in specs {
            self.register(spec)?;
        }
        Ok(())
    }

    /// Register one kind.
    pub fn register(&mut self, spec: KindSpec) -> Result<(), GraphError> {
        if !spec.name.is_valid() {
            return Err(GraphError::InvalidKind(spec.name.as_str().to_string()));
        }
        if self.kinds.contains_key(&spec.name) {
            return Err(GraphError::KindAlreadyRegistered(spec.name.as_str().to_string()));
        }
        if let Some(parent) = &spec.parent
            && !self.kinds.contains_key(parent)
        {
            return Err(GraphError::UnknownKind(parent.as_str().to_string()));
        }
        // A lineage links its parts once, so it carries at most one LinkParts rule.
        let mut link_arity = match &spec.parent {
            Some(parent) => self.link_arity(parent)?,
            None => None,
        };
        for rule in &spec.wiring {
            match rule {
                WiringRule::LinkParts { relation, arity } => {
                    if !relation.is_valid() {
                        return Err(GraphError::InvalidKind(relation.as_str().to_string()));
                    }
                    if let Some(existing) = link_arity {
                        return Err(GraphError::WiringArity {
                            kind: spec.name.as_str().to_string(),
                            expected: existing,
                            found: *arity,
                        });
                    }
                    link_arity = Some(*arity);
                }
                WiringRule::AttachHolder { relation, holder } => {
                    if !relation.is_valid() {
                        return Err(GraphError::InvalidKind(relation.as_str().to_string()));
                    }
                    let shape = self.holder_shape(holder)?;
                    if shape != Some(PayloadShape::Text) {
                        return Err(GraphError::PayloadMismatch {
                            kind: holder.as_str().to_string(),
                            expected: PayloadShape::Text.name().to_string(),
                            found: shape_name(shape).to_string(),
                        });
                    }
                }
            }
        }
        self.kinds.insert(spec.name.clone(), spec);
        Ok(())
    }

    /// Lookup a kind.
    #[must_use]
    pub fn get(&self, kind: &Kind) -> Option<&KindSpec> {
        self.kinds.get(kind)
    }

    #[must_use]
    pub fn contains(&self, kind: &Kind) -> bool {
        self.kinds.contains_key(kind)
    }

    /// All kinds in name order.
    pub fn kinds(&self) -> impl Iterator<Item = &KindSpec> {
        self.kinds.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }

    /// The ancestry of `kind`, root first, ending with `kind` itself.
    pub fn lineage(&self, kind: &Kind) -> Result<Vec<&KindSpec>, GraphError> {
        let mut chain = Vec::new();
        let mut cursor = Some(kind);
        while let Some(name) = cursor {
            let spec = self
                .kinds
                .get(name)
                .ok_or_else(|| GraphError::UnknownKind(name.as_str().to_string()))?;
            chain.push(spec);
            cursor = spec.parent.as_ref();
        }
        chain.reverse();
        Ok(chain)
    }

    /// Whether `kind` equals `ancestor` or descends from it.
    ///
    /// Unknown kinds are related to nothing but themselves.
    #[must_use]
    pub fn is_a(&self, kind: &Kind, ancestor: &Kind) -> bool {
        let mut cursor = Some(kind);
        while let Some(name) = cursor {
            if name == ancestor {
                return true;
            }
            cursor = self.kinds.get(name).and_then(|s| s.parent.as_ref());
        }
        false
    }

    /// Nearest declared payload shape along the lineage of `kind`.
    pub fn holder_shape(&self, kind: &Kind) -> Result<Option<PayloadShape>, GraphError> {
        Ok(self.lineage(kind)?.iter().rev().find_map(|spec| spec.holds))
    }

    /// Arity of the LinkParts rule along the lineage of `kind`, if any.
    pub fn link_arity(&self, kind: &Kind) -> Result<Option<usize>, GraphError> {
        Ok(self
            .lineage(kind)?
            .iter()
            .flat_map(|spec| spec.wiring.iter())
            .find_map(|rule| match rule {
                WiringRule::LinkParts { arity, .. } => Some(*arity),
                WiringRule::AttachHolder { .. } => None,
            }))
    }

    /// Construct an entity of `kind` and run its lineage wiring.
    ///
    /// Arguments are checked against every rule before the entity is
    /// inserted, so a rejected blueprint leaves the graph untouched.
    pub fn instantiate<G: GraphStore>(
        &self,
        graph: &mut G,
        kind: &Kind,
        blueprint: Blueprint,
    ) -> Result<EntityId, GraphError> {
        let lineage = self.lineage(kind)?;
        let shape = lineage.iter().rev().find_map(|spec| spec.holds);
        self.check_blueprint(graph, kind, &lineage, shape, &blueprint)?;

        let Blueprint {
            payload,
            parts,
            text,
        } = blueprint;

        // The handle is valid before any wiring runs.
        let entity = match payload {
            Some(payload) => graph.insert_holder(kind.clone(), payload)?,
            None => graph.insert_entity(kind.clone())?,
        };

        for spec in &lineage {
            for rule in &spec.wiring {
                match rule {
                    WiringRule::LinkParts { relation, .. } => {
                        graph.create_relations_to(relation, entity, &parts)?;
                    }
                    WiringRule::AttachHolder { relation, holder } => {
                        let expression = Payload::Text(text.clone().unwrap_or_default());
                        let attached = graph.insert_holder(holder.clone(), expression)?;
                        graph.create_relation_to(relation, entity, attached)?;
                    }
                }
            }
        }

        debug!(entity = %entity, kind = %kind, "kind instantiated");
        Ok(entity)
    }

    /// Related entities whose kind is `kind` or one of its descendants.
    ///
    /// This is the taxonomy-aware counterpart of
    /// `QueryEngine::related_objects`, which matches exact kinds only.
    pub fn related_objects_in<G: GraphStore>(
        &self,
        graph: &G,
        entity: EntityId,
        kind: &Kind,
    ) -> Result<Vec<EntityId>, GraphError> {
        Ok(incident(graph, entity)?
            .filter_map(|(_, other)| graph.entity(other))
            .filter(|e| self.is_a(e.kind(), kind))
            .map(|e| e.id())
            .collect())
    }

    fn check_blueprint<G: GraphStore>(
        &self,
        graph: &G,
        kind: &Kind,
        lineage: &[&KindSpec],
        shape: Option<PayloadShape>,
        blueprint: &Blueprint,
    ) -> Result<(), GraphError> {
        let found = blueprint.payload.as_ref().map(Payload::shape);
        if found != shape {
            return Err(GraphError::PayloadMismatch {
                kind: kind.as_str().to_string(),
                expected: shape_name(shape).to_string(),
                found: shape_name(found).to_string(),
            });
        }

        let rules = || lineage.iter().flat_map(|spec| spec.wiring.iter());

        let arity = rules().find_map(|rule| match rule {
            WiringRule::LinkParts { arity, .. } => Some(*arity),
            WiringRule::AttachHolder { .. } => None,
        });
        let expected_parts = arity.unwrap_or(0);
        if blueprint.parts.len() != expected_parts {
            return Err(GraphError::WiringArity {
                kind: kind.as_str().to_string(),
                expected: expected_parts,
                found: blueprint.parts.len(),
            });
        }
        if let Some(missing) = blueprint
            .parts
            .iter()
            .find(|part| graph.entity(**part).is_none())
        {
            return Err(GraphError::EntityNotFound(*missing));
        }

        let wants_text = rules().any(|rule| matches!(rule, WiringRule::AttachHolder { .. }));
        if wants_text != blueprint.text.is_some() {
            return Err(GraphError::WiringArity {
                kind: kind.as_str().to_string(),
                expected: usize::from(wants_text),
                found: usize::from(blueprint.text.is_some()),
            });
        }
        Ok(())
    }
}

fn shape_name(shape: Option<PayloadShape>) -> &'static str {
    shape.map_or("none", |s| s.name())
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Graph, QueryEngine};

    fn standard() -> Taxonomy {
        Taxonomy::standard().expect("standard taxonomy")
    }

    #[test]
    fn standard_catalogue_is_complete() {
        let taxonomy = standard();
        assert_eq!(taxonomy.len(), STANDARD_KINDS.len());
        assert!(taxonomy.contains(&Kind::new("IUPAC Name")));
        assert!(taxonomy.contains(&Kind::new("HomonuclearMolecule")));
    }

    #[test]
    fn lineage_runs_root_first() {
        let taxonomy = standard();
        let names: Vec<_> = taxonomy
            .lineage(&Kind::new("Pressure"))
            .expect("lineage")
            .iter()
            .map(|s| s.name.as_str().to_string())
            .collect();
        assert_eq!(
            names,
            vec![
                "Thing",
                "Item",
                "Physical",
                "Perspective",
                "Symbolic",
                "Quantity",
                "ScalarQuantity",
                "Pressure"
            ]
        );
    }

    #[test]
    fn is_a_follows_parents() {
        let taxonomy = standard();
        assert!(taxonomy.is_a(&Kind::new("GasMixture"), &Kind::new("Fluid")));
        assert!(taxonomy.is_a(&Kind::new("Gas"), &Kind::new("Gas")));
        assert!(!taxonomy.is_a(&Kind::new("Fluid"), &Kind::new("Gas")));
        assert!(!taxonomy.is_a(&Kind::new("Nope"), &Kind::new("Thing")));
    }

    #[test]
    fn holder_shape_is_inherited() {
        let taxonomy = standard();
        assert_eq!(
            taxonomy.holder_shape(&Kind::new("Unit")).expect("shape"),
            Some(PayloadShape::Text)
        );
        assert_eq!(
            taxonomy.holder_shape(&Kind::new("Gas")).expect("shape"),
            None
        );
    }

    #[test]
    fn software_model_keeps_primary_parent_only() {
        let taxonomy = standard();
        let software = Kind::new("SoftwareModel");
        assert!(taxonomy.is_a(&software, &Kind::new("Model")));
        assert!(taxonomy.is_a(&software, &Kind::new("Perspective")));
        assert!(!taxonomy.is_a(&software, &Kind::new("KnowledgeGenerator")));
    }

    #[test]
    fn register_rejects_duplicates_and_orphans() {
        let mut taxonomy = standard();
        let dup = taxonomy.register(KindSpec::new("Gas", Some(Kind::new("Fluid"))));
        assert!(matches!(dup, Err(GraphError::KindAlreadyRegistered(_))));

        let orphan = taxonomy.register(KindSpec::new("Plasma", Some(Kind::new("Ionized"))));
        assert!(matches!(orphan, Err(GraphError::UnknownKind(_))));
    }

    #[test]
    fn register_rejects_non_text_attach_holder() {
        let mut taxonomy = standard();
        let spec = KindSpec::new("NumericModel", Some(Kind::new("Model"))).wired(
            WiringRule::AttachHolder {
                relation: Kind::new(HAS_PROPERTY),
                holder: Kind::new("Scalar"),
            },
        );
        assert!(matches!(
            taxonomy.register(spec),
            Err(GraphError::PayloadMismatch { .. })
        ));
    }

    #[test]
    fn register_rejects_second_link_parts_in_lineage() {
        let mut taxonomy = standard();
        let rate = KindSpec::new("Rate", Some(Kind::new("ScalarQuantity"))).wired(
            WiringRule::LinkParts {
                relation: Kind::new(HAS_PART),
                arity: 3,
            },
        );
        assert!(matches!(
            taxonomy.register(rate),
            Err(GraphError::WiringArity {
                expected: 2,
                found: 3,
                ..
            })
        ));
        assert!(!taxonomy.contains(&Kind::new("Rate")));

        let twice = KindSpec::new("Pair", Some(Kind::new("Quantity")))
            .wired(WiringRule::LinkParts {
                relation: Kind::new(HAS_PART),
                arity: 1,
            })
            .wired(WiringRule::LinkParts {
                relation: Kind::new(HAS_PART),
                arity: 1,
            });
        assert!(matches!(
            taxonomy.register(twice),
            Err(GraphError::WiringArity { .. })
        ));

        let triple = KindSpec::new("Triple", Some(Kind::new("Quantity"))).wired(
            WiringRule::LinkParts {
                relation: Kind::new(HAS_PART),
                arity: 3,
            },
        );
        taxonomy.register(triple).expect("register");
        assert_eq!(
            taxonomy.link_arity(&Kind::new("Triple")).expect("arity"),
            Some(3)
        );
        assert_eq!(
            taxonomy.link_arity(&Kind::new("Pressure")).expect("arity"),
            Some(2)
        );
    }

    #[test]
    fn inherited_link_parts_links_each_part_once() {
        let mut taxonomy = standard();
        taxonomy
            .register(KindSpec::new("Voltage", Some(Kind::new("ScalarQuantity"))))
            .expect("register");
        let mut graph = Graph::new();
        let value = graph
            .insert_holder(Kind::new("Scalar"), Payload::Real(5.0))
            .expect("value");
        let unit = graph
            .insert_holder(Kind::new("Unit"), Payload::Text("V".into()))
            .expect("unit");

        let voltage = taxonomy
            .instantiate(&mut graph, &Kind::new("Voltage"), Blueprint::quantity(value, unit))
            .expect("voltage");

        assert_eq!(
            QueryEngine::relations(&graph, voltage, &Kind::new(HAS_PART)).expect("parts"),
            vec![unit, value]
        );
    }

    #[test]
    fn scalar_quantity_wires_unit_then_value() {
        let taxonomy = standard();
        let mut graph = Graph::new();
        let value = taxonomy
            .instantiate(&mut graph, &Kind::new("Scalar"), Blueprint::holder(Payload::Real(42.0)))
            .expect("scalar");
        let unit = taxonomy
            .instantiate(
                &mut graph,
                &Kind::new("Unit"),
                Blueprint::holder(Payload::Text("Pa".into())),
            )
            .expect("unit");
        let pressure = taxonomy
            .instantiate(
                &mut graph,
                &Kind::new("Pressure"),
                Blueprint::quantity(value, unit),
            )
            .expect("pressure");

        assert_eq!(
            QueryEngine::relations(&graph, pressure, &Kind::new(HAS_PART)).expect("parts"),
            vec![unit, value]
        );
        assert_eq!(
            QueryEngine::related_scalars(&graph, pressure, &Kind::new("Scalar")).expect("scalars"),
            vec![42.0]
        );
    }

    #[test]
    fn model_lineage_attaches_one_expression_per_level() {
        let taxonomy = standard();
        let mut graph = Graph::new();
        let model = taxonomy
            .instantiate(
                &mut graph,
                &Kind::new("ContinuumModel"),
                Blueprint::expression(r"\rho \frac{Du}{Dt} = -\nabla p"),
            )
            .expect("model");

        let props =
            QueryEngine::relations(&graph, model, &Kind::new(HAS_PROPERTY)).expect("props");
        assert_eq!(props.len(), 3);
        let last = QueryEngine::last_relation(&graph, model, &Kind::new(HAS_PROPERTY))
            .expect("last");
        assert_eq!(last, props.last().copied());
        assert_eq!(
            QueryEngine::related_texts(&graph, model, &Kind::new("LatexExpression"))
                .expect("texts")
                .len(),
            3
        );
    }

    #[test]
    fn rejected_blueprint_leaves_graph_untouched() {
        let taxonomy = standard();
        let mut graph = Graph::new();
        let unit = graph
            .insert_holder(Kind::new("Unit"), Payload::Text("K".into()))
            .expect("unit");

        let wrong_arity = taxonomy.instantiate(
            &mut graph,
            &Kind::new("Temperature"),
            Blueprint::new().parts(vec![unit]),
        );
        assert!(matches!(wrong_arity, Err(GraphError::WiringArity { .. })));

        let dangling = taxonomy.instantiate(
            &mut graph,
            &Kind::new("Temperature"),
            Blueprint::quantity(EntityId(77), unit),
        );
        assert!(matches!(dangling, Err(GraphError::EntityNotFound(EntityId(77)))));

        let wrong_payload = taxonomy.instantiate(
            &mut graph,
            &Kind::new("Scalar"),
            Blueprint::holder(Payload::Text("12".into())),
        );
        assert!(matches!(wrong_payload, Err(GraphError::PayloadMismatch { .. })));

        let missing_text =
            taxonomy.instantiate(&mut graph, &Kind::new("MathematicalModel"), Blueprint::new());
        assert!(matches!(missing_text, Err(GraphError::WiringArity { .. })));

        assert_eq!(graph.entity_count(), 1);
        assert_eq!(graph.relation_count(), 0);
    }

    #[test]
    fn unknown_kind_cannot_be_instantiated() {
        let taxonomy = standard();
        let mut graph = Graph::new();
        let result = taxonomy.instantiate(&mut graph, &Kind::new("Phlogiston"), Blueprint::new());
        assert!(matches!(result, Err(GraphError::UnknownKind(_))));
    }

    #[test]
    fn related_objects_in_includes_descendants() {
        let taxonomy = standard();
        let mut graph = Graph::new();
        let mixture = taxonomy
            .instantiate(&mut graph, &Kind::new("GasMixture"), Blueprint::new())
            .expect("mixture");
        let atom = taxonomy
            .instantiate(&mut graph, &Kind::new("Atom"), Blueprint::new())
            .expect("atom");
        let molecule = taxonomy
            .instantiate(&mut graph, &Kind::new("HomonuclearMolecule"), Blueprint::new())
            .expect("molecule");
        graph
            .create_relations_to(&Kind::new(HAS_PART), mixture, &[atom, molecule])
            .expect("link");

        let family = Kind::new("MolecularEntity");
        assert_eq!(
            taxonomy
                .related_objects_in(&graph, mixture, &family)
                .expect("family"),
            vec![atom, molecule]
        );
        assert!(
            QueryEngine::related_objects(&graph, mixture, &family)
                .expect("exact")
                .is_empty()
        );
    }

    #[test]
    fn kind_spec_deserializes_from_json() {
        let json = r#"{
            "name": "Density",
            "parent": "ScalarQuantity",
            "wiring": []
        }"#;
        let spec: KindSpec = serde_json::from_str(json).expect("parse");
        assert_eq!(spec.parent, Some(Kind::new("ScalarQuantity")));
        let mut taxonomy = standard();
        taxonomy.register(spec).expect("register");
        assert!(taxonomy.is_a(&Kind::new("Density"), &Kind::new("Quantity")));
    }
}
