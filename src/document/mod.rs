//! Document model that owns the features and drives recomputes.

use std::collections::HashMap;

use crate::compose::{self, ComposeError, Placement};
use crate::feature::{StageContext, StageError, StageFeature, StageKind, TransformStage};
use crate::geom::{GeomMesh, MeshError, PrimitiveError, Transform};

mod properties;
mod shape;

pub use properties::{MultiTransform, ObjectKind, Primitive, PropertyError};
pub use shape::pattern_shape;

#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("object `{0}` already exists")]
    DuplicateName(String),
    #[error("unknown object `{0}`")]
    UnknownObject(String),
    #[error("`{name}` is a {found}, not a MultiTransform")]
    NotAMultiTransform { name: String, found: String },
    #[error("original `{name}` is a {found}, not a solid")]
    NotAShape { name: String, found: String },
    #[error("original `{name}` is invalid: {reason}")]
    InvalidOriginal { name: String, reason: String },
    #[error("cyclic transformation reference through `{0}`")]
    Cycle(String),
    #[error("property of `{object}`: {source}")]
    Property {
        object: String,
        #[source]
        source: PropertyError,
    },
    #[error(transparent)]
    Compose(#[from] ComposeError),
    #[error("shape generation failed: {0}")]
    Mesh(#[from] MeshError),
}

/// A named object in the document.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentObject {
    pub name: String,
    pub kind: ObjectKind,
}

/// Output of recomputing one MultiTransform.
#[derive(Debug, Clone, PartialEq)]
pub struct RecomputeResult {
    pub placements: Vec<Placement>,
    pub shape: GeomMesh,
}

/// Ordered collection of objects with change tracking.
///
/// Every edit bumps the document revision and stamps the edited object with
/// it. A MultiTransform remembers the revision of its last successful
/// recompute and must execute again once any of its inputs carries a newer
/// stamp.
#[derive(Debug, Clone, Default)]
pub struct Document {
    objects: Vec<DocumentObject>,
    index: HashMap<String, usize>,
    revision: u64,
    changed_at: HashMap<String, u64>,
    computed_at: HashMap<String, u64>,
}

/// A stage resolved against the document: either a built-in feature or a
/// nested MultiTransform chain.
enum ResolvedStage<'d> {
    Feature(&'d StageFeature),
    Chain(Vec<ResolvedStage<'d>>),
}

impl TransformStage for ResolvedStage<'_> {
    fn kind(&self) -> StageKind {
        match self {
            Self::Feature(feature) => feature.kind(),
            Self::Chain(_) => StageKind::General,
        }
    }

    fn transformations(&self, ctx: &StageContext<'_>) -> Result<Vec<Transform>, StageError> {
        match self {
            Self::Feature(feature) => feature.transformations(ctx),
            Self::Chain(stages) => {
                let stages = as_dyn(stages);
                let placements = compose::compose_with_context(&stages, ctx)
                    .map_err(|err| StageError::Nested(Box::new(err)))?;
                Ok(placements.into_iter().map(|p| p.transform).collect())
            }
        }
    }
}

fn as_dyn<'a>(stages: &'a [ResolvedStage<'_>]) -> Vec<&'a dyn TransformStage> {
    stages
        .iter()
        .map(|stage| stage as &dyn TransformStage)
        .collect()
}

impl Document {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an object. New MultiTransforms start out needing a recompute.
    pub fn add_object(&mut self, name: impl Into<String>, kind: ObjectKind) -> Result<(), DocumentError> {
        let name = name.into();
        if self.index.contains_key(&name) {
            return Err(DocumentError::DuplicateName(name));
        }
        log::debug!("adding `{name}` ({})", kind.type_name());
        self.index.insert(name.clone(), self.objects.len());
        self.mark_changed(&name);
        self.objects.push(DocumentObject { name, kind });
        Ok(())
    }

    #[must_use]
    pub fn objects(&self) -> &[DocumentObject] {
        &self.objects
    }

    #[must_use]
    pub fn object(&self, name: &str) -> Option<&DocumentObject> {
        self.index.get(name).map(|&i| &self.objects[i])
    }

    fn lookup(&self, name: &str) -> Result<&DocumentObject, DocumentError> {
        self.object(name)
            .ok_or_else(|| DocumentError::UnknownObject(name.to_owned()))
    }

    /// Names of all MultiTransform features, in document order.
    #[must_use]
    pub fn multi_transforms(&self) -> Vec<&str> {
        self.objects
            .iter()
            .filter(|object| matches!(object.kind, ObjectKind::MultiTransform(_)))
            .map(|object| object.name.as_str())
            .collect()
    }

    /// Change one property and stamp the object with a new revision.
    pub fn set_property(&mut self, object: &str, property: &str, value: &str) -> Result<(), DocumentError> {
        let &i = self
            .index
            .get(object)
            .ok_or_else(|| DocumentError::UnknownObject(object.to_owned()))?;
        self.objects[i]
            .kind
            .set_property(property, value)
            .map_err(|source| DocumentError::Property {
                object: object.to_owned(),
                source,
            })?;
        self.mark_changed(object);
        Ok(())
    }

    fn mark_changed(&mut self, name: &str) {
        self.revision += 1;
        self.changed_at.insert(name.to_owned(), self.revision);
    }

    fn changed_after(&self, name: &str, revision: u64) -> bool {
        self.changed_at.get(name).is_some_and(|&at| at > revision)
    }

    /// Whether a recompute of `name` would give a different result: it was
    /// never computed, or the feature, one of its originals, or one of its
    /// (nested) stages changed since its last successful recompute.
    pub fn must_execute(&self, name: &str) -> Result<bool, DocumentError> {
        let feature = self.multi_transform(name)?;
        let Some(&seen) = self.computed_at.get(name) else {
            return Ok(true);
        };
        if self.changed_after(name, seen) || feature.originals.iter().any(|o| self.changed_after(o, seen)) {
            return Ok(true);
        }
        let mut visiting = Vec::new();
        self.stages_changed(name, seen, &mut visiting)
    }

    fn stages_changed(&self, name: &str, seen: u64, visiting: &mut Vec<String>) -> Result<bool, DocumentError> {
        if visiting.iter().any(|v| v == name) {
            return Err(DocumentError::Cycle(name.to_owned()));
        }
        visiting.push(name.to_owned());
        let feature = self.multi_transform(name)?;
        for stage in &feature.transformations {
            if self.changed_after(stage, seen) {
                return Ok(true);
            }
            if let Some(ObjectKind::MultiTransform(_)) = self.object(stage).map(|o| &o.kind) {
                if self.stages_changed(stage, seen, visiting)? {
                    return Ok(true);
                }
            }
        }
        visiting.pop();
        Ok(false)
    }

    /// Recompute one MultiTransform: compose its stages and pattern its
    /// originals. Only a successful recompute marks the feature up to date;
    /// other features sharing its inputs are unaffected.
    pub fn recompute(&mut self, name: &str) -> Result<RecomputeResult, DocumentError> {
        let result = {
            let feature = self.multi_transform(name)?;
            let originals = self.original_meshes(&feature.originals)?;

            let mut visiting = Vec::new();
            let stages = self.resolve_stages(name, &mut visiting)?;

            log::debug!(
                "recomputing `{name}`: {} originals, {} stages",
                originals.len(),
                stages.len()
            );
            let placements = compose::compose(&as_dyn(&stages), &originals)?;
            let shape = pattern_shape(&originals, &placements)?;
            RecomputeResult { placements, shape }
        };

        self.computed_at.insert(name.to_owned(), self.revision);
        Ok(result)
    }

    /// Recompute every MultiTransform in document order.
    pub fn recompute_all(&mut self) -> Result<Vec<(String, RecomputeResult)>, DocumentError> {
        let names: Vec<String> = self.multi_transforms().into_iter().map(str::to_owned).collect();
        let mut results = Vec::with_capacity(names.len());
        for name in names {
            let result = self.recompute(&name)?;
            results.push((name, result));
        }
        Ok(results)
    }

    fn multi_transform(&self, name: &str) -> Result<&MultiTransform, DocumentError> {
        let object = self.lookup(name)?;
        match &object.kind {
            ObjectKind::MultiTransform(feature) => Ok(feature),
            other => Err(DocumentError::NotAMultiTransform {
                name: name.to_owned(),
                found: other.type_name().to_owned(),
            }),
        }
    }

    fn original_meshes(&self, names: &[String]) -> Result<Vec<GeomMesh>, DocumentError> {
        names
            .iter()
            .map(|name| {
                let object = self.lookup(name)?;
                let mesh = match &object.kind {
                    ObjectKind::Primitive(primitive) => primitive
                        .to_mesh()
                        .map_err(|err: PrimitiveError| invalid_original(name, err.to_string()))?,
                    ObjectKind::Mesh(mesh) => {
                        mesh.validate().map_err(|reason| invalid_original(name, reason))?;
                        mesh.clone()
                    }
                    other => {
                        return Err(DocumentError::NotAShape {
                            name: name.clone(),
                            found: other.type_name().to_owned(),
                        });
                    }
                };
                Ok(mesh)
            })
            .collect()
    }

    /// Resolve the stage list of `name`. Every entry must be a
    /// transformation feature; this is checked before anything is combined.
    fn resolve_stages(
        &self,
        name: &str,
        visiting: &mut Vec<String>,
    ) -> Result<Vec<ResolvedStage<'_>>, DocumentError> {
        if visiting.iter().any(|v| v == name) {
            return Err(DocumentError::Cycle(name.to_owned()));
        }
        visiting.push(name.to_owned());

        let feature = self.multi_transform(name)?;
        let mut stages = Vec::with_capacity(feature.transformations.len());
        for stage_name in &feature.transformations {
            let object = self.lookup(stage_name)?;
            let stage = match &object.kind {
                ObjectKind::Stage(stage) => ResolvedStage::Feature(stage),
                ObjectKind::MultiTransform(_) => {
                    ResolvedStage::Chain(self.resolve_stages(stage_name, visiting)?)
                }
                other => {
                    return Err(ComposeError::Structural {
                        name: stage_name.clone(),
                        found: other.type_name().to_owned(),
                    }
                    .into());
                }
            };
            stages.push(stage);
        }

        visiting.pop();
        Ok(stages)
    }
}

fn invalid_original(name: &str, reason: String) -> DocumentError {
    DocumentError::InvalidOriginal {
        name: name.to_owned(),
        reason,
    }
}
