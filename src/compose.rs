//! Combination of transformation stages into one flat list of placements.
//!
//! Stages are combined left to right. A general stage multiplies the
//! previous result (every new transformation applied to every previous
//! placement, new-major / old-minor). A uniform-scale stage instead maps its
//! factors onto consecutive slices of the previous result:
//!
//! ```text
//! multiplicative                         diagonal
//! a1 a2   mul  b1 b2 b3                  a1 a2 a3 a4 a5 a6   diag  b1 b2
//!   = b1a1 b1a2 b2a1 b2a2 b3a1 b3a2        = b1a1 b1a2 b1a3 b2a4 b2a5 b2a6
//! ```

use serde::Serialize;

use crate::feature::{StageContext, StageError, StageKind, TransformStage};
use crate::geom::{GeomMesh, Point3, Tolerance, Transform};

/// One resulting transformation together with its pivot.
///
/// The pivot is the image of the originals' reference point; scale stages
/// later in the chain scale around it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub transform: Transform,
    pub pivot: Point3,
}

impl Placement {
    #[must_use]
    pub fn new(transform: Transform, pivot: Point3) -> Self {
        Self { transform, pivot }
    }
}

/// Serialisable view of a [`Placement`] (row-major matrix).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlacementExport {
    pub matrix: [[f64; 4]; 4],
    pub pivot: [f64; 3],
}

impl From<&Placement> for PlacementExport {
    fn from(placement: &Placement) -> Self {
        Self {
            matrix: *placement.transform.as_matrix(),
            pivot: placement.pivot.to_array(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ComposeError {
    /// A list entry is not a transformation-generating feature.
    #[error("transformation features must be transformation stages: `{name}` is {found}")]
    Structural { name: String, found: String },
    /// A scale stage does not fit the previous result.
    #[error(
        "number of occurrences must be a divisor of previous number of occurrences \
         (stage {stage} has {count}, previous result has {previous})"
    )]
    Cardinality {
        stage: usize,
        count: usize,
        previous: usize,
    },
    #[error("stage {stage}: {source}")]
    Stage {
        stage: usize,
        #[source]
        source: StageError,
    },
}

/// Combine `stages` into a flat placement list for `originals`.
///
/// The reference point is the centre of mass of the first original, or the
/// origin when there are none. An empty stage list yields an empty result.
pub fn compose(
    stages: &[&dyn TransformStage],
    originals: &[GeomMesh],
) -> Result<Vec<Placement>, ComposeError> {
    let ctx = StageContext::new(originals);
    compose_with_context(stages, &ctx)
}

/// [`compose`] over a prepared context, so nested chains share its
/// reference point.
pub fn compose_with_context(
    stages: &[&dyn TransformStage],
    ctx: &StageContext<'_>,
) -> Result<Vec<Placement>, ComposeError> {
    let reference = ctx.reference_point();
    let mut result: Vec<Placement> = Vec::new();

    for (index, stage) in stages.iter().enumerate() {
        let new_transforms = stage
            .transformations(ctx)
            .map_err(|source| ComposeError::Stage {
                stage: index,
                source,
            })?;
        log::debug!(
            "stage {index} ({:?}) produced {} transformations",
            stage.kind(),
            new_transforms.len()
        );

        result = if result.is_empty() {
            new_transforms
                .into_iter()
                .map(|t| Placement::new(t, t.apply_point(reference)))
                .collect()
        } else {
            match stage.kind() {
                StageKind::UniformScale => combine_diagonal(index, &result, &new_transforms)?,
                StageKind::General => combine_multiplicative(&result, &new_transforms),
            }
        };
    }

    log::debug!("composed {} stages into {} placements", stages.len(), result.len());
    Ok(result)
}

/// Every new transformation applied to every previous placement; the new
/// transformation is the outer loop.
fn combine_multiplicative(previous: &[Placement], new_transforms: &[Transform]) -> Vec<Placement> {
    let mut result = Vec::with_capacity(previous.len() * new_transforms.len());
    for nt in new_transforms {
        for old in previous {
            result.push(Placement::new(
                *nt * old.transform,
                nt.apply_point(old.pivot),
            ));
        }
    }
    result
}

/// The i-th new transformation applies to the i-th slice of the previous
/// placements. Non-degenerate scales are rebuilt around each placement's own
/// pivot, which they leave in place.
fn combine_diagonal(
    stage: usize,
    previous: &[Placement],
    new_transforms: &[Transform],
) -> Result<Vec<Placement>, ComposeError> {
    if new_transforms.is_empty() || previous.len() % new_transforms.len() != 0 {
        return Err(ComposeError::Cardinality {
            stage,
            count: new_transforms.len(),
            previous: previous.len(),
        });
    }

    let slice_length = previous.len() / new_transforms.len();
    let mut result = Vec::with_capacity(previous.len());

    for (nt, slice) in new_transforms.iter().zip(previous.chunks_exact(slice_length)) {
        let factor = nt.scale_factor();
        for old in slice {
            if factor > Tolerance::CONFUSION.eps {
                let scale = Transform::scale_about(old.pivot, factor);
                result.push(Placement::new(scale * old.transform, old.pivot));
            } else {
                log::warn!("stage {stage}: degenerate scale factor {factor}, combining directly");
                result.push(Placement::new(
                    *nt * old.transform,
                    nt.apply_point(old.pivot),
                ));
            }
        }
    }

    Ok(result)
}
