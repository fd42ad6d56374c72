//! The tile generator.
//!
//! Reads features through the repository traits and produces geometry and
//! attribute tiles. Generation is read-only with respect to the feature
//! database; writing results to the cache is the caller's job.

use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info};

use feature_catalog::{
    FeatureClass, FeatureClassCatalog, FeatureClassRepository, FeatureRepository,
    LabelingStyle, LabelingStyleRepository, Presentation, PresentationRepository,
};
use tile_common::{
    bytes_per_coordinate, grid, AttributeTile, Envelope, GeometryAndAttributeTiles, GeometryTile,
    TileAddress, TileAttribute, TileError, TileKind, TileResult,
};

use crate::attrs::presentation_attributes;
use crate::preparer::GeometryTilePreparer;
use crate::sequence::TileSequence;

/// Bundles in flight between the producer task and the consumer.
const SEQUENCE_CAPACITY: usize = 8;

/// Generates tiles from a feature database.
#[derive(Clone)]
pub struct TileGenerator {
    feature_classes: Arc<dyn FeatureClassRepository>,
    features: Arc<dyn FeatureRepository>,
    presentations: Arc<dyn PresentationRepository>,
    labeling_styles: Arc<dyn LabelingStyleRepository>,
    preparer: Arc<dyn GeometryTilePreparer>,
}

/// One feature class scheduled for bulk generation, with the attribute
/// names to materialize alongside each geometry tile.
struct ClassPlan {
    class: FeatureClass,
    attributes: Vec<String>,
}

impl TileGenerator {
    pub fn new(
        feature_classes: Arc<dyn FeatureClassRepository>,
        features: Arc<dyn FeatureRepository>,
        presentations: Arc<dyn PresentationRepository>,
        labeling_styles: Arc<dyn LabelingStyleRepository>,
        preparer: Arc<dyn GeometryTilePreparer>,
    ) -> Self {
        Self {
            feature_classes,
            features,
            presentations,
            labeling_styles,
            preparer,
        }
    }

    /// Create the geometry tile with the given address, along with the
    /// component-attribute tile derived from clipping, if any.
    ///
    /// Clipping can leave shapes topologically invalid; that is accepted
    /// output and consumers must tolerate it.
    pub async fn create_geometry_tile(
        &self,
        address: &TileAddress,
    ) -> TileResult<GeometryAndAttributeTiles> {
        if !address.is_geometry() {
            return Err(TileError::InvalidAddressKind {
                expected: "geometry",
                actual: address.kind.to_string(),
            });
        }
        check_scale(address.scale_level)?;

        let catalog = self.feature_classes.load_feature_classes().await?;
        let class = catalog
            .get_by_name(&address.feature_class)
            .ok_or_else(|| TileError::FeatureClassNotFound(address.feature_class.clone()))?;

        // Fresh address with the catalog's canonical class name and an
        // unresolved hash, whatever the caller handed in.
        let address = TileAddress::new(
            address.scale_level,
            address.row,
            address.col,
            class.name.clone(),
            TileKind::Geometry,
        );

        self.geometry_tile_for_class(&address, class, &catalog).await
    }

    /// Create the attribute tile with the given address.
    pub async fn create_attribute_tile(&self, address: &TileAddress) -> TileResult<AttributeTile> {
        let attribute = match &address.kind {
            TileKind::Attribute(name) => name.clone(),
            // Component attributes only exist as a by-product of geometry
            // generation; they cannot be generated directly.
            other => {
                return Err(TileError::InvalidAddressKind {
                    expected: "attribute",
                    actual: other.to_string(),
                })
            }
        };
        check_scale(address.scale_level)?;

        let catalog = self.feature_classes.load_feature_classes().await?;
        let class = catalog
            .get_by_name(&address.feature_class)
            .ok_or_else(|| TileError::FeatureClassNotFound(address.feature_class.clone()))?;

        if !class.has_attribute(&attribute) {
            return Err(TileError::AttributeNotFound {
                feature_class: class.name.clone(),
                attribute,
            });
        }

        let address = TileAddress::new(
            address.scale_level,
            address.row,
            address.col,
            class.name.clone(),
            TileKind::Attribute(attribute),
        );

        self.attribute_tile_for_class(&address, class, &catalog).await
    }

    /// Generate geometry tiles (plus component attributes) for an extent.
    ///
    /// No presentation context: no per-attribute tiles are produced.
    pub async fn generate_for_extent(
        &self,
        extent: &Envelope,
        class_names: &[String],
        from_level: u8,
        to_level: u8,
    ) -> TileResult<TileSequence> {
        if extent.is_degenerate() {
            return Err(TileError::InvalidExtent(format!(
                "degenerate extent {extent:?}"
            )));
        }

        self.start_sequence(*extent, class_names, from_level, to_level, None)
            .await
    }

    /// Generate geometry and attribute tiles for a project.
    ///
    /// The project feature is resolved by the syscode of its branch
    /// directory attribute; its envelope becomes the extent, and attribute
    /// tiles are derived from the project's presentations.
    pub async fn generate_for_project(
        &self,
        project_syscode: i64,
        class_names: &[String],
        from_level: u8,
        to_level: u8,
    ) -> TileResult<TileSequence> {
        let presentations = self.presentations.load_presentations(project_syscode).await?;
        let project = self
            .features
            .project_by_syscode(project_syscode)
            .await?
            .ok_or(TileError::ProjectNotFound(project_syscode))?;
        let styles = self.labeling_styles.load_labeling_styles().await?;

        self.start_sequence(
            project.envelope,
            class_names,
            from_level,
            to_level,
            Some((presentations, styles)),
        )
        .await
    }

    /// Validate the request, build the per-class plan, and spawn the
    /// producer. Argument errors surface here, before any tile exists.
    async fn start_sequence(
        &self,
        extent: Envelope,
        class_names: &[String],
        from_level: u8,
        to_level: u8,
        presentation_context: Option<(Vec<Presentation>, Vec<LabelingStyle>)>,
    ) -> TileResult<TileSequence> {
        check_scale(from_level)?;
        check_scale(to_level)?;

        let catalog = self.feature_classes.load_feature_classes().await?;
        let plan = build_plan(&catalog, class_names, presentation_context.as_ref())?;

        info!(
            classes = plan.len(),
            from_level,
            to_level,
            "starting tile generation"
        );

        let (tx, rx) = mpsc::channel(SEQUENCE_CAPACITY);
        let generator = self.clone();
        tokio::spawn(async move {
            generator
                .produce(catalog, plan, extent, from_level, to_level, tx)
                .await;
        });

        Ok(TileSequence::new(rx))
    }

    /// Producer task behind a [`TileSequence`].
    ///
    /// Emits bundles row-major then column-major per level per class, so
    /// repeated generation over the same inputs yields the same sequence.
    /// Stops at the first send failure (consumer dropped) or after sending
    /// the first error.
    async fn produce(
        self,
        catalog: FeatureClassCatalog,
        plan: Vec<ClassPlan>,
        extent: Envelope,
        from_level: u8,
        to_level: u8,
        tx: mpsc::Sender<TileResult<GeometryAndAttributeTiles>>,
    ) {
        for item in &plan {
            debug!(class = %item.class.name, "generating class");

            for scale_level in from_level..=to_level {
                let Some(rect) =
                    grid::visible_grid(item.class.min_visible_level, &extent, scale_level)
                else {
                    continue;
                };

                debug!(
                    class = %item.class.name,
                    scale_level,
                    tiles = rect.tile_count(),
                    "generating scale level"
                );

                for row in rect.min_row..=rect.max_row {
                    for col in rect.min_col..=rect.max_col {
                        let result = self
                            .produce_bundle(&catalog, item, scale_level, row, col)
                            .await;
                        let failed = result.is_err();
                        if tx.send(result).await.is_err() || failed {
                            return;
                        }
                    }
                }
            }
        }

        info!("tile generation finished");
    }

    /// One complete bundle: the geometry tile plus the planned attribute
    /// tiles. Built whole before it is emitted.
    async fn produce_bundle(
        &self,
        catalog: &FeatureClassCatalog,
        item: &ClassPlan,
        scale_level: u8,
        row: u32,
        col: u32,
    ) -> TileResult<GeometryAndAttributeTiles> {
        let geom_address = TileAddress::new(
            scale_level,
            row,
            col,
            item.class.name.clone(),
            TileKind::Geometry,
        );
        let mut bundle = self
            .geometry_tile_for_class(&geom_address, &item.class, catalog)
            .await?;

        for attribute in &item.attributes {
            let attr_address = TileAddress::new(
                scale_level,
                row,
                col,
                item.class.name.clone(),
                TileKind::Attribute(attribute.clone()),
            );
            let attr_tile = self
                .attribute_tile_for_class(&attr_address, &item.class, catalog)
                .await?;
            bundle.attributes.push(attr_tile);
        }

        Ok(bundle)
    }

    async fn geometry_tile_for_class(
        &self,
        address: &TileAddress,
        class: &FeatureClass,
        catalog: &FeatureClassCatalog,
    ) -> TileResult<GeometryAndAttributeTiles> {
        let tile_extent = grid::address_envelope(address);
        let family_ids = catalog.family_ids(class.id);
        let shapes = self.features.geometry_in(&tile_extent, &family_ids).await?;

        debug!(
            address = %address,
            classes = shapes.len(),
            shapes = shapes.values().map(Vec::len).sum::<usize>(),
            "geometry received"
        );

        let non_generalized = address.scale_level >= class.min_nongeneralized_level;
        let coordinate_size = bytes_per_coordinate(address.scale_level, non_generalized);

        let mut result_shapes = BTreeMap::new();
        let mut component_attributes: Vec<TileAttribute> = Vec::new();
        for (class_id, class_shapes) in &shapes {
            let prepared =
                self.preparer
                    .prepare(address, class, class_shapes, coordinate_size)?;
            result_shapes.insert(*class_id, prepared.shapes);
            component_attributes.extend(prepared.component_attributes);
        }

        let geometry = GeometryTile {
            address: address.clone(),
            shapes: result_shapes,
            coordinate_size,
        };

        let mut bundle = GeometryAndAttributeTiles::new(geometry);
        if !component_attributes.is_empty() {
            component_attributes.sort_by_key(|a| a.feature_id);
            bundle.attributes.push(AttributeTile {
                address: TileAddress::new(
                    address.scale_level,
                    address.row,
                    address.col,
                    address.feature_class.clone(),
                    TileKind::ComponentAttributes,
                ),
                attributes: component_attributes,
            });
        }

        Ok(bundle)
    }

    /// Attribute values are stored untrimmed: a feature whose geometry was
    /// dropped from the paired geometry tile still keeps its attribute here.
    async fn attribute_tile_for_class(
        &self,
        address: &TileAddress,
        class: &FeatureClass,
        catalog: &FeatureClassCatalog,
    ) -> TileResult<AttributeTile> {
        let attribute = match &address.kind {
            TileKind::Attribute(name) => name.as_str(),
            other => {
                return Err(TileError::InvalidAddressKind {
                    expected: "attribute",
                    actual: other.to_string(),
                })
            }
        };

        let tile_extent = grid::address_envelope(address);
        let family_ids = catalog.family_ids(class.id);
        let mut attributes = self
            .features
            .attribute_in(&tile_extent, &family_ids, attribute)
            .await?;
        attributes.sort_by_key(|a| a.feature_id);

        debug!(address = %address, values = attributes.len(), "attribute tile created");

        Ok(AttributeTile {
            address: address.clone(),
            attributes,
        })
    }
}

fn check_scale(scale_level: u8) -> TileResult<()> {
    if scale_level > grid::MAX_SCALE_LEVEL {
        return Err(TileError::InvalidScaleRange(format!(
            "scale level {scale_level} exceeds maximum {}",
            grid::MAX_SCALE_LEVEL
        )));
    }
    Ok(())
}

/// Resolve requested class names to their top-most ancestors.
///
/// Tiles are always generated for the root of a class family; a request
/// whose names fold onto fewer roots than names (a sub-class requested next
/// to its ancestor, or the same root twice) is malformed.
fn build_plan(
    catalog: &FeatureClassCatalog,
    class_names: &[String],
    presentation_context: Option<&(Vec<Presentation>, Vec<LabelingStyle>)>,
) -> TileResult<Vec<ClassPlan>> {
    let mut roots: Vec<&FeatureClass> = Vec::with_capacity(class_names.len());
    for name in class_names {
        let class = catalog
            .get_by_name(name)
            .ok_or_else(|| TileError::FeatureClassNotFound(name.clone()))?;
        let root = catalog
            .root_of(class.id)
            .ok_or_else(|| TileError::Internal(format!("broken hierarchy above '{name}'")))?;
        if !roots.iter().any(|r| r.id == root.id) {
            roots.push(root);
        }
    }

    if roots.len() != class_names.len() {
        return Err(TileError::InvalidFeatureClassList(format!(
            "{} requested names resolve to {} root classes",
            class_names.len(),
            roots.len()
        )));
    }

    Ok(roots
        .into_iter()
        .map(|class| ClassPlan {
            attributes: match presentation_context {
                Some((presentations, styles)) => {
                    presentation_attributes(presentations, class, catalog, styles)
                }
                None => Vec::new(),
            },
            class: class.clone(),
        })
        .collect())
}
