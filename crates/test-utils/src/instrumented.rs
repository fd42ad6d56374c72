//! Instrumented fakes for generator and concurrency tests.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use feature_catalog::{Feature, FeatureClass, FeatureGeometry, FeatureRepository};
use tile_common::{Envelope, TileAddress, TileAttribute, TileError, TileResult, TileShape};
use tile_generator::{GeometryTilePreparer, PreparedShapes};

/// Feature repository wrapper that counts geometry queries and can delay
/// them, widening the race window single-flight tests need.
pub struct CountingFeatureRepository<R> {
    inner: Arc<R>,
    delay: Duration,
    geometry_calls: AtomicU64,
}

impl<R> CountingFeatureRepository<R> {
    pub fn new(inner: Arc<R>) -> Self {
        Self {
            inner,
            delay: Duration::ZERO,
            geometry_calls: AtomicU64::new(0),
        }
    }

    pub fn with_delay(inner: Arc<R>, delay: Duration) -> Self {
        Self {
            inner,
            delay,
            geometry_calls: AtomicU64::new(0),
        }
    }

    pub fn geometry_calls(&self) -> u64 {
        self.geometry_calls.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl<R: FeatureRepository> FeatureRepository for CountingFeatureRepository<R> {
    async fn geometry_in(
        &self,
        extent: &Envelope,
        class_ids: &[i64],
    ) -> TileResult<BTreeMap<i64, Vec<FeatureGeometry>>> {
        self.geometry_calls.fetch_add(1, Ordering::Relaxed);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.inner.geometry_in(extent, class_ids).await
    }

    async fn attribute_in(
        &self,
        extent: &Envelope,
        class_ids: &[i64],
        attribute: &str,
    ) -> TileResult<Vec<TileAttribute>> {
        self.inner.attribute_in(extent, class_ids, attribute).await
    }

    async fn project_by_syscode(&self, syscode: i64) -> TileResult<Option<Feature>> {
        self.inner.project_by_syscode(syscode).await
    }
}

/// Preparer that derives one component-attribute record per shape, so tests
/// can exercise the paired component-attribute tile path.
#[derive(Debug, Default)]
pub struct ComponentAttributePreparer;

impl GeometryTilePreparer for ComponentAttributePreparer {
    fn prepare(
        &self,
        _address: &TileAddress,
        _class: &FeatureClass,
        shapes: &[FeatureGeometry],
        _coordinate_size: u8,
    ) -> TileResult<PreparedShapes> {
        Ok(PreparedShapes {
            shapes: shapes
                .iter()
                .map(|shape| TileShape {
                    feature_id: shape.feature_id,
                    geometry: shape.geometry.clone(),
                })
                .collect(),
            component_attributes: shapes
                .iter()
                .map(|shape| TileAttribute {
                    feature_id: shape.feature_id,
                    value: serde_json::json!({ "restyle": true }),
                })
                .collect(),
        })
    }
}

/// Feature repository whose geometry queries always fail, for error
/// propagation tests.
pub struct FailingFeatureRepository<R> {
    inner: Arc<R>,
}

impl<R> FailingFeatureRepository<R> {
    pub fn new(inner: Arc<R>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<R: FeatureRepository> FeatureRepository for FailingFeatureRepository<R> {
    async fn geometry_in(
        &self,
        _extent: &Envelope,
        _class_ids: &[i64],
    ) -> TileResult<BTreeMap<i64, Vec<FeatureGeometry>>> {
        Err(TileError::Repository("feature database unavailable".into()))
    }

    async fn attribute_in(
        &self,
        extent: &Envelope,
        class_ids: &[i64],
        attribute: &str,
    ) -> TileResult<Vec<TileAttribute>> {
        self.inner.attribute_in(extent, class_ids, attribute).await
    }

    async fn project_by_syscode(&self, syscode: i64) -> TileResult<Option<Feature>> {
        self.inner.project_by_syscode(syscode).await
    }
}
