//! The mutation path: locks, store, fan-out.
//!
//! Every mutating request goes through [`RecordService`]. A mutation first
//! takes the per-entity lock for its target, then runs the store function
//! on a blocking task. The commit gate is held from the start of the store
//! transaction until the change event has been handed to the hub, so events
//! leave the hub in the same order the store committed them.
//!
//! Once spawned, the blocking task runs to completion even if the request
//! that started it goes away.

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};

use relief_db::DbPool;
use relief_geocode::{GeocodeError, GeocodingPipeline, ResolvedLocation};
use relief_identity::{authorize, Action};
use relief_records::{disasters, reports, resources, RecordError};
use relief_types::{
    ChangeEvent, Coordinates, Disaster, DisasterEvent, DisasterPatch, Identity, NewDisaster,
    NewReport, NewResource, Relocation, Report, ReportEvent, ReportPatch, Resource, ResourceEvent,
    ResourcePatch,
};
use rusqlite::Connection;
use thiserror::Error;

use crate::hub::Hub;
use crate::locks::{EntityGuard, EntityLocks};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Record(#[from] RecordError),

    #[error(transparent)]
    Geocode(#[from] GeocodeError),

    #[error("db connection failed: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("blocking task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Fields accepted when creating a disaster. Location comes from geocoding
/// the description.
#[derive(Debug, Clone, Default)]
pub struct DisasterDraft {
    pub title: String,
    pub description: String,
    pub tags: BTreeSet<String>,
}

#[derive(Clone)]
pub struct RecordService {
    pool: DbPool,
    hub: Hub,
    geocoder: GeocodingPipeline,
    locks: EntityLocks,
    commit_gate: Arc<Mutex<()>>,
}

impl RecordService {
    pub fn new(pool: DbPool, hub: Hub, geocoder: GeocodingPipeline) -> Self {
        Self {
            pool,
            hub,
            geocoder,
            locks: EntityLocks::new(),
            commit_gate: Arc::new(Mutex::new(())),
        }
    }

    pub fn hub(&self) -> &Hub {
        &self.hub
    }

    pub fn geocoder(&self) -> &GeocodingPipeline {
        &self.geocoder
    }

    // --- disasters ---

    /// Validates, authorizes, geocodes the description, then stores.
    ///
    /// A geocoding failure returns before anything is written.
    pub async fn create_disaster(
        &self,
        draft: DisasterDraft,
        actor: Identity,
    ) -> Result<Disaster, ServiceError> {
        if draft.title.trim().is_empty() {
            return Err(RecordError::MissingField("title").into());
        }
        if draft.description.trim().is_empty() {
            return Err(RecordError::MissingField("description").into());
        }
        authorize(&actor, Action::Create, None)
            .into_result()
            .map_err(RecordError::from)?;

        let ResolvedLocation {
            location_name,
            lat,
            lon,
        } = self
            .geocoder
            .resolve_location(&draft.description)
            .await
            .inspect_err(|e| tracing::info!(actor = %actor.handle, error = %e, "geocoding failed"))?;

        let new = NewDisaster {
            title: draft.title,
            description: draft.description,
            location_name,
            coordinates: Some(Coordinates::new(lat, lon)),
            tags: draft.tags,
        };
        self.write(None, move |conn| {
            let disaster = disasters::create_disaster(conn, new, &actor)?;
            let event = DisasterEvent::Create {
                disaster: disaster.clone(),
            };
            Ok((disaster, event.into()))
        })
        .await
    }

    pub async fn update_disaster(
        &self,
        id: String,
        patch: DisasterPatch,
        actor: Identity,
    ) -> Result<Disaster, ServiceError> {
        let relocation = self.relocate(&patch).await?;
        let guard = self.locks.lock(format!("disaster:{id}")).await;
        self.write(Some(guard), move |conn| {
            let disaster =
                disasters::update_disaster(conn, &id, &patch, relocation.as_ref(), &actor)?;
            let event = DisasterEvent::Update {
                disaster: disaster.clone(),
            };
            Ok((disaster, event.into()))
        })
        .await
    }

    pub async fn delete_disaster(
        &self,
        id: String,
        actor: Identity,
    ) -> Result<Disaster, ServiceError> {
        let guard = self.locks.lock(format!("disaster:{id}")).await;
        self.write(Some(guard), move |conn| {
            let tombstone = disasters::delete_disaster(conn, &id, &actor)?;
            let event = DisasterEvent::Delete {
                id,
                disaster: tombstone.clone(),
            };
            Ok((tombstone, event.into()))
        })
        .await
    }

    /// Re-geocodes a patch that moves the disaster.
    ///
    /// A new `location_name` is geocoded as given. A new description is run
    /// through extraction, and a description naming no place leaves the
    /// location alone. An unresolvable place keeps its name and loses its
    /// coordinates. Service failures abort the update.
    async fn relocate(&self, patch: &DisasterPatch) -> Result<Option<Relocation>, ServiceError> {
        let (resolved, requested) = if let Some(name) = &patch.location_name {
            (self.geocoder.resolve_place(name).await, Some(name))
        } else if let Some(description) = &patch.description {
            (self.geocoder.resolve_location(description).await, None)
        } else {
            return Ok(None);
        };

        match resolved {
            Ok(ResolvedLocation {
                location_name,
                lat,
                lon,
            }) => Ok(Some(Relocation {
                location_name,
                coordinates: Some(Coordinates::new(lat, lon)),
            })),
            Err(GeocodeError::LocationNotResolvable(location_name)) => Ok(Some(Relocation {
                location_name,
                coordinates: None,
            })),
            Err(GeocodeError::NoLocationExtracted) => Ok(requested.map(|name| Relocation {
                location_name: name.clone(),
                coordinates: None,
            })),
            Err(e) => {
                tracing::info!(error = %e, "geocoding failed during update");
                Err(e.into())
            }
        }
    }

    /// Admin only. Publishes a single `delete_all` event.
    pub async fn delete_all_disasters(&self, actor: Identity) -> Result<usize, ServiceError> {
        self.write(None, move |conn| {
            let count = disasters::delete_all_disasters(conn, &actor)?;
            Ok((count, DisasterEvent::DeleteAll { count }.into()))
        })
        .await
    }

    pub async fn get_disaster(&self, id: String) -> Result<Disaster, ServiceError> {
        self.read(move |conn| disasters::get_disaster(conn, &id)).await
    }

    pub async fn list_disasters(&self, tag: Option<String>) -> Result<Vec<Disaster>, ServiceError> {
        self.read(move |conn| disasters::list_disasters(conn, tag.as_deref()))
            .await
    }

    // --- resources ---

    pub async fn create_resource(
        &self,
        new: NewResource,
        actor: Identity,
    ) -> Result<Resource, ServiceError> {
        self.write(None, move |conn| {
            let resource = resources::create_resource(conn, new, &actor)?;
            let event = ResourceEvent::Create {
                disaster_id: resource.disaster_id.clone(),
                resource: resource.clone(),
            };
            Ok((resource, event.into()))
        })
        .await
    }

    pub async fn update_resource(
        &self,
        id: String,
        patch: ResourcePatch,
        actor: Identity,
    ) -> Result<Resource, ServiceError> {
        let guard = self.locks.lock(format!("resource:{id}")).await;
        self.write(Some(guard), move |conn| {
            let resource = resources::update_resource(conn, &id, &patch, &actor)?;
            let event = ResourceEvent::Update {
                disaster_id: resource.disaster_id.clone(),
                resource: resource.clone(),
            };
            Ok((resource, event.into()))
        })
        .await
    }

    pub async fn delete_resource(
        &self,
        id: String,
        actor: Identity,
    ) -> Result<Resource, ServiceError> {
        let guard = self.locks.lock(format!("resource:{id}")).await;
        self.write(Some(guard), move |conn| {
            let tombstone = resources::delete_resource(conn, &id, &actor)?;
            let event = ResourceEvent::Delete {
                id,
                disaster_id: tombstone.disaster_id.clone(),
                resource: tombstone.clone(),
            };
            Ok((tombstone, event.into()))
        })
        .await
    }

    pub async fn list_resources(&self, disaster_id: String) -> Result<Vec<Resource>, ServiceError> {
        self.read(move |conn| resources::list_resources(conn, &disaster_id))
            .await
    }

    // --- reports ---

    pub async fn create_report(
        &self,
        new: NewReport,
        actor: Identity,
    ) -> Result<Report, ServiceError> {
        self.write(None, move |conn| {
            let report = reports::create_report(conn, new, &actor)?;
            let event = ReportEvent::Create {
                disaster_id: report.disaster_id.clone(),
                report: report.clone(),
            };
            Ok((report, event.into()))
        })
        .await
    }

    pub async fn update_report(
        &self,
        id: String,
        patch: ReportPatch,
        actor: Identity,
    ) -> Result<Report, ServiceError> {
        let guard = self.locks.lock(format!("report:{id}")).await;
        self.write(Some(guard), move |conn| {
            let report = reports::update_report(conn, &id, &patch, &actor)?;
            let event = ReportEvent::Update {
                disaster_id: report.disaster_id.clone(),
                report: report.clone(),
            };
            Ok((report, event.into()))
        })
        .await
    }

    pub async fn delete_report(&self, id: String, actor: Identity) -> Result<Report, ServiceError> {
        let guard = self.locks.lock(format!("report:{id}")).await;
        self.write(Some(guard), move |conn| {
            let tombstone = reports::delete_report(conn, &id, &actor)?;
            let event = ReportEvent::Delete {
                id,
                disaster_id: tombstone.disaster_id.clone(),
                report: tombstone.clone(),
            };
            Ok((tombstone, event.into()))
        })
        .await
    }

    pub async fn list_reports(&self, disaster_id: String) -> Result<Vec<Report>, ServiceError> {
        self.read(move |conn| reports::list_reports(conn, &disaster_id))
            .await
    }

    /// Runs `op` on a blocking task under the commit gate and publishes the
    /// event it returns. Nothing is published when `op` fails.
    async fn write<T, F>(&self, guard: Option<EntityGuard>, op: F) -> Result<T, ServiceError>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> Result<(T, ChangeEvent), RecordError> + Send + 'static,
    {
        let pool = self.pool.clone();
        let hub = self.hub.clone();
        let gate = self.commit_gate.clone();

        tokio::task::spawn_blocking(move || -> Result<T, ServiceError> {
            let _entity = guard;
            // Gate before checkout: a waiting writer holds no pooled connection.
            let _commit = gate.lock().unwrap_or_else(|e| e.into_inner());
            let mut conn = pool.get()?;

            let (value, event) = op(&mut *conn).inspect_err(|e| {
                if matches!(e, RecordError::Store(_) | RecordError::Json(_)) {
                    tracing::error!(error = %e, "store write failed");
                }
            })?;
            hub.publish(event);
            Ok(value)
        })
        .await?
    }

    async fn read<T, F>(&self, op: F) -> Result<T, ServiceError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T, RecordError> + Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || -> Result<T, ServiceError> {
            let conn = pool.get()?;
            Ok(op(&*conn)?)
        })
        .await?
    }
}
