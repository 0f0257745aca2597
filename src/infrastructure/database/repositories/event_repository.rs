use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set,
};

use crate::domain::{
    Event, EventKind, EventRepository, EventSource, GatewayError, GatewayResult, NewEvent,
};
use crate::infrastructure::database::entities::event;

pub struct SeaOrmEventRepository {
    db: DatabaseConnection,
}

impl SeaOrmEventRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

// ── Conversion helpers ──────────────────────────────────────────

fn entity_kind_to_domain(kind: event::EventKind) -> EventKind {
    match kind {
        event::EventKind::Success => EventKind::Success,
        event::EventKind::Error => EventKind::Error,
    }
}

fn domain_kind_to_entity(kind: EventKind) -> event::EventKind {
    match kind {
        EventKind::Success => event::EventKind::Success,
        EventKind::Error => event::EventKind::Error,
    }
}

fn entity_source_to_domain(source: event::EventSource) -> EventSource {
    match source {
        event::EventSource::Predict => EventSource::Predict,
        event::EventSource::Login => EventSource::Login,
    }
}

fn domain_source_to_entity(source: EventSource) -> event::EventSource {
    match source {
        EventSource::Predict => event::EventSource::Predict,
        EventSource::Login => event::EventSource::Login,
    }
}

fn event_model_to_domain(model: event::Model) -> GatewayResult<Event> {
    let timestamp = DateTime::<Utc>::from_timestamp_millis(model.timestamp_ms).ok_or_else(|| {
        GatewayError::Internal(format!(
            "event {} has out-of-range timestamp {}",
            model.id, model.timestamp_ms
        ))
    })?;

    Ok(Event {
        id: model.id,
        timestamp,
        kind: entity_kind_to_domain(model.kind),
        actor: model.actor,
        source: entity_source_to_domain(model.source),
    })
}

fn db_err(e: sea_orm::DbErr) -> GatewayError {
    GatewayError::StorageUnavailable(format!("Database error: {}", e))
}

// ── Repository implementation ───────────────────────────────────

#[async_trait]
impl EventRepository for SeaOrmEventRepository {
    async fn append(&self, new_event: NewEvent) -> GatewayResult<Event> {
        // A single INSERT is atomic in SQLite; concurrent appends serialize
        // on the database write lock.
        let active = event::ActiveModel {
            id: NotSet,
            timestamp_ms: Set(new_event.timestamp.timestamp_millis()),
            kind: Set(domain_kind_to_entity(new_event.kind)),
            actor: Set(new_event.actor),
            source: Set(domain_source_to_entity(new_event.source)),
        };

        let model = active.insert(&self.db).await.map_err(db_err)?;
        event_model_to_domain(model)
    }

    async fn since(&self, from: DateTime<Utc>) -> GatewayResult<Vec<Event>> {
        let models = event::Entity::find()
            .filter(event::Column::TimestampMs.gte(from.timestamp_millis()))
            .order_by_asc(event::Column::TimestampMs)
            .order_by_asc(event::Column::Id)
            .all(&self.db)
            .await
            .map_err(db_err)?;

        models.into_iter().map(event_model_to_domain).collect()
    }

    async fn count(&self) -> GatewayResult<u64> {
        event::Entity::find().count(&self.db).await.map_err(db_err)
    }
}
