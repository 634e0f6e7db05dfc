use async_trait::async_trait;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};

use crate::entities::{
    draw_schedule_entity as schedules, draw_type_entity as draw_types,
    number_limit_entity as limits, zone_entity as zones,
};
use crate::models::{DrawType, NumberLimit, Schedule, Zone};
use crate::stores::{CatalogStore, StoreResult};

#[derive(Clone)]
pub struct PostgresCatalog {
    pool: DatabaseConnection,
}

impl PostgresCatalog {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CatalogStore for PostgresCatalog {
    async fn get_zone(&self, zone_id: i64) -> StoreResult<Option<Zone>> {
        Ok(zones::Entity::find_by_id(zone_id)
            .one(&self.pool)
            .await?
            .map(Into::into))
    }

    async fn get_schedule(
        &self,
        zone_id: i64,
        draw_type_id: i64,
    ) -> StoreResult<Option<Schedule>> {
        Ok(schedules::Entity::find()
            .filter(schedules::Column::ZoneId.eq(zone_id))
            .filter(schedules::Column::DrawTypeId.eq(draw_type_id))
            .one(&self.pool)
            .await?
            .map(Into::into))
    }

    async fn get_limit(
        &self,
        zone_id: i64,
        draw_type_id: i64,
        number: &str,
    ) -> StoreResult<Option<NumberLimit>> {
        Ok(limits::Entity::find()
            .filter(limits::Column::ZoneId.eq(zone_id))
            .filter(limits::Column::DrawTypeId.eq(draw_type_id))
            .filter(limits::Column::Number.eq(number))
            .one(&self.pool)
            .await?
            .map(Into::into))
    }

    async fn list_zones(&self) -> StoreResult<Vec<Zone>> {
        let list = zones::Entity::find()
            .order_by_asc(zones::Column::Name)
            .all(&self.pool)
            .await?;
        Ok(list.into_iter().map(Into::into).collect())
    }

    async fn list_draw_types(&self) -> StoreResult<Vec<DrawType>> {
        let list = draw_types::Entity::find()
            .order_by_asc(draw_types::Column::Name)
            .all(&self.pool)
            .await?;
        Ok(list.into_iter().map(Into::into).collect())
    }

    async fn list_schedules(
        &self,
        zone_id: Option<i64>,
        draw_type_id: Option<i64>,
    ) -> StoreResult<Vec<Schedule>> {
        let mut query = schedules::Entity::find();
        if let Some(zone_id) = zone_id {
            query = query.filter(schedules::Column::ZoneId.eq(zone_id));
        }
        if let Some(draw_type_id) = draw_type_id {
            query = query.filter(schedules::Column::DrawTypeId.eq(draw_type_id));
        }
        let list = query
            .order_by_asc(schedules::Column::ZoneId)
            .order_by_asc(schedules::Column::DrawTypeId)
            .all(&self.pool)
            .await?;
        Ok(list.into_iter().map(Into::into).collect())
    }

    async fn list_limits(
        &self,
        zone_id: Option<i64>,
        draw_type_id: Option<i64>,
    ) -> StoreResult<Vec<NumberLimit>> {
        let mut query = limits::Entity::find();
        if let Some(zone_id) = zone_id {
            query = query.filter(limits::Column::ZoneId.eq(zone_id));
        }
        if let Some(draw_type_id) = draw_type_id {
            query = query.filter(limits::Column::DrawTypeId.eq(draw_type_id));
        }
        let list = query
            .order_by_asc(limits::Column::ZoneId)
            .order_by_asc(limits::Column::DrawTypeId)
            .order_by_asc(limits::Column::Number)
            .all(&self.pool)
            .await?;
        Ok(list.into_iter().map(Into::into).collect())
    }
}
