use std::sync::Arc;

use crate::error::AppResult;
use crate::models::{CatalogQuery, DrawType, NumberLimit, Schedule, Zone};
use crate::stores::CatalogStore;

/// 目录只读查询（区域 / 开奖类型 / 截止时间 / 号码上限）
#[derive(Clone)]
pub struct CatalogService {
    catalog: Arc<dyn CatalogStore>,
}

impl CatalogService {
    pub fn new(catalog: Arc<dyn CatalogStore>) -> Self {
        Self { catalog }
    }

    pub async fn list_zones(&self) -> AppResult<Vec<Zone>> {
        Ok(self.catalog.list_zones().await?)
    }

    pub async fn list_draw_types(&self) -> AppResult<Vec<DrawType>> {
        Ok(self.catalog.list_draw_types().await?)
    }

    pub async fn list_schedules(&self, query: &CatalogQuery) -> AppResult<Vec<Schedule>> {
        Ok(self
            .catalog
            .list_schedules(query.zone_id, query.draw_type_id)
            .await?)
    }

    pub async fn list_limits(&self, query: &CatalogQuery) -> AppResult<Vec<NumberLimit>> {
        Ok(self
            .catalog
            .list_limits(query.zone_id, query.draw_type_id)
            .await?)
    }
}
