use super::newtypes::{CategoryId, UserId};
use crate::schema::category;
use chrono::{DateTime, Utc};
use diesel::{Identifiable, Queryable, Selectable};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Queryable, Selectable, Identifiable)]
#[diesel(table_name = category, check_for_backend(diesel::pg::Pg))]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub slug: String,
    pub creator_id: UserId,
    pub published: DateTime<Utc>,
}

#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct CreateCategoryParams {
    pub name: String,
}

#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct UpdateCategoryParams {
    pub category_id: CategoryId,
    pub name: String,
}

#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct DeleteCategoryParams {
    pub category_id: CategoryId,
}
