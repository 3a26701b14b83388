use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "complaints")]
#[schema(as = Complaint)]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(column_type = "String(StringLen::N(50))")]
    pub category: String,
    #[sea_orm(column_type = "String(StringLen::N(200))")]
    pub title: String,
    #[sea_orm(column_type = "Text")]
    pub details: String,
    #[sea_orm(column_type = "String(StringLen::N(20))", nullable)]
    pub priority: Option<String>,
    pub is_anonymous: bool,
    #[sea_orm(column_type = "String(StringLen::N(100))", nullable)]
    pub student_name: Option<String>,
    #[sea_orm(column_type = "String(StringLen::N(255))", nullable)]
    pub student_email: Option<String>,
    #[sea_orm(column_type = "String(StringLen::N(50))", nullable)]
    pub student_id: Option<String>,
    pub created_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
