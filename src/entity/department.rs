//! Department entity - 部门表
//!
//! 表名: department

use sea_orm::entity::prelude::*;
use sea_orm::FromJsonQueryResult;
use serde::{Deserialize, Serialize};

/// 同一部门的其他 id (JSON 数组存储)
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult)]
pub struct ConflictIds(pub Vec<String>);

impl From<Vec<String>> for ConflictIds {
    fn from(ids: Vec<String>) -> Self {
        Self(ids)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "department")]
pub struct Model {
    /// 绝对 id, 例如 "3944_401121_134532"
    #[sea_orm(primary_key, auto_increment = false, column_type = "Text")]
    pub id: String,

    /// 部门名称
    #[sea_orm(column_type = "Text")]
    pub title: String,

    /// 绝对路径, 例如 "Auto & Tires/Auto Body/Auto Paint"
    #[sea_orm(column_type = "Text")]
    pub path: String,

    /// 父部门 id (顶级部门为空)
    #[sea_orm(column_type = "Text", nullable)]
    pub parent_id: Option<String>,

    #[sea_orm(column_type = "Json", nullable)]
    pub conflict_ids: Option<ConflictIds>,

    /// 最后同步时间
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(belongs_to = "Entity", from = "Column::ParentId", to = "Column::Id")]
    Parent,
}

impl ActiveModelBehavior for ActiveModel {}
