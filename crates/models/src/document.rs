use chrono::Utc;
use sea_orm::{entity::prelude::*, ConnectionTrait, DatabaseBackend, DatabaseConnection, Set, Statement};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors;

/// A schema-flexible record belonging to a named collection.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "document")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub collection: String,
    #[sea_orm(column_type = "JsonBinary")]
    pub doc: Json,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Equality predicates understood by [`find_matching`].
#[derive(Clone, Debug, Default)]
pub struct Criteria<'a> {
    pub id: Option<Uuid>,
    /// Top-level JSON fields compared as text (`doc ->> field = value`).
    pub fields: &'a [(String, String)],
    pub limit: Option<u64>,
}

pub fn validate_collection(name: &str) -> Result<(), errors::ModelError> {
    if name.is_empty() || name.len() > 64 {
        return Err(errors::ModelError::Validation("collection name must be 1..=64 chars".into()));
    }
    Ok(())
}

pub fn validate_doc(doc: &Json) -> Result<(), errors::ModelError> {
    if !doc.is_object() {
        return Err(errors::ModelError::Validation("document must be a JSON object".into()));
    }
    Ok(())
}

pub async fn insert(db: &DatabaseConnection, collection: &str, doc: Json) -> Result<Model, errors::ModelError> {
    validate_collection(collection)?;
    validate_doc(&doc)?;
    let am = ActiveModel {
        id: Set(Uuid::new_v4()),
        collection: Set(collection.to_string()),
        doc: Set(doc),
        created_at: Set(Utc::now().into()),
    };
    Ok(am.insert(db).await?)
}

fn is_plain_key(field: &str) -> bool {
    !field.is_empty() && field.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Build the filtered select; kept separate so the SQL can be asserted without a database.
pub fn matching_statement(collection: &str, criteria: &Criteria<'_>) -> Statement {
    let mut sql = String::from(
        r#"SELECT "id", "collection", "doc", "created_at" FROM "document" WHERE "collection" = $1"#,
    );
    let mut values: Vec<sea_orm::Value> = vec![collection.to_string().into()];

    if let Some(id) = criteria.id {
        values.push(id.into());
        sql.push_str(&format!(r#" AND "id" = ${}"#, values.len()));
    }
    for (field, value) in criteria.fields {
        // plain keys are inlined so expression indexes such as (doc ->> 'email') apply
        let key = if is_plain_key(field) {
            format!("'{field}'")
        } else {
            values.push(field.clone().into());
            format!("${}", values.len())
        };
        values.push(value.clone().into());
        sql.push_str(&format!(r#" AND "doc" ->> {} = ${}"#, key, values.len()));
    }
    sql.push_str(r#" ORDER BY "created_at", "id""#);
    if let Some(limit) = criteria.limit {
        sql.push_str(&format!(" LIMIT {limit}"));
    }

    Statement::from_sql_and_values(DatabaseBackend::Postgres, sql, values)
}

pub async fn find_matching(
    db: &DatabaseConnection,
    collection: &str,
    criteria: &Criteria<'_>,
) -> Result<Vec<Model>, errors::ModelError> {
    let rows = Entity::find()
        .from_raw_sql(matching_statement(collection, criteria))
        .all(db)
        .await?;
    Ok(rows)
}

/// Single-statement top-level merge of `set` into a stored document.
pub fn merge_statement(collection: &str, id: Uuid, set: Json) -> Statement {
    Statement::from_sql_and_values(
        DatabaseBackend::Postgres,
        r#"UPDATE "document" SET "doc" = "doc" || $1::jsonb WHERE "id" = $2 AND "collection" = $3"#,
        [set.into(), id.into(), collection.to_string().into()],
    )
}

/// Merge `set` into the document; returns the number of rows touched, so a
/// document deleted in the meantime yields 0 rather than an error.
pub async fn merge_doc(db: &DatabaseConnection, collection: &str, id: Uuid, set: Json) -> Result<u64, errors::ModelError> {
    validate_doc(&set)?;
    let res = db.execute(merge_statement(collection, id, set)).await?;
    Ok(res.rows_affected())
}

pub async fn hard_delete(db: &DatabaseConnection, id: Uuid) -> Result<u64, errors::ModelError> {
    let res = Entity::delete_by_id(id).exec(db).await?;
    Ok(res.rows_affected)
}

pub async fn ping(db: &DatabaseConnection) -> Result<(), errors::ModelError> {
    Ok(db.ping().await?)
}
