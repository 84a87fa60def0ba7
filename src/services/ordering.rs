//! Display order of sortable collections (branches, brands).

use std::collections::HashSet;

use uuid::Uuid;

use crate::{db::DbPool, error::AppError};

/// Tables with an `organization_id` and a `display_order` column.
#[derive(Debug, Clone, Copy)]
pub enum Sortable {
    Branches,
    Brands,
}

impl Sortable {
    fn table(self) -> &'static str {
        match self {
            Sortable::Branches => "branches",
            Sortable::Brands => "brands",
        }
    }
}

/// The new order must name every row of the organization exactly once.
pub fn check_full_permutation(existing: &[Uuid], requested: &[Uuid]) -> Result<(), AppError> {
    let unique: HashSet<&Uuid> = requested.iter().collect();
    if unique.len() != requested.len() {
        return Err(AppError::InvalidRequest("ids must not repeat".to_string()));
    }
    let existing: HashSet<&Uuid> = existing.iter().collect();
    if unique != existing {
        return Err(AppError::InvalidRequest(
            "ids must list every item exactly once".to_string(),
        ));
    }
    Ok(())
}

/// Next free position: one past the current maximum.
pub async fn next_position(pool: &DbPool, kind: Sortable, organization_id: Uuid) -> Result<i32, AppError> {
    let sql = format!(
        "SELECT COALESCE(MAX(display_order), 0) + 1 FROM {} WHERE organization_id = $1",
        kind.table()
    );
    let position: i32 = sqlx::query_scalar(&sql)
        .bind(organization_id)
        .fetch_one(pool)
        .await?;
    Ok(position)
}

/// Rewrite `display_order` to 1..=n following `ids`, in one transaction.
///
/// The rows are locked first so two concurrent reorders serialize.
pub async fn reorder(
    pool: &DbPool,
    kind: Sortable,
    organization_id: Uuid,
    ids: &[Uuid],
) -> Result<(), AppError> {
    let table = kind.table();
    let mut tx = pool.begin().await?;

    let existing: Vec<Uuid> = sqlx::query_scalar(&format!(
        "SELECT id FROM {table} WHERE organization_id = $1 FOR UPDATE"
    ))
    .bind(organization_id)
    .fetch_all(&mut *tx)
    .await?;

    check_full_permutation(&existing, ids)?;

    let update = format!(
        "UPDATE {table} SET display_order = $1, updated_at = NOW() WHERE id = $2 AND organization_id = $3"
    );
    for (position, id) in ids.iter().enumerate() {
        sqlx::query(&update)
            .bind(position as i32 + 1)
            .bind(id)
            .bind(organization_id)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;

    tracing::info!(organization_id = %organization_id, table, count = ids.len(), "display order updated");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permutation_accepts_reordering() {
        let a = Uuid::from_u128(1);
        let b = Uuid::from_u128(2);
        assert!(check_full_permutation(&[a, b], &[b, a]).is_ok());
    }

    #[test]
    fn test_permutation_rejects_missing_foreign_and_duplicate_ids() {
        let a = Uuid::from_u128(1);
        let b = Uuid::from_u128(2);
        let other = Uuid::from_u128(99);
        assert!(check_full_permutation(&[a, b], &[a]).is_err());
        assert!(check_full_permutation(&[a, b], &[a, other]).is_err());
        assert!(check_full_permutation(&[a, b], &[a, a, b]).is_err());
    }
}
