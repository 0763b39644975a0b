use sqlx::PgPool;

use crate::models::{FavoriteStock, Stock};

// ==============================================================================
// Favorite Stock Operations
// ==============================================================================

/// Inserts the stock unless a row with the same symbol already exists.
/// Returns `true` when a row was written.
pub async fn insert_if_absent(pool: &PgPool, stock: &Stock) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        INSERT INTO favorite_stocks (id, logo, name, symbol, price, change, change_percent)
        SELECT $1, $2, $3, $4, $5, $6, $7
        WHERE NOT EXISTS (SELECT 1 FROM favorite_stocks WHERE symbol = $4)
        "#,
    )
    .bind(stock.id)
    .bind(&stock.logo)
    .bind(&stock.name)
    .bind(&stock.symbol)
    .bind(stock.price)
    .bind(stock.change)
    .bind(stock.change_percent)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn fetch_all(pool: &PgPool) -> Result<Vec<FavoriteStock>, sqlx::Error> {
    sqlx::query_as::<_, FavoriteStock>(
        r#"
        SELECT row_id, id, logo, name, symbol, price, change, change_percent, created_at
        FROM favorite_stocks
        ORDER BY row_id ASC
        "#,
    )
    .fetch_all(pool)
    .await
}

/// Deletes every row for the symbol. Returns the number of rows removed.
pub async fn delete_by_symbol(pool: &PgPool, symbol: &str) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM favorite_stocks WHERE symbol = $1")
        .bind(symbol)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}

pub async fn exists(pool: &PgPool, symbol: &str) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM favorite_stocks WHERE symbol = $1)",
    )
    .bind(symbol)
    .fetch_one(pool)
    .await
}
