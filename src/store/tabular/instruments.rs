use sqlx::PgPool;

use crate::models::instrument::Instrument;

pub async fn get_all(pool: &PgPool, active_only: bool) -> Result<Vec<Instrument>, sqlx::Error> {
    if active_only {
        sqlx::query_as::<_, Instrument>(
            "SELECT id, display_name, market, asset_type, active FROM instruments WHERE active = true ORDER BY id",
        )
        .fetch_all(pool)
        .await
    } else {
        sqlx::query_as::<_, Instrument>(
            "SELECT id, display_name, market, asset_type, active FROM instruments ORDER BY id",
        )
        .fetch_all(pool)
        .await
    }
}

pub async fn get(pool: &PgPool, id: &str) -> Result<Option<Instrument>, sqlx::Error> {
    sqlx::query_as::<_, Instrument>(
        "SELECT id, display_name, market, asset_type, active FROM instruments WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}
