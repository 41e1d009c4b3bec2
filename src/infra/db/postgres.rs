use async_trait::async_trait;
use sqlx::{PgPool, QueryBuilder, postgres::PgPoolOptions};

use super::{
    ApplicationRow, ControllerTypeRow, LanguageRow, ListenerRow, PackageRow, RouteRow, Store,
    StoreError,
};

fn map_sqlx_error(err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::RowNotFound => StoreError::NotFound,
        sqlx::Error::Database(db) if db.message().contains("invalid input syntax") => {
            StoreError::InvalidInput {
                message: db.message().to_string(),
            }
        }
        sqlx::Error::Database(db)
            if db
                .message()
                .contains("canceling statement due to user request") =>
        {
            StoreError::Timeout
        }
        other => StoreError::from_persistence(other),
    }
}

/// Postgres-backed [`Store`].
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await
            .map_err(map_sqlx_error)?;
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn push_package_filter(qb: &mut QueryBuilder<'_, sqlx::Postgres>, packages: &[i64]) {
    qb.push(" WHERE package_id IN (");
    let mut separated = qb.separated(", ");
    for package_id in packages {
        separated.push_bind(*package_id);
    }
    qb.push(")");
}

#[async_trait]
impl Store for PostgresStore {
    async fn resolve_dependencies(&self, package_id: i64) -> Result<Vec<i64>, StoreError> {
        let rows: Vec<(i64,)> = sqlx::query_as(
            "WITH RECURSIVE deps AS ( \
                 SELECT package_id FROM packages WHERE package_id = $1 \
                 UNION \
                 SELECT pd.dependency_id FROM package_dependencies pd \
                 JOIN deps d ON d.package_id = pd.package_id \
             ) SELECT package_id FROM deps ORDER BY package_id",
        )
        .bind(package_id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        if rows.is_empty() {
            return Err(StoreError::NotFound);
        }
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    async fn route_rows(&self, packages: &[i64]) -> Result<Vec<RouteRow>, StoreError> {
        let mut qb = QueryBuilder::new(
            "SELECT package_id, parameter, route_value, controller_name, controller_directory \
             FROM routes",
        );
        push_package_filter(&mut qb, packages);
        qb.push(" ORDER BY route_id");
        qb.build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_error)
    }

    async fn controller_type_rows(
        &self,
        packages: &[i64],
    ) -> Result<Vec<ControllerTypeRow>, StoreError> {
        let mut qb = QueryBuilder::new(
            "SELECT package_id, parameter, controller_directory FROM controller_types",
        );
        push_package_filter(&mut qb, packages);
        qb.push(" ORDER BY controller_type_id");
        qb.build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_error)
    }

    async fn listener_rows(&self, packages: &[i64]) -> Result<Vec<ListenerRow>, StoreError> {
        let mut qb = QueryBuilder::new(
            "SELECT package_id, listener_class, target_class, event_name, inherit \
             FROM event_listeners",
        );
        push_package_filter(&mut qb, packages);
        qb.push(" ORDER BY listener_id");
        qb.build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_error)
    }

    async fn language_rows(&self) -> Result<Vec<LanguageRow>, StoreError> {
        sqlx::query_as(
            "SELECT language_id, language_code, country_code, is_default \
             FROM languages ORDER BY language_id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)
    }

    async fn application_rows(&self) -> Result<Vec<ApplicationRow>, StoreError> {
        sqlx::query_as(
            "SELECT package_id, abbreviation, directory, is_primary \
             FROM applications ORDER BY package_id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)
    }

    async fn package_instance(&self, package_id: i64) -> Result<PackageRow, StoreError> {
        sqlx::query_as(
            "SELECT package_id, identifier, directory FROM packages WHERE package_id = $1",
        )
        .bind(package_id)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_error)
    }
}
