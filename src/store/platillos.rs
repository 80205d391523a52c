use std::sync::Arc;

use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::platillo::{ActualizarPlatillo, NuevoPlatillo, Platillo};
use crate::metrics::Metrics;

use super::{con_metricas, StoreError};

// ============================================================================
// PlatilloStore - Menu Item CRUD
// ============================================================================

#[derive(Clone)]
pub struct PlatilloStore {
    pool: PgPool,
    metrics: Arc<Metrics>,
}

impl PlatilloStore {
    pub fn new(pool: PgPool, metrics: Arc<Metrics>) -> Self {
        Self { pool, metrics }
    }

    pub async fn insertar(&self, nuevo: NuevoPlatillo) -> Result<Platillo, StoreError> {
        nuevo.validar()?;

        con_metricas(&self.metrics, "platillos_insertar", async {
            let platillo = sqlx::query_as::<_, Platillo>(
                "INSERT INTO platillos (id, nombre, precio_usd, descripcion, imagen_url, activo) \
                 VALUES ($1, $2, $3, $4, $5, TRUE) \
                 RETURNING *",
            )
            .bind(Uuid::new_v4())
            .bind(nuevo.nombre.trim())
            .bind(nuevo.precio_usd)
            .bind(&nuevo.descripcion)
            .bind(&nuevo.imagen_url)
            .fetch_one(&self.pool)
            .await?;

            tracing::info!(platillo_id = %platillo.id, nombre = %platillo.nombre, "Platillo creado");
            Ok(platillo)
        })
        .await
    }

    /// Active platillos, alphabetically, as the menu screens list them.
    pub async fn listar_activos(&self) -> Result<Vec<Platillo>, StoreError> {
        con_metricas(&self.metrics, "platillos_listar", async {
            let platillos = sqlx::query_as::<_, Platillo>(
                "SELECT * FROM platillos WHERE activo ORDER BY nombre ASC",
            )
            .fetch_all(&self.pool)
            .await?;
            Ok(platillos)
        })
        .await
    }

    /// Case-insensitive partial name search over active platillos.
    pub async fn buscar(&self, nombre: &str) -> Result<Vec<Platillo>, StoreError> {
        let filtro = format!("%{}%", nombre.trim());

        con_metricas(&self.metrics, "platillos_buscar", async {
            let platillos = sqlx::query_as::<_, Platillo>(
                "SELECT * FROM platillos WHERE activo AND nombre ILIKE $1 ORDER BY nombre ASC",
            )
            .bind(&filtro)
            .fetch_all(&self.pool)
            .await?;
            Ok(platillos)
        })
        .await
    }

    pub async fn actualizar(
        &self,
        id: Uuid,
        cambios: ActualizarPlatillo,
    ) -> Result<Platillo, StoreError> {
        cambios.validar()?;

        con_metricas(&self.metrics, "platillos_actualizar", async {
            let platillo = sqlx::query_as::<_, Platillo>(
                "UPDATE platillos \
                 SET nombre = $2, precio_usd = $3, descripcion = $4, imagen_url = $5, activo = $6 \
                 WHERE id = $1 \
                 RETURNING *",
            )
            .bind(id)
            .bind(cambios.nombre.trim())
            .bind(cambios.precio_usd)
            .bind(&cambios.descripcion)
            .bind(&cambios.imagen_url)
            .bind(cambios.activo)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::NoEncontrado)?;

            tracing::info!(platillo_id = %id, "Platillo actualizado");
            Ok(platillo)
        })
        .await
    }

    pub async fn eliminar(&self, id: Uuid) -> Result<(), StoreError> {
        con_metricas(&self.metrics, "platillos_eliminar", async {
            let resultado = sqlx::query("DELETE FROM platillos WHERE id = $1")
                .bind(id)
                .execute(&self.pool)
                .await?;

            if resultado.rows_affected() == 0 {
                return Err(StoreError::NoEncontrado);
            }

            tracing::info!(platillo_id = %id, "Platillo eliminado");
            Ok(())
        })
        .await
    }
}
