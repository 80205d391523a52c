use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::domain::pedido::{Abono, EstadoPedido, MetodoPago, Pedido, PedidoItem};
use crate::domain::platillo::Platillo;
use crate::domain::pricing::Tasa;
use crate::metrics::Metrics;

use super::{con_metricas, StoreError};

// ============================================================================
// PedidoStore - Order Lifecycle
// ============================================================================
//
// All mutations that touch paid amounts or line lists run inside a
// transaction with `SELECT ... FOR UPDATE` on the pedido row, so two
// simultaneous abonos against the same pedido serialize instead of losing
// an update.
//
// ============================================================================

/// Cart line as submitted by a client: a platillo reference plus quantity.
/// Name and price snapshots are taken server-side.
#[derive(Debug, Clone, Deserialize)]
pub struct LineaPedido {
    pub platillo_id: Uuid,
    pub cantidad: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NuevoPedido {
    pub cliente_nombre: String,
    #[serde(default)]
    pub cliente_direccion: Option<String>,
    pub items: Vec<LineaPedido>,
}

#[derive(sqlx::FromRow)]
struct PedidoRow {
    id: Uuid,
    cliente_nombre: String,
    cliente_direccion: Option<String>,
    items: Json<Vec<PedidoItem>>,
    total_usd: Decimal,
    total_bs: Decimal,
    tasa_dolar_usada: Decimal,
    estado: String,
    monto_abonado_usd: Decimal,
    monto_abonado_bs: Decimal,
    created_at: DateTime<Utc>,
}

impl TryFrom<PedidoRow> for Pedido {
    type Error = StoreError;

    fn try_from(fila: PedidoRow) -> Result<Self, Self::Error> {
        let estado: EstadoPedido = fila.estado.parse().map_err(StoreError::Pedido)?;
        Ok(Pedido {
            id: fila.id,
            cliente_nombre: fila.cliente_nombre,
            cliente_direccion: fila.cliente_direccion,
            items: fila.items.0,
            total_usd: fila.total_usd,
            total_bs: fila.total_bs,
            tasa_dolar_usada: fila.tasa_dolar_usada,
            estado,
            monto_abonado_usd: fila.monto_abonado_usd,
            monto_abonado_bs: fila.monto_abonado_bs,
            created_at: fila.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct AbonoRow {
    id: Uuid,
    pedido_id: Uuid,
    monto_usd: Decimal,
    monto_bs: Decimal,
    tasa_dolar_usada: Decimal,
    metodo_pago: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<AbonoRow> for Abono {
    type Error = StoreError;

    fn try_from(fila: AbonoRow) -> Result<Self, Self::Error> {
        let metodo_pago: MetodoPago = fila.metodo_pago.parse().map_err(StoreError::Pedido)?;
        Ok(Abono {
            id: fila.id,
            pedido_id: fila.pedido_id,
            monto_usd: fila.monto_usd,
            monto_bs: fila.monto_bs,
            tasa_dolar_usada: fila.tasa_dolar_usada,
            metodo_pago,
            created_at: fila.created_at,
        })
    }
}

#[derive(Clone)]
pub struct PedidoStore {
    pool: PgPool,
    metrics: Arc<Metrics>,
}

impl PedidoStore {
    pub fn new(pool: PgPool, metrics: Arc<Metrics>) -> Self {
        Self { pool, metrics }
    }

    /// Create a pedido from a submitted cart. Platillo names and prices are
    /// snapshotted now; `tasa` is the live rate threaded in by the caller
    /// and becomes the pedido's permanent rate snapshot.
    pub async fn crear(&self, solicitud: NuevoPedido, tasa: Tasa) -> Result<Pedido, StoreError> {
        con_metricas(&self.metrics, "pedidos_crear", async {
            let ids: Vec<Uuid> = solicitud.items.iter().map(|l| l.platillo_id).collect();
            let platillos = sqlx::query_as::<_, Platillo>(
                "SELECT * FROM platillos WHERE id = ANY($1)",
            )
            .bind(&ids)
            .fetch_all(&self.pool)
            .await?;
            let por_id: HashMap<Uuid, Platillo> =
                platillos.into_iter().map(|p| (p.id, p)).collect();

            let items = armar_items(&solicitud.items, &por_id, &[])?;
            let pedido = Pedido::nuevo(
                solicitud.cliente_nombre.trim().to_string(),
                solicitud.cliente_direccion,
                items,
                tasa,
            )?;

            sqlx::query(
                "INSERT INTO pedidos (id, cliente_nombre, cliente_direccion, items, \
                 total_usd, total_bs, tasa_dolar_usada, estado, \
                 monto_abonado_usd, monto_abonado_bs, created_at) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
            )
            .bind(pedido.id)
            .bind(&pedido.cliente_nombre)
            .bind(&pedido.cliente_direccion)
            .bind(Json(&pedido.items))
            .bind(pedido.total_usd)
            .bind(pedido.total_bs)
            .bind(pedido.tasa_dolar_usada)
            .bind(pedido.estado.as_str())
            .bind(pedido.monto_abonado_usd)
            .bind(pedido.monto_abonado_bs)
            .bind(pedido.created_at)
            .execute(&self.pool)
            .await?;

            self.metrics.registrar_pedido_creado();
            tracing::info!(
                pedido_id = %pedido.id,
                cliente = %pedido.cliente_nombre,
                total_usd = %pedido.total_usd,
                tasa = %pedido.tasa_dolar_usada,
                "Pedido creado"
            );
            Ok(pedido)
        })
        .await
    }

    /// All pedidos, newest first.
    pub async fn listar(&self) -> Result<Vec<Pedido>, StoreError> {
        con_metricas(&self.metrics, "pedidos_listar", async {
            let filas = sqlx::query_as::<_, PedidoRow>(
                "SELECT * FROM pedidos ORDER BY created_at DESC",
            )
            .fetch_all(&self.pool)
            .await?;
            filas.into_iter().map(Pedido::try_from).collect()
        })
        .await
    }

    pub async fn obtener(&self, id: Uuid) -> Result<Pedido, StoreError> {
        con_metricas(&self.metrics, "pedidos_obtener", async {
            let fila = sqlx::query_as::<_, PedidoRow>("SELECT * FROM pedidos WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?
                .ok_or(StoreError::NoEncontrado)?;
            fila.try_into()
        })
        .await
    }

    /// Replace a pedido's lines. Quantities for platillos already on the
    /// pedido keep their original name/price snapshot; lines for new
    /// platillos are snapshotted from the menu inside the same transaction.
    pub async fn reemplazar_items(
        &self,
        id: Uuid,
        lineas: Vec<LineaPedido>,
    ) -> Result<Pedido, StoreError> {
        con_metricas(&self.metrics, "pedidos_reemplazar_items", async {
            let mut tx = self.pool.begin().await?;
            let mut pedido = bloquear_pedido(&mut tx, id).await?;

            let nuevos: Vec<Uuid> = lineas
                .iter()
                .map(|l| l.platillo_id)
                .filter(|pid| !pedido.items.iter().any(|i| i.platillo_id == *pid))
                .collect();
            let platillos = sqlx::query_as::<_, Platillo>(
                "SELECT * FROM platillos WHERE id = ANY($1)",
            )
            .bind(&nuevos)
            .fetch_all(&mut *tx)
            .await?;
            let por_id: HashMap<Uuid, Platillo> =
                platillos.into_iter().map(|p| (p.id, p)).collect();

            let existentes = pedido.items.clone();
            let items = armar_items(&lineas, &por_id, &existentes)?;
            pedido.reemplazar_items(items)?;

            sqlx::query(
                "UPDATE pedidos SET items = $2, total_usd = $3, total_bs = $4, estado = $5 \
                 WHERE id = $1",
            )
            .bind(pedido.id)
            .bind(Json(&pedido.items))
            .bind(pedido.total_usd)
            .bind(pedido.total_bs)
            .bind(pedido.estado.as_str())
            .execute(&mut *tx)
            .await?;

            tx.commit().await?;
            tracing::info!(pedido_id = %id, total_usd = %pedido.total_usd, "Items actualizados");
            Ok(pedido)
        })
        .await
    }

    /// Record a partial payment against a pedido. The conversion to Bs uses
    /// the rate snapshot stored on the pedido, never the live rate.
    pub async fn registrar_abono(
        &self,
        id: Uuid,
        monto_usd: Decimal,
        metodo: MetodoPago,
    ) -> Result<Pedido, StoreError> {
        con_metricas(&self.metrics, "pedidos_registrar_abono", async {
            let mut tx = self.pool.begin().await?;
            let mut pedido = bloquear_pedido(&mut tx, id).await?;

            let monto_bs = pedido.aplicar_abono(monto_usd)?;
            guardar_montos(&mut tx, &pedido).await?;
            insertar_abono(&mut tx, &pedido, monto_usd, monto_bs, metodo).await?;
            tx.commit().await?;

            self.metrics.registrar_abono(metodo.as_str());
            tracing::info!(
                pedido_id = %id,
                monto_usd = %monto_usd,
                metodo = metodo.as_str(),
                estado = pedido.estado.as_str(),
                "Abono registrado"
            );
            Ok(pedido)
        })
        .await
    }

    /// Close out a pedido. A pending balance is settled as a synthetic
    /// `cierre_automatico` abono; an already-covered pedido just flips state.
    pub async fn completar(&self, id: Uuid) -> Result<Pedido, StoreError> {
        con_metricas(&self.metrics, "pedidos_completar", async {
            let mut tx = self.pool.begin().await?;
            let mut pedido = bloquear_pedido(&mut tx, id).await?;

            let saldado = pedido.completar()?;
            guardar_montos(&mut tx, &pedido).await?;
            if let Some((monto_usd, monto_bs)) = saldado {
                insertar_abono(
                    &mut tx,
                    &pedido,
                    monto_usd,
                    monto_bs,
                    MetodoPago::CierreAutomatico,
                )
                .await?;
                self.metrics
                    .registrar_abono(MetodoPago::CierreAutomatico.as_str());
            }
            tx.commit().await?;

            tracing::info!(pedido_id = %id, saldado = saldado.is_some(), "Pedido completado");
            Ok(pedido)
        })
        .await
    }

    /// Payment history of a pedido, oldest first.
    pub async fn listar_abonos(&self, pedido_id: Uuid) -> Result<Vec<Abono>, StoreError> {
        con_metricas(&self.metrics, "pedidos_listar_abonos", async {
            let filas = sqlx::query_as::<_, AbonoRow>(
                "SELECT * FROM abonos_pedido WHERE pedido_id = $1 ORDER BY created_at ASC",
            )
            .bind(pedido_id)
            .fetch_all(&self.pool)
            .await?;
            filas.into_iter().map(Abono::try_from).collect()
        })
        .await
    }

    pub async fn eliminar(&self, id: Uuid) -> Result<(), StoreError> {
        con_metricas(&self.metrics, "pedidos_eliminar", async {
            let resultado = sqlx::query("DELETE FROM pedidos WHERE id = $1")
                .bind(id)
                .execute(&self.pool)
                .await?;
            if resultado.rows_affected() == 0 {
                return Err(StoreError::NoEncontrado);
            }
            tracing::info!(pedido_id = %id, "Pedido eliminado");
            Ok(())
        })
        .await
    }

    /// Delete every pedido. Destructive admin operation.
    pub async fn limpiar(&self) -> Result<u64, StoreError> {
        con_metricas(&self.metrics, "pedidos_limpiar", async {
            let resultado = sqlx::query("DELETE FROM pedidos").execute(&self.pool).await?;
            let eliminados = resultado.rows_affected();
            tracing::warn!(eliminados, "Todos los pedidos fueron eliminados");
            Ok(eliminados)
        })
        .await
    }
}

/// Lock and load a pedido row for read-modify-write.
async fn bloquear_pedido(
    tx: &mut Transaction<'_, Postgres>,
    id: Uuid,
) -> Result<Pedido, StoreError> {
    let fila = sqlx::query_as::<_, PedidoRow>("SELECT * FROM pedidos WHERE id = $1 FOR UPDATE")
        .bind(id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or(StoreError::NoEncontrado)?;
    fila.try_into()
}

async fn guardar_montos(
    tx: &mut Transaction<'_, Postgres>,
    pedido: &Pedido,
) -> Result<(), StoreError> {
    sqlx::query(
        "UPDATE pedidos SET monto_abonado_usd = $2, monto_abonado_bs = $3, estado = $4 \
         WHERE id = $1",
    )
    .bind(pedido.id)
    .bind(pedido.monto_abonado_usd)
    .bind(pedido.monto_abonado_bs)
    .bind(pedido.estado.as_str())
    .execute(&mut **tx)
    .await?;
    Ok(())
}

async fn insertar_abono(
    tx: &mut Transaction<'_, Postgres>,
    pedido: &Pedido,
    monto_usd: Decimal,
    monto_bs: Decimal,
    metodo: MetodoPago,
) -> Result<(), StoreError> {
    sqlx::query(
        "INSERT INTO abonos_pedido (id, pedido_id, monto_usd, monto_bs, tasa_dolar_usada, metodo_pago) \
         VALUES ($1, $2, $3, $4, $5, $6)",
    )
    .bind(Uuid::new_v4())
    .bind(pedido.id)
    .bind(crate::domain::pricing::redondear(monto_usd))
    .bind(monto_bs)
    .bind(pedido.tasa_dolar_usada)
    .bind(metodo.as_str())
    .execute(&mut **tx)
    .await?;
    Ok(())
}

/// Turn submitted cart lines into pedido lines. Lines whose platillo is
/// already on the pedido keep its stored name/price snapshot; new lines
/// snapshot from the menu. Duplicate lines merge their quantities.
fn armar_items(
    lineas: &[LineaPedido],
    menu: &HashMap<Uuid, Platillo>,
    existentes: &[PedidoItem],
) -> Result<Vec<PedidoItem>, StoreError> {
    let mut items: Vec<PedidoItem> = Vec::new();

    for linea in lineas {
        if let Some(previo) = items
            .iter_mut()
            .find(|i| i.platillo_id == linea.platillo_id)
        {
            previo.cantidad += linea.cantidad;
            continue;
        }

        let item = if let Some(snapshot) = existentes
            .iter()
            .find(|i| i.platillo_id == linea.platillo_id)
        {
            PedidoItem {
                cantidad: linea.cantidad,
                ..snapshot.clone()
            }
        } else {
            let platillo = menu
                .get(&linea.platillo_id)
                .ok_or(StoreError::NoEncontrado)?;
            PedidoItem {
                platillo_id: platillo.id,
                nombre: platillo.nombre.clone(),
                precio_usd: platillo.precio_usd,
                cantidad: linea.cantidad,
            }
        };
        items.push(item);
    }

    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn platillo(nombre: &str, precio: Decimal) -> Platillo {
        Platillo {
            id: Uuid::new_v4(),
            nombre: nombre.to_string(),
            precio_usd: precio,
            descripcion: None,
            imagen_url: None,
            activo: true,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn armar_items_toma_snapshot_del_menu() {
        let arepa = platillo("Arepa", dec!(2.50));
        let menu = HashMap::from([(arepa.id, arepa.clone())]);
        let lineas = vec![LineaPedido {
            platillo_id: arepa.id,
            cantidad: 2,
        }];

        let items = armar_items(&lineas, &menu, &[]).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].nombre, "Arepa");
        assert_eq!(items[0].precio_usd, dec!(2.50));
        assert_eq!(items[0].cantidad, 2);
    }

    #[test]
    fn armar_items_preserva_snapshot_existente() {
        let id = Uuid::new_v4();
        let existente = PedidoItem {
            platillo_id: id,
            nombre: "Arepa".to_string(),
            precio_usd: dec!(2.00), // price before a later menu edit
            cantidad: 1,
        };
        let lineas = vec![LineaPedido {
            platillo_id: id,
            cantidad: 5,
        }];

        let items = armar_items(&lineas, &HashMap::new(), &[existente]).unwrap();
        assert_eq!(items[0].precio_usd, dec!(2.00));
        assert_eq!(items[0].cantidad, 5);
    }

    #[test]
    fn armar_items_combina_duplicados() {
        let arepa = platillo("Arepa", dec!(2.50));
        let menu = HashMap::from([(arepa.id, arepa.clone())]);
        let lineas = vec![
            LineaPedido {
                platillo_id: arepa.id,
                cantidad: 1,
            },
            LineaPedido {
                platillo_id: arepa.id,
                cantidad: 2,
            },
        ];

        let items = armar_items(&lineas, &menu, &[]).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].cantidad, 3);
    }

    #[test]
    fn armar_items_rechaza_platillo_inexistente() {
        let lineas = vec![LineaPedido {
            platillo_id: Uuid::new_v4(),
            cantidad: 1,
        }];
        assert!(matches!(
            armar_items(&lineas, &HashMap::new(), &[]),
            Err(StoreError::NoEncontrado)
        ));
    }
}
