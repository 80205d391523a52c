use actix_web::{web, HttpResponse};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use super::{ApiError, AppState};
use crate::domain::pedido::{MetodoPago, Moneda, Pedido, Saldo};
use crate::domain::pricing::{a_dolares, Tasa};
use crate::store::pedidos::{LineaPedido, NuevoPedido};

/// Pedido plus its derived balance, as every order endpoint responds.
#[derive(Debug, Serialize)]
pub struct PedidoRespuesta {
    #[serde(flatten)]
    pub pedido: Pedido,
    pub saldo: Saldo,
}

impl From<Pedido> for PedidoRespuesta {
    fn from(pedido: Pedido) -> Self {
        let saldo = pedido.saldo();
        Self { pedido, saldo }
    }
}

#[derive(Debug, Deserialize)]
pub struct AbonoSolicitud {
    pub monto: Decimal,
    #[serde(default = "moneda_usd")]
    pub moneda: Moneda,
    pub metodo_pago: MetodoPago,
}

fn moneda_usd() -> Moneda {
    Moneda::Usd
}

#[derive(Debug, Deserialize)]
pub struct ItemsSolicitud {
    pub items: Vec<LineaPedido>,
}

pub async fn listar(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let pedidos: Vec<PedidoRespuesta> = state
        .pedidos
        .listar()
        .await?
        .into_iter()
        .map(PedidoRespuesta::from)
        .collect();
    Ok(HttpResponse::Ok().json(pedidos))
}

/// Create a pedido. The live rate is read here, once, and becomes the
/// pedido's permanent snapshot.
pub async fn crear(
    state: web::Data<AppState>,
    cuerpo: web::Json<NuevoPedido>,
) -> Result<HttpResponse, ApiError> {
    let tasa = state.config.obtener_tasa().await;
    let pedido = state.pedidos.crear(cuerpo.into_inner(), tasa).await?;
    Ok(HttpResponse::Created().json(PedidoRespuesta::from(pedido)))
}

pub async fn obtener(
    state: web::Data<AppState>,
    id: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let pedido = state.pedidos.obtener(id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(PedidoRespuesta::from(pedido)))
}

pub async fn reemplazar_items(
    state: web::Data<AppState>,
    id: web::Path<Uuid>,
    cuerpo: web::Json<ItemsSolicitud>,
) -> Result<HttpResponse, ApiError> {
    let pedido = state
        .pedidos
        .reemplazar_items(id.into_inner(), cuerpo.into_inner().items)
        .await?;
    Ok(HttpResponse::Ok().json(PedidoRespuesta::from(pedido)))
}

/// Record a partial payment. A Bs amount is converted to USD at the
/// pedido's stored rate snapshot before it is applied.
pub async fn registrar_abono(
    state: web::Data<AppState>,
    id: web::Path<Uuid>,
    cuerpo: web::Json<AbonoSolicitud>,
) -> Result<HttpResponse, ApiError> {
    let id = id.into_inner();
    let solicitud = cuerpo.into_inner();

    let monto_usd = match solicitud.moneda {
        Moneda::Usd => solicitud.monto,
        Moneda::Bs => {
            let pedido = state.pedidos.obtener(id).await?;
            let tasa = Tasa::nueva(pedido.tasa_dolar_usada)
                .map_err(|e| ApiError::Validacion(e.to_string()))?;
            a_dolares(solicitud.monto, tasa)
        }
    };

    let pedido = state
        .pedidos
        .registrar_abono(id, monto_usd, solicitud.metodo_pago)
        .await?;
    Ok(HttpResponse::Ok().json(PedidoRespuesta::from(pedido)))
}

pub async fn listar_abonos(
    state: web::Data<AppState>,
    id: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let abonos = state.pedidos.listar_abonos(id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(abonos))
}

pub async fn completar(
    state: web::Data<AppState>,
    id: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let pedido = state.pedidos.completar(id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(PedidoRespuesta::from(pedido)))
}

pub async fn eliminar(
    state: web::Data<AppState>,
    id: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    state.pedidos.eliminar(id.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

pub async fn limpiar(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let eliminados = state.pedidos.limpiar().await?;
    Ok(HttpResponse::Ok().json(json!({ "eliminados": eliminados })))
}
