use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

use super::errors::PedidoError;

// ============================================================================
// Pedido Value Objects
// ============================================================================

/// One line of a pedido. `nombre` and `precio_usd` are snapshots taken when
/// the line was added, so later menu edits never reprice an existing order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PedidoItem {
    pub platillo_id: Uuid,
    pub nombre: String,
    pub precio_usd: Decimal,
    pub cantidad: i32,
}

impl PedidoItem {
    pub fn subtotal_usd(&self) -> Decimal {
        Decimal::from(self.cantidad) * self.precio_usd
    }
}

/// Order status, derived exclusively from the paid-vs-total comparison.
///
/// Transitions are monotonic forward (there is no refund operation):
/// `Pendiente --(pagado > 0)--> Abonado --(pagado >= total)--> Completado`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EstadoPedido {
    Pendiente,
    Abonado,
    Completado,
}

impl EstadoPedido {
    /// Derive the status from the order total and the cumulative paid
    /// amount, both in USD.
    pub fn desde_montos(total_usd: Decimal, pagado_usd: Decimal) -> Self {
        if pagado_usd <= Decimal::ZERO {
            EstadoPedido::Pendiente
        } else if pagado_usd < total_usd {
            EstadoPedido::Abonado
        } else {
            EstadoPedido::Completado
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EstadoPedido::Pendiente => "pendiente",
            EstadoPedido::Abonado => "abonado",
            EstadoPedido::Completado => "completado",
        }
    }
}

impl FromStr for EstadoPedido {
    type Err = PedidoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pendiente" => Ok(EstadoPedido::Pendiente),
            "abonado" => Ok(EstadoPedido::Abonado),
            "completado" => Ok(EstadoPedido::Completado),
            otro => Err(PedidoError::EstadoDesconocido(otro.to_string())),
        }
    }
}

/// How a payment was made. `CierreAutomatico` marks the synthetic abono
/// recorded when staff completes an order with a pending balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetodoPago {
    Efectivo,
    Transferencia,
    Punto,
    CierreAutomatico,
}

impl MetodoPago {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetodoPago::Efectivo => "efectivo",
            MetodoPago::Transferencia => "transferencia",
            MetodoPago::Punto => "punto",
            MetodoPago::CierreAutomatico => "cierre_automatico",
        }
    }
}

impl FromStr for MetodoPago {
    type Err = PedidoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "efectivo" => Ok(MetodoPago::Efectivo),
            "transferencia" => Ok(MetodoPago::Transferencia),
            "punto" => Ok(MetodoPago::Punto),
            "cierre_automatico" => Ok(MetodoPago::CierreAutomatico),
            otro => Err(PedidoError::MetodoDesconocido(otro.to_string())),
        }
    }
}

/// Currency a caller may enter an abono in. Amounts in Bs are converted to
/// USD at the pedido's stored rate snapshot before being recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Moneda {
    Usd,
    Bs,
}

/// Immutable record of a partial payment, as persisted in `abonos_pedido`.
#[derive(Debug, Clone, Serialize)]
pub struct Abono {
    pub id: Uuid,
    pub pedido_id: Uuid,
    pub monto_usd: Decimal,
    pub monto_bs: Decimal,
    pub tasa_dolar_usada: Decimal,
    pub metodo_pago: MetodoPago,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn subtotal_de_item() {
        let item = PedidoItem {
            platillo_id: Uuid::new_v4(),
            nombre: "Arepa".to_string(),
            precio_usd: dec!(2.50),
            cantidad: 3,
        };
        assert_eq!(item.subtotal_usd(), dec!(7.50));
    }

    #[test]
    fn estado_desde_montos() {
        let total = dec!(10.00);
        assert_eq!(
            EstadoPedido::desde_montos(total, dec!(0.00)),
            EstadoPedido::Pendiente
        );
        assert_eq!(
            EstadoPedido::desde_montos(total, dec!(4.00)),
            EstadoPedido::Abonado
        );
        assert_eq!(
            EstadoPedido::desde_montos(total, dec!(10.00)),
            EstadoPedido::Completado
        );
        // Overpayment still lands on completado
        assert_eq!(
            EstadoPedido::desde_montos(total, dec!(12.00)),
            EstadoPedido::Completado
        );
    }

    #[test]
    fn estado_ida_y_vuelta_por_cadena() {
        for estado in [
            EstadoPedido::Pendiente,
            EstadoPedido::Abonado,
            EstadoPedido::Completado,
        ] {
            assert_eq!(estado.as_str().parse::<EstadoPedido>().unwrap(), estado);
        }
        assert!("cancelado".parse::<EstadoPedido>().is_err());
    }

    #[test]
    fn metodo_de_pago_por_cadena() {
        for metodo in [
            MetodoPago::Efectivo,
            MetodoPago::Transferencia,
            MetodoPago::Punto,
            MetodoPago::CierreAutomatico,
        ] {
            assert_eq!(metodo.as_str().parse::<MetodoPago>().unwrap(), metodo);
        }
        assert!("cheque".parse::<MetodoPago>().is_err());
    }

    #[test]
    fn estados_serializan_en_minusculas() {
        let json = serde_json::to_string(&EstadoPedido::Abonado).unwrap();
        assert_eq!(json, "\"abonado\"");
        let metodo = serde_json::to_string(&MetodoPago::CierreAutomatico).unwrap();
        assert_eq!(metodo, "\"cierre_automatico\"");
    }
}
