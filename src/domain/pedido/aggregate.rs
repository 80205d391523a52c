use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::domain::pricing::{redondear, Tasa};

use super::errors::PedidoError;
use super::value_objects::{EstadoPedido, PedidoItem};

// ============================================================================
// Pedido Aggregate - Order Totals, Payments and Status
// ============================================================================
//
// Invariants enforced here:
// - total_usd / total_bs always equal the line sum converted at the rate
//   snapshot stored on the pedido (tasa_dolar_usada), never the live rate.
// - estado is a pure function of (total_usd, monto_abonado_usd) and is
//   re-derived on every mutation.
// - Abonos only accumulate; there is no refund path.
//
// ============================================================================

/// Exact line-item sum in USD. No rounding: callers round once, at the
/// persistence/display boundary.
pub fn total_usd_de(items: &[PedidoItem]) -> Decimal {
    items.iter().map(PedidoItem::subtotal_usd).sum()
}

pub fn validar_items(items: &[PedidoItem]) -> Result<(), PedidoError> {
    if items.is_empty() {
        return Err(PedidoError::SinItems);
    }
    for item in items {
        if item.cantidad <= 0 {
            return Err(PedidoError::CantidadInvalida(item.cantidad));
        }
    }
    Ok(())
}

/// Outstanding balance and change of a pedido, in both currencies.
#[derive(Debug, Clone, Serialize)]
pub struct Saldo {
    pub pendiente_usd: Decimal,
    pub pendiente_bs: Decimal,
    pub cambio_usd: Decimal,
    pub cambio_bs: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct Pedido {
    pub id: Uuid,
    pub cliente_nombre: String,
    pub cliente_direccion: Option<String>,
    pub items: Vec<PedidoItem>,
    pub total_usd: Decimal,
    pub total_bs: Decimal,
    /// Rate in effect when the pedido was created. All later conversions on
    /// this pedido use this snapshot.
    pub tasa_dolar_usada: Decimal,
    pub estado: EstadoPedido,
    pub monto_abonado_usd: Decimal,
    pub monto_abonado_bs: Decimal,
    pub created_at: DateTime<Utc>,
}

impl Pedido {
    /// Create a pedido from a submitted cart, snapshotting the live rate.
    pub fn nuevo(
        cliente_nombre: String,
        cliente_direccion: Option<String>,
        items: Vec<PedidoItem>,
        tasa: Tasa,
    ) -> Result<Self, PedidoError> {
        validar_items(&items)?;

        let mut pedido = Self {
            id: Uuid::new_v4(),
            cliente_nombre,
            cliente_direccion,
            items,
            total_usd: Decimal::ZERO,
            total_bs: Decimal::ZERO,
            tasa_dolar_usada: tasa.valor(),
            estado: EstadoPedido::Pendiente,
            monto_abonado_usd: Decimal::ZERO,
            monto_abonado_bs: Decimal::ZERO,
            created_at: Utc::now(),
        };
        pedido.recalcular();
        Ok(pedido)
    }

    /// Replace the line list, keeping the rate snapshot. Totals and estado
    /// are re-derived; the paid amounts are untouched.
    pub fn reemplazar_items(&mut self, items: Vec<PedidoItem>) -> Result<(), PedidoError> {
        validar_items(&items)?;
        self.items = items;
        self.recalcular();
        Ok(())
    }

    /// Record a partial payment in USD. Returns the Bs amount converted at
    /// the pedido's rate snapshot, for the immutable abono record.
    pub fn aplicar_abono(&mut self, monto_usd: Decimal) -> Result<Decimal, PedidoError> {
        let monto_usd = redondear(monto_usd);
        if monto_usd <= Decimal::ZERO {
            return Err(PedidoError::MontoInvalido(monto_usd));
        }
        if self.estado == EstadoPedido::Completado {
            return Err(PedidoError::YaCompletado);
        }

        let monto_bs = redondear(monto_usd * self.tasa_dolar_usada);
        self.monto_abonado_usd += monto_usd;
        self.monto_abonado_bs += monto_bs;
        self.estado = EstadoPedido::desde_montos(self.total_usd, self.monto_abonado_usd);
        Ok(monto_bs)
    }

    /// Close out the pedido. If a balance is pending it is paid off and the
    /// `(usd, bs)` amounts are returned so the caller can record the closing
    /// abono; otherwise the estado simply moves to completado.
    pub fn completar(&mut self) -> Result<Option<(Decimal, Decimal)>, PedidoError> {
        if self.estado == EstadoPedido::Completado {
            return Err(PedidoError::YaCompletado);
        }

        let pendiente = self.saldo().pendiente_usd;
        if pendiente > Decimal::ZERO {
            let monto_bs = self.aplicar_abono(pendiente)?;
            Ok(Some((pendiente, monto_bs)))
        } else {
            self.estado = EstadoPedido::Completado;
            Ok(None)
        }
    }

    pub fn saldo(&self) -> Saldo {
        Saldo {
            pendiente_usd: (self.total_usd - self.monto_abonado_usd).max(Decimal::ZERO),
            pendiente_bs: (self.total_bs - self.monto_abonado_bs).max(Decimal::ZERO),
            cambio_usd: (self.monto_abonado_usd - self.total_usd).max(Decimal::ZERO),
            cambio_bs: (self.monto_abonado_bs - self.total_bs).max(Decimal::ZERO),
        }
    }

    fn recalcular(&mut self) {
        let total = total_usd_de(&self.items);
        self.total_usd = redondear(total);
        self.total_bs = redondear(total * self.tasa_dolar_usada);
        self.estado = EstadoPedido::desde_montos(self.total_usd, self.monto_abonado_usd);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn item(nombre: &str, precio: Decimal, cantidad: i32) -> PedidoItem {
        PedidoItem {
            platillo_id: Uuid::new_v4(),
            nombre: nombre.to_string(),
            precio_usd: precio,
            cantidad,
        }
    }

    fn pedido_de_prueba() -> Pedido {
        // Total: 2 * 2.50 + 1 * 5.00 = $10.00
        Pedido::nuevo(
            "María".to_string(),
            None,
            vec![item("Arepa", dec!(2.50), 2), item("Pabellón", dec!(5.00), 1)],
            Tasa::nueva(dec!(40.00)).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn totales_al_crear() {
        let pedido = pedido_de_prueba();
        assert_eq!(pedido.total_usd, dec!(10.00));
        assert_eq!(pedido.total_bs, dec!(400.00));
        assert_eq!(pedido.tasa_dolar_usada, dec!(40.00));
        assert_eq!(pedido.estado, EstadoPedido::Pendiente);
        assert_eq!(pedido.monto_abonado_usd, dec!(0));
    }

    #[test]
    fn total_es_suma_exacta_de_lineas() {
        let items = vec![
            item("A", dec!(0.10), 3),
            item("B", dec!(1.99), 7),
            item("C", dec!(12.345), 2),
        ];
        let esperado = dec!(0.30) + dec!(13.93) + dec!(24.690);
        assert_eq!(total_usd_de(&items), esperado);
    }

    #[test]
    fn rechaza_pedido_sin_items() {
        let resultado = Pedido::nuevo(
            "María".to_string(),
            None,
            vec![],
            Tasa::nueva(dec!(40.00)).unwrap(),
        );
        assert!(matches!(resultado, Err(PedidoError::SinItems)));
    }

    #[test]
    fn rechaza_cantidad_no_positiva() {
        let resultado = Pedido::nuevo(
            "María".to_string(),
            None,
            vec![item("Arepa", dec!(2.50), 0)],
            Tasa::nueva(dec!(40.00)).unwrap(),
        );
        assert!(matches!(resultado, Err(PedidoError::CantidadInvalida(0))));
    }

    #[test]
    fn abono_parcial_deja_estado_abonado() {
        let mut pedido = pedido_de_prueba();
        let monto_bs = pedido.aplicar_abono(dec!(4.00)).unwrap();

        assert_eq!(monto_bs, dec!(160.00));
        assert_eq!(pedido.estado, EstadoPedido::Abonado);
        assert_eq!(pedido.monto_abonado_usd, dec!(4.00));

        let saldo = pedido.saldo();
        assert_eq!(saldo.pendiente_usd, dec!(6.00));
        assert_eq!(saldo.cambio_usd, dec!(0.00));
    }

    #[test]
    fn pago_total_completa_sin_cambio() {
        let mut pedido = pedido_de_prueba();
        pedido.aplicar_abono(dec!(10.00)).unwrap();

        assert_eq!(pedido.estado, EstadoPedido::Completado);
        let saldo = pedido.saldo();
        assert_eq!(saldo.pendiente_usd, dec!(0.00));
        assert_eq!(saldo.cambio_usd, dec!(0.00));
    }

    #[test]
    fn sobrepago_reporta_cambio() {
        let mut pedido = pedido_de_prueba();
        pedido.aplicar_abono(dec!(12.00)).unwrap();

        assert_eq!(pedido.estado, EstadoPedido::Completado);
        assert_eq!(pedido.saldo().cambio_usd, dec!(2.00));
        assert_eq!(pedido.saldo().cambio_bs, dec!(80.00));
    }

    #[test]
    fn abonos_acumulan_hasta_completar() {
        let mut pedido = pedido_de_prueba();
        pedido.aplicar_abono(dec!(3.00)).unwrap();
        assert_eq!(pedido.estado, EstadoPedido::Abonado);
        pedido.aplicar_abono(dec!(7.00)).unwrap();
        assert_eq!(pedido.estado, EstadoPedido::Completado);
        assert_eq!(pedido.monto_abonado_usd, dec!(10.00));
        assert_eq!(pedido.monto_abonado_bs, dec!(400.00));
    }

    #[test]
    fn rechaza_abono_sobre_completado() {
        let mut pedido = pedido_de_prueba();
        pedido.aplicar_abono(dec!(10.00)).unwrap();
        assert!(matches!(
            pedido.aplicar_abono(dec!(1.00)),
            Err(PedidoError::YaCompletado)
        ));
    }

    #[test]
    fn rechaza_abono_no_positivo() {
        let mut pedido = pedido_de_prueba();
        assert!(matches!(
            pedido.aplicar_abono(dec!(0.00)),
            Err(PedidoError::MontoInvalido(_))
        ));
    }

    #[test]
    fn completar_salda_lo_pendiente() {
        let mut pedido = pedido_de_prueba();
        pedido.aplicar_abono(dec!(4.00)).unwrap();

        let saldado = pedido.completar().unwrap();
        assert_eq!(saldado, Some((dec!(6.00), dec!(240.00))));
        assert_eq!(pedido.estado, EstadoPedido::Completado);
        assert_eq!(pedido.monto_abonado_usd, dec!(10.00));
    }

    #[test]
    fn completar_dos_veces_falla() {
        let mut pedido = pedido_de_prueba();
        pedido.completar().unwrap();
        assert!(matches!(pedido.completar(), Err(PedidoError::YaCompletado)));
    }

    #[test]
    fn editar_items_usa_la_tasa_del_pedido() {
        let mut pedido = pedido_de_prueba();
        // The live rate may have moved; the pedido keeps converting at 40.00
        pedido
            .reemplazar_items(vec![item("Arepa", dec!(2.50), 4)])
            .unwrap();

        assert_eq!(pedido.total_usd, dec!(10.00));
        assert_eq!(pedido.total_bs, dec!(400.00));
    }

    #[test]
    fn editar_items_rederiva_estado() {
        let mut pedido = pedido_de_prueba();
        pedido.aplicar_abono(dec!(4.00)).unwrap();
        // Shrinking the order below what was already paid completes it
        pedido
            .reemplazar_items(vec![item("Arepa", dec!(2.50), 1)])
            .unwrap();

        assert_eq!(pedido.total_usd, dec!(2.50));
        assert_eq!(pedido.estado, EstadoPedido::Completado);
        assert_eq!(pedido.saldo().cambio_usd, dec!(1.50));
    }
}
