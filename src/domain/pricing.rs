use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;

// ============================================================================
// Pricing - Exchange Rate and Dual-Currency Conversion
// ============================================================================
//
// Prices are kept in USD and mirrored in bolívares (Bs) at a configurable
// exchange rate ("tasa"). All arithmetic is fixed-point decimal; rounding to
// two decimals happens only at the display/persistence boundary so that
// intermediate accumulation never compounds rounding error.
//
// ============================================================================

/// Rate used when the `configuracion` table cannot be read. Matches the
/// value the mobile clients ship with, so a degraded backend still prices
/// orders consistently.
pub const TASA_RESPALDO: Decimal = dec!(36.50);

#[derive(Debug, thiserror::Error)]
pub enum PricingError {
    #[error("la tasa debe ser mayor que cero: {0}")]
    TasaNoPositiva(Decimal),
}

/// Exchange rate (Bs per USD), guaranteed strictly positive.
///
/// Conversions that divide by the rate are total because a `Tasa` cannot be
/// constructed from zero or a negative value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tasa(Decimal);

impl Tasa {
    pub fn nueva(valor: Decimal) -> Result<Self, PricingError> {
        if valor <= Decimal::ZERO {
            return Err(PricingError::TasaNoPositiva(valor));
        }
        Ok(Self(valor))
    }

    /// Hardcoded fallback used when the stored rate is unavailable.
    pub fn respaldo() -> Self {
        Self(TASA_RESPALDO)
    }

    pub fn valor(self) -> Decimal {
        self.0
    }
}

/// Convert a USD amount to bolívares at the given rate.
pub fn a_bolivares(monto_usd: Decimal, tasa: Tasa) -> Decimal {
    monto_usd * tasa.valor()
}

/// Convert a bolívares amount to USD at the given rate.
pub fn a_dolares(monto_bs: Decimal, tasa: Tasa) -> Decimal {
    monto_bs / tasa.valor()
}

/// Round a money amount for display or persistence. Never call this on
/// intermediate results that still feed further arithmetic.
pub fn redondear(monto: Decimal) -> Decimal {
    monto.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tasa_rechaza_valores_no_positivos() {
        assert!(Tasa::nueva(Decimal::ZERO).is_err());
        assert!(Tasa::nueva(dec!(-1.00)).is_err());
        assert!(Tasa::nueva(dec!(0.01)).is_ok());
    }

    #[test]
    fn conversion_usd_a_bs() {
        // Platillo de $4.50 con tasa 40.00 debe costar Bs 180.00
        let tasa = Tasa::nueva(dec!(40.00)).unwrap();
        assert_eq!(redondear(a_bolivares(dec!(4.50), tasa)), dec!(180.00));
    }

    #[test]
    fn conversion_ida_y_vuelta() {
        let tasa = Tasa::nueva(dec!(36.50)).unwrap();
        let montos = [dec!(0.01), dec!(1.00), dec!(4.50), dec!(123.45), dec!(999.99)];
        for monto in montos {
            let vuelta = a_dolares(a_bolivares(monto, tasa), tasa);
            assert!(
                (vuelta - monto).abs() < dec!(0.005),
                "round-trip {monto} -> {vuelta}"
            );
        }
    }

    #[test]
    fn redondeo_a_dos_decimales() {
        assert_eq!(redondear(dec!(10.005)), dec!(10.01));
        assert_eq!(redondear(dec!(10.004)), dec!(10.00));
        assert_eq!(redondear(dec!(180.0)), dec!(180.00));
    }

    #[test]
    fn tasa_de_respaldo_es_valida() {
        assert_eq!(Tasa::respaldo().valor(), TASA_RESPALDO);
        assert!(Tasa::nueva(TASA_RESPALDO).is_ok());
    }
}
