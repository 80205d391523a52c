use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// Platillo - Menu Item
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum PlatilloError {
    #[error("el nombre del platillo no puede estar vacío")]
    NombreVacio,

    #[error("el precio debe ser mayor que cero: {0}")]
    PrecioNoPositivo(Decimal),
}

/// Menu item as persisted in the `platillos` table.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Platillo {
    pub id: Uuid,
    pub nombre: String,
    pub precio_usd: Decimal,
    pub descripcion: Option<String>,
    /// Opaque image reference; upload/storage is handled by the clients.
    pub imagen_url: Option<String>,
    pub activo: bool,
    pub created_at: DateTime<Utc>,
}

/// Payload for creating a platillo. New items are always active.
#[derive(Debug, Clone, Deserialize)]
pub struct NuevoPlatillo {
    pub nombre: String,
    pub precio_usd: Decimal,
    #[serde(default)]
    pub descripcion: Option<String>,
    #[serde(default)]
    pub imagen_url: Option<String>,
}

impl NuevoPlatillo {
    pub fn validar(&self) -> Result<(), PlatilloError> {
        validar_platillo(&self.nombre, self.precio_usd)
    }
}

/// Full-row update payload, including the active flag so staff can retire a
/// platillo without deleting it.
#[derive(Debug, Clone, Deserialize)]
pub struct ActualizarPlatillo {
    pub nombre: String,
    pub precio_usd: Decimal,
    #[serde(default)]
    pub descripcion: Option<String>,
    #[serde(default)]
    pub imagen_url: Option<String>,
    pub activo: bool,
}

impl ActualizarPlatillo {
    pub fn validar(&self) -> Result<(), PlatilloError> {
        validar_platillo(&self.nombre, self.precio_usd)
    }
}

fn validar_platillo(nombre: &str, precio_usd: Decimal) -> Result<(), PlatilloError> {
    if nombre.trim().is_empty() {
        return Err(PlatilloError::NombreVacio);
    }
    if precio_usd <= Decimal::ZERO {
        return Err(PlatilloError::PrecioNoPositivo(precio_usd));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn nuevo_platillo_valido() {
        let nuevo = NuevoPlatillo {
            nombre: "Pabellón criollo".to_string(),
            precio_usd: dec!(4.50),
            descripcion: Some("Plato típico".to_string()),
            imagen_url: None,
        };
        assert!(nuevo.validar().is_ok());
    }

    #[test]
    fn rechaza_nombre_vacio() {
        let nuevo = NuevoPlatillo {
            nombre: "   ".to_string(),
            precio_usd: dec!(4.50),
            descripcion: None,
            imagen_url: None,
        };
        assert!(matches!(nuevo.validar(), Err(PlatilloError::NombreVacio)));
    }

    #[test]
    fn rechaza_precio_no_positivo() {
        let nuevo = NuevoPlatillo {
            nombre: "Arepa".to_string(),
            precio_usd: dec!(0.00),
            descripcion: None,
            imagen_url: None,
        };
        assert!(matches!(
            nuevo.validar(),
            Err(PlatilloError::PrecioNoPositivo(_))
        ));
    }
}
