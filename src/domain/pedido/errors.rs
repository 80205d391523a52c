use rust_decimal::Decimal;

// ============================================================================
// Pedido Business Rule Errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum PedidoError {
    #[error("el pedido debe tener al menos un platillo")]
    SinItems,

    #[error("cantidad inválida: {0}")]
    CantidadInvalida(i32),

    #[error("monto de abono inválido: {0}")]
    MontoInvalido(Decimal),

    #[error("el pedido ya está completado")]
    YaCompletado,

    #[error("estado desconocido: {0}")]
    EstadoDesconocido(String),

    #[error("método de pago desconocido: {0}")]
    MetodoDesconocido(String),
}
