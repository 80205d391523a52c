// ============================================================================
// Pedido Domain - Orders, Payments and Status Derivation
// ============================================================================
//
// This module contains all pedido-specific code:
// - Value objects (PedidoItem, EstadoPedido, MetodoPago, Moneda, Abono)
// - Errors (PedidoError)
// - Aggregate (Pedido with totals, saldo and abono application)
//
// The status of a pedido is never stored authority: it is always derived
// from the paid-vs-total comparison and re-derived on every mutation.
//
// ============================================================================

pub mod aggregate;
pub mod errors;
pub mod value_objects;

pub use aggregate::*;
pub use errors::*;
pub use value_objects::*;
