// ============================================================================
// Domain Layer - Business Logic
// ============================================================================
//
// This module contains the domain logic of the service:
// - pricing:  exchange rate ("tasa") and dual-currency conversion
// - platillo: menu items and their validation rules
// - pedido:   orders, order lines, payments ("abonos") and status derivation
//
// This layer is persistence-free. Stores and actors live elsewhere and call
// into it; the rate is always threaded through explicitly, never cached in
// ambient state.
//
// ============================================================================

pub mod pedido;
pub mod platillo;
pub mod pricing;
