// ============================================================================
// Generator Module
// ============================================================================
//
// - reference/       - Injectable sample tables (names, cities, brands, ...)
// - order_generator/ - Assembles random orders from those tables
//
// ============================================================================

mod order_generator;
mod reference;

pub use order_generator::OrderGenerator;
pub use reference::ReferenceData;
